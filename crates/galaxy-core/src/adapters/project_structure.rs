//! `project-structure` adapter: a project's files and folders with their imports

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    parse_each, AdapterConfig, AdapterInfo, AdapterStatistics, DataSourceAdapter, RawSource,
    Refreshable, SourceCache, StatisticsProvider,
};
use crate::error::{Error, Result};
use crate::fs::{FileSystem, HttpFetcher};
use crate::graph::{Connection, ConnectionKind, GraphData, GraphStatistics, Node, NodeKind};

const NAME: &str = "project-structure";
const CACHE_KEY: &str = "project-structure-data";

/// Reads `{ files[], rootPath }`
pub struct ProjectStructureAdapter {
    source: RawSource,
    cache: SourceCache,
}

impl ProjectStructureAdapter {
    pub fn new(fs: Arc<dyn FileSystem>, http: Arc<dyn HttpFetcher>, config: AdapterConfig) -> Self {
        Self {
            source: RawSource::new(fs, http, &config),
            cache: SourceCache::new(config.cache),
        }
    }

    fn transform(&self, raw: &Value) -> GraphData {
        let root_path = raw.get("rootPath").and_then(Value::as_str).unwrap_or_default();
        let files = raw.get("files").and_then(Value::as_array);
        let mut connections = Vec::new();

        let nodes = parse_each(NAME, raw, "files", |file| self.parse_node(file));

        // Connections come from the raw records; skipped records never got a node
        for file in files.into_iter().flatten() {
            let Some(path) = file.get("path").and_then(Value::as_str) else {
                continue;
            };
            let id = file_id(path);
            if let Some(parent) = parent_path(path) {
                if parent != root_path {
                    connections.push(Connection::new(&id, file_id(parent), ConnectionKind::ChildOf));
                }
            }
            let imports = file.get("imports").and_then(Value::as_array);
            for import in imports.into_iter().flatten().filter_map(Value::as_str) {
                connections.push(Connection::new(&id, file_id(import), ConnectionKind::Imports));
            }
        }

        GraphData::new(nodes, connections)
    }
}

fn file_id(path: &str) -> String {
    format!("file-{}", path.replace('/', "-"))
}

fn parent_path(path: &str) -> Option<&str> {
    path.rfind('/').map(|i| &path[..i])
}

fn extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => "",
    }
}

/// Role of a file inferred from where it lives
fn role(path: &str, is_folder: bool) -> &'static str {
    if is_folder {
        return "folder";
    }
    let path = path.to_lowercase();
    if path.contains("/pages/") || (path.contains("/app/") && path.ends_with("page.tsx")) {
        "page"
    } else if path.contains("/api/") {
        "api"
    } else if path.contains("/components/scene/") {
        "scene-component"
    } else if path.contains("/components/") {
        "ui-component"
    } else if path.contains("/services/") {
        "service"
    } else if path.contains("/stores/") {
        "store"
    } else if path.contains("/utils/") {
        "util"
    } else if path.contains("/types/") || path.ends_with(".d.ts") {
        "type"
    } else {
        "file"
    }
}

fn infer_category(path: &str) -> &'static str {
    let has = |segment: &str| path.split('/').any(|s| s == segment);
    if has("components") {
        "Components"
    } else if has("pages") || has("app") {
        "Pages"
    } else if has("api") {
        "API"
    } else if has("services") {
        "Services"
    } else if has("stores") {
        "State"
    } else if has("utils") {
        "Utils"
    } else if has("types") {
        "Types"
    } else {
        "Other"
    }
}

#[async_trait]
impl DataSourceAdapter for ProjectStructureAdapter {
    fn info(&self) -> AdapterInfo {
        AdapterInfo {
            name: NAME.to_string(),
            display_name: "Project Structure".to_string(),
            description: "Visualize project files and dependencies".to_string(),
            source_type: self.source.source_type(),
        }
    }

    async fn fetch_data(&self) -> Result<GraphData> {
        if let Some(cached) = self.cache.get(CACHE_KEY).await {
            debug!(adapter = NAME, "Returning cached data");
            return Ok(cached);
        }

        let raw = self.source.fetch(NAME).await?;
        if !self.validate_data(&raw) {
            return Err(Error::InvalidSourceFormat(
                "expected a files array and a rootPath string".to_string(),
            ));
        }

        let data = self.transform(&raw);
        self.cache.insert(CACHE_KEY, data.clone()).await;
        Ok(data)
    }

    fn parse_node(&self, raw: &Value) -> Result<Node> {
        let text = |key: &str| raw.get(key).and_then(Value::as_str);
        let path = text("path")
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::InvalidNode(format!("file record without a path: {}", raw)))?;
        let name = text("name").unwrap_or_else(|| path.rsplit('/').next().unwrap_or(path));
        let file_type = text("type").unwrap_or("file");
        let is_folder = file_type == "folder";
        let kind = if is_folder {
            NodeKind::Category
        } else {
            NodeKind::Document
        };
        let category = text("category")
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| infer_category(path));

        Ok(Node::new(file_id(path), kind, name)
            .with_description(path)
            .with_source_path(path)
            .with_attribute("role", role(path, is_folder))
            .with_attribute("category", category)
            .with_attribute("path", path)
            .with_attribute("file_type", file_type)
            .with_attribute("extension", extension(name)))
    }

    fn validate_data(&self, raw: &Value) -> bool {
        raw.get("files").is_some_and(Value::is_array)
            && raw.get("rootPath").is_some_and(Value::is_string)
    }

    fn statistics(&self) -> Option<&dyn StatisticsProvider> {
        Some(self)
    }

    fn refreshable(&self) -> Option<&dyn Refreshable> {
        Some(self)
    }
}

#[async_trait]
impl StatisticsProvider for ProjectStructureAdapter {
    async fn statistics(&self) -> Result<AdapterStatistics> {
        let data = self.fetch_data().await?;
        let mut extensions: Vec<String> = Vec::new();
        for ext in data
            .nodes
            .iter()
            .filter(|n| n.attribute_str("file_type") != Some("folder"))
            .filter_map(|n| n.attribute_str("extension"))
            .filter(|e| !e.is_empty())
        {
            if !extensions.iter().any(|e| e == ext) {
                extensions.push(ext.to_string());
            }
        }
        Ok(AdapterStatistics::new(GraphStatistics {
            node_count: data.nodes.len(),
            connection_count: data.connections.len(),
            categories: extensions,
        }))
    }
}

#[async_trait]
impl Refreshable for ProjectStructureAdapter {
    async fn refresh(&self) -> bool {
        self.cache.clear().await;
        match self.fetch_data().await {
            Ok(_) => true,
            Err(e) => {
                warn!(adapter = NAME, error = %e, "Refresh failed");
                false
            }
        }
    }
}
