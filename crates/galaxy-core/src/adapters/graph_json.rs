//! `graph-json` adapter: a payload already in canonical `{ nodes, connections }` shape

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{parse_each, AdapterConfig, AdapterInfo, DataSourceAdapter, RawSource, SourceCache};
use crate::error::{Error, Result};
use crate::fs::{FileSystem, HttpFetcher};
use crate::graph::{GraphData, Node, NodeKind, Visual};

const NAME: &str = "graph-json";
const CACHE_KEY: &str = "graph-json-data";

pub struct GraphJsonAdapter {
    source: RawSource,
    cache: SourceCache,
}

impl GraphJsonAdapter {
    pub fn new(fs: Arc<dyn FileSystem>, http: Arc<dyn HttpFetcher>, config: AdapterConfig) -> Self {
        Self {
            source: RawSource::new(fs, http, &config),
            cache: SourceCache::new(config.cache),
        }
    }
}

#[async_trait]
impl DataSourceAdapter for GraphJsonAdapter {
    fn info(&self) -> AdapterInfo {
        AdapterInfo {
            name: NAME.to_string(),
            display_name: "Graph JSON".to_string(),
            description: "Load a graph already in node/connection form".to_string(),
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
                "expected nodes and connections arrays".to_string(),
            ));
        }

        let nodes = parse_each(NAME, &raw, "nodes", |r| self.parse_node(r));
        let connections = parse_each(NAME, &raw, "connections", |r| self.parse_connection(r));
        let data = GraphData::new(nodes, connections);
        self.cache.insert(CACHE_KEY, data.clone()).await;
        Ok(data)
    }

    /// `{ id, type|kind, title?, description?, sourcePath?, content?, tags?, links?,
    /// importance?, enabled?, color?, attributes? }`
    fn parse_node(&self, raw: &Value) -> Result<Node> {
        let text = |key: &str| raw.get(key).and_then(Value::as_str);

        let id = text("id")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::InvalidNode(format!("missing id in {}", raw)))?;
        let kind_name = text("type")
            .or_else(|| text("kind"))
            .ok_or_else(|| Error::InvalidNode(format!("missing type for node '{}'", id)))?;
        let kind = NodeKind::parse(kind_name)
            .ok_or_else(|| Error::InvalidNode(format!("unknown node type '{}'", kind_name)))?;

        let mut node = Node::new(id, kind, text("title").unwrap_or(id))
            .with_description(text("description").unwrap_or_default())
            .with_source_path(text("sourcePath").unwrap_or_default())
            .with_content(text("content").unwrap_or_default());

        if let Some(tags) = raw.get("tags").and_then(Value::as_array) {
            node = node.with_tags(tags.iter().filter_map(Value::as_str));
        }
        if let Some(links) = raw.get("links").and_then(Value::as_array) {
            node = node.with_links(links.iter().filter_map(Value::as_str).map(String::from).collect());
        }
        if let Some(importance) = raw.get("importance").and_then(Value::as_f64) {
            node = node.with_importance(importance as f32);
        }
        if let Some(enabled) = raw.get("enabled").and_then(Value::as_bool) {
            node = node.with_enabled(enabled);
        }
        if let Some(color) = text("color") {
            node = node.with_visual(Visual::for_kind(kind).with_color(color));
        }
        if let Some(attributes) = raw.get("attributes").and_then(Value::as_object) {
            for (key, value) in attributes {
                node = node.with_attribute(key.clone(), value.clone());
            }
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{MemoryFileSystem, ReqwestFetcher};
    use crate::graph::ConnectionKind;
    use serde_json::json;

    fn adapter() -> GraphJsonAdapter {
        GraphJsonAdapter::new(
            Arc::new(MemoryFileSystem::new()),
            Arc::new(ReqwestFetcher::new().unwrap()),
            AdapterConfig::default(),
        )
    }

    #[test]
    fn test_parse_node_defaults_and_errors() {
        let adapter = adapter();
        let node = adapter
            .parse_node(&json!({"id": "n1", "type": "skill", "tags": ["a", "a", "b"], "importance": 3}))
            .unwrap();
        assert_eq!(node.title, "n1");
        assert_eq!(node.kind, NodeKind::Skill);
        assert_eq!(node.tags, vec!["a", "b"]);
        assert_eq!(node.importance, 1.0);

        assert!(adapter.parse_node(&json!({"type": "skill"})).is_err());
        assert!(adapter.parse_node(&json!({"id": "x"})).is_err());
        assert!(adapter.parse_node(&json!({"id": "x", "type": "planet"})).is_err());
    }

    #[tokio::test]
    async fn test_fetch_skips_malformed_records() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.add_file(
            "/graph.json",
            json!({
                "nodes": [
                    {"id": "a", "type": "document", "title": "Alpha"},
                    {"id": "b", "kind": "category", "color": "#FFFFFF"},
                    {"title": "no id"}
                ],
                "connections": [
                    {"source": "a", "target": "b", "type": "childOf"},
                    {"source": "a"}
                ]
            })
            .to_string(),
        );
        let adapter = GraphJsonAdapter::new(
            fs,
            Arc::new(ReqwestFetcher::new().unwrap()),
            AdapterConfig::default().with_file_path("/graph.json"),
        );

        let data = adapter.fetch_data().await.unwrap();
        assert_eq!(data.nodes.len(), 2);
        assert_eq!(data.node("b").unwrap().visual.color, "#FFFFFF");
        assert_eq!(data.connections.len(), 1);
        assert_eq!(data.connections[0].kind, ConnectionKind::ChildOf);
        assert!(adapter.statistics().is_none());
        assert!(adapter.refreshable().is_none());
    }

    #[tokio::test]
    async fn test_no_source_configured() {
        let err = adapter().fetch_data().await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
