//! `claude-config` adapter: skills, plugins and MCP servers as a category graph

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    parse_each, AdapterConfig, AdapterInfo, AdapterStatistics, DataSourceAdapter, RawSource,
    Refreshable, SourceCache, StatisticsProvider, has_arrays,
};
use crate::error::{Error, Result};
use crate::fs::{FileSystem, HttpFetcher};
use crate::graph::{Connection, ConnectionKind, GraphData, GraphStatistics, Node, NodeKind};

const NAME: &str = "claude-config";
const CACHE_KEY: &str = "claude-config-data";
const PLUGIN_CATEGORY: &str = "category-plugin";
const MCP_CATEGORY: &str = "category-mcp-server";

/// Reads `{ skills[], plugins[], mcpServers[] }`
pub struct ClaudeConfigAdapter {
    source: RawSource,
    cache: SourceCache,
}

impl ClaudeConfigAdapter {
    pub fn new(fs: Arc<dyn FileSystem>, http: Arc<dyn HttpFetcher>, config: AdapterConfig) -> Self {
        Self {
            source: RawSource::new(fs, http, &config),
            cache: SourceCache::new(config.cache),
        }
    }

    fn transform(&self, raw: &Value) -> GraphData {
        let mut nodes = Vec::new();
        let mut connections = Vec::new();

        let skills = parse_each(NAME, raw, "skills", |r| self.parse_item(r, NodeKind::Skill));
        let plugins = parse_each(NAME, raw, "plugins", |r| self.parse_item(r, NodeKind::Plugin));
        let servers = parse_each(NAME, raw, "mcpServers", |r| self.parse_item(r, NodeKind::Mcp));

        // One category node per distinct skill category, in first-seen order
        let mut categories: Vec<&str> = Vec::new();
        for category in skills.iter().filter_map(|s| s.attribute_str("skill_category")) {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        for category in &categories {
            nodes.push(category_node(&format!("category-{}", category), category));
        }
        if !plugins.is_empty() {
            nodes.push(category_node(PLUGIN_CATEGORY, "plugin"));
        }
        if !servers.is_empty() {
            nodes.push(category_node(MCP_CATEGORY, "mcp-server"));
        }

        for skill in &skills {
            if let Some(category) = skill.attribute_str("skill_category") {
                connections.push(Connection::new(
                    &skill.id,
                    format!("category-{}", category),
                    ConnectionKind::BelongsTo,
                ));
            }
        }
        for plugin in &plugins {
            connections.push(Connection::new(&plugin.id, PLUGIN_CATEGORY, ConnectionKind::BelongsTo));
        }
        for server in &servers {
            connections.push(Connection::new(&server.id, MCP_CATEGORY, ConnectionKind::BelongsTo));
        }

        let items = skills.into_iter().chain(plugins).chain(servers).map(|mut node| {
            node.attributes.remove("skill_category");
            node
        });
        nodes.extend(items);

        GraphData::new(nodes, connections)
    }

    /// Build an item node; the declared skill category is kept under a
    /// temporary attribute until connections are made
    fn parse_item(&self, raw: &Value, kind: NodeKind) -> Result<Node> {
        let name = raw
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::InvalidNode(format!("{} record without a name", kind)))?;
        let text = |key: &str| raw.get(key).and_then(Value::as_str).filter(|s| !s.is_empty());

        let mut node = Node::new(format!("{}-{}", kind.as_str(), name), kind, name)
            .with_description(text("description").unwrap_or_default())
            .with_attribute("category", text("category").unwrap_or(kind.as_str()));

        if kind == NodeKind::Skill {
            if let Some(category) = text("category") {
                node = node.with_attribute("skill_category", category);
            }
        }
        if let Some(plugin) = text("plugin") {
            node = node.with_attribute("plugin", plugin);
        }
        if let Some(subagent) = text("subagentType") {
            node = node.with_attribute("subagent_type", subagent);
        }
        if let Some(tools) = raw.get("tools").filter(|t| t.is_array()) {
            node = node.with_attribute("tools", tools.clone());
        }
        if let Some(skills) = raw.get("skills").filter(|t| t.is_array()) {
            node = node.with_attribute("skills", skills.clone());
        }
        Ok(node)
    }
}

fn category_node(id: &str, title: &str) -> Node {
    Node::new(id, NodeKind::Category, title)
        .with_description(format!("{} category", title))
        .with_attribute("category", title)
}

#[async_trait]
impl DataSourceAdapter for ClaudeConfigAdapter {
    fn info(&self) -> AdapterInfo {
        AdapterInfo {
            name: NAME.to_string(),
            display_name: "Claude Configuration".to_string(),
            description: "Visualize skills, plugins and MCP servers".to_string(),
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
                "expected skills, plugins and mcpServers arrays".to_string(),
            ));
        }

        let data = self.transform(&raw);
        self.cache.insert(CACHE_KEY, data.clone()).await;
        Ok(data)
    }

    fn parse_node(&self, raw: &Value) -> Result<Node> {
        let kind = raw
            .get("nodeType")
            .and_then(Value::as_str)
            .and_then(NodeKind::parse)
            .unwrap_or(NodeKind::Skill);
        let mut node = self.parse_item(raw, kind)?;
        node.attributes.remove("skill_category");
        Ok(node)
    }

    fn validate_data(&self, raw: &Value) -> bool {
        has_arrays(raw, &["skills", "plugins", "mcpServers"])
    }

    fn statistics(&self) -> Option<&dyn StatisticsProvider> {
        Some(self)
    }

    fn refreshable(&self) -> Option<&dyn Refreshable> {
        Some(self)
    }
}

#[async_trait]
impl StatisticsProvider for ClaudeConfigAdapter {
    async fn statistics(&self) -> Result<AdapterStatistics> {
        let data = self.fetch_data().await?;
        let mut categories: Vec<String> = Vec::new();
        for category in data
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Skill)
            .filter_map(|n| n.attribute_str("category"))
        {
            if !categories.iter().any(|c| c == category) {
                categories.push(category.to_string());
            }
        }
        Ok(AdapterStatistics::new(GraphStatistics {
            node_count: data.nodes.len(),
            connection_count: data.connections.len(),
            categories,
        }))
    }
}

#[async_trait]
impl Refreshable for ClaudeConfigAdapter {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::CacheConfig;
    use crate::fs::{MemoryFileSystem, ReqwestFetcher};
    use serde_json::json;

    fn adapter_for(payload: &str) -> (Arc<MemoryFileSystem>, ClaudeConfigAdapter) {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.add_file("/data/config.json", payload);
        let adapter = ClaudeConfigAdapter::new(
            fs.clone(),
            Arc::new(ReqwestFetcher::new().unwrap()),
            AdapterConfig::default().with_file_path("/data/config.json"),
        );
        (fs, adapter)
    }

    fn sample() -> String {
        json!({
            "skills": [
                {"name": "review", "category": "quality", "tools": ["git"]},
                {"name": "lint", "category": "quality"},
                {"name": "deploy", "category": "ops", "plugin": "ship"},
                {"name": "loose"},
                {"description": "no name"}
            ],
            "plugins": [{"name": "ship", "skills": ["deploy"]}],
            "mcpServers": [{"name": "github", "tools": ["issues"]}]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_fetch_builds_categories_and_connections() {
        let (_, adapter) = adapter_for(&sample());
        let data = adapter.fetch_data().await.unwrap();

        let ids: Vec<_> = data.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "category-quality",
                "category-ops",
                "category-plugin",
                "category-mcp-server",
                "skill-review",
                "skill-lint",
                "skill-deploy",
                "skill-loose",
                "plugin-ship",
                "mcp-github",
            ]
        );

        // Every connection resolves to an emitted node
        for conn in &data.connections {
            assert_eq!(conn.kind, ConnectionKind::BelongsTo);
            assert!(data.node(&conn.target).is_some(), "dangling {}", conn.target);
        }
        // loose has no category, so 3 skill edges + 1 plugin + 1 server
        assert_eq!(data.connections.len(), 5);

        let review = data.node("skill-review").unwrap();
        assert_eq!(review.attributes["tools"], json!(["git"]));
        assert!(!review.attributes.contains_key("skill_category"));
        assert_eq!(data.node("skill-loose").unwrap().attribute_str("category"), Some("skill"));
    }

    #[tokio::test]
    async fn test_invalid_structure() {
        let (_, adapter) = adapter_for(r#"{"skills": [], "plugins": {}}"#);
        let err = adapter.fetch_data().await.unwrap_err();
        assert_eq!(err.code(), "E101");
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let adapter = ClaudeConfigAdapter::new(
            Arc::new(MemoryFileSystem::new()),
            Arc::new(ReqwestFetcher::new().unwrap()),
            AdapterConfig::default().with_file_path("/nope.json"),
        );
        assert!(adapter.fetch_data().await.unwrap_err().is_unavailable());
        assert!(!adapter.refresh().await);
    }

    #[tokio::test]
    async fn test_cache_and_refresh() {
        let (fs, adapter) = adapter_for(&sample());
        let first = adapter.fetch_data().await.unwrap();

        fs.add_file("/data/config.json", r#"{"skills": [], "plugins": [], "mcpServers": []}"#);
        // Cache hit bypasses the file
        assert_eq!(adapter.fetch_data().await.unwrap(), first);

        assert!(adapter.refreshable().unwrap().refresh().await);
        assert!(adapter.fetch_data().await.unwrap().nodes.is_empty());
    }

    #[tokio::test]
    async fn test_uncached_reads_every_time() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.add_file("/c.json", &sample());
        let adapter = ClaudeConfigAdapter::new(
            fs.clone(),
            Arc::new(ReqwestFetcher::new().unwrap()),
            AdapterConfig::default()
                .with_file_path("/c.json")
                .with_cache(CacheConfig::disabled()),
        );
        adapter.fetch_data().await.unwrap();
        fs.add_file("/c.json", r#"{"skills": [], "plugins": [], "mcpServers": []}"#);
        assert!(adapter.fetch_data().await.unwrap().nodes.is_empty());
    }

    #[tokio::test]
    async fn test_statistics_capability() {
        let (_, adapter) = adapter_for(&sample());
        let stats = DataSourceAdapter::statistics(&adapter)
            .unwrap()
            .statistics()
            .await
            .unwrap();
        assert_eq!(stats.node_count, 10);
        assert_eq!(stats.categories, vec!["quality", "ops", "skill"]);
    }

    #[test]
    fn test_parse_node_uses_node_type() {
        let (_, adapter) = adapter_for("{}");
        let node = adapter
            .parse_node(&json!({"name": "fs", "nodeType": "mcp"}))
            .unwrap();
        assert_eq!(node.id, "mcp-fs");
        assert_eq!(node.kind, NodeKind::Mcp);
        assert!(adapter.parse_node(&json!({"nodeType": "mcp"})).is_err());
        assert_eq!(adapter.info().name, "claude-config");
    }
}
