//! Config ingestion
//!
//! Turns the three config collections (skills, MCP servers, plugins) into a
//! fixed two-level hierarchy: one root, three categories on an inner ring and
//! every item fanned out across its category's 120° sector on an outer ring.

use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::fs::FileSystem;
use crate::graph::{Connection, ConnectionKind, GraphData, Node, NodeKind, Visual};

/// Id of the synthetic root node
pub const ROOT_ID: &str = "center";
/// Radius of the category ring
pub const CATEGORY_RADIUS: f64 = 15.0;
/// Radius of the item ring
pub const ITEM_RADIUS: f64 = 25.0;
/// Strength of root → category edges
pub const CATEGORY_STRENGTH: f32 = 1.0;
/// Strength of category → item edges
pub const ITEM_STRENGTH: f32 = 0.6;

const SECTOR: f64 = 2.0 * PI / 3.0;
const DISABLED_COLOR: &str = "#666666";

/// Common view over skill, MCP server and plugin records
pub trait ConfigItem {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn path(&self) -> &str;
    fn enabled(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Directory the record was read from
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRecord {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub config: serde_json::Value,
}

fn default_category() -> String {
    "general".to_string()
}

fn default_true() -> bool {
    true
}

fn default_version() -> String {
    "1.0.0".to_string()
}

macro_rules! impl_config_item {
    ($ty:ty) => {
        impl ConfigItem for $ty {
            fn name(&self) -> &str {
                &self.name
            }
            fn description(&self) -> &str {
                &self.description
            }
            fn path(&self) -> &str {
                &self.path
            }
            fn enabled(&self) -> bool {
                self.enabled
            }
        }
    };
}

impl_config_item!(SkillRecord);
impl_config_item!(PluginRecord);

impl ConfigItem for McpServerRecord {
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn path(&self) -> &str {
        ""
    }
    fn enabled(&self) -> bool {
        self.enabled
    }
}

/// The three raw config collections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub skills: Vec<SkillRecord>,
    pub mcp_servers: Vec<McpServerRecord>,
    pub plugins: Vec<PluginRecord>,
}

/// Totals and enabled counts per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigStats {
    pub total_skills: usize,
    pub enabled_skills: usize,
    pub total_mcp_servers: usize,
    pub enabled_mcp_servers: usize,
    pub total_plugins: usize,
    pub enabled_plugins: usize,
}

impl ConfigSnapshot {
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty() && self.mcp_servers.is_empty() && self.plugins.is_empty()
    }

    pub fn stats(&self) -> ConfigStats {
        ConfigStats {
            total_skills: self.skills.len(),
            enabled_skills: self.skills.iter().filter(|s| s.enabled).count(),
            total_mcp_servers: self.mcp_servers.len(),
            enabled_mcp_servers: self.mcp_servers.iter().filter(|m| m.enabled).count(),
            total_plugins: self.plugins.len(),
            enabled_plugins: self.plugins.iter().filter(|p| p.enabled).count(),
        }
    }

    /// Built-in sample used when no real config can be read
    pub fn sample() -> Self {
        let skill = |name: &str, description: &str, category: &str| SkillRecord {
            name: name.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            path: format!("/sample/skills/{}", name),
            enabled: true,
        };
        let server = |name: &str, description: &str, command: &str, args: &[&str]| McpServerRecord {
            name: name.to_string(),
            description: description.to_string(),
            command: Some(command.to_string()),
            args: args.iter().map(|a| a.to_string()).collect(),
            env: BTreeMap::new(),
            enabled: true,
            source: String::new(),
        };
        let plugin = |name: &str, description: &str| PluginRecord {
            name: name.to_string(),
            version: default_version(),
            description: description.to_string(),
            path: format!("/sample/plugins/{}", name),
            enabled: true,
            config: serde_json::Value::Object(Default::default()),
        };

        Self {
            skills: vec![
                skill("agent-browser", "Browser automation agent", "automation"),
                skill("processing-creative", "Creative coding with Processing", "creative"),
                skill("ui-ux-pro-max", "UI/UX design expert", "design"),
            ],
            mcp_servers: vec![
                server("playwright", "Playwright browser automation", "npx", &["@playwright/mcp"]),
                server("firebase", "Firebase MCP service", "firebase-mcp", &[]),
            ],
            plugins: vec![
                plugin("backend-development", "Backend development plugin"),
                plugin("frontend-design", "Frontend design plugin"),
            ],
        }
    }
}

/// Keep one record per name; a later record replaces an earlier one in place
pub fn dedupe_by_name<T: ConfigItem>(items: Vec<T>) -> Vec<T> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        match index.get(item.name()) {
            Some(&i) => unique[i] = item,
            None => {
                index.insert(item.name().to_string(), unique.len());
                unique.push(item);
            }
        }
    }
    unique
}

/// Produces the raw config collections for a root directory
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn load(&self, root: &Path) -> Result<ConfigSnapshot>;
}

/// Always returns the same snapshot
#[derive(Debug, Clone, Default)]
pub struct StaticConfigSource {
    snapshot: ConfigSnapshot,
}

impl StaticConfigSource {
    pub fn new(snapshot: ConfigSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl ConfigSource for StaticConfigSource {
    async fn load(&self, _root: &Path) -> Result<ConfigSnapshot> {
        Ok(self.snapshot.clone())
    }
}

/// Reads `skills/*/skill.json`, `mcp-*/mcp-config.json` and `plugins/*/package.json`
pub struct ManifestConfigSource {
    fs: Arc<dyn FileSystem>,
}

impl ManifestConfigSource {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Child directories of `dir`; a missing directory yields none
    async fn subdirectories(&self, dir: &Path) -> Vec<(String, std::path::PathBuf)> {
        match self.fs.read_dir(dir).await {
            Ok(entries) => entries
                .into_iter()
                .filter(|e| e.is_dir)
                .map(|e| (e.name, e.path))
                .collect(),
            Err(e) => {
                debug!(path = %dir.display(), error = %e, "No manifest directory");
                Vec::new()
            }
        }
    }

    async fn read_json(&self, path: &Path) -> Result<serde_json::Value> {
        let raw = self.fs.read_to_string(path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn load_skills(&self, root: &Path) -> Vec<SkillRecord> {
        let dirs = self.subdirectories(&root.join("skills")).await;
        let skills = join_all(dirs.into_iter().map(|(name, path)| async move {
            let path_str = path.display().to_string();
            match self.read_json(&path.join("skill.json")).await {
                Ok(config) => SkillRecord {
                    description: json_str(&config, "description").unwrap_or_default(),
                    category: json_str(&config, "category").unwrap_or_else(default_category),
                    enabled: config.get("enabled").and_then(|v| v.as_bool()) != Some(false),
                    path: path_str,
                    name,
                },
                Err(_) => SkillRecord {
                    description: format!("Skill: {}", name),
                    category: default_category(),
                    enabled: true,
                    path: path_str,
                    name,
                },
            }
        }))
        .await;

        let total = skills.len();
        let skills = dedupe_by_name(skills);
        debug!(total, unique = skills.len(), "Loaded skills");
        skills
    }

    async fn load_mcp_servers(&self, root: &Path) -> Vec<McpServerRecord> {
        let dirs: Vec<_> = self
            .subdirectories(root)
            .await
            .into_iter()
            .filter(|(name, _)| name.starts_with("mcp-"))
            .collect();

        let batches = join_all(dirs.into_iter().map(|(dir_name, path)| async move {
            let config = match self.read_json(&path.join("mcp-config.json")).await {
                Ok(config) => config,
                Err(e) => {
                    warn!(dir = %dir_name, error = %e, "Failed to load MCP manifest");
                    return Vec::new();
                }
            };
            let Some(servers) = config.get("mcpServers").and_then(|v| v.as_object()) else {
                warn!(dir = %dir_name, "MCP manifest has no mcpServers object");
                return Vec::new();
            };
            servers
                .iter()
                .map(|(name, server)| McpServerRecord {
                    name: name.clone(),
                    description: json_str(server, "description").unwrap_or_default(),
                    command: json_str(server, "command"),
                    args: server
                        .get("args")
                        .and_then(|v| v.as_array())
                        .map(|a| a.iter().filter_map(|s| s.as_str().map(str::to_string)).collect())
                        .unwrap_or_default(),
                    env: server
                        .get("env")
                        .and_then(|v| v.as_object())
                        .map(|m| {
                            m.iter()
                                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                                .collect()
                        })
                        .unwrap_or_default(),
                    enabled: server.get("enabled").and_then(|v| v.as_bool()) != Some(false),
                    source: dir_name.clone(),
                })
                .collect()
        }))
        .await;

        let servers: Vec<_> = batches.into_iter().flatten().collect();
        let total = servers.len();
        let servers = dedupe_by_name(servers);
        debug!(total, unique = servers.len(), "Loaded MCP servers");
        servers
    }

    async fn load_plugins(&self, root: &Path) -> Vec<PluginRecord> {
        let dirs = self.subdirectories(&root.join("plugins")).await;
        let plugins = join_all(dirs.into_iter().map(|(name, path)| async move {
            let path_str = path.display().to_string();
            match self.read_json(&path.join("package.json")).await {
                Ok(package) => PluginRecord {
                    version: json_str(&package, "version").unwrap_or_else(default_version),
                    description: json_str(&package, "description").unwrap_or_default(),
                    config: package
                        .get("claudeConfig")
                        .cloned()
                        .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
                    enabled: true,
                    path: path_str,
                    name,
                },
                Err(_) => PluginRecord {
                    version: default_version(),
                    description: format!("Plugin: {}", name),
                    config: serde_json::Value::Null,
                    enabled: true,
                    path: path_str,
                    name,
                },
            }
        }))
        .await;

        let total = plugins.len();
        let plugins = dedupe_by_name(plugins);
        debug!(total, unique = plugins.len(), "Loaded plugins");
        plugins
    }
}

fn json_str(value: &serde_json::Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl ConfigSource for ManifestConfigSource {
    async fn load(&self, root: &Path) -> Result<ConfigSnapshot> {
        if !self.fs.exists(root).await {
            return Err(Error::unavailable(
                root.display().to_string(),
                "config root does not exist",
            ));
        }

        let (skills, mcp_servers, plugins) = tokio::join!(
            self.load_skills(root),
            self.load_mcp_servers(root),
            self.load_plugins(root),
        );

        info!(
            root = %root.display(),
            skills = skills.len(),
            mcp_servers = mcp_servers.len(),
            plugins = plugins.len(),
            "Loaded config manifests"
        );

        Ok(ConfigSnapshot {
            skills,
            mcp_servers,
            plugins,
        })
    }
}

/// Category definition: id, title, color, item kind, sector start angle
struct Category {
    id: &'static str,
    title: &'static str,
    color: &'static str,
    kind: NodeKind,
    angle: f64,
}

const CATEGORIES: [Category; 3] = [
    Category {
        id: "category-skills",
        title: "Skills",
        color: "#10B981",
        kind: NodeKind::Skill,
        angle: 0.0,
    },
    Category {
        id: "category-mcp",
        title: "MCP Servers",
        color: "#06B6D4",
        kind: NodeKind::Mcp,
        angle: SECTOR,
    },
    Category {
        id: "category-plugins",
        title: "Plugins",
        color: "#F59E0B",
        kind: NodeKind::Plugin,
        angle: 2.0 * SECTOR,
    },
];

/// Point on the z = 0 plane
fn ring_position(radius: f64, angle: f64) -> [f64; 3] {
    [radius * angle.cos(), radius * angle.sin(), 0.0]
}

/// Builds the config hierarchy from a [`ConfigSource`]
pub struct ConfigIngestionService {
    source: Arc<dyn ConfigSource>,
}

impl ConfigIngestionService {
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self { source }
    }

    /// Read the snapshot for `root` and build its graph
    pub async fn load(&self, root: &Path) -> Result<(ConfigSnapshot, GraphData)> {
        let snapshot = self.source.load(root).await?;
        let graph = Self::ingest(&snapshot);
        Ok((snapshot, graph))
    }

    /// Build the root → category → item hierarchy; pure and deterministic
    pub fn ingest(snapshot: &ConfigSnapshot) -> GraphData {
        let mut nodes = Vec::new();
        let mut connections = Vec::new();

        nodes.push(
            Node::new(ROOT_ID, NodeKind::Config, "Claude System")
                .with_description("Central AI agent")
                .with_tags(["center", "claude", "system"])
                .with_importance(1.0)
                .with_visual(Visual::for_kind(NodeKind::Config).with_color("#0066FF").with_size(2.0).with_glow(true)),
        );

        for category in &CATEGORIES {
            nodes.push(
                Node::new(category.id, NodeKind::Category, category.title)
                    .with_description(format!("Claude {} Configuration", category.title))
                    .with_tags(["category", "claude"])
                    .with_importance(1.0)
                    .with_position(ring_position(CATEGORY_RADIUS, category.angle))
                    .with_attribute("category", category.kind.as_str())
                    .with_visual(
                        Visual::for_kind(NodeKind::Category)
                            .with_color(category.color)
                            .with_size(1.5)
                            .with_glow(true),
                    ),
            );
            connections.push(
                Connection::new(ROOT_ID, category.id, ConnectionKind::ParentChild)
                    .with_id(format!("{}-{}", ROOT_ID, category.id))
                    .with_strength(CATEGORY_STRENGTH),
            );
        }

        let [skills, mcp, plugins] = &CATEGORIES;
        emit_items(&mut nodes, &mut connections, skills, &snapshot.skills, |s, node| {
            node.with_attribute("category", s.category.as_str())
        });
        emit_items(&mut nodes, &mut connections, mcp, &snapshot.mcp_servers, |m, node| {
            let node = node
                .with_attribute("args", m.args.clone())
                .with_attribute("source", m.source.as_str());
            match &m.command {
                Some(command) => node.with_attribute("command", command.as_str()),
                None => node,
            }
        });
        emit_items(&mut nodes, &mut connections, plugins, &snapshot.plugins, |p, node| {
            node.with_attribute("version", p.version.as_str())
        });

        debug!(
            node_count = nodes.len(),
            connection_count = connections.len(),
            "Built config hierarchy"
        );
        GraphData::new(nodes, connections)
    }
}

/// Fan `items` across the category's sector; divisor `n + 1` keeps them off the sector edges
fn emit_items<T, F>(
    nodes: &mut Vec<Node>,
    connections: &mut Vec<Connection>,
    category: &Category,
    items: &[T],
    decorate: F,
) where
    T: ConfigItem + Serialize,
    F: Fn(&T, Node) -> Node,
{
    let step = SECTOR / (items.len() + 1) as f64;
    let kind = category.kind;

    for (i, item) in items.iter().enumerate() {
        let angle = category.angle + step * (i + 1) as f64;
        let id = format!("{}-{}", kind.as_str(), item.name());
        let description = if item.description().is_empty() {
            format!("{}: {}", kind.as_str(), item.name())
        } else {
            item.description().to_string()
        };
        let content = serde_json::to_string_pretty(item).unwrap_or_default();
        let enabled = item.enabled();

        let visual = if enabled {
            Visual::for_kind(kind).with_color(category.color).with_size(1.0).with_glow(true)
        } else {
            Visual::for_kind(kind).with_color(DISABLED_COLOR).with_size(0.6).with_glow(false)
        };

        let node = Node::new(&id, kind, item.name())
            .with_description(description)
            .with_source_path(item.path())
            .with_size(content.len() as u64)
            .with_content(content)
            .with_tags([kind.as_str(), "claude"])
            .with_enabled(enabled)
            .with_importance(if enabled { 0.8 } else { 0.3 })
            .with_position(ring_position(ITEM_RADIUS, angle))
            .with_visual(visual);
        nodes.push(decorate(item, node));

        connections.push(
            Connection::new(category.id, &id, ConnectionKind::ParentChild)
                .with_id(format!("{}-{}", category.id, id))
                .with_strength(ITEM_STRENGTH),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    fn skill(name: &str, enabled: bool) -> SkillRecord {
        SkillRecord {
            name: name.to_string(),
            description: String::new(),
            category: "general".to_string(),
            path: String::new(),
            enabled,
        }
    }

    fn plugin(name: &str) -> PluginRecord {
        PluginRecord {
            name: name.to_string(),
            version: default_version(),
            description: "p".to_string(),
            path: String::new(),
            enabled: true,
            config: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_ingest_counts() {
        let snapshot = ConfigSnapshot {
            skills: vec![skill("a", true), skill("b", true), skill("c", false)],
            mcp_servers: vec![],
            plugins: vec![plugin("x"), plugin("y")],
        };
        let data = ConfigIngestionService::ingest(&snapshot);

        let count = |kind| data.nodes.iter().filter(|n| n.kind == kind).count();
        assert_eq!(count(NodeKind::Config), 1);
        assert_eq!(count(NodeKind::Category), 3);
        assert_eq!(count(NodeKind::Skill) + count(NodeKind::Plugin) + count(NodeKind::Mcp), 5);

        let from_root = data.connections.iter().filter(|c| c.source == ROOT_ID).count();
        let from_categories = data.connections.iter().filter(|c| c.source != ROOT_ID).count();
        assert_eq!(from_root, 3);
        assert_eq!(from_categories, 5);

        assert!(data.node("category-mcp").is_some());
        assert!(!data.connections.iter().any(|c| c.source == "category-mcp"));
    }

    #[test]
    fn test_category_positions() {
        let data = ConfigIngestionService::ingest(&ConfigSnapshot::default());
        let root = data.node(ROOT_ID).unwrap();
        assert_eq!(root.position, [0.0, 0.0, 0.0]);
        assert_eq!(root.title, "Claude System");

        let skills = data.node("category-skills").unwrap();
        assert!((skills.position[0] - 15.0).abs() < 1e-9);
        assert!(skills.position[1].abs() < 1e-9);

        let mcp = data.node("category-mcp").unwrap();
        assert!((mcp.position[0] + 7.5).abs() < 1e-9);
        assert!((mcp.position[1] - 15.0 * (3f64.sqrt() / 2.0)).abs() < 1e-9);

        for conn in &data.connections {
            assert_eq!(conn.kind, ConnectionKind::ParentChild);
            assert_eq!(conn.strength, CATEGORY_STRENGTH);
        }
    }

    #[test]
    fn test_item_angles_subdivide_sector() {
        let snapshot = ConfigSnapshot {
            skills: vec![skill("one", true), skill("two", true), skill("three", true)],
            ..Default::default()
        };
        let data = ConfigIngestionService::ingest(&snapshot);
        let step = SECTOR / 4.0;
        for (i, name) in ["one", "two", "three"].iter().enumerate() {
            let node = data.node(&format!("skill-{}", name)).unwrap();
            let expected = ring_position(ITEM_RADIUS, step * (i + 1) as f64);
            for axis in 0..3 {
                assert!((node.position[axis] - expected[axis]).abs() < 1e-9);
            }
            let angle = node.position[1].atan2(node.position[0]);
            assert!(angle > 0.0 && angle < SECTOR);
        }
    }

    #[test]
    fn test_enabled_styling() {
        let snapshot = ConfigSnapshot {
            skills: vec![skill("on", true), skill("off", false)],
            ..Default::default()
        };
        let data = ConfigIngestionService::ingest(&snapshot);

        let on = data.node("skill-on").unwrap();
        assert_eq!(on.visual.color, "#10B981");
        assert_eq!(on.importance, 0.8);
        assert!(on.visual.glow);
        assert_eq!(on.description, "skill: on");

        let off = data.node("skill-off").unwrap();
        assert_eq!(off.visual.color, DISABLED_COLOR);
        assert_eq!(off.visual.size, 0.6);
        assert_eq!(off.importance, 0.3);
        assert!(!off.visual.glow);
        assert!(!off.enabled);

        let edge = data
            .connections
            .iter()
            .find(|c| c.target == "skill-off")
            .unwrap();
        assert_eq!(edge.strength, ITEM_STRENGTH);
        assert_eq!(edge.id, "category-skills-skill-off");
    }

    #[test]
    fn test_dedupe_last_wins_first_position() {
        let mut first = skill("a", true);
        first.description = "first".to_string();
        let mut last = skill("a", false);
        last.description = "last".to_string();
        let unique = dedupe_by_name(vec![first, skill("b", true), last]);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].name, "a");
        assert_eq!(unique[0].description, "last");
        assert_eq!(unique[1].name, "b");
    }

    #[test]
    fn test_sample_snapshot() {
        let stats = ConfigSnapshot::sample().stats();
        assert_eq!(stats.total_skills, 3);
        assert_eq!(stats.total_mcp_servers, 2);
        assert_eq!(stats.total_plugins, 2);
        assert_eq!(stats.enabled_plugins, 2);
    }

    #[tokio::test]
    async fn test_manifest_source_reads_layout() {
        let fs = MemoryFileSystem::new();
        fs.add_file(
            "/c/skills/review/skill.json",
            r#"{"description": "Code review", "category": "quality", "enabled": false}"#,
        );
        fs.add_dir("/c/skills/bare");
        fs.add_file(
            "/c/mcp-one/mcp-config.json",
            r#"{"mcpServers": {"zeta": {"command": "z"}, "alpha": {"description": "A", "args": ["--x"]}}}"#,
        );
        fs.add_file(
            "/c/mcp-two/mcp-config.json",
            r#"{"mcpServers": {"alpha": {"description": "A2", "enabled": false}}}"#,
        );
        fs.add_file("/c/mcp-broken/mcp-config.json", "{not json");
        fs.add_file("/c/mcp-empty/mcp-config.json", r#"{"other": 1}"#);
        fs.add_file(
            "/c/plugins/tools/package.json",
            r#"{"version": "2.1.0", "description": "Tools", "claudeConfig": {"x": 1}}"#,
        );
        fs.add_dir("/c/plugins/plain");

        let source = ManifestConfigSource::new(Arc::new(fs));
        let snapshot = source.load(Path::new("/c")).await.unwrap();

        assert_eq!(snapshot.skills.len(), 2);
        let bare = snapshot.skills.iter().find(|s| s.name == "bare").unwrap();
        assert_eq!(bare.description, "Skill: bare");
        assert_eq!(bare.category, "general");
        assert!(bare.enabled);
        let review = snapshot.skills.iter().find(|s| s.name == "review").unwrap();
        assert_eq!(review.category, "quality");
        assert!(!review.enabled);

        // Sorted keys within a manifest, later directory wins on collision
        let names: Vec<_> = snapshot.mcp_servers.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(snapshot.mcp_servers[0].description, "A2");
        assert_eq!(snapshot.mcp_servers[0].source, "mcp-two");
        assert!(!snapshot.mcp_servers[0].enabled);

        let tools = snapshot.plugins.iter().find(|p| p.name == "tools").unwrap();
        assert_eq!(tools.version, "2.1.0");
        let plain = snapshot.plugins.iter().find(|p| p.name == "plain").unwrap();
        assert_eq!(plain.description, "Plugin: plain");
        assert_eq!(plain.version, "1.0.0");
    }

    #[tokio::test]
    async fn test_manifest_source_missing_root() {
        let source = ManifestConfigSource::new(Arc::new(MemoryFileSystem::new()));
        let err = source.load(Path::new("/nowhere")).await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_manifest_source_empty_root() {
        let fs = MemoryFileSystem::new();
        fs.add_dir("/c");
        let source = ManifestConfigSource::new(Arc::new(fs));
        let snapshot = source.load(Path::new("/c")).await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_service_load_with_static_source() {
        let service = ConfigIngestionService::new(Arc::new(StaticConfigSource::new(
            ConfigSnapshot::sample(),
        )));
        let (snapshot, graph) = service.load(Path::new("/any")).await.unwrap();
        assert_eq!(snapshot.skills.len(), 3);
        assert_eq!(graph.nodes.len(), 1 + 3 + 7);
        assert_eq!(graph.connections.len(), 3 + 7);
    }
}
