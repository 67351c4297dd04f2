//! Node types for the knowledge graph
//!
//! A node is a single visualizable entity: a document, a config item,
//! a synthetic category or root. Every node carries its kind-derived
//! visual defaults so renderers never have to look them up.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A visualizable graph entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Stable identifier, unique within a batch
    pub id: String,
    /// Closed classification, immutable once created
    pub kind: NodeKind,
    pub title: String,
    pub description: String,
    /// Originating file or record path, empty for synthetic nodes
    pub source_path: String,
    /// Document body, empty for synthetic nodes
    pub content: String,
    /// Case-sensitive, de-duplicated tags
    pub tags: Vec<String>,
    /// Raw cross-reference strings, pre-resolution
    pub links: Vec<String>,
    /// Assigned by the layout stage
    pub tier: Option<Tier>,
    /// Assigned by the layout stage
    pub orbit: Option<Orbit>,
    /// `[0,0,0]` until a layout pass runs
    pub position: [f64; 3],
    /// Content-derived weight in `[0, 1]`
    pub importance: f32,
    /// Raw source length in bytes
    pub size: u64,
    pub enabled: bool,
    pub modified: Option<DateTime<Utc>>,
    pub visual: Visual,
    /// Adapter-specific extras (category, plugin, tools, extension, ...)
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Node {
    /// Create a node with the visual defaults of its kind
    pub fn new(id: impl Into<String>, kind: NodeKind, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            description: String::new(),
            source_path: String::new(),
            content: String::new(),
            tags: Vec::new(),
            links: Vec::new(),
            tier: None,
            orbit: None,
            position: [0.0; 3],
            importance: 0.5,
            size: 0,
            enabled: true,
            modified: None,
            visual: Visual::for_kind(kind),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_source_path(mut self, path: impl Into<String>) -> Self {
        self.source_path = path.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set tags, dropping duplicates while keeping first-seen order
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.clear();
        for tag in tags {
            self.add_tag(tag);
        }
        self
    }

    pub fn with_links(mut self, links: Vec<String>) -> Self {
        self.links = links;
        self
    }

    /// Set importance (clamped to 0.0-1.0)
    pub fn with_importance(mut self, importance: f32) -> Self {
        self.importance = importance.clamp(0.0, 1.0);
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_modified(mut self, modified: Option<DateTime<Utc>>) -> Self {
        self.modified = modified;
        self
    }

    pub fn with_position(mut self, position: [f64; 3]) -> Self {
        self.position = position;
        self
    }

    pub fn with_visual(mut self, visual: Visual) -> Self {
        self.visual = visual;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Add a tag unless an identical one is already present
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !tag.is_empty() && !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// String attribute lookup
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|v| v.as_str())
    }

    /// Whether the node has a meaningful (non-origin) position
    pub fn is_positioned(&self) -> bool {
        self.position != [0.0; 3]
    }

    /// Case-insensitive match over title, description, content and tags
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self.content.to_lowercase().contains(&query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }
}

/// Kinds of graph nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Document,
    Category,
    Error,
    Mcp,
    Skill,
    Plugin,
    Config,
}

impl NodeKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Category => "category",
            Self::Error => "error",
            Self::Mcp => "mcp",
            Self::Skill => "skill",
            Self::Plugin => "plugin",
            Self::Config => "config",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "document" | "doc" => Some(Self::Document),
            "category" => Some(Self::Category),
            "error" => Some(Self::Error),
            "mcp" | "mcp-server" | "mcp_server" => Some(Self::Mcp),
            "skill" => Some(Self::Skill),
            "plugin" => Some(Self::Plugin),
            "config" => Some(Self::Config),
            _ => None,
        }
    }

    /// Get all node kinds
    pub fn all() -> &'static [NodeKind] {
        &[
            Self::Document,
            Self::Category,
            Self::Error,
            Self::Mcp,
            Self::Skill,
            Self::Plugin,
            Self::Config,
        ]
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse classification informing size and shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    CoreSkill,
    Skill,
    Item,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoreSkill => "core_skill",
            Self::Skill => "skill",
            Self::Item => "item",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "core_skill" | "core-skill" => Some(Self::CoreSkill),
            "skill" => Some(Self::Skill),
            "item" => Some(Self::Item),
            _ => None,
        }
    }
}

/// One of three concentric placement rings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orbit {
    Inner,
    Middle,
    Outer,
}

impl Orbit {
    /// Ring number, 1 for the innermost
    pub fn index(&self) -> u8 {
        match self {
            Self::Inner => 1,
            Self::Middle => 2,
            Self::Outer => 3,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Self::Inner),
            2 => Some(Self::Middle),
            3 => Some(Self::Outer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::Middle => "middle",
            Self::Outer => "outer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "inner" | "1" => Some(Self::Inner),
            "middle" | "2" => Some(Self::Middle),
            "outer" | "3" => Some(Self::Outer),
            _ => None,
        }
    }

    /// The tier a node takes on when placed in this orbit
    pub fn tier(&self) -> Tier {
        match self {
            Self::Inner => Tier::CoreSkill,
            Self::Middle => Tier::Skill,
            Self::Outer => Tier::Item,
        }
    }

    pub fn all() -> &'static [Orbit] {
        &[Self::Inner, Self::Middle, Self::Outer]
    }
}

/// Rendered geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Sphere,
    Cube,
    Octahedron,
    Cylinder,
    Torus,
    Dodecahedron,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sphere => "sphere",
            Self::Cube => "cube",
            Self::Octahedron => "octahedron",
            Self::Cylinder => "cylinder",
            Self::Torus => "torus",
            Self::Dodecahedron => "dodecahedron",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sphere" => Some(Self::Sphere),
            "cube" | "box" => Some(Self::Cube),
            "octahedron" => Some(Self::Octahedron),
            "cylinder" => Some(Self::Cylinder),
            "torus" => Some(Self::Torus),
            "dodecahedron" => Some(Self::Dodecahedron),
            _ => None,
        }
    }
}

/// Visual styling hints for the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visual {
    pub color: String,
    pub size: f32,
    pub shape: Shape,
    pub glow: bool,
    pub icon: String,
}

impl Visual {
    /// Default styling per node kind
    pub fn for_kind(kind: NodeKind) -> Self {
        let (color, shape, glow, icon) = match kind {
            NodeKind::Document => ("#3B82F6", Shape::Sphere, true, "file"),
            NodeKind::Category => ("#8B5CF6", Shape::Cube, false, "folder"),
            NodeKind::Error => ("#EF4444", Shape::Octahedron, true, "alert"),
            NodeKind::Mcp => ("#06B6D4", Shape::Cylinder, false, "server"),
            NodeKind::Skill => ("#10B981", Shape::Torus, true, "zap"),
            NodeKind::Plugin => ("#F59E0B", Shape::Dodecahedron, false, "puzzle"),
            NodeKind::Config => ("#6B7280", Shape::Cube, false, "settings"),
        };
        Self {
            color: color.to_string(),
            size: 1.0,
            shape,
            glow,
            icon: icon.to_string(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn with_glow(mut self, glow: bool) -> Self {
        self.glow = glow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let node = Node::new("/notes/a.md", NodeKind::Document, "A")
            .with_description("first note")
            .with_importance(1.7);

        assert_eq!(node.id, "/notes/a.md");
        assert_eq!(node.importance, 1.0);
        assert_eq!(node.position, [0.0; 3]);
        assert!(!node.is_positioned());
        assert_eq!(node.visual.color, "#3B82F6");
        assert_eq!(node.visual.shape, Shape::Sphere);
        assert!(node.tier.is_none());
        assert!(node.orbit.is_none());
    }

    #[test]
    fn test_tags_are_deduplicated_case_sensitively() {
        let node = Node::new("n", NodeKind::Document, "n").with_tags(["rust", "Rust", "rust", "async"]);
        assert_eq!(node.tags, vec!["rust", "Rust", "async"]);
    }

    #[test]
    fn test_visual_defaults() {
        let skill = Visual::for_kind(NodeKind::Skill);
        assert_eq!(skill.color, "#10B981");
        assert_eq!(skill.shape, Shape::Torus);
        assert!(skill.glow);

        let plugin = Visual::for_kind(NodeKind::Plugin);
        assert_eq!(plugin.shape, Shape::Dodecahedron);
        assert!(!plugin.glow);
        assert_eq!(plugin.icon, "puzzle");
    }

    #[test]
    fn test_node_kind_parse() {
        assert_eq!(NodeKind::parse("MCP"), Some(NodeKind::Mcp));
        assert_eq!(NodeKind::parse("skill"), Some(NodeKind::Skill));
        assert_eq!(NodeKind::parse("folder"), None);
        for kind in NodeKind::all() {
            assert_eq!(NodeKind::parse(kind.as_str()), Some(*kind));
        }
    }

    #[test]
    fn test_orbit_tier_mapping() {
        assert_eq!(Orbit::Inner.tier(), Tier::CoreSkill);
        assert_eq!(Orbit::Middle.tier(), Tier::Skill);
        assert_eq!(Orbit::Outer.tier(), Tier::Item);
        assert_eq!(Orbit::from_index(2), Some(Orbit::Middle));
        assert_eq!(Orbit::from_index(4), None);
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let node = Node::new("n", NodeKind::Skill, "Code Review")
            .with_description("Reviews pull requests")
            .with_tags(["quality"]);
        assert!(node.matches("code"));
        assert!(node.matches("PULL"));
        assert!(node.matches("Qual"));
        assert!(!node.matches("deploy"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let node = Node::new("n", NodeKind::Config, "Root").with_source_path("/x");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["sourcePath"], "/x");
        assert_eq!(json["kind"], "config");
    }
}
