//! Directed, typed, weighted edges between nodes

use serde::{Deserialize, Serialize};

/// A directed relationship between two node ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: ConnectionKind,
    /// Spring weight in `[0, 1]`, read only by the force layout
    pub strength: f32,
}

impl Connection {
    /// Create a connection with id `<source>-><target>` and full strength
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: ConnectionKind) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("{source}->{target}"),
            source,
            target,
            kind,
            strength: 1.0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set strength (clamped to 0.0-1.0)
    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength.clamp(0.0, 1.0);
        self
    }

    /// Whether this edge touches the given node
    pub fn involves(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// Types of relationships between nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionKind {
    BelongsTo,
    ChildOf,
    Imports,
    Reference,
    ParentChild,
    Dependency,
    Related,
}

impl ConnectionKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BelongsTo => "belongsTo",
            Self::ChildOf => "childOf",
            Self::Imports => "imports",
            Self::Reference => "reference",
            Self::ParentChild => "parentChild",
            Self::Dependency => "dependency",
            Self::Related => "related",
        }
    }

    /// Parse from string, accepting camelCase, kebab-case and snake_case spellings
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "belongsto" => Some(Self::BelongsTo),
            "childof" => Some(Self::ChildOf),
            "imports" | "import" => Some(Self::Imports),
            "reference" | "ref" => Some(Self::Reference),
            "parentchild" => Some(Self::ParentChild),
            "dependency" | "dependson" => Some(Self::Dependency),
            "related" | "default" => Some(Self::Related),
            _ => None,
        }
    }

    pub fn all() -> &'static [ConnectionKind] {
        &[
            Self::BelongsTo,
            Self::ChildOf,
            Self::Imports,
            Self::Reference,
            Self::ParentChild,
            Self::Dependency,
            Self::Related,
        ]
    }
}

impl std::fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_defaults() {
        let conn = Connection::new("a", "b", ConnectionKind::Reference).with_strength(0.8);
        assert_eq!(conn.id, "a->b");
        assert_eq!(conn.strength, 0.8);
        assert!(conn.involves("a"));
        assert!(!conn.involves("c"));
    }

    #[test]
    fn test_strength_is_clamped() {
        let conn = Connection::new("a", "b", ConnectionKind::Related).with_strength(-2.0);
        assert_eq!(conn.strength, 0.0);
    }

    #[test]
    fn test_kind_parse_spellings() {
        assert_eq!(ConnectionKind::parse("parent-child"), Some(ConnectionKind::ParentChild));
        assert_eq!(ConnectionKind::parse("belongsTo"), Some(ConnectionKind::BelongsTo));
        assert_eq!(ConnectionKind::parse("child_of"), Some(ConnectionKind::ChildOf));
        assert_eq!(ConnectionKind::parse("default"), Some(ConnectionKind::Related));
        assert_eq!(ConnectionKind::parse("sibling"), None);
        for kind in ConnectionKind::all() {
            assert_eq!(ConnectionKind::parse(kind.as_str()), Some(*kind));
        }
    }

    #[test]
    fn test_kind_serializes_camel_case() {
        let json = serde_json::to_string(&ConnectionKind::ParentChild).unwrap();
        assert_eq!(json, "\"parentChild\"");
    }
}
