//! Graph batches and merging

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Connection, Node};

/// One batch of nodes and connections produced by an adapter or ingestion service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
}

impl GraphData {
    pub fn new(nodes: Vec<Node>, connections: Vec<Connection>) -> Self {
        Self { nodes, connections }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Concatenate batches in order, then drop connections whose endpoint
    /// is not a node of the merged result
    ///
    /// Nodes are not de-duplicated across batches.
    pub fn merge<I>(batches: I) -> Self
    where
        I: IntoIterator<Item = GraphData>,
    {
        let mut merged = GraphData::default();
        for batch in batches {
            merged.nodes.extend(batch.nodes);
            merged.connections.extend(batch.connections);
        }
        merged.prune_dangling();
        merged
    }

    /// Remove connections referencing ids absent from `nodes`; returns how many were dropped
    pub fn prune_dangling(&mut self) -> usize {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        let before = self.connections.len();
        self.connections
            .retain(|c| ids.contains(c.source.as_str()) && ids.contains(c.target.as_str()));
        let dropped = before - self.connections.len();
        if dropped > 0 {
            debug!(dropped, "Dropped dangling connections");
        }
        dropped
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Node and connection counts plus distinct `category` attributes in first-seen order
    pub fn statistics(&self) -> GraphStatistics {
        let mut categories: Vec<String> = Vec::new();
        for node in &self.nodes {
            if let Some(category) = node.attribute_str("category") {
                if !categories.iter().any(|c| c == category) {
                    categories.push(category.to_string());
                }
            }
        }
        GraphStatistics {
            node_count: self.nodes.len(),
            connection_count: self.connections.len(),
            categories,
        }
    }
}

/// Summary counts for a graph batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub node_count: usize,
    pub connection_count: usize,
    pub categories: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ConnectionKind, NodeKind};

    fn node(id: &str) -> Node {
        Node::new(id, NodeKind::Document, id)
    }

    #[test]
    fn test_merge_concatenates_in_order() {
        let a = GraphData::new(vec![node("a"), node("b")], vec![]);
        let b = GraphData::new(vec![node("c")], vec![]);
        let merged = GraphData::merge([a, b]);
        let ids: Vec<_> = merged.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_merge_keeps_cross_batch_connections() {
        let a = GraphData::new(
            vec![node("a")],
            vec![Connection::new("a", "c", ConnectionKind::Related)],
        );
        let b = GraphData::new(vec![node("c")], vec![]);
        let merged = GraphData::merge([a, b]);
        assert_eq!(merged.connections.len(), 1);
    }

    #[test]
    fn test_merge_drops_dangling_connections() {
        let a = GraphData::new(
            vec![node("a")],
            vec![
                Connection::new("a", "ghost", ConnectionKind::Reference),
                Connection::new("ghost", "a", ConnectionKind::Reference),
            ],
        );
        let merged = GraphData::merge([a]);
        assert!(merged.connections.is_empty());
        assert_eq!(merged.nodes.len(), 1);
    }

    #[test]
    fn test_merge_keeps_duplicate_ids_across_batches() {
        let merged = GraphData::merge([
            GraphData::new(vec![node("x")], vec![]),
            GraphData::new(vec![node("x")], vec![]),
        ]);
        assert_eq!(merged.nodes.len(), 2);
    }

    #[test]
    fn test_statistics_categories() {
        let data = GraphData::new(
            vec![
                node("a").with_attribute("category", "dev"),
                node("b").with_attribute("category", "ops"),
                node("c").with_attribute("category", "dev"),
                node("d"),
            ],
            vec![Connection::new("a", "b", ConnectionKind::Related)],
        );
        let stats = data.statistics();
        assert_eq!(stats.node_count, 4);
        assert_eq!(stats.connection_count, 1);
        assert_eq!(stats.categories, vec!["dev", "ops"]);
    }
}
