//! Level layout from a breadth-first topological ordering (Kahn's algorithm)

use std::collections::{HashMap, VecDeque};

use super::LayoutResult;
use crate::graph::{Connection, Node};

/// Spacing between levels and between siblings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HierarchicalOptions {
    pub level_spacing: f64,
    pub node_spacing: f64,
}

impl Default for HierarchicalOptions {
    fn default() -> Self {
        Self {
            level_spacing: 10.0,
            node_spacing: 5.0,
        }
    }
}

/// Group node indices into levels
///
/// Zero in-degree nodes form level 0. When every node has an incoming edge
/// the first node seeds the traversal. Nodes never reached end up together
/// in one trailing level.
fn levels(nodes: &[Node], connections: &[Connection]) -> Vec<Vec<usize>> {
    let mut ids: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        ids.entry(node.id.as_str()).or_insert(i);
    }

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut in_degree = vec![0usize; nodes.len()];
    for conn in connections {
        let (Some(&source), Some(&target)) =
            (ids.get(conn.source.as_str()), ids.get(conn.target.as_str()))
        else {
            continue;
        };
        if adjacency[source].contains(&target) {
            continue;
        }
        adjacency[source].push(target);
        in_degree[target] += 1;
    }

    let mut placed = vec![false; nodes.len()];
    let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    if queue.is_empty() && !nodes.is_empty() {
        queue.push_back(0);
    }
    for &i in &queue {
        placed[i] = true;
    }

    let mut levels = Vec::new();
    while !queue.is_empty() {
        let current: Vec<usize> = queue.drain(..).collect();
        for &i in &current {
            for &next in &adjacency[i] {
                in_degree[next] = in_degree[next].saturating_sub(1);
                if in_degree[next] == 0 && !placed[next] {
                    placed[next] = true;
                    queue.push_back(next);
                }
            }
        }
        levels.push(current);
    }

    let remaining: Vec<usize> = (0..nodes.len()).filter(|&i| !placed[i]).collect();
    if !remaining.is_empty() {
        levels.push(remaining);
    }
    levels
}

pub(super) fn layout(
    nodes: &[Node],
    connections: &[Connection],
    options: &HierarchicalOptions,
) -> LayoutResult {
    let mut positions = vec![[0.0; 3]; nodes.len()];
    for (level, members) in levels(nodes, connections).iter().enumerate() {
        let center = (members.len() as f64 - 1.0) / 2.0;
        for (p, &i) in members.iter().enumerate() {
            positions[i] = [
                (p as f64 - center) * options.node_spacing,
                -(level as f64) * options.level_spacing,
                0.0,
            ];
        }
    }

    let placed = nodes
        .iter()
        .zip(positions)
        .map(|(node, position)| {
            let mut node = node.clone();
            node.position = position;
            node
        })
        .collect();
    LayoutResult::new(placed, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ConnectionKind, NodeKind};

    fn nodes(ids: &[&str]) -> Vec<Node> {
        ids.iter().map(|id| Node::new(*id, NodeKind::Document, *id)).collect()
    }

    fn edge(source: &str, target: &str) -> Connection {
        Connection::new(source, target, ConnectionKind::ParentChild)
    }

    #[test]
    fn test_tree_levels_are_centered() {
        let nodes = nodes(&["root", "left", "right", "leaf"]);
        let connections = vec![edge("root", "left"), edge("root", "right"), edge("left", "leaf")];
        let result = layout(&nodes, &connections, &HierarchicalOptions::default());

        assert_eq!(result.node("root").unwrap().position, [0.0, 0.0, 0.0]);
        assert_eq!(result.node("left").unwrap().position, [-2.5, -10.0, 0.0]);
        assert_eq!(result.node("right").unwrap().position, [2.5, -10.0, 0.0]);
        assert_eq!(result.node("leaf").unwrap().position, [0.0, -20.0, 0.0]);
    }

    #[test]
    fn test_full_cycle_terminates() {
        let nodes = nodes(&["a", "b", "c"]);
        let connections = vec![edge("a", "b"), edge("b", "c"), edge("c", "a")];
        let levels = levels(&nodes, &connections);
        assert_eq!(levels, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_unreached_cycle_goes_to_final_level() {
        // d is a root; x and y only point at each other
        let nodes = nodes(&["x", "y", "d"]);
        let connections = vec![edge("x", "y"), edge("y", "x")];
        let levels = levels(&nodes, &connections);
        assert_eq!(levels, vec![vec![2], vec![0, 1]]);

        let result = layout(&nodes, &connections, &HierarchicalOptions::default());
        assert_eq!(result.node("x").unwrap().position, [-2.5, -10.0, 0.0]);
    }

    #[test]
    fn test_unknown_and_duplicate_edges_ignored() {
        let nodes = nodes(&["a", "b"]);
        let connections = vec![edge("a", "b"), edge("a", "b"), edge("ghost", "a")];
        let levels = levels(&nodes, &connections);
        assert_eq!(levels, vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_every_node_placed_once() {
        let nodes = nodes(&["a", "b", "c", "d", "e"]);
        let connections = vec![
            edge("a", "b"),
            edge("b", "c"),
            edge("c", "b"),
            edge("d", "e"),
            edge("e", "d"),
        ];
        let mut seen: Vec<usize> = levels(&nodes, &connections).into_iter().flatten().collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }
}
