//! Orbital layout: three concentric rings classified by node kind

use std::f64::consts::PI;

use rand::Rng;
use tracing::warn;

use super::LayoutResult;
use crate::graph::{Node, NodeKind, Orbit};

/// Radius and capacity of one ring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitDefinition {
    pub orbit: Orbit,
    pub radius: f64,
    /// `None` means unbounded
    pub capacity: Option<usize>,
}

pub const ORBITS: [OrbitDefinition; 3] = [
    OrbitDefinition {
        orbit: Orbit::Inner,
        radius: 17.5,
        capacity: Some(12),
    },
    OrbitDefinition {
        orbit: Orbit::Middle,
        radius: 30.0,
        capacity: Some(24),
    },
    OrbitDefinition {
        orbit: Orbit::Outer,
        radius: 47.5,
        capacity: None,
    },
];

const ANGLE_JITTER: f64 = 0.25;
const HEIGHT_STEP: f64 = 2.0;
const HEIGHT_JITTER: f64 = 0.5;

fn classify(node: &Node) -> Orbit {
    match node.kind {
        NodeKind::Category => Orbit::Inner,
        NodeKind::Skill | NodeKind::Mcp => Orbit::Middle,
        _ => Orbit::Outer,
    }
}

pub(super) fn layout(nodes: &[Node], rng: &mut impl Rng) -> LayoutResult {
    let mut placed = Vec::with_capacity(nodes.len());
    let mut omitted = Vec::new();

    for definition in &ORBITS {
        let members: Vec<&Node> = nodes.iter().filter(|n| classify(n) == definition.orbit).collect();
        let kept = match definition.capacity {
            Some(capacity) if members.len() > capacity => {
                warn!(
                    orbit = definition.orbit.index(),
                    count = members.len(),
                    capacity,
                    "Orbit over capacity, omitting excess nodes"
                );
                omitted.extend(members[capacity..].iter().map(|n| n.id.clone()));
                &members[..capacity]
            }
            _ => &members[..],
        };

        let step = 2.0 * PI / kept.len().max(1) as f64;
        let lift = (f64::from(definition.orbit.index()) - 2.0) * HEIGHT_STEP;
        for (i, node) in kept.iter().enumerate() {
            let angle = i as f64 * step + rng.gen_range(-ANGLE_JITTER..ANGLE_JITTER);
            let y = lift + rng.gen_range(-HEIGHT_JITTER..HEIGHT_JITTER);

            let mut node = (*node).clone();
            node.position = [
                definition.radius * angle.cos(),
                y,
                definition.radius * angle.sin(),
            ];
            node.orbit = Some(definition.orbit);
            node.tier = Some(definition.orbit.tier());
            placed.push(node);
        }
    }

    LayoutResult::new(placed, omitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Tier;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn nodes_of(kind: NodeKind, count: usize, prefix: &str) -> Vec<Node> {
        (0..count)
            .map(|i| Node::new(format!("{}-{}", prefix, i), kind, prefix))
            .collect()
    }

    fn radius(node: &Node) -> f64 {
        (node.position[0].powi(2) + node.position[2].powi(2)).sqrt()
    }

    #[test]
    fn test_classification_and_rings() {
        let mut nodes = nodes_of(NodeKind::Document, 2, "doc");
        nodes.extend(nodes_of(NodeKind::Category, 1, "cat"));
        nodes.extend(nodes_of(NodeKind::Mcp, 1, "mcp"));
        nodes.extend(nodes_of(NodeKind::Plugin, 1, "plugin"));

        let result = layout(&nodes, &mut StdRng::seed_from_u64(1));

        // Grouped by orbit, input order within an orbit
        let ids: Vec<_> = result.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["cat-0", "mcp-0", "doc-0", "doc-1", "plugin-0"]);

        let cat = result.node("cat-0").unwrap();
        assert_eq!(cat.orbit, Some(Orbit::Inner));
        assert_eq!(cat.tier, Some(Tier::CoreSkill));
        assert!((radius(cat) - 17.5).abs() < 1e-9);
        assert!(cat.position[1] >= -2.5 && cat.position[1] < -1.5);

        let mcp = result.node("mcp-0").unwrap();
        assert_eq!(mcp.tier, Some(Tier::Skill));
        assert!((radius(mcp) - 30.0).abs() < 1e-9);

        let plugin = result.node("plugin-0").unwrap();
        assert_eq!(plugin.orbit, Some(Orbit::Outer));
        assert!((radius(plugin) - 47.5).abs() < 1e-9);
        assert!(plugin.position[1] >= 1.5 && plugin.position[1] < 2.5);
    }

    #[test]
    fn test_overflow_is_truncated_not_wrapped() {
        let mut nodes = nodes_of(NodeKind::Category, 15, "cat");
        nodes.extend(nodes_of(NodeKind::Skill, 30, "skill"));
        nodes.extend(nodes_of(NodeKind::Document, 100, "doc"));

        let result = layout(&nodes, &mut StdRng::seed_from_u64(2));

        let in_orbit = |orbit| result.nodes.iter().filter(|n| n.orbit == Some(orbit)).count();
        assert_eq!(in_orbit(Orbit::Inner), 12);
        assert_eq!(in_orbit(Orbit::Middle), 24);
        assert_eq!(in_orbit(Orbit::Outer), 100);

        // The first nodes are kept, the rest are reported and absent from the map
        assert!(result.node("cat-11").is_some());
        assert!(result.node("cat-12").is_none());
        assert!(result.node("skill-24").is_none());
        assert_eq!(result.omitted.len(), 3 + 6);
        assert_eq!(result.omitted[0], "cat-12");
        assert_eq!(result.index.len(), 136);
    }

    #[test]
    fn test_angles_stay_within_jitter() {
        let nodes = nodes_of(NodeKind::Skill, 4, "skill");
        let result = layout(&nodes, &mut StdRng::seed_from_u64(3));
        for (i, node) in result.nodes.iter().enumerate() {
            let expected = i as f64 * PI / 2.0;
            let actual = node.position[2].atan2(node.position[0]);
            let mut delta = (actual - expected).rem_euclid(2.0 * PI);
            if delta > PI {
                delta -= 2.0 * PI;
            }
            assert!(delta.abs() <= ANGLE_JITTER + 1e-9, "node {} off by {}", i, delta);
        }
    }
}
