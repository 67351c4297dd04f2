//! Golden-angle distribution over a sphere surface

use std::f64::consts::PI;

use super::LayoutResult;
use crate::graph::Node;

pub(super) fn layout(nodes: &[Node], radius: f64) -> LayoutResult {
    let n = nodes.len() as f64;
    let placed = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let i = i as f64;
            let phi = (1.0 - 2.0 * (i + 0.5) / n).acos();
            let theta = PI * (1.0 + 5f64.sqrt()) * i;

            let mut node = node.clone();
            node.position = [
                radius * phi.sin() * theta.cos(),
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
            ];
            node
        })
        .collect();
    LayoutResult::new(placed, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;

    #[test]
    fn test_points_lie_on_sphere() {
        let nodes: Vec<_> = (0..50)
            .map(|i| Node::new(i.to_string(), NodeKind::Document, "n"))
            .collect();
        let result = layout(&nodes, 20.0);
        for node in &result.nodes {
            let [x, y, z] = node.position;
            assert!(((x * x + y * y + z * z).sqrt() - 20.0).abs() < 1e-9);
        }
        // First point sits near the +z pole, last near -z
        assert!(result.nodes[0].position[2] > 19.0);
        assert!(result.nodes[49].position[2] < -19.0);
    }

    #[test]
    fn test_single_node_on_equator() {
        let result = layout(&[Node::new("a", NodeKind::Skill, "A")], 10.0);
        let [x, y, z] = result.nodes[0].position;
        assert!((x - 10.0).abs() < 1e-9);
        assert!(y.abs() < 1e-9);
        assert!(z.abs() < 1e-9);
    }
}
