//! Rising planar spiral in input order

use super::LayoutResult;
use crate::graph::Node;

const ANGLE_STEP: f64 = 0.5;
const BASE_RADIUS: f64 = 10.0;
const RADIUS_STEP: f64 = 0.8;

pub(super) fn layout(nodes: &[Node], spacing: f64) -> LayoutResult {
    let offset = nodes.len() as f64 * spacing / 2.0;
    let placed = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let i = i as f64;
            let angle = i * ANGLE_STEP;
            let radius = BASE_RADIUS + i * RADIUS_STEP;

            let mut node = node.clone();
            node.position = [angle.cos() * radius, i * spacing - offset, angle.sin() * radius];
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
    fn test_spiral_positions() {
        let nodes: Vec<_> = (0..4)
            .map(|i| Node::new(i.to_string(), NodeKind::Document, "n"))
            .collect();
        let result = layout(&nodes, 3.0);

        assert_eq!(result.nodes[0].position, [10.0, -6.0, 0.0]);
        let [x, y, z] = result.nodes[2].position;
        assert!((x - 11.6 * 1f64.cos()).abs() < 1e-9);
        assert!((y - 0.0).abs() < 1e-9);
        assert!((z - 11.6 * 1f64.sin()).abs() < 1e-9);

        // Height rises by the spacing per index
        for pair in result.nodes.windows(2) {
            assert!((pair[1].position[1] - pair[0].position[1] - 3.0).abs() < 1e-9);
        }
    }
}
