//! Force-directed layout
//!
//! A velocity-Verlet style simulation in three dimensions. Each tick applies,
//! in order: link springs, many-body charge, centering, collision. Velocities
//! then decay and are integrated into positions.
//!
//! The default [`ForceMode::Fixed`] always runs exactly `iterations` ticks so
//! identical seeds give identical output. [`ForceMode::Adaptive`] stops once
//! the fastest node slows below a tolerance.

use std::collections::HashMap;

use rand::Rng;
use tracing::debug;

use super::LayoutResult;
use crate::graph::{Connection, Node};

const ALPHA_MIN: f64 = 0.001;
const VELOCITY_DECAY: f64 = 0.4;
const SEED_EXTENT: f64 = 10.0;
/// Squared distance below which charge is softened
const CHARGE_DISTANCE_MIN2: f64 = 1.0;

/// When the simulation stops
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ForceMode {
    /// Run exactly `iterations` ticks
    #[default]
    Fixed,
    /// Stop early once the largest node speed drops below `tolerance`
    Adaptive { tolerance: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceOptions {
    /// Link spring strength, scaled per connection by its `strength`
    pub attraction: f64,
    /// Many-body charge magnitude (applied as a negative charge)
    pub repulsion: f64,
    pub iterations: usize,
    pub center_strength: f64,
    /// Multiplier on each node's visual size
    pub collision_radius: f64,
    pub link_distance: f64,
    pub mode: ForceMode,
}

impl Default for ForceOptions {
    fn default() -> Self {
        Self {
            attraction: 0.05,
            repulsion: 300.0,
            iterations: 300,
            center_strength: 0.05,
            collision_radius: 2.0,
            link_distance: 10.0,
            mode: ForceMode::Fixed,
        }
    }
}

impl ForceOptions {
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_mode(mut self, mode: ForceMode) -> Self {
        self.mode = mode;
        self
    }
}

struct Link {
    source: usize,
    target: usize,
    strength: f64,
    /// Share of the correction applied to the target
    bias: f64,
}

/// Simulation state over a fixed node set
pub struct ForceSimulation<'a, R: Rng> {
    options: ForceOptions,
    positions: Vec<[f64; 3]>,
    velocities: Vec<[f64; 3]>,
    radii: Vec<f64>,
    links: Vec<Link>,
    alpha: f64,
    alpha_decay: f64,
    rng: &'a mut R,
}

impl<'a, R: Rng> ForceSimulation<'a, R> {
    pub fn new(nodes: &[Node], connections: &[Connection], options: ForceOptions, rng: &'a mut R) -> Self {
        let positions = nodes
            .iter()
            .map(|node| {
                if node.is_positioned() {
                    node.position
                } else {
                    [
                        rng.gen_range(-SEED_EXTENT..SEED_EXTENT),
                        rng.gen_range(-SEED_EXTENT..SEED_EXTENT),
                        rng.gen_range(-SEED_EXTENT..SEED_EXTENT),
                    ]
                }
            })
            .collect();

        let mut ids: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            ids.entry(node.id.as_str()).or_insert(i);
        }
        let mut endpoints = Vec::new();
        for conn in connections {
            if let (Some(&source), Some(&target)) =
                (ids.get(conn.source.as_str()), ids.get(conn.target.as_str()))
            {
                if source != target {
                    endpoints.push((source, target, f64::from(conn.strength)));
                }
            }
        }

        // Busy nodes move less per link
        let mut degree = vec![0usize; nodes.len()];
        for &(source, target, _) in &endpoints {
            degree[source] += 1;
            degree[target] += 1;
        }
        let links = endpoints
            .into_iter()
            .map(|(source, target, strength)| Link {
                source,
                target,
                strength: options.attraction * strength,
                bias: degree[source] as f64 / (degree[source] + degree[target]) as f64,
            })
            .collect();

        let alpha_decay = 1.0 - ALPHA_MIN.powf(1.0 / options.iterations.max(1) as f64);

        Self {
            options,
            positions,
            velocities: vec![[0.0; 3]; nodes.len()],
            radii: nodes
                .iter()
                .map(|n| f64::from(n.visual.size) * options.collision_radius)
                .collect(),
            links,
            alpha: 1.0,
            alpha_decay,
            rng,
        }
    }

    pub fn positions(&self) -> &[[f64; 3]] {
        &self.positions
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Largest current node speed
    pub fn max_speed(&self) -> f64 {
        self.velocities
            .iter()
            .map(|v| (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt())
            .fold(0.0, f64::max)
    }

    /// Advance one step
    pub fn tick(&mut self) {
        self.alpha += (0.0 - self.alpha) * self.alpha_decay;

        self.apply_links();
        self.apply_charge();
        self.apply_center();
        self.apply_collision();

        for (position, velocity) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
            for axis in 0..3 {
                velocity[axis] *= 1.0 - VELOCITY_DECAY;
                position[axis] += velocity[axis];
            }
        }
    }

    /// Run according to the configured mode; returns the number of ticks taken
    pub fn run(&mut self) -> usize {
        for tick in 0..self.options.iterations {
            self.tick();
            if let ForceMode::Adaptive { tolerance } = self.options.mode {
                if self.max_speed() < tolerance {
                    return tick + 1;
                }
            }
        }
        self.options.iterations
    }

    fn jiggle(&mut self) -> f64 {
        self.rng.gen_range(-0.5..0.5) * 1e-6
    }

    fn apply_links(&mut self) {
        for k in 0..self.links.len() {
            let (source, target, strength, bias) = {
                let link = &self.links[k];
                (link.source, link.target, link.strength, link.bias)
            };
            let mut delta = [0.0; 3];
            for (axis, d) in delta.iter_mut().enumerate() {
                *d = self.positions[target][axis] + self.velocities[target][axis]
                    - self.positions[source][axis]
                    - self.velocities[source][axis];
            }
            if delta.iter().all(|d| *d == 0.0) {
                delta[0] = self.jiggle();
            }
            let length = (delta[0] * delta[0] + delta[1] * delta[1] + delta[2] * delta[2]).sqrt();
            let scale = (length - self.options.link_distance) / length * self.alpha * strength;
            for (axis, d) in delta.iter().enumerate() {
                let push = d * scale;
                self.velocities[target][axis] -= push * bias;
                self.velocities[source][axis] += push * (1.0 - bias);
            }
        }
    }

    fn apply_charge(&mut self) {
        let charge = -self.options.repulsion * self.alpha;
        let n = self.positions.len();
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let mut delta = [
                    self.positions[j][0] - self.positions[i][0],
                    self.positions[j][1] - self.positions[i][1],
                    self.positions[j][2] - self.positions[i][2],
                ];
                if delta.iter().all(|d| *d == 0.0) {
                    delta[0] = self.jiggle();
                }
                let mut distance2 = delta[0] * delta[0] + delta[1] * delta[1] + delta[2] * delta[2];
                if distance2 < CHARGE_DISTANCE_MIN2 {
                    distance2 = (CHARGE_DISTANCE_MIN2 * distance2).sqrt();
                }
                for (axis, d) in delta.iter().enumerate() {
                    self.velocities[i][axis] += d * charge / distance2;
                }
            }
        }
    }

    /// Translate the centroid toward the origin
    fn apply_center(&mut self) {
        let n = self.positions.len() as f64;
        let mut centroid = [0.0; 3];
        for position in &self.positions {
            for axis in 0..3 {
                centroid[axis] += position[axis];
            }
        }
        for c in &mut centroid {
            *c = *c / n * self.options.center_strength;
        }
        for position in &mut self.positions {
            for axis in 0..3 {
                position[axis] -= centroid[axis];
            }
        }
    }

    fn apply_collision(&mut self) {
        let n = self.positions.len();
        for i in 0..n {
            let ri = self.radii[i];
            for j in (i + 1)..n {
                let rj = self.radii[j];
                let reach = ri + rj;
                let mut delta = [0.0; 3];
                for (axis, d) in delta.iter_mut().enumerate() {
                    *d = self.positions[i][axis] + self.velocities[i][axis]
                        - self.positions[j][axis]
                        - self.velocities[j][axis];
                }
                let mut distance2 = delta[0] * delta[0] + delta[1] * delta[1] + delta[2] * delta[2];
                if distance2 >= reach * reach {
                    continue;
                }
                if distance2 == 0.0 {
                    delta[0] = self.jiggle();
                    distance2 = delta[0] * delta[0];
                }
                let distance = distance2.sqrt();
                let scale = (reach - distance) / distance;
                let share = rj * rj / (ri * ri + rj * rj).max(f64::EPSILON);
                for (axis, d) in delta.iter().enumerate() {
                    let push = d * scale;
                    self.velocities[i][axis] += push * share;
                    self.velocities[j][axis] -= push * (1.0 - share);
                }
            }
        }
    }
}

pub(super) fn layout<R: Rng>(
    nodes: &[Node],
    connections: &[Connection],
    options: &ForceOptions,
    rng: &mut R,
) -> LayoutResult {
    let mut simulation = ForceSimulation::new(nodes, connections, *options, rng);
    let ticks = simulation.run();
    debug!(ticks, alpha = simulation.alpha(), "Force simulation finished");

    let placed = nodes
        .iter()
        .zip(simulation.positions())
        .map(|(node, position)| {
            let mut node = node.clone();
            node.position = *position;
            node
        })
        .collect();
    LayoutResult::new(placed, Vec::new())
}
