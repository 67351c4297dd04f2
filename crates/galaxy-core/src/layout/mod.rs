//! Layout engine
//!
//! Five interchangeable algorithms assign 3D positions to a node set. Each is
//! a synchronous, one-shot computation over its inputs: the input slices are
//! never mutated and the returned [`LayoutResult`] owns positioned copies.
//!
//! | Algorithm      | Randomness                                  |
//! |----------------|---------------------------------------------|
//! | `orbital`      | bounded angular and vertical jitter         |
//! | `force`        | seeding of unpositioned nodes, jiggle       |
//! | `sphere`       | none                                        |
//! | `spiral`       | none                                        |
//! | `hierarchical` | none                                        |
//!
//! Random components draw from a seeded `StdRng` when [`LayoutOptions::seed`]
//! is set, otherwise from entropy.

mod force;
mod hierarchical;
mod orbital;
mod sphere;
mod spiral;

use std::collections::HashMap;
use std::str::FromStr;

use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;
use crate::graph::{Connection, Node};

pub use force::{ForceMode, ForceOptions, ForceSimulation};
pub use hierarchical::HierarchicalOptions;
pub use orbital::{OrbitDefinition, ORBITS};

/// Selectable layout algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutAlgorithm {
    #[default]
    Orbital,
    Force,
    Sphere,
    Spiral,
    Hierarchical,
}

impl LayoutAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orbital => "orbital",
            Self::Force => "force",
            Self::Sphere => "sphere",
            Self::Spiral => "spiral",
            Self::Hierarchical => "hierarchical",
        }
    }

    pub fn all() -> &'static [LayoutAlgorithm] {
        &[
            Self::Orbital,
            Self::Force,
            Self::Sphere,
            Self::Spiral,
            Self::Hierarchical,
        ]
    }
}

impl FromStr for LayoutAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|a| a.as_str() == lower)
            .ok_or_else(|| Error::InvalidInput(format!("unknown layout algorithm '{}'", s)))
    }
}

impl std::fmt::Display for LayoutAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameters shared by all algorithms
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    /// Seed for the random components; `None` draws from entropy
    pub seed: Option<u64>,
    pub sphere_radius: f64,
    pub spiral_spacing: f64,
    pub hierarchical: HierarchicalOptions,
    pub force: ForceOptions,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            seed: None,
            sphere_radius: 20.0,
            spiral_spacing: 3.0,
            hierarchical: HierarchicalOptions::default(),
            force: ForceOptions::default(),
        }
    }
}

impl LayoutOptions {
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_force(mut self, force: ForceOptions) -> Self {
        self.force = force;
        self
    }

    pub(crate) fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Positioned nodes plus an id lookup
///
/// An empty input yields an empty result; that is a valid terminal state,
/// not a failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutResult {
    pub nodes: Vec<Node>,
    /// id → index into `nodes`; the first node wins when ids repeat
    pub index: HashMap<String, usize>,
    /// Ids left out of placement by a capacity limit
    pub omitted: Vec<String>,
}

impl LayoutResult {
    pub fn new(nodes: Vec<Node>, omitted: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            index.entry(node.id.clone()).or_insert(i);
        }
        Self {
            nodes,
            index,
            omitted,
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Run `algorithm` over the graph
pub fn compute_layout(
    algorithm: LayoutAlgorithm,
    nodes: &[Node],
    connections: &[Connection],
    options: &LayoutOptions,
) -> LayoutResult {
    if nodes.is_empty() {
        return LayoutResult::default();
    }

    let result = match algorithm {
        LayoutAlgorithm::Orbital => orbital::layout(nodes, &mut options.rng()),
        LayoutAlgorithm::Force => force::layout(nodes, connections, &options.force, &mut options.rng()),
        LayoutAlgorithm::Sphere => sphere::layout(nodes, options.sphere_radius),
        LayoutAlgorithm::Spiral => spiral::layout(nodes, options.spiral_spacing),
        LayoutAlgorithm::Hierarchical => hierarchical::layout(nodes, connections, &options.hierarchical),
    };

    debug!(
        algorithm = %algorithm,
        placed = result.nodes.len(),
        omitted = result.omitted.len(),
        "Layout computed"
    );
    result
}
