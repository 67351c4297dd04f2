//! Galaxy Core Library
//!
//! This crate turns tool, skill and document sources into one positioned
//! knowledge graph:
//! - Graph model (nodes, connections, batches)
//! - File-system and HTTP capabilities (local, in-memory, reqwest)
//! - Source adapters and their registry
//! - Document and config ingestion
//! - Layout engine (orbital, force, sphere, spiral, hierarchical)
//! - Aggregation store with change watching

pub mod adapters;
pub mod config;
pub mod error;
pub mod fs;
pub mod graph;
pub mod ingestion;
pub mod layout;
pub mod store;


pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::adapters::{AdapterConfig, AdapterRegistry, DataSourceAdapter};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::fs::{FileSystem, LocalFileSystem};
    pub use crate::graph::{Connection, ConnectionKind, GraphData, Node, NodeKind};
    pub use crate::layout::{LayoutAlgorithm, LayoutOptions};
    pub use crate::store::{GraphStore, LoadOutcome};
}
