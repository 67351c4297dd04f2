//! Canonical graph model
//!
//! Every adapter and ingestion service produces [`GraphData`] batches of
//! [`Node`]s and [`Connection`]s. Batches are merged by concatenation and
//! connections whose endpoints vanished are dropped at merge time.

mod connection;
mod data;
mod node;

pub use connection::{Connection, ConnectionKind};
pub use data::{GraphData, GraphStatistics};
pub use node::{Node, NodeKind, Orbit, Shape, Tier, Visual};
