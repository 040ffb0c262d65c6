//! # AMLScan Graph
//!
//! Transaction graph model and graph-theoretic metrics:
//!
//! - `TxGraph` - weighted directed account graph with aggregated edges
//! - Centrality - betweenness (Brandes), closeness, eigenvector, PageRank,
//!   in/out degree
//! - Community detection - greedy modularity maximization
//! - Paths - Dijkstra, bounded simple-path/cycle enumeration, bridges,
//!   components, diameter
//! - `GraphMetrics` - the one-shot metric bundle shared by all detectors

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod centrality;
pub mod community;
pub mod graph;
pub mod metrics;
pub mod paths;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::community::CommunityPartition;
    pub use crate::graph::{EdgeData, TxGraph, UndirectedGraph};
    pub use crate::metrics::{GraphMetrics, MetricsConfig};
    pub use crate::paths::Enumeration;
}
