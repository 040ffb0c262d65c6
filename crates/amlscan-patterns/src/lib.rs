//! # AMLScan Patterns
//!
//! The detector battery and the analysis pipeline:
//!
//! - Twenty fault-isolated detectors over transactions, the account
//!   graph, and its metrics
//! - `DetectorSuite` - ordered execution with per-detector warnings
//! - `ResultAggregator` - deterministic ranking and the report summary
//! - `PatternEngine` - validate, build, detect, aggregate

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod engine;
pub mod entity;
pub mod flow;
pub mod influence;
pub mod stats;
pub mod structure;
pub mod suite;
pub mod temporal;

pub(crate) mod util;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::aggregate::ResultAggregator;
    pub use crate::engine::PatternEngine;
    pub use crate::suite::{AnalysisContext, Detection, Detector, DetectorSuite};
    pub use amlscan_core::prelude::*;
    pub use amlscan_graph::prelude::*;
}
