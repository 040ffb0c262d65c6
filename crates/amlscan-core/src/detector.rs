//! Detector metadata.
//!
//! Every detector in the suite carries a `DetectorMetadata` describing its
//! identity, inputs, and cost class. The suite uses the cost class to decide
//! which detectors must honor the combinatorial size ceiling.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Asymptotic cost class of a detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectorCost {
    /// Linear in the number of transactions or nodes.
    Linear,
    /// Polynomial (e.g. single-source shortest paths per node).
    Polynomial,
    /// Exponential or cubic enumeration; subject to the size ceiling.
    Combinatorial,
}

impl DetectorCost {
    /// Returns the cost class name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DetectorCost::Linear => "linear",
            DetectorCost::Polynomial => "polynomial",
            DetectorCost::Combinatorial => "combinatorial",
        }
    }

    /// True if this detector must honor the graph-size ceiling.
    #[must_use]
    pub const fn is_bounded(&self) -> bool {
        matches!(self, DetectorCost::Combinatorial)
    }
}

impl fmt::Display for DetectorCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static description of a detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorMetadata {
    /// Unique identifier (e.g. "patterns/structuring").
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Whether the detector reads the transaction graph and metrics.
    pub needs_graph: bool,
    /// Cost class.
    pub cost: DetectorCost,
    /// Implementation version.
    pub version: u32,
}

impl DetectorMetadata {
    /// Create metadata for a linear, table-only detector.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            needs_graph: false,
            cost: DetectorCost::Linear,
            version: 1,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the detector as graph-dependent.
    #[must_use]
    pub fn with_graph(mut self) -> Self {
        self.needs_graph = true;
        self
    }

    /// Set the cost class.
    #[must_use]
    pub fn with_cost(mut self, cost: DetectorCost) -> Self {
        self.cost = cost;
        self
    }

    /// Set the implementation version.
    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_builders() {
        let meta = DetectorMetadata::new("patterns/layering")
            .with_description("Simple-path chain enumeration")
            .with_graph()
            .with_cost(DetectorCost::Combinatorial);

        assert_eq!(meta.id, "patterns/layering");
        assert!(meta.needs_graph);
        assert!(meta.cost.is_bounded());
        assert_eq!(meta.version, 1);
    }

    #[test]
    fn test_cost_classes() {
        assert!(!DetectorCost::Linear.is_bounded());
        assert!(!DetectorCost::Polynomial.is_bounded());
        assert_eq!(DetectorCost::Combinatorial.to_string(), "combinatorial");
    }
}
