//! Analyzer configuration.
//!
//! Every detector threshold is configurable; the defaults below match the
//! standard AML tuning (reporting threshold $10,000, 24h rapid-movement
//! window, 95th-percentile centrality cutoff, and so on).

use crate::error::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};

/// Threshold configuration for the detector suite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Regulatory reporting threshold; structuring looks just below it.
    pub structuring_amount: f64,
    /// Minimum sub-threshold transactions for a structuring flag.
    pub structuring_frequency: usize,
    /// Minimum cycle length for circular-transaction detection.
    pub circular_path_length: usize,
    /// Sliding window for rapid-movement detection, in hours.
    pub rapid_movement_hours: i64,
    /// Standard deviations above the mean daily count for a velocity anomaly.
    pub velocity_multiplier: f64,
    /// Fraction of round-amount transactions that triggers a flag.
    pub round_amount_threshold: f64,
    /// Unusual-hours window as (start, end); hours >= start or <= end count.
    pub unusual_hours: (u32, u32),
    /// Smurfing only inspects this many top recipients by inbound volume.
    pub smurfing_top_recipients: usize,
    /// Smurfing requires the daily mean amount to stay below this.
    pub smurfing_max_average: f64,
    /// Percentile cutoff for centrality anomalies.
    pub centrality_percentile: f64,
    /// Absolute betweenness centrality floor.
    pub betweenness_threshold: f64,
    /// Absolute eigenvector centrality floor.
    pub eigenvector_threshold: f64,
    /// Local clustering coefficient floor for density anomalies.
    pub clustering_coeff_threshold: f64,
    /// Minimum number of distinct bridges an account must touch.
    pub bridge_min_count: usize,
    /// Minimum degree for hub-account detection.
    pub hub_degree_threshold: usize,
    /// Gini coefficient floor for flow concentration.
    pub flow_concentration_ratio: f64,
    /// Global modularity floor before community isolation is considered.
    pub community_modularity_threshold: f64,
    /// Multiplier over the expected diameter for a diameter anomaly.
    pub diameter_anomaly_threshold: f64,
    /// Standard deviations above the mean clustering coefficient.
    pub density_anomaly_threshold: f64,
    /// Node-count ceiling for combinatorial detectors (paths, cycles,
    /// all-pairs shortest paths); larger graphs skip those detectors.
    pub max_graph_size_for_expensive_detectors: usize,
    /// Finding cap for layering path enumeration.
    pub layering_max_findings: usize,
    /// Enumeration cap for simple cycles.
    pub max_cycles: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            structuring_amount: 10_000.0,
            structuring_frequency: 5,
            circular_path_length: 3,
            rapid_movement_hours: 24,
            velocity_multiplier: 3.0,
            round_amount_threshold: 0.8,
            unusual_hours: (22, 6),
            smurfing_top_recipients: 20,
            smurfing_max_average: 5_000.0,
            centrality_percentile: 95.0,
            betweenness_threshold: 0.1,
            eigenvector_threshold: 0.1,
            clustering_coeff_threshold: 0.8,
            bridge_min_count: 2,
            hub_degree_threshold: 10,
            flow_concentration_ratio: 0.8,
            community_modularity_threshold: 0.3,
            diameter_anomaly_threshold: 2.0,
            density_anomaly_threshold: 3.0,
            max_graph_size_for_expensive_detectors: 500,
            layering_max_findings: 10,
            max_cycles: 1_000,
        }
    }
}

impl AnalyzerConfig {
    /// Create a configuration with the standard defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the structuring reporting threshold.
    #[must_use]
    pub fn with_structuring_amount(mut self, amount: f64) -> Self {
        self.structuring_amount = amount;
        self
    }

    /// Set the rapid-movement window in hours.
    #[must_use]
    pub fn with_rapid_movement_hours(mut self, hours: i64) -> Self {
        self.rapid_movement_hours = hours;
        self
    }

    /// Set the unusual-hours window.
    #[must_use]
    pub fn with_unusual_hours(mut self, start: u32, end: u32) -> Self {
        self.unusual_hours = (start, end);
        self
    }

    /// Set the node-count ceiling for combinatorial detectors.
    #[must_use]
    pub fn with_max_graph_size(mut self, nodes: usize) -> Self {
        self.max_graph_size_for_expensive_detectors = nodes;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.structuring_amount.is_finite() || self.structuring_amount <= 0.0 {
            return Err(AnalyzerError::config(
                "structuring_amount must be positive and finite",
            ));
        }
        if self.structuring_frequency == 0 {
            return Err(AnalyzerError::config("structuring_frequency must be >= 1"));
        }
        if self.circular_path_length < 2 {
            return Err(AnalyzerError::config("circular_path_length must be >= 2"));
        }
        if self.rapid_movement_hours <= 0 {
            return Err(AnalyzerError::config("rapid_movement_hours must be positive"));
        }
        if !(0.0..=100.0).contains(&self.centrality_percentile) {
            return Err(AnalyzerError::config(
                "centrality_percentile must lie in [0, 100]",
            ));
        }
        for (name, value) in [
            ("round_amount_threshold", self.round_amount_threshold),
            ("betweenness_threshold", self.betweenness_threshold),
            ("eigenvector_threshold", self.eigenvector_threshold),
            ("clustering_coeff_threshold", self.clustering_coeff_threshold),
            ("flow_concentration_ratio", self.flow_concentration_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AnalyzerError::config(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        if self.unusual_hours.0 > 23 || self.unusual_hours.1 > 23 {
            return Err(AnalyzerError::config("unusual_hours must lie in [0, 23]"));
        }
        if self.velocity_multiplier <= 0.0 || self.density_anomaly_threshold <= 0.0 {
            return Err(AnalyzerError::config(
                "standard-deviation multipliers must be positive",
            ));
        }
        if self.diameter_anomaly_threshold <= 0.0 {
            return Err(AnalyzerError::config(
                "diameter_anomaly_threshold must be positive",
            ));
        }
        if self.max_graph_size_for_expensive_detectors == 0 {
            return Err(AnalyzerError::config(
                "max_graph_size_for_expensive_detectors must be >= 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AnalyzerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_thresholds() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.structuring_amount, 10_000.0);
        assert_eq!(config.structuring_frequency, 5);
        assert_eq!(config.unusual_hours, (22, 6));
        assert_eq!(config.centrality_percentile, 95.0);
    }

    #[test]
    fn test_invalid_percentile_rejected() {
        let config = AnalyzerConfig::default();
        let config = AnalyzerConfig {
            centrality_percentile: 150.0,
            ..config
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_ratio_rejected() {
        let config = AnalyzerConfig {
            round_amount_threshold: 1.5,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder_methods() {
        let config = AnalyzerConfig::new()
            .with_structuring_amount(15_000.0)
            .with_unusual_hours(23, 5)
            .with_max_graph_size(100);
        assert_eq!(config.structuring_amount, 15_000.0);
        assert_eq!(config.unusual_hours, (23, 5));
        assert_eq!(config.max_graph_size_for_expensive_detectors, 100);
        assert!(config.validate().is_ok());
    }
}
