//! The analysis pipeline: table, graph, metrics, detectors, report.

use crate::aggregate::ResultAggregator;
use crate::suite::{AnalysisContext, DetectorSuite};
use amlscan_core::config::AnalyzerConfig;
use amlscan_core::error::Result;
use amlscan_core::report::Report;
use amlscan_core::types::{TransactionRecord, TransactionTable};
use amlscan_graph::graph::TxGraph;
use amlscan_graph::metrics::{GraphMetrics, MetricsConfig};

/// End-to-end pattern analysis over a batch of transactions.
///
/// The engine validates input once, builds the account graph and its
/// metrics once, and shares both across the full detector battery.
pub struct PatternEngine {
    config: AnalyzerConfig,
    metrics_config: MetricsConfig,
    suite: DetectorSuite,
    aggregator: ResultAggregator,
}

impl PatternEngine {
    /// Create an engine with the standard detector battery.
    ///
    /// # Errors
    /// Returns a configuration error when thresholds are out of range.
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            metrics_config: MetricsConfig::default(),
            suite: DetectorSuite::standard(),
            aggregator: ResultAggregator::new(),
        })
    }

    /// Create an engine with an explicit detector suite.
    ///
    /// # Errors
    /// Returns a configuration error when thresholds are out of range.
    pub fn with_suite(config: AnalyzerConfig, suite: DetectorSuite) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            metrics_config: MetricsConfig::default(),
            suite,
            aggregator: ResultAggregator::new(),
        })
    }

    /// The active threshold configuration.
    #[must_use]
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze a batch of transactions and produce a ranked report.
    ///
    /// # Errors
    /// Returns an input validation error when a record carries a
    /// non-finite amount. Individual detector failures are downgraded
    /// to report warnings.
    pub async fn analyze(&self, records: Vec<TransactionRecord>) -> Result<Report> {
        let input_count = records.len();
        let table = TransactionTable::from_records(records)?;
        tracing::info!(
            input = input_count,
            valid = table.len(),
            dropped = table.dropped_count(),
            "transaction table ready"
        );

        let graph = TxGraph::build(&table);
        let metrics = GraphMetrics::compute(&graph, &self.metrics_config);
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            components = metrics.components.len(),
            "account graph ready"
        );

        let ctx = AnalysisContext {
            table: &table,
            graph: &graph,
            metrics: &metrics,
            config: &self.config,
        };
        let (findings, warnings) = self.suite.run(&ctx).await;

        let report = self.aggregator.aggregate(findings, warnings);
        tracing::info!(
            findings = report.summary.total_patterns,
            high_risk = report.summary.high_risk_count,
            warnings = report.warnings.len(),
            "analysis complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amlscan_core::error::AnalyzerError;

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalyzerConfig {
            structuring_amount: -1.0,
            ..AnalyzerConfig::default()
        };
        let err = PatternEngine::new(config).err().unwrap();
        assert!(matches!(err, AnalyzerError::Config(_)));
    }

    #[tokio::test]
    async fn test_empty_batch_produces_empty_report() {
        let engine = PatternEngine::new(AnalyzerConfig::default()).unwrap();
        let report = engine.analyze(Vec::new()).await.unwrap();
        assert!(report.findings.is_empty());
        assert_eq!(report.summary.total_patterns, 0);
        assert!(report.warnings.is_empty());
    }
}
