//! The detector trait and the fault-isolated suite runner.

use amlscan_core::config::AnalyzerConfig;
use amlscan_core::detector::DetectorMetadata;
use amlscan_core::error::Result;
use amlscan_core::report::{AnalysisWarning, Finding, WarningReason};
use amlscan_core::types::TransactionTable;
use amlscan_graph::graph::TxGraph;
use amlscan_graph::metrics::GraphMetrics;
use async_trait::async_trait;

/// Immutable inputs shared by every detector in a run.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisContext<'a> {
    /// Validated, enriched transaction table.
    pub table: &'a TransactionTable,
    /// Aggregated account graph.
    pub graph: &'a TxGraph,
    /// Graph metrics computed once per run.
    pub metrics: &'a GraphMetrics,
    /// Threshold configuration.
    pub config: &'a AnalyzerConfig,
}

/// What one detector contributed to the run.
#[derive(Debug, Default)]
pub struct Detection {
    /// Findings, in detector-internal deterministic order.
    pub findings: Vec<Finding>,
    /// Set when the detector truncated or skipped its work.
    pub warning: Option<(WarningReason, String)>,
}

impl Detection {
    /// A complete result set.
    #[must_use]
    pub fn complete(findings: Vec<Finding>) -> Self {
        Self {
            findings,
            warning: None,
        }
    }

    /// A result set cut short at a cap.
    #[must_use]
    pub fn truncated(findings: Vec<Finding>, message: impl Into<String>) -> Self {
        Self {
            findings,
            warning: Some((WarningReason::Truncated, message.into())),
        }
    }

    /// The detector did not run at all.
    #[must_use]
    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            findings: Vec::new(),
            warning: Some((WarningReason::Skipped, message.into())),
        }
    }
}

/// A single pattern detector.
///
/// Detectors are pure over the [`AnalysisContext`]; they never mutate the
/// table or the graph, so the suite may evaluate them in any order or in
/// parallel without locking.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Detector metadata.
    fn metadata(&self) -> &DetectorMetadata;

    /// Run the detector over the shared inputs.
    async fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Detection>;
}

/// Ordered, fault-isolated set of detectors.
///
/// A detector that returns an error is logged and contributes nothing;
/// sibling detectors always run. Warnings carry the per-detector outcome
/// into the final report.
pub struct DetectorSuite {
    detectors: Vec<Box<dyn Detector>>,
}

impl DetectorSuite {
    /// Create a suite from an explicit detector list.
    #[must_use]
    pub fn new(detectors: Vec<Box<dyn Detector>>) -> Self {
        Self { detectors }
    }

    /// The standard twenty-detector battery, in canonical order.
    #[must_use]
    pub fn standard() -> Self {
        use crate::{entity, flow, influence, structure, temporal};

        Self::new(vec![
            Box::new(flow::StructuringDetector::new()),
            Box::new(structure::LayeringDetector::new()),
            Box::new(structure::CircularTransactionsDetector::new()),
            Box::new(flow::RapidMovementDetector::new()),
            Box::new(temporal::VelocityAnomalyDetector::new()),
            Box::new(flow::RoundAmountDetector::new()),
            Box::new(flow::SmurfingDetector::new()),
            Box::new(temporal::TimeAnomalyDetector::new()),
            Box::new(entity::UnusualGeographyDetector::new()),
            Box::new(entity::ShellCompanyDetector::new()),
            Box::new(influence::GraphCentralityAnomalyDetector::new()),
            Box::new(structure::BridgeAccountDetector::new()),
            Box::new(structure::HubAccountDetector::new()),
            Box::new(structure::IsolatedClusterDetector::new()),
            Box::new(flow::FlowConcentrationDetector::new()),
            Box::new(structure::NetworkDensityAnomalyDetector::new()),
            Box::new(influence::BetweennessExploitationDetector::new()),
            Box::new(influence::EigenvectorDominanceDetector::new()),
            Box::new(structure::CommunityIsolationDetector::new()),
            Box::new(structure::GraphDiameterAnomalyDetector::new()),
        ])
    }

    /// Number of registered detectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    /// True when no detectors are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Run every detector over the shared context.
    pub async fn run(
        &self,
        ctx: &AnalysisContext<'_>,
    ) -> (Vec<Finding>, Vec<AnalysisWarning>) {
        let mut findings = Vec::new();
        let mut warnings = Vec::new();

        for detector in &self.detectors {
            let id = detector.metadata().id.clone();
            match detector.detect(ctx).await {
                Ok(detection) => {
                    tracing::debug!(
                        detector = %id,
                        findings = detection.findings.len(),
                        "detector completed"
                    );
                    findings.extend(detection.findings);
                    if let Some((reason, message)) = detection.warning {
                        tracing::warn!(detector = %id, %message, "detector limited");
                        warnings.push(AnalysisWarning::new(id, reason, message));
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        detector = %id,
                        error = %err,
                        input_size = ctx.table.len(),
                        "detector failed; continuing without it"
                    );
                    warnings.push(AnalysisWarning::new(
                        id,
                        WarningReason::Failed,
                        err.to_string(),
                    ));
                }
            }
        }
        (findings, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amlscan_core::error::AnalyzerError;
    use amlscan_graph::metrics::MetricsConfig;

    struct FailingDetector {
        metadata: DetectorMetadata,
    }

    #[async_trait]
    impl Detector for FailingDetector {
        fn metadata(&self) -> &DetectorMetadata {
            &self.metadata
        }

        async fn detect(&self, _ctx: &AnalysisContext<'_>) -> Result<Detection> {
            Err(AnalyzerError::detector("patterns/failing", "boom"))
        }
    }

    struct EmptyDetector {
        metadata: DetectorMetadata,
    }

    #[async_trait]
    impl Detector for EmptyDetector {
        fn metadata(&self) -> &DetectorMetadata {
            &self.metadata
        }

        async fn detect(&self, _ctx: &AnalysisContext<'_>) -> Result<Detection> {
            Ok(Detection::complete(Vec::new()))
        }
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let table = TransactionTable::from_records(Vec::new()).unwrap();
        let graph = TxGraph::build(&table);
        let metrics = GraphMetrics::compute(&graph, &MetricsConfig::default());
        let config = AnalyzerConfig::default();
        let ctx = AnalysisContext {
            table: &table,
            graph: &graph,
            metrics: &metrics,
            config: &config,
        };

        let suite = DetectorSuite::new(vec![
            Box::new(FailingDetector {
                metadata: DetectorMetadata::new("patterns/failing"),
            }),
            Box::new(EmptyDetector {
                metadata: DetectorMetadata::new("patterns/empty"),
            }),
        ]);

        let (findings, warnings) = suite.run(&ctx).await;
        assert!(findings.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].detector, "patterns/failing");
        assert_eq!(warnings[0].reason, WarningReason::Failed);
    }

    #[test]
    fn test_standard_suite_has_twenty_detectors() {
        assert_eq!(DetectorSuite::standard().len(), 20);
    }
}
