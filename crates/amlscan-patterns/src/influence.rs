//! Centrality-driven detectors: percentile outliers, betweenness
//! exploitation, and eigenvector dominance.

use crate::stats::{mean, percentile};
use crate::suite::{AnalysisContext, Detection, Detector};
use amlscan_core::config::AnalyzerConfig;
use amlscan_core::detector::{DetectorCost, DetectorMetadata};
use amlscan_core::error::Result;
use amlscan_core::report::Finding;
use amlscan_core::types::{PatternType, RiskLevel};
use amlscan_graph::graph::TxGraph;
use amlscan_graph::metrics::GraphMetrics;
use amlscan_graph::paths::all_pairs_distances;
use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;

/// Detects accounts whose betweenness centrality sits above the
/// population percentile cutoff.
#[derive(Debug, Clone)]
pub struct GraphCentralityAnomalyDetector {
    metadata: DetectorMetadata,
}

impl Default for GraphCentralityAnomalyDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphCentralityAnomalyDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/graph-centrality-anomaly")
                .with_description("Betweenness outliers above the population percentile")
                .with_graph(),
        }
    }

    /// Flag nodes above both the percentile cutoff and the absolute
    /// betweenness threshold.
    #[must_use]
    pub fn compute(
        graph: &TxGraph,
        metrics: &GraphMetrics,
        config: &AnalyzerConfig,
    ) -> Vec<Finding> {
        let betweenness = &metrics.betweenness;
        if betweenness.is_empty() {
            return Vec::new();
        }
        let cutoff = percentile(betweenness, config.centrality_percentile);
        let mut ranked: Vec<f64> = betweenness.clone();
        ranked.sort_by(|a, b| b.total_cmp(a));

        let mut findings = Vec::new();
        for (u, &centrality) in betweenness.iter().enumerate() {
            if centrality <= cutoff || centrality <= config.betweenness_threshold {
                continue;
            }
            let rank = ranked
                .iter()
                .position(|&v| v == centrality)
                .map_or(1, |p| p + 1);

            let confidence = (centrality * 2.0).min(0.9);
            let risk = if centrality > 0.2 {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            };

            let mut evidence = BTreeMap::new();
            evidence.insert("betweenness_centrality".to_string(), json!(centrality));
            evidence.insert("centrality_rank".to_string(), json!(rank));
            evidence.insert("total_accounts".to_string(), json!(betweenness.len()));
            evidence.insert("threshold".to_string(), json!(cutoff));

            findings.push(
                Finding::new(
                    PatternType::GraphCentralityAnomaly,
                    risk,
                    confidence,
                    format!(
                        "Account {} shows high betweenness centrality ({centrality:.3}), indicating potential intermediary role in money flows",
                        graph.node(u)
                    ),
                    "Investigate account's role as potential financial intermediary",
                )
                .with_accounts([graph.node(u)])
                .with_evidence(evidence),
            );
        }
        findings
    }
}

#[async_trait]
impl Detector for GraphCentralityAnomalyDetector {
    fn metadata(&self) -> &DetectorMetadata {
        &self.metadata
    }

    async fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Detection> {
        Ok(Detection::complete(Self::compute(
            ctx.graph,
            ctx.metrics,
            ctx.config,
        )))
    }
}

/// Detects accounts that sit on many shortest paths between other
/// account pairs.
#[derive(Debug, Clone)]
pub struct BetweennessExploitationDetector {
    metadata: DetectorMetadata,
}

impl Default for BetweennessExploitationDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl BetweennessExploitationDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/betweenness-exploitation")
                .with_description("Shortest-path interception counting per account")
                .with_graph()
                .with_cost(DetectorCost::Polynomial),
        }
    }

    /// For each high-betweenness node, count ordered pairs whose
    /// shortest-path distance is realized through that node.
    #[must_use]
    pub fn compute(
        graph: &TxGraph,
        metrics: &GraphMetrics,
        config: &AnalyzerConfig,
    ) -> Detection {
        let n = graph.node_count();
        if n > config.max_graph_size_for_expensive_detectors {
            return Detection::skipped(format!(
                "graph has {n} nodes, above the {} node ceiling for all-pairs analysis",
                config.max_graph_size_for_expensive_detectors
            ));
        }

        let candidates: Vec<usize> = (0..n)
            .filter(|&u| metrics.betweenness[u] > config.betweenness_threshold)
            .collect();
        if candidates.is_empty() {
            return Detection::complete(Vec::new());
        }
        let dist = all_pairs_distances(graph);

        let mut findings = Vec::new();
        for account in candidates {
            let mut paths_controlled = 0usize;
            let mut controlled_flow = 0.0;
            for s in 0..n {
                if s == account {
                    continue;
                }
                for t in 0..n {
                    if t == s || t == account {
                        continue;
                    }
                    let direct = dist[s][t];
                    if !direct.is_finite() {
                        continue;
                    }
                    let via = dist[s][account] + dist[account][t];
                    if (via - direct).abs() <= 1e-9 {
                        paths_controlled += 1;
                        if let Some(edge) = graph.edge(s, t) {
                            controlled_flow += edge.weight;
                        }
                    }
                }
            }
            if paths_controlled <= 5 {
                continue;
            }

            let centrality = metrics.betweenness[account];
            let confidence = (centrality * 2.0).min(0.95);
            let risk = if centrality > 0.2 {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            };

            let mut evidence = BTreeMap::new();
            evidence.insert("betweenness_centrality".to_string(), json!(centrality));
            evidence.insert("paths_controlled".to_string(), json!(paths_controlled));
            evidence.insert(
                "estimated_controlled_flow".to_string(),
                json!(controlled_flow),
            );
            evidence.insert(
                "control_ratio".to_string(),
                json!(paths_controlled as f64 / n as f64),
            );

            findings.push(
                Finding::new(
                    PatternType::BetweennessExploitation,
                    risk,
                    confidence,
                    format!(
                        "Account {} exploits betweenness position (centrality={centrality:.3}) controlling {paths_controlled} critical paths",
                        graph.node(account)
                    ),
                    "Investigate account's strategic position for potential flow control",
                )
                .with_accounts([graph.node(account)])
                .with_evidence(evidence),
            );
        }
        Detection::complete(findings)
    }
}

#[async_trait]
impl Detector for BetweennessExploitationDetector {
    fn metadata(&self) -> &DetectorMetadata {
        &self.metadata
    }

    async fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Detection> {
        Ok(Self::compute(ctx.graph, ctx.metrics, ctx.config))
    }
}

/// Detects accounts whose eigenvector centrality dominates the network.
#[derive(Debug, Clone)]
pub struct EigenvectorDominanceDetector {
    metadata: DetectorMetadata,
}

impl Default for EigenvectorDominanceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl EigenvectorDominanceDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/eigenvector-dominance")
                .with_description("Relative eigenvector-centrality dominance")
                .with_graph(),
        }
    }

    /// Flag nodes clearing the absolute threshold and half the maximum
    /// centrality. Skips when the power iteration did not converge.
    #[must_use]
    pub fn compute(
        graph: &TxGraph,
        metrics: &GraphMetrics,
        config: &AnalyzerConfig,
    ) -> Detection {
        let Some(eigenvector) = metrics.eigenvector.as_ref() else {
            return Detection::skipped("eigenvector centrality did not converge");
        };
        if eigenvector.is_empty() {
            return Detection::complete(Vec::new());
        }
        let max_centrality = eigenvector.iter().copied().fold(0.0, f64::max);
        if max_centrality <= 0.0 {
            return Detection::complete(Vec::new());
        }
        let mean_centrality = mean(eigenvector);

        let mut findings = Vec::new();
        for (u, &centrality) in eigenvector.iter().enumerate() {
            if centrality <= config.eigenvector_threshold
                || centrality <= max_centrality * 0.5
            {
                continue;
            }

            let connected: Vec<usize> = graph
                .predecessors(u)
                .iter()
                .chain(graph.successors(u).iter())
                .copied()
                .collect();
            let influential = connected
                .iter()
                .filter(|&&v| eigenvector[v] > mean_centrality)
                .count();
            let total_flow = graph.total_inflow(u) + graph.total_outflow(u);

            let relative = centrality / max_centrality;
            let confidence = (relative * 0.8).min(0.9);
            let risk = if centrality > max_centrality * 0.8 {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            };

            let mut evidence = BTreeMap::new();
            evidence.insert("account_id".to_string(), json!(graph.node(u)));
            evidence.insert("eigenvector_centrality".to_string(), json!(centrality));
            evidence.insert("relative_dominance".to_string(), json!(relative));
            evidence.insert("influential_connections".to_string(), json!(influential));
            evidence.insert("total_connections".to_string(), json!(connected.len()));
            evidence.insert("total_flow".to_string(), json!(total_flow));
            evidence.insert(
                "connected_account_ids".to_string(),
                json!(connected
                    .iter()
                    .map(|&v| graph.node(v))
                    .collect::<Vec<_>>()),
            );

            findings.push(
                Finding::new(
                    PatternType::EigenvectorDominance,
                    risk,
                    confidence,
                    format!(
                        "Account {} shows dominant influence (eigenvector={centrality:.3}) with connections to {influential} other influential accounts",
                        graph.node(u)
                    ),
                    "Investigate account's dominant influence in transaction network",
                )
                .with_accounts([graph.node(u)])
                .with_evidence(evidence),
            );
        }
        Detection::complete(findings)
    }
}

#[async_trait]
impl Detector for EigenvectorDominanceDetector {
    fn metadata(&self) -> &DetectorMetadata {
        &self.metadata
    }

    async fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Detection> {
        Ok(Self::compute(ctx.graph, ctx.metrics, ctx.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amlscan_core::report::WarningReason;
    use amlscan_core::types::{TransactionRecord, TransactionTable};
    use amlscan_graph::metrics::MetricsConfig;
    use chrono::{TimeZone, Utc};

    fn ts(hour: u32, minute: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, hour, minute, 0).unwrap()
    }

    fn chain_graph(accounts: &[&str]) -> TxGraph {
        let records = accounts
            .windows(2)
            .enumerate()
            .map(|(i, pair)| {
                TransactionRecord::new(
                    format!("{}-{}", pair[0], pair[1]),
                    pair[0],
                    pair[1],
                    1_000.0,
                    ts(1 + i as u32 / 60, i as u32 % 60),
                )
            })
            .collect();
        let table = TransactionTable::from_records(records).unwrap();
        TxGraph::build(&table)
    }

    #[test]
    fn test_centrality_anomaly_middle_of_chain() {
        let graph = chain_graph(&["A", "B", "C", "D", "E"]);
        let config = AnalyzerConfig::default();
        let metrics = GraphMetrics::compute(&graph, &MetricsConfig::default());
        let findings = GraphCentralityAnomalyDetector::compute(&graph, &metrics, &config);
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert!(finding.affected_accounts.contains("C"));
        assert_eq!(finding.evidence["centrality_rank"], json!(1));
        assert_eq!(finding.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_betweenness_exploitation_long_chain() {
        // In a 6-node chain the two innermost nodes each intercept six
        // ordered pairs.
        let graph = chain_graph(&["A", "B", "C", "D", "E", "F"]);
        let config = AnalyzerConfig::default();
        let metrics = GraphMetrics::compute(&graph, &MetricsConfig::default());
        let detection = BetweennessExploitationDetector::compute(&graph, &metrics, &config);
        assert!(detection.warning.is_none());
        assert_eq!(detection.findings.len(), 2);
        for finding in &detection.findings {
            assert_eq!(finding.evidence["paths_controlled"], json!(6));
            assert_eq!(finding.risk_level, RiskLevel::High);
        }
    }

    #[test]
    fn test_betweenness_exploitation_skips_oversized_graph() {
        let graph = chain_graph(&["A", "B", "C", "D"]);
        let config = AnalyzerConfig::default().with_max_graph_size(2);
        let metrics = GraphMetrics::compute(&graph, &MetricsConfig::default());
        let detection = BetweennessExploitationDetector::compute(&graph, &metrics, &config);
        assert!(detection.findings.is_empty());
        assert_eq!(detection.warning.unwrap().0, WarningReason::Skipped);
    }

    #[test]
    fn test_eigenvector_dominance_cycle() {
        // A uniform cycle converges with every node at the maximum.
        let graph = chain_graph(&["A", "B", "C", "A"]);
        let config = AnalyzerConfig::default();
        let metrics = GraphMetrics::compute(&graph, &MetricsConfig::default());
        let detection = EigenvectorDominanceDetector::compute(&graph, &metrics, &config);
        assert!(detection.warning.is_none());
        assert_eq!(detection.findings.len(), 3);
        for finding in &detection.findings {
            assert_eq!(finding.risk_level, RiskLevel::High);
            assert_eq!(finding.evidence["total_connections"], json!(2));
        }
    }

    #[test]
    fn test_eigenvector_dominance_skips_when_absent() {
        let graph = chain_graph(&["A", "B", "C", "A"]);
        let config = AnalyzerConfig::default();
        let mut metrics = GraphMetrics::compute(&graph, &MetricsConfig::default());
        metrics.eigenvector = None;
        let detection = EigenvectorDominanceDetector::compute(&graph, &metrics, &config);
        assert!(detection.findings.is_empty());
        assert_eq!(detection.warning.unwrap().0, WarningReason::Skipped);
    }
}
