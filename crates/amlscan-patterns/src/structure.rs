//! Graph-structure detectors: layering chains, cycles, bridges, hubs,
//! clusters, local density, community isolation, and diameter anomalies.

use crate::stats::{mean, population_std};
use crate::suite::{AnalysisContext, Detection, Detector};
use amlscan_core::config::AnalyzerConfig;
use amlscan_core::detector::{DetectorCost, DetectorMetadata};
use amlscan_core::error::Result;
use amlscan_core::report::Finding;
use amlscan_core::types::{PatternType, RiskLevel};
use amlscan_graph::graph::TxGraph;
use amlscan_graph::metrics::GraphMetrics;
use amlscan_graph::paths;
use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

fn names(graph: &TxGraph, indices: &[usize]) -> Vec<String> {
    indices.iter().map(|&u| graph.node(u).to_string()).collect()
}

/// Sum of directed edge weights with both endpoints inside the set.
fn internal_flow(graph: &TxGraph, members: &BTreeSet<usize>) -> f64 {
    members
        .iter()
        .flat_map(|&u| graph.successors(u).iter().map(move |&v| (u, v)))
        .filter(|(_, v)| members.contains(v))
        .filter_map(|(u, v)| graph.edge(u, v))
        .map(|e| e.weight)
        .sum()
}

// ============================================================================
// Layering
// ============================================================================

/// Detects long simple chains of transfers that suggest layering.
#[derive(Debug, Clone)]
pub struct LayeringDetector {
    metadata: DetectorMetadata,
}

impl Default for LayeringDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LayeringDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/layering")
                .with_description("Simple-path enumeration for chained transfers")
                .with_graph()
                .with_cost(DetectorCost::Combinatorial),
        }
    }

    /// Enumerate simple paths of four or more accounts between every
    /// ordered node pair, capped to keep the output readable.
    #[must_use]
    pub fn compute(graph: &TxGraph, config: &AnalyzerConfig) -> Detection {
        let n = graph.node_count();
        if n > config.max_graph_size_for_expensive_detectors {
            return Detection::skipped(format!(
                "graph has {n} nodes, above the {} node ceiling for path enumeration",
                config.max_graph_size_for_expensive_detectors
            ));
        }

        let cap = config.layering_max_findings;
        let mut findings = Vec::new();
        let mut truncated = false;

        'outer: for source in 0..n {
            for target in 0..n {
                if source == target {
                    continue;
                }
                let enumeration = paths::simple_paths(graph, source, target, 4, 6, cap);
                truncated |= enumeration.truncated;
                for path in &enumeration.items {
                    let amounts: Vec<f64> = path
                        .windows(2)
                        .filter_map(|pair| graph.edge(pair[0], pair[1]))
                        .map(|e| e.weight)
                        .collect();
                    let total_amount: f64 = amounts.iter().sum();
                    let accounts = names(graph, path);

                    let confidence = (path.len() as f64 / 8.0 * 0.7).min(0.9);
                    let risk = if path.len() >= 5 {
                        RiskLevel::High
                    } else {
                        RiskLevel::Medium
                    };

                    let mut evidence = BTreeMap::new();
                    evidence.insert("path_length".to_string(), json!(path.len()));
                    evidence.insert("total_amount".to_string(), json!(total_amount));
                    evidence.insert("path".to_string(), json!(accounts));
                    evidence.insert("amounts".to_string(), json!(amounts));

                    findings.push(
                        Finding::new(
                            PatternType::Layering,
                            risk,
                            confidence,
                            format!(
                                "Complex transaction chain detected: {}... ({} accounts involved)",
                                accounts[..3].join(" -> "),
                                path.len()
                            ),
                            "Investigate complex transaction chain for potential layering activity",
                        )
                        .with_accounts(accounts)
                        .with_evidence(evidence),
                    );
                    if findings.len() >= cap {
                        truncated = true;
                        break 'outer;
                    }
                }
            }
        }

        if truncated {
            Detection::truncated(
                findings,
                format!("layering path enumeration capped at {cap} findings"),
            )
        } else {
            Detection::complete(findings)
        }
    }
}

#[async_trait]
impl Detector for LayeringDetector {
    fn metadata(&self) -> &DetectorMetadata {
        &self.metadata
    }

    async fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Detection> {
        Ok(Self::compute(ctx.graph, ctx.config))
    }
}

// ============================================================================
// Circular transactions
// ============================================================================

/// Detects simple cycles of funds returning to their origin.
#[derive(Debug, Clone)]
pub struct CircularTransactionsDetector {
    metadata: DetectorMetadata,
}

impl Default for CircularTransactionsDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl CircularTransactionsDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/circular-transactions")
                .with_description("Simple-cycle enumeration over the account graph")
                .with_graph()
                .with_cost(DetectorCost::Combinatorial),
        }
    }

    /// Enumerate simple cycles at least `circular_path_length` long.
    #[must_use]
    pub fn compute(graph: &TxGraph, config: &AnalyzerConfig) -> Detection {
        let n = graph.node_count();
        if n > config.max_graph_size_for_expensive_detectors {
            return Detection::skipped(format!(
                "graph has {n} nodes, above the {} node ceiling for cycle enumeration",
                config.max_graph_size_for_expensive_detectors
            ));
        }

        let enumeration =
            paths::simple_cycles(graph, config.circular_path_length, config.max_cycles);
        let mut findings = Vec::new();

        for cycle in &enumeration.items {
            let mut amounts = Vec::with_capacity(cycle.len());
            let mut times = Vec::with_capacity(cycle.len());
            for i in 0..cycle.len() {
                let u = cycle[i];
                let v = cycle[(i + 1) % cycle.len()];
                if let Some(edge) = graph.edge(u, v) {
                    amounts.push(edge.weight);
                    times.push(edge.last_timestamp());
                }
            }
            if amounts.is_empty() {
                continue;
            }
            let total_amount: f64 = amounts.iter().sum();
            let span_hours = match (times.iter().min(), times.iter().max()) {
                (Some(first), Some(last)) => (*last - *first).num_seconds() as f64 / 3600.0,
                _ => 0.0,
            };
            let accounts = names(graph, cycle);

            let confidence = (cycle.len() as f64 / 6.0 * 0.8).min(0.95);
            let risk = if cycle.len() >= 5 {
                RiskLevel::Critical
            } else {
                RiskLevel::High
            };

            let mut evidence = BTreeMap::new();
            evidence.insert("cycle_length".to_string(), json!(cycle.len()));
            evidence.insert("total_amount".to_string(), json!(total_amount));
            evidence.insert("time_span_hours".to_string(), json!(span_hours));
            evidence.insert("cycle_path".to_string(), json!(accounts));
            evidence.insert("amounts".to_string(), json!(amounts));

            findings.push(
                Finding::new(
                    PatternType::CircularTransactions,
                    risk,
                    confidence,
                    format!(
                        "Circular transaction pattern detected involving {} accounts with total amount ${total_amount:.2}",
                        cycle.len()
                    ),
                    "Investigate circular flow pattern for potential money laundering",
                )
                .with_accounts(accounts)
                .with_evidence(evidence),
            );
        }

        if enumeration.truncated {
            Detection::truncated(
                findings,
                format!("cycle enumeration capped at {} cycles", config.max_cycles),
            )
        } else {
            Detection::complete(findings)
        }
    }
}

#[async_trait]
impl Detector for CircularTransactionsDetector {
    fn metadata(&self) -> &DetectorMetadata {
        &self.metadata
    }

    async fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Detection> {
        Ok(Self::compute(ctx.graph, ctx.config))
    }
}

// ============================================================================
// Bridge accounts
// ============================================================================

/// Detects accounts sitting on multiple bridge edges of the undirected
/// projection.
#[derive(Debug, Clone)]
pub struct BridgeAccountDetector {
    metadata: DetectorMetadata,
}

impl Default for BridgeAccountDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeAccountDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/bridge-account")
                .with_description("Cut-edge incidence counting per account")
                .with_graph()
                .with_cost(DetectorCost::Polynomial),
        }
    }

    /// Count bridge incidences per node.
    #[must_use]
    pub fn compute(graph: &TxGraph, config: &AnalyzerConfig) -> Vec<Finding> {
        let undirected = graph.undirected();
        let bridges = paths::bridges(&undirected);
        if bridges.is_empty() {
            return Vec::new();
        }

        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for &(u, v) in &bridges {
            *counts.entry(u).or_insert(0) += 1;
            *counts.entry(v).or_insert(0) += 1;
        }

        let mut findings = Vec::new();
        for (&node, &bridge_count) in &counts {
            if bridge_count < config.bridge_min_count {
                continue;
            }
            let total_flow = graph.total_inflow(node) + graph.total_outflow(node);
            let ratio = bridge_count as f64 / bridges.len() as f64;
            let confidence = (ratio * 0.8).min(0.95);
            let risk = if bridge_count >= 3 {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            };

            let mut evidence = BTreeMap::new();
            evidence.insert("bridge_count".to_string(), json!(bridge_count));
            evidence.insert("total_bridges".to_string(), json!(bridges.len()));
            evidence.insert("total_flow_controlled".to_string(), json!(total_flow));
            evidence.insert("bridge_ratio".to_string(), json!(ratio));

            findings.push(
                Finding::new(
                    PatternType::BridgeAccount,
                    risk,
                    confidence,
                    format!(
                        "Account {} acts as bridge in {bridge_count} critical connections, controlling ${total_flow:.2} in flows",
                        graph.node(node)
                    ),
                    "Investigate bridge account's role in network connectivity",
                )
                .with_accounts([graph.node(node)])
                .with_evidence(evidence),
            );
        }
        findings
    }
}

#[async_trait]
impl Detector for BridgeAccountDetector {
    fn metadata(&self) -> &DetectorMetadata {
        &self.metadata
    }

    async fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Detection> {
        Ok(Detection::complete(Self::compute(ctx.graph, ctx.config)))
    }
}

// ============================================================================
// Hub accounts
// ============================================================================

/// Detects accounts whose connection count is an outlier against the
/// population.
#[derive(Debug, Clone)]
pub struct HubAccountDetector {
    metadata: DetectorMetadata,
}

impl Default for HubAccountDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl HubAccountDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/hub-account")
                .with_description("Degree outliers against the population mean")
                .with_graph(),
        }
    }

    /// Flag nodes whose degree exceeds both the absolute threshold and
    /// two standard deviations above the mean.
    #[must_use]
    pub fn compute(graph: &TxGraph, config: &AnalyzerConfig) -> Vec<Finding> {
        let n = graph.node_count();
        if n == 0 {
            return Vec::new();
        }
        let degrees: Vec<f64> = (0..n).map(|u| graph.degree(u) as f64).collect();
        let mean_degree = mean(&degrees);
        let std_degree = population_std(&degrees);
        let max_degree = degrees.iter().copied().fold(0.0, f64::max);

        let mut findings = Vec::new();
        for u in 0..n {
            let degree = graph.degree(u) as f64;
            if (degree as usize) < config.hub_degree_threshold
                || degree <= mean_degree + 2.0 * std_degree
            {
                continue;
            }
            let total_inflow = graph.total_inflow(u);
            let total_outflow = graph.total_outflow(u);
            let z_score = if std_degree > 0.0 {
                (degree - mean_degree) / std_degree
            } else {
                0.0
            };

            let confidence = (degree / max_degree * 0.8).min(0.9);
            let risk = if degree > mean_degree + 3.0 * std_degree {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            };

            let mut evidence = BTreeMap::new();
            evidence.insert("total_degree".to_string(), json!(graph.degree(u)));
            evidence.insert("in_degree".to_string(), json!(graph.in_degree(u)));
            evidence.insert("out_degree".to_string(), json!(graph.out_degree(u)));
            evidence.insert("total_inflow".to_string(), json!(total_inflow));
            evidence.insert("total_outflow".to_string(), json!(total_outflow));
            evidence.insert("degree_z_score".to_string(), json!(z_score));

            findings.push(
                Finding::new(
                    PatternType::HubAccount,
                    risk,
                    confidence,
                    format!(
                        "Account {} is a major hub with {} connections ({} in, {} out), processing ${:.2}",
                        graph.node(u),
                        graph.degree(u),
                        graph.in_degree(u),
                        graph.out_degree(u),
                        total_inflow + total_outflow
                    ),
                    "Investigate hub account's role in transaction network",
                )
                .with_accounts([graph.node(u)])
                .with_evidence(evidence),
            );
        }
        findings
    }
}

#[async_trait]
impl Detector for HubAccountDetector {
    fn metadata(&self) -> &DetectorMetadata {
        &self.metadata
    }

    async fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Detection> {
        Ok(Detection::complete(Self::compute(ctx.graph, ctx.config)))
    }
}

// ============================================================================
// Isolated clusters
// ============================================================================

/// Detects dense weakly-connected components cut off from the rest of
/// the network.
#[derive(Debug, Clone)]
pub struct IsolatedClusterDetector {
    metadata: DetectorMetadata,
}

impl Default for IsolatedClusterDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl IsolatedClusterDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/isolated-cluster")
                .with_description("Density and isolation scoring of weak components")
                .with_graph(),
        }
    }

    /// Score each component of three or more accounts.
    #[must_use]
    pub fn compute(graph: &TxGraph, metrics: &GraphMetrics) -> Vec<Finding> {
        let n = graph.node_count();
        let mut findings = Vec::new();

        for component in &metrics.components {
            let k = component.len();
            if k < 3 || k == n {
                // A component spanning the whole graph has nothing to
                // be isolated from.
                continue;
            }
            let members: BTreeSet<usize> = component.iter().copied().collect();

            let internal_edges = members
                .iter()
                .flat_map(|&u| graph.successors(u).iter())
                .filter(|v| members.contains(*v))
                .count();
            let density = internal_edges as f64 / (k * (k - 1)) as f64;
            let total_flow = internal_flow(graph, &members);

            // Directed successors never leave a weak component, so the
            // external count stays zero and isolation is maximal.
            let external_connections = members
                .iter()
                .flat_map(|&u| graph.successors(u).iter())
                .filter(|v| !members.contains(*v))
                .count();
            let isolation_ratio =
                1.0 - external_connections as f64 / (k * (n - k)) as f64;

            if isolation_ratio <= 0.8 || density <= 0.5 {
                continue;
            }
            let confidence = (isolation_ratio * density).min(0.9);
            let risk = if k >= 5 {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            };

            let mut evidence = BTreeMap::new();
            evidence.insert("cluster_size".to_string(), json!(k));
            evidence.insert("cluster_density".to_string(), json!(density));
            evidence.insert("total_flow".to_string(), json!(total_flow));
            evidence.insert("isolation_ratio".to_string(), json!(isolation_ratio));
            evidence.insert(
                "external_connections".to_string(),
                json!(external_connections),
            );

            findings.push(
                Finding::new(
                    PatternType::IsolatedCluster,
                    risk,
                    confidence,
                    format!(
                        "Isolated cluster of {k} accounts with high internal density ({density:.2}) and ${total_flow:.2} in flows"
                    ),
                    "Investigate isolated cluster for potential layering scheme",
                )
                .with_accounts(names(graph, component))
                .with_evidence(evidence),
            );
        }
        findings
    }
}

#[async_trait]
impl Detector for IsolatedClusterDetector {
    fn metadata(&self) -> &DetectorMetadata {
        &self.metadata
    }

    async fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Detection> {
        Ok(Detection::complete(Self::compute(ctx.graph, ctx.metrics)))
    }
}

// ============================================================================
// Network density anomalies
// ============================================================================

/// Detects accounts whose local clustering coefficient is an outlier.
#[derive(Debug, Clone)]
pub struct NetworkDensityAnomalyDetector {
    metadata: DetectorMetadata,
}

impl Default for NetworkDensityAnomalyDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkDensityAnomalyDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/network-density-anomaly")
                .with_description("Local clustering-coefficient outliers")
                .with_graph(),
        }
    }

    /// Flag nodes whose clustering coefficient clears both the absolute
    /// and the z-score threshold.
    #[must_use]
    pub fn compute(
        graph: &TxGraph,
        metrics: &GraphMetrics,
        config: &AnalyzerConfig,
    ) -> Vec<Finding> {
        let coeffs = &metrics.clustering;
        if coeffs.is_empty() {
            return Vec::new();
        }
        let mean_clustering = mean(coeffs);
        let std_clustering = population_std(coeffs);
        let undirected = graph.undirected();

        let mut findings = Vec::new();
        for (u, &coeff) in coeffs.iter().enumerate() {
            if coeff <= config.clustering_coeff_threshold
                || coeff <= mean_clustering + config.density_anomaly_threshold * std_clustering
            {
                continue;
            }

            let neighbors: Vec<usize> =
                undirected.neighbors(u).iter().map(|&(v, _)| v).collect();
            let mut local: BTreeSet<usize> = neighbors.iter().copied().collect();
            local.insert(u);
            // Each undirected pair appears twice in the adjacency lists.
            let total_local_flow: f64 = local
                .iter()
                .flat_map(|&a| undirected.neighbors(a).iter())
                .filter(|(b, _)| local.contains(b))
                .map(|&(_, w)| w)
                .sum::<f64>()
                / 2.0;
            let z_score = if std_clustering > 0.0 {
                (coeff - mean_clustering) / std_clustering
            } else {
                0.0
            };

            let confidence = (coeff * 0.9).min(0.85);
            let risk = if coeff > 0.9 {
                RiskLevel::Medium
            } else {
                RiskLevel::Low
            };

            let mut evidence = BTreeMap::new();
            evidence.insert("clustering_coefficient".to_string(), json!(coeff));
            evidence.insert("num_neighbors".to_string(), json!(neighbors.len()));
            evidence.insert("total_local_flow".to_string(), json!(total_local_flow));
            evidence.insert("clustering_z_score".to_string(), json!(z_score));

            let mut accounts = vec![graph.node(u).to_string()];
            accounts.extend(names(graph, &neighbors));
            findings.push(
                Finding::new(
                    PatternType::NetworkDensityAnomaly,
                    risk,
                    confidence,
                    format!(
                        "Account {} shows unusually high local network density (clustering={coeff:.3}) with {} interconnected neighbors",
                        graph.node(u),
                        neighbors.len()
                    ),
                    "Investigate dense local network for potential coordinated activity",
                )
                .with_accounts(accounts)
                .with_evidence(evidence),
            );
        }
        findings
    }
}

#[async_trait]
impl Detector for NetworkDensityAnomalyDetector {
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

// ============================================================================
// Community isolation
// ============================================================================

/// Detects modular communities with almost no edges to the rest of the
/// network.
#[derive(Debug, Clone)]
pub struct CommunityIsolationDetector {
    metadata: DetectorMetadata,
}

impl Default for CommunityIsolationDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityIsolationDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/community-isolation")
                .with_description("Isolation scoring of modularity communities")
                .with_graph(),
        }
    }

    /// Score each community of three or more accounts when the overall
    /// partition is modular enough.
    #[must_use]
    pub fn compute(
        graph: &TxGraph,
        metrics: &GraphMetrics,
        config: &AnalyzerConfig,
    ) -> Vec<Finding> {
        let partition = &metrics.communities;
        if partition.num_communities <= 1
            || partition.modularity <= config.community_modularity_threshold
        {
            return Vec::new();
        }

        let n = graph.node_count();
        let undirected = graph.undirected();
        let mut findings = Vec::new();

        for community in partition.members() {
            let k = community.len();
            if k < 3 {
                continue;
            }
            let members: BTreeSet<usize> = community.iter().copied().collect();

            let mut external_edges = 0usize;
            let mut internal_flow_total = 0.0;
            let mut external_flow = 0.0;
            for &u in &members {
                for &(v, _) in undirected.neighbors(u) {
                    if members.contains(&v) {
                        if let Some(edge) = graph.edge(u, v) {
                            internal_flow_total += edge.weight;
                        }
                    } else {
                        external_edges += 1;
                        if let Some(edge) = graph.edge(u, v) {
                            external_flow += edge.weight;
                        }
                        if let Some(edge) = graph.edge(v, u) {
                            external_flow += edge.weight;
                        }
                    }
                }
            }

            let possible_external = k * (n - k);
            let isolation_ratio = if possible_external > 0 {
                1.0 - external_edges as f64 / possible_external as f64
            } else {
                1.0
            };
            if isolation_ratio <= 0.7 {
                continue;
            }

            let confidence = (isolation_ratio * 0.8).min(0.9);
            let risk = if isolation_ratio > 0.9 {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            };

            let mut evidence = BTreeMap::new();
            evidence.insert("community_size".to_string(), json!(k));
            evidence.insert("isolation_ratio".to_string(), json!(isolation_ratio));
            evidence.insert("internal_flow".to_string(), json!(internal_flow_total));
            evidence.insert("external_flow".to_string(), json!(external_flow));
            evidence.insert("modularity".to_string(), json!(partition.modularity));
            evidence.insert("external_connections".to_string(), json!(external_edges));

            findings.push(
                Finding::new(
                    PatternType::CommunityIsolation,
                    risk,
                    confidence,
                    format!(
                        "Isolated community of {k} accounts with {isolation_ratio:.2} isolation ratio and ${internal_flow_total:.2} internal flow"
                    ),
                    "Investigate isolated community for potential closed-loop laundering",
                )
                .with_accounts(names(graph, &community))
                .with_evidence(evidence),
            );
        }
        findings
    }
}

#[async_trait]
impl Detector for CommunityIsolationDetector {
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

// ============================================================================
// Graph diameter anomalies
// ============================================================================

/// Detects components stretched far beyond the diameter expected of a
/// random graph their size.
#[derive(Debug, Clone)]
pub struct GraphDiameterAnomalyDetector {
    metadata: DetectorMetadata,
}

impl Default for GraphDiameterAnomalyDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphDiameterAnomalyDetector {
    /// Create the detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: DetectorMetadata::new("patterns/graph-diameter-anomaly")
                .with_description("Component diameters against the random-graph expectation")
                .with_graph()
                .with_cost(DetectorCost::Polynomial),
        }
    }

    /// Compare each component's diameter against `ln k / ln ln k`.
    #[must_use]
    pub fn compute(
        graph: &TxGraph,
        metrics: &GraphMetrics,
        config: &AnalyzerConfig,
    ) -> Vec<Finding> {
        let undirected = graph.undirected();
        let mut findings = Vec::new();

        for component in &metrics.components {
            let k = component.len();
            if k < 4 {
                continue;
            }
            let Some(diameter) = paths::component_diameter(&undirected, component) else {
                continue;
            };
            let avg_path_length =
                paths::component_average_path_length(&undirected, component).unwrap_or(0.0);
            let expected = (k as f64).ln() / (k as f64).ln().ln();
            if (diameter as f64) <= expected * config.diameter_anomaly_threshold {
                continue;
            }

            let mut longest_paths = 0usize;
            for &u in component {
                let hops = paths::bfs_hops(&undirected, u);
                longest_paths += component
                    .iter()
                    .filter(|&&v| v != u && hops[v] == diameter)
                    .count();
            }
            let members: BTreeSet<usize> = component.iter().copied().collect();
            let total_flow = internal_flow(graph, &members);

            let ratio = diameter as f64 / expected;
            let confidence = ((ratio - 1.0) * 0.5).min(0.9);
            let risk = if diameter as f64 > expected * 3.0 {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            };

            let mut evidence = BTreeMap::new();
            evidence.insert("actual_diameter".to_string(), json!(diameter));
            evidence.insert("expected_diameter".to_string(), json!(expected));
            evidence.insert("diameter_ratio".to_string(), json!(ratio));
            evidence.insert("avg_path_length".to_string(), json!(avg_path_length));
            evidence.insert("component_size".to_string(), json!(k));
            evidence.insert("total_flow".to_string(), json!(total_flow));
            evidence.insert("longest_paths_count".to_string(), json!(longest_paths));

            findings.push(
                Finding::new(
                    PatternType::GraphDiameterAnomaly,
                    risk,
                    confidence,
                    format!(
                        "Component with {k} accounts shows unusual diameter ({diameter}) suggesting complex layering paths"
                    ),
                    "Investigate component with unusual diameter for complex layering schemes",
                )
                .with_accounts(names(graph, component))
                .with_evidence(evidence),
            );
        }
        findings
    }
}

#[async_trait]
impl Detector for GraphDiameterAnomalyDetector {
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
