//! One-shot graph metrics shared read-only by every detector.

use crate::centrality;
use crate::community::{greedy_communities, CommunityPartition};
use crate::graph::{TxGraph, UndirectedGraph};
use crate::paths::{component_average_path_length, component_diameter, connected_components};
use serde::{Deserialize, Serialize};

/// Numeric knobs for the metric computations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Power-iteration cap for eigenvector centrality.
    pub eigenvector_max_iter: usize,
    /// Convergence tolerance for eigenvector centrality.
    pub eigenvector_tolerance: f64,
    /// PageRank damping factor.
    pub pagerank_damping: f64,
    /// PageRank iteration cap.
    pub pagerank_max_iter: usize,
    /// PageRank convergence tolerance.
    pub pagerank_tolerance: f64,
    /// Local-moving pass cap for community detection.
    pub community_max_passes: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            eigenvector_max_iter: 1000,
            eigenvector_tolerance: 1e-6,
            pagerank_damping: 0.85,
            pagerank_max_iter: 100,
            pagerank_tolerance: 1e-6,
            community_max_passes: 20,
        }
    }
}

/// Graph-theoretic metrics computed once per analysis run.
///
/// All per-node vectors are indexed by node index. A zero-node graph
/// yields empty vectors and absent scalars.
#[derive(Debug, Clone)]
pub struct GraphMetrics {
    /// Number of nodes.
    pub num_nodes: usize,
    /// Number of aggregated directed edges.
    pub num_edges: usize,
    /// Directed edge density.
    pub density: f64,
    /// Weighted betweenness centrality.
    pub betweenness: Vec<f64>,
    /// Weighted closeness centrality.
    pub closeness: Vec<f64>,
    /// Weighted eigenvector centrality; `None` on non-convergence.
    pub eigenvector: Option<Vec<f64>>,
    /// Weighted PageRank.
    pub pagerank: Vec<f64>,
    /// In-degree centrality.
    pub in_degree_centrality: Vec<f64>,
    /// Out-degree centrality.
    pub out_degree_centrality: Vec<f64>,
    /// Local clustering coefficient on the undirected projection.
    pub clustering: Vec<f64>,
    /// Global transitivity on the undirected projection.
    pub transitivity: f64,
    /// Weakly connected components (sorted members, smallest-first order).
    pub components: Vec<Vec<usize>>,
    /// Unweighted diameter of the largest weak component, when it has
    /// more than one node.
    pub diameter: Option<usize>,
    /// Average shortest-path length in hops of the largest weak
    /// component, on the same hop convention as `diameter`.
    pub average_path_length: Option<f64>,
    /// Greedy-modularity community partition.
    pub communities: CommunityPartition,
}

impl GraphMetrics {
    /// Compute all metrics for a graph.
    #[must_use]
    pub fn compute(graph: &TxGraph, config: &MetricsConfig) -> Self {
        let n = graph.node_count();
        tracing::debug!(nodes = n, edges = graph.edge_count(), "computing graph metrics");

        let undirected = graph.undirected();
        let (clustering, transitivity) = clustering_and_transitivity(&undirected);

        let components = connected_components(&undirected);
        let largest = components.iter().max_by_key(|c| c.len());
        let (diameter, average_path_length) = match largest {
            Some(component) if component.len() > 1 => (
                component_diameter(&undirected, component),
                component_average_path_length(&undirected, component),
            ),
            _ => (None, None),
        };

        let eigenvector = centrality::eigenvector(
            graph,
            config.eigenvector_max_iter,
            config.eigenvector_tolerance,
        );
        if eigenvector.is_none() {
            tracing::warn!("eigenvector centrality did not converge; metric omitted");
        }

        Self {
            num_nodes: n,
            num_edges: graph.edge_count(),
            density: graph.density(),
            betweenness: centrality::betweenness(graph),
            closeness: centrality::closeness(graph),
            eigenvector,
            pagerank: centrality::pagerank(
                graph,
                config.pagerank_damping,
                config.pagerank_max_iter,
                config.pagerank_tolerance,
            ),
            in_degree_centrality: centrality::in_degree_centrality(graph),
            out_degree_centrality: centrality::out_degree_centrality(graph),
            clustering,
            transitivity,
            components,
            diameter,
            average_path_length,
            communities: greedy_communities(&undirected, config.community_max_passes),
        }
    }
}

/// Local clustering coefficients and global transitivity, unweighted,
/// on the undirected projection.
fn clustering_and_transitivity(graph: &UndirectedGraph) -> (Vec<f64>, f64) {
    let n = graph.node_count();
    let mut coefficients = vec![0.0; n];
    let mut closed_triads = 0.0;
    let mut total_triads = 0.0;

    for u in 0..n {
        let degree = graph.degree(u);
        if degree < 2 {
            continue;
        }
        let neighbors = graph.neighbors(u);
        let mut links = 0usize;
        for (i, &(a, _)) in neighbors.iter().enumerate() {
            for &(b, _) in &neighbors[i + 1..] {
                if graph.has_edge(a, b) {
                    links += 1;
                }
            }
        }
        let triads = (degree * (degree - 1)) as f64;
        coefficients[u] = 2.0 * links as f64 / triads;
        closed_triads += 2.0 * links as f64;
        total_triads += triads;
    }

    let transitivity = if total_triads > 0.0 {
        closed_triads / total_triads
    } else {
        0.0
    };
    (coefficients, transitivity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use amlscan_core::types::{TransactionRecord, TransactionTable};
    use chrono::{TimeZone, Utc};

    fn graph_from(edges: &[(&str, &str, f64)]) -> TxGraph {
        let records = edges
            .iter()
            .enumerate()
            .map(|(i, &(s, t, a))| {
                TransactionRecord::new(
                    format!("t{i}"),
                    s,
                    t,
                    a,
                    Utc.with_ymd_and_hms(2024, 1, 1, 0, i as u32 % 60, 0).unwrap(),
                )
            })
            .collect();
        TxGraph::build(&TransactionTable::from_records(records).unwrap())
    }

    #[test]
    fn test_empty_graph_metrics() {
        let metrics = GraphMetrics::compute(&graph_from(&[]), &MetricsConfig::default());
        assert_eq!(metrics.num_nodes, 0);
        assert!(metrics.betweenness.is_empty());
        assert_eq!(metrics.eigenvector, Some(Vec::new()));
        assert_eq!(metrics.diameter, None);
        assert_eq!(metrics.average_path_length, None);
        assert_eq!(metrics.communities.num_communities, 0);
    }

    #[test]
    fn test_triangle_clustering() {
        let graph = graph_from(&[("A", "B", 1.0), ("B", "C", 1.0), ("C", "A", 1.0)]);
        let metrics = GraphMetrics::compute(&graph, &MetricsConfig::default());
        assert!(metrics.clustering.iter().all(|&c| (c - 1.0).abs() < 1e-12));
        assert!((metrics.transitivity - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_chain_has_no_clustering() {
        let graph = graph_from(&[("A", "B", 1.0), ("B", "C", 1.0)]);
        let metrics = GraphMetrics::compute(&graph, &MetricsConfig::default());
        assert!(metrics.clustering.iter().all(|&c| c == 0.0));
        assert_eq!(metrics.transitivity, 0.0);
    }

    #[test]
    fn test_diameter_uses_largest_component() {
        // A 4-chain plus a detached pair; diameter comes from the chain.
        let graph = graph_from(&[
            ("A", "B", 1.0),
            ("B", "C", 1.0),
            ("C", "D", 1.0),
            ("X", "Y", 1.0),
        ]);
        let metrics = GraphMetrics::compute(&graph, &MetricsConfig::default());
        assert_eq!(metrics.components.len(), 2);
        assert_eq!(metrics.diameter, Some(3));
        assert!(metrics.average_path_length.is_some());
    }

    #[test]
    fn test_metrics_are_deterministic() {
        let edges = [
            ("A", "B", 3.0),
            ("B", "C", 2.0),
            ("C", "A", 5.0),
            ("C", "D", 1.0),
            ("D", "E", 4.0),
        ];
        let first = GraphMetrics::compute(&graph_from(&edges), &MetricsConfig::default());
        let second = GraphMetrics::compute(&graph_from(&edges), &MetricsConfig::default());
        assert_eq!(first.betweenness, second.betweenness);
        assert_eq!(first.pagerank, second.pagerank);
        assert_eq!(
            first.communities.assignments,
            second.communities.assignments
        );
    }
}
