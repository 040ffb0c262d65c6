//! Weighted centrality measures on the directed transaction graph.
//!
//! - Betweenness via Brandes' algorithm with Dijkstra inner loops
//! - Closeness over incoming distances (Wasserman-Faust scaled)
//! - Eigenvector centrality via bounded power iteration
//! - PageRank with uniform teleport and dangling redistribution
//! - In/out degree centrality

use crate::graph::TxGraph;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapEntry {
    dist: f64,
    node: usize,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Weighted betweenness centrality, normalized by (n-1)(n-2) for directed
/// graphs. Graphs with fewer than three nodes score zero everywhere.
#[must_use]
pub fn betweenness(graph: &TxGraph) -> Vec<f64> {
    let n = graph.node_count();
    let mut centrality = vec![0.0; n];
    if n < 3 {
        return centrality;
    }

    for s in 0..n {
        // Brandes: single-source shortest paths with path counting.
        let mut dist = vec![f64::INFINITY; n];
        let mut sigma = vec![0.0; n];
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut settled: Vec<usize> = Vec::with_capacity(n);
        let mut done = vec![false; n];

        dist[s] = 0.0;
        sigma[s] = 1.0;
        let mut heap = BinaryHeap::new();
        heap.push(HeapEntry { dist: 0.0, node: s });

        while let Some(HeapEntry { dist: d, node: u }) = heap.pop() {
            if done[u] {
                continue;
            }
            done[u] = true;
            settled.push(u);
            for &v in graph.successors(u) {
                let Some(edge) = graph.edge(u, v) else { continue };
                let nd = d + edge.weight;
                if nd < dist[v] {
                    dist[v] = nd;
                    sigma[v] = sigma[u];
                    preds[v].clear();
                    preds[v].push(u);
                    heap.push(HeapEntry { dist: nd, node: v });
                } else if nd == dist[v] {
                    sigma[v] += sigma[u];
                    preds[v].push(u);
                }
            }
        }

        let mut delta = vec![0.0; n];
        for &w in settled.iter().rev() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                centrality[w] += delta[w];
            }
        }
    }

    let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
    for value in &mut centrality {
        *value *= scale;
    }
    centrality
}

/// Weighted closeness centrality over incoming distances.
///
/// Uses the Wasserman-Faust improvement: the raw closeness of a node is
/// scaled by the fraction of the graph that can reach it.
#[must_use]
pub fn closeness(graph: &TxGraph) -> Vec<f64> {
    let n = graph.node_count();
    let mut centrality = vec![0.0; n];
    if n < 2 {
        return centrality;
    }

    for u in 0..n {
        let dist = crate::paths::dijkstra_directed(graph, u, true);
        let mut reachable = 0usize;
        let mut total = 0.0;
        for (v, &d) in dist.iter().enumerate() {
            if v != u && d.is_finite() {
                reachable += 1;
                total += d;
            }
        }
        if reachable > 0 && total > 0.0 {
            let r = reachable as f64;
            centrality[u] = (r / total) * (r / (n - 1) as f64);
        }
    }
    centrality
}

/// Weighted eigenvector centrality by power iteration.
///
/// Centrality flows along edge direction: a node inherits importance from
/// its in-neighbors. Returns `None` when the iteration does not converge
/// within `max_iter` steps; callers treat the metric as absent.
#[must_use]
pub fn eigenvector(graph: &TxGraph, max_iter: usize, tolerance: f64) -> Option<Vec<f64>> {
    let n = graph.node_count();
    if n == 0 {
        return Some(Vec::new());
    }

    let mut x = vec![1.0 / n as f64; n];
    for _ in 0..max_iter {
        let x_last = x.clone();
        for (u, value) in x_last.iter().enumerate() {
            for &v in graph.successors(u) {
                if let Some(edge) = graph.edge(u, v) {
                    x[v] += value * edge.weight;
                }
            }
        }
        let norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
        let norm = if norm > 0.0 { norm } else { 1.0 };
        for value in &mut x {
            *value /= norm;
        }
        let err: f64 = x
            .iter()
            .zip(&x_last)
            .map(|(a, b)| (a - b).abs())
            .sum();
        if err < n as f64 * tolerance {
            return Some(x);
        }
    }
    None
}

/// Weighted PageRank with uniform teleport.
///
/// Transition probability out of a node is proportional to edge weight;
/// dangling mass is redistributed uniformly. Returns the final iterate
/// even when the tolerance was not reached within `max_iter` steps.
#[must_use]
pub fn pagerank(graph: &TxGraph, damping: f64, max_iter: usize, tolerance: f64) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }

    let out_weight: Vec<f64> = (0..n).map(|u| graph.total_outflow(u)).collect();
    let uniform = 1.0 / n as f64;
    let mut x = vec![uniform; n];

    for _ in 0..max_iter {
        let x_last = x.clone();
        let dangling_mass: f64 = (0..n)
            .filter(|&u| out_weight[u] == 0.0)
            .map(|u| x_last[u])
            .sum();
        let base = (1.0 - damping) * uniform + damping * dangling_mass * uniform;
        x.iter_mut().for_each(|v| *v = base);

        for u in 0..n {
            if out_weight[u] == 0.0 {
                continue;
            }
            let share = damping * x_last[u] / out_weight[u];
            for &v in graph.successors(u) {
                if let Some(edge) = graph.edge(u, v) {
                    x[v] += share * edge.weight;
                }
            }
        }

        let err: f64 = x
            .iter()
            .zip(&x_last)
            .map(|(a, b)| (a - b).abs())
            .sum();
        if err < n as f64 * tolerance {
            break;
        }
    }
    x
}

/// In-degree centrality: in-degree over n - 1.
#[must_use]
pub fn in_degree_centrality(graph: &TxGraph) -> Vec<f64> {
    degree_centrality_by(graph, |g, u| g.in_degree(u))
}

/// Out-degree centrality: out-degree over n - 1.
#[must_use]
pub fn out_degree_centrality(graph: &TxGraph) -> Vec<f64> {
    degree_centrality_by(graph, |g, u| g.out_degree(u))
}

fn degree_centrality_by(graph: &TxGraph, degree: impl Fn(&TxGraph, usize) -> usize) -> Vec<f64> {
    let n = graph.node_count();
    if n < 2 {
        return vec![0.0; n];
    }
    let scale = 1.0 / (n - 1) as f64;
    (0..n).map(|u| degree(graph, u) as f64 * scale).collect()
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
    fn test_betweenness_middle_of_chain() {
        let graph = graph_from(&[("A", "B", 1.0), ("B", "C", 1.0)]);
        let bc = betweenness(&graph);
        let b = graph.node_index("B").unwrap();
        // B carries the single A->C shortest path; scale is 1/((3-1)(3-2)).
        assert!((bc[b] - 0.5).abs() < 1e-12);
        assert_eq!(bc[graph.node_index("A").unwrap()], 0.0);
    }

    #[test]
    fn test_betweenness_small_graph_is_zero() {
        let graph = graph_from(&[("A", "B", 1.0)]);
        assert!(betweenness(&graph).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_closeness_sink_of_chain() {
        let graph = graph_from(&[("A", "B", 1.0), ("B", "C", 1.0)]);
        let cc = closeness(&graph);
        let c = graph.node_index("C").unwrap();
        let a = graph.node_index("A").unwrap();
        // C is reached by A (dist 2) and B (dist 1): (2/3) * (2/2) = 2/3.
        assert!((cc[c] - 2.0 / 3.0).abs() < 1e-12);
        // Nothing reaches A.
        assert_eq!(cc[a], 0.0);
    }

    #[test]
    fn test_eigenvector_symmetric_cycle() {
        let graph = graph_from(&[("A", "B", 1.0), ("B", "C", 1.0), ("C", "A", 1.0)]);
        let ev = eigenvector(&graph, 1000, 1e-6).expect("cycle should converge");
        let expected = 1.0 / 3.0_f64.sqrt();
        for value in ev {
            assert!((value - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn test_eigenvector_empty_graph() {
        let graph = graph_from(&[]);
        assert_eq!(eigenvector(&graph, 100, 1e-6), Some(Vec::new()));
    }

    #[test]
    fn test_pagerank_sums_to_one() {
        let graph = graph_from(&[
            ("A", "B", 5.0),
            ("B", "C", 2.0),
            ("C", "A", 1.0),
            ("A", "C", 3.0),
        ]);
        let pr = pagerank(&graph, 0.85, 100, 1e-6);
        let total: f64 = pr.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(pr.iter().all(|&v| v > 0.0));
    }

    #[test]
    fn test_degree_centrality() {
        let graph = graph_from(&[("A", "B", 1.0), ("A", "C", 1.0), ("B", "C", 1.0)]);
        let a = graph.node_index("A").unwrap();
        let c = graph.node_index("C").unwrap();
        let outc = out_degree_centrality(&graph);
        let inc = in_degree_centrality(&graph);
        assert_eq!(outc[a], 1.0); // 2 out-edges over n - 1 = 2
        assert_eq!(inc[c], 1.0);
        assert_eq!(inc[a], 0.0);
    }
}
