//! Greedy modularity community detection on the undirected projection.
//!
//! Single-level Louvain-style local moving: every node starts in its own
//! community and is repeatedly moved to the neighboring community with the
//! best modularity gain until a pass makes no further improvement. Nodes
//! are visited in index order, so the partition is deterministic.

use crate::graph::UndirectedGraph;
use std::collections::BTreeMap;

/// A community partition with its modularity score.
#[derive(Debug, Clone)]
pub struct CommunityPartition {
    /// Community index per node, renumbered in order of first appearance.
    pub assignments: Vec<usize>,
    /// Number of distinct communities.
    pub num_communities: usize,
    /// Modularity of the partition.
    pub modularity: f64,
}

impl CommunityPartition {
    /// Members of each community, in community order; members sorted.
    #[must_use]
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.num_communities];
        for (node, &community) in self.assignments.iter().enumerate() {
            groups[community].push(node);
        }
        groups
    }
}

/// Detect communities by greedy modularity maximization.
#[must_use]
pub fn greedy_communities(graph: &UndirectedGraph, max_passes: usize) -> CommunityPartition {
    let n = graph.node_count();
    if n == 0 {
        return CommunityPartition {
            assignments: Vec::new(),
            num_communities: 0,
            modularity: 0.0,
        };
    }

    let m2 = 2.0 * graph.total_weight();
    let mut community: Vec<usize> = (0..n).collect();
    // Sum of weighted degrees per community.
    let mut community_total: Vec<f64> = (0..n).map(|u| graph.weighted_degree(u)).collect();

    if m2 > 0.0 {
        for _ in 0..max_passes {
            let mut improved = false;
            for u in 0..n {
                let k_u = graph.weighted_degree(u);
                let current = community[u];
                community_total[current] -= k_u;

                // Weight from u to each neighboring community.
                let mut links: BTreeMap<usize, f64> = BTreeMap::new();
                links.insert(current, 0.0);
                for &(v, w) in graph.neighbors(u) {
                    *links.entry(community[v]).or_insert(0.0) += w;
                }

                let mut best = current;
                let mut best_gain = links[&current] - community_total[current] * k_u / m2;
                for (&candidate, &w_uc) in &links {
                    let gain = w_uc - community_total[candidate] * k_u / m2;
                    if gain > best_gain + 1e-12 {
                        best = candidate;
                        best_gain = gain;
                    }
                }

                community_total[best] += k_u;
                if best != current {
                    community[u] = best;
                    improved = true;
                }
            }
            if !improved {
                break;
            }
        }
    }

    // Renumber communities by first appearance.
    let mut remap: BTreeMap<usize, usize> = BTreeMap::new();
    let mut assignments = Vec::with_capacity(n);
    for &c in &community {
        let next = remap.len();
        let id = *remap.entry(c).or_insert(next);
        assignments.push(id);
    }
    let num_communities = remap.len();
    let modularity = modularity_score(graph, &assignments);

    CommunityPartition {
        assignments,
        num_communities,
        modularity,
    }
}

/// Modularity of a partition over the undirected projection.
///
/// Q = sum over communities of (in_c / 2m - (tot_c / 2m)^2), where in_c
/// counts intra-community adjacency (each edge twice) and tot_c sums
/// weighted degrees.
#[must_use]
pub fn modularity_score(graph: &UndirectedGraph, assignments: &[usize]) -> f64 {
    let m2 = 2.0 * graph.total_weight();
    if m2 == 0.0 {
        return 0.0;
    }
    let num_communities = assignments.iter().copied().max().map_or(0, |c| c + 1);
    let mut internal = vec![0.0; num_communities];
    let mut total = vec![0.0; num_communities];

    for u in 0..graph.node_count() {
        let c = assignments[u];
        total[c] += graph.weighted_degree(u);
        for &(v, w) in graph.neighbors(u) {
            if assignments[v] == c {
                internal[c] += w;
            }
        }
    }

    (0..num_communities)
        .map(|c| internal[c] / m2 - (total[c] / m2).powi(2))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TxGraph;
    use amlscan_core::types::{TransactionRecord, TransactionTable};
    use chrono::{TimeZone, Utc};

    fn undirected_from(edges: &[(&str, &str, f64)]) -> UndirectedGraph {
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
        TxGraph::build(&TransactionTable::from_records(records).unwrap()).undirected()
    }

    fn two_cliques() -> UndirectedGraph {
        // Two triangles joined by a weak edge.
        undirected_from(&[
            ("A", "B", 10.0),
            ("B", "C", 10.0),
            ("C", "A", 10.0),
            ("D", "E", 10.0),
            ("E", "F", 10.0),
            ("F", "D", 10.0),
            ("C", "D", 1.0),
        ])
    }

    #[test]
    fn test_two_cliques_split() {
        let partition = greedy_communities(&two_cliques(), 20);
        assert_eq!(partition.num_communities, 2);
        let a = partition.assignments.clone();
        assert_eq!(a[0], a[1]);
        assert_eq!(a[1], a[2]);
        assert_eq!(a[3], a[4]);
        assert_eq!(a[4], a[5]);
        assert_ne!(a[0], a[3]);
        assert!(partition.modularity > 0.3);
    }

    #[test]
    fn test_partition_members() {
        let partition = greedy_communities(&two_cliques(), 20);
        let members = partition.members();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0], vec![0, 1, 2]);
        assert_eq!(members[1], vec![3, 4, 5]);
    }

    #[test]
    fn test_empty_graph() {
        let partition = greedy_communities(&undirected_from(&[]), 20);
        assert_eq!(partition.num_communities, 0);
        assert_eq!(partition.modularity, 0.0);
    }

    #[test]
    fn test_modularity_of_single_community_is_zero() {
        // All degree mass in one community: in/2m = 1 and (tot/2m)^2 = 1.
        let graph = undirected_from(&[("A", "B", 1.0)]);
        let q = modularity_score(&graph, &[0, 0]);
        assert!(q.abs() < 1e-12);
    }
}
