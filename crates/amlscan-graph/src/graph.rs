//! Weighted directed transaction graph with aggregated parallel edges.
//!
//! Nodes are canonical account identifiers interned in first-seen order, so
//! node indices (and everything derived from them) are deterministic for a
//! given input ordering. Parallel transfers between the same ordered account
//! pair collapse into one edge carrying the full amount/timestamp history.

use amlscan_core::types::TransactionTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Aggregated attributes of one directed edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeData {
    /// Sum of all constituent amounts.
    pub weight: f64,
    /// Number of constituent transactions.
    pub count: usize,
    /// Constituent amounts in insertion order.
    pub amounts: Vec<f64>,
    /// Constituent timestamps, parallel to `amounts`.
    pub timestamps: Vec<DateTime<Utc>>,
}

impl EdgeData {
    fn new(amount: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            weight: amount,
            count: 1,
            amounts: vec![amount],
            timestamps: vec![timestamp],
        }
    }

    fn push(&mut self, amount: f64, timestamp: DateTime<Utc>) {
        self.weight += amount;
        self.count += 1;
        self.amounts.push(amount);
        self.timestamps.push(timestamp);
    }

    /// Timestamp of the most recent constituent transaction.
    #[must_use]
    pub fn last_timestamp(&self) -> DateTime<Utc> {
        // Edges always have at least one constituent.
        *self
            .timestamps
            .iter()
            .max()
            .unwrap_or(&self.timestamps[0])
    }
}

/// Directed account graph built from a validated transaction table.
#[derive(Debug, Clone, Default)]
pub struct TxGraph {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    edges: BTreeMap<(usize, usize), EdgeData>,
    succ: Vec<Vec<usize>>,
    pred: Vec<Vec<usize>>,
}

impl TxGraph {
    /// Build the aggregated graph. An empty table yields an empty graph.
    #[must_use]
    pub fn build(table: &TransactionTable) -> Self {
        let mut graph = Self::default();

        for enriched in table.records() {
            let record = &enriched.record;
            let u = graph.intern(&record.source_account);
            let v = graph.intern(&record.target_account);

            match graph.edges.get_mut(&(u, v)) {
                Some(edge) => edge.push(record.amount, record.timestamp),
                None => {
                    graph
                        .edges
                        .insert((u, v), EdgeData::new(record.amount, record.timestamp));
                    graph.succ[u].push(v);
                    graph.pred[v].push(u);
                }
            }
        }

        for list in graph.succ.iter_mut().chain(graph.pred.iter_mut()) {
            list.sort_unstable();
        }
        graph
    }

    fn intern(&mut self, account: &str) -> usize {
        if let Some(&idx) = self.index.get(account) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(account.to_string());
        self.index.insert(account.to_string(), idx);
        self.succ.push(Vec::new());
        self.pred.push(Vec::new());
        idx
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of aggregated directed edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// True when the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Account identifier for a node index.
    #[must_use]
    pub fn node(&self, idx: usize) -> &str {
        &self.nodes[idx]
    }

    /// Node index for an account identifier, if present.
    #[must_use]
    pub fn node_index(&self, account: &str) -> Option<usize> {
        self.index.get(account).copied()
    }

    /// Edge attributes for an ordered node pair, if the edge exists.
    #[must_use]
    pub fn edge(&self, u: usize, v: usize) -> Option<&EdgeData> {
        self.edges.get(&(u, v))
    }

    /// Iterate all edges as `((u, v), data)` in key order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, &EdgeData)> {
        self.edges.iter().map(|(&(u, v), data)| (u, v, data))
    }

    /// Successor indices of a node, sorted.
    #[must_use]
    pub fn successors(&self, u: usize) -> &[usize] {
        &self.succ[u]
    }

    /// Predecessor indices of a node, sorted.
    #[must_use]
    pub fn predecessors(&self, u: usize) -> &[usize] {
        &self.pred[u]
    }

    /// Out-degree over aggregated edges.
    #[must_use]
    pub fn out_degree(&self, u: usize) -> usize {
        self.succ[u].len()
    }

    /// In-degree over aggregated edges.
    #[must_use]
    pub fn in_degree(&self, u: usize) -> usize {
        self.pred[u].len()
    }

    /// Total degree (in + out) over aggregated edges.
    #[must_use]
    pub fn degree(&self, u: usize) -> usize {
        self.in_degree(u) + self.out_degree(u)
    }

    /// Sum of inbound edge weights.
    #[must_use]
    pub fn total_inflow(&self, u: usize) -> f64 {
        self.pred[u]
            .iter()
            .filter_map(|&p| self.edge(p, u))
            .map(|e| e.weight)
            .sum()
    }

    /// Sum of outbound edge weights.
    #[must_use]
    pub fn total_outflow(&self, u: usize) -> f64 {
        self.succ[u]
            .iter()
            .filter_map(|&s| self.edge(u, s))
            .map(|e| e.weight)
            .sum()
    }

    /// Directed edge density: m / (n * (n - 1)).
    #[must_use]
    pub fn density(&self) -> f64 {
        let n = self.node_count();
        if n < 2 {
            return 0.0;
        }
        self.edge_count() as f64 / (n * (n - 1)) as f64
    }

    /// Undirected projection with per-pair combined weights.
    ///
    /// When both directions exist between a pair, the projected weight is
    /// the sum of both directed weights.
    #[must_use]
    pub fn undirected(&self) -> UndirectedGraph {
        let n = self.node_count();
        let mut pair_weights: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for (u, v, data) in self.edges() {
            let key = if u <= v { (u, v) } else { (v, u) };
            *pair_weights.entry(key).or_insert(0.0) += data.weight;
        }

        let mut adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut total_weight = 0.0;
        for (&(u, v), &w) in &pair_weights {
            if u == v {
                continue; // self-transfers carry no structural information
            }
            adj[u].push((v, w));
            adj[v].push((u, w));
            total_weight += w;
        }
        for list in &mut adj {
            list.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        }
        UndirectedGraph { adj, total_weight }
    }
}

/// Undirected projection of a [`TxGraph`].
#[derive(Debug, Clone)]
pub struct UndirectedGraph {
    adj: Vec<Vec<(usize, f64)>>,
    total_weight: f64,
}

impl UndirectedGraph {
    /// Number of nodes (shared with the directed graph).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.adj.len()
    }

    /// Neighbors of a node with combined pair weights, sorted by index.
    #[must_use]
    pub fn neighbors(&self, u: usize) -> &[(usize, f64)] {
        &self.adj[u]
    }

    /// Undirected degree of a node.
    #[must_use]
    pub fn degree(&self, u: usize) -> usize {
        self.adj[u].len()
    }

    /// True if an undirected edge exists between `u` and `v`.
    #[must_use]
    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.adj[u].binary_search_by(|probe| probe.0.cmp(&v)).is_ok()
    }

    /// Sum of all pair weights (each undirected edge counted once).
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Sum of incident pair weights at a node.
    #[must_use]
    pub fn weighted_degree(&self, u: usize) -> f64 {
        self.adj[u].iter().map(|&(_, w)| w).sum()
    }
}
