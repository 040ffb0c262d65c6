//! Shortest paths, path/cycle enumeration, bridges, and components.
//!
//! All traversals are iterative with explicit stacks; the enumeration
//! routines take hard caps and report whether they were truncated.

use crate::graph::{TxGraph, UndirectedGraph};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap entry for Dijkstra; ordered as a min-heap on distance.
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

/// Single-source weighted distances on the directed graph.
///
/// With `reverse` set, edges are followed backwards, yielding distances
/// *to* the source from every node.
#[must_use]
pub fn dijkstra_directed(graph: &TxGraph, source: usize, reverse: bool) -> Vec<f64> {
    let n = graph.node_count();
    let mut dist = vec![f64::INFINITY; n];
    dist[source] = 0.0;
    let mut heap = BinaryHeap::new();
    heap.push(HeapEntry {
        dist: 0.0,
        node: source,
    });

    while let Some(HeapEntry { dist: d, node: u }) = heap.pop() {
        if d > dist[u] {
            continue;
        }
        let neighbors: &[usize] = if reverse {
            graph.predecessors(u)
        } else {
            graph.successors(u)
        };
        for &v in neighbors {
            let edge = if reverse {
                graph.edge(v, u)
            } else {
                graph.edge(u, v)
            };
            let Some(edge) = edge else { continue };
            let nd = d + edge.weight;
            if nd < dist[v] {
                dist[v] = nd;
                heap.push(HeapEntry { dist: nd, node: v });
            }
        }
    }
    dist
}

/// All-pairs weighted distance matrix on the directed graph.
#[must_use]
pub fn all_pairs_distances(graph: &TxGraph) -> Vec<Vec<f64>> {
    (0..graph.node_count())
        .map(|s| dijkstra_directed(graph, s, false))
        .collect()
}

/// Unweighted hop distances from a source on the undirected projection.
#[must_use]
pub fn bfs_hops(graph: &UndirectedGraph, source: usize) -> Vec<usize> {
    let n = graph.node_count();
    let mut dist = vec![usize::MAX; n];
    dist[source] = 0;
    let mut queue = std::collections::VecDeque::new();
    queue.push_back(source);
    while let Some(u) = queue.pop_front() {
        for &(v, _) in graph.neighbors(u) {
            if dist[v] == usize::MAX {
                dist[v] = dist[u] + 1;
                queue.push_back(v);
            }
        }
    }
    dist
}

/// Result of a bounded enumeration.
#[derive(Debug, Clone)]
pub struct Enumeration {
    /// Node-index sequences found before any cap was hit.
    pub items: Vec<Vec<usize>>,
    /// True when the enumeration stopped at its cap.
    pub truncated: bool,
}

/// Enumerate simple paths between two nodes, iteratively.
///
/// Paths have at least `min_nodes` nodes and at most `max_edges` edges, with
/// no repeated node. Stops after `max_paths` qualifying paths.
#[must_use]
pub fn simple_paths(
    graph: &TxGraph,
    source: usize,
    target: usize,
    min_nodes: usize,
    max_edges: usize,
    max_paths: usize,
) -> Enumeration {
    let mut items = Vec::new();
    let mut truncated = false;
    if source == target || graph.is_empty() {
        return Enumeration { items, truncated };
    }

    let mut on_path = vec![false; graph.node_count()];
    let mut path = vec![source];
    on_path[source] = true;
    // Each frame is (node, index of the next successor to try).
    let mut stack = vec![(source, 0usize)];

    while let Some(&mut (node, ref mut next)) = stack.last_mut() {
        let succ = graph.successors(node);
        if *next >= succ.len() {
            stack.pop();
            on_path[node] = false;
            path.pop();
            continue;
        }
        let child = succ[*next];
        *next += 1;

        // A path of k nodes has k - 1 edges; appending `child` adds one.
        if child == target {
            if path.len() + 1 >= min_nodes && path.len() <= max_edges {
                let mut found = path.clone();
                found.push(target);
                items.push(found);
                if items.len() >= max_paths {
                    truncated = true;
                    break;
                }
            }
            continue;
        }
        if on_path[child] || path.len() >= max_edges {
            continue;
        }
        on_path[child] = true;
        path.push(child);
        stack.push((child, 0));
    }

    Enumeration { items, truncated }
}

/// Enumerate simple directed cycles of at least `min_len` nodes.
///
/// Each cycle is discovered exactly once, rooted at its minimum node index,
/// and reported in traversal order starting from that root. Enumeration
/// stops after `max_cycles` cycles.
#[must_use]
pub fn simple_cycles(graph: &TxGraph, min_len: usize, max_cycles: usize) -> Enumeration {
    let n = graph.node_count();
    let mut items = Vec::new();
    let mut truncated = false;
    let mut on_path = vec![false; n];

    'roots: for root in 0..n {
        let mut path = vec![root];
        on_path[root] = true;
        let mut stack = vec![(root, 0usize)];

        while let Some(&mut (node, ref mut next)) = stack.last_mut() {
            let succ = graph.successors(node);
            if *next >= succ.len() {
                stack.pop();
                on_path[node] = false;
                path.pop();
                continue;
            }
            let child = succ[*next];
            *next += 1;

            if child == root {
                if path.len() >= min_len {
                    items.push(path.clone());
                    if items.len() >= max_cycles {
                        truncated = true;
                        for &u in &path {
                            on_path[u] = false;
                        }
                        break 'roots;
                    }
                }
                continue;
            }
            // Restricting to indices above the root makes the minimum node
            // of every cycle its unique enumeration root.
            if child < root || on_path[child] {
                continue;
            }
            on_path[child] = true;
            path.push(child);
            stack.push((child, 0));
        }
    }

    Enumeration { items, truncated }
}

/// Bridges of the undirected projection, via iterative Tarjan lowlink.
///
/// The projection has no parallel edges, so the DFS parent can be skipped
/// outright when scanning neighbors.
#[must_use]
pub fn bridges(graph: &UndirectedGraph) -> Vec<(usize, usize)> {
    let n = graph.node_count();
    const UNSEEN: usize = usize::MAX;
    let mut disc = vec![UNSEEN; n];
    let mut low = vec![0usize; n];
    let mut timer = 0usize;
    let mut found = Vec::new();

    for start in 0..n {
        if disc[start] != UNSEEN {
            continue;
        }
        // Frames of (node, parent, next neighbor index).
        let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(start, None, 0)];
        disc[start] = timer;
        low[start] = timer;
        timer += 1;

        while let Some(&mut (u, parent, ref mut next)) = stack.last_mut() {
            let neighbors = graph.neighbors(u);
            if *next >= neighbors.len() {
                stack.pop();
                if let Some(&(p, _, _)) = stack.last() {
                    low[p] = low[p].min(low[u]);
                    if low[u] > disc[p] {
                        found.push((p, u));
                    }
                }
                continue;
            }
            let v = neighbors[*next].0;
            *next += 1;

            if Some(v) == parent {
                continue;
            }
            if disc[v] == UNSEEN {
                disc[v] = timer;
                low[v] = timer;
                timer += 1;
                stack.push((v, Some(u), 0));
            } else {
                low[u] = low[u].min(disc[v]);
            }
        }
    }
    found
}

/// Connected components of the undirected projection.
///
/// Components appear in order of their smallest node index; members are
/// sorted within each component.
#[must_use]
pub fn connected_components(graph: &UndirectedGraph) -> Vec<Vec<usize>> {
    let n = graph.node_count();
    let mut seen = vec![false; n];
    let mut components = Vec::new();

    for start in 0..n {
        if seen[start] {
            continue;
        }
        let mut component = Vec::new();
        let mut stack = vec![start];
        seen[start] = true;
        while let Some(u) = stack.pop() {
            component.push(u);
            for &(v, _) in graph.neighbors(u) {
                if !seen[v] {
                    seen[v] = true;
                    stack.push(v);
                }
            }
        }
        component.sort_unstable();
        components.push(component);
    }
    components
}

/// Unweighted diameter of a component (max BFS eccentricity).
///
/// Returns `None` for components with fewer than two nodes.
#[must_use]
pub fn component_diameter(graph: &UndirectedGraph, component: &[usize]) -> Option<usize> {
    if component.len() < 2 {
        return None;
    }
    let mut diameter = 0;
    for &u in component {
        let hops = bfs_hops(graph, u);
        for &v in component {
            if hops[v] != usize::MAX {
                diameter = diameter.max(hops[v]);
            }
        }
    }
    Some(diameter)
}

/// Average shortest-path length in hops over ordered pairs of a
/// component, matching the hop convention of [`component_diameter`].
///
/// Returns `None` for components with fewer than two nodes.
#[must_use]
pub fn component_average_path_length(
    graph: &UndirectedGraph,
    component: &[usize],
) -> Option<f64> {
    let size = component.len();
    if size < 2 {
        return None;
    }
    let mut total = 0.0;
    for &u in component {
        let hops = bfs_hops(graph, u);
        for &v in component {
            if v != u && hops[v] != usize::MAX {
                total += hops[v] as f64;
            }
        }
    }
    Some(total / (size * (size - 1)) as f64)
}
