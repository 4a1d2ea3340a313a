//! All-pairs distance oracle and bounded k-nearest search.
//!
//! # Distances
//!
//! `DistanceOracle::new` runs Floyd–Warshall once over the weighted
//! adjacency of the network it takes ownership of.  The result is a dense
//! row-major `n × n` matrix of `f64`, with [`UNREACHABLE`] (`+∞`) for pairs
//! that have no directed path.  O(V³) time and O(V²) memory; networks in
//! this simulator are a few hundred nodes.
//!
//! # k-nearest
//!
//! [`DistanceOracle::k_nearest`] is a Dijkstra-style priority expansion from
//! `src` that closes nodes in non-decreasing distance order and stops as soon
//! as `k` nodes passing the filter have been closed.  The expansion cost per
//! connection is set by [`HopMetric`].  Equal-distance nodes are closed in
//! the order they were discovered.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use mec_core::NodeId;

use crate::graph::Network;

/// Distance reported for pairs with no directed path.
pub const UNREACHABLE: f64 = f64::INFINITY;

/// Per-connection expansion cost used by the k-nearest search.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HopMetric {
    /// Every connection costs 1.
    #[default]
    Hops,
    /// Every connection costs its weight.
    Weight,
}

// ── Heap entry ────────────────────────────────────────────────────────────────

/// Frontier entry ordered by `(dist, seq)`.  `seq` is the discovery counter,
/// so equal distances pop in discovery order.
#[derive(Copy, Clone, Debug)]
struct Frontier {
    dist: f64,
    seq:  u64,
    node: NodeId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist.total_cmp(&other.dist).then(self.seq.cmp(&other.seq))
    }
}

// ── DistanceOracle ────────────────────────────────────────────────────────────

/// Immutable distance oracle over an owned [`Network`].
///
/// There is no incremental update: a changed topology needs a new oracle.
#[derive(Clone, Debug)]
pub struct DistanceOracle {
    network: Network,
    metric:  HopMetric,
    /// Row-major `n × n` shortest-path matrix.
    dist:    Vec<f64>,
}

impl DistanceOracle {
    /// Build the oracle with the default [`HopMetric::Hops`] k-nearest metric.
    pub fn new(network: Network) -> Self {
        Self::with_metric(network, HopMetric::default())
    }

    pub fn with_metric(network: Network, metric: HopMetric) -> Self {
        let dist = floyd_warshall(&network);
        Self { network, metric, dist }
    }

    /// The graph this oracle was built over.
    #[inline]
    pub fn network(&self) -> &Network {
        &self.network
    }

    #[inline]
    pub fn metric(&self) -> HopMetric {
        self.metric
    }

    /// Shortest directed path cost from `a` to `b`.
    ///
    /// Returns [`UNREACHABLE`] when no path exists or either node is unknown.
    #[inline]
    pub fn distance(&self, a: NodeId, b: NodeId) -> f64 {
        let n = self.network.node_count();
        if a.index() >= n || b.index() >= n {
            return UNREACHABLE;
        }
        self.dist[a.index() * n + b.index()]
    }

    #[inline]
    pub fn is_reachable(&self, a: NodeId, b: NodeId) -> bool {
        self.distance(a, b).is_finite()
    }

    /// Up to `k` distinct nodes accepted by `filter`, nearest first, with
    /// their search distance.
    ///
    /// `include_src` controls whether `src` itself may count toward `k`.
    /// Returns an empty list for `k == 0` or an unknown `src`.
    pub fn k_nearest<F>(&self, src: NodeId, k: usize, include_src: bool, mut filter: F) -> Vec<(NodeId, f64)>
    where
        F: FnMut(NodeId) -> bool,
    {
        let n = self.network.node_count();
        if k == 0 || src.index() >= n {
            return Vec::new();
        }

        let mut best   = vec![UNREACHABLE; n];
        let mut closed = vec![false; n];
        let mut seq: u64 = 0;
        let mut heap: BinaryHeap<Reverse<Frontier>> = BinaryHeap::new();
        let mut found = Vec::with_capacity(k);

        best[src.index()] = 0.0;
        heap.push(Reverse(Frontier { dist: 0.0, seq, node: src }));

        while let Some(Reverse(Frontier { dist, node, .. })) = heap.pop() {
            if closed[node.index()] || dist > best[node.index()] {
                continue;
            }
            closed[node.index()] = true;

            if (include_src || node != src) && filter(node) {
                found.push((node, dist));
                if found.len() == k {
                    break;
                }
            }

            for (next, weight) in self.network.neighbors(node) {
                let step = match self.metric {
                    HopMetric::Hops   => 1.0,
                    HopMetric::Weight => weight,
                };
                let candidate = dist + step;
                if candidate < best[next.index()] {
                    best[next.index()] = candidate;
                    seq += 1;
                    heap.push(Reverse(Frontier { dist: candidate, seq, node: next }));
                }
            }
        }

        found
    }
}

// ── Floyd–Warshall ────────────────────────────────────────────────────────────

fn floyd_warshall(network: &Network) -> Vec<f64> {
    let n = network.node_count();
    let mut d = vec![UNREACHABLE; n * n];

    for i in 0..n {
        d[i * n + i] = 0.0;
    }
    for i in 0..network.edge_count() {
        let from = network.edge_from[i].index();
        let to   = network.edge_to[i].index();
        let w    = network.edge_weight[i];
        if w < d[from * n + to] {
            d[from * n + to] = w;
        }
    }

    for k in 0..n {
        for i in 0..n {
            let dik = d[i * n + k];
            if dik == UNREACHABLE {
                continue;
            }
            for j in 0..n {
                let through = dik + d[k * n + j];
                if through < d[i * n + j] {
                    d[i * n + j] = through;
                }
            }
        }
    }
    d
}
