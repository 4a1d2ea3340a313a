//! Network graph representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing
//! connections.  Given a `NodeId n`, its outgoing connections occupy:
//!
//! ```text
//! edge_to[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! Connections are sorted by source node (stable, so insertion order is kept
//! within a node).  Iteration over a node's neighbours is a contiguous scan,
//! which keeps the k-nearest search and Floyd–Warshall initialisation cheap.

use std::collections::HashSet;

use mec_core::{NodeId, Vec2};

use crate::{NetworkError, NetworkResult};

/// Weight of a connection added without an explicit latency.
pub const DEFAULT_CONNECTION_WEIGHT: f64 = 1.0;

/// Wireless access latency of a base station added without an explicit one.
pub const DEFAULT_ACCESS_LATENCY: f64 = 1.0;

// ── NodeKind ──────────────────────────────────────────────────────────────────

/// What a node is, beyond being a vertex of the graph.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// A router or aggregation node.  Users cannot attach here.
    Plain,
    /// A wireless access point with a fixed access latency.
    BaseStation { access_latency: f64 },
}

// ── Network ───────────────────────────────────────────────────────────────────

/// Directed weighted graph in CSR format.
///
/// All fields are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`NetworkBuilder`].
#[derive(Clone, Debug)]
pub struct Network {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Planar position of each node, if known.  Indexed by `NodeId`.
    pub node_pos: Vec<Option<Vec2>>,

    /// Kind of each node.  Indexed by `NodeId`.
    pub node_kind: Vec<NodeKind>,

    // ── CSR adjacency ─────────────────────────────────────────────────────
    /// CSR row pointer.  Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    /// Source node of each connection.
    pub edge_from: Vec<NodeId>,

    /// Destination node of each connection.
    pub edge_to: Vec<NodeId>,

    /// Non-negative weight (latency) of each connection.
    pub edge_weight: Vec<f64>,
}

impl Network {
    pub fn node_count(&self) -> usize {
        self.node_kind.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_kind.is_empty()
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.node_count()
    }

    /// Iterator over `(neighbour, weight)` for all outgoing connections.
    #[inline]
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(move |i| (self.edge_to[i], self.edge_weight[i]))
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    // ── Node attributes ───────────────────────────────────────────────────

    #[inline]
    pub fn position(&self, node: NodeId) -> Option<Vec2> {
        self.node_pos.get(node.index()).copied().flatten()
    }

    #[inline]
    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.node_kind.get(node.index()).copied()
    }

    #[inline]
    pub fn is_base_station(&self, node: NodeId) -> bool {
        matches!(self.kind(node), Some(NodeKind::BaseStation { .. }))
    }

    /// Wireless access latency of `node`; 0 for plain nodes.
    #[inline]
    pub fn access_latency(&self, node: NodeId) -> f64 {
        match self.kind(node) {
            Some(NodeKind::BaseStation { access_latency }) => access_latency,
            _ => 0.0,
        }
    }

    /// All base-station nodes in ascending `NodeId` order.
    pub fn base_stations(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node_kind
            .iter()
            .enumerate()
            .filter(|(_, k)| matches!(k, NodeKind::BaseStation { .. }))
            .map(|(i, _)| NodeId(i as u32))
    }
}

// ── NetworkBuilder ────────────────────────────────────────────────────────────

/// Construct a [`Network`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use mec_core::Vec2;
/// use mec_network::NetworkBuilder;
///
/// let mut b = NetworkBuilder::new();
/// let a = b.add_base_station(Vec2::new(0.0, 0.0), 1.0).unwrap();
/// let c = b.add_node(None);
/// b.add_link(a, c, 1.0).unwrap();
/// let net = b.build();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 2); // bidirectional
/// ```
#[derive(Default)]
pub struct NetworkBuilder {
    positions: Vec<Option<Vec2>>,
    kinds:     Vec<NodeKind>,
    raw_edges: Vec<RawConnection>,
    seen:      HashSet<(NodeId, NodeId)>,
}

struct RawConnection {
    from:   NodeId,
    to:     NodeId,
    weight: f64,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plain node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, pos: Option<Vec2>) -> NodeId {
        let id = NodeId(self.kinds.len() as u32);
        self.positions.push(pos);
        self.kinds.push(NodeKind::Plain);
        id
    }

    /// Add a base station at `pos` with the given wireless access latency.
    pub fn add_base_station(&mut self, pos: Vec2, access_latency: f64) -> NetworkResult<NodeId> {
        let id = NodeId(self.kinds.len() as u32);
        if !(access_latency.is_finite() && access_latency >= 0.0) {
            return Err(NetworkError::InvalidAccessLatency(id, access_latency));
        }
        self.positions.push(Some(pos));
        self.kinds.push(NodeKind::BaseStation { access_latency });
        Ok(id)
    }

    /// Add a base station with [`DEFAULT_ACCESS_LATENCY`].
    pub fn add_default_base_station(&mut self, pos: Vec2) -> NodeId {
        let id = NodeId(self.kinds.len() as u32);
        self.positions.push(Some(pos));
        self.kinds.push(NodeKind::BaseStation { access_latency: DEFAULT_ACCESS_LATENCY });
        id
    }

    /// Add a **directed** connection from `from` to `to`.
    ///
    /// Returns `Ok(false)` (and leaves the graph unchanged) if a connection
    /// `from -> to` already exists.
    pub fn add_connection(&mut self, from: NodeId, to: NodeId, weight: f64) -> NetworkResult<bool> {
        for node in [from, to] {
            if node.index() >= self.kinds.len() {
                return Err(NetworkError::NodeNotFound(node));
            }
        }
        if from == to {
            return Err(NetworkError::SelfLoop(from));
        }
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(NetworkError::InvalidWeight { from, to, weight });
        }
        if !self.seen.insert((from, to)) {
            log::warn!("ignoring duplicate connection {from} -> {to}");
            return Ok(false);
        }
        self.raw_edges.push(RawConnection { from, to, weight });
        Ok(true)
    }

    /// Convenience: add connections in **both directions** with the same
    /// weight.
    pub fn add_link(&mut self, a: NodeId, b: NodeId, weight: f64) -> NetworkResult<()> {
        self.add_connection(a, b, weight)?;
        self.add_connection(b, a, weight)?;
        Ok(())
    }

    /// [`add_link`](Self::add_link) with [`DEFAULT_CONNECTION_WEIGHT`].
    pub fn add_unit_link(&mut self, a: NodeId, b: NodeId) -> NetworkResult<()> {
        self.add_link(a, b, DEFAULT_CONNECTION_WEIGHT)
    }

    pub fn node_count(&self) -> usize { self.kinds.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`Network`].
    pub fn build(self) -> Network {
        let node_count = self.kinds.len();
        let edge_count = self.raw_edges.len();

        // Stable sort keeps per-node insertion order, which the k-nearest
        // search relies on for deterministic tie-breaking.
        let mut raw = self.raw_edges;
        raw.sort_by_key(|e| e.from.0);

        let edge_from:   Vec<NodeId> = raw.iter().map(|e| e.from).collect();
        let edge_to:     Vec<NodeId> = raw.iter().map(|e| e.to).collect();
        let edge_weight: Vec<f64>    = raw.iter().map(|e| e.weight).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        Network {
            node_pos: self.positions,
            node_kind: self.kinds,
            node_out_start,
            edge_from,
            edge_to,
            edge_weight,
        }
    }
}
