//! RAN attachment: nearest base station by Euclidean distance.
//!
//! # Pluggability
//!
//! `mec-sim` reattaches users through the [`RanModel`] trait.  Three
//! implementations are provided:
//!
//! | Type                   | Query cost              | Use                       |
//! |------------------------|-------------------------|---------------------------|
//! | [`GridRanModel`]       | rings of cells          | default                   |
//! | [`BruteForceRanModel`] | O(N)                    | correctness reference     |
//! | [`RTreeRanModel`]      | O(log N) via `rstar`    | very large station sets   |
//!
//! All of them honour a `blacklist` of stations that must not be returned
//! and agree on the distance of the station they return.
//!
//! # Grid search
//!
//! The grid spans the base-station bounding box with `resolution` cells per
//! axis, `tile = max(width, height) / (resolution - 1)`.  A query starts at
//! its own cell and scans square rings of growing radius.  As soon as a
//! candidate exists, the search box becomes the smallest cell box that
//! contains the disc of radius `best distance` around the query point; only
//! cells of that box not yet scanned are visited.  The loop stops once the
//! box no longer changes, so no station closer than the result can hide
//! behind a ring boundary.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use mec_core::{Aabb2, NodeId, Vec2};

use crate::graph::Network;
use crate::{NetworkError, NetworkResult};

/// Slack in grid units when converting a distance into a cell box.
const GRID_EPS: f64 = 1e-9;

// ── RanModel trait ────────────────────────────────────────────────────────────

/// Assigns a position to its nearest base station.
pub trait RanModel: Send + Sync {
    /// Nearest base station to `pos` that is not in `blacklist`, or `None`
    /// if every station is blacklisted.
    fn nearest_base_station(&self, pos: Vec2, blacklist: &[NodeId]) -> Option<NodeId>;
}

/// Positioned base stations of `network`, in `NodeId` order.
fn positioned_stations(network: &Network) -> Vec<(NodeId, Vec2)> {
    network
        .base_stations()
        .filter_map(|bs| network.position(bs).map(|p| (bs, p)))
        .collect()
}

// ── Brute force ───────────────────────────────────────────────────────────────

/// Linear scan.  Ties resolve to the first station in slice order.
pub fn brute_force_nearest(stations: &[(NodeId, Vec2)], pos: Vec2, blacklist: &[NodeId]) -> Option<NodeId> {
    let mut best: Option<(NodeId, f64)> = None;
    for &(node, p) in stations {
        if blacklist.contains(&node) {
            continue;
        }
        let d2 = pos.distance_sq(p);
        if best.is_none_or(|(_, b)| d2 < b) {
            best = Some((node, d2));
        }
    }
    best.map(|(node, _)| node)
}

/// [`RanModel`] backed by [`brute_force_nearest`].
pub struct BruteForceRanModel {
    stations: Vec<(NodeId, Vec2)>,
}

impl BruteForceRanModel {
    pub fn new(network: &Network) -> NetworkResult<Self> {
        Self::from_stations(positioned_stations(network))
    }

    pub fn from_stations(stations: Vec<(NodeId, Vec2)>) -> NetworkResult<Self> {
        if stations.is_empty() {
            return Err(NetworkError::NoBaseStations);
        }
        Ok(Self { stations })
    }
}

impl RanModel for BruteForceRanModel {
    fn nearest_base_station(&self, pos: Vec2, blacklist: &[NodeId]) -> Option<NodeId> {
        brute_force_nearest(&self.stations, pos, blacklist)
    }
}

// ── Grid ──────────────────────────────────────────────────────────────────────

/// Half-open box of cell coordinates `[x0, x1) × [y0, y1)`.  May extend past
/// the grid; scans clamp it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct CellBox {
    x0: i64,
    x1: i64,
    y0: i64,
    y1: i64,
}

impl CellBox {
    fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    fn expanded(&self) -> CellBox {
        CellBox { x0: self.x0 - 1, x1: self.x1 + 1, y0: self.y0 - 1, y1: self.y1 + 1 }
    }

    fn covers_grid(&self, res: i64) -> bool {
        self.x0 <= 0 && self.y0 <= 0 && self.x1 >= res && self.y1 >= res
    }
}

/// Uniform-grid nearest base station index.
pub struct GridRanModel {
    stations:   Vec<(NodeId, Vec2)>,
    origin:     Vec2,
    tile_size:  f64,
    resolution: usize,
    /// Station indices per cell, row-major `cells[y * resolution + x]`.
    cells:      Vec<Vec<usize>>,
}

impl GridRanModel {
    pub const DEFAULT_RESOLUTION: usize = 40;

    /// Index every positioned base station of `network`.
    pub fn new(network: &Network, resolution: usize) -> NetworkResult<Self> {
        Self::from_stations(positioned_stations(network), resolution)
    }

    pub fn from_stations(stations: Vec<(NodeId, Vec2)>, resolution: usize) -> NetworkResult<Self> {
        if resolution < 2 {
            return Err(NetworkError::InvalidGridResolution(resolution));
        }
        let bounds = Aabb2::from_points(stations.iter().map(|&(_, p)| p))
            .ok_or(NetworkError::NoBaseStations)?;

        let max_dim = bounds.width().max(bounds.height());
        let tile_size = if max_dim > 0.0 { max_dim / (resolution - 1) as f64 } else { 1.0 };

        let mut model = Self {
            stations,
            origin: bounds.min,
            tile_size,
            resolution,
            cells: vec![Vec::new(); resolution * resolution],
        };
        for i in 0..model.stations.len() {
            let (gx, gy) = model.to_grid(model.stations[i].1);
            let (cx, cy) = model.clamp_cell(gx.floor() as i64, gy.floor() as i64);
            model.cells[cy as usize * resolution + cx as usize].push(i);
        }
        log::debug!(
            "RAN grid: {} stations, {res}x{res} cells, tile {:.4}",
            model.stations.len(),
            model.tile_size,
            res = resolution,
        );
        Ok(model)
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    #[inline]
    fn to_grid(&self, p: Vec2) -> (f64, f64) {
        ((p.x - self.origin.x) / self.tile_size, (p.y - self.origin.y) / self.tile_size)
    }

    #[inline]
    fn clamp_cell(&self, x: i64, y: i64) -> (i64, i64) {
        let hi = self.resolution as i64 - 1;
        (x.clamp(0, hi), y.clamp(0, hi))
    }

    /// Scan every cell of `current` that is not inside `scanned`.
    fn scan(
        &self,
        current:   CellBox,
        scanned:   Option<CellBox>,
        pos:       Vec2,
        blacklist: &[NodeId],
        best:      &mut Option<(usize, f64)>,
    ) {
        let res = self.resolution as i64;
        for y in current.y0.max(0)..current.y1.min(res) {
            for x in current.x0.max(0)..current.x1.min(res) {
                if scanned.is_some_and(|s| s.contains(x, y)) {
                    continue;
                }
                for &i in &self.cells[(y * res + x) as usize] {
                    let (node, p) = self.stations[i];
                    if blacklist.contains(&node) {
                        continue;
                    }
                    let d2 = pos.distance_sq(p);
                    if best.is_none_or(|(_, b)| d2 < b) {
                        *best = Some((i, d2));
                    }
                }
            }
        }
    }
}

impl RanModel for GridRanModel {
    fn nearest_base_station(&self, pos: Vec2, blacklist: &[NodeId]) -> Option<NodeId> {
        let res = self.resolution as i64;
        let (gx, gy) = self.to_grid(pos);
        let (cx, cy) = self.clamp_cell(gx.floor() as i64, gy.floor() as i64);

        let mut current = CellBox { x0: cx, x1: cx + 1, y0: cy, y1: cy + 1 };
        let mut scanned: Option<CellBox> = None;
        let mut best: Option<(usize, f64)> = None;

        loop {
            self.scan(current, scanned, pos, blacklist, &mut best);
            scanned = Some(current);

            let next = match best {
                Some((_, d2)) => {
                    let d = d2.sqrt() / self.tile_size + GRID_EPS;
                    CellBox {
                        x0: (gx - d).floor() as i64,
                        x1: (gx + d).floor() as i64 + 1,
                        y0: (gy - d).floor() as i64,
                        y1: (gy + d).floor() as i64 + 1,
                    }
                }
                None if current.covers_grid(res) => return None,
                None => current.expanded(),
            };
            if next == current {
                break;
            }
            current = next;
        }

        best.map(|(i, _)| self.stations[i].0)
    }
}

// ── R-tree ────────────────────────────────────────────────────────────────────

/// Entry stored in the R-tree: a station position and its `NodeId`.
#[derive(Clone)]
struct StationEntry {
    point: [f64; 2],
    node:  NodeId,
}

impl RTreeObject for StationEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StationEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// R-tree nearest base station index.
pub struct RTreeRanModel {
    tree: RTree<StationEntry>,
}

impl RTreeRanModel {
    pub fn new(network: &Network) -> NetworkResult<Self> {
        Self::from_stations(positioned_stations(network))
    }

    pub fn from_stations(stations: Vec<(NodeId, Vec2)>) -> NetworkResult<Self> {
        if stations.is_empty() {
            return Err(NetworkError::NoBaseStations);
        }
        let entries = stations
            .into_iter()
            .map(|(node, p)| StationEntry { point: [p.x, p.y], node })
            .collect();
        Ok(Self { tree: RTree::bulk_load(entries) })
    }
}

impl RanModel for RTreeRanModel {
    fn nearest_base_station(&self, pos: Vec2, blacklist: &[NodeId]) -> Option<NodeId> {
        self.tree
            .nearest_neighbor_iter(&[pos.x, pos.y])
            .find(|e| !blacklist.contains(&e.node))
            .map(|e| e.node)
    }
}
