//! `CloudNetwork`: the graph, its clouds, and the distance oracle.
//!
//! The oracle is built eagerly in [`CloudNetwork::new`]; the topology and
//! the set of clouds are fixed for the lifetime of the value.  Only the
//! hosted sets of the clouds change, and only through
//! [`place_service`](CloudNetwork::place_service) and
//! [`unplace_service`](CloudNetwork::unplace_service).

use mec_core::{Aabb2, CloudId, CoreError, NodeId};
use mec_network::{DistanceOracle, HopMetric, Network, NetworkError};

use crate::{Cloud, InvariantViolation, Population, ResourceError, ResourceResult, Service};

/// Declaration of one cloud for [`CloudNetwork::new`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CloudSpec {
    pub node:     NodeId,
    pub capacity: f64,
    pub central:  bool,
}

impl CloudSpec {
    /// A capacity-limited cloud on `node`.
    pub fn cloudlet(node: NodeId, capacity: f64) -> Self {
        Self { node, capacity, central: false }
    }

    /// The unbounded central cloud on `node`.
    pub fn central(node: NodeId) -> Self {
        Self { node, capacity: f64::INFINITY, central: true }
    }
}

/// Graph + clouds + all-pairs distances.
#[derive(Clone, Debug)]
pub struct CloudNetwork {
    oracle:        DistanceOracle,
    /// Indexed by `CloudId`.
    clouds:        Vec<Cloud>,
    /// Indexed by `NodeId`.
    node_cloud:    Vec<Option<CloudId>>,
    base_stations: Vec<NodeId>,
    central:       Option<CloudId>,
}

impl CloudNetwork {
    /// Build with the default [`HopMetric`] for nearest-cloud searches.
    pub fn new(network: Network, specs: &[CloudSpec]) -> ResourceResult<Self> {
        Self::with_metric(network, specs, HopMetric::default())
    }

    /// Validate `specs` against `network` and run the all-pairs distance
    /// computation.  Cloud ids are assigned in `specs` order.
    pub fn with_metric(network: Network, specs: &[CloudSpec], metric: HopMetric) -> ResourceResult<Self> {
        let mut node_cloud = vec![None; network.node_count()];
        let mut clouds = Vec::with_capacity(specs.len());
        let mut central = None;

        for spec in specs {
            if !network.contains(spec.node) {
                return Err(NetworkError::NodeNotFound(spec.node).into());
            }
            if spec.capacity.is_nan() || spec.capacity < 0.0 {
                return Err(ResourceError::InvalidCapacity { node: spec.node, capacity: spec.capacity });
            }
            let slot = &mut node_cloud[spec.node.index()];
            if slot.is_some() {
                return Err(ResourceError::DuplicateCloud(spec.node));
            }
            let id = CloudId(clouds.len() as u32);
            *slot = Some(id);
            if spec.central {
                if central.is_some() {
                    return Err(ResourceError::MultipleCentralClouds);
                }
                central = Some(id);
            }
            clouds.push(Cloud::new(id, spec.node, spec.capacity));
        }

        let base_stations = network.base_stations().collect();
        let oracle = DistanceOracle::with_metric(network, metric);
        log::debug!(
            "cloud network: {} nodes, {} clouds, central={:?}",
            oracle.network().node_count(),
            clouds.len(),
            central,
        );

        Ok(Self { oracle, clouds, node_cloud, base_stations, central })
    }

    // ── Graph queries ─────────────────────────────────────────────────────

    #[inline] pub fn network(&self) -> &Network { self.oracle.network() }
    #[inline] pub fn oracle(&self) -> &DistanceOracle { &self.oracle }

    #[inline]
    pub fn distance(&self, from: NodeId, to: NodeId) -> f64 {
        self.oracle.distance(from, to)
    }

    /// Latency seen by a user attached at `user_node` for a service hosted on
    /// `cloud_node`: graph distance plus the access latency of `user_node`.
    #[inline]
    pub fn latency(&self, user_node: NodeId, cloud_node: NodeId) -> f64 {
        self.oracle.distance(user_node, cloud_node) + self.access_latency(user_node)
    }

    #[inline]
    pub fn access_latency(&self, node: NodeId) -> f64 {
        self.network().access_latency(node)
    }

    pub fn base_stations(&self) -> &[NodeId] {
        &self.base_stations
    }

    /// Bounding box of every positioned node.
    pub fn bounding_box(&self) -> Option<Aabb2> {
        let net = self.network();
        Aabb2::from_points((0..net.node_count() as u32).filter_map(|i| net.position(NodeId(i))))
    }

    // ── Clouds ────────────────────────────────────────────────────────────

    pub fn clouds(&self) -> &[Cloud] {
        &self.clouds
    }

    pub fn cloud_count(&self) -> usize {
        self.clouds.len()
    }

    pub fn cloud(&self, id: CloudId) -> ResourceResult<&Cloud> {
        self.clouds.get(id.index()).ok_or(ResourceError::Core(CoreError::CloudNotFound(id)))
    }

    fn cloud_mut(&mut self, id: CloudId) -> ResourceResult<&mut Cloud> {
        self.clouds.get_mut(id.index()).ok_or(ResourceError::Core(CoreError::CloudNotFound(id)))
    }

    /// Cloud hosted on `node`, if any.
    pub fn cloud_at(&self, node: NodeId) -> Option<CloudId> {
        self.node_cloud.get(node.index()).copied().flatten()
    }

    pub fn central_cloud(&self) -> Option<CloudId> {
        self.central
    }

    /// Central cloud, or [`ResourceError::NoCentralCloud`].
    pub fn central(&self) -> ResourceResult<CloudId> {
        self.central.ok_or(ResourceError::NoCentralCloud)
    }

    #[inline]
    pub fn is_central(&self, id: CloudId) -> bool {
        self.central == Some(id)
    }

    /// Up to `k` clouds accepted by `filter`, nearest to `src` first, using
    /// the oracle's k-nearest search restricted to cloud nodes.
    pub fn nearest_clouds<F>(&self, src: NodeId, k: usize, include_src: bool, mut filter: F) -> Vec<(CloudId, f64)>
    where
        F: FnMut(&Cloud) -> bool,
    {
        let clouds = &self.clouds;
        let node_cloud = &self.node_cloud;
        self.oracle
            .k_nearest(src, k, include_src, |node| match node_cloud[node.index()] {
                Some(id) => filter(&clouds[id.index()]),
                None => false,
            })
            .into_iter()
            .filter_map(|(node, dist)| node_cloud[node.index()].map(|id| (id, dist)))
            .collect()
    }

    /// Every cloud reachable from `src`, ascending by oracle distance.  Ties
    /// keep cloud id order.
    pub fn clouds_by_distance(&self, src: NodeId) -> Vec<(CloudId, f64)> {
        let mut out: Vec<(CloudId, f64)> = self
            .clouds
            .iter()
            .map(|c| (c.id(), self.oracle.distance(src, c.node())))
            .filter(|&(_, d)| d.is_finite())
            .collect();
        out.sort_by(|a, b| a.1.total_cmp(&b.1));
        out
    }

    // ── Placement ─────────────────────────────────────────────────────────

    /// Move `service` onto `target`.
    ///
    /// Returns `Ok(false)` if it is already there.  The target's capacity is
    /// checked before anything is touched; on rejection the service stays on
    /// its previous cloud and no cloud changes.
    pub fn place_service(&mut self, service: &mut Service, target: CloudId) -> ResourceResult<bool> {
        self.cloud(target)?;
        if service.cloud() == Some(target) {
            return Ok(false);
        }

        self.cloud_mut(target)?.add_service(service.id(), service.memory_requirement())?;
        if let Some(previous) = service.cloud() {
            if let Ok(cloud) = self.cloud_mut(previous) {
                cloud.remove_service(service.id());
            }
        }
        service.set_cloud(Some(target));
        Ok(true)
    }

    /// Detach `service` from its cloud.  Returns `false` if it was not placed.
    pub fn unplace_service(&mut self, service: &mut Service) -> bool {
        let Some(current) = service.cloud() else {
            return false;
        };
        if let Ok(cloud) = self.cloud_mut(current) {
            cloud.remove_service(service.id());
        }
        service.set_cloud(None);
        true
    }

    // ── Invariants ────────────────────────────────────────────────────────

    /// Check the capacity and back-reference invariants of every cloud
    /// against `population`.
    pub fn check_invariants(&self, population: &Population) -> Result<(), InvariantViolation> {
        for cloud in &self.clouds {
            let committed = cloud.committed();
            if !(committed >= 0.0) || committed > cloud.capacity() {
                return Err(InvariantViolation::CapacityExceeded {
                    cloud:    cloud.id(),
                    committed,
                    capacity: cloud.capacity(),
                });
            }
            let hosted = cloud.hosted_memory();
            if committed != hosted {
                return Err(InvariantViolation::CommittedMismatch { cloud: cloud.id(), committed, hosted });
            }
            for sid in cloud.services() {
                let service = population
                    .service(sid)
                    .ok_or(InvariantViolation::UnknownHostedService { cloud: cloud.id(), service: sid })?;
                if service.cloud() != Some(cloud.id()) {
                    return Err(InvariantViolation::BackReferenceMismatch {
                        cloud:     cloud.id(),
                        service:   sid,
                        points_to: service.cloud(),
                    });
                }
            }
        }

        for service in population.services() {
            if let Some(cid) = service.cloud() {
                let hosted = self.clouds.get(cid.index()).is_some_and(|c| c.hosts(service.id()));
                if !hosted {
                    return Err(InvariantViolation::MissingHosting { service: service.id(), cloud: cid });
                }
            }
        }
        Ok(())
    }
}
