//! Destination-cloud candidate selection.
//!
//! Both built-in selectors precompute a fixed neighborhood per key at
//! construction: the `K − 1` nearest non-central clouds (by the oracle's
//! k-nearest search) followed by the central cloud.

use rustc_hash::FxHashMap;

use mec_core::{CloudId, NodeId, ServiceId};
use mec_resource::{CloudNetwork, Population};

use crate::PlacementResult;

/// Preselects likely destination clouds for a service.
pub trait CandidateSelector: Send + Sync {
    /// Neighborhood size `K`.
    fn num_candidates(&self) -> usize;

    /// Raw neighborhood of `service`.  May contain its current cloud.
    fn neighborhood(&self, population: &Population, service: ServiceId) -> PlacementResult<&[CloudId]>;

    /// Neighborhood minus the current cloud of `service`.
    fn candidates(&self, population: &Population, service: ServiceId) -> PlacementResult<Vec<CloudId>> {
        let current = population.get_service(service)?.cloud();
        Ok(self
            .neighborhood(population, service)?
            .iter()
            .copied()
            .filter(|&c| Some(c) != current)
            .collect())
    }
}

fn knn_neighborhood(network: &CloudNetwork, src: NodeId, k: usize, include_src: bool) -> Vec<CloudId> {
    let central = network.central_cloud();
    let mut out: Vec<CloudId> = network
        .nearest_clouds(src, k.saturating_sub(1), include_src, |c| Some(c.id()) != central)
        .into_iter()
        .map(|(c, _)| c)
        .collect();
    if let Some(central) = central {
        out.push(central);
    }
    out
}

// ── KnnBaseStationSelector ────────────────────────────────────────────────────

/// Neighborhood keyed by the base station the service's user is attached
/// to.  A cloud on the base station itself counts.
#[derive(Clone, Debug)]
pub struct KnnBaseStationSelector {
    k:             usize,
    neighborhoods: FxHashMap<NodeId, Vec<CloudId>>,
}

impl KnnBaseStationSelector {
    pub fn new(network: &CloudNetwork, k: usize) -> Self {
        let neighborhoods = network
            .base_stations()
            .iter()
            .map(|&bs| (bs, knn_neighborhood(network, bs, k, true)))
            .collect();
        Self { k, neighborhoods }
    }

    /// Precomputed neighborhood of `base_station`; empty if it is not a
    /// base station.
    pub fn neighborhood_of(&self, base_station: NodeId) -> &[CloudId] {
        self.neighborhoods.get(&base_station).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl CandidateSelector for KnnBaseStationSelector {
    fn num_candidates(&self) -> usize {
        self.k
    }

    fn neighborhood(&self, population: &Population, service: ServiceId) -> PlacementResult<&[CloudId]> {
        Ok(self.neighborhood_of(population.user_node(service)?))
    }
}

// ── KnnCloudSelector ──────────────────────────────────────────────────────────

/// Neighborhood keyed by the cloud currently hosting the service.  The
/// hosting cloud itself is excluded from its own neighborhood.
#[derive(Clone, Debug)]
pub struct KnnCloudSelector {
    k:             usize,
    neighborhoods: Vec<Vec<CloudId>>,
}

impl KnnCloudSelector {
    pub fn new(network: &CloudNetwork, k: usize) -> Self {
        let neighborhoods = network
            .clouds()
            .iter()
            .map(|c| knn_neighborhood(network, c.node(), k, false))
            .collect();
        Self { k, neighborhoods }
    }

    pub fn neighborhood_of(&self, cloud: CloudId) -> &[CloudId] {
        self.neighborhoods.get(cloud.index()).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl CandidateSelector for KnnCloudSelector {
    fn num_candidates(&self) -> usize {
        self.k
    }

    fn neighborhood(&self, population: &Population, service: ServiceId) -> PlacementResult<&[CloudId]> {
        let cloud = population.get_service(service)?.placed_cloud()?;
        Ok(self.neighborhood_of(cloud))
    }
}
