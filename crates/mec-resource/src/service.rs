//! `Service`: a migratable unit of work owned by a user.

use std::cell::Cell;

use mec_core::{CloudId, NodeId, ServiceId, UserId};

use crate::{CloudNetwork, ResourceError, ResourceResult, ServiceSpec};

/// Cached measured latency, valid for one (hosting node, attachment node)
/// pair.
#[derive(Copy, Clone, Debug, PartialEq)]
struct LatencyCache {
    cloud_node: NodeId,
    user_node:  NodeId,
    latency:    f64,
}

/// A placed (or not yet placed) service.
///
/// `cloud` is a non-owning handle; the hosting `Cloud` owns the membership.
/// Only `CloudNetwork::place_service` and `unplace_service` change it.
#[derive(Clone, Debug)]
pub struct Service {
    id:                  ServiceId,
    owner:               UserId,
    memory_requirement:  f64,
    latency_requirement: f64,
    priority:            f64,
    cloud:               Option<CloudId>,
    previous_cloud:      Option<CloudId>,
    latency_cache:       Cell<Option<LatencyCache>>,
}

impl Service {
    pub fn new(id: ServiceId, owner: UserId, spec: ServiceSpec) -> Self {
        Self {
            id,
            owner,
            memory_requirement:  spec.memory_requirement,
            latency_requirement: spec.latency_requirement,
            priority:            spec.priority,
            cloud:               None,
            previous_cloud:      None,
            latency_cache:       Cell::new(None),
        }
    }

    #[inline] pub fn id(&self) -> ServiceId { self.id }
    #[inline] pub fn owner(&self) -> UserId { self.owner }
    #[inline] pub fn memory_requirement(&self) -> f64 { self.memory_requirement }
    #[inline] pub fn latency_requirement(&self) -> f64 { self.latency_requirement }
    #[inline] pub fn priority(&self) -> f64 { self.priority }

    /// Current hosting cloud.
    #[inline] pub fn cloud(&self) -> Option<CloudId> { self.cloud }

    /// Cloud that hosted this service before its latest move.  Bookkeeping
    /// only; it carries no capacity.
    #[inline] pub fn previous_cloud(&self) -> Option<CloudId> { self.previous_cloud }

    #[inline]
    pub fn is_placed(&self) -> bool {
        self.cloud.is_some()
    }

    /// Hosting cloud, or [`ResourceError::ServiceNotPlaced`].
    pub fn placed_cloud(&self) -> ResourceResult<CloudId> {
        self.cloud.ok_or(ResourceError::ServiceNotPlaced(self.id))
    }

    pub(crate) fn set_cloud(&mut self, cloud: Option<CloudId>) {
        if cloud != self.cloud {
            self.previous_cloud = self.cloud;
            self.cloud = cloud;
        }
    }

    /// Distance from `user_node` to the hosting cloud's node plus the access
    /// latency of `user_node`.
    ///
    /// Cached; the cache is reused while neither the hosting node nor
    /// `user_node` changes.  Unreachable clouds yield `+∞`.
    pub fn measured_latency(&self, network: &CloudNetwork, user_node: NodeId) -> ResourceResult<f64> {
        let cloud_node = network.cloud(self.placed_cloud()?)?.node();
        if let Some(cache) = self.latency_cache.get() {
            if cache.cloud_node == cloud_node && cache.user_node == user_node {
                return Ok(cache.latency);
            }
        }
        let latency = network.latency(user_node, cloud_node);
        self.latency_cache.set(Some(LatencyCache { cloud_node, user_node, latency }));
        Ok(latency)
    }

    /// `measured_latency <= latency_requirement`.
    pub fn latency_requirement_fulfilled(&self, network: &CloudNetwork, user_node: NodeId) -> ResourceResult<bool> {
        Ok(self.measured_latency(network, user_node)? <= self.latency_requirement)
    }
}
