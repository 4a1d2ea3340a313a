//! `Cloud`: a memory-bounded service host bound to one network node.

use mec_core::{CloudId, NodeId, ServiceId};

use crate::{ResourceError, ResourceResult};

/// A compute host with a memory capacity.
///
/// The hosted set is kept in insertion order together with each service's
/// memory requirement.  `committed` is always recomputed from that list, so
/// it equals the sum of hosted memory by construction and an add followed by
/// a remove restores it bit for bit.
#[derive(Clone, Debug, PartialEq)]
pub struct Cloud {
    id:        CloudId,
    node:      NodeId,
    capacity:  f64,
    committed: f64,
    hosted:    Vec<(ServiceId, f64)>,
}

impl Cloud {
    /// A cloud with `capacity` memory units.  Use `f64::INFINITY` for an
    /// unbounded central cloud.
    pub fn new(id: CloudId, node: NodeId, capacity: f64) -> Self {
        Self { id, node, capacity, committed: 0.0, hosted: Vec::new() }
    }

    #[inline] pub fn id(&self) -> CloudId { self.id }
    #[inline] pub fn node(&self) -> NodeId { self.node }
    #[inline] pub fn capacity(&self) -> f64 { self.capacity }
    #[inline] pub fn committed(&self) -> f64 { self.committed }

    #[inline]
    pub fn is_unbounded(&self) -> bool {
        self.capacity == f64::INFINITY
    }

    /// `max(0, capacity - committed)`.
    #[inline]
    pub fn free_capacity(&self) -> f64 {
        (self.capacity - self.committed).max(0.0)
    }

    /// Would `memory` more fit without exceeding capacity?
    #[inline]
    pub fn fits(&self, memory: f64) -> bool {
        self.committed + memory <= self.capacity
    }

    pub fn hosts(&self, service: ServiceId) -> bool {
        self.hosted.iter().any(|&(s, _)| s == service)
    }

    /// Hosted service ids in insertion order.
    pub fn services(&self) -> impl Iterator<Item = ServiceId> + '_ {
        self.hosted.iter().map(|&(s, _)| s)
    }

    /// Hosted `(service, memory)` pairs in insertion order.
    pub fn hosted(&self) -> &[(ServiceId, f64)] {
        &self.hosted
    }

    pub fn service_count(&self) -> usize {
        self.hosted.len()
    }

    /// Sum of hosted memory, in insertion order.
    pub fn hosted_memory(&self) -> f64 {
        self.hosted.iter().map(|&(_, m)| m).sum()
    }

    /// Host `service`.
    ///
    /// Returns `Ok(false)` if it is already hosted here.  Fails with
    /// [`ResourceError::Overallocated`] before touching any state if the
    /// addition would exceed capacity.
    pub fn add_service(&mut self, service: ServiceId, memory: f64) -> ResourceResult<bool> {
        if self.hosts(service) {
            return Ok(false);
        }
        if !self.fits(memory) {
            return Err(ResourceError::Overallocated {
                cloud:     self.id,
                requested: memory,
                free:      self.free_capacity(),
            });
        }
        self.hosted.push((service, memory));
        self.recompute();
        Ok(true)
    }

    /// Stop hosting `service`, returning its memory, or `None` if it was not
    /// hosted here.
    pub fn remove_service(&mut self, service: ServiceId) -> Option<f64> {
        let pos = self.hosted.iter().position(|&(s, _)| s == service)?;
        let (_, memory) = self.hosted.remove(pos);
        self.recompute();
        debug_assert!(self.committed >= 0.0, "{} committed memory went negative", self.id);
        Some(memory)
    }

    fn recompute(&mut self) {
        self.committed = self.hosted_memory();
    }
}
