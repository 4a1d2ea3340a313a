//! `User`: a mobile owner of services.

use mec_core::{NodeId, ServiceId, UserId, Vec2};

use crate::MovementModel;

/// A mobile user with a movement model and a set of owned services.
///
/// The simulation reattaches every user once per step through
/// [`attach`](Self::attach), so `previous_base_station` always refers to the
/// attachment of the step before.
pub struct User {
    id:                    UserId,
    movement:              Box<dyn MovementModel>,
    services:              Vec<ServiceId>,
    base_station:          Option<NodeId>,
    previous_base_station: Option<NodeId>,
}

impl User {
    pub fn new(id: UserId, movement: Box<dyn MovementModel>) -> Self {
        Self {
            id,
            movement,
            services: Vec::new(),
            base_station: None,
            previous_base_station: None,
        }
    }

    #[inline] pub fn id(&self) -> UserId { self.id }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.movement.position()
    }

    /// Advance the movement model by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        self.movement.step(dt);
    }

    pub fn services(&self) -> &[ServiceId] {
        &self.services
    }

    pub(crate) fn push_service(&mut self, service: ServiceId) {
        self.services.push(service);
    }

    #[inline] pub fn base_station(&self) -> Option<NodeId> { self.base_station }
    #[inline] pub fn previous_base_station(&self) -> Option<NodeId> { self.previous_base_station }

    /// Record this step's attachment.  The old attachment becomes
    /// `previous_base_station`, even when unchanged.
    pub fn attach(&mut self, base_station: NodeId) {
        self.previous_base_station = self.base_station;
        self.base_station = Some(base_station);
    }

    /// Did the attachment change between the previous step and this one?
    /// A first attachment counts as a change.
    pub fn base_station_changed(&self) -> bool {
        self.base_station != self.previous_base_station
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("position", &self.position())
            .field("services", &self.services)
            .field("base_station", &self.base_station)
            .field("previous_base_station", &self.previous_base_station)
            .finish()
    }
}
