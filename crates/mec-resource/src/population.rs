//! `Population`: owner of every user and service.
//!
//! Users and services live in `BTreeMap`s keyed by id, so iteration order is
//! the creation order and stays deterministic when users are removed.  Ids
//! are never reused.

use std::collections::BTreeMap;

use mec_core::{Aabb2, CloudId, CoreError, NodeId, ServiceId, SimRng, UserId, UserRng, Vec2};

use crate::{
    CloudNetwork, MovementKind, MovementModel, ResourceError, ResourceResult, Service, ServiceModel,
    ServiceSpec, User,
};

/// Users, their services, and the model that creates those services.
pub struct Population {
    users:         BTreeMap<UserId, User>,
    services:      BTreeMap<ServiceId, Service>,
    service_model: Box<dyn ServiceModel>,
    next_user:     u32,
    next_service:  u32,
}

impl Population {
    pub fn new<M: ServiceModel + 'static>(service_model: M) -> Self {
        Self {
            users:         BTreeMap::new(),
            services:      BTreeMap::new(),
            service_model: Box::new(service_model),
            next_user:     0,
            next_service:  0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Create a user driven by `movement`, with the services the service
    /// model hands out.  New services start unplaced.
    pub fn create_user(&mut self, movement: Box<dyn MovementModel>) -> ResourceResult<UserId> {
        let specs = self.service_model.create_user_services();
        self.create_user_with(movement, &specs)
    }

    /// Create a user with an explicit list of service specs, bypassing the
    /// service model.
    pub fn create_user_with(&mut self, movement: Box<dyn MovementModel>, specs: &[ServiceSpec]) -> ResourceResult<UserId> {
        for spec in specs {
            spec.validate()?;
        }
        let uid = UserId(self.next_user);
        self.next_user += 1;

        let mut user = User::new(uid, movement);
        for spec in specs {
            let sid = ServiceId(self.next_service);
            self.next_service += 1;
            self.services.insert(sid, Service::new(sid, uid, *spec));
            user.push_service(sid);
        }
        log::debug!("created {uid} with {} services", specs.len());
        self.users.insert(uid, user);
        Ok(uid)
    }

    /// Remove a user.  Its services are first detached from their clouds,
    /// then dropped.
    pub fn remove_user(&mut self, network: &mut CloudNetwork, uid: UserId) -> ResourceResult<()> {
        let user = self.users.remove(&uid).ok_or(CoreError::UserNotFound(uid))?;
        for sid in user.services() {
            if let Some(mut service) = self.services.remove(sid) {
                network.unplace_service(&mut service);
            }
        }
        log::debug!("removed {uid}");
        Ok(())
    }

    /// Spawn `count` users at uniform random positions inside `area`, each
    /// moving according to `kind`.  Movement RNGs are seeded from one draw of
    /// `rng` combined with the user id.
    pub fn spawn_random_users(
        &mut self,
        count: usize,
        kind:  MovementKind,
        area:  Aabb2,
        rng:   &mut SimRng,
    ) -> ResourceResult<Vec<UserId>> {
        let movement_seed: u64 = rng.random();
        let mut spawned = Vec::with_capacity(count);
        for _ in 0..count {
            let uid = UserId(self.next_user);
            let start = Vec2::new(rng.uniform(area.min.x, area.max.x), rng.uniform(area.min.y, area.max.y));
            let movement = kind.build(start, area, UserRng::new(movement_seed, uid));
            spawned.push(self.create_user(movement)?);
        }
        log::info!("spawned {count} users ({kind:?})");
        Ok(spawned)
    }

    /// Advance every user's movement model by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        for user in self.users.values_mut() {
            user.step(dt);
        }
    }

    // ── Access ────────────────────────────────────────────────────────────

    pub fn num_users(&self) -> usize {
        self.users.len()
    }

    pub fn num_services(&self) -> usize {
        self.services.len()
    }

    pub fn users(&self) -> impl Iterator<Item = &User> + '_ {
        self.users.values()
    }

    pub fn users_mut(&mut self) -> impl Iterator<Item = &mut User> + '_ {
        self.users.values_mut()
    }

    pub fn user(&self, uid: UserId) -> ResourceResult<&User> {
        self.users.get(&uid).ok_or(ResourceError::Core(CoreError::UserNotFound(uid)))
    }

    pub fn user_mut(&mut self, uid: UserId) -> ResourceResult<&mut User> {
        self.users.get_mut(&uid).ok_or(ResourceError::Core(CoreError::UserNotFound(uid)))
    }

    pub fn services(&self) -> impl Iterator<Item = &Service> + '_ {
        self.services.values()
    }

    /// Service ids in creation order.
    pub fn service_ids(&self) -> Vec<ServiceId> {
        self.services.keys().copied().collect()
    }

    pub fn service(&self, sid: ServiceId) -> Option<&Service> {
        self.services.get(&sid)
    }

    /// Like [`service`](Self::service), but a missing id is an error.
    pub fn get_service(&self, sid: ServiceId) -> ResourceResult<&Service> {
        self.services.get(&sid).ok_or(ResourceError::Core(CoreError::ServiceNotFound(sid)))
    }

    pub fn service_mut(&mut self, sid: ServiceId) -> ResourceResult<&mut Service> {
        self.services.get_mut(&sid).ok_or(ResourceError::Core(CoreError::ServiceNotFound(sid)))
    }

    /// Owner of `sid`.
    pub fn owner(&self, sid: ServiceId) -> ResourceResult<&User> {
        self.user(self.get_service(sid)?.owner())
    }

    // ── Latency ───────────────────────────────────────────────────────────

    /// Current attachment node of the owner of `sid`.
    pub fn user_node(&self, sid: ServiceId) -> ResourceResult<NodeId> {
        let user = self.owner(sid)?;
        user.base_station().ok_or(ResourceError::UserNotAttached(user.id()))
    }

    /// Attachment node of the owner of `sid` at the previous step.
    pub fn previous_user_node(&self, sid: ServiceId) -> ResourceResult<Option<NodeId>> {
        Ok(self.owner(sid)?.previous_base_station())
    }

    pub fn measured_latency(&self, network: &CloudNetwork, sid: ServiceId) -> ResourceResult<f64> {
        let node = self.user_node(sid)?;
        self.get_service(sid)?.measured_latency(network, node)
    }

    pub fn latency_requirement_fulfilled(&self, network: &CloudNetwork, sid: ServiceId) -> ResourceResult<bool> {
        let node = self.user_node(sid)?;
        self.get_service(sid)?.latency_requirement_fulfilled(network, node)
    }

    // ── Placement ─────────────────────────────────────────────────────────

    /// [`CloudNetwork::place_service`] by id.
    pub fn place_service(&mut self, network: &mut CloudNetwork, sid: ServiceId, target: CloudId) -> ResourceResult<bool> {
        let service = self.service_mut(sid)?;
        network.place_service(service, target)
    }

    /// [`CloudNetwork::unplace_service`] by id.
    pub fn unplace_service(&mut self, network: &mut CloudNetwork, sid: ServiceId) -> ResourceResult<bool> {
        let service = self.service_mut(sid)?;
        Ok(network.unplace_service(service))
    }
}

impl std::fmt::Debug for Population {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Population")
            .field("users", &self.users.len())
            .field("services", &self.services.len())
            .finish()
    }
}
