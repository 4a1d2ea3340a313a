//! Placement strategies: the once-per-step orchestration of placement and
//! migration decisions.
//!
//! | Strategy                   | Decides                                              |
//! |----------------------------|------------------------------------------------------|
//! | [`IndependentStrategy`]    | services one at a time, in shuffled order, through per-cloud migration instances |
//! | [`StaticGreedyStrategy`]   | new services only, on the nearest cloud with room    |
//! | [`MyopicOptimalStrategy`]  | all services jointly, every `update_interval` steps  |

use std::time::Instant;

use rustc_hash::FxHashMap;

use mec_core::{CloudId, CoreError, ServiceId, SimRng};
use mec_resource::{Cloud, CloudNetwork, Population, ResourceError};

use crate::candidates::{CandidateSelector, KnnBaseStationSelector};
use crate::optimizer::{AssignmentProblem, Optimizer};
use crate::policy::{MigrationAlgorithm, MigrationInstance, PlacementContext, RewardTally};
use crate::{Action, MigrationTrigger, PlacementError, PlacementResult, ServiceCostFunction};

/// Called by the simulation once per step, after users moved and
/// reattached.
pub trait PlacementStrategy: Send {
    /// Place new services and migrate existing ones.  Returns every action
    /// taken this step.
    fn update_service_placements(
        &mut self,
        network:    &mut CloudNetwork,
        population: &mut Population,
        time_step:  f64,
    ) -> PlacementResult<Vec<Action>>;

    fn name(&self) -> &str;
}

// ── InitialPlacement ──────────────────────────────────────────────────────────

/// Where the independent strategy puts a new service before its first
/// migration decision.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InitialPlacement {
    #[default]
    CentralCloud,
    /// Nearest cloud from the user's base station with enough free memory,
    /// falling back to the central cloud.
    ClosestAvailableCloud,
}

impl InitialPlacement {
    pub fn choose(&self, network: &CloudNetwork, population: &Population, service: ServiceId) -> PlacementResult<CloudId> {
        let central = network.central()?;
        match self {
            InitialPlacement::CentralCloud => Ok(central),
            InitialPlacement::ClosestAvailableCloud => {
                let memory = population.get_service(service)?.memory_requirement();
                let bs = population.user_node(service)?;
                let mut best = central;
                let mut best_dist = network.distance(bs, network.cloud(central)?.node());
                for cloud in network.clouds() {
                    if cloud.free_capacity() >= memory {
                        let dist = network.distance(bs, cloud.node());
                        if dist < best_dist {
                            best = cloud.id();
                            best_dist = dist;
                        }
                    }
                }
                Ok(best)
            }
        }
    }
}

// ── IndependentStrategy ───────────────────────────────────────────────────────

/// Decides services independently, in an order reshuffled every step.
///
/// A new service is placed by [`InitialPlacement`] and immediately gets one
/// migration evaluation; a placed service is evaluated when its
/// [`MigrationTrigger`] fires.  Every decision is dry-run against copies of
/// the affected clouds before anything is applied.
pub struct IndependentStrategy {
    algorithm:         MigrationAlgorithm,
    instances:         Vec<Box<dyn MigrationInstance>>,
    cost:              Box<dyn ServiceCostFunction>,
    trigger:           MigrationTrigger,
    initial:           InitialPlacement,
    rng:               SimRng,
    name:              String,
    num_migrations:    u64,
    num_no_migrations: u64,
    num_degraded:      u64,
    unplaceable:       u64,
}

impl IndependentStrategy {
    pub const DEFAULT_SEED: u64 = 6151;

    /// Create one migration instance per cloud of `network`.
    pub fn new<C: ServiceCostFunction + 'static>(network: &CloudNetwork, algorithm: MigrationAlgorithm, cost: C) -> Self {
        let instances = algorithm.create_instances(network);
        let name = format!("independent/{}", algorithm.name());
        Self {
            algorithm,
            instances,
            cost: Box::new(cost),
            trigger: MigrationTrigger::default(),
            initial: InitialPlacement::default(),
            rng: SimRng::new(Self::DEFAULT_SEED),
            name,
            num_migrations: 0,
            num_no_migrations: 0,
            num_degraded: 0,
            unplaceable: 0,
        }
    }

    pub fn with_trigger(mut self, trigger: MigrationTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_initial_placement(mut self, initial: InitialPlacement) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SimRng::new(seed);
        self
    }

    pub fn algorithm(&self) -> &MigrationAlgorithm {
        &self.algorithm
    }

    pub fn num_migrations(&self) -> u64 { self.num_migrations }
    pub fn num_no_migrations(&self) -> u64 { self.num_no_migrations }

    /// Decisions that failed the dry run and were replaced by a
    /// `NoMigration`.
    pub fn num_degraded(&self) -> u64 { self.num_degraded }

    /// Initial placements rejected because the chosen cloud was full.  The
    /// service is retried on the next step.
    pub fn unplaceable(&self) -> u64 { self.unplaceable }

    /// Reward statistics of every instance that keeps them, by cloud.
    pub fn reward_tallies(&self) -> impl Iterator<Item = (CloudId, &RewardTally)> + '_ {
        self.instances
            .iter()
            .enumerate()
            .filter_map(|(i, inst)| inst.reward_tally().map(|t| (CloudId(i as u32), t)))
    }

    fn place_initially(
        &mut self,
        network:    &mut CloudNetwork,
        population: &mut Population,
        service:    ServiceId,
    ) -> PlacementResult<Vec<Action>> {
        let target = self.initial.choose(network, population, service)?;
        match population.place_service(network, service, target) {
            Ok(_) => {}
            Err(ResourceError::Overallocated { free, .. }) => {
                self.unplaceable += 1;
                log::warn!("{service}: {target} has only {free} free memory, leaving it unplaced");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        }
        let mut actions = vec![Action::InitialPlacement { service, cloud: target }];
        actions.extend(self.trigger_migration_event(network, population, service)?);
        Ok(actions)
    }

    fn trigger_migration_event(
        &mut self,
        network:    &mut CloudNetwork,
        population: &mut Population,
        service:    ServiceId,
    ) -> PlacementResult<Vec<Action>> {
        let current = population.get_service(service)?.placed_cloud()?;
        let instance = self
            .instances
            .get_mut(current.index())
            .ok_or(PlacementError::from(CoreError::CloudNotFound(current)))?;

        let ctx = PlacementContext::new(network, population);
        let proposed = instance.process_migration_event(&ctx, service)?;
        let decision = match dry_run(&ctx, service, current, &proposed) {
            Ok(()) => proposed,
            Err(reason) => {
                log::warn!("{service}: rejected decision ({reason}), keeping it on {current}");
                self.num_degraded += 1;
                vec![Action::NoMigration { service, cloud: current }]
            }
        };

        for action in &decision {
            match *action {
                Action::Migration { service: moved, target, .. } => {
                    population.place_service(network, moved, target)?;
                    self.num_migrations += 1;
                }
                _ => self.num_no_migrations += 1,
            }
        }

        let last = decision.last().copied().ok_or(PlacementError::EmptyDecision(service))?;
        let cost = self.cost.calculate_cost(network, population, service, std::slice::from_ref(&last))?;
        instance.give_reward(-cost.total());
        Ok(decision)
    }
}

/// Check a decision against copies of the clouds it touches.
///
/// The copies go through the same `add_service` / `remove_service` calls,
/// in the same order, as the real application will.
fn dry_run(ctx: &PlacementContext<'_>, trigger: ServiceId, current: CloudId, decision: &[Action]) -> PlacementResult<()> {
    let Some((last, evictions)) = decision.split_last() else {
        return Err(PlacementError::EmptyDecision(trigger));
    };
    let malformed = |reason: String| Err(PlacementError::ForeignDecision { trigger, reason });

    if last.service() != trigger {
        return malformed(format!("last action concerns {}", last.service()));
    }

    let mut clouds: FxHashMap<CloudId, Cloud> = FxHashMap::default();
    let mut location: FxHashMap<ServiceId, CloudId> = FxHashMap::default();

    let count = evictions.len() + 1;
    for (i, action) in evictions.iter().chain(std::iter::once(last)).enumerate() {
        match *action {
            Action::Migration { service, source, target } => {
                let svc = ctx.population.get_service(service)?;
                let here = match location.get(&service) {
                    Some(&c) => c,
                    None => svc.placed_cloud()?,
                };
                if here != source {
                    return malformed(format!("{service} is on {here}, not {source}"));
                }
                if source == target {
                    return malformed(format!("{service} migrates onto its own cloud"));
                }
                let user_node = ctx.population.user_node(service)?;
                let target_node = ctx.network.cloud(target)?.node();
                if !ctx.network.oracle().is_reachable(user_node, target_node) {
                    return Err(ResourceError::UnreachableTarget { from: user_node, to: target_node }.into());
                }
                for id in [source, target] {
                    if !clouds.contains_key(&id) {
                        clouds.insert(id, ctx.network.cloud(id)?.clone());
                    }
                }
                if let Some(cloud) = clouds.get_mut(&target) {
                    cloud.add_service(service, svc.memory_requirement())?;
                }
                if let Some(cloud) = clouds.get_mut(&source) {
                    cloud.remove_service(service);
                }
                location.insert(service, target);
            }
            Action::NoMigration { service, cloud } => {
                if service != trigger || i + 1 != count {
                    return malformed(format!("NoMigration for {service} before the end of the decision"));
                }
                if cloud != current {
                    return malformed(format!("NoMigration on {cloud}, but {service} is on {current}"));
                }
            }
            Action::InitialPlacement { service, .. } => {
                return malformed(format!("initial placement of {service} inside a migration decision"));
            }
        }
    }
    Ok(())
}

impl PlacementStrategy for IndependentStrategy {
    fn update_service_placements(
        &mut self,
        network:    &mut CloudNetwork,
        population: &mut Population,
        _time_step: f64,
    ) -> PlacementResult<Vec<Action>> {
        let mut order = population.service_ids();
        self.rng.shuffle(&mut order);

        let mut actions = Vec::new();
        for service in order {
            if !population.get_service(service)?.is_placed() {
                actions.extend(self.place_initially(network, population, service)?);
            } else if self.trigger.should_trigger(network, population, service)? {
                actions.extend(self.trigger_migration_event(network, population, service)?);
            }
        }
        Ok(actions)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ── StaticGreedyStrategy ──────────────────────────────────────────────────────

/// Places each new service on the nearest cloud with enough free memory and
/// never moves it again.
#[derive(Clone, Debug, Default)]
pub struct StaticGreedyStrategy {
    unplaceable: u64,
}

impl StaticGreedyStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Placement attempts that found no cloud with room.
    pub fn unplaceable(&self) -> u64 {
        self.unplaceable
    }
}

impl PlacementStrategy for StaticGreedyStrategy {
    fn update_service_placements(
        &mut self,
        network:    &mut CloudNetwork,
        population: &mut Population,
        _time_step: f64,
    ) -> PlacementResult<Vec<Action>> {
        let mut actions = Vec::new();
        for service in population.service_ids() {
            let svc = population.get_service(service)?;
            if svc.is_placed() {
                continue;
            }
            let memory = svc.memory_requirement();
            let bs = population.user_node(service)?;
            let target = network
                .clouds_by_distance(bs)
                .into_iter()
                .map(|(c, _)| c)
                .find(|&c| network.cloud(c).is_ok_and(|cloud| cloud.free_capacity() >= memory));
            match target {
                Some(cloud) => {
                    population.place_service(network, service, cloud)?;
                    actions.push(Action::InitialPlacement { service, cloud });
                }
                None => {
                    self.unplaceable += 1;
                    log::warn!("{service}: no cloud has {memory} free memory, leaving it unplaced");
                }
            }
        }
        Ok(actions)
    }

    fn name(&self) -> &str {
        "static-greedy"
    }
}

// ── MyopicOptimalStrategy ─────────────────────────────────────────────────────

/// Estimated per-hop signalling delay of a centralized solve, in seconds.
const HOP_DELAY_SECS: f64 = 0.001;

/// Jointly re-solves every placement for minimum static cost on steps
/// `0, N, 2N, …`, ignoring transition costs.  Between solves, new services
/// go to the central cloud.
pub struct MyopicOptimalStrategy<O: Optimizer> {
    optimizer:          O,
    cost:               Box<dyn ServiceCostFunction>,
    update_interval:    u64,
    selector:           Option<KnnBaseStationSelector>,
    step:               u64,
    solves:             u64,
    total_solve_secs:   f64,
    communication_secs: Option<f64>,
    infeasible_solves:  u64,
    unplaceable:        u64,
}

impl<O: Optimizer> MyopicOptimalStrategy<O> {
    /// `update_interval` is clamped to at least 1.
    pub fn new<C: ServiceCostFunction + 'static>(optimizer: O, cost: C, update_interval: u64) -> Self {
        Self {
            optimizer,
            cost: Box::new(cost),
            update_interval: update_interval.max(1),
            selector: None,
            step: 0,
            solves: 0,
            total_solve_secs: 0.0,
            communication_secs: None,
            infeasible_solves: 0,
            unplaceable: 0,
        }
    }

    /// Restrict each service's candidates to its base-station neighborhood.
    pub fn with_selector(mut self, selector: KnnBaseStationSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Mean wall-clock time per solve, in seconds.
    pub fn mean_computation_time(&self) -> Option<f64> {
        (self.solves > 0).then(|| self.total_solve_secs / self.solves as f64)
    }

    /// Estimated round trip to the farthest cloud from the central cloud:
    /// `2 · max distance · 1 ms`.
    pub fn mean_communication_time(&self) -> Option<f64> {
        self.communication_secs
    }

    pub fn infeasible_solves(&self) -> u64 {
        self.infeasible_solves
    }

    /// Fallback placements on the central cloud that found it full.
    pub fn unplaceable(&self) -> u64 {
        self.unplaceable
    }

    fn estimate_communication_time(&mut self, network: &CloudNetwork) {
        let Some(central) = network.central_cloud().and_then(|c| network.cloud(c).ok()) else {
            return;
        };
        let max_hops = network
            .clouds()
            .iter()
            .map(|c| network.distance(central.node(), c.node()))
            .filter(|d| d.is_finite())
            .fold(0.0, f64::max);
        self.communication_secs = Some(2.0 * max_hops * HOP_DELAY_SECS);
    }

    /// Without a central cloud, or with a full one, unplaced services stay
    /// unplaced.
    fn place_unplaced_at_central(&mut self, network: &mut CloudNetwork, population: &mut Population) -> PlacementResult<Vec<Action>> {
        let mut actions = Vec::new();
        for service in population.service_ids() {
            if population.get_service(service)?.is_placed() {
                continue;
            }
            let Some(central) = network.central_cloud() else {
                log::warn!("{service}: no central cloud to fall back on, leaving it unplaced");
                continue;
            };
            match population.place_service(network, service, central) {
                Ok(_) => actions.push(Action::InitialPlacement { service, cloud: central }),
                Err(ResourceError::Overallocated { free, .. }) => {
                    self.unplaceable += 1;
                    log::warn!("{service}: central cloud has only {free} free memory, leaving it unplaced");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(actions)
    }

    fn build_problem(
        &self,
        network:    &CloudNetwork,
        population: &Population,
        services:   &[ServiceId],
    ) -> PlacementResult<AssignmentProblem> {
        let mut problem = AssignmentProblem {
            capacities: network.clouds().iter().map(Cloud::capacity).collect(),
            memories:   Vec::with_capacity(services.len()),
            candidates: Vec::with_capacity(services.len()),
        };
        for &service in services {
            let svc = population.get_service(service)?;
            let user_node = population.user_node(service)?;

            let mut clouds: Vec<CloudId> = match &self.selector {
                Some(selector) => selector.neighborhood(population, service)?.to_vec(),
                None => network.clouds().iter().map(Cloud::id).collect(),
            };
            if let Some(current) = svc.cloud() {
                if !clouds.contains(&current) {
                    clouds.push(current);
                }
            }

            let mut candidates = Vec::with_capacity(clouds.len());
            for cloud in clouds {
                let node = network.cloud(cloud)?.node();
                if !network.oracle().is_reachable(user_node, node) {
                    continue;
                }
                let cost = self.cost.static_cost_at(network, population, service, cloud)?;
                candidates.push((cloud.index(), cost));
            }
            problem.memories.push(svc.memory_requirement());
            problem.candidates.push(candidates);
        }
        Ok(problem)
    }

    /// Apply `targets` in repeated passes until every move is done or a pass
    /// makes no progress.
    fn apply(
        &self,
        network:    &mut CloudNetwork,
        population: &mut Population,
        targets:    Vec<(ServiceId, CloudId)>,
    ) -> PlacementResult<()> {
        let mut pending = targets;
        loop {
            let before = pending.len();
            let mut blocked = Vec::new();
            for (service, target) in pending {
                match population.place_service(network, service, target) {
                    Ok(_) => {}
                    Err(ResourceError::Overallocated { .. }) => blocked.push((service, target)),
                    Err(e) => return Err(e.into()),
                }
            }
            pending = blocked;
            if pending.is_empty() || pending.len() == before {
                break;
            }
        }
        for (service, target) in pending {
            log::debug!("{service}: move to {target} stays blocked, keeping current placement");
        }
        Ok(())
    }
}

impl<O: Optimizer> PlacementStrategy for MyopicOptimalStrategy<O> {
    fn update_service_placements(
        &mut self,
        network:    &mut CloudNetwork,
        population: &mut Population,
        _time_step: f64,
    ) -> PlacementResult<Vec<Action>> {
        if self.communication_secs.is_none() {
            self.estimate_communication_time(network);
        }

        let solve_now = self.step % self.update_interval == 0;
        self.step += 1;
        if !solve_now {
            return self.place_unplaced_at_central(network, population);
        }

        let services = population.service_ids();
        let previous: Vec<Option<CloudId>> = services
            .iter()
            .map(|&s| population.get_service(s).map(|svc| svc.cloud()))
            .collect::<Result<_, _>>()?;

        let problem = self.build_problem(network, population, &services)?;
        let started = Instant::now();
        let result = self.optimizer.solve(&problem);
        self.total_solve_secs += started.elapsed().as_secs_f64();
        self.solves += 1;

        match result {
            Ok(assignment) => {
                let targets = services
                    .iter()
                    .zip(&assignment.choice)
                    .map(|(&s, &c)| (s, CloudId(c as u32)))
                    .collect();
                self.apply(network, population, targets)?;
                log::debug!("myopic solve: cost {:.3} over {} services", assignment.cost, services.len());
            }
            Err(e @ (PlacementError::InfeasibleOptimization(_) | PlacementError::NodeLimitExceeded(_))) => {
                self.infeasible_solves += 1;
                log::warn!("myopic solve failed ({e}), keeping current placements");
            }
            Err(e) => return Err(e),
        }
        // Anything still unplaced goes to the central cloud.
        self.place_unplaced_at_central(network, population)?;

        let mut actions = Vec::with_capacity(services.len());
        for (&service, prev) in services.iter().zip(previous) {
            let Some(now) = population.get_service(service)?.cloud() else {
                continue;
            };
            actions.push(match prev {
                None => Action::InitialPlacement { service, cloud: now },
                Some(prev) => Action::towards(service, prev, now),
            });
        }
        Ok(actions)
    }

    fn name(&self) -> &str {
        "myopic-optimal"
    }
}
