//! Migration policies.
//!
//! Every cloud owns one [`MigrationInstance`], created from a
//! [`MigrationAlgorithm`] when the strategy is built.  When a service's
//! trigger fires, the instance of the cloud currently hosting it decides,
//! and later receives a reward for that decision.
//!
//! # Decision contract
//!
//! `process_migration_event` returns a non-empty list whose last element
//! concerns the triggering service.  Any earlier elements are migrations of
//! other services (evictions) that must be applied first.  The strategy
//! dry-runs the list and degrades it to a `NoMigration` if it is malformed
//! or would overflow a cloud.

use std::fmt;
use std::sync::Arc;

use mec_core::{CloudId, NodeId, ServiceId};
use mec_resource::{CloudNetwork, Population};

use crate::candidates::{CandidateSelector, KnnBaseStationSelector};
use crate::displacement::{self, Displacement, DisplacementPlan};
use crate::{Action, PlacementResult, UtilityFunction};

/// Read-only view handed to migration instances.
#[derive(Copy, Clone)]
pub struct PlacementContext<'a> {
    pub network:    &'a CloudNetwork,
    pub population: &'a Population,
}

impl<'a> PlacementContext<'a> {
    pub fn new(network: &'a CloudNetwork, population: &'a Population) -> Self {
        Self { network, population }
    }
}

// ── Rewards ───────────────────────────────────────────────────────────────────

/// Running reward statistics of one instance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RewardTally {
    count:        u64,
    sum:          f64,
    window:       Vec<f64>,
    window_means: Vec<f64>,
}

impl RewardTally {
    pub const WINDOW: usize = 100;

    pub fn record(&mut self, reward: f64) {
        self.count += 1;
        self.sum += reward;
        self.window.push(reward);
        if self.window.len() >= Self::WINDOW {
            let mean = self.window.iter().sum::<f64>() / self.window.len() as f64;
            log::debug!("reward window closed after {} rewards: mean {mean:.4}", self.count);
            self.window_means.push(mean);
            self.window.clear();
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Mean of every closed window, oldest first.
    pub fn window_means(&self) -> &[f64] {
        &self.window_means
    }
}

// ── Traits ────────────────────────────────────────────────────────────────────

/// Per-cloud decision maker.  This is the boundary for learned and external
/// policies.
pub trait MigrationInstance: Send {
    /// Decide what to do with `service`, currently hosted on this instance's
    /// cloud.
    fn process_migration_event(&mut self, ctx: &PlacementContext<'_>, service: ServiceId) -> PlacementResult<Vec<Action>>;

    /// Immediate reward for the last decision.  Ignored by default.
    fn give_reward(&mut self, _reward: f64) {}

    fn reward_tally(&self) -> Option<&RewardTally> {
        None
    }
}

/// Builds one [`MigrationInstance`] per cloud for custom policies.
pub trait InstanceFactory: Send + Sync {
    fn create_instance(&self, cloud: CloudId, network: &CloudNetwork) -> Box<dyn MigrationInstance>;
}

// ── MigrationAlgorithm ────────────────────────────────────────────────────────

/// Distance used by [`MigrationAlgorithm::ClosestInNeighborhood`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistanceMeasure {
    /// Squared distance between base-station and cloud positions.
    #[default]
    Euclidean,
    /// Oracle distance from the base station to the cloud.
    Hops,
}

/// The built-in migration policies, plus an escape hatch for custom ones.
#[derive(Clone)]
pub enum MigrationAlgorithm {
    /// Always `NoMigration`.
    Never,
    /// Move to the single nearest cloud from the user's base station.
    Always { only_available: bool },
    /// Move to the closest (or furthest) of the current cloud and its
    /// neighborhood candidates.
    ClosestInNeighborhood { neighborhood: usize, only_available: bool, metric: DistanceMeasure, furthest: bool },
    /// Move to the cloud maximizing `utility − displacement cost`.
    HighestUtility { neighborhood: usize, utility: UtilityFunction, displacement: Displacement },
    Custom(Arc<dyn InstanceFactory>),
}

impl fmt::Debug for MigrationAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationAlgorithm::Never => f.write_str("Never"),
            MigrationAlgorithm::Always { only_available } => {
                f.debug_struct("Always").field("only_available", only_available).finish()
            }
            MigrationAlgorithm::ClosestInNeighborhood { neighborhood, only_available, metric, furthest } => f
                .debug_struct("ClosestInNeighborhood")
                .field("neighborhood", neighborhood)
                .field("only_available", only_available)
                .field("metric", metric)
                .field("furthest", furthest)
                .finish(),
            MigrationAlgorithm::HighestUtility { neighborhood, utility, displacement } => f
                .debug_struct("HighestUtility")
                .field("neighborhood", neighborhood)
                .field("utility", utility)
                .field("displacement", displacement)
                .finish(),
            MigrationAlgorithm::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl MigrationAlgorithm {
    /// One instance per cloud, indexed by `CloudId`.  Neighborhood-based
    /// policies share one precomputed selector.
    pub fn create_instances(&self, network: &CloudNetwork) -> Vec<Box<dyn MigrationInstance>> {
        let selector = match self {
            MigrationAlgorithm::ClosestInNeighborhood { neighborhood, .. }
            | MigrationAlgorithm::HighestUtility { neighborhood, .. } => {
                Some(Arc::new(KnnBaseStationSelector::new(network, *neighborhood)))
            }
            _ => None,
        };
        network
            .clouds()
            .iter()
            .map(|c| self.instance_with(c.id(), network, selector.clone()))
            .collect()
    }

    /// A single instance for `cloud`.
    pub fn create_instance(&self, cloud: CloudId, network: &CloudNetwork) -> Box<dyn MigrationInstance> {
        self.instance_with(cloud, network, None)
    }

    fn instance_with(
        &self,
        cloud:    CloudId,
        network:  &CloudNetwork,
        selector: Option<Arc<KnnBaseStationSelector>>,
    ) -> Box<dyn MigrationInstance> {
        let tally = RewardTally::default();
        match self {
            MigrationAlgorithm::Never => Box::new(NeverMigrate { cloud, tally }),
            MigrationAlgorithm::Always { only_available } => {
                Box::new(AlwaysMigrate { cloud, only_available: *only_available, tally })
            }
            MigrationAlgorithm::ClosestInNeighborhood { neighborhood, only_available, metric, furthest } => {
                Box::new(ClosestInNeighborhood {
                    cloud,
                    selector: selector.unwrap_or_else(|| Arc::new(KnnBaseStationSelector::new(network, *neighborhood))),
                    only_available: *only_available,
                    metric: *metric,
                    furthest: *furthest,
                    tally,
                })
            }
            MigrationAlgorithm::HighestUtility { neighborhood, utility, displacement } => Box::new(HighestUtility {
                cloud,
                selector: selector.unwrap_or_else(|| Arc::new(KnnBaseStationSelector::new(network, *neighborhood))),
                utility: *utility,
                displacement: *displacement,
                tally,
            }),
            MigrationAlgorithm::Custom(factory) => factory.create_instance(cloud, network),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MigrationAlgorithm::Never => "never",
            MigrationAlgorithm::Always { .. } => "always",
            MigrationAlgorithm::ClosestInNeighborhood { .. } => "closest-in-neighborhood",
            MigrationAlgorithm::HighestUtility { .. } => "highest-utility",
            MigrationAlgorithm::Custom(_) => "custom",
        }
    }
}

// ── Built-in instances ────────────────────────────────────────────────────────

struct NeverMigrate {
    cloud: CloudId,
    tally: RewardTally,
}

impl MigrationInstance for NeverMigrate {
    fn process_migration_event(&mut self, _ctx: &PlacementContext<'_>, service: ServiceId) -> PlacementResult<Vec<Action>> {
        Ok(vec![Action::NoMigration { service, cloud: self.cloud }])
    }

    fn give_reward(&mut self, reward: f64) {
        self.tally.record(reward);
    }

    fn reward_tally(&self) -> Option<&RewardTally> {
        Some(&self.tally)
    }
}

struct AlwaysMigrate {
    cloud:          CloudId,
    only_available: bool,
    tally:          RewardTally,
}

impl MigrationInstance for AlwaysMigrate {
    fn process_migration_event(&mut self, ctx: &PlacementContext<'_>, service: ServiceId) -> PlacementResult<Vec<Action>> {
        let memory = ctx.population.get_service(service)?.memory_requirement();
        let bs = ctx.population.user_node(service)?;
        let current = self.cloud;
        let only_available = self.only_available;

        let nearest = ctx.network.nearest_clouds(bs, 1, true, |c| {
            !only_available || c.id() == current || c.fits(memory)
        });
        let target = nearest.first().map_or(current, |&(c, _)| c);
        Ok(vec![Action::towards(service, current, target)])
    }

    fn give_reward(&mut self, reward: f64) {
        self.tally.record(reward);
    }

    fn reward_tally(&self) -> Option<&RewardTally> {
        Some(&self.tally)
    }
}

struct ClosestInNeighborhood {
    cloud:          CloudId,
    selector:       Arc<KnnBaseStationSelector>,
    only_available: bool,
    metric:         DistanceMeasure,
    furthest:       bool,
    tally:          RewardTally,
}

impl ClosestInNeighborhood {
    fn distance(&self, network: &CloudNetwork, bs: NodeId, cloud: CloudId) -> Option<f64> {
        let node = network.cloud(cloud).ok()?.node();
        let d = match self.metric {
            DistanceMeasure::Euclidean => {
                let net = network.network();
                net.position(bs)?.distance_sq(net.position(node)?)
            }
            DistanceMeasure::Hops => network.distance(bs, node),
        };
        d.is_finite().then_some(d)
    }
}

impl MigrationInstance for ClosestInNeighborhood {
    fn process_migration_event(&mut self, ctx: &PlacementContext<'_>, service: ServiceId) -> PlacementResult<Vec<Action>> {
        let memory = ctx.population.get_service(service)?.memory_requirement();
        let bs = ctx.population.user_node(service)?;
        let current = self.cloud;

        let mut best: Option<(CloudId, f64)> = None;
        let candidates = self.selector.candidates(ctx.population, service)?;
        for cloud in std::iter::once(current).chain(candidates) {
            if self.only_available && cloud != current && !ctx.network.cloud(cloud)?.fits(memory) {
                continue;
            }
            let Some(d) = self.distance(ctx.network, bs, cloud) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((_, best_d)) if self.furthest => d > best_d,
                Some((_, best_d)) => d < best_d,
            };
            if better {
                best = Some((cloud, d));
            }
        }

        let target = best.map_or(current, |(c, _)| c);
        Ok(vec![Action::towards(service, current, target)])
    }

    fn give_reward(&mut self, reward: f64) {
        self.tally.record(reward);
    }

    fn reward_tally(&self) -> Option<&RewardTally> {
        Some(&self.tally)
    }
}

struct HighestUtility {
    cloud:        CloudId,
    selector:     Arc<KnnBaseStationSelector>,
    utility:      UtilityFunction,
    displacement: Displacement,
    tally:        RewardTally,
}

impl HighestUtility {
    /// Evictions needed to fit `memory` on `target`.
    fn displacement_plan(
        &self,
        ctx:     &PlacementContext<'_>,
        service: ServiceId,
        memory:  f64,
        target:  CloudId,
    ) -> PlacementResult<Option<DisplacementPlan>> {
        let cloud = ctx.network.cloud(target)?;
        if cloud.fits(memory) {
            return Ok(Some(DisplacementPlan::free()));
        }
        let needed = memory - cloud.free_capacity();
        let free = |c: CloudId| ctx.network.cloud(c).map_or(0.0, |c| c.free_capacity());
        let plan = match self.displacement {
            Displacement::Disabled => return Ok(None),
            Displacement::Greedy => {
                let options = displacement::displacement_options(ctx, self.selector.as_ref(), self.utility, target, service)?;
                displacement::greedy(needed, &options, free)
            }
            Displacement::Exact { max_options } => {
                let options = displacement::displacement_options(ctx, self.selector.as_ref(), self.utility, target, service)?;
                displacement::exact(needed, &options, free, max_options)
            }
        };
        Ok(plan.is_feasible().then_some(plan))
    }
}

impl MigrationInstance for HighestUtility {
    fn process_migration_event(&mut self, ctx: &PlacementContext<'_>, service: ServiceId) -> PlacementResult<Vec<Action>> {
        let svc = ctx.population.get_service(service)?;
        let memory = svc.memory_requirement();
        let bs = ctx.population.user_node(service)?;
        let current = self.cloud;

        let mut best_cloud = current;
        let mut best_value = self.utility.utility(ctx.network, svc, bs, current);
        let mut best_moves = Vec::new();

        for cloud in self.selector.candidates(ctx.population, service)? {
            let utility = self.utility.utility(ctx.network, svc, bs, cloud);
            if !utility.is_finite() {
                continue;
            }
            let Some(plan) = self.displacement_plan(ctx, service, memory, cloud)? else {
                continue;
            };
            let value = utility - plan.cost;
            if value > best_value {
                best_value = value;
                best_cloud = cloud;
                best_moves = plan.moves;
            }
        }

        let mut actions: Vec<Action> = Vec::with_capacity(best_moves.len() + 1);
        if best_cloud != current {
            for (evicted, to) in best_moves {
                actions.push(Action::Migration { service: evicted, source: best_cloud, target: to });
            }
        }
        actions.push(Action::towards(service, current, best_cloud));
        log::debug!("{service}: highest utility {best_value:.3} on {best_cloud}");
        Ok(actions)
    }

    fn give_reward(&mut self, reward: f64) {
        self.tally.record(reward);
    }

    fn reward_tally(&self) -> Option<&RewardTally> {
        Some(&self.tally)
    }
}
