//! Cost model.
//!
//! A per-service cost splits into a *placement* (state) part, which depends
//! only on where the service sits relative to its user, and a *transition*
//! part charged for each migration.  Global costs aggregate per-service
//! costs over the whole population.
//!
//! | `CostKind`                | Placement cost                       | Transition cost          |
//! |---------------------------|--------------------------------------|--------------------------|
//! | `Latency`                 | `factor · latency`                   | `migration_cost`         |
//! | `SquaredLatency`          | `(factor · latency)²`                | `migration_cost`         |
//! | `PriorityWeightedLatency` | `factor · latency · priority`        | `migration_cost`         |
//! | `MigrationPlusLatency`    | `latency`                            | `latency + migration_cost` |
//! | `SlaViolation`            | `0` within budget, else `factor · priority · 10` | `migration_cost` |

use std::iter::Sum;
use std::ops::{Add, AddAssign, Div};

use mec_core::{CloudId, ServiceId};
use mec_resource::{CloudNetwork, Population, Service};

use crate::{Action, PlacementResult};

// ── Cost ──────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cost {
    pub placement:  f64,
    pub transition: f64,
}

impl Cost {
    pub const ZERO: Cost = Cost { placement: 0.0, transition: 0.0 };

    pub fn new(placement: f64, transition: f64) -> Self {
        Self { placement, transition }
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.placement + self.transition
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost::new(self.placement + rhs.placement, self.transition + rhs.transition)
    }
}

impl AddAssign for Cost {
    fn add_assign(&mut self, rhs: Cost) {
        self.placement += rhs.placement;
        self.transition += rhs.transition;
    }
}

impl Div<f64> for Cost {
    type Output = Cost;

    fn div(self, rhs: f64) -> Cost {
        Cost::new(self.placement / rhs, self.transition / rhs)
    }
}

impl Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost::ZERO, Add::add)
    }
}

// ── ServiceCostFunction ───────────────────────────────────────────────────────

/// Per-service cost policy.
///
/// Implementors provide the placement cost for a given latency and the
/// transition cost of a migration; the provided methods derive the static,
/// hypothetical and combined costs from those two.
pub trait ServiceCostFunction: Send + Sync {
    /// Placement cost of `service` when its user sees `latency`.
    fn cost_for_latency(&self, service: &Service, latency: f64) -> f64;

    /// Transition cost of one `Action::Migration`.
    fn migration_transition_cost(
        &self,
        network:    &CloudNetwork,
        population: &Population,
        migration:  &Action,
    ) -> PlacementResult<f64>;

    /// Placement cost of `service` where it currently sits.
    fn static_cost(&self, network: &CloudNetwork, population: &Population, service: ServiceId) -> PlacementResult<f64> {
        let latency = population.measured_latency(network, service)?;
        Ok(self.cost_for_latency(population.get_service(service)?, latency))
    }

    /// Placement cost `service` would have on `cloud`.  Nothing is moved.
    fn static_cost_at(
        &self,
        network:    &CloudNetwork,
        population: &Population,
        service:    ServiceId,
        cloud:      CloudId,
    ) -> PlacementResult<f64> {
        let user_node = population.user_node(service)?;
        let latency = network.latency(user_node, network.cloud(cloud)?.node());
        Ok(self.cost_for_latency(population.get_service(service)?, latency))
    }

    /// Static cost plus the transition cost of every migration in `actions`.
    fn calculate_cost(
        &self,
        network:    &CloudNetwork,
        population: &Population,
        service:    ServiceId,
        actions:    &[Action],
    ) -> PlacementResult<Cost> {
        let placement = self.static_cost(network, population, service)?;
        let mut transition = 0.0;
        for action in actions.iter().filter(|a| a.is_migration()) {
            transition += self.migration_transition_cost(network, population, action)?;
        }
        Ok(Cost::new(placement, transition))
    }
}

// ── CostKind ──────────────────────────────────────────────────────────────────

/// SLA violations cost this many times `factor · priority`.
const SLA_PENALTY: f64 = 10.0;

/// The built-in per-service cost policies.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CostKind {
    Latency { factor: f64, migration_cost: f64 },
    SquaredLatency { factor: f64, migration_cost: f64 },
    PriorityWeightedLatency { factor: f64, migration_cost: f64 },
    MigrationPlusLatency { migration_cost: f64 },
    SlaViolation { factor: f64, migration_cost: f64 },
}

impl CostKind {
    pub fn latency() -> Self {
        CostKind::Latency { factor: 1.0, migration_cost: 0.0 }
    }

    pub fn squared_latency() -> Self {
        CostKind::SquaredLatency { factor: 1.0, migration_cost: 5.0 }
    }

    pub fn priority_weighted_latency() -> Self {
        CostKind::PriorityWeightedLatency { factor: 1.0, migration_cost: 5.0 }
    }

    pub fn migration_plus_latency() -> Self {
        CostKind::MigrationPlusLatency { migration_cost: 0.0 }
    }

    pub fn sla_violation() -> Self {
        CostKind::SlaViolation { factor: 1.0, migration_cost: 5.0 }
    }

    fn migration_cost(&self) -> f64 {
        match *self {
            CostKind::Latency { migration_cost, .. }
            | CostKind::SquaredLatency { migration_cost, .. }
            | CostKind::PriorityWeightedLatency { migration_cost, .. }
            | CostKind::MigrationPlusLatency { migration_cost }
            | CostKind::SlaViolation { migration_cost, .. } => migration_cost,
        }
    }
}

impl Default for CostKind {
    fn default() -> Self {
        CostKind::latency()
    }
}

impl ServiceCostFunction for CostKind {
    fn cost_for_latency(&self, service: &Service, latency: f64) -> f64 {
        match *self {
            CostKind::Latency { factor, .. } => factor * latency,
            CostKind::SquaredLatency { factor, .. } => {
                let scaled = factor * latency;
                scaled * scaled
            }
            CostKind::PriorityWeightedLatency { factor, .. } => factor * latency * service.priority(),
            CostKind::MigrationPlusLatency { .. } => latency,
            CostKind::SlaViolation { factor, .. } => {
                if latency <= service.latency_requirement() {
                    0.0
                } else {
                    factor * service.priority() * SLA_PENALTY
                }
            }
        }
    }

    fn migration_transition_cost(
        &self,
        network:    &CloudNetwork,
        population: &Population,
        migration:  &Action,
    ) -> PlacementResult<f64> {
        match self {
            CostKind::MigrationPlusLatency { migration_cost } => {
                Ok(population.measured_latency(network, migration.service())? + migration_cost)
            }
            _ => Ok(self.migration_cost()),
        }
    }
}

// ── Global costs ──────────────────────────────────────────────────────────────

/// Cost of a whole step over every service.
pub trait GlobalCostFunction: Send + Sync {
    fn global_cost(&self, network: &CloudNetwork, population: &Population, actions: &[Action]) -> PlacementResult<Cost>;
}

/// Arithmetic mean of the per-service cost over every placed service, each
/// charged with its own actions.  Unplaced services have no latency and are
/// left out of both the sum and the count; zero if nothing is placed.
#[derive(Copy, Clone, Debug, Default)]
pub struct PerServiceAverageCost<C> {
    pub service_cost: C,
}

impl<C: ServiceCostFunction> PerServiceAverageCost<C> {
    pub fn new(service_cost: C) -> Self {
        Self { service_cost }
    }
}

impl<C: ServiceCostFunction> GlobalCostFunction for PerServiceAverageCost<C> {
    fn global_cost(&self, network: &CloudNetwork, population: &Population, actions: &[Action]) -> PlacementResult<Cost> {
        let mut per_service: rustc_hash::FxHashMap<ServiceId, Vec<Action>> = Default::default();
        for action in actions {
            per_service.entry(action.service()).or_default().push(*action);
        }

        let mut sum = Cost::ZERO;
        let mut count = 0usize;
        for service in population.services().filter(|s| s.is_placed()) {
            let own = per_service.get(&service.id()).map(Vec::as_slice).unwrap_or(&[]);
            sum += self.service_cost.calculate_cost(network, population, service.id(), own)?;
            count += 1;
        }
        Ok(if count == 0 { Cost::ZERO } else { sum / count as f64 })
    }
}
