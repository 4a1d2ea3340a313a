//! `mec-placement`: deciding where services run.
//!
//! # Crate layout
//!
//! | Module           | Contents                                                        |
//! |------------------|-----------------------------------------------------------------|
//! | [`action`]       | `Action`: initial placement, migration, no-migration           |
//! | [`cost`]         | `Cost`, `ServiceCostFunction`, `CostKind`, `PerServiceAverageCost` |
//! | [`candidates`]   | `CandidateSelector` + k-nearest base-station / cloud selectors  |
//! | [`trigger`]      | `MigrationTrigger`: when a placed service is re-evaluated      |
//! | [`utility`]      | `UtilityFunction` for the highest-utility policy                |
//! | [`displacement`] | eviction options and greedy / exact eviction plans              |
//! | [`policy`]       | `MigrationInstance`, `MigrationAlgorithm`, `PlacementContext`   |
//! | [`optimizer`]    | `Optimizer` trait, `BranchAndBoundOptimizer`                    |
//! | [`strategy`]     | `PlacementStrategy` + independent, static-greedy, myopic-optimal |
//! | [`error`]        | `PlacementError`, `PlacementResult<T>`                          |
//!
//! # Flow
//!
//! The simulation calls [`PlacementStrategy::update_service_placements`]
//! once per step.  The independent strategy asks the [`MigrationInstance`]
//! of each service's current cloud for a decision, validates it, applies it
//! through `Population::place_service`, and feeds back `−cost` as reward.

pub mod action;
pub mod candidates;
pub mod cost;
pub mod displacement;
pub mod error;
pub mod optimizer;
pub mod policy;
pub mod strategy;
pub mod trigger;
pub mod utility;

#[cfg(test)]
mod tests;

pub use action::Action;
pub use candidates::{CandidateSelector, KnnBaseStationSelector, KnnCloudSelector};
pub use cost::{Cost, CostKind, GlobalCostFunction, PerServiceAverageCost, ServiceCostFunction};
pub use displacement::{Displacement, DisplacementOption, DisplacementPlan};
pub use error::{PlacementError, PlacementResult};
pub use optimizer::{Assignment, AssignmentProblem, BranchAndBoundOptimizer, Optimizer};
pub use policy::{
    DistanceMeasure, InstanceFactory, MigrationAlgorithm, MigrationInstance, PlacementContext, RewardTally,
};
pub use strategy::{
    IndependentStrategy, InitialPlacement, MyopicOptimalStrategy, PlacementStrategy, StaticGreedyStrategy,
};
pub use trigger::MigrationTrigger;
pub use utility::UtilityFunction;
