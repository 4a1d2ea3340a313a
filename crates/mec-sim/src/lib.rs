//! `mec-sim`: step loop orchestrator for mecsim.
//!
//! # Step loop
//!
//! ```text
//! for step in 0..config.total_steps:
//!   ① before_step: observers see the state before anything moves.
//!   ② move:        every user's movement model advances step_duration_secs.
//!   ③ attach:      every user attaches to the nearest base station
//!                  (RanModel; GridRanModel by default).
//!   ④ place:       PlacementStrategy::update_service_placements, once.
//!   ⑤ check:       CloudNetwork::check_invariants; a violation is fatal.
//!   ⑥ after_step:  observers see the new state and this step's actions.
//!   ⑦ advance:     SimState.step += 1.
//! ```
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use mec_core::SimConfig;
//! use mec_placement::{CostKind, IndependentStrategy, MigrationAlgorithm};
//! use mec_sim::{NoopObserver, SimBuilder};
//!
//! let strategy = IndependentStrategy::new(&network, MigrationAlgorithm::Never, CostKind::latency());
//! let mut sim = SimBuilder::new(SimConfig::default(), network, population, strategy).build()?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;


pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver, SimView};
pub use sim::{SimState, Simulation};
