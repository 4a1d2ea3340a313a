//! The `Simulation` struct and its step loop.

use mec_core::{SimClock, SimConfig, Step};
use mec_network::RanModel;
use mec_placement::{Action, PlacementStrategy};
use mec_resource::{CloudNetwork, Population};

use crate::{SimError, SimObserver, SimResult, SimView};

// ── SimState ──────────────────────────────────────────────────────────────────

/// Mutable run state that is not owned by the network or the population.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimState {
    /// The step about to run, or the one that just ran inside `after_step`.
    pub step:                  Step,
    pub cumulative_migrations: u64,
    pub cumulative_actions:    u64,
}

// ── Simulation ────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// One step:
///
/// 1. `before_step` observers.
/// 2. Move every user by `step_duration_secs`.
/// 3. Reattach every user to its nearest base station.
/// 4. Run the placement strategy once.
/// 5. Check the capacity and back-reference invariants; a violation aborts
///    the run.
/// 6. `after_step` observers.
/// 7. Advance the step counter.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Simulation {
    /// Global configuration (total steps, step duration, seed, …).
    pub config: SimConfig,

    /// Simulation clock: tracks the current step and maps to simulated time.
    pub clock: SimClock,

    pub(crate) state:      SimState,
    pub(crate) network:    CloudNetwork,
    pub(crate) population: Population,
    pub(crate) strategy:   Box<dyn PlacementStrategy>,
    pub(crate) ran:        Box<dyn RanModel>,
}

impl Simulation {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current step to `config.end_step()`.
    ///
    /// Use [`NoopObserver`][crate::NoopObserver] if you don't need callbacks.
    pub fn run<O: SimObserver + ?Sized>(&mut self, observer: &mut O) -> SimResult<()> {
        log::info!(
            "running {} steps with {} users and {} clouds using {}",
            self.config.total_steps.saturating_sub(self.state.step.0),
            self.population.num_users(),
            self.network.cloud_count(),
            self.strategy.name(),
        );
        while self.state.step < self.config.end_step() {
            self.step(observer)?;
        }
        observer.on_sim_end(&self.view());
        log::info!(
            "finished at {}: {} actions, {} migrations",
            self.clock,
            self.state.cumulative_actions,
            self.state.cumulative_migrations,
        );
        Ok(())
    }

    /// Run exactly `n` steps from the current position (ignores `end_step`).
    ///
    /// Useful for tests and incremental stepping.
    pub fn run_steps<O: SimObserver + ?Sized>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer)?;
        }
        Ok(())
    }

    /// Run a single step and return the actions the strategy took.
    pub fn step<O: SimObserver + ?Sized>(&mut self, observer: &mut O) -> SimResult<Vec<Action>> {
        observer.before_step(&self.view());

        let dt = self.config.step_duration_secs;
        self.population.step(dt);
        self.reattach_users()?;

        let actions = self
            .strategy
            .update_service_placements(&mut self.network, &mut self.population, dt)?;
        self.network.check_invariants(&self.population)?;

        let migrations = actions.iter().filter(|a| a.is_migration()).count() as u64;
        self.state.cumulative_migrations += migrations;
        self.state.cumulative_actions += actions.len() as u64;
        log::debug!("{}: {} actions, {} migrations", self.state.step, actions.len(), migrations);

        observer.after_step(&self.view(), &actions);

        self.state.step = self.state.step + 1;
        self.clock.advance();
        Ok(actions)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn view(&self) -> SimView<'_> {
        SimView {
            state:      &self.state,
            clock:      &self.clock,
            network:    &self.network,
            population: &self.population,
        }
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn network(&self) -> &CloudNetwork {
        &self.network
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Add or remove users between steps.  Removing a user must go through
    /// `Population::remove_user` with [`Simulation::network_and_population`].
    pub fn population_mut(&mut self) -> &mut Population {
        &mut self.population
    }

    /// Split borrow for operations that touch both, such as
    /// `Population::remove_user`.
    pub fn network_and_population(&mut self) -> (&mut CloudNetwork, &mut Population) {
        (&mut self.network, &mut self.population)
    }

    pub fn strategy(&self) -> &dyn PlacementStrategy {
        self.strategy.as_ref()
    }

    // ── Step phases ───────────────────────────────────────────────────────

    fn reattach_users(&mut self) -> SimResult<()> {
        for user in self.population.users_mut() {
            let position = user.position();
            match self.ran.nearest_base_station(position, &[]) {
                Some(bs) => user.attach(bs),
                None => return Err(SimError::NoBaseStation { user: user.id(), position }),
            }
        }
        Ok(())
    }
}
