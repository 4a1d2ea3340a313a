//! Simulation observer trait for progress reporting and data collection.

use mec_core::SimClock;
use mec_placement::Action;
use mec_resource::{CloudNetwork, Population};

use crate::SimState;

/// Read-only snapshot of the simulation handed to observers.
#[derive(Copy, Clone)]
pub struct SimView<'a> {
    pub state:      &'a SimState,
    pub clock:      &'a SimClock,
    pub network:    &'a CloudNetwork,
    pub population: &'a Population,
}

/// Callbacks invoked by [`Simulation::run`][crate::Simulation::run] around
/// every step.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: migration counter
///
/// ```rust,ignore
/// struct Migrations(u64);
///
/// impl SimObserver for Migrations {
///     fn after_step(&mut self, _view: &SimView<'_>, actions: &[Action]) {
///         self.0 += actions.iter().filter(|a| a.is_migration()).count() as u64;
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each step, before users move.
    fn before_step(&mut self, _view: &SimView<'_>) {}

    /// Called after the placement strategy ran and the invariants held.
    ///
    /// `actions` are every action the strategy took this step.  The view's
    /// `state.step` is still the step that just ran.
    fn after_step(&mut self, _view: &SimView<'_>, _actions: &[Action]) {}

    /// Called once after the final step completes.
    fn on_sim_end(&mut self, _view: &SimView<'_>) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Both observers, first then second.
impl<A: SimObserver, B: SimObserver> SimObserver for (A, B) {
    fn before_step(&mut self, view: &SimView<'_>) {
        self.0.before_step(view);
        self.1.before_step(view);
    }

    fn after_step(&mut self, view: &SimView<'_>, actions: &[Action]) {
        self.0.after_step(view, actions);
        self.1.after_step(view, actions);
    }

    fn on_sim_end(&mut self, view: &SimView<'_>) {
        self.0.on_sim_end(view);
        self.1.on_sim_end(view);
    }
}

impl<O: SimObserver + ?Sized> SimObserver for &mut O {
    fn before_step(&mut self, view: &SimView<'_>) {
        (**self).before_step(view);
    }

    fn after_step(&mut self, view: &SimView<'_>, actions: &[Action]) {
        (**self).after_step(view, actions);
    }

    fn on_sim_end(&mut self, view: &SimView<'_>) {
        (**self).on_sim_end(view);
    }
}
