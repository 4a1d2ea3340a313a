//! Simulation time model.
//!
//! # Design
//!
//! Time advances in discrete `Step`s.  Every step moves all users by
//! `step_duration_secs` of simulated time, reattaches them, and runs the
//! placement strategy once.  The mapping to simulated seconds is held in
//! `SimClock`:
//!
//!   elapsed_secs = step * step_duration_secs
//!
//! The default step duration is 1 s, matching the movement model speeds
//! (units per second).

use std::fmt;

// ── Step ──────────────────────────────────────────────────────────────────────

/// An absolute simulation step counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step(pub u64);

impl Step {
    pub const ZERO: Step = Step(0);

    /// Return the step `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Step {
        Step(self.0 + n)
    }

    /// Steps elapsed from `earlier` to `self`.
    ///
    /// # Panics
    /// Panics in debug mode if `earlier > self`.
    #[inline]
    pub fn since(self, earlier: Step) -> u64 {
        self.0 - earlier.0
    }
}

impl std::ops::Add<u64> for Step {
    type Output = Step;
    #[inline]
    fn add(self, rhs: u64) -> Step {
        Step(self.0 + rhs)
    }
}

impl std::ops::Sub for Step {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Step) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Tracks the current step and converts it to simulated seconds.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Simulated seconds per step.
    pub step_duration_secs: f64,
    /// The current step, advanced by `SimClock::advance()` after each step.
    pub current_step: Step,
}

impl SimClock {
    pub fn new(step_duration_secs: f64) -> Self {
        Self { step_duration_secs, current_step: Step::ZERO }
    }

    /// Advance the clock by one step.
    #[inline]
    pub fn advance(&mut self) {
        self.current_step = Step(self.current_step.0 + 1);
    }

    /// Elapsed simulated seconds since step 0.
    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        self.current_step.0 as f64 * self.step_duration_secs
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1} s)", self.current_step, self.elapsed_secs())
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
///
/// Typically loaded from a JSON file by the application crate (with the
/// `serde` feature) and handed to `SimBuilder`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Total steps to simulate.
    pub total_steps: u64,

    /// Simulated seconds per step, passed to `MovementModel::step`.
    /// Default: 1.0.
    pub step_duration_secs: f64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Grid resolution (cells per axis) of the RAN attachment index.
    /// Default: 40.
    pub ran_grid_resolution: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            total_steps:         100,
            step_duration_secs:  1.0,
            seed:                42,
            ran_grid_resolution: 40,
        }
    }
}

impl SimConfig {
    /// The step at which the simulation ends (exclusive upper bound).
    #[inline]
    pub fn end_step(&self) -> Step {
        Step(self.total_steps)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.step_duration_secs)
    }

    /// Reject configurations the simulation loop cannot run with.
    pub fn validate(&self) -> crate::CoreResult<()> {
        if !(self.step_duration_secs.is_finite() && self.step_duration_secs > 0.0) {
            return Err(crate::CoreError::Config(format!(
                "step_duration_secs must be positive, got {}",
                self.step_duration_secs
            )));
        }
        if self.ran_grid_resolution < 2 {
            return Err(crate::CoreError::Config(format!(
                "ran_grid_resolution must be at least 2, got {}",
                self.ran_grid_resolution
            )));
        }
        Ok(())
    }
}
