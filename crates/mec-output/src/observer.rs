//! `SimOutputObserver<W, G>`: bridges `SimObserver` to an `OutputWriter`.

use mec_placement::{Action, GlobalCostFunction};
use mec_sim::{SimObserver, SimView};

use crate::stats::{snapshot, summarize};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes a step summary every step and service
/// snapshots every `snapshot_interval` steps to any [`OutputWriter`].
///
/// Errors from the writer are stored internally because `SimObserver` methods
/// have no return value.  After `sim.run()` returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter, G: GlobalCostFunction> {
    writer:            W,
    cost:              G,
    /// 0 disables snapshots.
    snapshot_interval: u64,
    last_error:        Option<OutputError>,
}

impl<W: OutputWriter, G: GlobalCostFunction> SimOutputObserver<W, G> {
    /// Summaries every step, snapshots every step.
    pub fn new(writer: W, cost: G) -> Self {
        Self { writer, cost, snapshot_interval: 1, last_error: None }
    }

    /// Write service snapshots on steps `0, n, 2n, …`; `0` disables them.
    pub fn with_snapshot_interval(mut self, n: u64) -> Self {
        self.snapshot_interval = n;
        self
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter, G: GlobalCostFunction> SimObserver for SimOutputObserver<W, G> {
    fn after_step(&mut self, view: &SimView<'_>, actions: &[Action]) {
        let result = summarize(view, actions, &self.cost).and_then(|row| self.writer.write_step_summary(&row));
        self.store_err(result);

        let step = view.state.step.0;
        if self.snapshot_interval > 0 && step % self.snapshot_interval == 0 {
            let rows = snapshot(view);
            if !rows.is_empty() {
                let result = self.writer.write_service_snapshots(&rows);
                self.store_err(result);
            }
        }
    }

    fn on_sim_end(&mut self, _view: &SimView<'_>) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
