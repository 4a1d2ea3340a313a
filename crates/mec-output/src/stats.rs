//! Per-step statistics.

use mec_placement::{Action, GlobalCostFunction};
use mec_sim::{SimObserver, SimView};

use crate::{OutputError, OutputResult, ServiceSnapshotRow, StepSummaryRow};

/// Aggregate the state in `view` after a step that took `actions`.
pub fn summarize(view: &SimView<'_>, actions: &[Action], cost: &dyn GlobalCostFunction) -> OutputResult<StepSummaryRow> {
    let (network, population) = (view.network, view.population);
    let global = cost.global_cost(network, population, actions)?;

    let mut placed = 0u64;
    let mut dissatisfied = 0u64;
    let mut at_central = 0u64;
    let mut latency_sum = 0.0;
    for service in population.services() {
        let Some(cloud) = service.cloud() else {
            continue;
        };
        let latency = population.measured_latency(network, service.id())?;
        placed += 1;
        latency_sum += latency;
        if latency > service.latency_requirement() {
            dissatisfied += 1;
        }
        if network.is_central(cloud) {
            at_central += 1;
        }
    }

    let share = |n: u64| if placed == 0 { 0.0 } else { n as f64 / placed as f64 };
    Ok(StepSummaryRow {
        step:                 view.state.step.0,
        elapsed_secs:         view.clock.elapsed_secs(),
        placement_cost:       global.placement,
        transition_cost:      global.transition,
        dissatisfaction_rate: share(dissatisfied),
        migrations:           actions.iter().filter(|a| a.is_migration()).count() as u64,
        mean_latency:         if placed == 0 { 0.0 } else { latency_sum / placed as f64 },
        services:             population.num_services() as u64,
        services_at_central:  at_central,
    })
}

/// One row per service in `view`, in ascending service id order.
pub fn snapshot(view: &SimView<'_>) -> Vec<ServiceSnapshotRow> {
    let (network, population) = (view.network, view.population);
    population
        .services()
        .map(|service| {
            let base_station = population.owner(service.id()).ok().and_then(|u| u.base_station());
            let latency = match (service.is_placed(), base_station) {
                (true, Some(node)) => service.measured_latency(network, node).ok(),
                _ => None,
            };
            ServiceSnapshotRow {
                service_id:      service.id().0,
                user_id:         service.owner().0,
                step:            view.state.step.0,
                base_station:    base_station.map_or(u32::MAX, |n| n.0),
                cloud:           service.cloud().map_or(u32::MAX, |c| c.0),
                latency,
                requirement_met: latency.is_some_and(|l| l <= service.latency_requirement()),
            }
        })
        .collect()
}

// ── StatisticsObserver ────────────────────────────────────────────────────────

/// A [`SimObserver`] that keeps a [`StepSummaryRow`] per step in memory.
///
/// The first evaluation error is stored and later steps are skipped; check
/// with [`take_error`][Self::take_error] after the run.
pub struct StatisticsObserver<G: GlobalCostFunction> {
    cost:       G,
    rows:       Vec<StepSummaryRow>,
    last_error: Option<OutputError>,
}

impl<G: GlobalCostFunction> StatisticsObserver<G> {
    pub fn new(cost: G) -> Self {
        Self { cost, rows: Vec::new(), last_error: None }
    }

    pub fn rows(&self) -> &[StepSummaryRow] {
        &self.rows
    }

    pub fn total_migrations(&self) -> u64 {
        self.rows.iter().map(|r| r.migrations).sum()
    }

    /// Mean global cost over all recorded steps.
    pub fn mean_global_cost(&self) -> Option<f64> {
        self.mean_of(StepSummaryRow::global_cost)
    }

    pub fn mean_dissatisfaction_rate(&self) -> Option<f64> {
        self.mean_of(|r| r.dissatisfaction_rate)
    }

    pub fn mean_latency(&self) -> Option<f64> {
        self.mean_of(|r| r.mean_latency)
    }

    /// Take the stored error (if any) after `sim.run()` returns.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    fn mean_of(&self, f: impl Fn(&StepSummaryRow) -> f64) -> Option<f64> {
        (!self.rows.is_empty()).then(|| self.rows.iter().map(f).sum::<f64>() / self.rows.len() as f64)
    }
}

impl<G: GlobalCostFunction> SimObserver for StatisticsObserver<G> {
    fn after_step(&mut self, view: &SimView<'_>, actions: &[Action]) {
        if self.last_error.is_some() {
            return;
        }
        match summarize(view, actions, &self.cost) {
            Ok(row) => self.rows.push(row),
            Err(e) => {
                log::warn!("statistics stopped at {}: {e}", view.state.step);
                self.last_error = Some(e);
            }
        }
    }
}
