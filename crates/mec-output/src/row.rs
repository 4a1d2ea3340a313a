//! Plain data row types written by output backends.

/// Aggregate statistics for one simulation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSummaryRow {
    pub step:                 u64,
    pub elapsed_secs:         f64,
    /// Placement part of the global cost.
    pub placement_cost:       f64,
    /// Transition part of the global cost.
    pub transition_cost:      f64,
    /// Share of placed services whose latency requirement is not met.
    pub dissatisfaction_rate: f64,
    pub migrations:           u64,
    /// Mean measured latency over placed services; 0 if none are placed.
    pub mean_latency:         f64,
    pub services:             u64,
    pub services_at_central:  u64,
}

impl StepSummaryRow {
    #[inline]
    pub fn global_cost(&self) -> f64 {
        self.placement_cost + self.transition_cost
    }
}

/// One service's placement at a given step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceSnapshotRow {
    pub service_id:      u32,
    pub user_id:         u32,
    pub step:            u64,
    /// `u32::MAX` if the user is not attached.
    pub base_station:    u32,
    /// `u32::MAX` if the service is not placed.
    pub cloud:           u32,
    /// `None` if the service is not placed or its user is not attached.
    pub latency:         Option<f64>,
    pub requirement_met: bool,
}
