//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `step_summaries.csv`
//! - `service_snapshots.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{OutputResult, ServiceSnapshotRow, StepSummaryRow};

pub const STEP_SUMMARY_HEADER: [&str; 10] = [
    "step",
    "elapsed_secs",
    "global_cost",
    "placement_cost",
    "transition_cost",
    "dissatisfaction_rate",
    "migrations",
    "mean_latency",
    "services",
    "services_at_central",
];

pub const SERVICE_SNAPSHOT_HEADER: [&str; 7] =
    ["service_id", "user_id", "step", "base_station", "cloud", "latency", "requirement_met"];

/// Writes simulation output to two CSV files.
pub struct CsvWriter {
    summaries: Writer<File>,
    snapshots: Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Create (or truncate) the two CSV files in `dir` and write the header
    /// rows.  `dir` must exist.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut summaries = Writer::from_path(dir.join("step_summaries.csv"))?;
        summaries.write_record(STEP_SUMMARY_HEADER)?;

        let mut snapshots = Writer::from_path(dir.join("service_snapshots.csv"))?;
        snapshots.write_record(SERVICE_SNAPSHOT_HEADER)?;

        Ok(Self {
            summaries,
            snapshots,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_step_summary(&mut self, row: &StepSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.step.to_string(),
            row.elapsed_secs.to_string(),
            row.global_cost().to_string(),
            row.placement_cost.to_string(),
            row.transition_cost.to_string(),
            row.dissatisfaction_rate.to_string(),
            row.migrations.to_string(),
            row.mean_latency.to_string(),
            row.services.to_string(),
            row.services_at_central.to_string(),
        ])?;
        Ok(())
    }

    fn write_service_snapshots(&mut self, rows: &[ServiceSnapshotRow]) -> OutputResult<()> {
        for row in rows {
            self.snapshots.write_record(&[
                row.service_id.to_string(),
                row.user_id.to_string(),
                row.step.to_string(),
                row.base_station.to_string(),
                row.cloud.to_string(),
                row.latency.map(|l| l.to_string()).unwrap_or_default(),
                (row.requirement_met as u8).to_string(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.summaries.flush()?;
        self.snapshots.flush()?;
        Ok(())
    }
}
