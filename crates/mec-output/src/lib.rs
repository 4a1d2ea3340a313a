//! `mec-output`: per-step statistics and simulation output writers for
//! mecsim.
//!
//! | Type                   | Role                                                 |
//! |------------------------|------------------------------------------------------|
//! | [`StatisticsObserver`] | in-memory `StepSummaryRow` per step                  |
//! | [`SimOutputObserver`]  | streams summaries and snapshots to an `OutputWriter` |
//! | [`CsvWriter`]          | `step_summaries.csv`, `service_snapshots.csv`        |
//!
//! A step summary holds the global cost (placement and transition parts),
//! the dissatisfaction rate, the number of migrations, the mean latency, the
//! number of services and how many of them sit on the central cloud.
//!
//! # Usage
//!
//! ```rust,ignore
//! use mec_output::{CsvWriter, SimOutputObserver};
//! use mec_placement::{CostKind, PerServiceAverageCost};
//!
//! let writer = CsvWriter::new(Path::new("./output")).unwrap();
//! let mut obs = SimOutputObserver::new(writer, PerServiceAverageCost::new(CostKind::latency()));
//! sim.run(&mut obs).unwrap();
//! obs.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod stats;
pub mod writer;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimOutputObserver;
pub use row::{ServiceSnapshotRow, StepSummaryRow};
pub use stats::StatisticsObserver;
pub use writer::OutputWriter;
