//! Consistency violations found by `CloudNetwork::check_invariants`.

use thiserror::Error;

use mec_core::{CloudId, ServiceId};

/// A broken capacity or back-reference invariant.  Always a bug in the
/// caller of the placement API; the simulation aborts on it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("{cloud}: committed {committed} outside [0, {capacity}]")]
    CapacityExceeded { cloud: CloudId, committed: f64, capacity: f64 },

    #[error("{cloud}: committed {committed} != hosted sum {hosted}")]
    CommittedMismatch { cloud: CloudId, committed: f64, hosted: f64 },

    #[error("{cloud} hosts unknown service {service}")]
    UnknownHostedService { cloud: CloudId, service: ServiceId },

    #[error("{cloud} hosts {service}, which points to {points_to:?}")]
    BackReferenceMismatch { cloud: CloudId, service: ServiceId, points_to: Option<CloudId> },

    #[error("{service} points to {cloud}, which does not host it")]
    MissingHosting { service: ServiceId, cloud: CloudId },
}
