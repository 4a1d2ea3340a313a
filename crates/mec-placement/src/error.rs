//! Placement-subsystem error type.

use thiserror::Error;

use mec_core::{CoreError, ServiceId};
use mec_resource::ResourceError;

/// Errors produced by `mec-placement`.
///
/// `EmptyDecision`, `ForeignDecision` and `Resource(Overallocated)` also
/// describe why a migration decision was rejected during the dry run; the
/// independent strategy logs them and degrades the decision to a
/// `NoMigration` instead of failing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlacementError {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("no feasible assignment: {0}")]
    InfeasibleOptimization(String),

    #[error("migration decision for {0} is empty")]
    EmptyDecision(ServiceId),

    #[error("migration decision for {trigger} is malformed: {reason}")]
    ForeignDecision { trigger: ServiceId, reason: String },

    #[error("search gave up after {0} nodes without a feasible assignment")]
    NodeLimitExceeded(u64),

    #[error("invalid placement parameter: {0}")]
    InvalidParameter(String),
}

impl From<CoreError> for PlacementError {
    fn from(e: CoreError) -> Self {
        PlacementError::Resource(ResourceError::Core(e))
    }
}

pub type PlacementResult<T> = Result<T, PlacementError>;
