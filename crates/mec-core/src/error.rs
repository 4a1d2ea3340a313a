//! Base error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`.

use thiserror::Error;

use crate::{CloudId, NodeId, ServiceId, UserId};

/// Lookup and configuration failures shared by all `mec-*` crates.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("cloud {0} not found")]
    CloudNotFound(CloudId),

    #[error("service {0} not found")]
    ServiceNotFound(ServiceId),

    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
