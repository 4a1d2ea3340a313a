//! Resource-model error type.

use thiserror::Error;

use mec_core::{CloudId, CoreError, NodeId, ServiceId, UserId};
use mec_network::NetworkError;

/// Errors produced by `mec-resource`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResourceError {
    /// Adding the service would push committed memory past capacity.  The
    /// cloud is left exactly as it was.
    #[error("{cloud} cannot host {requested} more memory ({free} free)")]
    Overallocated { cloud: CloudId, requested: f64, free: f64 },

    #[error("no path from {from} to {to}")]
    UnreachableTarget { from: NodeId, to: NodeId },

    #[error("service {0} is not placed on any cloud")]
    ServiceNotPlaced(ServiceId),

    #[error("user {0} is not attached to a base station")]
    UserNotAttached(UserId),

    #[error("node {0} already hosts a cloud")]
    DuplicateCloud(NodeId),

    #[error("more than one central cloud declared")]
    MultipleCentralClouds,

    #[error("network has no central cloud")]
    NoCentralCloud,

    #[error("cloud on {node} has invalid capacity {capacity}")]
    InvalidCapacity { node: NodeId, capacity: f64 },

    #[error("invalid service spec: {0}")]
    InvalidServiceSpec(String),

    #[error("trace movement needs at least one position")]
    EmptyTrace,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),
}

pub type ResourceResult<T> = Result<T, ResourceError>;
