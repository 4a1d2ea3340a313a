//! Network-subsystem error type.

use thiserror::Error;

use mec_core::NodeId;

/// Errors produced by `mec-network`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NetworkError {
    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),

    #[error("connection from {0} to itself is not allowed")]
    SelfLoop(NodeId),

    #[error("connection {from} -> {to} has invalid weight {weight}")]
    InvalidWeight { from: NodeId, to: NodeId, weight: f64 },

    #[error("base station {0} has invalid access latency {1}")]
    InvalidAccessLatency(NodeId, f64),

    #[error("RAN grid resolution must be at least 2, got {0}")]
    InvalidGridResolution(usize),

    #[error("network has no positioned base stations")]
    NoBaseStations,
}

pub type NetworkResult<T> = Result<T, NetworkError>;
