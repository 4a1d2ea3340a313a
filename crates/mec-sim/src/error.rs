use thiserror::Error;

use mec_core::{CoreError, UserId, Vec2};
use mec_network::NetworkError;
use mec_placement::PlacementError;
use mec_resource::{InvariantViolation, ResourceError};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("user {user} at {position:?} cannot reach any base station")]
    NoBaseStation { user: UserId, position: Vec2 },

    /// Fatal: the placement state is inconsistent.
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type SimResult<T> = Result<T, SimError>;
