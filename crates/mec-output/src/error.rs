//! Error types for mec-output.

use thiserror::Error;

use mec_placement::PlacementError;
use mec_resource::ResourceError;

/// Errors that can occur when computing or writing simulation output.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("cost evaluation failed: {0}")]
    Placement(#[from] PlacementError),

    #[error("statistics failed: {0}")]
    Resource(#[from] ResourceError),
}

/// Alias for `Result<T, OutputError>`.
pub type OutputResult<T> = Result<T, OutputError>;
