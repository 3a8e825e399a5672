//! Error types for the oz-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates
/// and gives the CLI a single error to report.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Failed to read protocol file: {path}")]
    ProtocolFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Protocol validation failed: {0}")]
    Validation(String),

    #[error("Protocol has no {0} section")]
    MissingSection(&'static str),

    #[error("Sample '{sample}': {source}")]
    Sample {
        sample: String,
        source: oz_chem::ChemError,
    },

    #[error(transparent)]
    Chem(#[from] oz_chem::ChemError),

    #[error(transparent)]
    Labware(#[from] oz_labware::LabwareError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for oz-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<oz_project::ProjectError> for AppError {
    fn from(err: oz_project::ProjectError) -> Self {
        match err {
            oz_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Protocol(other.to_string()),
        }
    }
}

impl From<oz_project::ValidationError> for AppError {
    fn from(err: oz_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}
