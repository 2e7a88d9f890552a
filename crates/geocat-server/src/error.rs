//! Error types of the service layer.

use geocat_domain::DomainError;
use geocat_storage::StorageError;
use thiserror::Error;

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("missing parameter: {name}")]
    MissingParameter { name: &'static str },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<StorageError> for HandlerError {
    fn from(err: StorageError) -> Self {
        HandlerError::Domain(err.into())
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;

/// Error type for fixture loading.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse fixture: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("failed to store fixture rows: {0}")]
    Storage(#[from] StorageError),
}
