//! Domain error types for lookups and permission resolution.

use geocat_storage::{MetadataId, StorageError};
use thiserror::Error;

/// Domain-specific errors.
///
/// Absence is not an error here: lookups on missing rows return `None` or
/// an empty collection. The one hard miss is the metadata record a
/// permission report is requested for.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The metadata record a report was requested for does not exist.
    #[error("metadata not found: {metadata_id}")]
    MetadataNotFound { metadata_id: String },

    /// An identifier could not be parsed.
    #[error("invalid identifier: {value}")]
    InvalidIdentifier { value: String },

    /// The store failed to answer.
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl DomainError {
    pub fn metadata_not_found(metadata_id: MetadataId) -> Self {
        DomainError::MetadataNotFound {
            metadata_id: metadata_id.to_string(),
        }
    }
}

impl From<StorageError> for DomainError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::MetadataNotFound { metadata_id } => {
                DomainError::metadata_not_found(metadata_id)
            }
            other => DomainError::Storage {
                message: other.to_string(),
            },
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
