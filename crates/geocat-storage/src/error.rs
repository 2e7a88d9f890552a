//! Storage error types.

use thiserror::Error;

use crate::model::{GroupId, MetadataId, OperationId, UserId};

/// Storage-specific errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// User not found.
    #[error("user not found: {user_id}")]
    UserNotFound { user_id: UserId },

    /// Group not found.
    #[error("group not found: {group_id}")]
    GroupNotFound { group_id: GroupId },

    /// Metadata record not found.
    #[error("metadata not found: {metadata_id}")]
    MetadataNotFound { metadata_id: MetadataId },

    /// Operation not found.
    #[error("operation not found: {operation_id}")]
    OperationNotFound { operation_id: OperationId },

    /// Another row already holds a unique value.
    #[error("duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    /// Invalid input error.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl StorageError {
    /// True for the keyed-lookup misses, which callers may treat as absence.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::UserNotFound { .. }
                | StorageError::GroupNotFound { .. }
                | StorageError::MetadataNotFound { .. }
                | StorageError::OperationNotFound { .. }
        )
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
