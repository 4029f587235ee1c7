//! Domain error taxonomy.
use crate::storage::traits::StorageError;

/// Errors surfaced by domain services.
///
/// File-step failures are deliberately absent: a failed upload or release
/// never aborts a committed aggregate mutation, so it travels on the result
/// (`attachment_error`) instead of through this type.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Malformed input, rejected before any persistence attempt
    #[error("{0}")]
    Validation(String),
    /// The entity does not exist or belongs to another owner; callers cannot
    /// tell which
    #[error("not found")]
    NotFound,
    /// Storage failure after bounded retries; no partial aggregate mutation
    /// remains visible
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<StorageError> for DomainError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => DomainError::NotFound,
            StorageError::Conflict => DomainError::Storage("transaction conflict".to_string()),
            StorageError::Backend(msg) => DomainError::Storage(msg),
        }
    }
}
