//! Errors surfaced by domain services.

use thiserror::Error;
use tracing::warn;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Student {student_id} not found in {school}")]
    StudentNotFound { school: String, student_id: String },

    #[error("{0}")]
    Validation(String),

    #[error("Roster for {school} was changed by someone else, please retry")]
    ConcurrentModification { school: String },

    #[error("Unknown school: {0}")]
    UnknownSchool(String),

    #[error("Not logged in")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),
}

impl TrackerError {
    pub fn validation(message: impl Into<String>) -> Self {
        TrackerError::Validation(message.into())
    }
}

impl From<StorageError> for TrackerError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Conflict { school, .. } => TrackerError::ConcurrentModification { school },
            other => {
                warn!("Storage failure: {}", other);
                TrackerError::StorageUnavailable(other.to_string())
            }
        }
    }
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;
