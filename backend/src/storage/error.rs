//! Errors raised by the record store adapters.

use thiserror::Error;

/// Failure of a storage backend operation
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or the write could not be completed
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The backend answered, but the payload could not be decoded
    #[error("malformed {what}: {detail}")]
    Malformed { what: String, detail: String },

    /// A roster save carried a version token that is no longer current
    #[error("roster for {school} changed since it was loaded (expected version {expected}, found {actual})")]
    Conflict {
        school: String,
        expected: String,
        actual: String,
    },
}

impl StorageError {
    pub fn malformed(what: impl Into<String>, detail: impl ToString) -> Self {
        StorageError::Malformed {
            what: what.into(),
            detail: detail.to_string(),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Unavailable(e.to_string())
    }
}

impl From<csv::Error> for StorageError {
    fn from(e: csv::Error) -> Self {
        match e.kind() {
            csv::ErrorKind::Io(_) => StorageError::Unavailable(e.to_string()),
            _ => StorageError::malformed("csv table", e),
        }
    }
}

impl From<serde_yaml::Error> for StorageError {
    fn from(e: serde_yaml::Error) -> Self {
        StorageError::malformed("yaml document", e)
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StorageError::malformed("remote payload", e)
        } else {
            StorageError::Unavailable(e.to_string())
        }
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
