//! Error types for the document store
//!
//! Missing documents and unresolved paths are not errors: reads report
//! them as `None`. Everything here is a failure the caller has to handle.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Value is not JSON serializable: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to acquire lock for key `{key}` after {waited:?} - concurrent write detected")]
    LockTimeout { key: String, waited: Duration },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Backup of `{key}` failed: {source}")]
    Backup {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl StoreError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io { path: path.into(), source }
    }

    /// True when the error is a lock acquisition timeout
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, StoreError::LockTimeout { .. })
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
