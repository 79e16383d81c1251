//! Store error types.

use thiserror::Error;

/// Errors that can occur during object store operations.
///
/// Absence of an object is never an error: `find` returns `Ok(None)` and
/// `delete` returns `Ok(false)`. These variants cover genuine storage
/// failures only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Underlying storage system failure (database, file system, lock).
    #[error("I/O error: {0}")]
    Io(String),

    /// Stored data could not be interpreted.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}
