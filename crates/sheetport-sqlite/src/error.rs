//! Store error types

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors that can occur reading or writing SQLite tables
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Table not found by name
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// A table cannot be created without columns
    #[error("Table '{0}' has no columns")]
    NoColumns(String),
}
