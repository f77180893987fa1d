//! Error types for dirdb
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using DbError
pub type Result<T> = std::result::Result<T, DbError>;

/// Unified error type for dirdb operations
#[derive(Debug, Error)]
pub enum DbError {
    // -------------------------------------------------------------------------
    // Input Errors
    // -------------------------------------------------------------------------
    #[error("Validation error: {0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Database \"{0}\" not found")]
    DatabaseNotFound(String),

    #[error("Table \"{table}\" not found in database \"{database}\"")]
    TableNotFound { database: String, table: String },

    #[error("Record with ID {id} not found in table \"{table}\" in database \"{database}\"")]
    RecordNotFound {
        database: String,
        table: String,
        id: String,
    },

    // -------------------------------------------------------------------------
    // Content Errors
    // -------------------------------------------------------------------------
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Table \"{0}\" has no records to format")]
    EmptyTable(String),

    // -------------------------------------------------------------------------
    // Filesystem Errors
    // -------------------------------------------------------------------------
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    /// Whether the caller can carry on after this error.
    ///
    /// Lookup and input failures leave the table file untouched. Parse and
    /// I/O failures mean the on-disk array can no longer be trusted.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            DbError::Parse(_) | DbError::Serialization(_) | DbError::Io(_)
        )
    }

    /// True for any of the not-found kinds
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DbError::DatabaseNotFound(_)
                | DbError::TableNotFound { .. }
                | DbError::RecordNotFound { .. }
        )
    }
}
