// src/error.rs

//! Error types for respin

use thiserror::Error;

/// Errors that abort the current unit of work
///
/// Transient unavailability (repository data not published yet) and
/// unsatisfiable dependencies are not errors; they are reported through
/// `Option` returns and persisted resolution results respectively.
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite failure, including constraint violations
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Initialization error: {0}")]
    InitError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    /// Repository data that cannot be decoded
    #[error("Malformed repository data: {0}")]
    RepoDataError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The universe solver returned something unusable
    #[error("Solver error: {0}")]
    SolverError(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

/// Result type alias for respin operations
pub type Result<T> = std::result::Result<T, Error>;
