//! Error types for campscope-core

use thiserror::Error;

/// Main error type for the campscope-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Connection failure, reported with target details but never credentials
    #[error("connection to {host}:{port}/{database} failed: {message}")]
    Connection {
        host: String,
        port: u16,
        database: String,
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid user input, caught at the boundary before any work starts
    #[error("{0}")]
    Validation(String),

    /// A table name with no registry entry
    #[error("unknown change-log table: {0}")]
    UnknownTable(String),

    /// Model API error
    #[error("model error: {0}")]
    Model(String),
}

/// Result type alias for campscope-core
pub type Result<T> = std::result::Result<T, Error>;
