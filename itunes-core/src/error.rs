//! Common error types for the library engine

use thiserror::Error;

/// Common result type for itunes-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds surfaced by the library engine.
///
/// Variant names match the error taxonomy in the design: each carries
/// enough context for a front-end to translate it into its own error
/// surface (exit code, JSON-RPC error object, ...).
#[derive(Error, Debug)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("refresh already in progress")]
    Busy,

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("automation script failed: {0}")]
    ScriptFailed(String),

    #[error("store is corrupt or at an unknown schema version: {0}")]
    Corrupt(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the error is a sign that the caller supplied bad input,
    /// as opposed to an environment/store failure.
    pub fn is_caller_correctable(&self) -> bool {
        matches!(self, Error::InvalidArgument(_) | Error::NotFound(_))
    }
}
