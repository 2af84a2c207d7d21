//! Error types for bjornwatch-core

use thiserror::Error;

/// Main error type for the bjornwatch-core library
///
/// Session lookups never produce this type: every network, decoding, and
/// HTTP failure is folded into [`SessionResponse::Failure`] so the poll
/// loop can keep running. `Error` covers the genuinely fallible local
/// operations (config, credential storage, export, logging setup).
///
/// [`SessionResponse::Failure`]: crate::types::SessionResponse
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// API client error
    #[error("API error: {0}")]
    Api(String),
}

/// Result type alias for bjornwatch-core
pub type Result<T> = std::result::Result<T, Error>;
