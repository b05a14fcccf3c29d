//! Telemetry error types.

use thiserror::Error;

/// Errors from logging setup.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Invalid level, directive or target.
    #[error("configuration error: {0}")]
    Config(String),

    /// The global subscriber could not be installed, usually because one
    /// already is.
    #[error("initialization error: {0}")]
    Init(String),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
