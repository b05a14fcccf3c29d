//! Atto Telemetry - Logging setup for the Atto component runtime.
//!
//! All Atto crates log through `tracing`. This crate installs the global
//! subscriber from a serializable [`LogConfig`]; the `atto-test` harness
//! installs [`LogConfig::for_tests`] through the same path.
//!
//! # Example
//!
//! ```rust,no_run
//! use atto_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), atto_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("atto_framework=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("framework host starting");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_logging};
