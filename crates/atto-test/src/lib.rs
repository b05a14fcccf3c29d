//! Atto Test - Shared test utilities for the Atto component runtime.
//!
//! Recording activators, framework fixtures and test logging, used by the
//! Atto crates as a dev-dependency.
//!
//! # Usage
//!
//! ```rust,ignore
//! use atto_test::{CallLog, RecordingActivator, test_framework};
//!
//! #[tokio::test]
//! async fn starts_in_order() {
//!     let log = CallLog::new();
//!     let framework = test_framework([
//!         RecordingActivator::new("a", &log),
//!         RecordingActivator::new("b", &log),
//!     ]);
//!
//!     framework.start().await.unwrap();
//!     assert_eq!(log.entries(), ["start:a", "start:b"]);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
