//! Prelude module - commonly used types for convenient import.
//!
//! Use `use atto_test::prelude::*;` to import all test helpers.

pub use crate::fixtures::*;
pub use crate::harness::*;
pub use crate::mocks::*;
