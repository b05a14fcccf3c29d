//! Prelude module - commonly used types for convenient import.
//!
//! Use `use atto_filter::prelude::*;` to import all essential types.

pub use crate::{Filter, FilterError, FilterInput, FilterResult, compile};
