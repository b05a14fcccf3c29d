//! Prelude module - commonly used types for convenient import.
//!
//! Use `use atto_config::prelude::*;` to import all essential types.

pub use crate::{ConfigError, ConfigResult, INSTALLED_BUNDLES, Settings};
