//! Prelude module - commonly used types for convenient import.
//!
//! Use `use atto_core::prelude::*;` to import all essential types.

pub use crate::{BundleId, Properties, PropertySource, PropertyValue, ServiceId};
pub use crate::{OBJECTCLASS, SERVICE_BUNDLE_ID, SERVICE_ID, SERVICE_RANKING};
