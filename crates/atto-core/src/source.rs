//! Read-only property source consumed by the framework.

use std::collections::HashMap;

use thiserror::Error;

use crate::property::{Properties, PropertyValue};

/// A named property was not present in the source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("property not found: \"{0}\"")]
pub struct PropertyNotFound(pub String);

/// Read-only lookup of framework properties (settings).
///
/// Bundles reach it through their context, e.g. a cache bundle reading its
/// connection parameters.
pub trait PropertySource: Send + Sync {
    /// Look up a property by name.
    fn property(&self, name: &str) -> Option<PropertyValue>;

    /// Look up a property, failing when it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyNotFound`] if `name` is not present.
    fn require(&self, name: &str) -> Result<PropertyValue, PropertyNotFound> {
        self.property(name)
            .ok_or_else(|| PropertyNotFound(name.to_string()))
    }
}

impl PropertySource for Properties {
    fn property(&self, name: &str) -> Option<PropertyValue> {
        self.get(name).cloned()
    }
}

impl PropertySource for HashMap<String, PropertyValue> {
    fn property(&self, name: &str) -> Option<PropertyValue> {
        self.get(name).cloned()
    }
}
