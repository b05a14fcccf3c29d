//! Reserved service property keys.
//!
//! The registry injects these into every registered service's property
//! snapshot. Caller-supplied values are overwritten, except
//! [`SERVICE_RANKING`] which is only defaulted when absent.

/// Ordered set of class names the service is published under.
pub const OBJECTCLASS: &str = "objectClass";

/// Registry-assigned service identifier.
pub const SERVICE_ID: &str = "service.id";

/// Identifier of the bundle that registered the service.
pub const SERVICE_BUNDLE_ID: &str = "service.bundleid";

/// Integer priority; higher rankings sort first.
pub const SERVICE_RANKING: &str = "service.ranking";

const RESERVED_KEYS: &[&str] = &[OBJECTCLASS, SERVICE_ID, SERVICE_BUNDLE_ID, SERVICE_RANKING];

/// Whether `key` is one of the registry-managed property keys.
#[must_use]
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}
