//! Bundle and service identifiers.
//!
//! Both identifier kinds are allocated by monotonically increasing counters
//! and are never reused within one framework instance. Allocation stops at
//! `i64::MAX` so every identifier fits an integer property.

use std::fmt;

use serde::{Deserialize, Serialize};

const MAX_RAW: u64 = i64::MAX.unsigned_abs();

fn step(raw: u64) -> Option<u64> {
    raw.checked_add(1).filter(|next| *next <= MAX_RAW)
}

/// Identifier of an installed bundle.
///
/// `0` is reserved for the framework itself; ordinary bundles start at `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleId(u64);

impl BundleId {
    /// The framework's own bundle identifier.
    pub const FRAMEWORK: Self = Self(0);

    /// First identifier handed out to an installed bundle.
    pub const FIRST: Self = Self(1);

    /// Largest identifier ever allocated.
    pub const MAX: Self = Self(MAX_RAW);

    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Whether this identifies the framework bundle.
    #[must_use]
    pub const fn is_framework(self) -> bool {
        self.0 == 0
    }

    /// The identifier following this one, or `None` past [`Self::MAX`].
    #[must_use]
    pub fn next(self) -> Option<Self> {
        step(self.0).map(Self)
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<BundleId> for u64 {
    fn from(id: BundleId) -> Self {
        id.0
    }
}

/// Identifier of a registered service, unique for the lifetime of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(u64);

impl ServiceId {
    /// First identifier handed out by a registry.
    pub const FIRST: Self = Self(1);

    /// Largest identifier ever allocated.
    pub const MAX: Self = Self(MAX_RAW);

    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The identifier following this one, or `None` past [`Self::MAX`].
    #[must_use]
    pub fn next(self) -> Option<Self> {
        step(self.0).map(Self)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ServiceId> for u64 {
    fn from(id: ServiceId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framework_bundle_is_zero() {
        assert!(BundleId::FRAMEWORK.is_framework());
        assert!(!BundleId::FIRST.is_framework());
        assert_eq!(BundleId::FIRST.get(), 1);
    }

    #[test]
    fn next_increments_and_detects_overflow() {
        assert_eq!(ServiceId::FIRST.next(), Some(ServiceId::new(2)));
        assert_eq!(BundleId::new(u64::MAX).next(), None);
        assert_eq!(ServiceId::new(u64::MAX).next(), None);
    }

    #[test]
    fn allocation_stops_at_the_signed_range() {
        assert_eq!(ServiceId::MAX.get(), 9_223_372_036_854_775_807);
        assert_eq!(ServiceId::new(MAX_RAW.saturating_sub(1)).next(), Some(ServiceId::MAX));
        assert_eq!(ServiceId::MAX.next(), None);
        assert_eq!(BundleId::MAX.next(), None);
    }

    #[test]
    fn ids_order_numerically() {
        assert!(ServiceId::new(2) < ServiceId::new(10));
        assert!(BundleId::FRAMEWORK < BundleId::FIRST);
    }

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&ServiceId::new(7)).unwrap();
        assert_eq!(json, "7");
        let id: BundleId = serde_json::from_str("3").unwrap();
        assert_eq!(id, BundleId::new(3));
    }
}
