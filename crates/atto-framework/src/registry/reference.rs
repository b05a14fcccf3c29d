//! Service references.

use std::cmp::{Ordering, Reverse};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use atto_core::{BundleId, Properties, PropertyValue, ServiceId};
use atto_filter::Filter;

use super::class::ClassName;

struct Inner {
    id: ServiceId,
    bundle_id: BundleId,
    ranking: i64,
    classes: Vec<ClassName>,
    properties: Properties,
}

/// The registry's handle to a published service.
///
/// Cheap to clone. Equality and hashing go by service id; ordering is the
/// lookup order: higher ranking first, then older (lower) service id.
#[derive(Clone)]
pub struct ServiceReference {
    inner: Arc<Inner>,
}

impl ServiceReference {
    pub(crate) fn new(
        id: ServiceId,
        bundle_id: BundleId,
        ranking: i64,
        classes: Vec<ClassName>,
        properties: Properties,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                id,
                bundle_id,
                ranking,
                classes,
                properties,
            }),
        }
    }

    /// Service id.
    #[must_use]
    pub fn id(&self) -> ServiceId {
        self.inner.id
    }

    /// Id of the bundle that registered the service.
    #[must_use]
    pub fn bundle_id(&self) -> BundleId {
        self.inner.bundle_id
    }

    /// Service ranking; `0` unless given at registration.
    #[must_use]
    pub fn ranking(&self) -> i64 {
        self.inner.ranking
    }

    /// Classes the service was registered under.
    #[must_use]
    pub fn object_class(&self) -> &[ClassName] {
        &self.inner.classes
    }

    /// Property snapshot, including the reserved keys.
    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.inner.properties
    }

    /// A single property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.inner.properties.get(name)
    }

    /// Whether the property snapshot matches `filter`.
    #[must_use]
    pub fn matches(&self, filter: &Filter) -> bool {
        filter.matches(&self.inner.properties)
    }

    fn sort_key(&self) -> (Reverse<i64>, ServiceId) {
        (Reverse(self.inner.ranking), self.inner.id)
    }
}

impl PartialEq for ServiceReference {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for ServiceReference {}

impl Hash for ServiceReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl PartialOrd for ServiceReference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServiceReference {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Debug for ServiceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceReference")
            .field("id", &self.inner.id)
            .field("bundle_id", &self.inner.bundle_id)
            .field("ranking", &self.inner.ranking)
            .field("classes", &self.inner.classes)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ServiceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "service {} of bundle {} (", self.inner.id, self.inner.bundle_id)?;
        for (i, class) in self.inner.classes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{class}")?;
        }
        f.write_str(")")
    }
}
