//! Service registry.
//!
//! Holds every published service, a per-class index kept in lookup order,
//! a per-bundle index used for teardown, and per-consumer usage counts.
//! All state sits behind one lock: mutations (including a whole bundle's
//! teardown) take it exclusively, lookups read a consistent snapshot.

mod class;
mod reference;

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use atto_core::{
    BundleId, OBJECTCLASS, Properties, PropertyValue, SERVICE_BUNDLE_ID, SERVICE_ID,
    SERVICE_RANKING, ServiceId,
};
use atto_events::{EventBus, FrameworkEvent};
use atto_filter::{Filter, FilterInput, compile};
use tracing::{debug, info, warn};

pub use class::{ClassName, ObjectClasses};
pub use reference::ServiceReference;

use crate::error::{FrameworkError, FrameworkResult};

/// A published service object.
pub type ServiceObject = Arc<dyn Any + Send + Sync>;

struct ServiceEntry {
    reference: ServiceReference,
    service: ServiceObject,
    usage: BTreeMap<BundleId, usize>,
}

struct Tables {
    services: BTreeMap<ServiceId, ServiceEntry>,
    classes: HashMap<ClassName, Vec<ServiceReference>>,
    owners: HashMap<BundleId, Vec<ServiceId>>,
    next_id: ServiceId,
}

impl Tables {
    fn new() -> Self {
        Self {
            services: BTreeMap::new(),
            classes: HashMap::new(),
            owners: HashMap::new(),
            next_id: ServiceId::FIRST,
        }
    }

    fn allocate_id(&mut self) -> FrameworkResult<ServiceId> {
        let id = self.next_id;
        self.next_id = id
            .next()
            .ok_or_else(|| FrameworkError::Framework("service id space exhausted".into()))?;
        Ok(id)
    }

    fn insert(&mut self, entry: ServiceEntry) {
        let reference = entry.reference.clone();
        for class in reference.object_class() {
            let bucket = self.classes.entry(class.clone()).or_default();
            let at = bucket.partition_point(|r| r < &reference);
            bucket.insert(at, reference.clone());
        }
        self.owners
            .entry(reference.bundle_id())
            .or_default()
            .push(reference.id());
        self.services.insert(reference.id(), entry);
    }

    fn remove(&mut self, id: ServiceId) -> Option<ServiceEntry> {
        let entry = self.services.remove(&id)?;
        for class in entry.reference.object_class() {
            if let Some(bucket) = self.classes.get_mut(class) {
                bucket.retain(|r| r.id() != id);
                if bucket.is_empty() {
                    self.classes.remove(class);
                }
            }
        }
        let owner = entry.reference.bundle_id();
        if let Some(owned) = self.owners.get_mut(&owner) {
            owned.retain(|owned_id| *owned_id != id);
            if owned.is_empty() {
                self.owners.remove(&owner);
            }
        }
        Some(entry)
    }
}

struct Shared {
    tables: RwLock<Tables>,
    events: EventBus,
}

impl Shared {
    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|e| {
            warn!("Service registry read lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|e| {
            warn!("Service registry lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn unregister(&self, id: ServiceId) -> FrameworkResult<ServiceReference> {
        let entry = self
            .write()
            .remove(id)
            .ok_or(FrameworkError::AlreadyUnregistered(id))?;
        self.announce_removal(&entry.reference);
        Ok(entry.reference)
    }

    fn announce_removal(&self, reference: &ServiceReference) {
        debug!(
            service_id = %reference.id(),
            bundle_id = %reference.bundle_id(),
            "Unregistered service"
        );
        self.events.publish(FrameworkEvent::ServiceUnregistering {
            service_id: reference.id(),
            bundle_id: reference.bundle_id(),
            object_class: class_strings(reference),
        });
    }
}

fn class_strings(reference: &ServiceReference) -> Vec<String> {
    reference
        .object_class()
        .iter()
        .map(|c| c.as_str().to_string())
        .collect()
}

fn ranking_of(properties: &Properties) -> FrameworkResult<i64> {
    match properties.get(SERVICE_RANKING) {
        None => Ok(0),
        Some(PropertyValue::Int(ranking)) => Ok(*ranking),
        Some(PropertyValue::String(text)) => text.trim().parse().map_err(|_| {
            FrameworkError::InvalidRegistration(format!(
                "{SERVICE_RANKING} must be an integer, got \"{text}\""
            ))
        }),
        Some(PropertyValue::Float(ranking)) => truncate_ranking(*ranking).ok_or_else(|| {
            FrameworkError::InvalidRegistration(format!(
                "{SERVICE_RANKING} must be an integer, got {ranking}"
            ))
        }),
        Some(other) => Err(FrameworkError::InvalidRegistration(format!(
            "{SERVICE_RANKING} must be an integer, got {}",
            other.type_name()
        ))),
    }
}

/// Drops the fractional part toward zero; `None` outside the `i64` range.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn truncate_ranking(ranking: f64) -> Option<i64> {
    let whole = ranking.trunc();
    (whole >= i64::MIN as f64 && whole < i64::MAX as f64).then(|| whole as i64)
}

/// Registry of published services.
///
/// Cheap to clone; clones share the same tables.
#[derive(Clone)]
pub struct ServiceRegistry {
    shared: Arc<Shared>,
}

impl ServiceRegistry {
    /// Create an empty registry with its own event bus.
    #[must_use]
    pub fn new() -> Self {
        Self::with_events(EventBus::new())
    }

    /// Create an empty registry publishing to `events`.
    #[must_use]
    pub fn with_events(events: EventBus) -> Self {
        Self {
            shared: Arc::new(Shared {
                tables: RwLock::new(Tables::new()),
                events,
            }),
        }
    }

    /// Publish `service` under `classes` on behalf of `bundle`.
    ///
    /// `properties` is stored as given apart from the reserved keys:
    /// `objectClass`, `service.id` and `service.bundleid` are always
    /// overwritten; `service.ranking` defaults to `0` and is normalized to an
    /// integer.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::InvalidRegistration`] if no class (or an
    /// empty class name) is given or the ranking is not an integer.
    pub fn register(
        &self,
        bundle: BundleId,
        classes: impl Into<ObjectClasses>,
        service: ServiceObject,
        mut properties: Properties,
    ) -> FrameworkResult<ServiceRegistration> {
        let classes = classes.into();
        if classes.is_empty() {
            return Err(FrameworkError::InvalidRegistration(
                "at least one object class is required".into(),
            ));
        }
        if classes.as_slice().iter().any(ClassName::is_empty) {
            return Err(FrameworkError::InvalidRegistration(
                "object class names must not be empty".into(),
            ));
        }
        let ranking = ranking_of(&properties)?;
        let classes = classes.into_vec();

        let reference = {
            let mut tables = self.shared.write();
            let id = tables.allocate_id()?;
            properties.insert(
                OBJECTCLASS.to_string(),
                PropertyValue::List(
                    classes
                        .iter()
                        .map(|c| PropertyValue::from(c.as_str()))
                        .collect(),
                ),
            );
            properties.insert(SERVICE_ID.to_string(), id.into());
            properties.insert(SERVICE_BUNDLE_ID.to_string(), bundle.into());
            properties.insert(SERVICE_RANKING.to_string(), ranking.into());

            let reference = ServiceReference::new(id, bundle, ranking, classes, properties);
            tables.insert(ServiceEntry {
                reference: reference.clone(),
                service,
                usage: BTreeMap::new(),
            });
            reference
        };

        info!(
            service_id = %reference.id(),
            bundle_id = %bundle,
            ranking,
            classes = ?class_strings(&reference),
            "Registered service"
        );
        self.shared.events.publish(FrameworkEvent::ServiceRegistered {
            service_id: reference.id(),
            bundle_id: bundle,
            object_class: class_strings(&reference),
        });

        Ok(ServiceRegistration {
            registry: Arc::downgrade(&self.shared),
            reference,
        })
    }

    /// Remove a registration. Same as [`ServiceRegistration::unregister`].
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::AlreadyUnregistered`] on a second call.
    pub fn unregister(&self, registration: &ServiceRegistration) -> FrameworkResult<()> {
        registration.unregister()
    }

    /// References in lookup order.
    ///
    /// With a class, only that class's references are considered; without
    /// one, every reference is. `filter` then keeps the matching ones, and
    /// `only_first` stops at the first match.
    #[must_use]
    pub fn find_references(
        &self,
        class: Option<&str>,
        filter: Option<&Filter>,
        only_first: bool,
    ) -> Vec<ServiceReference> {
        let limit = if only_first { 1 } else { usize::MAX };
        let keep = |r: &&ServiceReference| filter.is_none_or(|f| r.matches(f));
        let tables = self.shared.read();

        match class {
            Some(class) => {
                let class = ClassName::new(class);
                tables.classes.get(&class).map_or_else(Vec::new, |bucket| {
                    bucket.iter().filter(keep).take(limit).cloned().collect()
                })
            },
            None => {
                let mut all: Vec<ServiceReference> = tables
                    .services
                    .values()
                    .map(|e| &e.reference)
                    .filter(keep)
                    .cloned()
                    .collect();
                drop(tables);
                all.sort();
                all.truncate(limit);
                all
            },
        }
    }

    /// References of `class` (or all classes) matching `filter`, in lookup order.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::Filter`] if the filter does not compile.
    pub fn get_service_references<'a>(
        &self,
        class: Option<&str>,
        filter: impl Into<FilterInput<'a>>,
    ) -> FrameworkResult<Vec<ServiceReference>> {
        let filter = compile(filter)?;
        Ok(self.find_references(class, Some(&filter), false))
    }

    /// The best matching reference, if any.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::Filter`] if the filter does not compile.
    pub fn get_service_reference<'a>(
        &self,
        class: Option<&str>,
        filter: impl Into<FilterInput<'a>>,
    ) -> FrameworkResult<Option<ServiceReference>> {
        let filter = compile(filter)?;
        Ok(self
            .find_references(class, Some(&filter), true)
            .into_iter()
            .next())
    }

    /// The service object behind `reference`, counted as used by `bundle`.
    ///
    /// A bundle using its own service is not counted.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::ServiceNotFound`] if the service is no
    /// longer registered.
    pub fn get_service(
        &self,
        bundle: BundleId,
        reference: &ServiceReference,
    ) -> FrameworkResult<ServiceObject> {
        let mut tables = self.shared.write();
        let entry = tables
            .services
            .get_mut(&reference.id())
            .ok_or(FrameworkError::ServiceNotFound(reference.id()))?;
        if bundle != entry.reference.bundle_id() {
            let count = entry.usage.entry(bundle).or_insert(0);
            *count = count.saturating_add(1);
        }
        Ok(Arc::clone(&entry.service))
    }

    /// Release one use of `reference` by `bundle`.
    ///
    /// Returns whether a use was released; releasing an unknown reference or
    /// an unused one does nothing.
    pub fn unget_service(&self, bundle: BundleId, reference: &ServiceReference) -> bool {
        let mut tables = self.shared.write();
        let Some(entry) = tables.services.get_mut(&reference.id()) else {
            return false;
        };
        let Some(count) = entry.usage.get_mut(&bundle) else {
            return false;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            entry.usage.remove(&bundle);
        }
        true
    }

    /// Unregister every service `bundle` owns, atomically with respect to
    /// lookups. Returns how many were removed.
    pub fn unregister_services(&self, bundle: BundleId) -> usize {
        let removed: Vec<ServiceEntry> = {
            let mut tables = self.shared.write();
            let owned = tables.owners.remove(&bundle).unwrap_or_default();
            owned.into_iter().filter_map(|id| tables.remove(id)).collect()
        };
        for entry in &removed {
            self.shared.announce_removal(&entry.reference);
        }
        if !removed.is_empty() {
            debug!(bundle_id = %bundle, count = removed.len(), "Unregistered bundle services");
        }
        removed.len()
    }

    /// Drop every usage count `bundle` holds on other bundles' services.
    /// Returns how many services it was using.
    pub fn unget_services(&self, bundle: BundleId) -> usize {
        let mut tables = self.shared.write();
        let released = tables
            .services
            .values_mut()
            .filter_map(|entry| entry.usage.remove(&bundle))
            .count();
        if released > 0 {
            debug!(bundle_id = %bundle, count = released, "Released services used by bundle");
        }
        released
    }

    /// Bundles currently using `reference`.
    #[must_use]
    pub fn using_bundles(&self, reference: &ServiceReference) -> Vec<BundleId> {
        self.shared
            .read()
            .services
            .get(&reference.id())
            .map(|entry| entry.usage.keys().copied().collect())
            .unwrap_or_default()
    }

    /// How many uses of `reference` `bundle` currently holds.
    #[must_use]
    pub fn usage_count(&self, reference: &ServiceReference, bundle: BundleId) -> usize {
        self.shared
            .read()
            .services
            .get(&reference.id())
            .and_then(|entry| entry.usage.get(&bundle).copied())
            .unwrap_or(0)
    }

    /// Services registered by `bundle`, in registration order.
    #[must_use]
    pub fn registered_by(&self, bundle: BundleId) -> Vec<ServiceReference> {
        let tables = self.shared.read();
        tables
            .owners
            .get(&bundle)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| tables.services.get(id))
                    .map(|entry| entry.reference.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether `reference` is still registered.
    #[must_use]
    pub fn contains(&self, reference: &ServiceReference) -> bool {
        self.shared.read().services.contains_key(&reference.id())
    }

    /// Number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.read().services.len()
    }

    /// Whether no service is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.read().services.is_empty()
    }

    /// The bus service events are published on.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.shared.events
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.len())
            .finish_non_exhaustive()
    }
}

/// Handle returned by a registration, used to withdraw the service.
pub struct ServiceRegistration {
    registry: Weak<Shared>,
    reference: ServiceReference,
}

impl ServiceRegistration {
    /// The registered service's reference.
    #[must_use]
    pub fn reference(&self) -> &ServiceReference {
        &self.reference
    }

    /// Remove the service from the registry.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::AlreadyUnregistered`] if the service was
    /// already removed, by this handle or by its bundle stopping.
    pub fn unregister(&self) -> FrameworkResult<()> {
        let id = self.reference.id();
        let shared = self
            .registry
            .upgrade()
            .ok_or(FrameworkError::AlreadyUnregistered(id))?;
        shared.unregister(id).map(|_| ())
    }
}

impl fmt::Debug for ServiceRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistration")
            .field("reference", &self.reference)
            .finish_non_exhaustive()
    }
}
