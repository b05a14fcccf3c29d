//! The framework: bundle table, lifecycle driver and registry owner.
//!
//! The framework is itself bundle `0` and goes through the same two-phase
//! state machine as the bundles it manages. Start visits bundles in install
//! order and stop in reverse; a failing bundle is logged and skipped so the
//! pass always ends in a definite state.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use atto_core::{BundleId, Properties, PropertySource, PropertyValue};
use atto_events::{EventBus, EventReceiver, FrameworkEvent, LifecyclePhase};
use atto_filter::FilterInput;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::activator::{BundleLoader, EmptyModule, ModuleCatalog};
use crate::bundle::{Bundle, BundleState, Transition};
use crate::context::BundleContext;
use crate::error::{FrameworkError, FrameworkResult};
use crate::registry::{
    ObjectClasses, ServiceObject, ServiceReference, ServiceRegistration, ServiceRegistry,
};

/// Name of the framework's own bundle unless configured otherwise.
pub const DEFAULT_FRAMEWORK_NAME: &str = "atto.framework";

struct BundleTable {
    bundles: BTreeMap<BundleId, Arc<Bundle>>,
    by_name: HashMap<String, BundleId>,
    next_id: BundleId,
}

struct FrameworkInner {
    system: Arc<Bundle>,
    table: RwLock<BundleTable>,
    properties: Arc<dyn PropertySource>,
    loader: Arc<dyn BundleLoader>,
    registry: ServiceRegistry,
    events: EventBus,
    /// Serializes lifecycle passes so no two hooks ever run at once.
    lifecycle: Mutex<()>,
}

impl FrameworkInner {
    fn read_table(&self) -> RwLockReadGuard<'_, BundleTable> {
        self.table.read().unwrap_or_else(|e| {
            warn!("Bundle table read lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write_table(&self) -> RwLockWriteGuard<'_, BundleTable> {
        self.table.write().unwrap_or_else(|e| {
            warn!("Bundle table lock poisoned, recovering");
            e.into_inner()
        })
    }
}

/// Builder for a [`Framework`].
pub struct FrameworkBuilder {
    name: String,
    loader: Arc<dyn BundleLoader>,
    properties: Arc<dyn PropertySource>,
    event_capacity: usize,
}

impl FrameworkBuilder {
    /// Name of the framework bundle.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Module loader used by `install_bundle`.
    #[must_use]
    pub fn loader(mut self, loader: impl BundleLoader + 'static) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    /// Property source exposed through `get_property`.
    #[must_use]
    pub fn properties(mut self, properties: impl PropertySource + 'static) -> Self {
        self.properties = Arc::new(properties);
        self
    }

    /// Property source shared with other owners.
    #[must_use]
    pub fn shared_properties(mut self, properties: Arc<dyn PropertySource>) -> Self {
        self.properties = properties;
        self
    }

    /// Capacity of the event channel.
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Build the framework, initially `RESOLVED` with no bundles.
    #[must_use]
    pub fn build(self) -> Framework {
        let events = EventBus::with_capacity(self.event_capacity);
        let system = Arc::new(Bundle::new(
            BundleId::FRAMEWORK,
            self.name,
            Arc::new(EmptyModule),
            BundleState::Resolved,
        ));
        Framework {
            inner: Arc::new(FrameworkInner {
                system,
                table: RwLock::new(BundleTable {
                    bundles: BTreeMap::new(),
                    by_name: HashMap::new(),
                    next_id: BundleId::FIRST,
                }),
                properties: self.properties,
                loader: self.loader,
                registry: ServiceRegistry::with_events(events.clone()),
                events,
                lifecycle: Mutex::new(()),
            }),
        }
    }
}

impl Default for FrameworkBuilder {
    fn default() -> Self {
        Self {
            name: DEFAULT_FRAMEWORK_NAME.to_string(),
            loader: Arc::new(ModuleCatalog::new()),
            properties: Arc::new(Properties::new()),
            event_capacity: atto_events::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Handle to a framework instance. Cheap to clone.
///
/// Lifecycle passes (`start`, `stop`, `start_bundle`, `stop_bundle`) are
/// serialized; a hook must not drive the lifecycle of the framework that
/// is running it.
#[derive(Clone)]
pub struct Framework {
    inner: Arc<FrameworkInner>,
}

/// Create a framework and install `names` in order.
///
/// # Errors
///
/// Returns [`FrameworkError::Bundle`] for the first name whose module cannot
/// be loaded.
pub fn create_framework<I, S>(
    loader: impl BundleLoader + 'static,
    names: I,
    properties: impl PropertySource + 'static,
) -> FrameworkResult<Framework>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let framework = Framework::builder()
        .loader(loader)
        .properties(properties)
        .build();
    for name in names {
        framework.install_bundle(name.as_ref())?;
    }
    Ok(framework)
}

impl Framework {
    /// Framework with the given loader and properties.
    #[must_use]
    pub fn new(
        loader: impl BundleLoader + 'static,
        properties: impl PropertySource + 'static,
    ) -> Self {
        Self::builder().loader(loader).properties(properties).build()
    }

    /// Start configuring a framework.
    #[must_use]
    pub fn builder() -> FrameworkBuilder {
        FrameworkBuilder::default()
    }

    /// The framework's own bundle (id `0`).
    #[must_use]
    pub fn bundle(&self) -> &Arc<Bundle> {
        &self.inner.system
    }

    /// Committed state of the framework.
    #[must_use]
    pub fn state(&self) -> BundleState {
        self.inner.system.state()
    }

    /// Install a bundle by name.
    ///
    /// Installing a name twice returns the existing bundle. New bundles get
    /// the next id and start out `RESOLVED`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::Bundle`] if the loader cannot resolve `name`.
    pub fn install_bundle(&self, name: &str) -> FrameworkResult<Arc<Bundle>> {
        if let Some(existing) = self.find_bundle(name) {
            debug!(bundle = name, bundle_id = %existing.id(), "Bundle already installed");
            return Ok(existing);
        }

        let module = self.inner.loader.load(name).map_err(|e| {
            error!(bundle = name, error = %e, "Failed to load bundle module");
            FrameworkError::bundle(name, e.to_string())
        })?;

        let bundle = {
            let mut table = self.inner.write_table();
            if let Some(existing) = table.by_name.get(name).and_then(|id| table.bundles.get(id)) {
                return Ok(Arc::clone(existing));
            }
            let id = table.next_id;
            table.next_id = id
                .next()
                .ok_or_else(|| FrameworkError::Framework("bundle id space exhausted".into()))?;
            let bundle = Arc::new(Bundle::new(id, name, module, BundleState::Resolved));
            table.by_name.insert(name.to_string(), id);
            table.bundles.insert(id, Arc::clone(&bundle));
            bundle
        };

        info!(bundle = name, bundle_id = %bundle.id(), "Installed bundle");
        self.inner.events.publish(FrameworkEvent::BundleInstalled {
            bundle_id: bundle.id(),
            name: name.to_string(),
        });
        Ok(bundle)
    }

    /// Start the framework and every installed bundle, in install order.
    ///
    /// Returns `Ok(false)` without doing anything if the framework is
    /// already starting or active. Bundle failures are logged and do not stop
    /// the pass.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::Framework`] if an activator raised one; the
    /// pass is abandoned and the framework keeps its previous state.
    pub async fn start(&self) -> FrameworkResult<bool> {
        let _serial = self.inner.lifecycle.lock().await;
        let system = &self.inner.system;
        if matches!(
            system.tracked_state(),
            BundleState::Starting | BundleState::Active
        ) {
            debug!("Framework already started");
            return Ok(false);
        }

        let transition = begin(system, BundleState::Starting)?;
        let bundles = self.bundles();
        info!(bundles = bundles.len(), "Starting framework");

        for bundle in &bundles {
            if let Err(e) = self.activate(bundle).await
                && e.is_fatal()
            {
                error!(bundle = %bundle.name(), error = %e, "Framework start aborted");
                return Err(e);
            }
        }

        transition.commit(BundleState::Active);
        info!("Framework started");
        self.inner.events.publish(FrameworkEvent::FrameworkStarted);
        Ok(true)
    }

    /// Stop every active bundle in reverse install order, then the framework.
    ///
    /// Returns `Ok(false)` without doing anything unless the framework is
    /// active. Bundles that are not active are skipped; bundle failures are
    /// logged and do not stop the pass.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::Framework`] if an activator raised one; the
    /// pass is abandoned and the framework stays active.
    pub async fn stop(&self) -> FrameworkResult<bool> {
        let _serial = self.inner.lifecycle.lock().await;
        let system = &self.inner.system;
        if system.tracked_state() != BundleState::Active {
            debug!(state = %system.tracked_state(), "Framework not active");
            return Ok(false);
        }

        let transition = begin(system, BundleState::Stopping)?;
        let bundles = self.bundles();
        info!(bundles = bundles.len(), "Stopping framework");

        for bundle in bundles.iter().rev() {
            let state = bundle.tracked_state();
            if state != BundleState::Active {
                debug!(bundle = %bundle.name(), %state, "Bundle not active, skipping stop");
                continue;
            }
            if let Err(e) = self.deactivate(bundle).await
                && e.is_fatal()
            {
                error!(bundle = %bundle.name(), error = %e, "Framework stop aborted");
                return Err(e);
            }
        }

        transition.commit(BundleState::Resolved);
        info!("Framework stopped");
        self.inner.events.publish(FrameworkEvent::FrameworkStopped);
        Ok(true)
    }

    /// Start one bundle. Id `0` starts the framework.
    ///
    /// Returns `Ok(false)` if the bundle is already starting or active.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::UnknownBundle`] for an unknown id and the
    /// activator's error if its start hook fails.
    pub async fn start_bundle(&self, id: BundleId) -> FrameworkResult<bool> {
        if id.is_framework() {
            return self.start().await;
        }
        let bundle = self
            .get_bundle(id)
            .ok_or(FrameworkError::UnknownBundle(id))?;
        let _serial = self.inner.lifecycle.lock().await;
        self.activate(&bundle).await
    }

    /// Stop one bundle. Id `0` stops the framework.
    ///
    /// Returns `Ok(false)` if the bundle is not active.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::UnknownBundle`] for an unknown id and the
    /// activator's error if its stop hook fails.
    pub async fn stop_bundle(&self, id: BundleId) -> FrameworkResult<bool> {
        if id.is_framework() {
            return self.stop().await;
        }
        let bundle = self
            .get_bundle(id)
            .ok_or(FrameworkError::UnknownBundle(id))?;
        let _serial = self.inner.lifecycle.lock().await;
        if bundle.tracked_state() != BundleState::Active {
            debug!(bundle = %bundle.name(), state = %bundle.tracked_state(), "Bundle not active");
            return Ok(false);
        }
        self.deactivate(&bundle).await
    }

    async fn activate(&self, bundle: &Arc<Bundle>) -> FrameworkResult<bool> {
        if matches!(
            bundle.tracked_state(),
            BundleState::Starting | BundleState::Active
        ) {
            debug!(bundle = %bundle.name(), "Bundle already started");
            return Ok(false);
        }

        let transition = begin(bundle, BundleState::Starting)?;
        if let Some(hook) = bundle.module().activator().and_then(|a| a.start_hook()) {
            let context = BundleContext::new(self.clone(), Arc::clone(bundle));
            if let Err(e) = hook.start(&context).await {
                drop(transition);
                return Err(self.failed(bundle, LifecyclePhase::Start, e));
            }
        }
        transition.commit(BundleState::Active);

        info!(bundle = %bundle.name(), bundle_id = %bundle.id(), "Bundle started");
        self.inner.events.publish(FrameworkEvent::BundleStarted {
            bundle_id: bundle.id(),
        });
        Ok(true)
    }

    async fn deactivate(&self, bundle: &Arc<Bundle>) -> FrameworkResult<bool> {
        let transition = begin(bundle, BundleState::Stopping)?;
        match bundle.module().activator().and_then(|a| a.stop_hook()) {
            Some(hook) => {
                let context = BundleContext::new(self.clone(), Arc::clone(bundle));
                if let Err(e) = hook.stop(&context).await {
                    drop(transition);
                    return Err(self.failed(bundle, LifecyclePhase::Stop, e));
                }
                self.inner.registry.unregister_services(bundle.id());
                self.inner.registry.unget_services(bundle.id());
            },
            None => {
                debug!(bundle = %bundle.name(), "Bundle has no stop hook, services left registered");
            },
        }
        transition.commit(BundleState::Resolved);

        info!(bundle = %bundle.name(), bundle_id = %bundle.id(), "Bundle stopped");
        self.inner.events.publish(FrameworkEvent::BundleStopped {
            bundle_id: bundle.id(),
        });
        Ok(true)
    }

    /// Turn a hook failure into the error to propagate, logging it.
    fn failed(&self, bundle: &Bundle, phase: LifecyclePhase, err: anyhow::Error) -> FrameworkError {
        let err = match err.downcast::<FrameworkError>() {
            Ok(e @ (FrameworkError::Bundle { .. } | FrameworkError::Framework(_))) => e,
            Ok(other) => FrameworkError::bundle(bundle.name(), other.to_string()),
            Err(other) => FrameworkError::bundle(bundle.name(), format!("{other:#}")),
        };
        error!(
            bundle = %bundle.name(),
            bundle_id = %bundle.id(),
            %phase,
            error = %err,
            "Bundle activator failed"
        );
        self.inner.events.publish(FrameworkEvent::BundleFailed {
            bundle_id: bundle.id(),
            phase,
            message: err.to_string(),
        });
        err
    }

    /// Installed bundles in install order, excluding the framework itself.
    #[must_use]
    pub fn bundles(&self) -> Vec<Arc<Bundle>> {
        self.inner.read_table().bundles.values().cloned().collect()
    }

    /// A bundle by id; `0` is the framework.
    #[must_use]
    pub fn get_bundle(&self, id: BundleId) -> Option<Arc<Bundle>> {
        if id.is_framework() {
            return Some(Arc::clone(&self.inner.system));
        }
        self.inner.read_table().bundles.get(&id).cloned()
    }

    /// An installed bundle by name.
    #[must_use]
    pub fn find_bundle(&self, name: &str) -> Option<Arc<Bundle>> {
        let table = self.inner.read_table();
        table
            .by_name
            .get(name)
            .and_then(|id| table.bundles.get(id))
            .cloned()
    }

    /// A framework property.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::PropertyNotFound`] if it is not set.
    pub fn get_property(&self, name: &str) -> FrameworkResult<PropertyValue> {
        Ok(self.inner.properties.require(name)?)
    }

    /// Publish a service on behalf of `bundle`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::UnknownBundle`] if `bundle` does not belong
    /// to this framework, otherwise see
    /// [`ServiceRegistry::register`](crate::ServiceRegistry::register).
    pub fn register_service(
        &self,
        bundle: &Bundle,
        classes: impl Into<ObjectClasses>,
        service: ServiceObject,
        properties: Properties,
    ) -> FrameworkResult<ServiceRegistration> {
        self.ensure_installed(bundle)?;
        self.inner
            .registry
            .register(bundle.id(), classes, service, properties)
    }

    /// References of `class` (or all classes) matching `filter`, best first.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::Filter`] if the filter does not compile.
    pub fn get_service_references<'a>(
        &self,
        class: Option<&str>,
        filter: impl Into<FilterInput<'a>>,
    ) -> FrameworkResult<Vec<ServiceReference>> {
        self.inner.registry.get_service_references(class, filter)
    }

    /// The best reference of `class` (or any class) matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::Filter`] if the filter does not compile.
    pub fn get_service_reference<'a>(
        &self,
        class: Option<&str>,
        filter: impl Into<FilterInput<'a>>,
    ) -> FrameworkResult<Option<ServiceReference>> {
        self.inner.registry.get_service_reference(class, filter)
    }

    /// The service behind `reference`, counted as used by `bundle`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::UnknownBundle`] if `bundle` does not belong
    /// to this framework and [`FrameworkError::ServiceNotFound`] if the
    /// service was unregistered.
    pub fn get_service(
        &self,
        bundle: &Bundle,
        reference: &ServiceReference,
    ) -> FrameworkResult<ServiceObject> {
        self.ensure_installed(bundle)?;
        self.inner.registry.get_service(bundle.id(), reference)
    }

    /// Release one use of `reference` by `bundle`.
    pub fn unget_service(&self, bundle: &Bundle, reference: &ServiceReference) -> bool {
        self.inner.registry.unget_service(bundle.id(), reference)
    }

    /// The service registry.
    #[must_use]
    pub fn registry(&self) -> &ServiceRegistry {
        &self.inner.registry
    }

    /// Subscribe to lifecycle and service events.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        self.inner.events.subscribe()
    }

    fn ensure_installed(&self, bundle: &Bundle) -> FrameworkResult<()> {
        match self.get_bundle(bundle.id()) {
            Some(known) if std::ptr::eq(Arc::as_ptr(&known), bundle) => Ok(()),
            _ => Err(FrameworkError::UnknownBundle(bundle.id())),
        }
    }
}

fn begin(bundle: &Bundle, target: BundleState) -> FrameworkResult<Transition<'_>> {
    bundle
        .lifecycle()
        .begin(target)
        .map_err(|pending| FrameworkError::TransitionInProgress {
            bundle: bundle.id(),
            pending,
        })
}

impl fmt::Debug for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Framework")
            .field("bundle", &self.inner.system)
            .field("bundles", &self.bundles())
            .field("registry", &self.inner.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::activator::{BundleActivator, BundleModule, ModuleLoadError, StartHook};

    type Log = Arc<StdMutex<Vec<String>>>;

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn install_of_unknown_module_fails() {
        let framework = Framework::builder().build();
        let err = framework.install_bundle("web").unwrap_err();
        assert!(
            matches!(err, FrameworkError::Bundle { ref bundle, ref message } if bundle == "web" && message.contains("no module named"))
        );
        assert!(framework.bundles().is_empty());
    }

    #[test]
    fn framework_is_bundle_zero() {
        let framework = Framework::builder().name("kernel").build();
        let system = framework.get_bundle(BundleId::FRAMEWORK).unwrap();
        assert_eq!(system.name(), "kernel");
        assert!(system.is_framework());
        assert_eq!(framework.state(), BundleState::Resolved);
        assert!(framework.find_bundle("kernel").is_none());
    }

    struct Sleeper {
        name: &'static str,
        log: Log,
    }

    impl BundleActivator for Sleeper {
        fn start_hook(&self) -> Option<&dyn StartHook> {
            Some(self)
        }
    }

    #[async_trait]
    impl StartHook for Sleeper {
        async fn start(&self, context: &BundleContext) -> anyhow::Result<()> {
            assert_eq!(context.bundle().tracked_state(), BundleState::Starting);
            assert_eq!(context.bundle().state(), BundleState::Resolved);
            self.log.lock().unwrap().push(format!("begin:{}", self.name));
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.log.lock().unwrap().push(format!("end:{}", self.name));
            Ok(())
        }
    }

    #[tokio::test]
    async fn async_hooks_never_overlap() {
        let log = Log::default();
        let catalog = ModuleCatalog::new()
            .with_module("a", Sleeper { name: "a", log: Arc::clone(&log) })
            .with_module("b", Sleeper { name: "b", log: Arc::clone(&log) });
        let framework = create_framework(catalog, ["a", "b"], Properties::new()).unwrap();

        let (first, second) = tokio::join!(framework.start(), framework.start());
        assert!(first.unwrap() ^ second.unwrap());
        assert_eq!(entries(&log), ["begin:a", "end:a", "begin:b", "end:b"]);
    }

    #[test]
    fn properties_are_read_through() {
        let mut props = Properties::new();
        props.insert("REDIS".into(), "localhost".into());
        let framework = Framework::new(ModuleCatalog::new(), props);

        assert_eq!(
            framework.get_property("REDIS").unwrap(),
            PropertyValue::from("localhost")
        );
        assert!(matches!(
            framework.get_property("MISSING"),
            Err(FrameworkError::PropertyNotFound(ref name)) if name == "MISSING"
        ));
    }

    #[test]
    fn services_need_an_installed_bundle() {
        let framework = Framework::builder().build();
        let stranger = Framework::builder().build();
        let err = framework
            .register_service(
                stranger.bundle(),
                "test.X",
                Arc::new(1_u8),
                Properties::new(),
            );
        // Both are bundle 0 but belong to different frameworks.
        assert!(matches!(err, Err(FrameworkError::UnknownBundle(_))));

        assert!(framework
            .register_service(framework.bundle(), "test.X", Arc::new(1_u8), Properties::new())
            .is_ok());
    }

    #[test]
    fn closure_loader_failures_name_the_bundle() {
        let loader = |name: &str| -> Result<Arc<dyn BundleModule>, ModuleLoadError> {
            Err(ModuleLoadError::Failed {
                name: name.to_string(),
                message: "syntax error".into(),
            })
        };
        let err = create_framework(loader, ["sql"], Properties::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "bundle sql: failed to load module \"sql\": syntax error"
        );
    }
}
