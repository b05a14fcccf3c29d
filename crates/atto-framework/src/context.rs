//! The capability object handed to activator hooks.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use atto_core::{BundleId, Properties, PropertyValue};
use atto_filter::FilterInput;

use crate::bundle::Bundle;
use crate::error::{FrameworkError, FrameworkResult};
use crate::framework::Framework;
use crate::registry::{ObjectClasses, ServiceObject, ServiceReference, ServiceRegistration};

/// A bundle's view of the framework.
///
/// Every registration and service use made through a context is attributed
/// to its bundle.
#[derive(Clone)]
pub struct BundleContext {
    framework: Framework,
    bundle: Arc<Bundle>,
}

impl BundleContext {
    pub(crate) fn new(framework: Framework, bundle: Arc<Bundle>) -> Self {
        Self { framework, bundle }
    }

    /// The bundle this context belongs to.
    #[must_use]
    pub fn bundle(&self) -> &Arc<Bundle> {
        &self.bundle
    }

    /// A framework property.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::PropertyNotFound`] if it is not set.
    pub fn get_property(&self, name: &str) -> FrameworkResult<PropertyValue> {
        self.framework.get_property(name)
    }

    /// Publish a service owned by this bundle.
    ///
    /// # Errors
    ///
    /// See [`ServiceRegistry::register`](crate::ServiceRegistry::register).
    pub fn register_service(
        &self,
        classes: impl Into<ObjectClasses>,
        service: ServiceObject,
        properties: Properties,
    ) -> FrameworkResult<ServiceRegistration> {
        self.framework
            .register_service(&self.bundle, classes, service, properties)
    }

    /// References of `class` matching `filter`, best first.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::Filter`] if the filter does not compile.
    pub fn get_service_references<'a>(
        &self,
        class: Option<&str>,
        filter: impl Into<FilterInput<'a>>,
    ) -> FrameworkResult<Vec<ServiceReference>> {
        self.framework.get_service_references(class, filter)
    }

    /// The best reference of `class` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::Filter`] if the filter does not compile.
    pub fn get_service_reference<'a>(
        &self,
        class: Option<&str>,
        filter: impl Into<FilterInput<'a>>,
    ) -> FrameworkResult<Option<ServiceReference>> {
        self.framework.get_service_reference(class, filter)
    }

    /// The service behind `reference`, counted as used by this bundle.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::ServiceNotFound`] if it was unregistered.
    pub fn get_service(&self, reference: &ServiceReference) -> FrameworkResult<ServiceObject> {
        self.framework.get_service(&self.bundle, reference)
    }

    /// Typed [`get_service`](Self::get_service).
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::ServiceNotFound`] if the service was
    /// unregistered and [`FrameworkError::ServiceTypeMismatch`] if it is not a
    /// `T`; in the latter case the use is not counted.
    pub fn get_service_as<T: Any + Send + Sync>(
        &self,
        reference: &ServiceReference,
    ) -> FrameworkResult<Arc<T>> {
        self.get_service(reference)?.downcast::<T>().map_err(|_| {
            self.unget_service(reference);
            FrameworkError::ServiceTypeMismatch {
                service_id: reference.id(),
                expected: std::any::type_name::<T>(),
            }
        })
    }

    /// Release one use of `reference`.
    pub fn unget_service(&self, reference: &ServiceReference) -> bool {
        self.framework.unget_service(&self.bundle, reference)
    }

    /// All installed bundles, in install order.
    #[must_use]
    pub fn bundles(&self) -> Vec<Arc<Bundle>> {
        self.framework.bundles()
    }

    /// A bundle by id; `0` is the framework.
    #[must_use]
    pub fn get_bundle(&self, id: BundleId) -> Option<Arc<Bundle>> {
        self.framework.get_bundle(id)
    }

    /// Install another bundle by name.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::Bundle`] if its module cannot be loaded.
    pub fn install_bundle(&self, name: &str) -> FrameworkResult<Arc<Bundle>> {
        self.framework.install_bundle(name)
    }
}

impl fmt::Debug for BundleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleContext")
            .field("bundle", &self.bundle)
            .finish_non_exhaustive()
    }
}
