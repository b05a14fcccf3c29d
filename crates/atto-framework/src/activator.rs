//! The contract a bundle's code unit implements, and how modules are found.
//!
//! A module optionally exposes an activator; the activator optionally
//! exposes a start hook and a stop hook. Each level is looked up, and a missing
//! piece means "nothing to do" for that phase.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::BundleContext;

/// A bundle's code unit.
pub trait BundleModule: Send + Sync {
    /// The module's activator, if it has one.
    fn activator(&self) -> Option<&dyn BundleActivator>;
}

/// Lifecycle hooks of a bundle. Both are optional.
pub trait BundleActivator: Send + Sync {
    /// Hook run when the bundle starts.
    fn start_hook(&self) -> Option<&dyn StartHook> {
        None
    }

    /// Hook run when the bundle stops.
    fn stop_hook(&self) -> Option<&dyn StopHook> {
        None
    }
}

/// Any activator is its own module.
impl<A: BundleActivator> BundleModule for A {
    fn activator(&self) -> Option<&dyn BundleActivator> {
        Some(self)
    }
}

/// Start hook of an activator.
///
/// The framework awaits the hook before moving on to the next bundle, so no
/// two hooks ever run at the same time. Hooks with nothing to await simply
/// return.
///
/// Returning a [`FrameworkError`](crate::FrameworkError) keeps it as is; any
/// other error is wrapped into [`FrameworkError::Bundle`](crate::FrameworkError::Bundle).
#[async_trait]
pub trait StartHook: Send + Sync {
    /// Start the bundle, typically registering its services.
    async fn start(&self, context: &BundleContext) -> anyhow::Result<()>;
}

/// Stop hook of an activator. See [`StartHook`] for the calling rules.
#[async_trait]
pub trait StopHook: Send + Sync {
    /// Stop the bundle and release what it acquired.
    async fn stop(&self, context: &BundleContext) -> anyhow::Result<()>;
}

/// A module with no activator.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyModule;

impl BundleModule for EmptyModule {
    fn activator(&self) -> Option<&dyn BundleActivator> {
        None
    }
}

/// Failure to resolve a bundle name to a module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModuleLoadError {
    /// Nothing is known under the name.
    #[error("no module named \"{0}\"")]
    NotFound(String),

    /// The module exists but could not be loaded.
    #[error("failed to load module \"{name}\": {message}")]
    Failed {
        /// Module name.
        name: String,
        /// Failure reason.
        message: String,
    },
}

/// Resolves bundle names to modules during install.
pub trait BundleLoader: Send + Sync {
    /// Load the module named `name`.
    ///
    /// # Errors
    ///
    /// Returns a [`ModuleLoadError`] if the name cannot be resolved.
    fn load(&self, name: &str) -> Result<Arc<dyn BundleModule>, ModuleLoadError>;
}

impl<F> BundleLoader for F
where
    F: Fn(&str) -> Result<Arc<dyn BundleModule>, ModuleLoadError> + Send + Sync,
{
    fn load(&self, name: &str) -> Result<Arc<dyn BundleModule>, ModuleLoadError> {
        self(name)
    }
}

/// In-process table of modules keyed by bundle name.
#[derive(Clone, Default)]
pub struct ModuleCatalog {
    modules: HashMap<String, Arc<dyn BundleModule>>,
}

impl ModuleCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module, builder style.
    #[must_use]
    pub fn with_module(mut self, name: impl Into<String>, module: impl BundleModule + 'static) -> Self {
        self.insert(name, Arc::new(module));
        self
    }

    /// Add or replace a module.
    pub fn insert(&mut self, name: impl Into<String>, module: Arc<dyn BundleModule>) {
        self.modules.insert(name.into(), module);
    }

    /// Whether a module is known under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Known module names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl BundleLoader for ModuleCatalog {
    fn load(&self, name: &str) -> Result<Arc<dyn BundleModule>, ModuleLoadError> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| ModuleLoadError::NotFound(name.to_string()))
    }
}

impl fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleCatalog")
            .field("modules", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StartOnly;

    impl BundleActivator for StartOnly {
        fn start_hook(&self) -> Option<&dyn StartHook> {
            Some(self)
        }
    }

    #[async_trait]
    impl StartHook for StartOnly {
        async fn start(&self, _context: &BundleContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn hooks_are_discovered_per_level() {
        let module: Arc<dyn BundleModule> = Arc::new(StartOnly);
        let activator = module.activator().unwrap();
        assert!(activator.start_hook().is_some());
        assert!(activator.stop_hook().is_none());
        assert!(EmptyModule.activator().is_none());
    }

    #[test]
    fn catalog_resolves_known_names() {
        let catalog = ModuleCatalog::new()
            .with_module("cache", StartOnly)
            .with_module("sql", EmptyModule);
        assert_eq!(catalog.names(), ["cache", "sql"]);
        assert!(catalog.load("cache").is_ok());
        assert_eq!(
            catalog.load("web").err(),
            Some(ModuleLoadError::NotFound("web".into()))
        );
    }

    #[test]
    fn closures_are_loaders() {
        let loader = |name: &str| -> Result<Arc<dyn BundleModule>, ModuleLoadError> {
            Err(ModuleLoadError::Failed {
                name: name.to_string(),
                message: "broken".into(),
            })
        };
        let err = loader.load("cache").err().unwrap();
        assert_eq!(err.to_string(), "failed to load module \"cache\": broken");
    }
}
