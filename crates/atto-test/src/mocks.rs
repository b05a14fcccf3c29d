//! Test doubles for bundle activators.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use atto_core::{Properties, PropertyValue, SERVICE_RANKING};
use atto_framework::{BundleActivator, BundleContext, FrameworkError, StartHook, StopHook};

/// Shared, ordered record of activator calls.
///
/// Entries look like `start:<name>` and `stop:<name>`.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.into());
    }

    /// Snapshot of all entries in call order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of entries equal to `entry`.
    #[must_use]
    pub fn count(&self, entry: &str) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| *e == entry)
            .count()
    }

    /// Forget every entry.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Where a [`RecordingActivator`] fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailureMode {
    /// Both hooks succeed.
    #[default]
    Never,
    /// The start hook returns an ordinary error.
    OnStart,
    /// The stop hook returns an ordinary error.
    OnStop,
    /// The start hook returns [`FrameworkError::Framework`].
    FatalOnStart,
}

#[derive(Debug, Clone)]
struct Registration {
    class: String,
    ranking: i64,
    properties: Properties,
}

/// Activator that records its calls into a [`CallLog`].
///
/// Optionally fails on demand, omits its stop hook, or registers a service
/// (the bundle name as a `String`) when started.
#[derive(Debug, Clone)]
pub struct RecordingActivator {
    name: String,
    log: CallLog,
    failure: FailureMode,
    stop_hook: bool,
    registration: Option<Registration>,
}

impl RecordingActivator {
    /// Succeeding activator with both hooks.
    #[must_use]
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            failure: FailureMode::Never,
            stop_hook: true,
            registration: None,
        }
    }

    /// Fail as described by `failure`.
    #[must_use]
    pub fn failing(mut self, failure: FailureMode) -> Self {
        self.failure = failure;
        self
    }

    /// Drop the stop hook.
    #[must_use]
    pub fn without_stop_hook(mut self) -> Self {
        self.stop_hook = false;
        self
    }

    /// Register a service under `class` with `ranking` on start.
    #[must_use]
    pub fn registering(mut self, class: impl Into<String>, ranking: i64) -> Self {
        self.registration = Some(Registration {
            class: class.into(),
            ranking,
            properties: Properties::new(),
        });
        self
    }

    /// Add a property to the registered service. No effect unless
    /// [`registering`](Self::registering) was called first.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        if let Some(registration) = self.registration.as_mut() {
            registration.properties.insert(key.into(), value.into());
        }
        self
    }

    /// The bundle name this activator records under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl BundleActivator for RecordingActivator {
    fn start_hook(&self) -> Option<&dyn StartHook> {
        Some(self)
    }

    fn stop_hook(&self) -> Option<&dyn StopHook> {
        self.stop_hook.then_some(self as &dyn StopHook)
    }
}

#[async_trait]
impl StartHook for RecordingActivator {
    async fn start(&self, context: &BundleContext) -> anyhow::Result<()> {
        self.log.record(format!("start:{}", self.name));
        match self.failure {
            FailureMode::OnStart => anyhow::bail!("{} refused to start", self.name),
            FailureMode::FatalOnStart => {
                return Err(FrameworkError::Framework(format!("{} is unrecoverable", self.name)).into());
            },
            FailureMode::Never | FailureMode::OnStop => {},
        }
        if let Some(registration) = &self.registration {
            let mut properties = registration.properties.clone();
            properties.insert(SERVICE_RANKING.into(), registration.ranking.into());
            context.register_service(
                registration.class.as_str(),
                Arc::new(self.name.clone()),
                properties,
            )?;
            tracing::debug!(bundle = %self.name, class = %registration.class, "test service registered");
        }
        Ok(())
    }
}

#[async_trait]
impl StopHook for RecordingActivator {
    async fn stop(&self, _context: &BundleContext) -> anyhow::Result<()> {
        self.log.record(format!("stop:{}", self.name));
        if self.failure == FailureMode::OnStop {
            anyhow::bail!("{} refused to stop", self.name);
        }
        Ok(())
    }
}
