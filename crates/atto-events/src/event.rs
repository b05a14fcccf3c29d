//! Framework event types.

use std::fmt;

use atto_core::{BundleId, ServiceId};
use serde::{Deserialize, Serialize};

/// Which lifecycle operation a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// The activator's start hook.
    Start,
    /// The activator's stop hook.
    Stop,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Stop => "stop",
        })
    }
}

/// Events published by the framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrameworkEvent {
    /// A bundle was installed.
    BundleInstalled {
        /// New bundle id.
        bundle_id: BundleId,
        /// Bundle name.
        name: String,
    },
    /// A bundle's start hook completed and it is now active.
    BundleStarted {
        /// Bundle id.
        bundle_id: BundleId,
    },
    /// A bundle's stop hook completed and it is back to resolved.
    BundleStopped {
        /// Bundle id.
        bundle_id: BundleId,
    },
    /// A bundle's activator failed; its pending transition was abandoned.
    BundleFailed {
        /// Bundle id.
        bundle_id: BundleId,
        /// Failing operation.
        phase: LifecyclePhase,
        /// Error message.
        message: String,
    },
    /// A service became visible in the registry.
    ServiceRegistered {
        /// Service id.
        service_id: ServiceId,
        /// Owning bundle.
        bundle_id: BundleId,
        /// Class names the service was registered under.
        object_class: Vec<String>,
    },
    /// A service was removed from the registry.
    ServiceUnregistering {
        /// Service id.
        service_id: ServiceId,
        /// Owning bundle.
        bundle_id: BundleId,
        /// Class names the service was registered under.
        object_class: Vec<String>,
    },
    /// The framework finished a start pass.
    FrameworkStarted,
    /// The framework finished a stop pass.
    FrameworkStopped,
}

impl FrameworkEvent {
    /// Stable snake-case name of the event variant.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::BundleInstalled { .. } => "bundle_installed",
            Self::BundleStarted { .. } => "bundle_started",
            Self::BundleStopped { .. } => "bundle_stopped",
            Self::BundleFailed { .. } => "bundle_failed",
            Self::ServiceRegistered { .. } => "service_registered",
            Self::ServiceUnregistering { .. } => "service_unregistering",
            Self::FrameworkStarted => "framework_started",
            Self::FrameworkStopped => "framework_stopped",
        }
    }

    /// The bundle the event concerns, if any.
    #[must_use]
    pub fn bundle_id(&self) -> Option<BundleId> {
        match self {
            Self::BundleInstalled { bundle_id, .. }
            | Self::BundleStarted { bundle_id }
            | Self::BundleStopped { bundle_id }
            | Self::BundleFailed { bundle_id, .. }
            | Self::ServiceRegistered { bundle_id, .. }
            | Self::ServiceUnregistering { bundle_id, .. } => Some(*bundle_id),
            Self::FrameworkStarted | Self::FrameworkStopped => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = FrameworkEvent::BundleFailed {
            bundle_id: BundleId::new(3),
            phase: LifecyclePhase::Start,
            message: "boom".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "bundle_failed");
        assert_eq!(json["bundle_id"], 3);
        assert_eq!(json["phase"], "start");

        let back: FrameworkEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn bundle_id_accessor() {
        assert_eq!(FrameworkEvent::FrameworkStarted.bundle_id(), None);
        let event = FrameworkEvent::ServiceRegistered {
            service_id: ServiceId::new(1),
            bundle_id: BundleId::new(2),
            object_class: vec!["app.ICache".into()],
        };
        assert_eq!(event.bundle_id(), Some(BundleId::new(2)));
        assert_eq!(event.event_type(), "service_registered");
    }
}
