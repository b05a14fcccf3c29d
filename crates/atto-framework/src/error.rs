//! Framework error types.

use atto_core::{BundleId, PropertyNotFound, ServiceId};
use atto_filter::FilterError;

use crate::bundle::BundleState;

/// Errors from framework, bundle and registry operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FrameworkError {
    /// A bundle failed to install, start or stop.
    #[error("bundle {bundle}: {message}")]
    Bundle {
        /// Name of the failing bundle.
        bundle: String,
        /// Failure description.
        message: String,
    },

    /// A fatal framework-level condition. Raised from an activator it aborts
    /// the whole start or stop pass instead of being isolated.
    #[error("framework error: {0}")]
    Framework(String),

    /// Bad arguments to `register_service`.
    #[error("invalid registration: {0}")]
    InvalidRegistration(String),

    /// The reference is unknown, typically because the service was
    /// unregistered concurrently.
    #[error("service not found: {0}")]
    ServiceNotFound(ServiceId),

    /// The registration was already unregistered.
    #[error("service already unregistered: {0}")]
    AlreadyUnregistered(ServiceId),

    /// The service object is not of the requested type.
    #[error("service {service_id} is not a {expected}")]
    ServiceTypeMismatch {
        /// The service that was looked up.
        service_id: ServiceId,
        /// The requested Rust type.
        expected: &'static str,
    },

    /// A framework property is not set.
    #[error("property not found: \"{0}\"")]
    PropertyNotFound(String),

    /// No bundle with this id is installed.
    #[error("unknown bundle: {0}")]
    UnknownBundle(BundleId),

    /// Another lifecycle transition of the same bundle has not finished.
    #[error("bundle {bundle} is already {pending}")]
    TransitionInProgress {
        /// The bundle being transitioned.
        bundle: BundleId,
        /// The tentative state of the unfinished transition.
        pending: BundleState,
    },

    /// A lookup filter could not be compiled.
    #[error("invalid filter: {0}")]
    Filter(#[from] FilterError),
}

impl From<PropertyNotFound> for FrameworkError {
    fn from(err: PropertyNotFound) -> Self {
        Self::PropertyNotFound(err.0)
    }
}

impl FrameworkError {
    /// Shorthand for a [`FrameworkError::Bundle`].
    #[must_use]
    pub fn bundle(bundle: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Bundle {
            bundle: bundle.into(),
            message: message.into(),
        }
    }

    /// Whether this error aborts a framework-wide start or stop pass.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Framework(_))
    }
}

/// Result type for framework operations.
pub type FrameworkResult<T> = Result<T, FrameworkError>;
