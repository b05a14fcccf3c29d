//! Atto Core - Foundation types shared by every crate of the Atto component runtime.
//!
//! This crate provides:
//! - Bundle and service identifiers
//! - Property values and property maps used for service metadata and filtering
//! - The reserved service property keys
//! - The `PropertySource` contract consumed by the framework

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod constants;
pub mod ids;
pub mod property;
pub mod source;

pub use constants::{OBJECTCLASS, SERVICE_BUNDLE_ID, SERVICE_ID, SERVICE_RANKING, is_reserved_key};
pub use ids::{BundleId, ServiceId};
pub use property::{Properties, PropertyValue};
pub use source::{PropertyNotFound, PropertySource};
