//! Atto Framework - In-process modular component runtime.
//!
//! This crate provides:
//! - [`Framework`]: installs bundles and drives their start/stop lifecycle
//! - [`ServiceRegistry`]: ranked, filterable service lookup with usage tracking
//! - The activator contract bundles implement ([`BundleActivator`],
//!   [`StartHook`], [`StopHook`])
//! - [`BundleContext`]: the capability object handed to activators
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use atto_core::Properties;
//! use atto_framework::prelude::*;
//!
//! struct Greeter;
//!
//! impl BundleActivator for Greeter {
//!     fn start_hook(&self) -> Option<&dyn StartHook> {
//!         Some(self)
//!     }
//! }
//!
//! #[async_trait]
//! impl StartHook for Greeter {
//!     async fn start(&self, context: &BundleContext) -> anyhow::Result<()> {
//!         context.register_service("app.Greeting", Arc::new("hello"), Properties::new())?;
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> FrameworkResult<()> {
//! let catalog = ModuleCatalog::new().with_module("greeter", Greeter);
//! let framework = create_framework(catalog, ["greeter"], Properties::new())?;
//! framework.start().await?;
//!
//! let reference = framework
//!     .get_service_reference(Some("app.Greeting"), None::<&str>)?
//!     .expect("registered on start");
//! assert_eq!(reference.bundle_id().get(), 1);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod activator;
mod bundle;
mod context;
mod error;
mod framework;
pub mod registry;

pub use activator::{
    BundleActivator, BundleLoader, BundleModule, EmptyModule, ModuleCatalog, ModuleLoadError,
    StartHook, StopHook,
};
pub use bundle::{Bundle, BundleState};
pub use context::BundleContext;
pub use error::{FrameworkError, FrameworkResult};
pub use framework::{DEFAULT_FRAMEWORK_NAME, Framework, FrameworkBuilder, create_framework};
pub use registry::{
    ClassName, ObjectClasses, ServiceObject, ServiceReference, ServiceRegistration,
    ServiceRegistry,
};
