//! Prelude module - commonly used types for convenient import.
//!
//! Use `use atto_framework::prelude::*;` to import all essential types.

pub use crate::{
    Bundle, BundleActivator, BundleContext, BundleState, ClassName, Framework, FrameworkError,
    FrameworkResult, ModuleCatalog, ObjectClasses, ServiceReference, ServiceRegistration,
    StartHook, StopHook, create_framework,
};
