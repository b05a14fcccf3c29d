//! Prelude module - commonly used types for convenient import.
//!
//! Use `use atto_events::prelude::*;` to import all essential types.

pub use crate::{EventBus, EventReceiver, FrameworkEvent, LifecyclePhase};
