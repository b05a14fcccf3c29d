//! Atto Events - Event bus for the Atto component runtime.
//!
//! The framework publishes an event for every bundle lifecycle change and
//! every service registration change. Subscribers receive them through an
//! [`EventReceiver`], in publication order.
//!
//! # Example
//!
//! ```rust
//! use atto_core::BundleId;
//! use atto_events::{EventBus, FrameworkEvent};
//!
//! # async fn example() {
//! let bus = EventBus::new();
//! let mut receiver = bus.subscribe();
//!
//! bus.publish(FrameworkEvent::BundleStarted {
//!     bundle_id: BundleId::new(1),
//! });
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.event_type(), "bundle_started");
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bus;
mod event;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventReceiver};
pub use event::{FrameworkEvent, LifecyclePhase};
