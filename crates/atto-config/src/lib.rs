//! Atto Config - Read-only framework settings.
//!
//! Settings are the property source a framework exposes to its bundles.
//! Only UPPERCASE names are kept. Defaults are merged in with
//! [`Settings::extend`], which lets environment variables override them;
//! the environment text is cast to the type of the default.
//!
//! # Example
//!
//! ```rust
//! use atto_config::Settings;
//! use atto_core::PropertyValue;
//!
//! let settings = Settings::from_toml_str(r#"
//!     INSTALLED_BUNDLES = ["cache", "sql"]
//!     REDIS = { host = "localhost", port = 6379 }
//!     lowercase = "ignored"
//! "#).unwrap();
//!
//! assert_eq!(settings.installed_bundles().unwrap(), ["cache", "sql"]);
//! assert!(!settings.contains("lowercase"));
//! assert_eq!(
//!     settings.get("REDIS").and_then(|r| r.as_map()).and_then(|m| m.get("port")),
//!     Some(&PropertyValue::Int(6379))
//! );
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod env;
mod error;
mod loader;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use loader::{SETTINGS_ENV_VAR, default_settings_path};
pub use settings::{INSTALLED_BUNDLES, Settings};
