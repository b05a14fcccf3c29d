//! The read-only settings object.

use std::collections::HashMap;
use std::path::Path;

use atto_core::{Properties, PropertySource, PropertyValue};
use tracing::{debug, info};

use crate::env::{cast, is_setting_name};
use crate::error::{ConfigError, ConfigResult};
use crate::loader::{default_settings_path, parse_table, read_table};

/// Setting listing the bundles to install at startup.
pub const INSTALLED_BUNDLES: &str = "INSTALLED_BUNDLES";

/// Read-only framework settings.
///
/// Only UPPERCASE names are kept; anything else is dropped on construction
/// and on [`extend`](Self::extend). There are no setters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    values: Properties,
}

impl Settings {
    /// Settings from a property map, dropping non-setting names.
    #[must_use]
    pub fn new(data: Properties) -> Self {
        let values = data
            .into_iter()
            .filter(|(name, _)| {
                let keep = is_setting_name(name);
                if !keep {
                    debug!(name = %name, "Ignoring non-uppercase setting");
                }
                keep
            })
            .collect();
        Self { values }
    }

    /// Settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not valid TOML.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        parse_table(text, "<string>").map(Self::new)
    }

    /// Settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read (including
    /// when it does not exist), [`ConfigError::TooLarge`] or
    /// [`ConfigError::Parse`].
    pub fn load_file(path: &Path) -> ConfigResult<Self> {
        let table = read_table(path)?.ok_or_else(|| ConfigError::Read {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?;
        info!(path = %path.display(), "Loaded settings");
        Ok(Self::new(table))
    }

    /// Settings from the file named by the environment variable `var`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnv`] if `var` is unset, otherwise see
    /// [`load_file`](Self::load_file).
    pub fn from_env_file(var: &str) -> ConfigResult<Self> {
        let path = std::env::var_os(var).ok_or_else(|| ConfigError::MissingEnv(var.to_string()))?;
        Self::load_file(Path::new(&path))
    }

    /// Settings from [`default_settings_path`]; empty if that file is absent.
    ///
    /// # Errors
    ///
    /// See [`default_settings_path`] and [`load_file`](Self::load_file).
    pub fn load_default() -> ConfigResult<Self> {
        let path = default_settings_path()?;
        match read_table(&path)? {
            Some(table) => {
                info!(path = %path.display(), "Loaded settings");
                Ok(Self::new(table))
            },
            None => Ok(Self::default()),
        }
    }

    /// Merge `defaults` in, letting process environment variables override
    /// them. See [`extend_with_env`](Self::extend_with_env).
    ///
    /// # Errors
    ///
    /// See [`extend_with_env`](Self::extend_with_env).
    pub fn extend(&mut self, defaults: &Properties) -> ConfigResult<()> {
        self.extend_with(defaults, |name| std::env::var(name).ok())
    }

    /// Merge `defaults` in, reading overrides from `env`.
    ///
    /// A name that is not set yet takes the value of `env[name]` cast to the
    /// default's type, or the default itself when `env` has no entry. A name
    /// that is already set keeps its value, which must have the default's
    /// type. Non-setting names are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvCast`] if an override cannot be cast and
    /// [`ConfigError::TypeMismatch`] if an existing value has another type
    /// than its default. Values merged before the error are kept.
    pub fn extend_with_env(
        &mut self,
        defaults: &Properties,
        env: &HashMap<String, String>,
    ) -> ConfigResult<()> {
        self.extend_with(defaults, |name| env.get(name).cloned())
    }

    fn extend_with(
        &mut self,
        defaults: &Properties,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<()> {
        for (name, default) in defaults {
            if !is_setting_name(name) {
                continue;
            }
            match self.values.get(name) {
                Some(existing) if !existing.same_type(default) => {
                    return Err(ConfigError::TypeMismatch {
                        name: name.clone(),
                        expected: default.type_name(),
                        found: existing.type_name(),
                    });
                },
                Some(_) => {},
                None => {
                    let value = match lookup(name) {
                        Some(raw) => {
                            debug!(name = %name, "Setting overridden from environment");
                            cast(name, &raw, default)?
                        },
                        None => default.clone(),
                    };
                    self.values.insert(name.clone(), value);
                },
            }
        }
        Ok(())
    }

    /// A setting.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    /// Whether a setting exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Setting names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of settings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no settings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The bundles to install, from [`INSTALLED_BUNDLES`]. Empty when unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TypeMismatch`] unless the setting is a list of
    /// strings.
    pub fn installed_bundles(&self) -> ConfigResult<Vec<String>> {
        let Some(value) = self.values.get(INSTALLED_BUNDLES) else {
            return Ok(Vec::new());
        };
        let mismatch = |found: &PropertyValue| ConfigError::TypeMismatch {
            name: INSTALLED_BUNDLES.to_string(),
            expected: "list",
            found: found.type_name(),
        };
        value
            .as_list()
            .ok_or_else(|| mismatch(value))?
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(|| mismatch(item)))
            .collect()
    }
}

impl PropertySource for Settings {
    fn property(&self, name: &str) -> Option<PropertyValue> {
        self.values.get(name).cloned()
    }
}

impl FromIterator<(String, PropertyValue)> for Settings {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
