//! Settings files and TOML conversion.

use std::path::{Path, PathBuf};

use atto_core::{Properties, PropertyValue};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Environment variable that overrides the default settings path.
pub const SETTINGS_ENV_VAR: &str = "ATTO_SETTINGS";

/// Maximum allowed settings file size (1 MB).
pub(crate) const MAX_SETTINGS_FILE_SIZE: u64 = 1_048_576;

/// Where settings are read from when no path is given.
///
/// `$ATTO_SETTINGS` if set, otherwise `settings.toml` in the per-user
/// configuration directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoConfigDir`] if the variable is unset and the
/// platform has no configuration directory.
pub fn default_settings_path() -> ConfigResult<PathBuf> {
    if let Some(path) = std::env::var_os(SETTINGS_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }
    directories::ProjectDirs::from("rs", "atto", "atto")
        .map(|dirs| dirs.config_dir().join("settings.toml"))
        .ok_or(ConfigError::NoConfigDir)
}

/// Read and parse a TOML file into a property map.
///
/// Returns `None` if the file does not exist.
pub(crate) fn read_table(path: &Path) -> ConfigResult<Option<Properties>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "settings file not found");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
    if size > MAX_SETTINGS_FILE_SIZE {
        return Err(ConfigError::TooLarge {
            path: path.display().to_string(),
            size,
            limit: MAX_SETTINGS_FILE_SIZE,
        });
    }

    parse_table(&content, &path.display().to_string()).map(Some)
}

pub(crate) fn parse_table(content: &str, origin: &str) -> ConfigResult<Properties> {
    let table: toml::Table = toml::from_str(content).map_err(|e| ConfigError::Parse {
        path: origin.to_string(),
        source: e,
    })?;
    Ok(table
        .into_iter()
        .map(|(key, value)| (key, from_toml(value)))
        .collect())
}

/// Convert a TOML value. Datetimes become strings.
pub(crate) fn from_toml(value: toml::Value) -> PropertyValue {
    match value {
        toml::Value::String(s) => PropertyValue::String(s),
        toml::Value::Integer(i) => PropertyValue::Int(i),
        toml::Value::Float(f) => PropertyValue::Float(f),
        toml::Value::Boolean(b) => PropertyValue::Bool(b),
        toml::Value::Datetime(d) => PropertyValue::String(d.to_string()),
        toml::Value::Array(items) => PropertyValue::List(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => PropertyValue::Map(
            table
                .into_iter()
                .map(|(key, value)| (key, from_toml(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_table(&dir.path().join("absent.toml")).unwrap().is_none());
    }

    #[test]
    fn oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.toml");
        let data = "X = \"".to_owned() + &"a".repeat(1_100_000) + "\"";
        std::fs::write(&path, data).unwrap();

        let result = read_table(&path);
        assert!(
            matches!(result, Err(ConfigError::TooLarge { .. })),
            "expected TooLarge, got: {result:?}"
        );
    }

    #[test]
    fn malformed_file_names_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "FOO = ").unwrap();
        let err = read_table(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref path, .. } if path.ends_with("bad.toml")));
    }

    #[test]
    fn nested_values_convert() {
        let props = parse_table(
            "REDIS = { host = \"localhost\", port = 6379 }\nRATIO = 0.5\nON = true",
            "<string>",
        )
        .unwrap();
        let redis = props["REDIS"].as_map().unwrap();
        assert_eq!(redis["port"], PropertyValue::Int(6379));
        assert_eq!(props["RATIO"], PropertyValue::Float(0.5));
        assert_eq!(props["ON"], PropertyValue::Bool(true));
    }
}
