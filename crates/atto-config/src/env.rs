//! Setting names and environment casts.

use atto_core::PropertyValue;

use crate::error::{ConfigError, ConfigResult};

/// Whether `name` is a setting name: no leading underscore, at least one
/// letter, and no lowercase letters.
pub(crate) fn is_setting_name(name: &str) -> bool {
    !name.starts_with('_')
        && name.chars().any(char::is_alphabetic)
        && !name.chars().any(char::is_lowercase)
}

/// Read environment text as a value of the same type as `default`.
///
/// Booleans are true for `1` or `true` in any case and false otherwise.
/// Lists and maps are parsed as a TOML value.
pub(crate) fn cast(name: &str, raw: &str, default: &PropertyValue) -> ConfigResult<PropertyValue> {
    let invalid = || ConfigError::EnvCast {
        name: name.to_string(),
        expected: default.type_name(),
        value: raw.to_string(),
    };
    match default {
        PropertyValue::Bool(_) => {
            let text = raw.trim();
            Ok(PropertyValue::Bool(
                text == "1" || text.eq_ignore_ascii_case("true"),
            ))
        },
        PropertyValue::Int(_) => raw
            .trim()
            .parse()
            .map(PropertyValue::Int)
            .map_err(|_| invalid()),
        PropertyValue::Float(_) => raw
            .trim()
            .parse()
            .map(PropertyValue::Float)
            .map_err(|_| invalid()),
        PropertyValue::String(_) => Ok(PropertyValue::String(raw.to_string())),
        PropertyValue::List(_) | PropertyValue::Map(_) => {
            let table: toml::Table = toml::from_str(&format!("value = {raw}")).map_err(|_| invalid())?;
            let value = table
                .get("value")
                .cloned()
                .map(crate::loader::from_toml)
                .ok_or_else(invalid)?;
            if value.same_type(default) {
                Ok(value)
            } else {
                Err(invalid())
            }
        },
    }
}
