//! Test harness helpers.

use std::io::Write;

use atto_telemetry::{LogConfig, setup_logging};
use tempfile::NamedTempFile;

/// Install the test-writer subscriber from [`LogConfig::for_tests`].
///
/// Safe to call from every test; only the first call installs. An invalid
/// `filter` leaves logging off.
///
/// # Example
///
/// ```rust,ignore
/// use atto_test::init_test_logging_with;
///
/// #[test]
/// fn my_test() {
///     init_test_logging_with("atto_framework=debug");
/// }
/// ```
pub fn init_test_logging_with(filter: &str) {
    if let Err(e) = setup_logging(&LogConfig::for_tests(filter))
        && !tracing::dispatcher::has_been_set()
    {
        eprintln!("test logging disabled: {e}");
    }
}

/// Install test logging honouring `RUST_LOG`, defaulting to `warn`.
pub fn init_test_logging() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    init_test_logging_with(&filter);
}

/// Temporary settings file with the given TOML content.
///
/// # Panics
///
/// Panics if the file cannot be created or written.
#[must_use]
pub fn test_settings_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_installs_once_through_telemetry() {
        init_test_logging_with("atto_framework=debug");
        assert!(tracing::dispatcher::has_been_set());
        init_test_logging();
        tracing::debug!(target: "atto_framework", "captured by the test writer");
    }

    #[test]
    fn settings_file_has_toml_suffix() {
        let file = test_settings_file("INSTALLED_BUNDLES = []\n");
        assert_eq!(file.path().extension().unwrap(), "toml");
        let text = std::fs::read_to_string(file.path()).unwrap();
        assert!(text.starts_with("INSTALLED_BUNDLES"));
    }
}
