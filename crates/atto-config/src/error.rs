//! Configuration error types.

/// Errors from loading or extending settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A settings file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A settings file is not valid TOML.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File path, or `<string>` for in-memory text.
        path: String,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A settings file exceeds the size limit.
    #[error("{path} is {size} bytes, exceeding the {limit} byte limit")]
    TooLarge {
        /// File path.
        path: String,
        /// Actual size.
        size: u64,
        /// Allowed size.
        limit: u64,
    },

    /// An environment override cannot be read as the default's type.
    #[error("cannot read {name}={value:?} from the environment as {expected}")]
    EnvCast {
        /// Setting name.
        name: String,
        /// Type of the default.
        expected: &'static str,
        /// Raw environment text.
        value: String,
    },

    /// An existing setting does not have the type of its default.
    #[error("mismatched type for {name}: default is {expected}, setting is {found}")]
    TypeMismatch {
        /// Setting name.
        name: String,
        /// Type of the default.
        expected: &'static str,
        /// Type of the existing value.
        found: &'static str,
    },

    /// An environment variable naming a settings file is not set.
    #[error("environment variable {0} is not set")]
    MissingEnv(String),

    /// No per-user configuration directory could be determined.
    #[error("could not determine a configuration directory")]
    NoConfigDir,
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
