//! Filter error types.

use thiserror::Error;

/// Errors raised while compiling a filter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// The filter text is malformed.
    #[error("invalid filter \"{fragment}\": {reason}")]
    Syntax {
        /// The offending part of the input.
        fragment: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The input cannot be turned into a filter.
    #[error("unsupported filter input: {0}")]
    Type(String),
}

impl FilterError {
    pub(crate) fn syntax(fragment: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Syntax {
            fragment: fragment.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;
