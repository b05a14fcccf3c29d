//! Compiled substring (glob) patterns.

use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::error::{FilterError, FilterResult};

/// A `*`-glob compiled to an anchored, case-insensitive regular expression.
///
/// The literal pieces between wildcards are kept so the pattern can be
/// rendered back to filter syntax.
#[derive(Clone)]
pub struct SubstringPattern {
    pieces: Vec<String>,
    regex: Regex,
}

impl SubstringPattern {
    /// Build a pattern from the literal pieces between `*` wildcards.
    ///
    /// `["re", "s"]` corresponds to `re*s`; leading or trailing empty pieces
    /// stand for a wildcard at the start or end.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Syntax`] if the resulting expression cannot be
    /// compiled (for instance when it exceeds the regex size limit).
    pub fn new(pieces: Vec<String>) -> FilterResult<Self> {
        let body = pieces
            .iter()
            .map(|piece| regex::escape(piece))
            .collect::<Vec<_>>()
            .join(".*?");
        let regex = RegexBuilder::new(&format!("^{body}$"))
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| FilterError::syntax(pieces.join("*"), e.to_string()))?;
        Ok(Self { pieces, regex })
    }

    /// Build a pattern from glob text, splitting on every `*`.
    ///
    /// # Errors
    ///
    /// See [`SubstringPattern::new`].
    pub fn from_glob(glob: &str) -> FilterResult<Self> {
        Self::new(glob.split('*').map(str::to_string).collect())
    }

    /// The literal pieces between wildcards.
    #[must_use]
    pub fn pieces(&self) -> &[String] {
        &self.pieces
    }

    /// Whether `text` matches the whole pattern.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for SubstringPattern {
    fn eq(&self, other: &Self) -> bool {
        self.pieces == other.pieces
    }
}

impl fmt::Debug for SubstringPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SubstringPattern")
            .field(&self.pieces.join("*"))
            .finish()
    }
}
