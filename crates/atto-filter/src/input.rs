//! Accepted filter inputs and the `compile` entry point.

use std::borrow::Cow;

use atto_core::Properties;

use crate::error::FilterResult;
use crate::filter::Filter;

/// Anything that can be compiled into a [`Filter`].
#[derive(Debug, Clone, Default)]
pub enum FilterInput<'a> {
    /// No filter: matches everything.
    #[default]
    Any,
    /// An already compiled filter, passed through unchanged.
    Compiled(Cow<'a, Filter>),
    /// An attribute map, see [`Filter::from_properties`].
    Properties(&'a Properties),
    /// Filter text.
    Text(&'a str),
}

impl<'a> From<&'a str> for FilterInput<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a String> for FilterInput<'a> {
    fn from(text: &'a String) -> Self {
        Self::Text(text)
    }
}

impl From<Filter> for FilterInput<'_> {
    fn from(filter: Filter) -> Self {
        Self::Compiled(Cow::Owned(filter))
    }
}

impl<'a> From<&'a Filter> for FilterInput<'a> {
    fn from(filter: &'a Filter) -> Self {
        Self::Compiled(Cow::Borrowed(filter))
    }
}

impl<'a> From<&'a Properties> for FilterInput<'a> {
    fn from(rules: &'a Properties) -> Self {
        Self::Properties(rules)
    }
}

impl<'a, T: Into<FilterInput<'a>>> From<Option<T>> for FilterInput<'a> {
    fn from(input: Option<T>) -> Self {
        input.map_or(Self::Any, Into::into)
    }
}

/// Compile any supported input into a [`Filter`].
///
/// # Errors
///
/// Returns [`FilterError::Syntax`](crate::FilterError::Syntax) for malformed
/// filter text and [`FilterError::Type`](crate::FilterError::Type) for
/// attribute maps that cannot be expressed as a filter.
pub fn compile<'a>(input: impl Into<FilterInput<'a>>) -> FilterResult<Filter> {
    match input.into() {
        FilterInput::Any => Ok(Filter::All),
        FilterInput::Compiled(filter) => Ok(filter.into_owned()),
        FilterInput::Properties(rules) => Filter::from_properties(rules),
        FilterInput::Text(text) => text.parse(),
    }
}
