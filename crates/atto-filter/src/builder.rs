//! Building filters from plain attribute maps.

use atto_core::{Properties, PropertyValue};

use crate::error::{FilterError, FilterResult};
use crate::filter::Filter;

impl Filter {
    /// Build a filter from an attribute map.
    ///
    /// Every pair becomes an equality test and all pairs are ANDed. A list
    /// value means "equals any of these" and becomes an `Or` over one
    /// equality per element; an empty list therefore matches nothing. An
    /// empty map matches everything.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Type`] if a list contains a nested list or map.
    pub fn from_properties(rules: &Properties) -> FilterResult<Self> {
        let mut nodes = Vec::with_capacity(rules.len());
        for (attr, value) in rules {
            let node = match value {
                PropertyValue::List(alternatives) => {
                    let mut any_of = Vec::with_capacity(alternatives.len());
                    for alternative in alternatives {
                        if !alternative.is_scalar() {
                            return Err(FilterError::Type(format!(
                                "alternatives for \"{attr}\" must be scalars, got {}",
                                alternative.type_name()
                            )));
                        }
                        any_of.push(Self::equals(attr.clone(), alternative.clone()));
                    }
                    Self::Or(any_of)
                },
                other => Self::equals(attr.clone(), other.clone()),
            };
            nodes.push(node);
        }

        Ok(match nodes.len() {
            0 => Self::All,
            1 => nodes.remove(0),
            _ => Self::And(nodes),
        })
    }
}
