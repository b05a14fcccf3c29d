//! Filter AST and matching.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use atto_core::{Properties, PropertyValue};

use crate::error::FilterError;
use crate::pattern::SubstringPattern;

/// A compiled attribute predicate.
///
/// Immutable once built; evaluation never mutates the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// All children match.
    And(Vec<Filter>),
    /// At least one child matches.
    Or(Vec<Filter>),
    /// None of the children match.
    Not(Vec<Filter>),
    /// Attribute equals the value, or a multi-valued attribute contains it.
    Eq {
        /// Attribute name.
        attr: String,
        /// Comparison value.
        value: PropertyValue,
    },
    /// Scalar attribute is less than or equal to the value.
    Lte {
        /// Attribute name.
        attr: String,
        /// Comparison value.
        value: PropertyValue,
    },
    /// Scalar attribute is greater than or equal to the value.
    Gte {
        /// Attribute name.
        attr: String,
        /// Comparison value.
        value: PropertyValue,
    },
    /// Attribute (or any element of it) contains the value, ignoring case.
    Approx {
        /// Attribute name.
        attr: String,
        /// Text searched for.
        value: String,
    },
    /// Attribute (or any element of it) matches a glob.
    Substring {
        /// Attribute name.
        attr: String,
        /// Compiled glob.
        pattern: SubstringPattern,
    },
    /// Attribute key exists, whatever its value.
    Present {
        /// Attribute name.
        attr: String,
    },
    /// Always true.
    All,
    /// Always false.
    None,
}

impl Filter {
    /// Equality predicate.
    #[must_use]
    pub fn equals(attr: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self::Eq {
            attr: attr.into(),
            value: value.into(),
        }
    }

    /// Presence predicate.
    #[must_use]
    pub fn present(attr: impl Into<String>) -> Self {
        Self::Present { attr: attr.into() }
    }

    /// Evaluate the filter against a property map.
    #[must_use]
    pub fn matches(&self, properties: &Properties) -> bool {
        match self {
            Self::And(children) => children.iter().all(|c| c.matches(properties)),
            Self::Or(children) => children.iter().any(|c| c.matches(properties)),
            Self::Not(children) => !children.iter().any(|c| c.matches(properties)),
            Self::Eq { attr, value } => properties.get(attr).is_some_and(|found| match found {
                PropertyValue::List(items) => items.iter().any(|item| item.coerced_eq(value)),
                scalar => scalar.coerced_eq(value),
            }),
            Self::Lte { attr, value } => compare(properties.get(attr), value)
                .is_some_and(|ord| ord != Ordering::Greater),
            Self::Gte { attr, value } => {
                compare(properties.get(attr), value).is_some_and(|ord| ord != Ordering::Less)
            },
            Self::Approx { attr, value } => {
                let needle = value.to_lowercase();
                any_text(properties.get(attr), |text| {
                    text.to_lowercase().contains(&needle)
                })
            },
            Self::Substring { attr, pattern } => {
                any_text(properties.get(attr), |text| pattern.is_match(text))
            },
            Self::Present { attr } => properties.contains_key(attr),
            Self::All => true,
            Self::None => false,
        }
    }
}

/// Ordering of a scalar attribute against a literal. Multi-valued attributes
/// are not iterated and never compare.
fn compare(found: Option<&PropertyValue>, value: &PropertyValue) -> Option<Ordering> {
    let found = found?;
    if !found.is_scalar() {
        return None;
    }
    found.coerced_cmp(value)
}

/// Apply `test` to the scalar's text, or to each element's text for a list.
fn any_text(found: Option<&PropertyValue>, test: impl Fn(&str) -> bool) -> bool {
    match found {
        Some(PropertyValue::List(items)) => items
            .iter()
            .filter_map(PropertyValue::to_text)
            .any(|text| test(&text)),
        Some(scalar) => scalar.to_text().is_some_and(|text| test(&text)),
        None => false,
    }
}

impl FromStr for Filter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parser::parse(s)
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    for c in text.chars() {
        if matches!(c, '(' | ')' | '*' | '\\') {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    Ok(())
}

fn write_compound(f: &mut fmt::Formatter<'_>, op: char, children: &[Filter]) -> fmt::Result {
    write!(f, "({op}")?;
    for child in children {
        write!(f, "{child}")?;
    }
    f.write_str(")")
}

/// Renders the filter in LDAP syntax; the output parses back to an equivalent filter.
impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(children) => write_compound(f, '&', children),
            Self::Or(children) => write_compound(f, '|', children),
            Self::Not(children) => write_compound(f, '!', children),
            Self::Eq { attr, value } => {
                write!(f, "({attr}=")?;
                write_escaped(f, &value.to_string())?;
                f.write_str(")")
            },
            Self::Lte { attr, value } => {
                write!(f, "({attr}<=")?;
                write_escaped(f, &value.to_string())?;
                f.write_str(")")
            },
            Self::Gte { attr, value } => {
                write!(f, "({attr}>=")?;
                write_escaped(f, &value.to_string())?;
                f.write_str(")")
            },
            Self::Approx { attr, value } => {
                write!(f, "({attr}~=")?;
                write_escaped(f, value)?;
                f.write_str(")")
            },
            Self::Substring { attr, pattern } => {
                write!(f, "({attr}=")?;
                for (i, piece) in pattern.pieces().iter().enumerate() {
                    if i > 0 {
                        f.write_str("*")?;
                    }
                    write_escaped(f, piece)?;
                }
                f.write_str(")")
            },
            Self::Present { attr } => write!(f, "({attr}=*)"),
            Self::All => f.write_str("(*)"),
            Self::None => f.write_str("(!(*))"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, PropertyValue)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn eq_matches_scalar_and_sequence() {
        let filter = Filter::equals("tags", "cache");
        assert!(filter.matches(&props(&[("tags", vec!["db", "cache"].into())])));
        assert!(filter.matches(&props(&[("tags", "cache".into())])));
        assert!(!filter.matches(&props(&[("tags", vec!["db"].into())])));
        assert!(!filter.matches(&props(&[("other", "cache".into())])));
    }

    #[test]
    fn range_comparisons_coerce_literals() {
        let gte = Filter::Gte {
            attr: "rank".into(),
            value: "0".into(),
        };
        let lte = Filter::Lte {
            attr: "rank".into(),
            value: "0".into(),
        };
        assert!(gte.matches(&props(&[("rank", 5.into())])));
        assert!(gte.matches(&props(&[("rank", 0.into())])));
        assert!(!gte.matches(&props(&[("rank", (-1).into())])));
        assert!(lte.matches(&props(&[("rank", (-1).into())])));
        assert!(!lte.matches(&props(&[("rank", 1.into())])));
    }

    #[test]
    fn range_comparisons_skip_sequences() {
        let gte = Filter::Gte {
            attr: "rank".into(),
            value: 0.into(),
        };
        assert!(!gte.matches(&props(&[("rank", vec![1, 2].into())])));
    }

    #[test]
    fn approx_searches_scalars_and_elements() {
        let filter = Filter::Approx {
            attr: "label".into(),
            value: "sql".into(),
        };
        assert!(filter.matches(&props(&[("label", "PostgreSQL".into())])));
        assert!(filter.matches(&props(&[("label", vec!["redis", "mysql"].into())])));
        assert!(!filter.matches(&props(&[("label", "redis".into())])));
    }

    #[test]
    fn substring_matches_any_element_of_a_list() {
        let filter = Filter::Substring {
            attr: "tags".into(),
            pattern: SubstringPattern::from_glob("ca*e").unwrap(),
        };
        assert!(filter.matches(&props(&[("tags", vec!["db", "Cache"].into())])));
        assert!(filter.matches(&props(&[("tags", vec!["cave"].into())])));
        assert!(!filter.matches(&props(&[("tags", vec!["db", "cash"].into())])));
        assert!(!filter.matches(&props(&[("tags", Vec::<String>::new().into())])));
    }

    #[test]
    fn substring_sees_numbers_as_text() {
        let filter = Filter::Substring {
            attr: "ports".into(),
            pattern: SubstringPattern::from_glob("63*").unwrap(),
        };
        assert!(filter.matches(&props(&[("ports", vec![80, 6379].into())])));
        assert!(!filter.matches(&props(&[("ports", vec![80, 443].into())])));
    }

    #[test]
    fn not_requires_no_child_to_match() {
        let filter = Filter::Not(vec![Filter::equals("a", 1), Filter::equals("b", 2)]);
        assert!(filter.matches(&props(&[("a", 0.into()), ("b", 0.into())])));
        assert!(!filter.matches(&props(&[("a", 1.into()), ("b", 0.into())])));
        assert!(!filter.matches(&props(&[("a", 0.into()), ("b", 2.into())])));
    }

    #[test]
    fn present_ignores_value() {
        let filter = Filter::present("name");
        assert!(filter.matches(&props(&[("name", "".into())])));
        assert!(!filter.matches(&Properties::new()));
    }

    #[test]
    fn constants() {
        assert!(Filter::All.matches(&Properties::new()));
        assert!(!Filter::None.matches(&Properties::new()));
        assert!(Filter::And(vec![]).matches(&Properties::new()));
        assert!(!Filter::Or(vec![]).matches(&Properties::new()));
    }

    #[test]
    fn display_escapes_special_characters() {
        let filter = Filter::And(vec![
            Filter::equals("name", "a(b)*"),
            Filter::present("x"),
            Filter::Substring {
                attr: "n".into(),
                pattern: SubstringPattern::from_glob("re*s").unwrap(),
            },
        ]);
        assert_eq!(filter.to_string(), r"(&(name=a\(b\)\*)(x=*)(n=re*s))");
        assert_eq!(Filter::None.to_string(), "(!(*))");
    }
}
