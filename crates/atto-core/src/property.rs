//! Property values and property maps.
//!
//! Service metadata, framework settings and filter literals all share the
//! [`PropertyValue`] type. Attributes may be scalars or ordered sequences of
//! scalars (multi-valued attributes); nested maps are carried for settings
//! such as connection parameters but never take part in ordering.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::num::TryFromIntError;

use serde::{Deserialize, Serialize};

use crate::ids::{BundleId, ServiceId};

/// A property map, ordered by key.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A single property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean scalar.
    Bool(bool),
    /// Signed integer scalar.
    Int(i64),
    /// Floating point scalar.
    Float(f64),
    /// String scalar.
    String(String),
    /// Ordered sequence (multi-valued attribute).
    List(Vec<PropertyValue>),
    /// Nested map.
    Map(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Short, stable name of the value's type, used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Whether two values carry the same variant.
    #[must_use]
    pub fn same_type(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Whether the value is a scalar (not a list or map).
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::List(_) | Self::Map(_))
    }

    /// The string slice, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The integer, if this is an integer.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The float, widening integers.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The boolean, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The elements, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// The entries, if this is a map.
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, PropertyValue>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Textual form of a scalar. Lists and maps have none.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::List(_) | Self::Map(_) => None,
        }
    }

    /// Compare two scalars, coercing a string operand to the other operand's type.
    ///
    /// Filter literals parsed from text are strings; comparing `"5"` against an
    /// integer attribute parses the literal as an integer first. Integers and
    /// floats compare numerically. Returns `None` when the pair is not
    /// comparable (lists, maps, unparsable literals, mismatched types).
    #[must_use]
    pub fn coerced_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Float(_) | Self::Int(_), Self::Float(_) | Self::Int(_)) => {
                self.as_float()?.partial_cmp(&other.as_float()?)
            },
            (Self::String(text), typed) => parse_like(text, typed)?.coerced_cmp(typed),
            (typed, Self::String(text)) => typed.coerced_cmp(&parse_like(text, typed)?),
            _ => None,
        }
    }

    /// Equality with the same coercion rules as [`coerced_cmp`](Self::coerced_cmp).
    ///
    /// Lists and maps are equal only to a value of the same shape.
    #[must_use]
    pub fn coerced_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::List(_), Self::List(_)) | (Self::Map(_), Self::Map(_)) => self == other,
            _ => self.coerced_cmp(other) == Some(Ordering::Equal),
        }
    }

    /// Convert a JSON value. `null` has no property representation and yields
    /// `None`; `null` entries inside arrays and objects are dropped.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            Value::String(s) => Some(Self::String(s)),
            Value::Array(items) => Some(Self::List(
                items.into_iter().filter_map(Self::from_json).collect(),
            )),
            Value::Object(entries) => Some(Self::Map(
                entries
                    .into_iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|v| (k, v)))
                    .collect(),
            )),
        }
    }
}

/// Parse `text` into the scalar type of `like`.
fn parse_like(text: &str, like: &PropertyValue) -> Option<PropertyValue> {
    let trimmed = text.trim();
    match like {
        PropertyValue::Int(_) => trimmed
            .parse::<i64>()
            .map(PropertyValue::Int)
            .ok()
            .or_else(|| trimmed.parse::<f64>().ok().map(PropertyValue::Float)),
        PropertyValue::Float(_) => trimmed.parse::<f64>().ok().map(PropertyValue::Float),
        PropertyValue::Bool(_) => {
            if trimmed.eq_ignore_ascii_case("true") {
                Some(PropertyValue::Bool(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Some(PropertyValue::Bool(false))
            } else {
                None
            }
        },
        PropertyValue::String(_) => Some(PropertyValue::String(text.to_string())),
        PropertyValue::List(_) | PropertyValue::Map(_) => None,
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            },
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            },
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for PropertyValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u16> for PropertyValue {
    fn from(v: u16) -> Self {
        Self::Int(i64::from(v))
    }
}

/// Fails for values above `i64::MAX` rather than clamping them.
impl TryFrom<u64> for PropertyValue {
    type Error = TryFromIntError;

    fn try_from(v: u64) -> Result<Self, Self::Error> {
        i64::try_from(v).map(Self::Int)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&String> for PropertyValue {
    fn from(v: &String) -> Self {
        Self::String(v.clone())
    }
}

/// Allocated identifiers never exceed [`BundleId::MAX`], so the value is exact.
impl From<BundleId> for PropertyValue {
    fn from(id: BundleId) -> Self {
        Self::Int(i64::try_from(id.get()).unwrap_or(i64::MAX))
    }
}

/// Allocated identifiers never exceed [`ServiceId::MAX`], so the value is exact.
impl From<ServiceId> for PropertyValue {
    fn from(id: ServiceId) -> Self {
        Self::Int(i64::try_from(id.get()).unwrap_or(i64::MAX))
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PropertyValue>, const N: usize> From<[T; N]> for PropertyValue {
    fn from(items: [T; N]) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, PropertyValue>> for PropertyValue {
    fn from(entries: BTreeMap<String, PropertyValue>) -> Self {
        Self::Map(entries)
    }
}
