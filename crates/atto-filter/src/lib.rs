//! Atto Filter - Attribute predicates for service lookup.
//!
//! Filters are written in an LDAP-like syntax and evaluated against a
//! [`Properties`](atto_core::Properties) map:
//!
//! ```rust
//! use atto_core::{Properties, PropertyValue};
//! use atto_filter::compile;
//!
//! let filter = compile("(&(name=redis)(rank>=0))").unwrap();
//!
//! let mut props = Properties::new();
//! props.insert("name".into(), PropertyValue::from("redis"));
//! props.insert("rank".into(), PropertyValue::from(5));
//! assert!(filter.matches(&props));
//! ```
//!
//! # Grammar
//!
//! ```text
//! filter   = "(" ( and | or | not | item ) ")" | "*"
//! and      = "&" filter+
//! or       = "|" filter+
//! not      = "!" filter+
//! item     = attr ( "=" | "<=" | ">=" | "~=" ) value | "*"
//! ```
//!
//! Under `=`, a value of exactly `*` is a presence test and a value containing
//! `*` is a case-insensitive glob. A backslash escapes the next character.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod builder;
mod error;
mod filter;
mod input;
mod parser;
mod pattern;

pub use error::{FilterError, FilterResult};
pub use filter::Filter;
pub use input::{FilterInput, compile};
pub use parser::MAX_NESTING_DEPTH;
pub use pattern::SubstringPattern;
