//! Service class names.

use std::borrow::Borrow;
use std::fmt;

/// A fully qualified, dot-separated class name such as `app.cache.ICache`.
///
/// Rust paths are normalized, so `app::cache::ICache` and
/// `ClassName::of::<dyn ICache>()` both name the same class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassName(String);

impl ClassName {
    /// Normalize `name` into a class name.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref().trim();
        let name = name.strip_prefix("dyn ").unwrap_or(name);
        Self(name.replace("::", "."))
    }

    /// Class name of a Rust type, usually a trait object such as `dyn ICache`.
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    /// The dotted name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last path segment, e.g. `ICache`.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ClassName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ClassName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClassName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ClassName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&String> for ClassName {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

/// The ordered set of class names a service is registered under.
///
/// Duplicates are dropped, keeping the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectClasses(Vec<ClassName>);

impl ObjectClasses {
    /// Build from any sequence of names.
    #[must_use]
    pub fn new<I, C>(names: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ClassName>,
    {
        names
            .into_iter()
            .fold(Self::default(), |classes, name| classes.and(name))
    }

    /// A single class named after a Rust type.
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self(vec![ClassName::of::<T>()])
    }

    /// Add another class, builder style.
    #[must_use]
    pub fn and(mut self, name: impl Into<ClassName>) -> Self {
        let name = name.into();
        if !self.0.contains(&name) {
            self.0.push(name);
        }
        self
    }

    /// Add a class named after a Rust type.
    #[must_use]
    pub fn and_of<T: ?Sized>(self) -> Self {
        self.and(ClassName::of::<T>())
    }

    /// The names, in registration order.
    #[must_use]
    pub fn as_slice(&self) -> &[ClassName] {
        &self.0
    }

    /// Whether no class was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn into_vec(self) -> Vec<ClassName> {
        self.0
    }
}

impl From<ClassName> for ObjectClasses {
    fn from(name: ClassName) -> Self {
        Self(vec![name])
    }
}

impl From<&str> for ObjectClasses {
    fn from(name: &str) -> Self {
        Self::new([name])
    }
}

impl From<String> for ObjectClasses {
    fn from(name: String) -> Self {
        Self::new([name])
    }
}

impl<C: Into<ClassName>> From<Vec<C>> for ObjectClasses {
    fn from(names: Vec<C>) -> Self {
        Self::new(names)
    }
}

impl<C: Into<ClassName>, const N: usize> From<[C; N]> for ObjectClasses {
    fn from(names: [C; N]) -> Self {
        Self::new(names)
    }
}
