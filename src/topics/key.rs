//! # Topic identity.
//!
//! A topic is a `(payload type, optional name)` pair:
//! - [`TopicType`] identifies the payload type (stable `TypeId` plus a diagnostic name);
//! - [`TopicName`] is the optional name, canonicalized so that "no name" has exactly one form;
//! - [`TopicKey`] bundles both and is what the registry looks records up by.
//!
//! ## Name rules
//! - `None` and `""` both become [`TopicName::Unnamed`].
//! - Every other string is kept verbatim (whitespace included) and compared by exact equality.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Payload type descriptor.
///
/// Equality and hashing use the `TypeId` only; `name` is for logs.
#[derive(Clone, Copy)]
pub struct TopicType {
    id: TypeId,
    name: &'static str,
}

impl TopicType {
    /// Descriptor for `T` (trait objects included).
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Stable type identifier.
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TopicType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TopicType {}

impl Hash for TopicType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TopicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TopicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Optional topic name with a single canonical "no name" value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TopicName {
    /// No name: matches only topics registered without a name.
    #[default]
    Unnamed,
    /// Exact-match name.
    Named(Arc<str>),
}

impl TopicName {
    /// Builds a name, folding the empty string into [`TopicName::Unnamed`].
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        if name.is_empty() {
            Self::Unnamed
        } else {
            Self::Named(Arc::from(name))
        }
    }

    /// Returns the name, or `None` for [`TopicName::Unnamed`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Unnamed => None,
            Self::Named(name) => Some(name),
        }
    }

    /// True for [`TopicName::Unnamed`].
    pub fn is_unnamed(&self) -> bool {
        matches!(self, Self::Unnamed)
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unnamed => f.write_str("<unnamed>"),
            Self::Named(name) => write!(f, "{name:?}"),
        }
    }
}

impl From<&str> for TopicName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TopicName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&String> for TopicName {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl<S: AsRef<str>> From<Option<S>> for TopicName {
    fn from(name: Option<S>) -> Self {
        match name {
            Some(name) => Self::new(name),
            None => Self::Unnamed,
        }
    }
}

/// Exact identity of a topic record.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TopicKey {
    ty: TopicType,
    name: TopicName,
}

impl TopicKey {
    /// Creates a key from its parts.
    pub fn new(ty: TopicType, name: impl Into<TopicName>) -> Self {
        Self {
            ty,
            name: name.into(),
        }
    }

    /// Key for payload type `T`.
    pub fn of<T: ?Sized + 'static>(name: impl Into<TopicName>) -> Self {
        Self::new(TopicType::of::<T>(), name)
    }

    /// Payload type.
    pub fn ty(&self) -> TopicType {
        self.ty
    }

    /// Topic name.
    pub fn name(&self) -> &TopicName {
        &self.name
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ty, self.name)
    }
}
