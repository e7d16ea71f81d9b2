//! Provider identity keys.

use std::any::TypeId;
use std::fmt;

use crate::tags::Tags;

/// Identity of a requested or registered dependency.
///
/// A key names a type plus an optional string name and an optional tag set.
/// Registration attaches a key to every provider; resolution builds a key
/// from the requested type and any name/tag filters and matches it against
/// the registry.
///
/// Two registered keys may be equal — the container allows it and reports
/// the ambiguity at resolution time unless the request disambiguates.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{Key, Tags};
///
/// struct Database;
///
/// let plain = Key::of::<Database>();
/// let named = Key::of::<Database>().named("replica");
/// assert_ne!(plain, named);
/// assert_eq!(named.name(), Some("replica"));
///
/// let tagged = Key::of::<Database>().with_tags(Tags::new().with("zone", "eu"));
/// assert!(tagged.to_string().contains("[zone:eu]"));
/// ```
#[derive(Debug, Clone)]
pub struct Key {
    type_id: TypeId,
    type_name: &'static str,
    name: Option<&'static str>,
    tags: Tags,
}

impl Key {
    /// Builds the unnamed, untagged key for `T`.
    ///
    /// `T` may be unsized, so trait-object identities like `dyn Logger`
    /// work directly.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Key {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            name: None,
            tags: Tags::new(),
        }
    }

    /// Returns a copy of this key with a string name attached.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Returns a copy of this key with the given tag added.
    pub fn tagged(mut self, key: &'static str, value: &'static str) -> Self {
        self.tags.insert(key, value);
        self
    }

    /// Returns a copy of this key with the whole tag set replaced.
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// The `TypeId` component.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Human-readable type name, as produced by `std::any::type_name`.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The optional string name.
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    /// The attached tag set.
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Whether a registered key satisfies this requested key.
    ///
    /// The type must match exactly, a requested name must match the stored
    /// name, and stored tags must be a superset of requested tags (see
    /// [`Tags::matches`]).
    pub(crate) fn satisfied_by(&self, stored: &Key) -> bool {
        if self.type_id != stored.type_id {
            return false;
        }
        if let Some(wanted) = self.name {
            if stored.name != Some(wanted) {
                return false;
            }
        }
        stored.tags.matches(&self.tags)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.name == other.name && self.tags == other.tags
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.name.hash(state);
        self.tags.hash(state);
    }
}

impl fmt::Display for Key {
    /// Renders as `Type`, `Type[name]`, or `Type[name][k:v]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name)?;
        if let Some(name) = self.name {
            write!(f, "[{}]", name)?;
        }
        write!(f, "{}", self.tags)
    }
}
