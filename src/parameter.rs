//! Declared dependencies of a provider and their argument-type mapping.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;

/// Type-erased shared handle used for all stored values.
///
/// Every resolved value is stored as `Arc<Arc<T>>` erased to this type,
/// uniformly for concrete types and trait objects, so a single downcast
/// path serves both.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Recovers the canonical `Arc<T>` handle from a stored value.
pub(crate) fn shared_downcast<T>(any: &AnyArc) -> DiResult<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    any.clone()
        .downcast::<Arc<T>>()
        .map(|outer| (*outer).clone())
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

/// Wraps a freshly built `Arc<T>` into the stored representation.
pub(crate) fn shared_erase<T>(value: Arc<T>) -> AnyArc
where
    T: ?Sized + Send + Sync + 'static,
{
    Arc::new(value)
}

/// One declared dependency of a provider: a target identity plus the
/// optional and group-collection flags.
///
/// Parameters are produced from constructor argument types through the
/// [`Dependency`] trait and drive both cycle detection and resolution
/// order.
#[derive(Debug, Clone)]
pub struct Parameter {
    key: Key,
    optional: bool,
    collect: bool,
}

impl Parameter {
    /// A required single dependency.
    pub fn required(key: Key) -> Self {
        Parameter { key, optional: false, collect: false }
    }

    /// An optional single dependency. A missing provider yields the zero
    /// value (`None`) instead of an error.
    pub fn optional(key: Key) -> Self {
        Parameter { key, optional: true, collect: false }
    }

    /// A group dependency collecting every provider of the keyed type, in
    /// registration order.
    pub fn collect(key: Key) -> Self {
        Parameter { key, optional: false, collect: true }
    }

    /// Returns a copy of this parameter with a name filter on its key.
    pub fn named(mut self, name: &'static str) -> Self {
        self.key = self.key.named(name);
        self
    }

    /// Returns a copy of this parameter with a tag filter added to its key.
    pub fn tagged(mut self, key: &'static str, value: &'static str) -> Self {
        self.key = self.key.tagged(key, value);
        self
    }

    /// The target identity.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Whether a missing provider is tolerated.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether this collects a group rather than a single value.
    pub fn is_collect(&self) -> bool {
        self.collect
    }
}

/// Maps a constructor argument type to a [`Parameter`] and back from a
/// resolved value.
///
/// Three families of argument types are supported out of the box:
///
/// - `Arc<T>` — required dependency on `T` (which may be a trait object),
/// - `Option<Arc<T>>` — optional dependency; `None` when unprovided,
/// - `Vec<Arc<T>>` — group dependency on every provider of `T`, in
///   registration order.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use lattice_di::{Container, Dependency};
///
/// struct Config;
/// struct Service { config: Arc<Config> }
///
/// // `Arc<Config>` declares a required parameter on `Config`.
/// let param = <Arc<Config> as Dependency>::parameter();
/// assert!(!param.is_optional());
///
/// let mut container = Container::new();
/// container.provide(|| Config).register().unwrap();
/// container
///     .provide(|config: Arc<Config>| Service { config })
///     .register()
///     .unwrap();
/// assert!(container.resolve::<Service>().is_ok());
/// ```
pub trait Dependency: Sized + 'static {
    /// The parameter this argument type declares.
    fn parameter() -> Parameter;

    /// Rebuilds the typed argument from the resolved slot. `None` is only
    /// passed for optional parameters whose provider is missing.
    fn extract(slot: Option<AnyArc>) -> DiResult<Self>;
}

impl<T> Dependency for Arc<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn parameter() -> Parameter {
        Parameter::required(Key::of::<T>())
    }

    fn extract(slot: Option<AnyArc>) -> DiResult<Self> {
        match slot {
            Some(any) => shared_downcast::<T>(&any),
            None => crate::error::engine_bug("required parameter resolved without a value"),
        }
    }
}

impl<T> Dependency for Option<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn parameter() -> Parameter {
        Parameter::optional(Key::of::<T>())
    }

    fn extract(slot: Option<AnyArc>) -> DiResult<Self> {
        slot.map(|any| shared_downcast::<T>(&any)).transpose()
    }
}

impl<T> Dependency for Vec<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn parameter() -> Parameter {
        Parameter::collect(Key::of::<T>())
    }

    fn extract(slot: Option<AnyArc>) -> DiResult<Self> {
        let any = match slot {
            Some(any) => any,
            None => crate::error::engine_bug("group parameter resolved without a value"),
        };
        let members = any
            .downcast::<Vec<AnyArc>>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))?;
        members.iter().map(shared_downcast::<T>).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Value(u32);

    #[test]
    fn erase_and_downcast_round_trip() {
        let stored = shared_erase(Arc::new(Value(7)));
        let back = shared_downcast::<Value>(&stored).unwrap();
        assert_eq!(back.0, 7);
        assert!(shared_downcast::<String>(&stored).is_err());
    }

    #[test]
    fn argument_families_declare_expected_parameters() {
        assert!(!<Arc<Value> as Dependency>::parameter().is_optional());
        assert!(<Option<Arc<Value>> as Dependency>::parameter().is_optional());
        assert!(<Vec<Arc<Value>> as Dependency>::parameter().is_collect());
    }

    #[test]
    fn optional_extracts_none_for_missing_slot() {
        let got = <Option<Arc<Value>> as Dependency>::extract(None).unwrap();
        assert!(got.is_none());
    }
}
