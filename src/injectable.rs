//! Field injection for struct types.
//!
//! Instead of runtime struct inspection, injectable types declare their
//! dependency-bearing fields explicitly through a [`FieldSet`]: one
//! descriptor per field, each pairing a dependency request with a setter.
//! The declaration is ordinary code, so renaming a field or changing its
//! type breaks the descriptor at compile time.

use crate::error::DiResult;
use crate::parameter::{AnyArc, Dependency, Parameter};

/// A type whose fields can be populated from the container.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use lattice_di::{Container, FieldSet, Injectable};
///
/// struct Database;
/// struct Metrics;
///
/// #[derive(Default)]
/// struct Server {
///     db: Option<Arc<Database>>,
///     metrics: Option<Arc<Metrics>>,
/// }
///
/// impl Injectable for Server {
///     fn fields() -> FieldSet<Self> {
///         FieldSet::new()
///             .field(|s: &mut Self, db: Arc<Database>| s.db = Some(db))
///             .field(|s: &mut Self, m: Option<Arc<Metrics>>| s.metrics = m)
///     }
/// }
///
/// let mut container = Container::new();
/// container.provide(|| Database).register().unwrap();
/// container.provide_injectable::<Server>().register().unwrap();
///
/// let server = container.resolve::<Server>().unwrap();
/// assert!(server.db.is_some());
/// assert!(server.metrics.is_none()); // optional field, no provider
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// The injected fields, in population order.
    fn fields() -> FieldSet<Self>;
}

pub(crate) struct FieldBinding<T> {
    parameter: Parameter,
    apply: Box<dyn Fn(&mut T, Option<AnyArc>) -> DiResult<()> + Send + Sync>,
}

impl<T> FieldBinding<T> {
    pub(crate) fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    pub(crate) fn apply(&self, target: &mut T, slot: Option<AnyArc>) -> DiResult<()> {
        (self.apply)(target, slot)
    }
}

/// Ordered field descriptors for an [`Injectable`] type.
pub struct FieldSet<T> {
    bindings: Vec<FieldBinding<T>>,
}

impl<T: 'static> FieldSet<T> {
    /// An empty field set.
    pub fn new() -> Self {
        FieldSet { bindings: Vec::new() }
    }

    /// Adds a field taking any [`Dependency`] argument type: `Arc<D>` for
    /// required, `Option<Arc<D>>` for optional, `Vec<Arc<D>>` for groups.
    pub fn field<D, F>(self, set: F) -> Self
    where
        D: Dependency,
        F: Fn(&mut T, D) + Send + Sync + 'static,
    {
        self.push(D::parameter(), set)
    }

    /// Like [`field`](Self::field), restricted to a named provider.
    pub fn field_named<D, F>(self, name: &'static str, set: F) -> Self
    where
        D: Dependency,
        F: Fn(&mut T, D) + Send + Sync + 'static,
    {
        self.push(D::parameter().named(name), set)
    }

    /// Like [`field`](Self::field), restricted by a tag pair.
    pub fn field_tagged<D, F>(self, key: &'static str, value: &'static str, set: F) -> Self
    where
        D: Dependency,
        F: Fn(&mut T, D) + Send + Sync + 'static,
    {
        self.push(D::parameter().tagged(key, value), set)
    }

    fn push<D, F>(mut self, parameter: Parameter, set: F) -> Self
    where
        D: Dependency,
        F: Fn(&mut T, D) + Send + Sync + 'static,
    {
        self.bindings.push(FieldBinding {
            parameter,
            apply: Box::new(move |target, slot| {
                set(target, D::extract(slot)?);
                Ok(())
            }),
        });
        self
    }

    pub(crate) fn parameters(&self) -> Vec<Parameter> {
        self.bindings.iter().map(|b| b.parameter.clone()).collect()
    }

    pub(crate) fn into_bindings(self) -> Vec<FieldBinding<T>> {
        self.bindings
    }
}

impl<T: 'static> Default for FieldSet<T> {
    fn default() -> Self {
        FieldSet::new()
    }
}
