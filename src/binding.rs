//! Registration builder returned by the container's `provide` family.

use std::sync::Arc;

use crate::container::Container;
use crate::error::{BoxError, DiError, DiResult};
use crate::key::Key;
use crate::lifecycle::Cleanup;
use crate::lifetime::Lifetime;
use crate::parameter::{shared_downcast, shared_erase, AnyArc, Parameter};
use crate::provider::{BuildError, BuildFn, CastFn, CtorProvider, Provider};
use crate::tags::Tags;

pub(crate) type TypedBuild<T> =
    Box<dyn Fn(Vec<Option<AnyArc>>) -> Result<(T, Option<Cleanup>), BuildError> + Send + Sync>;

pub(crate) enum BindingKind<T> {
    /// A pre-built value.
    Value(T),
    /// A factory with declared parameters.
    Build {
        params: Vec<Parameter>,
        build: TypedBuild<T>,
    },
}

/// Pending registration of a provider for `T`.
///
/// Produced by the `provide` family on [`Container`]; nothing enters the
/// container until [`register`](Binding::register) is called. The builder
/// attaches identity (name, tags), lifetime, decorators, and trait
/// bindings to the eventual entry.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use lattice_di::Container;
///
/// trait Greeter: Send + Sync {
///     fn hello(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn hello(&self) -> String {
///         "hello".into()
///     }
/// }
///
/// let mut container = Container::new();
/// container
///     .provide(|| English)
///     .named("english")
///     .as_trait::<dyn Greeter>(|arc| arc)
///     .register()
///     .unwrap();
///
/// let greeter = container.resolve::<dyn Greeter>().unwrap();
/// assert_eq!(greeter.hello(), "hello");
/// ```
#[must_use = "a binding does nothing until .register() is called"]
pub struct Binding<'c, T: Send + Sync + 'static> {
    container: &'c mut Container,
    kind: BindingKind<T>,
    lifetime: Lifetime,
    name: Option<&'static str>,
    tags: Tags,
    decorators: Vec<Box<dyn Fn(T) -> T + Send + Sync>>,
    aliases: Vec<(Key, CastFn)>,
}

impl<'c, T: Send + Sync + 'static> Binding<'c, T> {
    pub(crate) fn new(container: &'c mut Container, kind: BindingKind<T>) -> Self {
        Binding {
            container,
            kind,
            lifetime: Lifetime::Singleton,
            name: None,
            tags: Tags::new(),
            decorators: Vec::new(),
            aliases: Vec::new(),
        }
    }

    /// Attaches a string name, letting several providers of `T` coexist.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Adds a tag pair to the provider identity. A value of `"*"` matches
    /// any requested value for that tag key.
    pub fn tagged(mut self, key: &'static str, value: &'static str) -> Self {
        self.tags.insert(key, value);
        self
    }

    /// Rebuilds the value on every resolution instead of caching it.
    pub fn prototype(mut self) -> Self {
        self.lifetime = Lifetime::Prototype;
        self
    }

    /// Wraps the constructed value before it is stored. Decorators run in
    /// the order added, after the factory and before caching.
    pub fn decorate<F>(mut self, decorator: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        self.decorators.push(Box::new(decorator));
        self
    }

    /// Additionally exposes the provider under the trait-object identity
    /// `U`, sharing the same instance.
    ///
    /// The cast closure is the proof that `T` implements the trait; it is
    /// always the identity coercion, `|arc| arc`. Binding two providers to
    /// the same trait turns direct resolution of that trait into an
    /// ambiguity error while group resolution collects both.
    pub fn as_trait<U>(mut self, cast: fn(Arc<T>) -> Arc<U>) -> Self
    where
        U: ?Sized + Send + Sync + 'static,
    {
        let erased: CastFn = Box::new(move |stored| {
            let typed = shared_downcast::<T>(stored)?;
            Ok(shared_erase(cast(typed)))
        });
        self.aliases.push((Key::of::<U>(), erased));
        self
    }

    /// Commits the registration to the container.
    pub fn register(self) -> DiResult<()> {
        let mut key = Key::of::<T>();
        if let Some(name) = self.name {
            if name.is_empty() {
                return Err(DiError::Registration("provider name must not be empty".into()));
            }
            key = key.named(name);
        }
        for (tag_key, _) in self.tags.iter() {
            if tag_key.is_empty() {
                return Err(DiError::Registration("tag key must not be empty".into()));
            }
        }
        key = key.with_tags(self.tags.clone());

        let decorators = self.decorators;
        let provider = match self.kind {
            BindingKind::Value(value) => {
                let value = decorators.iter().fold(value, |v, d| d(v));
                Provider::Value(shared_erase(Arc::new(value)))
            }
            BindingKind::Build { params, build } => {
                let erased: BuildFn = Box::new(move |values| {
                    let (value, cleanup) = build(values)?;
                    let value = decorators.iter().fold(value, |v, d| d(v));
                    Ok((shared_erase(Arc::new(value)), cleanup))
                });
                Provider::Ctor(CtorProvider { params, build: erased })
            }
        };

        let lifetime = self.lifetime;
        let registry = self.container.registry_mut();
        let id = registry.push(key.clone(), provider, lifetime);
        for (type_key, cast) in self.aliases {
            let mut alias_key = type_key;
            if let Some(name) = key.name() {
                alias_key = alias_key.named(name);
            }
            alias_key = alias_key.with_tags(key.tags().clone());
            registry.push_alias(alias_key, id, cast, lifetime);
        }
        Ok(())
    }
}

impl<T: Send + Sync + 'static> std::fmt::Debug for Binding<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("type", &std::any::type_name::<T>())
            .field("lifetime", &self.lifetime)
            .field("name", &self.name)
            .finish()
    }
}

/// Maps a factory error into the build pipeline.
pub(crate) fn factory_err<E: Into<BoxError>>(err: E) -> BuildError {
    BuildError::Factory(err.into())
}
