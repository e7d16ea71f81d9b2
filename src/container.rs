//! The container: registration surface and lazy resolution engine.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::binding::{factory_err, Binding, BindingKind};
use crate::cycle::CycleDetector;
use crate::error::{BoxError, DiError, DiResult};
use crate::factory::Constructor;
use crate::injectable::Injectable;
use crate::key::Key;
use crate::lifecycle::{Cleanup, CleanupStack};
use crate::observer::{NoopObserver, ResolutionObserver};
use crate::parameter::{shared_downcast, AnyArc, Parameter};
use crate::provider::{BuildError, Provider};
use crate::registry::{EntryId, Registry};
use crate::tags::Tags;

/// Name and tag filters for a resolution request.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{Container, ResolveOptions};
///
/// struct Db(&'static str);
///
/// let mut container = Container::new();
/// container.provide(|| Db("primary")).named("primary").register().unwrap();
/// container.provide(|| Db("replica")).named("replica").register().unwrap();
///
/// let db = container
///     .resolve_with::<Db>(ResolveOptions::new().named("replica"))
///     .unwrap();
/// assert_eq!(db.0, "replica");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    name: Option<&'static str>,
    tags: Tags,
}

impl ResolveOptions {
    /// No filters: matches any provider of the requested type.
    pub fn new() -> Self {
        ResolveOptions::default()
    }

    /// Restricts the request to a named provider.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Restricts the request to providers carrying the tag pair.
    pub fn tagged(mut self, key: &'static str, value: &'static str) -> Self {
        self.tags.insert(key, value);
        self
    }

    fn key_for<T: ?Sized + 'static>(&self) -> Key {
        let mut key = Key::of::<T>();
        if let Some(name) = self.name {
            key = key.named(name);
        }
        key.with_tags(self.tags.clone())
    }
}

/// One member of a group, resolvable on demand.
///
/// Returned by [`Container::iterate`]; nothing is constructed until
/// [`load`](GroupItem::load) is called, so a caller can inspect keys and
/// build only the members it wants.
pub struct GroupItem<'c, T: ?Sized> {
    container: &'c Container,
    id: EntryId,
    key: Key,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<'c, T: ?Sized + Send + Sync + 'static> GroupItem<'c, T> {
    /// The member's registered identity.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Resolves this member, constructing it if needed.
    pub fn load(&self) -> DiResult<Arc<T>> {
        let value = self.container.resolve_root(self.id)?;
        shared_downcast::<T>(&value)
    }
}

impl<T: ?Sized> std::fmt::Debug for GroupItem<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupItem").field("key", &self.key).finish()
    }
}

/// Dependency injection container.
///
/// Providers are registered up front through the `provide` family and
/// built lazily: nothing is constructed until first requested, and a
/// singleton (the default) is constructed exactly once no matter how many
/// consumers share it. Before any factory runs, the dependency graph
/// reachable from the request is walked for cycles, so a cyclic graph
/// fails cleanly instead of recursing forever.
///
/// Registration takes `&mut self`; resolution takes `&self` and is safe
/// to share across threads.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use lattice_di::Container;
///
/// struct Config {
///     addr: &'static str,
/// }
/// struct Server {
///     config: Arc<Config>,
/// }
///
/// let mut container = Container::new();
/// container.provide(|| Config { addr: "127.0.0.1:8080" }).register().unwrap();
/// container
///     .provide(|config: Arc<Config>| Server { config })
///     .register()
///     .unwrap();
///
/// let server = container.resolve::<Server>().unwrap();
/// assert_eq!(server.config.addr, "127.0.0.1:8080");
/// ```
pub struct Container {
    registry: Registry,
    cleanups: CleanupStack,
    observer: Box<dyn ResolutionObserver>,
}

impl Container {
    /// Creates an empty container with the no-op observer.
    pub fn new() -> Self {
        Container {
            registry: Registry::default(),
            cleanups: CleanupStack::default(),
            observer: Box::new(NoopObserver),
        }
    }

    /// Replaces the observer, builder style.
    pub fn with_observer<O: ResolutionObserver>(mut self, observer: O) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Replaces the observer in place.
    pub fn set_observer<O: ResolutionObserver>(&mut self, observer: O) {
        self.observer = Box::new(observer);
    }

    pub(crate) fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    // --- registration -----------------------------------------------------

    /// Registers an infallible factory for `T`.
    ///
    /// The factory's arguments are resolved from the container: `Arc<D>`
    /// for required dependencies, `Option<Arc<D>>` for optional ones, and
    /// `Vec<Arc<D>>` to collect every provider of `D`.
    pub fn provide<F, Deps, T>(&mut self, factory: F) -> Binding<'_, T>
    where
        F: Constructor<Deps, T>,
        T: Send + Sync + 'static,
    {
        Binding::new(
            self,
            BindingKind::Build {
                params: F::parameters(),
                build: Box::new(move |values| {
                    let value = factory.invoke(values)?;
                    Ok((value, None))
                }),
            },
        )
    }

    /// Registers a fallible factory for `T`. A returned error surfaces as
    /// [`DiError::Construction`] at resolution time.
    pub fn try_provide<F, Deps, T, E>(&mut self, factory: F) -> Binding<'_, T>
    where
        F: Constructor<Deps, Result<T, E>>,
        T: Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        Binding::new(
            self,
            BindingKind::Build {
                params: F::parameters(),
                build: Box::new(move |values| {
                    let value = factory.invoke(values)?.map_err(factory_err)?;
                    Ok((value, None))
                }),
            },
        )
    }

    /// Registers a factory returning a value together with its teardown
    /// callback. Cleanups run in reverse construction order during
    /// [`cleanup`](Container::cleanup).
    pub fn provide_with_cleanup<F, Deps, T>(&mut self, factory: F) -> Binding<'_, T>
    where
        F: Constructor<Deps, (T, Cleanup)>,
        T: Send + Sync + 'static,
    {
        Binding::new(
            self,
            BindingKind::Build {
                params: F::parameters(),
                build: Box::new(move |values| {
                    let (value, cleanup) = factory.invoke(values)?;
                    Ok((value, Some(cleanup)))
                }),
            },
        )
    }

    /// Registers a fallible factory returning a value and its teardown
    /// callback.
    pub fn try_provide_with_cleanup<F, Deps, T, E>(&mut self, factory: F) -> Binding<'_, T>
    where
        F: Constructor<Deps, Result<(T, Cleanup), E>>,
        T: Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        Binding::new(
            self,
            BindingKind::Build {
                params: F::parameters(),
                build: Box::new(move |values| {
                    let (value, cleanup) = factory.invoke(values)?.map_err(factory_err)?;
                    Ok((value, Some(cleanup)))
                }),
            },
        )
    }

    /// Registers an already-constructed value.
    pub fn provide_value<T>(&mut self, value: T) -> Binding<'_, T>
    where
        T: Send + Sync + 'static,
    {
        Binding::new(self, BindingKind::Value(value))
    }

    /// Registers an [`Injectable`] type built from its default value with
    /// every declared field populated from the container.
    pub fn provide_injectable<T>(&mut self) -> Binding<'_, T>
    where
        T: Injectable + Default,
    {
        let fields = T::fields();
        let params = fields.parameters();
        let bindings = fields.into_bindings();
        Binding::new(
            self,
            BindingKind::Build {
                params,
                build: Box::new(move |values| {
                    if values.len() != bindings.len() {
                        crate::error::engine_bug("field value count does not match field set");
                    }
                    let mut target = T::default();
                    for (binding, slot) in bindings.iter().zip(values) {
                        binding.apply(&mut target, slot).map_err(BuildError::Di)?;
                    }
                    Ok((target, None))
                }),
            },
        )
    }

    // --- resolution -------------------------------------------------------

    /// Resolves the single provider of `T`, constructing it and any
    /// dependencies on first use.
    pub fn resolve<T>(&self) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve_with(ResolveOptions::new())
    }

    /// Resolves `T` with name and tag filters.
    pub fn resolve_with<T>(&self, options: ResolveOptions) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = options.key_for::<T>();
        let id = self.registry.find(&key)?;
        let value = self.resolve_root(id)?;
        shared_downcast::<T>(&value)
    }

    /// Resolves every provider of `T`, in registration order.
    ///
    /// Unlike [`resolve`](Container::resolve), this succeeds when `T` has
    /// multiple providers; it fails with [`DiError::NotFound`] when it has
    /// none.
    pub fn resolve_all<T>(&self) -> DiResult<Vec<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve_all_with(ResolveOptions::new())
    }

    /// Resolves every provider of `T` matching the filters.
    pub fn resolve_all_with<T>(&self, options: ResolveOptions) -> DiResult<Vec<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = options.key_for::<T>();
        let members = self.registry.members(&key);
        if members.is_empty() {
            return Err(DiError::NotFound(key));
        }
        members
            .into_iter()
            .map(|id| {
                let value = self.resolve_root(id)?;
                shared_downcast::<T>(&value)
            })
            .collect()
    }

    /// Whether a direct request for `T` would find a provider. Nothing is
    /// constructed; an ambiguous identity still counts as present.
    pub fn has<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.has_with::<T>(ResolveOptions::new())
    }

    /// [`has`](Container::has) with name and tag filters.
    pub fn has_with<T>(&self, options: ResolveOptions) -> bool
    where
        T: ?Sized + 'static,
    {
        matches!(
            self.registry.find(&options.key_for::<T>()),
            Ok(_) | Err(DiError::Ambiguous { .. })
        )
    }

    /// Calls a function with its arguments resolved from the container and
    /// returns its result.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use lattice_di::Container;
    ///
    /// struct Config(u16);
    ///
    /// let mut container = Container::new();
    /// container.provide(|| Config(8080)).register().unwrap();
    ///
    /// let port = container.invoke(|config: Arc<Config>| config.0).unwrap();
    /// assert_eq!(port, 8080);
    /// ```
    pub fn invoke<F, Deps, Out>(&self, f: F) -> DiResult<Out>
    where
        F: Constructor<Deps, Out>,
    {
        let params = F::parameters();
        let mut values = Vec::with_capacity(params.len());
        for param in &params {
            values.push(self.resolve_parameter(param, true)?);
        }
        f.invoke(values)
    }

    /// Like [`invoke`](Container::invoke) for fallible functions; the
    /// function's own error surfaces as [`DiError::Invocation`].
    pub fn try_invoke<F, Deps, Out, E>(&self, f: F) -> DiResult<Out>
    where
        F: Constructor<Deps, Result<Out, E>>,
        E: Into<BoxError>,
    {
        self.invoke(f)?.map_err(|err| DiError::Invocation(err.into()))
    }

    /// Lists every provider of `T` as lazily loadable items, letting the
    /// caller construct only the members it needs.
    pub fn iterate<T>(&self) -> DiResult<Vec<GroupItem<'_, T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.iterate_with(ResolveOptions::new())
    }

    /// [`iterate`](Container::iterate) with name and tag filters.
    pub fn iterate_with<T>(&self, options: ResolveOptions) -> DiResult<Vec<GroupItem<'_, T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = options.key_for::<T>();
        let members = self.registry.members(&key);
        if members.is_empty() {
            return Err(DiError::NotFound(key));
        }
        Ok(members
            .into_iter()
            .map(|id| GroupItem {
                container: self,
                id,
                key: self.registry.entry(id).key.clone(),
                _marker: PhantomData,
            })
            .collect())
    }

    /// Populates the declared fields of an existing value from the
    /// container.
    pub fn inject<T: Injectable>(&self, target: &mut T) -> DiResult<()> {
        for binding in T::fields().into_bindings() {
            let slot = self.resolve_parameter(binding.parameter(), true)?;
            binding.apply(target, slot)?;
        }
        Ok(())
    }

    /// Runs every registered teardown callback in reverse construction
    /// order and empties the stack. Also runs on drop for anything still
    /// pending.
    pub fn cleanup(&self) {
        self.observer.cleanup_started(self.cleanups.len());
        self.cleanups.drain_reverse();
    }

    // --- engine -----------------------------------------------------------

    /// Entry-point resolution: cycle-checks the reachable subgraph first,
    /// then resolves.
    fn resolve_root(&self, id: EntryId) -> DiResult<AnyArc> {
        CycleDetector::check(&self.registry, id)?;
        self.resolve_entry(id)
    }

    fn resolve_entry(&self, id: EntryId) -> DiResult<AnyArc> {
        let entry = self.registry.entry(id);
        self.observer.resolving(&entry.key);
        if entry.lifetime.is_singleton() {
            entry
                .cell
                .get_or_try_init(|| self.build_entry(id))
                .map(Clone::clone)
        } else {
            self.build_entry(id)
        }
    }

    fn build_entry(&self, id: EntryId) -> DiResult<AnyArc> {
        let entry = self.registry.entry(id);
        match &entry.provider {
            Provider::Value(stored) => Ok(stored.clone()),
            Provider::Stub(alternative) => Err(DiError::Ambiguous {
                key: entry.key.clone(),
                alternative: alternative.clone(),
            }),
            Provider::Alias(alias) => {
                let inner = self.resolve_entry(alias.target)?;
                (alias.cast)(&inner)
            }
            Provider::Ctor(ctor) => {
                let mut values = Vec::with_capacity(ctor.params.len());
                for param in &ctor.params {
                    values.push(self.resolve_parameter(param, false)?);
                }
                let (value, cleanup) = (ctor.build)(values).map_err(|err| match err {
                    BuildError::Di(err) => err,
                    BuildError::Factory(source) => DiError::Construction {
                        key: entry.key.clone(),
                        source,
                    },
                })?;
                if let Some(cleanup) = cleanup {
                    self.cleanups.push(cleanup);
                }
                self.observer.built(&entry.key);
                Ok(value)
            }
        }
    }

    /// Resolves one declared parameter. `root` requests run the cycle
    /// check; nested calls during a build are already covered by the check
    /// at their root.
    fn resolve_parameter(&self, param: &Parameter, root: bool) -> DiResult<Option<AnyArc>> {
        let get = |id: EntryId| {
            if root {
                self.resolve_root(id)
            } else {
                self.resolve_entry(id)
            }
        };
        if param.is_collect() {
            let members = self.registry.members(param.key());
            if members.is_empty() {
                return Err(DiError::NotFound(param.key().clone()));
            }
            let mut collected: Vec<AnyArc> = Vec::with_capacity(members.len());
            for id in members {
                collected.push(get(id)?);
            }
            // The collected vector is assembled fresh per request, never
            // cached, so later registrations are picked up.
            Ok(Some(Arc::new(collected) as AnyArc))
        } else {
            match self.registry.find(param.key()) {
                Ok(id) => Ok(Some(get(id)?)),
                Err(DiError::NotFound(_)) if param.is_optional() => Ok(None),
                Err(err) => Err(err),
            }
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Container::new()
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        self.cleanups.drain_reverse();
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("entries", &self.registry.len())
            .field("pending_cleanups", &self.cleanups.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Config(&'static str);
    struct Service {
        config: Arc<Config>,
    }

    #[test]
    fn singleton_is_constructed_once_and_shared() {
        static BUILDS: AtomicUsize = AtomicUsize::new(0);
        let mut container = Container::new();
        container
            .provide(|| {
                BUILDS.fetch_add(1, Ordering::SeqCst);
                Config("x")
            })
            .register()
            .unwrap();

        let a = container.resolve::<Config>().unwrap();
        let b = container.resolve::<Config>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn prototype_builds_fresh_each_time() {
        let mut container = Container::new();
        container.provide(|| Config("x")).prototype().register().unwrap();

        let a = container.resolve::<Config>().unwrap();
        let b = container.resolve::<Config>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn dependencies_resolve_recursively() {
        let mut container = Container::new();
        container.provide(|| Config("addr")).register().unwrap();
        container
            .provide(|config: Arc<Config>| Service { config })
            .register()
            .unwrap();

        let service = container.resolve::<Service>().unwrap();
        assert_eq!(service.config.0, "addr");
    }

    #[test]
    fn nothing_is_built_until_requested() {
        static BUILDS: AtomicUsize = AtomicUsize::new(0);
        let mut container = Container::new();
        container
            .provide(|| {
                BUILDS.fetch_add(1, Ordering::SeqCst);
                Config("x")
            })
            .register()
            .unwrap();

        assert_eq!(BUILDS.load(Ordering::SeqCst), 0);
        assert!(container.has::<Config>());
        assert_eq!(BUILDS.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn optional_dependency_tolerates_missing_provider() {
        struct Maybe {
            config: Option<Arc<Config>>,
        }

        let mut container = Container::new();
        container
            .provide(|config: Option<Arc<Config>>| Maybe { config })
            .register()
            .unwrap();

        let maybe = container.resolve::<Maybe>().unwrap();
        assert!(maybe.config.is_none());
    }

    #[test]
    fn decorators_run_in_order_before_caching() {
        let mut container = Container::new();
        container
            .provide(|| String::from("a"))
            .decorate(|s| s + "b")
            .decorate(|s| s + "c")
            .register()
            .unwrap();

        assert_eq!(*container.resolve::<String>().unwrap(), "abc");
    }

    #[test]
    fn factory_error_carries_the_key() {
        struct Broken;

        let mut container = Container::new();
        container
            .try_provide(|| Err::<Broken, _>("db offline"))
            .register()
            .unwrap();

        match container.resolve::<Broken>() {
            Err(DiError::Construction { key, source }) => {
                assert!(key.type_name().contains("Broken"));
                assert_eq!(source.to_string(), "db offline");
            }
            other => panic!("expected construction error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn value_registration_resolves_without_factory() {
        let mut container = Container::new();
        container.provide_value(Config("static")).register().unwrap();
        assert_eq!(container.resolve::<Config>().unwrap().0, "static");
    }
}
