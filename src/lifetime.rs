//! Provider lifetimes controlling instance caching behavior.

/// How a provider's value is cached between resolutions.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use lattice_di::Container;
///
/// struct Counter(u32);
///
/// let mut container = Container::new();
/// container.provide(|| Counter(0)).register().unwrap();
///
/// let a = container.resolve::<Counter>().unwrap();
/// let b = container.resolve::<Counter>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b)); // singletons are shared
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Built once on first resolution and shared by every consumer,
    /// anywhere in the graph. This is the default.
    Singleton,
    /// Built fresh on every resolution, never cached. Each construction
    /// registers its own cleanup entry.
    Prototype,
}

impl Lifetime {
    /// True for [`Lifetime::Singleton`].
    pub fn is_singleton(self) -> bool {
        matches!(self, Lifetime::Singleton)
    }
}
