//! Resolution lifecycle hooks.

use crate::key::Key;

/// Hooks called by the container around resolution and cleanup.
///
/// The container always carries exactly one observer; by default it is
/// [`NoopObserver`], so the hot path pays nothing for observability it
/// does not use. Install [`LoggingObserver`] or a custom implementation
/// with [`Container::with_observer`](crate::Container::with_observer).
pub trait ResolutionObserver: Send + Sync + 'static {
    /// A resolution of `key` is starting. Called for cache hits too.
    fn resolving(&self, _key: &Key) {}

    /// A value for `key` was constructed (not served from cache).
    fn built(&self, _key: &Key) {}

    /// Cleanup is about to run `pending` teardown callbacks.
    fn cleanup_started(&self, _pending: usize) {}
}

/// Observer that does nothing. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ResolutionObserver for NoopObserver {}

/// Observer that reports through the `log` facade: constructions and
/// cleanup at debug level, individual resolutions at trace level.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{Container, LoggingObserver};
///
/// let mut container = Container::new().with_observer(LoggingObserver);
/// container.provide(|| 42u32).register().unwrap();
/// container.resolve::<u32>().unwrap(); // logs "built u32"
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl ResolutionObserver for LoggingObserver {
    fn resolving(&self, key: &Key) {
        log::trace!("resolving {}", key);
    }

    fn built(&self, key: &Key) {
        log::debug!("built {}", key);
    }

    fn cleanup_started(&self, pending: usize) {
        log::debug!("running {} cleanup callbacks", pending);
    }
}
