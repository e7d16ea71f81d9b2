//! Teardown callbacks and the container's cleanup stack.

use parking_lot::Mutex;

/// A zero-argument teardown callback registered at construction time.
///
/// Factories that own a resource return one of these next to the built
/// value; the container appends it to its cleanup stack and runs it during
/// [`Container::cleanup`](crate::Container::cleanup).
///
/// # Examples
///
/// ```rust
/// use lattice_di::{Cleanup, Container};
///
/// struct Listener;
///
/// let mut container = Container::new();
/// container
///     .provide_with_cleanup(|| (Listener, Cleanup::new(|| println!("closed"))))
///     .register()
///     .unwrap();
///
/// container.resolve::<Listener>().unwrap();
/// container.cleanup(); // prints "closed"
/// ```
pub struct Cleanup(Box<dyn FnOnce() + Send>);

impl Cleanup {
    /// Wraps a teardown closure.
    pub fn new<F: FnOnce() + Send + 'static>(f: F) -> Self {
        Cleanup(Box::new(f))
    }

    pub(crate) fn run(self) {
        (self.0)()
    }
}

impl std::fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Cleanup")
    }
}

/// Append-only stack of cleanups, drained last-registered-first.
///
/// A value can only register its cleanup after all of its dependencies
/// have been constructed (and registered theirs), so reverse order tears
/// dependents down before their dependencies.
#[derive(Default)]
pub(crate) struct CleanupStack {
    entries: Mutex<Vec<Cleanup>>,
}

impl CleanupStack {
    pub(crate) fn push(&self, cleanup: Cleanup) {
        self.entries.lock().push(cleanup);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Drains and runs every entry in reverse registration order.
    pub(crate) fn drain_reverse(&self) {
        // Take the whole stack first so cleanups that resolve or register
        // never deadlock on the stack lock.
        let mut entries = std::mem::take(&mut *self.entries.lock());
        while let Some(cleanup) = entries.pop() {
            cleanup.run();
        }
    }
}
