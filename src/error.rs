//! Error types for the dependency injection container.

use std::fmt;

use crate::key::Key;

/// Boxed error type accepted from user factories and invocations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Dependency injection errors.
///
/// Every public entry point returns these; the engine never panics on
/// misuse. The variants map one-to-one onto the failure classes of the
/// container: bad registrations, lookups that find nothing or too much,
/// dependency cycles, and failures inside user factories.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{Container, DiError};
///
/// struct Missing;
///
/// let container = Container::new();
/// match container.resolve::<Missing>() {
///     Err(DiError::NotFound(key)) => {
///         assert!(key.type_name().contains("Missing"));
///     }
///     other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
/// }
/// ```
#[derive(Debug)]
pub enum DiError {
    /// Invalid registration (for example an empty tag key).
    Registration(String),
    /// No provider matches the requested identity.
    NotFound(Key),
    /// More than one provider matches and the request has no
    /// disambiguating name or tag. Carries the group alternative that
    /// would succeed.
    Ambiguous {
        /// The requested identity.
        key: Key,
        /// Suggested call that resolves every match instead.
        alternative: String,
    },
    /// A dependency cycle was found before construction. The path is the
    /// ordered identity sequence, trimmed to start at the repeated node.
    Circular(Vec<Key>),
    /// A user factory or decorator returned an error.
    Construction {
        /// Identity being constructed when the factory failed.
        key: Key,
        /// The factory's own error.
        source: BoxError,
    },
    /// An invoked function returned an error.
    Invocation(BoxError),
    /// A stored value failed to downcast to the requested type.
    TypeMismatch(&'static str),
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::Registration(msg) => write!(f, "invalid registration: {}", msg),
            DiError::NotFound(key) => write!(f, "{}: does not exist in the container", key),
            DiError::Ambiguous { key, alternative } => write!(
                f,
                "multiple definitions of {}, use {} to resolve the group",
                key, alternative
            ),
            DiError::Circular(path) => {
                write!(f, "cycle detected: ")?;
                for (i, key) in path.iter().enumerate() {
                    if i > 0 {
                        write!(f, " -> ")?;
                    }
                    write!(f, "{}", key)?;
                }
                Ok(())
            }
            DiError::Construction { key, source } => write!(f, "{}: {}", key, source),
            DiError::Invocation(err) => write!(f, "invocation failed: {}", err),
            DiError::TypeMismatch(name) => write!(f, "type mismatch for {}", name),
        }
    }
}

impl std::error::Error for DiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiError::Construction { source, .. } => Some(source.as_ref()),
            DiError::Invocation(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Result type for DI operations.
pub type DiResult<T> = Result<T, DiError>;

/// Signals an internal invariant violation.
///
/// This is the single panic site of the engine; reaching it means a defect
/// in the container itself (mismatched parameter/value bookkeeping), never
/// user error, and it is deliberately kept out of the public [`DiError`]
/// taxonomy.
#[track_caller]
pub(crate) fn engine_bug(detail: &str) -> ! {
    panic!("lattice-di internal invariant violated: {}", detail)
}
