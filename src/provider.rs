//! Provider representations stored in the registry.
//!
//! Every registration compiles down to one of a small, closed set of
//! provider shapes before it enters the registry. There is no runtime
//! inspection of factory signatures: the shape is fixed by the
//! registration method that created it.

use crate::error::{BoxError, DiError, DiResult};
use crate::lifecycle::Cleanup;
use crate::parameter::{AnyArc, Parameter};
use crate::registry::EntryId;

/// Failure inside a typed build closure, kept separate from [`DiError`]
/// so the container can attach the owning key to factory errors.
pub(crate) enum BuildError {
    /// A dependency extraction or decorator lookup failed.
    Di(DiError),
    /// The user factory itself returned an error.
    Factory(BoxError),
}

impl From<DiError> for BuildError {
    fn from(err: DiError) -> Self {
        BuildError::Di(err)
    }
}

/// Erased build step: takes one resolved slot per declared parameter and
/// yields the stored value plus an optional teardown callback.
pub(crate) type BuildFn =
    Box<dyn Fn(Vec<Option<AnyArc>>) -> Result<(AnyArc, Option<Cleanup>), BuildError> + Send + Sync>;

/// Converts a stored value into the aliased representation, e.g.
/// `Arc<Concrete>` into `Arc<dyn Trait>`.
pub(crate) type CastFn = Box<dyn Fn(&AnyArc) -> DiResult<AnyArc> + Send + Sync>;

/// Factory-backed provider with a statically declared parameter list.
pub(crate) struct CtorProvider {
    pub(crate) params: Vec<Parameter>,
    pub(crate) build: BuildFn,
}

/// Re-exposes another entry's value under a different identity, sharing
/// the underlying instance.
pub(crate) struct AliasProvider {
    pub(crate) target: EntryId,
    pub(crate) cast: CastFn,
}

/// The closed set of provider shapes.
pub(crate) enum Provider {
    /// Builds on demand from resolved parameters.
    Ctor(CtorProvider),
    /// A pre-built value, stored at registration time.
    Value(AnyArc),
    /// Shares another entry's instance under this entry's identity.
    Alias(AliasProvider),
    /// Placeholder left behind when an identity gains multiple
    /// definitions; resolving it directly reports the ambiguity. Carries
    /// the suggested group alternative.
    Stub(String),
}

/// One outgoing dependency edge, for the pre-construction graph walk.
pub(crate) enum DepEdge {
    /// A declared parameter, matched against the registry at walk time.
    Param(Parameter),
    /// A fixed edge to a specific entry, used by aliases so the walk
    /// never re-runs identity matching.
    Entry(EntryId),
}

impl Provider {
    pub(crate) fn edges(&self) -> Vec<DepEdge> {
        match self {
            Provider::Ctor(ctor) => {
                ctor.params.iter().cloned().map(DepEdge::Param).collect()
            }
            Provider::Alias(alias) => vec![DepEdge::Entry(alias.target)],
            Provider::Value(_) | Provider::Stub(_) => Vec::new(),
        }
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Ctor(ctor) => f
                .debug_struct("Ctor")
                .field("params", &ctor.params.len())
                .finish(),
            Provider::Value(_) => f.write_str("Value"),
            Provider::Alias(alias) => {
                f.debug_struct("Alias").field("target", &alias.target).finish()
            }
            Provider::Stub(_) => f.write_str("Stub"),
        }
    }
}
