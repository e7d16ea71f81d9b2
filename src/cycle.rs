//! Pre-construction dependency cycle detection.

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::provider::DepEdge;
use crate::registry::{EntryId, Registry};

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    /// On the current DFS path.
    Temporary,
    /// Fully explored, known cycle-free.
    Permanent,
}

/// Depth-first walk of the dependency graph reachable from one entry,
/// run before any factory executes so a cycle can never leave a graph
/// half-constructed.
///
/// Edges that match no entry are skipped here; the resolution pass that
/// follows reports those with a precise `NotFound` or `Ambiguous` error.
pub(crate) struct CycleDetector<'r> {
    registry: &'r Registry,
    marks: Vec<Mark>,
}

impl<'r> CycleDetector<'r> {
    pub(crate) fn check(registry: &'r Registry, start: EntryId) -> DiResult<()> {
        let mut detector = CycleDetector {
            registry,
            marks: vec![Mark::Unvisited; registry.len()],
        };
        let mut path = Vec::new();
        detector.visit(start, &mut path)
    }

    fn visit(&mut self, id: EntryId, path: &mut Vec<(EntryId, Key)>) -> DiResult<()> {
        match self.marks[id] {
            Mark::Permanent => return Ok(()),
            Mark::Temporary => return Err(self.cycle_error(id, path)),
            Mark::Unvisited => {}
        }
        self.marks[id] = Mark::Temporary;
        path.push((id, self.registry.entry(id).key.clone()));

        for edge in self.registry.entry(id).provider.edges() {
            match edge {
                DepEdge::Entry(target) => self.visit(target, path)?,
                DepEdge::Param(param) => {
                    if param.is_collect() {
                        for member in self.registry.members(param.key()) {
                            self.visit(member, path)?;
                        }
                    } else if let Ok(target) = self.registry.find(param.key()) {
                        self.visit(target, path)?;
                    }
                }
            }
        }

        path.pop();
        self.marks[id] = Mark::Permanent;
        Ok(())
    }

    /// Builds the error path, trimmed to start at the repeated entry and
    /// closed by repeating it, e.g. `A -> B -> A`.
    fn cycle_error(&self, repeated: EntryId, path: &[(EntryId, Key)]) -> DiError {
        let start = path
            .iter()
            .position(|(id, _)| *id == repeated)
            .unwrap_or(0);
        let mut keys: Vec<Key> = path[start..].iter().map(|(_, key)| key.clone()).collect();
        keys.push(self.registry.entry(repeated).key.clone());
        DiError::Circular(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifetime::Lifetime;
    use crate::parameter::Parameter;
    use crate::provider::{BuildError, CtorProvider, Provider};

    struct A;
    struct B;
    struct C;

    fn ctor_entry(registry: &mut Registry, key: Key, params: Vec<Parameter>) -> EntryId {
        let provider = Provider::Ctor(CtorProvider {
            params,
            build: Box::new(|_| Err(BuildError::Factory("never built".into()))),
        });
        registry.push(key, provider, Lifetime::Singleton)
    }

    #[test]
    fn straight_chain_passes() {
        let mut registry = Registry::default();
        ctor_entry(&mut registry, Key::of::<C>(), vec![]);
        ctor_entry(
            &mut registry,
            Key::of::<B>(),
            vec![Parameter::required(Key::of::<C>())],
        );
        let a = ctor_entry(
            &mut registry,
            Key::of::<A>(),
            vec![Parameter::required(Key::of::<B>())],
        );
        assert!(CycleDetector::check(&registry, a).is_ok());
    }

    #[test]
    fn two_node_cycle_reports_trimmed_path() {
        let mut registry = Registry::default();
        let a = ctor_entry(
            &mut registry,
            Key::of::<A>(),
            vec![Parameter::required(Key::of::<B>())],
        );
        ctor_entry(
            &mut registry,
            Key::of::<B>(),
            vec![Parameter::required(Key::of::<A>())],
        );
        match CycleDetector::check(&registry, a) {
            Err(DiError::Circular(path)) => {
                assert_eq!(path.len(), 3);
                assert_eq!(path[0], path[2]);
            }
            other => panic!("expected cycle, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn cycle_not_through_root_is_trimmed_to_loop() {
        // A -> B -> C -> B: the reported path must not include A.
        let mut registry = Registry::default();
        let a = ctor_entry(
            &mut registry,
            Key::of::<A>(),
            vec![Parameter::required(Key::of::<B>())],
        );
        ctor_entry(
            &mut registry,
            Key::of::<B>(),
            vec![Parameter::required(Key::of::<C>())],
        );
        ctor_entry(
            &mut registry,
            Key::of::<C>(),
            vec![Parameter::required(Key::of::<B>())],
        );
        match CycleDetector::check(&registry, a) {
            Err(DiError::Circular(path)) => {
                assert_eq!(path.len(), 3);
                assert!(path[0].type_name().contains("::B"));
                assert_eq!(path[0], path[2]);
            }
            other => panic!("expected cycle, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let mut registry = Registry::default();
        let a = ctor_entry(
            &mut registry,
            Key::of::<A>(),
            vec![Parameter::required(Key::of::<A>())],
        );
        assert!(matches!(
            CycleDetector::check(&registry, a),
            Err(DiError::Circular(_))
        ));
    }

    #[test]
    fn missing_dependencies_are_skipped_here() {
        let mut registry = Registry::default();
        let a = ctor_entry(
            &mut registry,
            Key::of::<A>(),
            vec![Parameter::required(Key::of::<B>())],
        );
        assert!(CycleDetector::check(&registry, a).is_ok());
    }
}
