//! Entry storage and identity matching.

use std::any::TypeId;
use std::collections::HashMap;

use once_cell::sync::OnceCell;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::parameter::AnyArc;
use crate::provider::{AliasProvider, CastFn, Provider};

/// Index of an entry in the registry, stable for the container's lifetime.
pub(crate) type EntryId = usize;

/// One registered provider together with its identity, lifetime, and
/// singleton cell.
pub(crate) struct Entry {
    pub(crate) key: Key,
    pub(crate) provider: Provider,
    pub(crate) lifetime: Lifetime,
    /// Filled exactly once for singletons; prototypes never touch it.
    pub(crate) cell: OnceCell<AnyArc>,
    /// True when the entry only participates in group collection and is
    /// invisible to single-value lookups.
    pub(crate) grouped_only: bool,
}

/// Append-only store of entries with a per-type index.
///
/// Entries are never removed or reordered, so an [`EntryId`] handed out
/// once stays valid and group collection preserves registration order.
#[derive(Default)]
pub(crate) struct Registry {
    entries: Vec<Entry>,
    by_type: HashMap<TypeId, Vec<EntryId>>,
}

impl Registry {
    pub(crate) fn entry(&self, id: EntryId) -> &Entry {
        match self.entries.get(id) {
            Some(entry) => entry,
            None => crate::error::engine_bug("entry id out of range"),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Appends a regular entry and returns its id.
    pub(crate) fn push(&mut self, key: Key, provider: Provider, lifetime: Lifetime) -> EntryId {
        let id = self.entries.len();
        self.by_type.entry(key.type_id()).or_default().push(id);
        self.entries.push(Entry {
            key,
            provider,
            lifetime,
            cell: OnceCell::new(),
            grouped_only: false,
        });
        id
    }

    /// Appends an alias entry re-exposing `target` under `key`.
    ///
    /// The first alias for an identity is a regular entry. When a second
    /// definition of the same identity arrives, the existing entry is
    /// demoted to group-only membership and a stub takes over the direct
    /// slot, so single-value lookups report the ambiguity while group
    /// collection sees every definition in registration order.
    pub(crate) fn push_alias(
        &mut self,
        key: Key,
        target: EntryId,
        cast: CastFn,
        lifetime: Lifetime,
    ) -> EntryId {
        let alias = Provider::Alias(AliasProvider { target, cast });
        let existing: Vec<EntryId> = self
            .candidates(&key)
            .filter(|&id| !self.entries[id].grouped_only && self.entries[id].key == key)
            .collect();

        let mut has_stub = false;
        for id in existing {
            if matches!(self.entries[id].provider, Provider::Stub(_)) {
                has_stub = true;
            } else {
                self.entries[id].grouped_only = true;
            }
        }
        if !has_stub && self.grouped_members_exist(&key) {
            let alternative = group_alternative(&key);
            let stub_key = key.clone();
            let id = self.entries.len();
            self.by_type.entry(stub_key.type_id()).or_default().push(id);
            self.entries.push(Entry {
                key: stub_key,
                provider: Provider::Stub(alternative),
                lifetime: Lifetime::Singleton,
                cell: OnceCell::new(),
                grouped_only: false,
            });
        }

        let grouped = has_stub || self.grouped_members_exist(&key);
        let id = self.entries.len();
        self.by_type.entry(key.type_id()).or_default().push(id);
        self.entries.push(Entry {
            key,
            provider: alias,
            lifetime,
            cell: OnceCell::new(),
            grouped_only: grouped,
        });
        id
    }

    /// Finds the single entry that serves a direct request for `key`.
    ///
    /// Zero matches is [`DiError::NotFound`]; more than one is
    /// [`DiError::Ambiguous`], pointing the caller at group resolution.
    pub(crate) fn find(&self, key: &Key) -> DiResult<EntryId> {
        let mut matches = self
            .candidates(key)
            .filter(|&id| !self.entries[id].grouped_only && key.satisfied_by(&self.entries[id].key));
        let first = match matches.next() {
            Some(id) => id,
            None => return Err(DiError::NotFound(key.clone())),
        };
        if matches.next().is_some() {
            return Err(DiError::Ambiguous {
                key: key.clone(),
                alternative: group_alternative(key),
            });
        }
        Ok(first)
    }

    /// Every buildable entry matching `key`, in registration order. Group
    /// collection sees demoted entries but never stubs.
    pub(crate) fn members(&self, key: &Key) -> Vec<EntryId> {
        self.candidates(key)
            .filter(|&id| {
                !matches!(self.entries[id].provider, Provider::Stub(_))
                    && key.satisfied_by(&self.entries[id].key)
            })
            .collect()
    }

    fn candidates<'a>(&'a self, key: &Key) -> impl Iterator<Item = EntryId> + 'a {
        self.by_type
            .get(&key.type_id())
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
            .iter()
            .copied()
    }

    fn grouped_members_exist(&self, key: &Key) -> bool {
        self.candidates(key)
            .any(|id| self.entries[id].grouped_only && self.entries[id].key == *key)
    }
}

/// The call that resolves every definition of a contested identity.
pub(crate) fn group_alternative(key: &Key) -> String {
    format!("resolve_all::<{}>()", key.type_name())
}
