//! The per-transaction buffered view.

use crate::header::LedgerHeader;
use crate::view::{ReadView, WriteView};
use std::collections::BTreeMap;
use std::ops::Bound;
use tracing::debug;
use xrpl_hash::Hash;
use xrpl_models::entry::LedgerEntry;

/// A buffered change to one key.
#[derive(Clone, Debug)]
pub enum EntryChange {
    /// The key now holds this entry.
    Set(LedgerEntry),
    /// The key is now vacant.
    Delete,
}

/// A discardable write buffer over a parent view.
///
/// Reads fall through to the parent where this layer has no change; writes
/// are buffered locally. `apply` flushes the buffer into the parent,
/// `discard` drops it. Holding the parent by exclusive borrow makes a
/// second simultaneous sandbox over the same parent unrepresentable, and a
/// sandbox that is neither applied nor discarded is just a discard.
pub struct Sandbox<'a> {
    parent: &'a mut dyn WriteView,
    changes: BTreeMap<Hash, EntryChange>,
    drops_delta: i64,
}

impl<'a> Sandbox<'a> {
    /// Open a sandbox over `parent`.
    pub fn new(parent: &'a mut dyn WriteView) -> Self {
        Sandbox {
            parent,
            changes: BTreeMap::new(),
            drops_delta: 0,
        }
    }

    /// Flush every buffered change into the parent.
    pub fn apply(self) {
        for (key, change) in self.changes {
            match change {
                EntryChange::Set(entry) => self.parent.update(key, entry),
                EntryChange::Delete => self.parent.erase(&key),
            }
        }
        if self.drops_delta != 0 {
            self.parent.adjust_drops_destroyed(self.drops_delta);
        }
    }

    /// Drop every buffered change.
    pub fn discard(self) {
        if !self.changes.is_empty() {
            debug!(
                changed = self.changes.len(),
                "discarding transaction sandbox"
            );
        }
    }

    /// The buffered changes in key order, for metadata emission.
    pub fn iter_changes(&self) -> impl Iterator<Item = (&Hash, &EntryChange)> {
        self.changes.iter()
    }

    /// Read a key as the parent sees it, bypassing this layer's buffer.
    /// Metadata uses this for before-images.
    pub fn parent_get(&self, key: &Hash) -> Option<LedgerEntry> {
        self.parent.get(key)
    }
}

impl ReadView for Sandbox<'_> {
    fn get(&self, key: &Hash) -> Option<LedgerEntry> {
        match self.changes.get(key) {
            Some(EntryChange::Set(entry)) => Some(entry.clone()),
            Some(EntryChange::Delete) => None,
            None => self.parent.get(key),
        }
    }

    fn exists(&self, key: &Hash) -> bool {
        match self.changes.get(key) {
            Some(EntryChange::Set(_)) => true,
            Some(EntryChange::Delete) => false,
            None => self.parent.exists(key),
        }
    }

    fn successor(&self, key: &Hash, last: &Hash) -> Option<Hash> {
        // walk the parent chain, skipping keys this layer deleted, and
        // merge with keys this layer inserted
        let own = self
            .changes
            .range((Bound::Excluded(*key), Bound::Included(*last)))
            .find(|(_, change)| matches!(change, EntryChange::Set(_)))
            .map(|(k, _)| *k);

        let mut cursor = *key;
        let parent_next = loop {
            match self.parent.successor(&cursor, last) {
                None => break None,
                Some(candidate) => {
                    if matches!(self.changes.get(&candidate), Some(EntryChange::Delete)) {
                        cursor = candidate;
                        continue;
                    }
                    break Some(candidate);
                }
            }
        };

        match (own, parent_next) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn header(&self) -> &LedgerHeader {
        self.parent.header()
    }
}

impl WriteView for Sandbox<'_> {
    fn insert(&mut self, key: Hash, entry: LedgerEntry) {
        self.changes.insert(key, EntryChange::Set(entry));
    }

    fn update(&mut self, key: Hash, entry: LedgerEntry) {
        self.changes.insert(key, EntryChange::Set(entry));
    }

    fn erase(&mut self, key: &Hash) {
        self.changes.insert(*key, EntryChange::Delete);
    }

    fn adjust_drops_destroyed(&mut self, drops: i64) {
        self.drops_delta += drops;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use xrpl_models::account::AccountId;
    use xrpl_models::amount::XrpAmount;
    use xrpl_models::entry::AccountRoot;
    use xrpl_models::features::FeatureSet;
    use xrpl_models::keylet::Keylet;

    fn root(byte: u8) -> (Hash, LedgerEntry) {
        let account = AccountId::from_bytes([byte; 20]);
        (
            Keylet::account(&account).key,
            LedgerEntry::AccountRoot(AccountRoot::new(
                account,
                XrpAmount::from_xrp(50).unwrap(),
                1,
            )),
        )
    }

    #[test]
    fn test_reads_fall_through() {
        let mut ledger = Ledger::genesis(FeatureSet::all());
        let (key, entry) = root(1);
        ledger.insert(key, entry.clone());
        let sandbox = Sandbox::new(&mut ledger);
        assert_eq!(sandbox.get(&key), Some(entry));
    }

    #[test]
    fn test_discard_leaves_parent_untouched() {
        let mut ledger = Ledger::genesis(FeatureSet::all());
        let (key, entry) = root(1);
        {
            let mut sandbox = Sandbox::new(&mut ledger);
            sandbox.insert(key, entry);
            assert!(sandbox.exists(&key));
            sandbox.discard();
        }
        assert!(!ledger.exists(&key));
        assert_eq!(ledger.drops_destroyed(), 0);
    }

    #[test]
    fn test_apply_flushes() {
        let mut ledger = Ledger::genesis(FeatureSet::all());
        let (key, entry) = root(1);
        {
            let mut sandbox = Sandbox::new(&mut ledger);
            sandbox.insert(key, entry.clone());
            sandbox.adjust_drops_destroyed(10);
            sandbox.apply();
        }
        assert_eq!(ledger.get(&key), Some(entry));
        assert_eq!(ledger.drops_destroyed(), 10);
    }

    #[test]
    fn test_buffered_delete_masks_parent() {
        let mut ledger = Ledger::genesis(FeatureSet::all());
        let (key, entry) = root(1);
        ledger.insert(key, entry);
        let mut sandbox = Sandbox::new(&mut ledger);
        sandbox.erase(&key);
        assert!(!sandbox.exists(&key));
        sandbox.apply();
        assert!(!ledger.exists(&key));
    }

    #[test]
    fn test_successor_merges_layers() {
        let mut ledger = Ledger::genesis(FeatureSet::all());
        let (key_a, entry_a) = root(1);
        let (key_b, entry_b) = root(2);
        let (key_c, entry_c) = root(3);
        ledger.insert(key_a, entry_a);
        ledger.insert(key_c, entry_c);
        let mut sandbox = Sandbox::new(&mut ledger);
        sandbox.insert(key_b, entry_b);
        sandbox.erase(&key_c);

        let last = Hash::from_bytes(&[0xFF; 32]);
        let mut walk = Vec::new();
        let mut cursor = Hash::zero();
        while let Some(next) = sandbox.successor(&cursor, &last) {
            walk.push(next);
            cursor = next;
        }
        let mut expected = vec![key_a, key_b];
        expected.sort();
        assert_eq!(walk, expected);
    }

    #[test]
    fn test_nested_sandboxes() {
        let mut ledger = Ledger::genesis(FeatureSet::all());
        let (key, entry) = root(1);
        {
            let mut outer = Sandbox::new(&mut ledger);
            {
                let mut inner = Sandbox::new(&mut outer);
                inner.insert(key, entry.clone());
                inner.apply();
            }
            assert!(outer.exists(&key));
            outer.apply();
        }
        assert!(ledger.exists(&key));
    }
}
