//! The base ledger: committed state plus header. This is the apply view.

use crate::header::LedgerHeader;
use crate::view::{ReadView, WriteView};
use std::collections::BTreeMap;
use std::ops::Bound;
use xrpl_hash::{Hash, HashPrefix};
use xrpl_models::entry::LedgerEntry;
use xrpl_models::features::FeatureSet;

/// One ledger version: a state snapshot and its header. Mutated only
/// through the view interface during a close round; concurrent readers are
/// only allowed between rounds.
#[derive(Clone)]
pub struct Ledger {
    header: LedgerHeader,
    state: BTreeMap<Hash, LedgerEntry>,
    drops_destroyed: i64,
    /// Hashes of the transactions applied in this ledger, in apply order.
    applied_transactions: Vec<Hash>,
}

impl Ledger {
    /// An empty genesis ledger with the given amendment set.
    pub fn genesis(features: FeatureSet) -> Self {
        Ledger {
            header: LedgerHeader::genesis(features),
            state: BTreeMap::new(),
            drops_destroyed: 0,
            applied_transactions: Vec::new(),
        }
    }

    /// Total drops burned so far.
    pub fn drops_destroyed(&self) -> i64 {
        self.drops_destroyed
    }

    /// Record a transaction hash in this ledger's transaction list.
    pub fn record_transaction(&mut self, hash: Hash) {
        self.applied_transactions.push(hash);
    }

    /// Mutable access to the header, for the close round and for tests
    /// that pin fee schedules.
    pub fn header_mut(&mut self) -> &mut LedgerHeader {
        &mut self.header
    }

    /// Iterate the whole state in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Hash, &LedgerEntry)> {
        self.state.iter()
    }

    /// Number of entries in the state.
    pub fn entry_count(&self) -> usize {
        self.state.len()
    }

    /// Close this ledger: compute the tree hashes, stamp the close time
    /// and open the next ledger version on top of it.
    ///
    /// The close-time is rounded down to the header resolution, matching
    /// how validators agree on an approximate time.
    pub fn close(&mut self, close_time: u32) {
        let resolution = self.header.close_time_resolution.max(1) as u32;
        let rounded = close_time - (close_time % resolution);
        self.header.close_time = rounded.max(self.header.parent_close_time + 1);
        self.header.state_hash = self.compute_state_hash();
        self.header.transaction_hash = self.compute_transaction_hash();
        let parent_hash = self.header.hash();

        // open the next version
        self.header.sequence += 1;
        self.header.parent_hash = parent_hash;
        self.header.parent_close_time = self.header.close_time;
        self.applied_transactions.clear();
    }

    /// Hash of the state tree: SHA-512-Half over the inner-node prefix and
    /// every entry hash in key order.
    fn compute_state_hash(&self) -> Hash {
        let mut leaves = Vec::with_capacity(self.state.len() * 32);
        for (key, entry) in &self.state {
            // entries in the committed state always serialize
            let leaf = entry.hash(key).expect("committed entry must serialize");
            leaves.extend_from_slice(leaf.to_bytes());
        }
        Hash::compute_from_prefixed(HashPrefix::InnerNode, &[&leaves])
    }

    /// Hash of the transaction tree for this ledger version.
    fn compute_transaction_hash(&self) -> Hash {
        let mut leaves = Vec::with_capacity(self.applied_transactions.len() * 32);
        for hash in &self.applied_transactions {
            leaves.extend_from_slice(hash.to_bytes());
        }
        Hash::compute_from_prefixed(HashPrefix::TxNode, &[&leaves])
    }
}

impl ReadView for Ledger {
    fn get(&self, key: &Hash) -> Option<LedgerEntry> {
        self.state.get(key).cloned()
    }

    fn exists(&self, key: &Hash) -> bool {
        self.state.contains_key(key)
    }

    fn successor(&self, key: &Hash, last: &Hash) -> Option<Hash> {
        self.state
            .range((Bound::Excluded(*key), Bound::Included(*last)))
            .next()
            .map(|(k, _)| *k)
    }

    fn header(&self) -> &LedgerHeader {
        &self.header
    }
}

impl WriteView for Ledger {
    fn insert(&mut self, key: Hash, entry: LedgerEntry) {
        self.state.insert(key, entry);
    }

    fn update(&mut self, key: Hash, entry: LedgerEntry) {
        self.state.insert(key, entry);
    }

    fn erase(&mut self, key: &Hash) {
        self.state.remove(key);
    }

    fn adjust_drops_destroyed(&mut self, drops: i64) {
        self.drops_destroyed += drops;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xrpl_models::account::AccountId;
    use xrpl_models::amount::XrpAmount;
    use xrpl_models::entry::AccountRoot;
    use xrpl_models::keylet::Keylet;

    fn root(byte: u8) -> (Hash, LedgerEntry) {
        let account = AccountId::from_bytes([byte; 20]);
        let keylet = Keylet::account(&account);
        (
            keylet.key,
            LedgerEntry::AccountRoot(AccountRoot::new(
                account,
                XrpAmount::from_xrp(100).unwrap(),
                1,
            )),
        )
    }

    #[test]
    fn test_insert_get_erase() {
        let mut ledger = Ledger::genesis(FeatureSet::all());
        let (key, entry) = root(1);
        assert!(!ledger.exists(&key));
        ledger.insert(key, entry.clone());
        assert_eq!(ledger.get(&key), Some(entry));
        ledger.erase(&key);
        assert!(!ledger.exists(&key));
    }

    #[test]
    fn test_successor_walks_in_key_order() {
        let mut ledger = Ledger::genesis(FeatureSet::all());
        for byte in [3u8, 1, 2] {
            let (key, entry) = root(byte);
            ledger.insert(key, entry);
        }
        let mut keys: Vec<Hash> = ledger.iter().map(|(k, _)| *k).collect();
        keys.sort();
        let found = ledger.successor(&Hash::zero(), keys.last().unwrap());
        assert_eq!(found, Some(keys[0]));
        let next = ledger.successor(&keys[0], keys.last().unwrap());
        assert_eq!(next, Some(keys[1]));
    }

    #[test]
    fn test_close_advances_and_links() {
        let mut ledger = Ledger::genesis(FeatureSet::all());
        let genesis_sequence = ledger.header().sequence;
        ledger.close(1000);
        assert_eq!(ledger.header().sequence, genesis_sequence + 1);
        assert!(!ledger.header().parent_hash.is_zero());
        assert_eq!(ledger.header().parent_close_time, 1000);
    }

    #[test]
    fn test_close_time_rounding() {
        let mut ledger = Ledger::genesis(FeatureSet::all());
        ledger.close(1007);
        // resolution 10: rounded down to 1000
        assert_eq!(ledger.header().parent_close_time, 1000);
    }

    #[test]
    fn test_state_hash_tracks_content() {
        let mut a = Ledger::genesis(FeatureSet::all());
        let mut b = a.clone();
        a.close(100);
        let (key, entry) = root(5);
        b.insert(key, entry);
        b.close(100);
        assert_ne!(a.header().parent_hash, b.header().parent_hash);
    }
}
