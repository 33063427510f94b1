//! The read/write interface every layer of the view stack implements.

use crate::header::LedgerHeader;
use xrpl_hash::Hash;
use xrpl_models::entry::LedgerEntry;

/// Read access to a ledger state.
///
/// Reads are synchronous; there are no suspension points anywhere in the
/// apply pipeline. Implementations must not reorder observable reads under
/// the same view.
pub trait ReadView {
    /// Fetch the entry at `key`, if present.
    fn get(&self, key: &Hash) -> Option<LedgerEntry>;

    /// Whether an entry exists at `key`.
    fn exists(&self, key: &Hash) -> bool {
        self.get(key).is_some()
    }

    /// The smallest existing key strictly greater than `key` and no
    /// greater than `last`. Order-book traversal steps through directory
    /// pages with this.
    fn successor(&self, key: &Hash, last: &Hash) -> Option<Hash>;

    /// The header of the ledger being built, carrying fee parameters,
    /// reserve constants and the amendment set.
    fn header(&self) -> &LedgerHeader;
}

/// Write access on top of read access.
pub trait WriteView: ReadView {
    /// Create the entry at `key`. The caller guarantees the key is vacant.
    fn insert(&mut self, key: Hash, entry: LedgerEntry);

    /// Replace the entry at `key`. The caller guarantees the key is
    /// occupied.
    fn update(&mut self, key: Hash, entry: LedgerEntry);

    /// Remove the entry at `key`.
    fn erase(&mut self, key: &Hash);

    /// Record drops leaving existence (burned fees).
    fn adjust_drops_destroyed(&mut self, drops: i64);
}
