//! The ledger header.

use serde::{Deserialize, Serialize};
use xrpl_hash::{Hash, HashPrefix};
use xrpl_models::amount::XrpAmount;
use xrpl_models::config::{
    DEFAULT_BASE_FEE, DEFAULT_RESERVE_BASE, DEFAULT_RESERVE_INCREMENT,
};
use xrpl_models::features::FeatureSet;

/// The header of one ledger version. Fee parameters, reserve constants and
/// the amendment set are pinned here and passed by reference into the
/// engine; there is no process-wide configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerHeader {
    /// Ledger sequence.
    pub sequence: u32,
    /// Hash of the parent ledger.
    pub parent_hash: Hash,
    /// Root hash of this ledger's transaction tree.
    pub transaction_hash: Hash,
    /// Root hash of this ledger's state tree.
    pub state_hash: Hash,
    /// Close time of the parent ledger, seconds since the ledger epoch.
    pub parent_close_time: u32,
    /// Close time of this ledger.
    pub close_time: u32,
    /// Base fee in drops.
    pub fee_base: u64,
    /// Base reserve in drops.
    pub reserve_base: u64,
    /// Owner-reserve increment in drops.
    pub reserve_increment: u64,
    /// Granularity the close time was rounded to, in seconds.
    pub close_time_resolution: u8,
    /// Close flags.
    pub close_flags: u8,
    /// Amendments active in this ledger.
    #[serde(skip)]
    pub features: FeatureSet,
}

impl LedgerHeader {
    /// The genesis header with default fee and reserve schedule.
    pub fn genesis(features: FeatureSet) -> Self {
        LedgerHeader {
            sequence: 1,
            parent_hash: Hash::zero(),
            transaction_hash: Hash::zero(),
            state_hash: Hash::zero(),
            parent_close_time: 0,
            close_time: 0,
            fee_base: DEFAULT_BASE_FEE,
            reserve_base: DEFAULT_RESERVE_BASE,
            reserve_increment: DEFAULT_RESERVE_INCREMENT,
            close_time_resolution: 10,
            close_flags: 0,
            features,
        }
    }

    /// The reserve an account with `owner_count` owned entries must hold.
    pub fn reserve(&self, owner_count: u32) -> XrpAmount {
        let drops = self
            .reserve_base
            .saturating_add(self.reserve_increment.saturating_mul(owner_count as u64));
        // the reserve schedule is far below the native cap
        XrpAmount::from_drops(drops as i64).unwrap_or_else(|_| XrpAmount::zero())
    }

    /// The ledger hash: SHA-512-Half over the LWR prefix and the header
    /// fields in their canonical order.
    pub fn hash(&self) -> Hash {
        let mut bytes = Vec::with_capacity(32 * 3 + 64);
        bytes.extend_from_slice(&self.sequence.to_be_bytes());
        bytes.extend_from_slice(self.parent_hash.to_bytes());
        bytes.extend_from_slice(self.transaction_hash.to_bytes());
        bytes.extend_from_slice(self.state_hash.to_bytes());
        bytes.extend_from_slice(&self.parent_close_time.to_be_bytes());
        bytes.extend_from_slice(&self.close_time.to_be_bytes());
        bytes.extend_from_slice(&self.fee_base.to_be_bytes());
        bytes.extend_from_slice(&self.reserve_base.to_be_bytes());
        bytes.extend_from_slice(&self.reserve_increment.to_be_bytes());
        bytes.push(self.close_time_resolution);
        bytes.push(self.close_flags);
        let ids = self.features.ids();
        bytes.extend_from_slice(&(ids.len() as u32).to_be_bytes());
        for id in &ids {
            bytes.extend_from_slice(id.to_bytes());
        }
        Hash::compute_from_prefixed(HashPrefix::LedgerMaster, &[&bytes])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xrpl_models::features::Feature;

    #[test]
    fn test_reserve_schedule() {
        let header = LedgerHeader::genesis(FeatureSet::all());
        assert_eq!(header.reserve(0).drops(), 10_000_000);
        assert_eq!(header.reserve(1).drops(), 12_000_000);
        assert_eq!(header.reserve(5).drops(), 20_000_000);
    }

    #[test]
    fn test_hash_depends_on_features() {
        let all = LedgerHeader::genesis(FeatureSet::all());
        let most = LedgerHeader::genesis(FeatureSet::all().without(Feature::PriceOracle));
        assert_ne!(all.hash(), most.hash());
    }

    #[test]
    fn test_hash_depends_on_sequence() {
        let genesis = LedgerHeader::genesis(FeatureSet::all());
        let mut next = genesis.clone();
        next.sequence = 2;
        assert_ne!(genesis.hash(), next.hash());
    }
}
