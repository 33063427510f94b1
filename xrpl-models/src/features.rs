//! Amendment features and the per-ledger feature set.
//!
//! A feature is identified on-ledger by the SHA-512-Half of its name. The
//! set enabled for a ledger is pinned on its header; every handler, codec
//! branch and strand rule with pre/post-amendment behavior consults the set
//! through [`FeatureSet::is_enabled`] and nothing else.

use std::collections::BTreeSet;
use xrpl_hash::Hash;

/// Features the engine knows how to gate on.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum Feature {
    /// Multi-signing support.
    MultiSign,
    /// Signer lists stop costing 2+N owner-reserve units and cost 1.
    MultiSignReserve,
    /// Deposit authorization flag support.
    DepositAuth,
    /// Deposit preauthorization entries.
    DepositPreauth,
    /// Ticket batches.
    TicketBatch,
    /// Price oracles.
    PriceOracle,
    /// Deterministic oracle pair ordering after updates.
    FixPriceOracleOrder,
    /// CancelAfter must be beyond the parent close time at creation.
    FixPayChanCancelAfter,
    /// Rounding change: offers reduced by crossing round in the taker's
    /// favor.
    FixReducedOffersV1,
    /// Second rounding pass over reduced offers.
    FixReducedOffersV2,
    /// Third rounding pass over reduced offers.
    FixReducedOffersV3,
    /// Master key may not equal the regular key being removed.
    FixMasterKeyAsRegularKey,
}

impl Feature {
    /// The protocol name of the feature, hashed into its on-ledger id.
    pub fn name(self) -> &'static str {
        match self {
            Feature::MultiSign => "MultiSign",
            Feature::MultiSignReserve => "MultiSignReserve",
            Feature::DepositAuth => "DepositAuth",
            Feature::DepositPreauth => "DepositPreauth",
            Feature::TicketBatch => "TicketBatch",
            Feature::PriceOracle => "PriceOracle",
            Feature::FixPriceOracleOrder => "fixPriceOracleOrder",
            Feature::FixPayChanCancelAfter => "fixPayChanCancelAfter",
            Feature::FixReducedOffersV1 => "fixReducedOffersV1",
            Feature::FixReducedOffersV2 => "fixReducedOffersV2",
            Feature::FixReducedOffersV3 => "fixReducedOffersV3",
            Feature::FixMasterKeyAsRegularKey => "fixMasterKeyAsRegularKey",
        }
    }

    /// The 256-bit on-ledger id of the feature.
    pub fn id(self) -> Hash {
        Hash::compute_from(self.name().as_bytes())
    }

    /// Every feature the engine supports.
    pub const ALL: [Feature; 12] = [
        Feature::MultiSign,
        Feature::MultiSignReserve,
        Feature::DepositAuth,
        Feature::DepositPreauth,
        Feature::TicketBatch,
        Feature::PriceOracle,
        Feature::FixPriceOracleOrder,
        Feature::FixPayChanCancelAfter,
        Feature::FixReducedOffersV1,
        Feature::FixReducedOffersV2,
        Feature::FixReducedOffersV3,
        Feature::FixMasterKeyAsRegularKey,
    ];
}

/// The features enabled on one ledger. Immutable once the header is built;
/// tests construct the set they want before opening the ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureSet {
    enabled: BTreeSet<Feature>,
}

impl FeatureSet {
    /// No features enabled.
    pub fn none() -> Self {
        Self::default()
    }

    /// Every supported feature enabled, the usual test baseline.
    pub fn all() -> Self {
        FeatureSet {
            enabled: Feature::ALL.into_iter().collect(),
        }
    }

    /// The single gate the rest of the engine calls.
    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.enabled.contains(&feature)
    }

    /// Enable a feature.
    pub fn enable(&mut self, feature: Feature) {
        self.enabled.insert(feature);
    }

    /// Disable a feature.
    pub fn disable(&mut self, feature: Feature) {
        self.enabled.remove(&feature);
    }

    /// Builder-style: this set minus one feature.
    #[must_use]
    pub fn without(mut self, feature: Feature) -> Self {
        self.disable(feature);
        self
    }

    /// Builder-style: this set plus one feature.
    #[must_use]
    pub fn with(mut self, feature: Feature) -> Self {
        self.enable(feature);
        self
    }

    /// Ids of the enabled features, for the ledger header.
    pub fn ids(&self) -> Vec<Hash> {
        self.enabled.iter().map(|f| f.id()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_is_strict() {
        let set = FeatureSet::none().with(Feature::PriceOracle);
        assert!(set.is_enabled(Feature::PriceOracle));
        assert!(!set.is_enabled(Feature::FixPriceOracleOrder));
    }

    #[test]
    fn test_without_removes() {
        let set = FeatureSet::all().without(Feature::MultiSignReserve);
        assert!(!set.is_enabled(Feature::MultiSignReserve));
        assert!(set.is_enabled(Feature::MultiSign));
    }

    #[test]
    fn test_feature_ids_are_distinct() {
        let ids: std::collections::BTreeSet<_> = Feature::ALL.iter().map(|f| f.id()).collect();
        assert_eq!(ids.len(), Feature::ALL.len());
    }
}
