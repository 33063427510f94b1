//! OracleSet and OracleDelete.

use crate::common::{account_root, add_owned_entry, covers_reserve, remove_owned_entry,
    write_account_root, ApplyContext};
use std::collections::BTreeSet;
use xrpl_ledger::{ReadView, WriteView};
use xrpl_models::config::{
    MAX_ORACLE_ASSET_CLASS_LEN, MAX_ORACLE_PAIRS, MAX_ORACLE_PROVIDER_LEN, MAX_ORACLE_SCALE,
    MAX_ORACLE_UPDATE_TIME_DELTA, MAX_ORACLE_URI_LEN,
};
use xrpl_models::entry::{LedgerEntry, OracleEntry, PriceData};
use xrpl_models::features::{Feature, FeatureSet};
use xrpl_models::keylet::Keylet;
use xrpl_models::result::TransactionResult;
use xrpl_models::transaction::{tx_flags, OracleDelete, OracleSet, Transaction};

pub fn preflight_set(
    tx: &Transaction,
    set: &OracleSet,
    features: &FeatureSet,
) -> TransactionResult {
    if !features.is_enabled(Feature::PriceOracle) {
        return TransactionResult::temDISABLED;
    }
    if tx.common.flags & !tx_flags::TF_UNIVERSAL_MASK != 0 {
        return TransactionResult::temINVALID_FLAG;
    }
    if set.price_data_series.is_empty() {
        return TransactionResult::temARRAY_EMPTY;
    }
    if set.price_data_series.len() > MAX_ORACLE_PAIRS {
        return TransactionResult::temARRAY_TOO_LARGE;
    }
    if let Some(provider) = &set.provider {
        if provider.is_empty() || provider.len() > MAX_ORACLE_PROVIDER_LEN {
            return TransactionResult::temMALFORMED;
        }
    }
    if let Some(asset_class) = &set.asset_class {
        if asset_class.is_empty() || asset_class.len() > MAX_ORACLE_ASSET_CLASS_LEN {
            return TransactionResult::temMALFORMED;
        }
    }
    if let Some(uri) = &set.uri {
        if uri.is_empty() || uri.len() > MAX_ORACLE_URI_LEN {
            return TransactionResult::temMALFORMED;
        }
    }
    let mut seen = BTreeSet::new();
    for price in &set.price_data_series {
        if price.base_asset == price.quote_asset {
            return TransactionResult::temMALFORMED;
        }
        if let Some(scale) = price.scale {
            if scale > MAX_ORACLE_SCALE {
                return TransactionResult::temMALFORMED;
            }
        }
        if !seen.insert(price.pair()) {
            return TransactionResult::temMALFORMED;
        }
    }
    TransactionResult::tesSUCCESS
}

pub fn preclaim_set(view: &dyn ReadView, tx: &Transaction, set: &OracleSet) -> TransactionResult {
    let keylet = Keylet::oracle(&tx.common.account, set.oracle_document_id);
    let existing = match view.get(&keylet.key) {
        Some(LedgerEntry::Oracle(oracle)) => Some(oracle),
        _ => None,
    };

    match existing {
        None => {
            // creation: the descriptive fields are mandatory, and nothing
            // can be deleted yet
            if set.provider.is_none() || set.asset_class.is_none() {
                return TransactionResult::temMALFORMED;
            }
            if set.price_data_series.iter().any(|p| p.asset_price.is_none()) {
                return TransactionResult::temMALFORMED;
            }
            TransactionResult::tesSUCCESS
        }
        Some(oracle) => {
            // provider and asset class are immutable once set
            if let Some(provider) = &set.provider {
                if *provider != oracle.provider {
                    return TransactionResult::temMALFORMED;
                }
            }
            if let Some(asset_class) = &set.asset_class {
                if *asset_class != oracle.asset_class {
                    return TransactionResult::temMALFORMED;
                }
            }

            let close_time = view.header().parent_close_time;
            let earliest = close_time.saturating_sub(MAX_ORACLE_UPDATE_TIME_DELTA);
            let latest = close_time.saturating_add(MAX_ORACLE_UPDATE_TIME_DELTA);
            if set.last_update_time < earliest || set.last_update_time > latest {
                return TransactionResult::tecINVALID_UPDATE_TIME;
            }
            if set.last_update_time <= oracle.last_update_time {
                return TransactionResult::tecINVALID_UPDATE_TIME;
            }

            // deletions must name stored pairs
            let stored: BTreeSet<_> = oracle.price_data_series.iter().map(|p| p.pair()).collect();
            let mut result_count = oracle.price_data_series.len();
            for price in &set.price_data_series {
                let is_stored = stored.contains(&price.pair());
                if price.asset_price.is_none() {
                    if !is_stored {
                        return TransactionResult::tecTOKEN_PAIR_NOT_FOUND;
                    }
                    result_count -= 1;
                } else if !is_stored {
                    result_count += 1;
                }
            }
            if result_count == 0 {
                return TransactionResult::tecARRAY_EMPTY;
            }
            if result_count > MAX_ORACLE_PAIRS {
                return TransactionResult::tecARRAY_TOO_LARGE;
            }
            TransactionResult::tesSUCCESS
        }
    }
}

pub fn apply_set(context: &mut ApplyContext, set: &OracleSet) -> TransactionResult {
    let account = context.account();
    let keylet = Keylet::oracle(&account, set.oracle_document_id);

    match context.view.get(&keylet.key) {
        Some(LedgerEntry::Oracle(mut oracle)) => {
            let old_units = oracle.reserve_units();

            // merge: update stored pairs in place, drop deletions, append
            // new pairs in transaction order
            let mut merged = oracle.price_data_series.clone();
            for price in &set.price_data_series {
                match merged.iter().position(|p| p.pair() == price.pair()) {
                    Some(position) => {
                        if price.asset_price.is_none() {
                            merged.remove(position);
                        } else {
                            merged[position].asset_price = price.asset_price;
                            merged[position].scale = price.scale;
                        }
                    }
                    None => {
                        merged.push(PriceData {
                            base_asset: price.base_asset,
                            quote_asset: price.quote_asset,
                            asset_price: price.asset_price,
                            scale: price.scale,
                        });
                    }
                }
            }
            if context
                .view
                .header()
                .features
                .is_enabled(Feature::FixPriceOracleOrder)
            {
                merged.sort_by_key(|p| p.pair());
            }

            oracle.price_data_series = merged;
            oracle.last_update_time = set.last_update_time;
            if let Some(uri) = &set.uri {
                oracle.uri = Some(uri.clone());
            }
            let new_units = oracle.reserve_units();

            let Some(mut root) = account_root(context.view, &account) else {
                return TransactionResult::tecINTERNAL;
            };
            let adjusted = root
                .owner_count
                .saturating_sub(old_units)
                .saturating_add(new_units);
            if new_units > old_units && !covers_reserve(context.view, &root, adjusted) {
                return TransactionResult::tecINSUFFICIENT_RESERVE;
            }
            root.owner_count = adjusted;
            write_account_root(context.view, root);
            context.view.update(keylet.key, LedgerEntry::Oracle(oracle));
            TransactionResult::tesSUCCESS
        }
        _ => {
            // preclaim guarantees both are present on creation
            let (Some(provider), Some(asset_class)) = (&set.provider, &set.asset_class) else {
                return TransactionResult::tecINTERNAL;
            };
            let oracle = OracleEntry {
                owner: account,
                provider: provider.clone(),
                asset_class: asset_class.clone(),
                uri: set.uri.clone(),
                last_update_time: set.last_update_time,
                price_data_series: set
                    .price_data_series
                    .iter()
                    .map(|price| PriceData {
                        base_asset: price.base_asset,
                        quote_asset: price.quote_asset,
                        asset_price: price.asset_price,
                        scale: price.scale,
                    })
                    .collect(),
                owner_node: 0,
            };
            let units = oracle.reserve_units();
            match add_owned_entry(
                context.view,
                &account,
                keylet.key,
                LedgerEntry::Oracle(oracle.clone()),
                units,
            ) {
                Ok(page) => {
                    let mut oracle = oracle;
                    oracle.owner_node = page;
                    context.view.update(keylet.key, LedgerEntry::Oracle(oracle));
                    TransactionResult::tesSUCCESS
                }
                Err(result) => result,
            }
        }
    }
}

pub fn preflight_delete(
    tx: &Transaction,
    _delete: &OracleDelete,
    features: &FeatureSet,
) -> TransactionResult {
    if !features.is_enabled(Feature::PriceOracle) {
        return TransactionResult::temDISABLED;
    }
    if tx.common.flags & !tx_flags::TF_UNIVERSAL_MASK != 0 {
        return TransactionResult::temINVALID_FLAG;
    }
    TransactionResult::tesSUCCESS
}

pub fn preclaim_delete(
    view: &dyn ReadView,
    tx: &Transaction,
    delete: &OracleDelete,
) -> TransactionResult {
    let keylet = Keylet::oracle(&tx.common.account, delete.oracle_document_id);
    if !view.exists(&keylet.key) {
        return TransactionResult::tecNO_ENTRY;
    }
    TransactionResult::tesSUCCESS
}

pub fn apply_delete(context: &mut ApplyContext, delete: &OracleDelete) -> TransactionResult {
    let account = context.account();
    let keylet = Keylet::oracle(&account, delete.oracle_document_id);
    let Some(LedgerEntry::Oracle(oracle)) = context.view.get(&keylet.key) else {
        return TransactionResult::tecNO_ENTRY;
    };
    let units = oracle.reserve_units();
    match remove_owned_entry(context.view, &account, &keylet.key, oracle.owner_node, units) {
        Ok(()) => TransactionResult::tesSUCCESS,
        Err(result) => result,
    }
}
