//! SignerListSet.

use crate::common::{account_root, covers_reserve, write_account_root, ApplyContext};
use xrpl_ledger::dir::{owner_dir_insert, owner_dir_remove};
use xrpl_ledger::{ReadView, WriteView};
use xrpl_models::config::MAX_SIGNER_ENTRIES;
use xrpl_models::entry::{signer_list_flags, LedgerEntry, SignerList};
use xrpl_models::features::Feature;
use xrpl_models::keylet::Keylet;
use xrpl_models::result::TransactionResult;
use xrpl_models::transaction::{tx_flags, SignerListSet, Transaction};

pub fn preflight(tx: &Transaction, set: &SignerListSet) -> TransactionResult {
    if tx.common.flags & !tx_flags::TF_UNIVERSAL_MASK != 0 {
        return TransactionResult::temINVALID_FLAG;
    }

    if set.signer_quorum == 0 {
        // quorum 0 deletes the list; it must come alone
        return if set.signer_entries.is_empty() {
            TransactionResult::tesSUCCESS
        } else {
            TransactionResult::temMALFORMED
        };
    }

    if set.signer_entries.is_empty() {
        return TransactionResult::temARRAY_EMPTY;
    }
    if set.signer_entries.len() > MAX_SIGNER_ENTRIES {
        return TransactionResult::temARRAY_TOO_LARGE;
    }

    let mut total_weight: u64 = 0;
    let mut seen = std::collections::BTreeSet::new();
    for entry in &set.signer_entries {
        if entry.account == tx.common.account {
            // an account may not list itself
            return TransactionResult::temBAD_SIGNER;
        }
        if !seen.insert(entry.account) {
            return TransactionResult::temBAD_SIGNER;
        }
        if entry.weight == 0 {
            return TransactionResult::temBAD_WEIGHT;
        }
        total_weight += entry.weight as u64;
    }
    if set.signer_quorum as u64 > total_weight {
        return TransactionResult::temBAD_QUORUM;
    }
    TransactionResult::tesSUCCESS
}

pub fn do_apply(context: &mut ApplyContext, set: &SignerListSet) -> TransactionResult {
    let account = context.account();
    let keylet = Keylet::signer_list(&account);
    let existing = match context.view.get(&keylet.key) {
        Some(LedgerEntry::SignerList(list)) => Some(list),
        _ => None,
    };

    if set.signer_quorum == 0 {
        // delete the list
        let Some(list) = existing else {
            return TransactionResult::tecNO_ENTRY;
        };
        let units = LedgerEntry::SignerList(list.clone()).reserve_units();
        if owner_dir_remove(context.view, &account, list.owner_node, &keylet.key).is_err() {
            return TransactionResult::tecINTERNAL;
        }
        context.view.erase(&keylet.key);
        let Some(mut root) = account_root(context.view, &account) else {
            return TransactionResult::tecINTERNAL;
        };
        root.owner_count = root.owner_count.saturating_sub(units);
        write_account_root(context.view, root);
        return TransactionResult::tesSUCCESS;
    }

    let reduced_reserve = context
        .view
        .header()
        .features
        .is_enabled(Feature::MultiSignReserve);
    let flags = if reduced_reserve {
        signer_list_flags::LSF_ONE_OWNER_COUNT
    } else {
        0
    };

    let mut entries = set.signer_entries.clone();
    entries.sort_by_key(|entry| entry.account);

    match existing {
        Some(old) => {
            // replace in place; the reserve footprint may change
            let old_units = LedgerEntry::SignerList(old.clone()).reserve_units();
            let new_list = SignerList {
                signer_quorum: set.signer_quorum,
                signer_entries: entries,
                owner_node: old.owner_node,
                flags,
            };
            let new_units = LedgerEntry::SignerList(new_list.clone()).reserve_units();
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
            context
                .view
                .update(keylet.key, LedgerEntry::SignerList(new_list));
        }
        None => {
            let list = SignerList {
                signer_quorum: set.signer_quorum,
                signer_entries: entries,
                owner_node: 0,
                flags,
            };
            let units = LedgerEntry::SignerList(list.clone()).reserve_units();
            let Some(mut root) = account_root(context.view, &account) else {
                return TransactionResult::tecINTERNAL;
            };
            let new_count = root.owner_count.saturating_add(units);
            if !covers_reserve(context.view, &root, new_count) {
                return TransactionResult::tecINSUFFICIENT_RESERVE;
            }
            let Ok(page) = owner_dir_insert(context.view, &account, keylet.key) else {
                return TransactionResult::tecDIR_FULL;
            };
            let mut list = list;
            list.owner_node = page;
            context
                .view
                .insert(keylet.key, LedgerEntry::SignerList(list));
            root.owner_count = new_count;
            write_account_root(context.view, root);
        }
    }
    TransactionResult::tesSUCCESS
}
