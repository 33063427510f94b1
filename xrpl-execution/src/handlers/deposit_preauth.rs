//! DepositPreauth.

use crate::common::{add_owned_entry, remove_owned_entry, ApplyContext};
use xrpl_ledger::ReadView;
use xrpl_models::entry::{DepositPreauthEntry, LedgerEntry};
use xrpl_models::features::{Feature, FeatureSet};
use xrpl_models::keylet::Keylet;
use xrpl_models::result::TransactionResult;
use xrpl_models::transaction::{tx_flags, DepositPreauthTx, Transaction};

pub fn preflight(
    tx: &Transaction,
    preauth: &DepositPreauthTx,
    features: &FeatureSet,
) -> TransactionResult {
    if !features.is_enabled(Feature::DepositPreauth) {
        return TransactionResult::temDISABLED;
    }
    if tx.common.flags & !tx_flags::TF_UNIVERSAL_MASK != 0 {
        return TransactionResult::temINVALID_FLAG;
    }
    match (&preauth.authorize, &preauth.unauthorize) {
        (Some(_), Some(_)) | (None, None) => TransactionResult::temMALFORMED,
        (Some(authorized), None) if *authorized == tx.common.account => {
            TransactionResult::temCAN_NOT_PREAUTH_SELF
        }
        _ => TransactionResult::tesSUCCESS,
    }
}

pub fn preclaim(
    view: &dyn ReadView,
    tx: &Transaction,
    preauth: &DepositPreauthTx,
) -> TransactionResult {
    if let Some(authorized) = &preauth.authorize {
        if !view.exists(&Keylet::account(authorized).key) {
            return TransactionResult::tecNO_TARGET;
        }
        if view
            .exists(&Keylet::deposit_preauth(&tx.common.account, authorized).key)
        {
            return TransactionResult::tecDUPLICATE;
        }
    }
    if let Some(unauthorized) = &preauth.unauthorize {
        if !view
            .exists(&Keylet::deposit_preauth(&tx.common.account, unauthorized).key)
        {
            return TransactionResult::tecNO_ENTRY;
        }
    }
    TransactionResult::tesSUCCESS
}

pub fn do_apply(context: &mut ApplyContext, preauth: &DepositPreauthTx) -> TransactionResult {
    let account = context.account();
    if let Some(authorized) = &preauth.authorize {
        let key = Keylet::deposit_preauth(&account, authorized).key;
        let entry = DepositPreauthEntry {
            account,
            authorize: *authorized,
            owner_node: 0,
        };
        return match add_owned_entry(
            context.view,
            &account,
            key,
            LedgerEntry::DepositPreauth(entry.clone()),
            1,
        ) {
            Ok(page) => {
                let mut entry = entry;
                entry.owner_node = page;
                use xrpl_ledger::WriteView;
                context
                    .view
                    .update(key, LedgerEntry::DepositPreauth(entry));
                TransactionResult::tesSUCCESS
            }
            Err(result) => result,
        };
    }
    if let Some(unauthorized) = &preauth.unauthorize {
        let key = Keylet::deposit_preauth(&account, unauthorized).key;
        let Some(LedgerEntry::DepositPreauth(entry)) = context.view.get(&key) else {
            return TransactionResult::tecNO_ENTRY;
        };
        return match remove_owned_entry(context.view, &account, &key, entry.owner_node, 1) {
            Ok(()) => TransactionResult::tesSUCCESS,
            Err(result) => result,
        };
    }
    TransactionResult::tecINTERNAL
}
