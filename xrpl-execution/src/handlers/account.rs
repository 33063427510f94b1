//! AccountSet, SetRegularKey and AccountDelete.

use crate::common::{account_root, write_account_root, ApplyContext};
use tracing::debug;
use xrpl_ledger::dir::owner_dir_entries;
use xrpl_ledger::{ReadView, WriteView};
use xrpl_models::config::{
    ACCOUNT_DELETE_SEQUENCE_GAP, MAX_TICK_SIZE, MAX_TRANSFER_RATE, MIN_TICK_SIZE, PARITY_RATE,
};
use xrpl_models::entry::{account_flags, LedgerEntry, LedgerEntryType};
use xrpl_models::features::Feature;
use xrpl_models::keylet::Keylet;
use xrpl_models::result::TransactionResult;
use xrpl_models::transaction::{
    account_set_flags as asf, tx_flags, AccountDelete, AccountSet, SetRegularKey, Transaction,
};

pub fn preflight_account_set(tx: &Transaction, account_set: &AccountSet) -> TransactionResult {
    if tx.common.flags & !tx_flags::TF_UNIVERSAL_MASK != 0 {
        return TransactionResult::temINVALID_FLAG;
    }
    if let (Some(set), Some(clear)) = (account_set.set_flag, account_set.clear_flag) {
        if set == clear {
            return TransactionResult::temINVALID_FLAG;
        }
    }
    for flag in [account_set.set_flag, account_set.clear_flag].into_iter().flatten() {
        if flag == 0 || flag > asf::ASF_DEPOSIT_AUTH {
            return TransactionResult::temINVALID_FLAG;
        }
    }
    if let Some(rate) = account_set.transfer_rate {
        if rate != 0 && !(PARITY_RATE..=MAX_TRANSFER_RATE).contains(&rate) {
            return TransactionResult::temBAD_TRANSFER_RATE;
        }
    }
    if let Some(tick_size) = account_set.tick_size {
        if tick_size != 0 && !(MIN_TICK_SIZE..=MAX_TICK_SIZE).contains(&tick_size) {
            return TransactionResult::temBAD_TICK_SIZE;
        }
    }
    TransactionResult::tesSUCCESS
}

fn asf_to_lsf(flag: u32) -> Option<u32> {
    match flag {
        asf::ASF_REQUIRE_DEST => Some(account_flags::LSF_REQUIRE_DEST_TAG),
        asf::ASF_REQUIRE_AUTH => Some(account_flags::LSF_REQUIRE_AUTH),
        asf::ASF_DISALLOW_XRP => Some(account_flags::LSF_DISALLOW_XRP),
        asf::ASF_DISABLE_MASTER => Some(account_flags::LSF_DISABLE_MASTER),
        asf::ASF_NO_FREEZE => Some(account_flags::LSF_NO_FREEZE),
        asf::ASF_GLOBAL_FREEZE => Some(account_flags::LSF_GLOBAL_FREEZE),
        asf::ASF_DEFAULT_RIPPLE => Some(account_flags::LSF_DEFAULT_RIPPLE),
        asf::ASF_DEPOSIT_AUTH => Some(account_flags::LSF_DEPOSIT_AUTH),
        _ => None,
    }
}

pub fn apply_account_set(context: &mut ApplyContext, account_set: &AccountSet) -> TransactionResult {
    let account = context.account();
    let Some(mut root) = account_root(context.view, &account) else {
        return TransactionResult::tecINTERNAL;
    };

    if let Some(set_flag) = account_set.set_flag {
        if set_flag == asf::ASF_DISABLE_MASTER {
            // disabling the master key needs another way in
            let has_signer_list = context
                .view
                .exists(&Keylet::signer_list(&account).key);
            if root.regular_key.is_none() && !has_signer_list {
                return TransactionResult::tecNO_ALTERNATIVE_KEY;
            }
        }
        if set_flag == asf::ASF_ACCOUNT_TXN_ID {
            root.account_txn_id = Some(context.tx_hash);
        } else if let Some(lsf) = asf_to_lsf(set_flag) {
            // NoFreeze may never be cleared again, and forbids global
            // freeze removal tricks later
            root.flags |= lsf;
        }
    }
    if let Some(clear_flag) = account_set.clear_flag {
        if clear_flag == asf::ASF_ACCOUNT_TXN_ID {
            root.account_txn_id = None;
        } else if let Some(lsf) = asf_to_lsf(clear_flag) {
            if lsf == account_flags::LSF_NO_FREEZE
                || (lsf == account_flags::LSF_GLOBAL_FREEZE
                    && root.has_flag(account_flags::LSF_NO_FREEZE))
            {
                return TransactionResult::tecNO_PERMISSION;
            }
            root.flags &= !lsf;
        }
    }
    if let Some(rate) = account_set.transfer_rate {
        root.transfer_rate = if rate == 0 || rate == PARITY_RATE {
            None
        } else {
            Some(rate)
        };
    }
    if let Some(tick_size) = account_set.tick_size {
        root.tick_size = if tick_size == 0 { None } else { Some(tick_size) };
    }

    write_account_root(context.view, root);
    TransactionResult::tesSUCCESS
}

pub fn preflight_set_regular_key(tx: &Transaction, _set: &SetRegularKey) -> TransactionResult {
    if tx.common.flags & !tx_flags::TF_UNIVERSAL_MASK != 0 {
        return TransactionResult::temINVALID_FLAG;
    }
    TransactionResult::tesSUCCESS
}

pub fn apply_set_regular_key(context: &mut ApplyContext, set: &SetRegularKey) -> TransactionResult {
    let account = context.account();
    if context
        .view
        .header()
        .features
        .is_enabled(Feature::FixMasterKeyAsRegularKey)
        && set.regular_key == Some(account)
    {
        return TransactionResult::tecNO_PERMISSION;
    }
    let Some(mut root) = account_root(context.view, &account) else {
        return TransactionResult::tecINTERNAL;
    };
    root.regular_key = set.regular_key;
    write_account_root(context.view, root);
    TransactionResult::tesSUCCESS
}

pub fn preflight_account_delete(tx: &Transaction, delete: &AccountDelete) -> TransactionResult {
    if tx.common.flags & !tx_flags::TF_UNIVERSAL_MASK != 0 {
        return TransactionResult::temINVALID_FLAG;
    }
    if delete.destination == tx.common.account {
        return TransactionResult::temDST_IS_SRC;
    }
    TransactionResult::tesSUCCESS
}

pub fn preclaim_account_delete(
    view: &dyn ReadView,
    tx: &Transaction,
    delete: &AccountDelete,
) -> TransactionResult {
    let Some(root) = account_root(view, &tx.common.account) else {
        return TransactionResult::terNO_ACCOUNT;
    };
    // deleting is priced at the owner-reserve increment, not the base fee
    if (tx.common.fee.drops() as u64) < view.header().reserve_increment {
        return TransactionResult::terINSUF_FEE_B;
    }
    // the account must have been quiet for 256 ledgers
    if view.header().sequence < root.sequence.saturating_add(ACCOUNT_DELETE_SEQUENCE_GAP) {
        return TransactionResult::tecTOO_SOON;
    }
    let Some(destination) = account_root(view, &delete.destination) else {
        return TransactionResult::tecNO_DST;
    };
    if destination.has_flag(account_flags::LSF_REQUIRE_DEST_TAG) && delete.destination_tag.is_none()
    {
        return TransactionResult::tecDST_TAG_NEEDED;
    }
    if view.header().features.is_enabled(Feature::DepositAuth)
        && destination.has_flag(account_flags::LSF_DEPOSIT_AUTH)
    {
        let preauth = Keylet::deposit_preauth(&delete.destination, &tx.common.account);
        if !view.exists(&preauth.key) {
            return TransactionResult::tecNO_PERMISSION;
        }
    }
    TransactionResult::tesSUCCESS
}

pub fn apply_account_delete(context: &mut ApplyContext, delete: &AccountDelete) -> TransactionResult {
    let account = context.account();

    // everything the account still owns must be deletable by cascade
    let Ok(owned) = owner_dir_entries(context.view, &account) else {
        return TransactionResult::tecINTERNAL;
    };
    for key in &owned {
        let Some(entry) = context.view.get(key) else {
            continue;
        };
        match entry.entry_type() {
            LedgerEntryType::Offer
            | LedgerEntryType::Ticket
            | LedgerEntryType::SignerList
            | LedgerEntryType::DepositPreauth
            | LedgerEntryType::Oracle => {}
            blocking => {
                debug!(?blocking, "account deletion blocked by owned entry");
                return TransactionResult::tecHAS_OBLIGATIONS;
            }
        }
    }
    for key in &owned {
        if let Some(LedgerEntry::Offer(offer)) = context.view.get(key) {
            // offers are also indexed in their book page
            let _ = xrpl_ledger::dir::book_dir_remove(context.view, &offer.book_directory, key);
        }
        context.view.erase(key);
    }

    // drop the owner directory pages
    let root_keylet = Keylet::owner_dir(&account);
    let mut page = 0u64;
    loop {
        let page_keylet = Keylet::dir_page(&root_keylet, page);
        match context.view.get(&page_keylet.key) {
            Some(LedgerEntry::DirectoryNode(node)) => {
                context.view.erase(&page_keylet.key);
                match node.index_next {
                    Some(next) => page = next,
                    None => break,
                }
            }
            _ => break,
        }
    }

    // move the remaining balance (the deletion fee is already debited)
    let Some(root) = account_root(context.view, &account) else {
        return TransactionResult::tecINTERNAL;
    };
    let Some(mut destination) = account_root(context.view, &delete.destination) else {
        return TransactionResult::tecINTERNAL;
    };
    let Some(new_balance) = destination
        .balance
        .checked_add(root.balance)
    else {
        return TransactionResult::tecINTERNAL;
    };
    destination.balance = new_balance;
    write_account_root(context.view, destination);
    context.view.erase(&Keylet::account(&account).key);
    TransactionResult::tesSUCCESS
}
