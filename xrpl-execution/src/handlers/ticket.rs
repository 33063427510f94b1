//! TicketCreate.

use crate::common::{account_root, covers_reserve, write_account_root, ApplyContext};
use xrpl_ledger::dir::owner_dir_insert;
use xrpl_ledger::WriteView;
use xrpl_models::config::MAX_TICKET_COUNT;
use xrpl_models::entry::{LedgerEntry, Ticket};
use xrpl_models::keylet::Keylet;
use xrpl_models::result::TransactionResult;
use xrpl_models::transaction::{tx_flags, TicketCreate, Transaction};

pub fn preflight(tx: &Transaction, create: &TicketCreate) -> TransactionResult {
    if tx.common.flags & !tx_flags::TF_UNIVERSAL_MASK != 0 {
        return TransactionResult::temINVALID_FLAG;
    }
    if create.ticket_count == 0 || create.ticket_count > MAX_TICKET_COUNT {
        return TransactionResult::temINVALID_COUNT;
    }
    TransactionResult::tesSUCCESS
}

pub fn do_apply(context: &mut ApplyContext, create: &TicketCreate) -> TransactionResult {
    let account = context.account();
    let Some(mut root) = account_root(context.view, &account) else {
        return TransactionResult::tecINTERNAL;
    };

    // an account may never hold more than 250 tickets; a consumed ticket
    // already left the count in the preamble
    if root.ticket_count.saturating_add(create.ticket_count) > MAX_TICKET_COUNT {
        return TransactionResult::tecDIR_FULL;
    }

    let new_owner_count = root.owner_count.saturating_add(create.ticket_count);
    if !covers_reserve(context.view, &root, new_owner_count) {
        return TransactionResult::tecINSUFFICIENT_RESERVE;
    }

    // tickets reserve the sequence range starting after the current one;
    // the preamble has already advanced the account sequence
    let first = root.sequence;
    for offset in 0..create.ticket_count {
        let ticket_sequence = first + offset;
        let key = Keylet::ticket(&account, ticket_sequence).key;
        let Ok(page) = owner_dir_insert(context.view, &account, key) else {
            return TransactionResult::tecDIR_FULL;
        };
        context.view.insert(
            key,
            LedgerEntry::Ticket(Ticket {
                account,
                ticket_sequence,
                owner_node: page,
            }),
        );
    }

    root.sequence = first + create.ticket_count;
    root.ticket_count += create.ticket_count;
    root.owner_count = new_owner_count;
    write_account_root(context.view, root);
    TransactionResult::tesSUCCESS
}
