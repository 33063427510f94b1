//! The three-phase transaction application pipeline.

use crate::common::{account_root, write_account_root, ApplyContext};
use crate::handlers;
use crate::signature_check::{preclaim_signing_authority, preflight_signature};
use crate::types::{AffectedNode, ApplyResult, Metadata, NodeChange};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};
use xrpl_hash::Hash;
use xrpl_ledger::sandbox::EntryChange;
use xrpl_ledger::{Ledger, ReadView, Sandbox, WriteView};
use xrpl_models::entry::LedgerEntry;
use xrpl_models::features::Feature;
use xrpl_models::keylet::Keylet;
use xrpl_models::result::TransactionResult;
use xrpl_models::transaction::{Transaction, TransactionKind};

/// The transaction engine. One instance drives one ledger's apply loop;
/// the apply view is borrowed per call, never shared.
#[derive(Default)]
pub struct Engine {
    transaction_index: u32,
}

impl Engine {
    /// A fresh engine for a new close round.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one transaction to the ledger being built. Always returns a
    /// terminal result; `tes` and `tec` results are recorded in the
    /// ledger, everything else leaves no trace.
    pub fn apply(&mut self, ledger: &mut Ledger, tx: &Transaction) -> ApplyResult {
        let result = self.apply_inner(ledger, tx);
        debug!(
            result = %result.result,
            applied = result.applied,
            "{}",
            result.result.message()
        );
        if result.applied {
            self.transaction_index += 1;
        }
        result
    }

    fn apply_inner(&mut self, ledger: &mut Ledger, tx: &Transaction) -> ApplyResult {
        // phase 1: stateless checks
        let preflight = preflight(ledger, tx);
        if !preflight.is_success() {
            debug!(result = %preflight, "preflight rejected transaction");
            return self.not_applied(preflight);
        }

        // phase 2: read-only checks against the base view
        let preclaim = preclaim(ledger, tx);
        if !preclaim.is_success() && !preclaim.is_tec() {
            debug!(result = %preclaim, "preclaim rejected transaction");
            return self.not_applied(preclaim);
        }

        let Ok(tx_hash) = tx.hash() else {
            return self.not_applied(TransactionResult::temMALFORMED);
        };

        // phase 3: mutate inside a sandbox
        let fee = tx.common.fee.drops();
        let mut result = preclaim;
        if result.is_success() {
            let mut sandbox = Sandbox::new(ledger);
            if let Err(preamble_failure) = apply_preamble(&mut sandbox, tx, &tx_hash) {
                sandbox.discard();
                return self.not_applied(preamble_failure);
            }
            let mut context = ApplyContext {
                tx,
                tx_hash,
                view: &mut sandbox,
                delivered: None,
            };
            result = match catch_unwind(AssertUnwindSafe(|| dispatch(&mut context))) {
                Ok(handler_result) => handler_result,
                Err(_) => {
                    warn!("handler panicked; containing as tecINTERNAL");
                    TransactionResult::tecINTERNAL
                }
            };
            let delivered = context.delivered.take();
            // a handler may only surface tes or tec; anything else is a
            // handler bug and must not leak state
            if !result.is_success() && !result.is_tec() {
                warn!(result = %result, "handler returned a non-applied class from doApply");
                result = TransactionResult::tecINTERNAL;
            }

            if result.is_success() {
                let metadata = self.build_metadata(&sandbox, result, tx, delivered);
                sandbox.apply();
                ledger.record_transaction(tx_hash);
                return ApplyResult {
                    result,
                    applied: true,
                    fee_claimed: fee,
                    metadata,
                };
            }
            sandbox.discard();
        }

        // tec path: keep only the fee debit and sequence consumption
        let mut fee_sandbox = Sandbox::new(ledger);
        if let Err(preamble_failure) = apply_preamble(&mut fee_sandbox, tx, &tx_hash) {
            fee_sandbox.discard();
            return self.not_applied(preamble_failure);
        }
        let metadata = self.build_metadata(&fee_sandbox, result, tx, None);
        fee_sandbox.apply();
        ledger.record_transaction(tx_hash);
        ApplyResult {
            result,
            applied: true,
            fee_claimed: fee,
            metadata,
        }
    }

    fn not_applied(&self, result: TransactionResult) -> ApplyResult {
        ApplyResult {
            result,
            applied: false,
            fee_claimed: 0,
            metadata: Metadata::default(),
        }
    }

    fn build_metadata(
        &self,
        sandbox: &Sandbox,
        result: TransactionResult,
        tx: &Transaction,
        delivered: Option<xrpl_models::Amount>,
    ) -> Metadata {
        let mut metadata = Metadata {
            transaction_index: self.transaction_index,
            transaction_result: Some(result),
            ..Default::default()
        };
        if result.is_success() {
            if let TransactionKind::Payment(payment) = &tx.kind {
                // what the payment actually moved; differs from Amount on
                // partial payments
                metadata.delivered_amount = delivered.or(Some(payment.amount));
            }
        }
        for (key, change) in sandbox.iter_changes() {
            let previous = sandbox.parent_get(key);
            let node = match (change, previous) {
                (EntryChange::Set(entry), None) => AffectedNode {
                    change: NodeChange::Created,
                    entry_type: entry.entry_type(),
                    ledger_index: *key,
                    previous_fields: None,
                    final_fields: entry.to_canonical_bytes().ok(),
                },
                (EntryChange::Set(entry), Some(before)) => AffectedNode {
                    change: NodeChange::Modified,
                    entry_type: entry.entry_type(),
                    ledger_index: *key,
                    previous_fields: before.to_canonical_bytes().ok(),
                    final_fields: entry.to_canonical_bytes().ok(),
                },
                (EntryChange::Delete, Some(before)) => AffectedNode {
                    change: NodeChange::Deleted,
                    entry_type: before.entry_type(),
                    ledger_index: *key,
                    previous_fields: before.to_canonical_bytes().ok(),
                    final_fields: None,
                },
                // a buffered delete of a key the parent never had is a
                // no-op, not metadata
                (EntryChange::Delete, None) => continue,
            };
            metadata.affected_nodes.push(node);
        }
        metadata
    }
}

/// Phase 1: stateless structural and cryptographic validation.
fn preflight(ledger: &Ledger, tx: &Transaction) -> TransactionResult {
    let features = &ledger.header().features;

    if tx.common.fee.is_negative() {
        return TransactionResult::temBAD_FEE;
    }
    if tx.common.ticket_sequence.is_some() {
        if !features.is_enabled(Feature::TicketBatch) {
            return TransactionResult::temDISABLED;
        }
        if tx.common.sequence != 0 {
            return TransactionResult::temSEQ_AND_TICKET;
        }
    }

    let signature = preflight_signature(tx);
    if !signature.is_success() {
        return signature;
    }

    match &tx.kind {
        TransactionKind::Payment(payment) => handlers::payment::preflight(tx, payment),
        TransactionKind::AccountSet(account_set) => {
            handlers::account::preflight_account_set(tx, account_set)
        }
        TransactionKind::SetRegularKey(set) => {
            handlers::account::preflight_set_regular_key(tx, set)
        }
        TransactionKind::OfferCreate(offer) => handlers::offer::preflight_create(tx, offer),
        TransactionKind::OfferCancel(cancel) => handlers::offer::preflight_cancel(tx, cancel),
        TransactionKind::TicketCreate(create) => handlers::ticket::preflight(tx, create),
        TransactionKind::SignerListSet(set) => handlers::signer_list::preflight(tx, set),
        TransactionKind::PaymentChannelCreate(create) => {
            handlers::paychan::preflight_create(tx, create)
        }
        TransactionKind::PaymentChannelFund(fund) => handlers::paychan::preflight_fund(tx, fund),
        TransactionKind::PaymentChannelClaim(claim) => {
            handlers::paychan::preflight_claim(tx, claim)
        }
        TransactionKind::DepositPreauth(preauth) => {
            handlers::deposit_preauth::preflight(tx, preauth, features)
        }
        TransactionKind::TrustSet(trust_set) => handlers::trustset::preflight(tx, trust_set),
        TransactionKind::AccountDelete(delete) => {
            handlers::account::preflight_account_delete(tx, delete)
        }
        TransactionKind::OracleSet(set) => handlers::oracle::preflight_set(tx, set, features),
        TransactionKind::OracleDelete(delete) => {
            handlers::oracle::preflight_delete(tx, delete, features)
        }
    }
}

/// Phase 2: read-only validation against the base view.
fn preclaim(ledger: &Ledger, tx: &Transaction) -> TransactionResult {
    let Some(root) = account_root(ledger, &tx.common.account) else {
        return TransactionResult::terNO_ACCOUNT;
    };

    // fee schedule and balance
    if (tx.common.fee.drops() as u64) < ledger.header().fee_base {
        return TransactionResult::terINSUF_FEE_B;
    }
    if root.balance.drops() < tx.common.fee.drops() {
        return TransactionResult::terINSUF_FEE_B;
    }

    // sequence or ticket
    match tx.common.ticket_sequence {
        Some(ticket_sequence) => {
            let key = Keylet::ticket(&tx.common.account, ticket_sequence).key;
            if !ledger.exists(&key) {
                return if ticket_sequence >= root.sequence {
                    TransactionResult::terPRE_TICKET
                } else {
                    TransactionResult::tefNO_TICKET
                };
            }
        }
        None => {
            if tx.common.sequence < root.sequence {
                return TransactionResult::tefPAST_SEQ;
            }
            if tx.common.sequence > root.sequence {
                return TransactionResult::terPRE_SEQ;
            }
        }
    }

    if let Some(last_ledger_sequence) = tx.common.last_ledger_sequence {
        if ledger.header().sequence > last_ledger_sequence {
            return TransactionResult::tefMAX_LEDGER;
        }
    }

    if let Some(required) = &tx.common.account_txn_id {
        if root.account_txn_id != Some(*required) {
            return TransactionResult::tefWRONG_PRIOR;
        }
    }

    let authority = preclaim_signing_authority(ledger, tx);
    if !authority.is_success() {
        return authority;
    }

    match &tx.kind {
        TransactionKind::Payment(payment) => handlers::payment::preclaim(ledger, tx, payment),
        TransactionKind::OfferCreate(offer) => handlers::offer::preclaim_create(ledger, tx, offer),
        TransactionKind::OfferCancel(_) => TransactionResult::tesSUCCESS,
        TransactionKind::PaymentChannelCreate(create) => {
            handlers::paychan::preclaim_create(ledger, tx, create)
        }
        TransactionKind::PaymentChannelFund(fund) => {
            handlers::paychan::preclaim_fund(ledger, tx, fund)
        }
        TransactionKind::PaymentChannelClaim(claim) => {
            handlers::paychan::preclaim_claim(ledger, tx, claim)
        }
        TransactionKind::DepositPreauth(preauth) => {
            handlers::deposit_preauth::preclaim(ledger, tx, preauth)
        }
        TransactionKind::TrustSet(trust_set) => {
            handlers::trustset::preclaim(ledger, tx, trust_set)
        }
        TransactionKind::AccountDelete(delete) => {
            handlers::account::preclaim_account_delete(ledger, tx, delete)
        }
        TransactionKind::OracleSet(set) => handlers::oracle::preclaim_set(ledger, tx, set),
        TransactionKind::OracleDelete(delete) => {
            handlers::oracle::preclaim_delete(ledger, tx, delete)
        }
        _ => TransactionResult::tesSUCCESS,
    }
}

/// The fee debit and sequence consumption every applied transaction pays,
/// regardless of its final result class.
fn apply_preamble(
    sandbox: &mut Sandbox,
    tx: &Transaction,
    tx_hash: &Hash,
) -> Result<(), TransactionResult> {
    let Some(mut root) = account_root(sandbox, &tx.common.account) else {
        return Err(TransactionResult::terNO_ACCOUNT);
    };

    let fee = tx.common.fee.drops();
    let new_balance = root.balance.drops() - fee;
    if new_balance < 0 {
        return Err(TransactionResult::terINSUF_FEE_B);
    }
    root.balance = xrpl_models::amount::XrpAmount::from_drops(new_balance)
        .map_err(|_| TransactionResult::tefINTERNAL)?;
    sandbox.adjust_drops_destroyed(fee);

    match tx.common.ticket_sequence {
        Some(ticket_sequence) => {
            // consume the ticket: entry, directory index and reserve unit
            let key = Keylet::ticket(&tx.common.account, ticket_sequence).key;
            let Some(LedgerEntry::Ticket(ticket)) = sandbox.get(&key) else {
                return Err(TransactionResult::tefNO_TICKET);
            };
            xrpl_ledger::dir::owner_dir_remove(
                sandbox,
                &tx.common.account,
                ticket.owner_node,
                &key,
            )
            .map_err(|_| TransactionResult::tefINTERNAL)?;
            sandbox.erase(&key);
            root.owner_count = root.owner_count.saturating_sub(1);
            root.ticket_count = root.ticket_count.saturating_sub(1);
        }
        None => {
            root.sequence += 1;
        }
    }

    // the tracked last-transaction id advances with every applied tx
    if root.account_txn_id.is_some() {
        root.account_txn_id = Some(*tx_hash);
    }

    write_account_root(sandbox, root);
    Ok(())
}

/// doApply dispatch.
fn dispatch(context: &mut ApplyContext) -> TransactionResult {
    match &context.tx.kind {
        TransactionKind::Payment(payment) => handlers::payment::do_apply(context, payment),
        TransactionKind::AccountSet(account_set) => {
            handlers::account::apply_account_set(context, account_set)
        }
        TransactionKind::SetRegularKey(set) => {
            handlers::account::apply_set_regular_key(context, set)
        }
        TransactionKind::OfferCreate(offer) => handlers::offer::apply_create(context, offer),
        TransactionKind::OfferCancel(cancel) => handlers::offer::apply_cancel(context, cancel),
        TransactionKind::TicketCreate(create) => handlers::ticket::do_apply(context, create),
        TransactionKind::SignerListSet(set) => handlers::signer_list::do_apply(context, set),
        TransactionKind::PaymentChannelCreate(create) => {
            handlers::paychan::apply_create(context, create)
        }
        TransactionKind::PaymentChannelFund(fund) => handlers::paychan::apply_fund(context, fund),
        TransactionKind::PaymentChannelClaim(claim) => {
            handlers::paychan::apply_claim(context, claim)
        }
        TransactionKind::DepositPreauth(preauth) => {
            handlers::deposit_preauth::do_apply(context, preauth)
        }
        TransactionKind::TrustSet(trust_set) => handlers::trustset::do_apply(context, trust_set),
        TransactionKind::AccountDelete(delete) => {
            handlers::account::apply_account_delete(context, delete)
        }
        TransactionKind::OracleSet(set) => handlers::oracle::apply_set(context, set),
        TransactionKind::OracleDelete(delete) => handlers::oracle::apply_delete(context, delete),
    }
}
