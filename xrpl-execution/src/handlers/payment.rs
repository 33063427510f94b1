//! Payment: native transfers, trust-line rippling and cross-currency
//! delivery through the flow engine.

use crate::common::{account_root, spendable_xrp, write_account_root, ApplyContext};
use crate::flow::{build_strands, execute_flow};
use tracing::debug;
use xrpl_ledger::{ReadView, WriteView};
use xrpl_models::amount::{Amount, IouValue, Rounding, XrpAmount};
use xrpl_models::entry::{account_flags, AccountRoot, LedgerEntry};
use xrpl_models::features::Feature;
use xrpl_models::keylet::Keylet;
use xrpl_models::rate::value_of;
use xrpl_models::result::TransactionResult;
use xrpl_models::transaction::{tx_flags, Payment, Transaction};

pub fn preflight(tx: &Transaction, payment: &Payment) -> TransactionResult {
    if tx.common.flags & !tx_flags::TF_PAYMENT_MASK != 0 {
        return TransactionResult::temINVALID_FLAG;
    }
    if payment.amount.is_zero() || payment.amount.is_negative() {
        return TransactionResult::temBAD_AMOUNT;
    }

    let native = payment.amount.is_xrp();
    let send_max_native = payment.send_max.as_ref().map_or(false, Amount::is_xrp);
    let no_ripple_direct = tx.common.flags & tx_flags::TF_NO_RIPPLE_DIRECT != 0;
    let partial = tx.common.flags & tx_flags::TF_PARTIAL_PAYMENT != 0;

    if let Some(send_max) = &payment.send_max {
        if send_max.is_zero() || send_max.is_negative() {
            return TransactionResult::temBAD_AMOUNT;
        }
        if send_max_native && native {
            return TransactionResult::temBAD_SEND_XRP_MAX;
        }
    }
    if native && !payment.paths.is_empty() {
        return TransactionResult::temBAD_SEND_XRP_PATHS;
    }
    if payment.paths.0.len() > xrpl_models::config::MAX_PATH_COUNT
        || payment
            .paths
            .0
            .iter()
            .any(|path| path.0.len() > xrpl_models::config::MAX_PATH_LENGTH)
    {
        return TransactionResult::temBAD_PATH;
    }

    // an all-native payment to oneself accomplishes nothing; self
    // payments of issued value need a path through the books
    if payment.destination == tx.common.account {
        let cross_currency = payment
            .send_max
            .as_ref()
            .map_or(false, |send_max| send_max.issue() != payment.amount.issue());
        if !cross_currency {
            return TransactionResult::temREDUNDANT;
        }
    }

    if let Some(deliver_min) = &payment.deliver_min {
        if !partial {
            return TransactionResult::temBAD_AMOUNT;
        }
        if deliver_min.is_zero() || deliver_min.is_negative() {
            return TransactionResult::temBAD_AMOUNT;
        }
        if deliver_min.issue() != payment.amount.issue() {
            return TransactionResult::temBAD_AMOUNT;
        }
    }
    // flags that shape path selection make no sense on a plain native
    // transfer
    if native && payment.send_max.is_none() {
        if no_ripple_direct {
            return TransactionResult::temBAD_SEND_XRP_NO_DIRECT;
        }
        if partial {
            return TransactionResult::temBAD_SEND_XRP_PARTIAL;
        }
        if tx.common.flags & tx_flags::TF_LIMIT_QUALITY != 0 {
            return TransactionResult::temBAD_SEND_XRP_LIMIT;
        }
    }
    TransactionResult::tesSUCCESS
}

pub fn preclaim(view: &dyn ReadView, tx: &Transaction, payment: &Payment) -> TransactionResult {
    // malformed or currently unusable paths surface here, before any fee
    // is at stake; doApply rebuilds the strands against the same state
    let simple_native = payment.amount.is_xrp()
        && payment.send_max.is_none()
        && payment.paths.is_empty();
    if !simple_native {
        let no_ripple_direct = tx.common.flags & tx_flags::TF_NO_RIPPLE_DIRECT != 0;
        if let Err(result) = build_strands(
            view,
            tx.common.account,
            payment.destination,
            payment.amount.issue(),
            payment.send_max.as_ref().map(Amount::issue),
            &payment.paths,
            !no_ripple_direct,
        ) {
            if !result.is_tec() {
                return result;
            }
        }
    }
    match account_root(view, &payment.destination) {
        None => {
            // a large enough native payment creates the destination
            match &payment.amount {
                Amount::Xrp(xrp) => {
                    if (xrp.drops() as u64) < view.header().reserve_base {
                        return TransactionResult::tecNO_DST_INSUF_XRP;
                    }
                }
                Amount::Iou(_) => return TransactionResult::tecNO_DST,
            }
        }
        Some(destination) => {
            if destination.has_flag(account_flags::LSF_REQUIRE_DEST_TAG)
                && payment.destination_tag.is_none()
            {
                return TransactionResult::tecDST_TAG_NEEDED;
            }
            if view.header().features.is_enabled(Feature::DepositAuth)
                && destination.has_flag(account_flags::LSF_DEPOSIT_AUTH)
                && payment.destination != tx.common.account
            {
                let preauth =
                    Keylet::deposit_preauth(&payment.destination, &tx.common.account);
                if !view.exists(&preauth.key) {
                    return TransactionResult::tecNO_PERMISSION;
                }
            }
        }
    }
    TransactionResult::tesSUCCESS
}

pub fn do_apply(context: &mut ApplyContext, payment: &Payment) -> TransactionResult {
    let simple_native = payment.amount.is_xrp()
        && payment.send_max.is_none()
        && payment.paths.is_empty();
    if simple_native {
        return apply_native(context, payment);
    }
    apply_flow(context, payment)
}

/// The direct native transfer: no strands, no books.
fn apply_native(context: &mut ApplyContext, payment: &Payment) -> TransactionResult {
    let account = context.account();
    let Amount::Xrp(amount) = payment.amount else {
        return TransactionResult::tecINTERNAL;
    };
    let drops = amount.drops();

    let Some(source) = account_root(context.view, &account) else {
        return TransactionResult::tecINTERNAL;
    };
    if spendable_xrp(context.view, &source) < drops {
        return TransactionResult::tecUNFUNDED_PAYMENT;
    }

    let destination_key = Keylet::account(&payment.destination).key;
    match context.view.get(&destination_key) {
        Some(LedgerEntry::AccountRoot(mut destination)) => {
            let Some(new_balance) = destination.balance.checked_add(amount) else {
                return TransactionResult::tecINTERNAL;
            };
            destination.balance = new_balance;
            context
                .view
                .update(destination_key, LedgerEntry::AccountRoot(destination));
        }
        None => {
            // the first funding payment creates the account
            if (drops as u64) < context.view.header().reserve_base {
                return TransactionResult::tecNO_DST_INSUF_XRP;
            }
            debug!(destination = %payment.destination, "funding payment creates account");
            context.view.insert(
                destination_key,
                LedgerEntry::AccountRoot(AccountRoot::new(payment.destination, amount, 1)),
            );
        }
        Some(_) => return TransactionResult::tecINTERNAL,
    }

    let Some(mut source) = account_root(context.view, &account) else {
        return TransactionResult::tecINTERNAL;
    };
    let Some(new_balance) = source.balance.checked_sub(amount) else {
        return TransactionResult::tecUNFUNDED_PAYMENT;
    };
    source.balance = new_balance;
    write_account_root(context.view, source);
    TransactionResult::tesSUCCESS
}

/// Everything else goes through strands.
fn apply_flow(context: &mut ApplyContext, payment: &Payment) -> TransactionResult {
    let account = context.account();
    let flags = context.tx.common.flags;
    let partial = flags & tx_flags::TF_PARTIAL_PAYMENT != 0;
    let no_ripple_direct = flags & tx_flags::TF_NO_RIPPLE_DIRECT != 0;

    let strands = match build_strands(
        context.view,
        account,
        payment.destination,
        payment.amount.issue(),
        payment.send_max.as_ref().map(Amount::issue),
        &payment.paths,
        !no_ripple_direct,
    ) {
        Ok(strands) => strands,
        // preclaim validated construction against this same state; only
        // claimed-failure classes may pass through from here
        Err(result) if result.is_tec() => return result,
        Err(_) => return TransactionResult::tecINTERNAL,
    };

    let Ok(deliver_value) = value_of(&payment.amount) else {
        return TransactionResult::tecINTERNAL;
    };
    let send_max_value = match &payment.send_max {
        Some(send_max) => match value_of(send_max) {
            Ok(value) => Some(value),
            Err(_) => return TransactionResult::tecINTERNAL,
        },
        None => None,
    };
    let deliver_min_value = match &payment.deliver_min {
        Some(deliver_min) => match value_of(deliver_min) {
            Ok(value) => Some(value),
            Err(_) => return TransactionResult::tecINTERNAL,
        },
        None => None,
    };
    // limit-quality payments refuse liquidity worse than the implied
    // send-max to amount ratio
    let limit_quality = if flags & tx_flags::TF_LIMIT_QUALITY != 0 {
        match &send_max_value {
            Some(send_max_value) => {
                match send_max_value.checked_div(deliver_value, Rounding::Nearest) {
                    Ok(quality) => Some(quality),
                    Err(_) => return TransactionResult::tecINTERNAL,
                }
            }
            None => None,
        }
    } else {
        None
    };

    let outcome = execute_flow(
        context.view,
        &strands,
        deliver_value,
        send_max_value,
        partial,
        limit_quality,
        deliver_min_value,
    );

    if outcome.result.is_success() {
        let delivered = rebuild_delivered(payment, outcome.delivered);
        context.delivered = delivered;
    }
    outcome.result
}

fn rebuild_delivered(payment: &Payment, delivered: IouValue) -> Option<Amount> {
    match payment.amount.issue() {
        xrpl_models::issue::Issue::Xrp => {
            XrpAmount::from_drops(crate::flow::step::to_drops(delivered))
                .ok()
                .map(Amount::Xrp)
        }
        xrpl_models::issue::Issue::Iou { currency, issuer } => Some(Amount::Iou(
            xrpl_models::amount::IouAmount::new(delivered, currency, issuer),
        )),
    }
}
