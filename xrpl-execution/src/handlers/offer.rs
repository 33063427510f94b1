//! OfferCreate and OfferCancel.

use crate::common::{account_root, covers_reserve, trust_line, write_account_root, ApplyContext};
use crate::flow::book::{self, remove_offer};
use tracing::debug;
use xrpl_ledger::dir::{book_dir_insert, encode_quality, owner_dir_insert};
use xrpl_ledger::{PaymentSandbox, ReadView, WriteView};
use xrpl_models::amount::{Amount, IouValue, Rounding};
use xrpl_models::entry::{offer_flags, LedgerEntry, Offer};
use xrpl_models::issue::Issue;
use xrpl_models::keylet::Keylet;
use xrpl_models::rate::{value_of, Quality};
use xrpl_models::result::TransactionResult;
use xrpl_models::transaction::{tx_flags, OfferCancel, OfferCreate, Transaction};

pub fn preflight_create(tx: &Transaction, offer: &OfferCreate) -> TransactionResult {
    if tx.common.flags & !tx_flags::TF_OFFER_CREATE_MASK != 0 {
        return TransactionResult::temINVALID_FLAG;
    }
    let flags = tx.common.flags;
    if flags & tx_flags::TF_IMMEDIATE_OR_CANCEL != 0 && flags & tx_flags::TF_FILL_OR_KILL != 0 {
        return TransactionResult::temINVALID_FLAG;
    }
    if offer.taker_pays.is_zero()
        || offer.taker_pays.is_negative()
        || offer.taker_gets.is_zero()
        || offer.taker_gets.is_negative()
    {
        return TransactionResult::temBAD_OFFER;
    }
    if offer.taker_pays.is_xrp() && offer.taker_gets.is_xrp() {
        return TransactionResult::temBAD_OFFER;
    }
    if offer.taker_pays.issue() == offer.taker_gets.issue() {
        return TransactionResult::temREDUNDANT;
    }
    if offer.expiration == Some(0) {
        return TransactionResult::temBAD_EXPIRATION;
    }
    TransactionResult::tesSUCCESS
}

pub fn preclaim_create(
    view: &dyn ReadView,
    tx: &Transaction,
    offer: &OfferCreate,
) -> TransactionResult {
    if let Some(expiration) = offer.expiration {
        if expiration <= view.header().parent_close_time {
            return TransactionResult::tecEXPIRED;
        }
    }
    for side in [&offer.taker_pays, &offer.taker_gets] {
        if let Issue::Iou { issuer, .. } = side.issue() {
            if !view.exists(&Keylet::account(&issuer).key) {
                return TransactionResult::tecNO_ISSUER;
            }
        }
    }
    // selling a frozen asset is pointless and rejected up front
    if let Issue::Iou { currency, issuer } = offer.taker_gets.issue() {
        if let Some(line) = trust_line(view, &tx.common.account, &issuer, &currency) {
            if crate::common::line_frozen_by(&line, &issuer) {
                return TransactionResult::tecFROZEN;
            }
        }
    }
    TransactionResult::tesSUCCESS
}

/// The effective tick size for a book: the smallest configured by either
/// issuer, if any.
fn effective_tick_size(view: &dyn ReadView, pays: &Issue, gets: &Issue) -> Option<u8> {
    let mut tick: Option<u8> = None;
    for issue in [pays, gets] {
        if let Issue::Iou { issuer, .. } = issue {
            if let Some(root) = account_root(view, issuer) {
                if let Some(size) = root.tick_size {
                    tick = Some(tick.map_or(size, |current| current.min(size)));
                }
            }
        }
    }
    tick
}

/// Round a quality to `tick` significant decimal digits, away from the
/// taker's favor (the placed offer may ask a little more, never less).
fn round_quality_to_tick(quality: IouValue, tick: u8) -> IouValue {
    if quality.is_zero() {
        return quality;
    }
    let digits_to_drop = 16 - tick as i32;
    let mantissa = quality.mantissa();
    let factor = 10_i64.pow(digits_to_drop as u32);
    let truncated = mantissa / factor;
    let rounded = if mantissa % factor != 0 {
        truncated + 1
    } else {
        truncated
    };
    IouValue::new(rounded * factor, quality.exponent()).unwrap_or(quality)
}

pub fn apply_create(context: &mut ApplyContext, offer: &OfferCreate) -> TransactionResult {
    let account = context.account();
    let flags = context.tx.common.flags;

    // an explicit OfferSequence cancels the older offer first
    if let Some(offer_sequence) = offer.offer_sequence {
        let key = Keylet::offer(&account, offer_sequence).key;
        if context.view.exists(&key) {
            if let Err(result) = remove_offer(context.view, &key, false) {
                return result;
            }
        }
    }

    let pays_issue = offer.taker_pays.issue();
    let gets_issue = offer.taker_gets.issue();
    let Ok(mut pays_value) = value_of(&offer.taker_pays) else {
        return TransactionResult::tecINTERNAL;
    };
    let Ok(mut gets_value) = value_of(&offer.taker_gets) else {
        return TransactionResult::tecINTERNAL;
    };

    // cross the opposing book up to our own quality: we accept paying
    // gets-per-pays no worse than offered
    let Ok(limit_quality) = Quality::from_amounts(&offer.taker_gets, &offer.taker_pays) else {
        return TransactionResult::tecINTERNAL;
    };
    let limit_quality = limit_quality.value();
    let strict = flags & tx_flags::TF_PASSIVE != 0;

    let mut crossed_in = IouValue::zero();
    let mut crossed_out = IouValue::zero();
    {
        let mut sandbox = PaymentSandbox::new(context.view);
        let mut rounds = 0;
        loop {
            rounds += 1;
            if rounds > 8 {
                break;
            }
            let Ok(remaining_out) = pays_value.checked_sub(crossed_out) else {
                break;
            };
            if remaining_out.is_zero() || remaining_out.is_negative() {
                break;
            }
            let plan = match book::plan_book_with_quality(
                &sandbox,
                &account,
                &account,
                &gets_issue,
                &pays_issue,
                remaining_out,
                Some((limit_quality, strict)),
            ) {
                Ok(plan) => plan,
                Err(result) => return result,
            };
            if plan.takes.is_empty() && plan.dead.is_empty() {
                break;
            }
            // the taker must be able to fund the input side
            let funds = taker_funds(&sandbox, &account, &gets_issue);
            if !plan.takes.is_empty() && plan.total_in > funds {
                break;
            }
            let had_takes = !plan.takes.is_empty();
            if let Err(result) = book::execute_book(&mut sandbox, &plan) {
                return result;
            }
            crossed_in = match crossed_in.checked_add(plan.total_in) {
                Ok(total) => total,
                Err(_) => return TransactionResult::tecINTERNAL,
            };
            crossed_out = match crossed_out.checked_add(plan.total_out) {
                Ok(total) => total,
                Err(_) => return TransactionResult::tecINTERNAL,
            };
            if !had_takes {
                // only dead offers were swept; look again
                continue;
            }
        }
        // the book has no endpoint steps here: native legs settle against
        // the taker directly
        if gets_issue.is_xrp() && !crossed_in.is_zero() {
            let drops = crate::flow::step::to_drops(crossed_in);
            if let Err(result) = crate::common::adjust_xrp_balance(&mut sandbox, &account, -drops)
            {
                return result;
            }
        }
        if pays_issue.is_xrp() && !crossed_out.is_zero() {
            let drops = crate::flow::step::to_drops(crossed_out);
            if let Err(result) = crate::common::adjust_xrp_balance(&mut sandbox, &account, drops) {
                return result;
            }
        }
        // crossing results stand regardless of what happens to the rest
        let _ = sandbox.apply();
    }

    // move the crossed value to the taker's own books: input was paid by
    // us, output arrived to us, both already settled by execute_book
    pays_value = match pays_value.checked_sub(crossed_out) {
        Ok(value) => value,
        Err(_) => return TransactionResult::tecINTERNAL,
    };
    gets_value = match gets_value.checked_sub(crossed_in) {
        Ok(value) => value,
        Err(_) => return TransactionResult::tecINTERNAL,
    };

    if flags & tx_flags::TF_FILL_OR_KILL != 0 && !pays_value.is_zero() {
        debug!("fill-or-kill offer not fully crossed");
        return TransactionResult::tecKILLED;
    }
    if flags & tx_flags::TF_IMMEDIATE_OR_CANCEL != 0 {
        return TransactionResult::tesSUCCESS;
    }
    if pays_value.is_zero() || gets_value.is_zero() || gets_value.is_negative() {
        return TransactionResult::tesSUCCESS;
    }

    // the residual becomes a new offer, funded or not; unfunded residues
    // are rejected
    let funds = {
        let sandbox = PaymentSandbox::new(context.view);
        let funds = taker_funds(&sandbox, &account, &gets_issue);
        sandbox.discard();
        funds
    };
    if funds.is_zero() {
        return TransactionResult::tecUNFUNDED_OFFER;
    }

    let Some(mut root) = account_root(context.view, &account) else {
        return TransactionResult::tecINTERNAL;
    };
    if !covers_reserve(context.view, &root, root.owner_count + 1) {
        return TransactionResult::tecINSUF_RESERVE_OFFER;
    }

    // honor the issuers' tick size on the placed remainder
    let mut quality = match pays_value.checked_div(gets_value, Rounding::Nearest) {
        Ok(quality) => quality,
        Err(_) => return TransactionResult::tecINTERNAL,
    };
    if let Some(tick) = effective_tick_size(context.view, &pays_issue, &gets_issue) {
        quality = round_quality_to_tick(quality, tick);
        pays_value = match gets_value.checked_mul(quality, Rounding::Up) {
            Ok(value) => value,
            Err(_) => return TransactionResult::tecINTERNAL,
        };
    }
    // a partially crossed remainder may not land on the books at a better
    // quality than the original offer asked
    if crossed_out > IouValue::zero()
        && context
            .view
            .header()
            .features
            .is_enabled(xrpl_models::features::Feature::FixReducedOffersV3)
    {
        let Ok(original_pays) = value_of(&offer.taker_pays) else {
            return TransactionResult::tecINTERNAL;
        };
        let Ok(original_gets) = value_of(&offer.taker_gets) else {
            return TransactionResult::tecINTERNAL;
        };
        let floor = match gets_value
            .checked_mul(original_pays, Rounding::Up)
            .and_then(|product| product.checked_div(original_gets, Rounding::Up))
        {
            Ok(floor) => floor,
            Err(_) => return TransactionResult::tecINTERNAL,
        };
        if pays_value < floor {
            pays_value = floor;
        }
    }

    let sequence = context
        .tx
        .common
        .ticket_sequence
        .unwrap_or(context.tx.common.sequence);
    let keylet = Keylet::offer(&account, sequence);
    let Ok(taker_pays) = rebuild(&pays_issue, pays_value) else {
        return TransactionResult::tecINTERNAL;
    };
    let Ok(taker_gets) = rebuild(&gets_issue, gets_value) else {
        return TransactionResult::tecINTERNAL;
    };
    let book_quality = encode_quality(quality);
    let page_key = match book_dir_insert(
        context.view,
        &pays_issue,
        &gets_issue,
        book_quality,
        keylet.key,
    ) {
        Ok(page_key) => page_key,
        Err(_) => return TransactionResult::tecDIR_FULL,
    };
    let Ok(owner_page) = owner_dir_insert(context.view, &account, keylet.key) else {
        return TransactionResult::tecDIR_FULL;
    };

    let mut entry_flags = 0;
    if flags & tx_flags::TF_PASSIVE != 0 {
        entry_flags |= offer_flags::LSF_PASSIVE;
    }
    if flags & tx_flags::TF_SELL != 0 {
        entry_flags |= offer_flags::LSF_SELL;
    }
    context.view.insert(
        keylet.key,
        LedgerEntry::Offer(Offer {
            account,
            sequence,
            taker_pays,
            taker_gets,
            book_directory: page_key,
            book_node: 0,
            owner_node: owner_page,
            expiration: offer.expiration,
            flags: entry_flags,
        }),
    );
    root.owner_count += 1;
    write_account_root(context.view, root);
    TransactionResult::tesSUCCESS
}

fn taker_funds(
    sandbox: &PaymentSandbox,
    account: &xrpl_models::AccountId,
    gets: &Issue,
) -> IouValue {
    let account = *account;
    match gets {
        Issue::Xrp => crate::flow::xrp_spendable_value(sandbox, &account),
        Issue::Iou { currency, issuer } => {
            if account == *issuer {
                return IouValue::new(9_999_999_999_999_999, 80)
                    .unwrap_or_else(|_| IouValue::zero());
            }
            let Some(line) = trust_line(sandbox, &account, issuer, currency) else {
                return IouValue::zero();
            };
            let balance = crate::common::line_balance_from(&line, &account);
            let spendable = sandbox.balance_hook(&account, issuer, currency, balance);
            if spendable.is_negative() {
                IouValue::zero()
            } else {
                spendable
            }
        }
    }
}

fn rebuild(issue: &Issue, value: IouValue) -> Result<Amount, TransactionResult> {
    match issue {
        Issue::Xrp => Amount::from_drops(crate::flow::step::to_drops(value))
            .map_err(|_| TransactionResult::tecINTERNAL),
        Issue::Iou { currency, issuer } => Ok(Amount::Iou(
            xrpl_models::amount::IouAmount::new(value, *currency, *issuer),
        )),
    }
}

pub fn preflight_cancel(tx: &Transaction, cancel: &OfferCancel) -> TransactionResult {
    if tx.common.flags & !tx_flags::TF_UNIVERSAL_MASK != 0 {
        return TransactionResult::temINVALID_FLAG;
    }
    if cancel.offer_sequence == 0 {
        return TransactionResult::temBAD_SEQUENCE;
    }
    TransactionResult::tesSUCCESS
}

pub fn apply_cancel(context: &mut ApplyContext, cancel: &OfferCancel) -> TransactionResult {
    let account = context.account();
    let key = Keylet::offer(&account, cancel.offer_sequence).key;
    if context.view.exists(&key) {
        if let Err(result) = remove_offer(context.view, &key, false) {
            return result;
        }
    }
    // cancelling a missing offer succeeds; the slot is simply gone
    TransactionResult::tesSUCCESS
}
