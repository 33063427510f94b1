//! Offer-book traversal: planning and executing the consumption of offers
//! at the current best quality.

use super::step::{move_iou, to_drops};
use crate::common::{
    account_root, line_balance_from, spendable_xrp, trust_line, write_account_root,
};
use std::collections::BTreeMap;
use tracing::debug;
use xrpl_hash::Hash;
use xrpl_ledger::dir::{book_base, book_dir_remove, book_last_key, owner_dir_remove};
use xrpl_ledger::{PaymentSandbox, ReadView, WriteView};
use xrpl_models::account::AccountId;
use xrpl_models::amount::{Amount, IouValue, Rounding};
use xrpl_models::entry::{account_flags, LedgerEntry};
use xrpl_models::features::Feature;
use xrpl_models::issue::Issue;
use xrpl_models::rate::{value_of, Rate};
use xrpl_models::result::TransactionResult;

/// One planned bite out of one offer.
#[derive(Clone, Debug)]
pub struct OfferTake {
    /// The offer's key.
    pub offer_key: Hash,
    /// Input value the owner receives (the offer's taker-pays side).
    pub pays_take: IouValue,
    /// Output value the owner gives (the offer's taker-gets side).
    pub gets_take: IouValue,
    /// The offer is fully consumed and leaves the ledger.
    pub consumed: bool,
}

/// Offers found dead during traversal: expired or unfunded, removed on the
/// forward pass.
#[derive(Clone, Debug)]
pub struct DeadOffer {
    /// The offer's key.
    pub offer_key: Hash,
}

/// The plan a book step builds during the reverse pass.
#[derive(Clone, Debug)]
pub struct BookPlan {
    /// Bites to take, best quality first.
    pub takes: Vec<OfferTake>,
    /// Dead offers to clean up.
    pub dead: Vec<DeadOffer>,
    /// Total input value.
    pub total_in: IouValue,
    /// Total output value.
    pub total_out: IouValue,
    /// The input issue.
    pub input: Issue,
    /// The output issue.
    pub output: Issue,
    /// Account paying the input side.
    pub prev: AccountId,
    /// Account receiving the output side.
    pub next: AccountId,
}

/// How much of its taker-gets side an offer owner can actually deliver.
fn owner_funds(
    sandbox: &PaymentSandbox,
    owner: &AccountId,
    gets: &Issue,
    already_planned: &BTreeMap<AccountId, IouValue>,
) -> IouValue {
    let raw = match gets {
        Issue::Xrp => {
            let Some(root) = account_root(sandbox, owner) else {
                return IouValue::zero();
            };
            let spendable = spendable_xrp(sandbox, &root);
            let value = IouValue::from_integer(spendable).unwrap_or_else(|_| IouValue::zero());
            sandbox.xrp_balance_hook(owner, value)
        }
        Issue::Iou { currency, issuer } => {
            if owner == issuer {
                // an issuer's own obligations are funded by definition
                return IouValue::new(9_999_999_999_999_999, 80)
                    .unwrap_or_else(|_| IouValue::zero());
            }
            let Some(line) = trust_line(sandbox, owner, issuer, currency) else {
                return IouValue::zero();
            };
            let balance = line_balance_from(&line, owner);
            let spendable = sandbox.balance_hook(owner, issuer, currency, balance);
            if spendable.is_negative() {
                IouValue::zero()
            } else {
                spendable
            }
        }
    };
    match already_planned.get(owner) {
        Some(reserved) => raw.checked_sub(*reserved).unwrap_or_else(|_| IouValue::zero()),
        None => raw,
    }
}

/// Build the plan: walk book pages best-quality-first, consuming offers
/// until `request` of the output issue is covered or the book runs dry.
pub fn plan_book(
    sandbox: &PaymentSandbox,
    prev: &AccountId,
    next: &AccountId,
    input: &Issue,
    output: &Issue,
    request: IouValue,
) -> Result<BookPlan, TransactionResult> {
    plan_book_with_quality(sandbox, prev, next, input, output, request, None)
}

/// Like [`plan_book`], stopping at offers whose quality (input per output)
/// exceeds `quality_limit`; with `strict` the limit itself is excluded,
/// which is how passive offers avoid consuming their own price level.
pub fn plan_book_with_quality(
    sandbox: &PaymentSandbox,
    prev: &AccountId,
    next: &AccountId,
    input: &Issue,
    output: &Issue,
    request: IouValue,
    quality_limit: Option<(IouValue, bool)>,
) -> Result<BookPlan, TransactionResult> {
    let mut plan = BookPlan {
        takes: Vec::new(),
        dead: Vec::new(),
        total_in: IouValue::zero(),
        total_out: IouValue::zero(),
        input: *input,
        output: *output,
        prev: *prev,
        next: *next,
    };

    // the receiving side must be able to hold the output
    if let Issue::Iou { currency, issuer } = output {
        if next != issuer && trust_line(sandbox, next, issuer, currency).is_none() {
            return Ok(plan);
        }
        // a globally frozen output issuer dries the book
        if let Some(root) = account_root(sandbox, issuer) {
            if root.has_flag(account_flags::LSF_GLOBAL_FREEZE) {
                return Ok(plan);
            }
        }
    }

    let base = book_base(input, output);
    let last = book_last_key(&base);
    let mut planned_funds: BTreeMap<AccountId, IouValue> = BTreeMap::new();
    let mut remaining = request;
    let mut cursor = base;

    'pages: while let Some(page_key) = sandbox.successor(&cursor, &last) {
        cursor = page_key;
        let Some(LedgerEntry::DirectoryNode(page)) = sandbox.get(&page_key) else {
            continue;
        };
        for offer_key in &page.indexes {
            if remaining.is_zero() {
                break 'pages;
            }
            let Some(LedgerEntry::Offer(offer)) = sandbox.get(offer_key) else {
                continue;
            };
            if crate::common::has_expired(sandbox, offer.expiration) {
                plan.dead.push(DeadOffer {
                    offer_key: *offer_key,
                });
                continue;
            }
            if offer.account == *prev {
                // never cross the account funding this side of the book
                continue;
            }
            let offer_gets = value_of(&offer.taker_gets)
                .map_err(|_| TransactionResult::tecINTERNAL)?;
            let offer_pays = value_of(&offer.taker_pays)
                .map_err(|_| TransactionResult::tecINTERNAL)?;
            if offer_gets.is_zero() || offer_pays.is_zero() {
                plan.dead.push(DeadOffer {
                    offer_key: *offer_key,
                });
                continue;
            }
            if let Some((limit, strict)) = &quality_limit {
                let quality = offer_pays
                    .checked_div(offer_gets, Rounding::Nearest)
                    .map_err(|_| TransactionResult::tecINTERNAL)?;
                let too_dear = if *strict {
                    quality >= *limit
                } else {
                    quality > *limit
                };
                if too_dear {
                    // pages are quality-ordered; everything further is worse
                    break 'pages;
                }
            }
            let funds = owner_funds(sandbox, &offer.account, output, &planned_funds);
            if funds.is_zero() {
                plan.dead.push(DeadOffer {
                    offer_key: *offer_key,
                });
                continue;
            }

            let available = if funds < offer_gets { funds } else { offer_gets };
            let gets_take = if remaining < available {
                remaining
            } else {
                available
            };
            // charge input pro rata at the offer's quality
            let mut pays_take = gets_take
                .checked_mul(offer_pays, Rounding::Up)
                .and_then(|product| product.checked_div(offer_gets, Rounding::Up))
                .map_err(|_| TransactionResult::tecINTERNAL)?;
            if input.is_xrp() {
                // drops are indivisible; round the charge up to a whole drop
                let drops = to_drops(pays_take);
                let whole = IouValue::from_integer(drops)
                    .map_err(|_| TransactionResult::tecINTERNAL)?;
                pays_take = if whole < pays_take {
                    whole
                        .checked_add(IouValue::from_integer(1).unwrap_or_else(|_| IouValue::zero()))
                        .map_err(|_| TransactionResult::tecINTERNAL)?
                } else {
                    whole
                };
            }

            plan.takes.push(OfferTake {
                offer_key: *offer_key,
                pays_take,
                gets_take,
                consumed: gets_take >= offer_gets,
            });
            let reserved = planned_funds
                .entry(offer.account)
                .or_insert_with(IouValue::zero);
            *reserved = reserved
                .checked_add(gets_take)
                .map_err(|_| TransactionResult::tecINTERNAL)?;
            plan.total_in = plan
                .total_in
                .checked_add(pays_take)
                .map_err(|_| TransactionResult::tecINTERNAL)?;
            plan.total_out = plan
                .total_out
                .checked_add(gets_take)
                .map_err(|_| TransactionResult::tecINTERNAL)?;
            remaining = remaining
                .checked_sub(gets_take)
                .map_err(|_| TransactionResult::tecINTERNAL)?;
        }
    }

    Ok(plan)
}

/// Execute the plan: pay the owners, collect their output, update or
/// delete the consumed offers, sweep the dead ones.
pub fn execute_book(sandbox: &mut PaymentSandbox, plan: &BookPlan) -> Result<(), TransactionResult> {
    for dead in &plan.dead {
        remove_offer(sandbox, &dead.offer_key, true)?;
    }

    let reduced_offers = sandbox
        .header()
        .features
        .is_enabled(Feature::FixReducedOffersV1);
    let reduced_offers_v2 = sandbox
        .header()
        .features
        .is_enabled(Feature::FixReducedOffersV2);

    for take in &plan.takes {
        let Some(LedgerEntry::Offer(mut offer)) = sandbox.get(&take.offer_key) else {
            return Err(TransactionResult::tecINTERNAL);
        };
        let owner = offer.account;

        // input side: the previous node pays the owner
        match &plan.input {
            Issue::Xrp => {
                let drops = to_drops(take.pays_take);
                let pre = account_root(sandbox, &owner)
                    .and_then(|root| IouValue::from_integer(root.balance.drops()).ok())
                    .unwrap_or_else(IouValue::zero);
                crate::common::adjust_xrp_balance(sandbox, &owner, drops)?;
                sandbox.credit_xrp(
                    &owner,
                    IouValue::from_integer(drops).map_err(|_| TransactionResult::tecINTERNAL)?,
                    pre,
                );
            }
            Issue::Iou { currency, issuer } => {
                if plan.prev == *issuer {
                    move_iou(sandbox, &plan.prev, &owner, currency, take.pays_take)?;
                } else {
                    // route through the issuer's books
                    move_iou(sandbox, &plan.prev, issuer, currency, take.pays_take)?;
                    move_iou(sandbox, issuer, &owner, currency, take.pays_take)?;
                }
            }
        }

        // output side: the owner delivers to the next node, paying the
        // issuer's transfer fee when both ends are holders
        match &plan.output {
            Issue::Xrp => {
                let drops = to_drops(take.gets_take);
                crate::common::adjust_xrp_balance(sandbox, &owner, -drops)?;
                // the matching credit to `next` happens at the endpoint step
            }
            Issue::Iou { currency, issuer } => {
                if plan.next == *issuer || owner == *issuer {
                    move_iou(sandbox, &owner, &plan.next, currency, take.gets_take)?;
                } else {
                    let rate = account_root(sandbox, issuer)
                        .and_then(|root| root.transfer_rate)
                        .map_or(Rate::parity(), |raw| Rate::new(raw).unwrap_or_default());
                    let gross = rate
                        .apply(take.gets_take, Rounding::Up)
                        .map_err(|_| TransactionResult::tecINTERNAL)?;
                    move_iou(sandbox, &owner, issuer, currency, gross)?;
                    move_iou(sandbox, issuer, &plan.next, currency, take.gets_take)?;
                }
            }
        }

        // shrink or retire the offer
        if take.consumed {
            remove_offer(sandbox, &take.offer_key, false)?;
        } else {
            let gets_value =
                value_of(&offer.taker_gets).map_err(|_| TransactionResult::tecINTERNAL)?;
            let pays_value =
                value_of(&offer.taker_pays).map_err(|_| TransactionResult::tecINTERNAL)?;
            let new_gets = gets_value
                .checked_sub(take.gets_take)
                .map_err(|_| TransactionResult::tecINTERNAL)?;
            let mut new_pays = pays_value
                .checked_sub(take.pays_take)
                .map_err(|_| TransactionResult::tecINTERNAL)?;
            if reduced_offers && !new_gets.is_zero() {
                // keep the remainder at no better than the original
                // quality, rounding in the taker's favor
                let at_quality = new_gets
                    .checked_mul(pays_value, Rounding::Down)
                    .and_then(|product| product.checked_div(gets_value, Rounding::Down))
                    .map_err(|_| TransactionResult::tecINTERNAL)?;
                if at_quality < new_pays {
                    new_pays = at_quality;
                }
            }
            // under the second fix a remainder too small to price is not
            // left on the books at a distorted quality
            let dust = reduced_offers_v2
                && matches!(plan.input, Issue::Xrp)
                && to_drops(new_pays) == 0;
            if new_gets.is_zero() || new_pays.is_zero() || dust {
                remove_offer(sandbox, &take.offer_key, false)?;
            } else {
                offer.taker_gets = rebuild_amount(&plan.output, new_gets)?;
                offer.taker_pays = rebuild_amount(&plan.input, new_pays)?;
                sandbox.update(take.offer_key, LedgerEntry::Offer(offer));
            }
        }
    }
    Ok(())
}

fn rebuild_amount(issue: &Issue, value: IouValue) -> Result<Amount, TransactionResult> {
    match issue {
        Issue::Xrp => Amount::from_drops(to_drops(value))
            .map_err(|_| TransactionResult::tecINTERNAL),
        Issue::Iou { currency, issuer } => Ok(Amount::Iou(
            xrpl_models::amount::IouAmount::new(value, *currency, *issuer),
        )),
    }
}

/// Remove an offer from the ledger: book page, owner directory, reserve.
pub fn remove_offer(
    sandbox: &mut dyn WriteView,
    offer_key: &Hash,
    dead: bool,
) -> Result<(), TransactionResult> {
    let Some(LedgerEntry::Offer(offer)) = sandbox.get(offer_key) else {
        return Ok(());
    };
    if dead {
        debug!(owner = %offer.account, "sweeping dead offer");
    }
    let _ = book_dir_remove(sandbox, &offer.book_directory, offer_key);
    let _ = owner_dir_remove(sandbox, &offer.account, offer.owner_node, offer_key);
    sandbox.erase(offer_key);
    if let Some(mut root) = account_root(sandbox, &offer.account) {
        root.owner_count = root.owner_count.saturating_sub(1);
        write_account_root(sandbox, root);
    }
    Ok(())
}
