//! The step kinds and their reverse/forward passes.

use super::book::{self, BookPlan};
use super::strand::Strand;
use super::xrp_spendable_value;
use crate::common::{account_root, line_balance_from, line_limit_of, trust_line};
use xrpl_ledger::PaymentSandbox;
use xrpl_models::account::AccountId;
use xrpl_models::amount::{IouValue, Rounding};
use xrpl_models::currency::Currency;
use xrpl_models::entry::account_flags;
use xrpl_models::issue::Issue;
use xrpl_models::rate::Rate;
use xrpl_models::result::TransactionResult;

/// One step of a strand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// The native source endpoint: feeds drops into the strand.
    XrpSrc {
        /// The paying account.
        account: AccountId,
    },
    /// The native destination endpoint: receives drops from the strand.
    XrpDst {
        /// The receiving account.
        account: AccountId,
    },
    /// Moves an issued balance between line neighbors.
    Direct {
        /// Sending side.
        from: AccountId,
        /// Receiving side.
        to: AccountId,
        /// The currency of the line.
        currency: Currency,
        /// True when `from` is the strand source (no transfer fee).
        is_strand_head: bool,
    },
    /// Crosses an offer book from one issue into another.
    Book {
        /// Account paying the book's input side.
        prev: AccountId,
        /// Account receiving the book's output side.
        next: AccountId,
        /// The input issue (what offer owners are paid).
        input: Issue,
        /// The output issue (what offer owners give).
        output: Issue,
    },
}

/// Truncate a value to whole drops.
pub(crate) fn to_drops(value: IouValue) -> i64 {
    if value.is_zero() || value.is_negative() {
        return 0;
    }
    // scale the canonical mantissa to an integer amount
    let mantissa = value.mantissa();
    let exponent = value.exponent();
    if exponent >= 0 {
        mantissa.saturating_mul(10_i64.saturating_pow(exponent as u32))
    } else {
        let divisor = 10_i64.saturating_pow((-exponent) as u32);
        if divisor == 0 {
            0
        } else {
            mantissa / divisor
        }
    }
}

impl Step {
    /// Reverse pass: given the value requested at this step's output,
    /// return (input needed, output producible, book plan). The output may
    /// come back smaller than requested when liquidity caps it.
    pub fn rev(
        &self,
        sandbox: &PaymentSandbox,
        _strand: &Strand,
        request: IouValue,
    ) -> Result<(IouValue, IouValue, Option<BookPlan>), TransactionResult> {
        match self {
            Step::XrpSrc { account } => {
                let cap = xrp_spendable_value(sandbox, account);
                let out = if request > cap { cap } else { request };
                // drops are indivisible
                let out = IouValue::from_integer(to_drops(out))
                    .map_err(|_| TransactionResult::tecINTERNAL)?;
                Ok((out, out, None))
            }
            Step::XrpDst { .. } => {
                let request = IouValue::from_integer(to_drops(request))
                    .map_err(|_| TransactionResult::tecINTERNAL)?;
                Ok((request, request, None))
            }
            Step::Direct {
                from,
                to,
                currency,
                is_strand_head,
            } => {
                let cap = direct_capacity(sandbox, from, to, currency, *is_strand_head)?;
                let out = if request > cap { cap } else { request };
                if out.is_zero() {
                    return Ok((IouValue::zero(), IouValue::zero(), None));
                }
                let input = apply_forward_fee(sandbox, from, *is_strand_head, out)?;
                Ok((input, out, None))
            }
            Step::Book {
                prev,
                next,
                input,
                output,
            } => {
                let plan = book::plan_book(sandbox, prev, next, input, output, request)?;
                Ok((plan.total_in, plan.total_out, Some(plan)))
            }
        }
    }

    /// Forward pass: move the planned value.
    pub fn fwd(
        &self,
        sandbox: &mut PaymentSandbox,
        _strand: &Strand,
        input: IouValue,
        output: IouValue,
        plan: Option<&BookPlan>,
    ) -> Result<(), TransactionResult> {
        match self {
            Step::XrpSrc { account } => {
                let drops = to_drops(output);
                crate::common::adjust_xrp_balance(sandbox, account, -drops)?;
                Ok(())
            }
            Step::XrpDst { account } => {
                let drops = to_drops(output);
                let pre = xrp_balance_value(sandbox, account);
                crate::common::adjust_xrp_balance(sandbox, account, drops)?;
                sandbox.credit_xrp(
                    account,
                    IouValue::from_integer(drops).map_err(|_| TransactionResult::tecINTERNAL)?,
                    pre,
                );
                Ok(())
            }
            Step::Direct {
                from,
                to,
                currency,
                ..
            } => {
                let _ = input;
                move_iou(sandbox, from, to, currency, output)
            }
            Step::Book { .. } => {
                let plan = plan.ok_or(TransactionResult::tecINTERNAL)?;
                book::execute_book(sandbox, plan)
            }
        }
    }
}

/// The current native balance of an account as a value.
fn xrp_balance_value(sandbox: &PaymentSandbox, account: &AccountId) -> IouValue {
    account_root(sandbox, account)
        .and_then(|root| IouValue::from_integer(root.balance.drops()).ok())
        .unwrap_or_else(IouValue::zero)
}

/// How much `from` may move to `to` on their line right now, deferred
/// credits considered.
fn direct_capacity(
    sandbox: &PaymentSandbox,
    from: &AccountId,
    to: &AccountId,
    currency: &Currency,
    is_strand_head: bool,
) -> Result<IouValue, TransactionResult> {
    // a globally frozen issuer cannot forward its obligations
    if !is_strand_head {
        if let Some(root) = account_root(sandbox, from) {
            if root.has_flag(account_flags::LSF_GLOBAL_FREEZE) {
                return Ok(IouValue::zero());
            }
        }
    }
    let Some(line) = trust_line(sandbox, from, to, currency) else {
        return Ok(IouValue::zero());
    };
    let raw_from = line_balance_from(&line, from);
    let spendable_from = sandbox.balance_hook(from, to, currency, raw_from);
    let seen_to = spendable_from.negate();
    let limit_to = line_limit_of(&line, to);
    let capacity = limit_to
        .checked_sub(seen_to)
        .map_err(|_| TransactionResult::tecINTERNAL)?;
    if capacity.is_negative() {
        return Ok(IouValue::zero());
    }
    Ok(capacity)
}

/// The issuer's transfer fee applied to what an intermediate forwards:
/// upstream must put in `out` times the rate.
fn apply_forward_fee(
    sandbox: &PaymentSandbox,
    from: &AccountId,
    is_strand_head: bool,
    out: IouValue,
) -> Result<IouValue, TransactionResult> {
    if is_strand_head {
        return Ok(out);
    }
    let rate = account_root(sandbox, from)
        .and_then(|root| root.transfer_rate)
        .map_or(Rate::parity(), |raw| Rate::new(raw).unwrap_or_default());
    rate.apply(out, Rounding::Up)
        .map_err(|_| TransactionResult::tecINTERNAL)
}

/// Move an issued value across a line and record the deferred credit.
pub(crate) fn move_iou(
    sandbox: &mut PaymentSandbox,
    from: &AccountId,
    to: &AccountId,
    currency: &Currency,
    amount: IouValue,
) -> Result<(), TransactionResult> {
    if amount.is_zero() {
        return Ok(());
    }
    let pre = trust_line(sandbox, from, to, currency)
        .map(|line| line_balance_from(&line, from))
        .unwrap_or_else(IouValue::zero);
    crate::common::move_line_balance(sandbox, from, to, currency, amount)?;
    sandbox.credit(from, to, currency, amount, pre);
    Ok(())
}
