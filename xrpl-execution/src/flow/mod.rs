//! The payment engine: strands of steps executed in quality order inside
//! payment sandboxes.
//!
//! A strand is a linear sequence of steps, each transforming one issue
//! into the next: direct steps move trust-line balances between
//! neighboring accounts, book steps cross an offer book, endpoint steps
//! move native funds at the strand edges. Execution runs a reverse pass to
//! plan amounts against current liquidity, then a forward pass that
//! mutates a payment sandbox; deferred credits keep later strands from
//! spending what earlier strands created.

pub mod book;
pub mod step;
pub mod strand;

pub use strand::{build_strands, Strand, StrandError};

use crate::common::spendable_xrp;
use book::BookPlan;
use tracing::debug;
use xrpl_ledger::payment_sandbox::DeferredCredits;
use xrpl_ledger::{PaymentSandbox, WriteView};
use xrpl_models::amount::{IouValue, Rounding};
use xrpl_models::result::TransactionResult;

/// What one strand planned during its reverse pass.
struct StrandPlan {
    /// Per-step planned (input, output) values.
    amounts: Vec<(IouValue, IouValue)>,
    /// Book plans keyed by step position.
    books: Vec<Option<BookPlan>>,
    /// Value entering the strand.
    input: IouValue,
    /// Value leaving the strand.
    output: IouValue,
}

/// The outcome of executing a set of strands.
pub struct FlowOutcome {
    /// Value delivered at the destination, in the deliver issue.
    pub delivered: IouValue,
    /// Value spent at the source, in the source issue.
    pub spent: IouValue,
    /// The terminal result of the flow.
    pub result: TransactionResult,
}

/// Execute `strands` until `deliver_request` is produced or liquidity runs
/// out. `send_max_value` caps the total source spend when present;
/// `limit_quality` caps the worst strand quality consumed.
pub fn execute_flow(
    view: &mut dyn WriteView,
    strands: &[Strand],
    deliver_request: IouValue,
    send_max_value: Option<IouValue>,
    partial_payment: bool,
    limit_quality: Option<IouValue>,
    deliver_min: Option<IouValue>,
) -> FlowOutcome {
    let mut delivered = IouValue::zero();
    let mut spent = IouValue::zero();
    let mut credits = DeferredCredits::default();
    let mut active: Vec<bool> = vec![true; strands.len()];

    loop {
        let Ok(remaining) = deliver_request.checked_sub(delivered) else {
            break;
        };
        if remaining.is_zero() || remaining.is_negative() {
            break;
        }
        let send_remaining = match send_max_value {
            Some(cap) => match cap.checked_sub(spent) {
                Ok(left) if !left.is_negative() && !left.is_zero() => Some(left),
                _ => break,
            },
            None => None,
        };

        // plan every live strand against the current state and pick the
        // best quality
        let mut best: Option<(usize, StrandPlan)> = None;
        for (index, strand) in strands.iter().enumerate() {
            if !active[index] {
                continue;
            }
            let mut sandbox = PaymentSandbox::with_credits(view, credits.clone());
            let plan = plan_strand(&sandbox, strand, remaining, send_remaining);
            sandbox.discard();
            let Some(plan) = plan else {
                active[index] = false;
                continue;
            };
            if plan.output.is_zero() {
                active[index] = false;
                continue;
            }
            let quality = match plan.input.checked_div(plan.output, Rounding::Nearest) {
                Ok(quality) => quality,
                Err(_) => continue,
            };
            if let Some(limit) = &limit_quality {
                if quality > *limit {
                    active[index] = false;
                    continue;
                }
            }
            let replace = match &best {
                None => true,
                Some((_, current_best)) => {
                    let best_quality = current_best
                        .input
                        .checked_div(current_best.output, Rounding::Nearest)
                        .unwrap_or(quality);
                    quality < best_quality
                }
            };
            if replace {
                best = Some((index, plan));
            }
        }

        let Some((index, plan)) = best else {
            break;
        };

        // execute the chosen strand; a forward pass can only fail on an
        // internal inconsistency, in which case the strand is dropped
        let mut sandbox = PaymentSandbox::with_credits(view, credits.clone());
        match execute_plan(&mut sandbox, &strands[index], &plan) {
            Ok(()) => {
                credits = sandbox.apply();
                delivered = delivered.checked_add(plan.output).unwrap_or(delivered);
                spent = spent.checked_add(plan.input).unwrap_or(spent);
            }
            Err(result) => {
                debug!(%result, strand = index, "strand forward pass failed; dropping strand");
                sandbox.discard();
                active[index] = false;
            }
        }
    }

    let result = if delivered >= deliver_request {
        TransactionResult::tesSUCCESS
    } else if partial_payment {
        let floor = deliver_min.unwrap_or(IouValue::zero());
        if delivered > IouValue::zero() && delivered >= floor {
            TransactionResult::tesSUCCESS
        } else {
            TransactionResult::tecPATH_PARTIAL
        }
    } else if delivered.is_zero() {
        TransactionResult::tecPATH_DRY
    } else {
        TransactionResult::tecPATH_PARTIAL
    };

    FlowOutcome {
        delivered,
        spent,
        result,
    }
}

/// One reverse sweep over the steps. Returns the planned per-step amounts
/// and, when some step delivered less than asked, the position where the
/// request was cut.
fn rev_sweep(
    sandbox: &PaymentSandbox,
    strand: &Strand,
    out_request: IouValue,
) -> Option<(
    Vec<(IouValue, IouValue)>,
    Vec<Option<BookPlan>>,
    Option<(usize, IouValue, IouValue)>,
)> {
    let steps = &strand.steps;
    let mut amounts = vec![(IouValue::zero(), IouValue::zero()); steps.len()];
    let mut books: Vec<Option<BookPlan>> = steps.iter().map(|_| None).collect();
    let mut limited: Option<(usize, IouValue, IouValue)> = None;

    let mut request = out_request;
    for (position, step_) in steps.iter().enumerate().rev() {
        let (input, output, book_plan) = step_.rev(sandbox, strand, request).ok()?;
        if output.is_zero() {
            return None;
        }
        if output < request {
            // keep the cap closest to the head; it binds the whole strand
            limited = Some((position, output, request));
        }
        amounts[position] = (input, output);
        books[position] = book_plan;
        request = input;
    }
    Some((amounts, books, limited))
}

/// Reverse planning with convergence: when a step caps the flow, shrink
/// the delivery request proportionally and sweep again until every step
/// agrees. The plan is only executed once no step is over-asked, so the
/// forward pass cannot come up short.
fn plan_strand(
    sandbox: &PaymentSandbox,
    strand: &Strand,
    out_request: IouValue,
    send_cap: Option<IouValue>,
) -> Option<StrandPlan> {
    const MAX_SWEEPS: usize = 8;

    let mut request = out_request;
    for _ in 0..MAX_SWEEPS {
        let (amounts, books, limited) = rev_sweep(sandbox, strand, request)?;
        let input = amounts.first().map(|(input, _)| *input)?;
        let output = amounts.last().map(|(_, output)| *output)?;

        // a middle-step cap means the tail was planned too large; scale
        // the delivery request by the observed shortfall and retry
        if let Some((position, produced, asked)) = limited {
            if position + 1 < strand.steps.len() {
                let ratio = produced.checked_div(asked, Rounding::Down).ok()?;
                let scaled = request.checked_mul(ratio, Rounding::Down).ok()?;
                if scaled.is_zero() || scaled >= request {
                    return None;
                }
                request = scaled;
                continue;
            }
        }

        if let Some(cap) = send_cap {
            if input > cap {
                let ratio = cap.checked_div(input, Rounding::Down).ok()?;
                let scaled = request.checked_mul(ratio, Rounding::Down).ok()?;
                if scaled.is_zero() || scaled >= request {
                    return None;
                }
                request = scaled;
                continue;
            }
        }

        return Some(StrandPlan {
            amounts,
            books,
            input,
            output,
        });
    }
    None
}

/// Forward pass: apply the planned amounts step by step.
fn execute_plan(
    sandbox: &mut PaymentSandbox,
    strand: &Strand,
    plan: &StrandPlan,
) -> Result<(), TransactionResult> {
    for (position, step_) in strand.steps.iter().enumerate() {
        let (input, output) = plan.amounts[position];
        step_.fwd(sandbox, strand, input, output, plan.books[position].as_ref())?;
    }
    Ok(())
}

/// The spendable native balance of an account as a plain value.
pub(crate) fn xrp_spendable_value(
    sandbox: &PaymentSandbox,
    account: &xrpl_models::AccountId,
) -> IouValue {
    let Some(root) = crate::common::account_root(sandbox, account) else {
        return IouValue::zero();
    };
    IouValue::from_integer(spendable_xrp(sandbox, &root)).unwrap_or_else(|_| IouValue::zero())
}
