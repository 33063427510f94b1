//! TrustSet: create, modify and delete trust lines.

use crate::common::{
    account_root, covers_reserve, line_balance_from, write_account_root, ApplyContext,
};
use xrpl_ledger::dir::{owner_dir_insert, owner_dir_remove_search};
use xrpl_ledger::{ReadView, WriteView};
use xrpl_models::account::AccountId;
use xrpl_models::amount::{Amount, IouAmount, IouValue};
use xrpl_models::entry::{account_flags, line_flags, LedgerEntry, RippleState};
use xrpl_models::keylet::Keylet;
use xrpl_models::result::TransactionResult;
use xrpl_models::transaction::{tx_flags, Transaction, TrustSet};

pub fn preflight(tx: &Transaction, trust_set: &TrustSet) -> TransactionResult {
    if tx.common.flags & !tx_flags::TF_TRUST_SET_MASK != 0 {
        return TransactionResult::temINVALID_FLAG;
    }
    let flags = tx.common.flags;
    if flags & tx_flags::TF_SET_NO_RIPPLE != 0 && flags & tx_flags::TF_CLEAR_NO_RIPPLE != 0 {
        return TransactionResult::temINVALID_FLAG;
    }
    if flags & tx_flags::TF_SET_FREEZE != 0 && flags & tx_flags::TF_CLEAR_FREEZE != 0 {
        return TransactionResult::temINVALID_FLAG;
    }
    let Amount::Iou(limit) = &trust_set.limit_amount else {
        // the native currency cannot be trusted
        return TransactionResult::temBAD_LIMIT;
    };
    if limit.value.is_negative() {
        return TransactionResult::temBAD_LIMIT;
    }
    if limit.issuer == tx.common.account {
        return TransactionResult::temDST_IS_SRC;
    }
    if limit.issuer.is_zero() {
        return TransactionResult::temDST_NEEDED;
    }
    TransactionResult::tesSUCCESS
}

pub fn preclaim(view: &dyn ReadView, tx: &Transaction, trust_set: &TrustSet) -> TransactionResult {
    let Amount::Iou(limit) = &trust_set.limit_amount else {
        return TransactionResult::temBAD_LIMIT;
    };
    let Some(account) = account_root(view, &tx.common.account) else {
        return TransactionResult::terNO_ACCOUNT;
    };
    let Some(issuer_root) = account_root(view, &limit.issuer) else {
        return TransactionResult::tecNO_ISSUER;
    };
    let line_exists = view.exists(&Keylet::line(&tx.common.account, &limit.issuer, &limit.currency).key);
    if !line_exists && issuer_root.has_flag(account_flags::LSF_DISALLOW_INCOMING_TRUSTLINE) {
        return TransactionResult::tecNO_PERMISSION;
    }
    if tx.common.flags & tx_flags::TF_SET_F_AUTH != 0
        && !account.has_flag(account_flags::LSF_REQUIRE_AUTH)
    {
        return TransactionResult::tefNO_AUTH_REQUIRED;
    }
    TransactionResult::tesSUCCESS
}

/// Whether `side` still needs the line at all: a non-default limit or a
/// positive claim keeps its half alive.
fn side_in_use(line: &RippleState, side: &AccountId) -> bool {
    let limit = if *side == line.low_account() {
        line.low_limit.value
    } else {
        line.high_limit.value
    };
    !limit.is_zero() || line_balance_from(line, side) > IouValue::zero()
}

fn side_reserve_flag(line: &RippleState, side: &AccountId) -> u32 {
    if *side == line.low_account() {
        line_flags::LSF_LOW_RESERVE
    } else {
        line_flags::LSF_HIGH_RESERVE
    }
}

pub fn do_apply(context: &mut ApplyContext, trust_set: &TrustSet) -> TransactionResult {
    let Amount::Iou(limit) = &trust_set.limit_amount else {
        return TransactionResult::tecINTERNAL;
    };
    let account = context.account();
    let issuer = limit.issuer;
    let currency = limit.currency;
    let keylet = Keylet::line(&account, &issuer, &currency);
    let flags = context.tx.common.flags;

    match context.view.get(&keylet.key) {
        Some(LedgerEntry::RippleState(mut line)) => {
            // update the acting side
            let account_is_low = account == line.low_account();
            if account_is_low {
                line.low_limit =
                    IouAmount::new(limit.value, currency, line.low_limit.issuer);
                if let Some(quality_in) = trust_set.quality_in {
                    line.low_quality_in = quality_in;
                }
                if let Some(quality_out) = trust_set.quality_out {
                    line.low_quality_out = quality_out;
                }
            } else {
                line.high_limit =
                    IouAmount::new(limit.value, currency, line.high_limit.issuer);
                if let Some(quality_in) = trust_set.quality_in {
                    line.high_quality_in = quality_in;
                }
                if let Some(quality_out) = trust_set.quality_out {
                    line.high_quality_out = quality_out;
                }
            }

            let (no_ripple, freeze, auth) = if account_is_low {
                (
                    line_flags::LSF_LOW_NO_RIPPLE,
                    line_flags::LSF_LOW_FREEZE,
                    line_flags::LSF_LOW_AUTH,
                )
            } else {
                (
                    line_flags::LSF_HIGH_NO_RIPPLE,
                    line_flags::LSF_HIGH_FREEZE,
                    line_flags::LSF_HIGH_AUTH,
                )
            };
            if flags & tx_flags::TF_SET_NO_RIPPLE != 0 {
                line.flags |= no_ripple;
            }
            if flags & tx_flags::TF_CLEAR_NO_RIPPLE != 0 {
                line.flags &= !no_ripple;
            }
            if flags & tx_flags::TF_SET_FREEZE != 0 {
                let Some(root) = account_root(context.view, &account) else {
                    return TransactionResult::tecINTERNAL;
                };
                if root.has_flag(account_flags::LSF_NO_FREEZE) {
                    return TransactionResult::tecNO_PERMISSION;
                }
                line.flags |= freeze;
            }
            if flags & tx_flags::TF_CLEAR_FREEZE != 0 {
                line.flags &= !freeze;
            }
            if flags & tx_flags::TF_SET_F_AUTH != 0 {
                line.flags |= auth;
            }

            // reserve bookkeeping for the acting side
            let reserve_flag = side_reserve_flag(&line, &account);
            let holds_reserve = line.flags & reserve_flag != 0;
            let needs_reserve = side_in_use(&line, &account);
            if needs_reserve && !holds_reserve {
                let Some(mut root) = account_root(context.view, &account) else {
                    return TransactionResult::tecINTERNAL;
                };
                if !covers_reserve(context.view, &root, root.owner_count + 1) {
                    return TransactionResult::tecNO_LINE_INSUF_RESERVE;
                }
                root.owner_count += 1;
                write_account_root(context.view, root);
                line.flags |= reserve_flag;
            } else if !needs_reserve && holds_reserve {
                let Some(mut root) = account_root(context.view, &account) else {
                    return TransactionResult::tecINTERNAL;
                };
                root.owner_count = root.owner_count.saturating_sub(1);
                write_account_root(context.view, root);
                line.flags &= !reserve_flag;
            }

            // a line nobody uses disappears
            let auth_flags = line_flags::LSF_LOW_AUTH | line_flags::LSF_HIGH_AUTH;
            let freeze_flags = line_flags::LSF_LOW_FREEZE | line_flags::LSF_HIGH_FREEZE;
            if line.balance.value.is_zero()
                && line.low_limit.value.is_zero()
                && line.high_limit.value.is_zero()
                && line.flags & (auth_flags | freeze_flags) == 0
            {
                let low = line.low_account();
                let high = line.high_account();
                for (side, flag) in [
                    (low, line_flags::LSF_LOW_RESERVE),
                    (high, line_flags::LSF_HIGH_RESERVE),
                ] {
                    if line.flags & flag != 0 {
                        if owner_dir_remove_search(context.view, &side, &keylet.key).is_err() {
                            return TransactionResult::tecINTERNAL;
                        }
                        let Some(mut root) = account_root(context.view, &side) else {
                            return TransactionResult::tecINTERNAL;
                        };
                        root.owner_count = root.owner_count.saturating_sub(1);
                        write_account_root(context.view, root);
                    }
                }
                context.view.erase(&keylet.key);
                return TransactionResult::tesSUCCESS;
            }

            context
                .view
                .update(keylet.key, LedgerEntry::RippleState(line));
            TransactionResult::tesSUCCESS
        }
        _ => {
            // no line yet
            if limit.value.is_zero()
                && flags
                    & (tx_flags::TF_SET_NO_RIPPLE
                        | tx_flags::TF_SET_FREEZE
                        | tx_flags::TF_SET_F_AUTH)
                    == 0
            {
                return TransactionResult::tecNO_LINE_REDUNDANT;
            }

            let Some(mut root) = account_root(context.view, &account) else {
                return TransactionResult::tecINTERNAL;
            };
            if !covers_reserve(context.view, &root, root.owner_count + 1) {
                return TransactionResult::tecNO_LINE_INSUF_RESERVE;
            }

            let (low, high) = if account < issuer {
                (account, issuer)
            } else {
                (issuer, account)
            };
            let account_is_low = account == low;

            let mut line_flags_value = side_reserve_flag_for(account_is_low);
            if flags & tx_flags::TF_SET_NO_RIPPLE != 0 {
                line_flags_value |= if account_is_low {
                    line_flags::LSF_LOW_NO_RIPPLE
                } else {
                    line_flags::LSF_HIGH_NO_RIPPLE
                };
            }
            if flags & tx_flags::TF_SET_FREEZE != 0 {
                if root.has_flag(account_flags::LSF_NO_FREEZE) {
                    return TransactionResult::tecNO_PERMISSION;
                }
                line_flags_value |= if account_is_low {
                    line_flags::LSF_LOW_FREEZE
                } else {
                    line_flags::LSF_HIGH_FREEZE
                };
            }
            if flags & tx_flags::TF_SET_F_AUTH != 0 {
                line_flags_value |= if account_is_low {
                    line_flags::LSF_LOW_AUTH
                } else {
                    line_flags::LSF_HIGH_AUTH
                };
            }
            // the counterparty side defaults to NoRipple unless it opted
            // into rippling by default
            if let Some(peer_root) = account_root(context.view, &issuer) {
                if !peer_root.has_flag(account_flags::LSF_DEFAULT_RIPPLE) {
                    line_flags_value |= if account_is_low {
                        line_flags::LSF_HIGH_NO_RIPPLE
                    } else {
                        line_flags::LSF_LOW_NO_RIPPLE
                    };
                }
            }

            let (low_limit_value, high_limit_value) = if account_is_low {
                (limit.value, IouValue::zero())
            } else {
                (IouValue::zero(), limit.value)
            };
            let mut line = RippleState {
                balance: IouAmount::new(IouValue::zero(), currency, AccountId::zero()),
                low_limit: IouAmount::new(low_limit_value, currency, low),
                high_limit: IouAmount::new(high_limit_value, currency, high),
                flags: line_flags_value,
                low_quality_in: 0,
                low_quality_out: 0,
                high_quality_in: 0,
                high_quality_out: 0,
            };
            if let Some(quality_in) = trust_set.quality_in {
                if account_is_low {
                    line.low_quality_in = quality_in;
                } else {
                    line.high_quality_in = quality_in;
                }
            }
            if let Some(quality_out) = trust_set.quality_out {
                if account_is_low {
                    line.low_quality_out = quality_out;
                } else {
                    line.high_quality_out = quality_out;
                }
            }

            if owner_dir_insert(context.view, &account, keylet.key).is_err() {
                return TransactionResult::tecDIR_FULL;
            }
            context
                .view
                .insert(keylet.key, LedgerEntry::RippleState(line));
            root.owner_count += 1;
            write_account_root(context.view, root);
            TransactionResult::tesSUCCESS
        }
    }
}

fn side_reserve_flag_for(is_low: bool) -> u32 {
    if is_low {
        line_flags::LSF_LOW_RESERVE
    } else {
        line_flags::LSF_HIGH_RESERVE
    }
}
