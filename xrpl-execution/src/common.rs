//! Helpers shared by every handler: account access, reserve math,
//! trust-line balance movement and expiration checks.

use xrpl_hash::Hash;
use xrpl_ledger::{ReadView, WriteView};
use xrpl_models::account::AccountId;
use xrpl_models::amount::{IouAmount, IouValue, XrpAmount};
use xrpl_models::currency::Currency;
use xrpl_models::entry::{line_flags, AccountRoot, LedgerEntry, RippleState};
use xrpl_models::keylet::Keylet;
use xrpl_models::result::TransactionResult;
use xrpl_models::transaction::Transaction;

/// Everything a handler needs while applying: the transaction, its hash
/// and the sandboxed view.
pub struct ApplyContext<'a> {
    /// The transaction being applied.
    pub tx: &'a Transaction,
    /// Its id.
    pub tx_hash: Hash,
    /// The sandboxed view all writes go to.
    pub view: &'a mut dyn WriteView,
    /// What a payment actually delivered, reported back for metadata.
    pub delivered: Option<xrpl_models::Amount>,
}

impl ApplyContext<'_> {
    /// The sending account.
    pub fn account(&self) -> AccountId {
        self.tx.common.account
    }

    /// The close time of the parent ledger, the "now" of every time check.
    pub fn parent_close_time(&self) -> u32 {
        self.view.header().parent_close_time
    }
}

/// Read an account root.
pub fn account_root(view: &dyn ReadView, account: &AccountId) -> Option<AccountRoot> {
    match view.get(&Keylet::account(account).key) {
        Some(LedgerEntry::AccountRoot(root)) => Some(root),
        _ => None,
    }
}

/// Write an account root back.
pub fn write_account_root(view: &mut dyn WriteView, root: AccountRoot) {
    let key = Keylet::account(&root.account).key;
    view.update(key, LedgerEntry::AccountRoot(root));
}

/// The XRP an account can spend above its reserve.
pub fn spendable_xrp(view: &dyn ReadView, root: &AccountRoot) -> i64 {
    let reserve = view.header().reserve(root.owner_count).drops();
    (root.balance.drops() - reserve).max(0)
}

/// Whether `root` could afford `owner_count` owned entries.
pub fn covers_reserve(view: &dyn ReadView, root: &AccountRoot, owner_count: u32) -> bool {
    root.balance.drops() >= view.header().reserve(owner_count).drops()
}

/// Add a reserve-counting entry under `owner`: bumps the owner count after
/// checking the reserve, inserts the entry and indexes it in the owner
/// directory. Returns the directory page.
pub fn add_owned_entry(
    view: &mut dyn WriteView,
    owner: &AccountId,
    key: Hash,
    entry: LedgerEntry,
    reserve_units: u32,
) -> Result<u64, TransactionResult> {
    let Some(mut root) = account_root(view, owner) else {
        return Err(TransactionResult::tefINTERNAL);
    };
    let new_count = root.owner_count.saturating_add(reserve_units);
    if !covers_reserve(view, &root, new_count) {
        return Err(TransactionResult::tecINSUFFICIENT_RESERVE);
    }
    let page = xrpl_ledger::dir::owner_dir_insert(view, owner, key)
        .map_err(|_| TransactionResult::tecDIR_FULL)?;
    view.insert(key, entry);
    root.owner_count = new_count;
    write_account_root(view, root);
    Ok(page)
}

/// Remove an owned entry: erases it, unindexes it and releases its reserve
/// units.
pub fn remove_owned_entry(
    view: &mut dyn WriteView,
    owner: &AccountId,
    key: &Hash,
    page_hint: u64,
    reserve_units: u32,
) -> Result<(), TransactionResult> {
    xrpl_ledger::dir::owner_dir_remove(view, owner, page_hint, key)
        .map_err(|_| TransactionResult::tecINTERNAL)?;
    view.erase(key);
    let Some(mut root) = account_root(view, owner) else {
        return Err(TransactionResult::tefINTERNAL);
    };
    root.owner_count = root.owner_count.saturating_sub(reserve_units);
    write_account_root(view, root);
    Ok(())
}

/// True when `expiration` has passed relative to the parent close time.
pub fn has_expired(view: &dyn ReadView, expiration: Option<u32>) -> bool {
    match expiration {
        Some(expiration) => expiration <= view.header().parent_close_time,
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Trust lines
// ---------------------------------------------------------------------------

/// Read the trust line between two accounts, if it exists.
pub fn trust_line(
    view: &dyn ReadView,
    a: &AccountId,
    b: &AccountId,
    currency: &Currency,
) -> Option<RippleState> {
    match view.get(&Keylet::line(a, b, currency).key) {
        Some(LedgerEntry::RippleState(line)) => Some(line),
        _ => None,
    }
}

/// The pair balance from `perspective`'s point of view: positive means the
/// counterparty owes `perspective`.
pub fn line_balance_from(line: &RippleState, perspective: &AccountId) -> IouValue {
    if *perspective == line.low_account() {
        line.balance.value
    } else {
        line.balance.value.negate()
    }
}

/// The limit `perspective` has extended on the line.
pub fn line_limit_of(line: &RippleState, perspective: &AccountId) -> IouValue {
    if *perspective == line.low_account() {
        line.low_limit.value
    } else {
        line.high_limit.value
    }
}

/// Whether `side` froze the line.
pub fn line_frozen_by(line: &RippleState, side: &AccountId) -> bool {
    if *side == line.low_account() {
        line.has_flag(line_flags::LSF_LOW_FREEZE)
    } else {
        line.has_flag(line_flags::LSF_HIGH_FREEZE)
    }
}

/// Whether `side` set NoRipple on the line.
pub fn line_no_ripple_by(line: &RippleState, side: &AccountId) -> bool {
    if *side == line.low_account() {
        line.has_flag(line_flags::LSF_LOW_NO_RIPPLE)
    } else {
        line.has_flag(line_flags::LSF_HIGH_NO_RIPPLE)
    }
}

/// Whether `side` authorized the line.
pub fn line_authorized_by(line: &RippleState, side: &AccountId) -> bool {
    if *side == line.low_account() {
        line.has_flag(line_flags::LSF_LOW_AUTH)
    } else {
        line.has_flag(line_flags::LSF_HIGH_AUTH)
    }
}

/// Move `amount` (positive) of `currency` from `from` to `to` across their
/// mutual line: `from`'s claim on the pair shrinks, `to`'s grows. The line
/// must exist. The new pair balance is written back; the caller has done
/// limit and freeze checks.
pub fn move_line_balance(
    view: &mut dyn WriteView,
    from: &AccountId,
    to: &AccountId,
    currency: &Currency,
    amount: IouValue,
) -> Result<(), TransactionResult> {
    let key = Keylet::line(from, to, currency).key;
    let Some(LedgerEntry::RippleState(mut line)) = view.get(&key) else {
        return Err(TransactionResult::terNO_LINE);
    };
    // the stored balance is from the low perspective; sending from the low
    // account decreases it
    let delta = if *from == line.low_account() {
        amount.negate()
    } else {
        amount
    };
    let new_balance = line
        .balance
        .value
        .checked_add(delta)
        .map_err(|_| TransactionResult::tecINTERNAL)?;
    line.balance = IouAmount::new(new_balance, *currency, AccountId::zero());
    view.update(key, LedgerEntry::RippleState(line));
    Ok(())
}

/// Credit `delta` drops (may be negative) to an account's XRP balance.
pub fn adjust_xrp_balance(
    view: &mut dyn WriteView,
    account: &AccountId,
    delta: i64,
) -> Result<(), TransactionResult> {
    let Some(mut root) = account_root(view, account) else {
        return Err(TransactionResult::tecINTERNAL);
    };
    let new_balance = root.balance.drops() + delta;
    if new_balance < 0 {
        return Err(TransactionResult::tecUNFUNDED_PAYMENT);
    }
    root.balance =
        XrpAmount::from_drops(new_balance).map_err(|_| TransactionResult::tecINTERNAL)?;
    write_account_root(view, root);
    Ok(())
}
