//! The per-strand view: a sandbox plus deferred credits.
//!
//! Credits granted to an account while a payment executes must not be
//! spendable later in the same transaction, or one strand could consume
//! liquidity another strand created. The deferred-credit table records, per
//! (account pair, currency), how much each side was credited since the
//! transaction started and the balance seen before the first credit;
//! every balance read subtracts the debits and clamps to the lowest
//! balance the pair has gone through.

use crate::sandbox::Sandbox;
use crate::view::{ReadView, WriteView};
use crate::LedgerHeader;
use std::collections::BTreeMap;
use xrpl_hash::Hash;
use xrpl_models::account::AccountId;
use xrpl_models::amount::IouValue;
use xrpl_models::currency::Currency;
use xrpl_models::entry::LedgerEntry;

#[derive(Clone, Debug)]
struct DeferredValue {
    low_credits: IouValue,
    high_credits: IouValue,
    /// Balance from the low perspective before the first credit.
    low_orig_balance: IouValue,
}

/// Credits accumulated during one transaction, keyed by the sorted account
/// pair and currency.
#[derive(Clone, Debug, Default)]
pub struct DeferredCredits {
    credits: BTreeMap<(AccountId, AccountId, Currency), DeferredValue>,
    owner_counts: BTreeMap<AccountId, u32>,
}

impl DeferredCredits {
    fn key(a: &AccountId, b: &AccountId, currency: &Currency) -> (AccountId, AccountId, Currency) {
        if a < b {
            (*a, *b, *currency)
        } else {
            (*b, *a, *currency)
        }
    }

    /// Record that `sender` credited `receiver` with `amount` of
    /// `currency`. `pre_credit_sender_balance` is the pair balance from
    /// the sender's perspective before this credit.
    pub fn credit(
        &mut self,
        sender: &AccountId,
        receiver: &AccountId,
        currency: &Currency,
        amount: IouValue,
        pre_credit_sender_balance: IouValue,
    ) {
        if sender == receiver || amount.is_negative() {
            return;
        }
        let key = Self::key(sender, receiver, currency);
        let sender_is_low = sender < receiver;
        match self.credits.get_mut(&key) {
            None => {
                let mut value = DeferredValue {
                    low_credits: IouValue::zero(),
                    high_credits: IouValue::zero(),
                    low_orig_balance: IouValue::zero(),
                };
                if sender_is_low {
                    value.high_credits = amount;
                    value.low_orig_balance = pre_credit_sender_balance;
                } else {
                    value.low_credits = amount;
                    value.low_orig_balance = pre_credit_sender_balance.negate();
                }
                self.credits.insert(key, value);
            }
            Some(value) => {
                // the original balance is only recorded the first time
                if sender_is_low {
                    value.high_credits = value
                        .high_credits
                        .checked_add(amount)
                        .unwrap_or(value.high_credits);
                } else {
                    value.low_credits = value
                        .low_credits
                        .checked_add(amount)
                        .unwrap_or(value.low_credits);
                }
            }
        }
    }

    /// The adjustment for a balance read of `main` against `other`:
    /// (debits against main, original balance from main's perspective).
    fn adjustment(
        &self,
        main: &AccountId,
        other: &AccountId,
        currency: &Currency,
    ) -> Option<(IouValue, IouValue)> {
        let key = Self::key(main, other, currency);
        let value = self.credits.get(&key)?;
        if main < other {
            Some((value.high_credits, value.low_orig_balance))
        } else {
            Some((value.low_credits, value.low_orig_balance.negate()))
        }
    }

    /// Record the highest owner count seen for `account`.
    pub fn note_owner_count(&mut self, account: &AccountId, count: u32) {
        let slot = self.owner_counts.entry(*account).or_insert(count);
        if count > *slot {
            *slot = count;
        }
    }

    /// The highest owner count recorded for `account`, if any.
    pub fn max_owner_count(&self, account: &AccountId) -> Option<u32> {
        self.owner_counts.get(account).copied()
    }
}

/// A sandbox carrying a deferred-credit table; the view one strand of a
/// payment executes in.
pub struct PaymentSandbox<'a> {
    sandbox: Sandbox<'a>,
    credits: DeferredCredits,
}

impl<'a> PaymentSandbox<'a> {
    /// Open a payment sandbox with no prior credits.
    pub fn new(parent: &'a mut dyn WriteView) -> Self {
        PaymentSandbox {
            sandbox: Sandbox::new(parent),
            credits: DeferredCredits::default(),
        }
    }

    /// Open a payment sandbox inheriting the credits accumulated so far
    /// (a strand trial over the transaction-level sandbox).
    pub fn with_credits(parent: &'a mut dyn WriteView, credits: DeferredCredits) -> Self {
        PaymentSandbox {
            sandbox: Sandbox::new(parent),
            credits,
        }
    }

    /// Record a credit between two accounts.
    pub fn credit(
        &mut self,
        sender: &AccountId,
        receiver: &AccountId,
        currency: &Currency,
        amount: IouValue,
        pre_credit_sender_balance: IouValue,
    ) {
        self.credits
            .credit(sender, receiver, currency, amount, pre_credit_sender_balance);
    }

    /// Adjust a raw pair balance for deferred credits: the spendable view
    /// of `balance` as seen by `account` against `other`.
    pub fn balance_hook(
        &self,
        account: &AccountId,
        other: &AccountId,
        currency: &Currency,
        balance: IouValue,
    ) -> IouValue {
        match self.credits.adjustment(account, other, currency) {
            None => balance,
            Some((debits, orig_balance)) => {
                let adjusted = orig_balance.checked_sub(debits).unwrap_or(balance);
                let mut result = balance;
                if adjusted < result {
                    result = adjusted;
                }
                if orig_balance < result {
                    result = orig_balance;
                }
                result
            }
        }
    }

    /// Record a native credit to `receiver`. Native credits are keyed
    /// against the sentinel account so the spendability read has a stable
    /// pair.
    pub fn credit_xrp(&mut self, receiver: &AccountId, drops: IouValue, pre_balance: IouValue) {
        self.credits.credit(
            &AccountId::zero(),
            receiver,
            &Currency::xrp(),
            drops,
            pre_balance.negate(),
        );
    }

    /// Adjust a native balance for deferred credits.
    pub fn xrp_balance_hook(&self, account: &AccountId, balance: IouValue) -> IouValue {
        let adjusted = self.balance_hook(account, &AccountId::zero(), &Currency::xrp(), balance);
        if adjusted.is_negative() {
            IouValue::zero()
        } else {
            adjusted
        }
    }

    /// The highest owner count seen for `account` during this payment.
    pub fn owner_count_hook(&self, account: &AccountId, count: u32) -> u32 {
        self.credits
            .max_owner_count(account)
            .map_or(count, |seen| seen.max(count))
    }

    /// Record an owner count change.
    pub fn note_owner_count(&mut self, account: &AccountId, count: u32) {
        self.credits.note_owner_count(account, count);
    }

    /// Apply the buffered state changes to the parent and hand back the
    /// accumulated credit table so the caller can carry it into the next
    /// strand.
    pub fn apply(self) -> DeferredCredits {
        self.sandbox.apply();
        self.credits
    }

    /// Drop the buffered state changes and the credits accumulated here.
    pub fn discard(self) {
        self.sandbox.discard();
    }
}

impl ReadView for PaymentSandbox<'_> {
    fn get(&self, key: &Hash) -> Option<LedgerEntry> {
        self.sandbox.get(key)
    }

    fn exists(&self, key: &Hash) -> bool {
        self.sandbox.exists(key)
    }

    fn successor(&self, key: &Hash, last: &Hash) -> Option<Hash> {
        self.sandbox.successor(key, last)
    }

    fn header(&self) -> &LedgerHeader {
        self.sandbox.header()
    }
}

impl WriteView for PaymentSandbox<'_> {
    fn insert(&mut self, key: Hash, entry: LedgerEntry) {
        self.sandbox.insert(key, entry);
    }

    fn update(&mut self, key: Hash, entry: LedgerEntry) {
        self.sandbox.update(key, entry);
    }

    fn erase(&mut self, key: &Hash) {
        self.sandbox.erase(key);
    }

    fn adjust_drops_destroyed(&mut self, drops: i64) {
        self.sandbox.adjust_drops_destroyed(drops);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use std::str::FromStr;
    use xrpl_models::features::FeatureSet;

    fn account(byte: u8) -> AccountId {
        AccountId::from_bytes([byte; 20])
    }

    fn value(s: &str) -> IouValue {
        IouValue::from_str(s).unwrap()
    }

    #[test]
    fn test_credit_not_spendable() {
        let mut ledger = Ledger::genesis(FeatureSet::all());
        let mut sandbox = PaymentSandbox::new(&mut ledger);
        let usd = Currency::from_standard_code("USD").unwrap();
        let x = account(1);
        let y = account(2);

        // y's balance against x was 0; a strand credits y with 50
        sandbox.credit(&x, &y, &usd, value("50"), value("0"));

        // y now reads a raw balance of 50 but may not spend it
        let spendable = sandbox.balance_hook(&y, &x, &usd, value("50"));
        assert!(spendable.is_zero());

        // x sees its own debit reflected
        let x_balance = sandbox.balance_hook(&x, &y, &usd, value("-50"));
        assert_eq!(x_balance, value("-50"));
    }

    #[test]
    fn test_credits_accumulate() {
        let mut ledger = Ledger::genesis(FeatureSet::all());
        let mut sandbox = PaymentSandbox::new(&mut ledger);
        let usd = Currency::from_standard_code("USD").unwrap();
        let x = account(1);
        let y = account(2);

        sandbox.credit(&x, &y, &usd, value("10"), value("0"));
        sandbox.credit(&x, &y, &usd, value("15"), value("-10"));

        let spendable = sandbox.balance_hook(&y, &x, &usd, value("25"));
        assert!(spendable.is_zero());
    }

    #[test]
    fn test_credits_survive_apply() {
        let mut ledger = Ledger::genesis(FeatureSet::all());
        let usd = Currency::from_standard_code("USD").unwrap();
        let x = account(1);
        let y = account(2);

        let mut outer = PaymentSandbox::new(&mut ledger);
        outer.credit(&x, &y, &usd, value("50"), value("0"));
        let carried = outer.apply();

        let mut next = PaymentSandbox::with_credits(&mut ledger, carried);
        let spendable = next.balance_hook(&y, &x, &usd, value("50"));
        assert!(spendable.is_zero());
        next.note_owner_count(&account(3), 4);
        assert_eq!(next.owner_count_hook(&account(3), 2), 4);
    }

    #[test]
    fn test_unrelated_pair_unaffected() {
        let mut ledger = Ledger::genesis(FeatureSet::all());
        let mut sandbox = PaymentSandbox::new(&mut ledger);
        let usd = Currency::from_standard_code("USD").unwrap();
        sandbox.credit(&account(1), &account(2), &usd, value("50"), value("0"));
        let other = sandbox.balance_hook(&account(3), &account(4), &usd, value("7"));
        assert_eq!(other, value("7"));
    }

    #[test]
    fn test_self_credit_ignored() {
        let mut ledger = Ledger::genesis(FeatureSet::all());
        let mut sandbox = PaymentSandbox::new(&mut ledger);
        let usd = Currency::from_standard_code("USD").unwrap();
        sandbox.credit(&account(1), &account(1), &usd, value("50"), value("0"));
        let balance = sandbox.balance_hook(&account(1), &account(2), &usd, value("50"));
        assert_eq!(balance, value("50"));
    }
}
