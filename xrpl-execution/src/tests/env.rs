//! The test environment: a genesis ledger, deterministic accounts and a
//! submit-and-expect surface.

use crate::engine::Engine;
use crate::types::ApplyResult;
use std::collections::BTreeMap;
use xrpl_ledger::{Ledger, ReadView, WriteView};
use xrpl_models::account::AccountId;
use xrpl_models::amount::{Amount, IouAmount, IouValue, XrpAmount};
use xrpl_models::currency::Currency;
use xrpl_models::entry::{AccountRoot, LedgerEntry, SignerEntry};
use xrpl_models::features::FeatureSet;
use xrpl_models::keylet::Keylet;
use xrpl_models::result::TransactionResult;
use xrpl_models::transaction::{
    Signer, SigningMode, Transaction, TransactionCommon, TransactionKind,
};
use xrpl_signature::KeyPair;

/// Drops per XRP.
pub const XRP: i64 = 1_000_000;

pub struct TestEnv {
    pub ledger: Ledger,
    pub engine: Engine,
    keys: BTreeMap<String, KeyPair>,
    clock: u32,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_features(FeatureSet::all())
    }

    pub fn with_features(features: FeatureSet) -> Self {
        let mut ledger = Ledger::genesis(features);
        // open the first working ledger so parent close time is non-zero
        ledger.close(1_000);
        TestEnv {
            ledger,
            engine: Engine::new(),
            keys: BTreeMap::new(),
            clock: 1_000,
        }
    }

    /// A deterministic account named for the test.
    pub fn account(&mut self, name: &str) -> AccountId {
        let keypair = self
            .keys
            .entry(name.to_string())
            .or_insert_with(|| KeyPair::from_seed_secp256k1(name.as_bytes()));
        AccountId::from_public_key(&keypair.get_public_key())
    }

    /// Create and fund an account directly in the state, genesis-style.
    pub fn fund_xrp(&mut self, name: &str, xrp: u64) -> AccountId {
        let account = self.account(name);
        let root = AccountRoot::new(
            account,
            XrpAmount::from_xrp(xrp).unwrap(),
            1,
        );
        self.ledger
            .insert(Keylet::account(&account).key, LedgerEntry::AccountRoot(root));
        account
    }

    /// Close the current ledger, advancing time by `seconds`.
    pub fn advance(&mut self, seconds: u32) {
        self.clock += seconds;
        self.ledger.close(self.clock);
    }

    pub fn close(&mut self) {
        self.advance(10);
    }

    pub fn parent_close_time(&self) -> u32 {
        self.ledger.header().parent_close_time
    }

    // -- state inspection --------------------------------------------------

    pub fn root(&self, account: &AccountId) -> Option<AccountRoot> {
        match self.ledger.get(&Keylet::account(account).key) {
            Some(LedgerEntry::AccountRoot(root)) => Some(root),
            _ => None,
        }
    }

    pub fn balance(&self, account: &AccountId) -> i64 {
        self.root(account).map_or(0, |root| root.balance.drops())
    }

    pub fn sequence(&self, account: &AccountId) -> u32 {
        self.root(account).map_or(0, |root| root.sequence)
    }

    pub fn owner_count(&self, account: &AccountId) -> u32 {
        self.root(account).map_or(0, |root| root.owner_count)
    }

    /// IOU balance of `holder` against `issuer`, from the holder's side.
    pub fn iou_balance(&self, holder: &AccountId, issuer: &AccountId, code: &str) -> IouValue {
        let currency = Currency::from_standard_code(code).unwrap();
        match self.ledger.get(&Keylet::line(holder, issuer, &currency).key) {
            Some(LedgerEntry::RippleState(line)) => {
                crate::common::line_balance_from(&line, holder)
            }
            _ => IouValue::zero(),
        }
    }

    /// Sum of all native balances plus everything burned so far; constant
    /// across applies when value is conserved.
    pub fn total_drops(&self) -> i64 {
        let held: i64 = self
            .ledger
            .iter()
            .filter_map(|(_, entry)| match entry {
                LedgerEntry::AccountRoot(root) => Some(root.balance.drops()),
                LedgerEntry::PayChannel(channel) => {
                    Some(channel.amount.drops() - channel.balance.drops())
                }
                _ => None,
            })
            .sum();
        held + self.ledger.drops_destroyed()
    }

    // -- transaction building ---------------------------------------------

    /// A signed envelope for `name` at its current sequence with the base
    /// fee.
    pub fn tx(&mut self, name: &str, kind: TransactionKind) -> Transaction {
        let account = self.account(name);
        let sequence = self.sequence(&account);
        self.tx_with(name, kind, sequence, 10)
    }

    pub fn tx_with(
        &mut self,
        name: &str,
        kind: TransactionKind,
        sequence: u32,
        fee: i64,
    ) -> Transaction {
        let account = self.account(name);
        let mut common =
            TransactionCommon::new(account, XrpAmount::from_drops(fee).unwrap(), sequence);
        let keypair = self.keys.get(name).expect("account was never created");
        common.signing_pub_key = keypair.get_public_key().to_bytes().to_vec();
        let mut tx = Transaction { common, kind };
        let payload = tx.sign_bytes(SigningMode::SingleSign).unwrap();
        tx.common.txn_signature = keypair.sign(&payload).to_bytes();
        tx
    }

    /// Multisign `tx` for the listed signer names, replacing any single
    /// signature.
    pub fn multisign(&mut self, mut tx: Transaction, signer_names: &[&str]) -> Transaction {
        tx.common.signing_pub_key = Vec::new();
        tx.common.txn_signature = Vec::new();
        let mut signers = Vec::new();
        for name in signer_names {
            let account = self.account(name);
            let keypair = self.keys.get(*name).unwrap();
            let payload = tx.sign_bytes(SigningMode::MultiSign(account)).unwrap();
            signers.push(Signer {
                account,
                signing_pub_key: keypair.get_public_key().to_bytes().to_vec(),
                txn_signature: keypair.sign(&payload).to_bytes(),
            });
        }
        signers.sort_by_key(|signer| signer.account);
        tx.common.signers = signers;
        tx
    }

    pub fn submit(&mut self, tx: &Transaction) -> ApplyResult {
        self.engine.apply(&mut self.ledger, tx)
    }

    /// Submit and assert the result code.
    pub fn submit_expect(&mut self, tx: &Transaction, expected: TransactionResult) -> ApplyResult {
        let outcome = self.submit(tx);
        assert_eq!(
            outcome.result, expected,
            "expected {} got {}",
            expected, outcome.result
        );
        outcome
    }

    // -- common transaction shapes ----------------------------------------

    pub fn pay_drops(&mut self, from: &str, to: &str, drops: i64) -> Transaction {
        let destination = self.account(to);
        self.tx(
            from,
            TransactionKind::Payment(xrpl_models::transaction::Payment {
                destination,
                amount: Amount::from_drops(drops).unwrap(),
                send_max: None,
                deliver_min: None,
                destination_tag: None,
                invoice_id: None,
                paths: Default::default(),
            }),
        )
    }

    pub fn pay_xrp(&mut self, from: &str, to: &str, xrp: i64) -> Transaction {
        self.pay_drops(from, to, xrp * XRP)
    }

    pub fn iou(&mut self, value: &str, code: &str, issuer: &str) -> Amount {
        let issuer = self.account(issuer);
        Amount::Iou(IouAmount::new(
            value.parse().unwrap(),
            Currency::from_standard_code(code).unwrap(),
            issuer,
        ))
    }

    pub fn trust(&mut self, holder: &str, limit: &str, code: &str, issuer: &str) -> Transaction {
        let limit_amount = self.iou(limit, code, issuer);
        self.tx(
            holder,
            TransactionKind::TrustSet(xrpl_models::transaction::TrustSet {
                limit_amount,
                quality_in: None,
                quality_out: None,
            }),
        )
    }

    pub fn pay_iou(&mut self, from: &str, to: &str, value: &str, code: &str, issuer: &str) -> Transaction {
        let destination = self.account(to);
        let amount = self.iou(value, code, issuer);
        self.tx(
            from,
            TransactionKind::Payment(xrpl_models::transaction::Payment {
                destination,
                amount,
                send_max: None,
                deliver_min: None,
                destination_tag: None,
                invoice_id: None,
                paths: Default::default(),
            }),
        )
    }

    pub fn signer_list(
        &mut self,
        owner: &str,
        quorum: u32,
        signers: &[(&str, u16)],
    ) -> Transaction {
        let entries: Vec<SignerEntry> = signers
            .iter()
            .map(|(name, weight)| SignerEntry {
                account: self.account(name),
                weight: *weight,
            })
            .collect();
        self.tx(
            owner,
            TransactionKind::SignerListSet(xrpl_models::transaction::SignerListSet {
                signer_quorum: quorum,
                signer_entries: entries,
            }),
        )
    }
}
