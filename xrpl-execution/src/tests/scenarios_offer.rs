//! Offer placement, crossing and cancellation.

use super::env::{TestEnv, XRP};
use xrpl_models::amount::IouValue;
use xrpl_models::result::TransactionResult;
use xrpl_models::transaction::{tx_flags, OfferCancel, OfferCreate, TransactionKind};

fn value(s: &str) -> IouValue {
    s.parse().unwrap()
}

fn offer(env: &mut TestEnv, name: &str, pays: xrpl_models::Amount, gets: xrpl_models::Amount) -> xrpl_models::transaction::Transaction {
    env.tx(
        name,
        TransactionKind::OfferCreate(OfferCreate {
            taker_pays: pays,
            taker_gets: gets,
            expiration: None,
            offer_sequence: None,
        }),
    )
}

/// Issue USD to a holder through a fresh line.
fn give_usd(env: &mut TestEnv, holder: &str, amount: &str) {
    let tx = env.trust(holder, "100000", "USD", "issuer");
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    let tx = env.pay_iou("issuer", holder, amount, "USD", "issuer");
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
}

#[test]
fn place_offer_and_cancel() {
    let mut env = TestEnv::new();
    env.fund_xrp("issuer", 10_000);
    env.fund_xrp("alice", 10_000);
    give_usd(&mut env, "alice", "100");

    let pays = xrpl_models::Amount::from_drops(1_000 * XRP).unwrap();
    let gets = env.iou("100", "USD", "issuer");
    let tx = offer(&mut env, "alice", pays, gets);
    let sequence = tx.common.sequence;
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    let alice = env.account("alice");
    // the line plus the offer
    assert_eq!(env.owner_count(&alice), 2);

    let tx = env.tx(
        "alice",
        TransactionKind::OfferCancel(OfferCancel {
            offer_sequence: sequence,
        }),
    );
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    let alice = env.account("alice");
    assert_eq!(env.owner_count(&alice), 1);
}

#[test]
fn unfunded_offer_rejected() {
    let mut env = TestEnv::new();
    env.fund_xrp("issuer", 10_000);
    env.fund_xrp("alice", 10_000);
    // alice holds no USD at all
    let tx = env.trust("alice", "100000", "USD", "issuer");
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    let pays = xrpl_models::Amount::from_drops(1_000 * XRP).unwrap();
    let gets = env.iou("100", "USD", "issuer");
    let tx = offer(&mut env, "alice", pays, gets);
    env.submit_expect(&tx, TransactionResult::tecUNFUNDED_OFFER);
}

#[test]
fn full_cross() {
    let mut env = TestEnv::new();
    env.fund_xrp("issuer", 10_000);
    env.fund_xrp("alice", 10_000);
    env.fund_xrp("bob", 10_000);
    give_usd(&mut env, "alice", "100");
    // bob needs a line to hold the USD he buys
    let tx = env.trust("bob", "100000", "USD", "issuer");
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    // alice sells 100 USD for 1000 XRP
    let pays = xrpl_models::Amount::from_drops(1_000 * XRP).unwrap();
    let gets = env.iou("100", "USD", "issuer");
    let tx = offer(&mut env, "alice", pays, gets);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    // bob takes the whole thing: buys 100 USD paying 1000 XRP
    let pays = env.iou("100", "USD", "issuer");
    let gets = xrpl_models::Amount::from_drops(1_000 * XRP).unwrap();
    let tx = offer(&mut env, "bob", pays, gets);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    let alice = env.account("alice");
    let bob = env.account("bob");
    let issuer = env.account("issuer");
    assert_eq!(env.iou_balance(&bob, &issuer, "USD"), value("100"));
    assert!(env.iou_balance(&alice, &issuer, "USD").is_zero());
    // alice received the XRP net of her two fees (trust line and offer)
    assert_eq!(env.balance(&alice), 11_000 * XRP - 20);
    // alice's consumed offer is gone
    assert_eq!(env.owner_count(&alice), 1);
}

#[test]
fn partial_cross_leaves_remainder() {
    let mut env = TestEnv::new();
    env.fund_xrp("issuer", 10_000);
    env.fund_xrp("alice", 10_000);
    env.fund_xrp("bob", 10_000);
    give_usd(&mut env, "alice", "100");
    let tx = env.trust("bob", "100000", "USD", "issuer");
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    let pays = xrpl_models::Amount::from_drops(1_000 * XRP).unwrap();
    let gets = env.iou("100", "USD", "issuer");
    let tx = offer(&mut env, "alice", pays, gets);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    // bob only wants 40 USD
    let pays = env.iou("40", "USD", "issuer");
    let gets = xrpl_models::Amount::from_drops(400 * XRP).unwrap();
    let tx = offer(&mut env, "bob", pays, gets);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    let bob = env.account("bob");
    let issuer = env.account("issuer");
    assert_eq!(env.iou_balance(&bob, &issuer, "USD"), value("40"));
    // alice's offer remains with 60 USD to give
    let alice = env.account("alice");
    assert_eq!(env.owner_count(&alice), 2);
    // bob took his fill and placed nothing
    assert_eq!(env.owner_count(&bob), 1);
}

#[test]
fn immediate_or_cancel_never_places() {
    let mut env = TestEnv::new();
    env.fund_xrp("issuer", 10_000);
    env.fund_xrp("alice", 10_000);
    give_usd(&mut env, "alice", "100");

    let pays = xrpl_models::Amount::from_drops(1_000 * XRP).unwrap();
    let gets = env.iou("100", "USD", "issuer");
    let mut tx = offer(&mut env, "alice", pays, gets);
    tx.common.flags |= tx_flags::TF_IMMEDIATE_OR_CANCEL;
    let keypair = xrpl_signature::KeyPair::from_seed_secp256k1(b"alice");
    let payload = tx
        .sign_bytes(xrpl_models::transaction::SigningMode::SingleSign)
        .unwrap();
    tx.common.txn_signature = keypair.sign(&payload).to_bytes();
    // empty book: nothing crossed, nothing placed
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    let alice = env.account("alice");
    assert_eq!(env.owner_count(&alice), 1);
}

#[test]
fn fill_or_kill_dies_without_liquidity() {
    let mut env = TestEnv::new();
    env.fund_xrp("issuer", 10_000);
    env.fund_xrp("alice", 10_000);
    give_usd(&mut env, "alice", "100");

    let pays = xrpl_models::Amount::from_drops(1_000 * XRP).unwrap();
    let gets = env.iou("100", "USD", "issuer");
    let mut tx = offer(&mut env, "alice", pays, gets);
    tx.common.flags |= tx_flags::TF_FILL_OR_KILL;
    let keypair = xrpl_signature::KeyPair::from_seed_secp256k1(b"alice");
    let payload = tx
        .sign_bytes(xrpl_models::transaction::SigningMode::SingleSign)
        .unwrap();
    tx.common.txn_signature = keypair.sign(&payload).to_bytes();
    let outcome = env.submit(&tx);
    assert_eq!(outcome.result, TransactionResult::tecKILLED);
    // killed offers still claim the fee
    assert!(outcome.applied);
}

#[test]
fn malformed_offers_rejected() {
    let mut env = TestEnv::new();
    env.fund_xrp("issuer", 10_000);
    env.fund_xrp("alice", 10_000);

    // XRP for XRP is not a book
    let pays = xrpl_models::Amount::from_drops(1_000).unwrap();
    let gets = xrpl_models::Amount::from_drops(1_000).unwrap();
    let tx = offer(&mut env, "alice", pays, gets);
    env.submit_expect(&tx, TransactionResult::temBAD_OFFER);

    // same issue on both sides accomplishes nothing
    let pays = env.iou("10", "USD", "issuer");
    let gets = env.iou("20", "USD", "issuer");
    let tx = offer(&mut env, "alice", pays, gets);
    env.submit_expect(&tx, TransactionResult::temREDUNDANT);
}

#[test]
fn cross_currency_payment_through_book() {
    let mut env = TestEnv::new();
    env.fund_xrp("issuer", 10_000);
    env.fund_xrp("alice", 10_000);
    env.fund_xrp("bob", 10_000);
    env.fund_xrp("carol", 10_000);
    give_usd(&mut env, "alice", "100");
    let tx = env.trust("carol", "100000", "USD", "issuer");
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    // alice offers 100 USD at 10 XRP per USD
    let pays = xrpl_models::Amount::from_drops(1_000 * XRP).unwrap();
    let gets = env.iou("100", "USD", "issuer");
    let tx = offer(&mut env, "alice", pays, gets);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    // bob sends carol 50 USD paying XRP through the book
    let destination = env.account("carol");
    let amount = env.iou("50", "USD", "issuer");
    let send_max = xrpl_models::Amount::from_drops(600 * XRP).unwrap();
    let kind = TransactionKind::Payment(xrpl_models::transaction::Payment {
        destination,
        amount,
        send_max: Some(send_max),
        deliver_min: None,
        destination_tag: None,
        invoice_id: None,
        paths: Default::default(),
    });
    let tx = env.tx("bob", kind);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    let carol = env.account("carol");
    let issuer = env.account("issuer");
    assert_eq!(env.iou_balance(&carol, &issuer, "USD"), value("50"));
    // bob paid 500 XRP through the book plus the fee
    let bob = env.account("bob");
    assert_eq!(env.balance(&bob), 9_500 * XRP - 10);
}

#[test]
fn same_owner_offers_share_funding() {
    let mut env = TestEnv::new();
    env.fund_xrp("issuer", 10_000);
    env.fund_xrp("alice", 10_000);
    env.fund_xrp("bob", 10_000);
    env.fund_xrp("carol", 10_000);
    // alice holds 50 USD but offers 40 twice
    give_usd(&mut env, "alice", "50");
    let tx = env.trust("carol", "100000", "USD", "issuer");
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    for _ in 0..2 {
        let pays = xrpl_models::Amount::from_drops(400 * XRP).unwrap();
        let gets = env.iou("40", "USD", "issuer");
        let tx = offer(&mut env, "alice", pays, gets);
        env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    }

    // bob asks for 80 on carol's behalf; only 50 is truly funded
    let destination = env.account("carol");
    let amount = env.iou("80", "USD", "issuer");
    let send_max = xrpl_models::Amount::from_drops(1_000 * XRP).unwrap();
    let kind = TransactionKind::Payment(xrpl_models::transaction::Payment {
        destination,
        amount,
        send_max: Some(send_max),
        deliver_min: Some(env.iou("10", "USD", "issuer")),
        destination_tag: None,
        invoice_id: None,
        paths: Default::default(),
    });
    let mut tx = env.tx("bob", kind);
    tx.common.flags |= tx_flags::TF_PARTIAL_PAYMENT;
    let keypair = xrpl_signature::KeyPair::from_seed_secp256k1(b"bob");
    let payload = tx
        .sign_bytes(xrpl_models::transaction::SigningMode::SingleSign)
        .unwrap();
    tx.common.txn_signature = keypair.sign(&payload).to_bytes();
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    let carol = env.account("carol");
    let issuer = env.account("issuer");
    assert_eq!(env.iou_balance(&carol, &issuer, "USD"), value("50"));
}
