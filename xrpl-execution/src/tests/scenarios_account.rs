//! Account settings, regular keys, tickets, deposit preauthorization and
//! account deletion.

use super::env::{TestEnv, XRP};
use xrpl_ledger::ReadView;
use xrpl_models::entry::account_flags;
use xrpl_models::result::TransactionResult;
use xrpl_models::transaction::{
    account_set_flags as asf, AccountDelete, AccountSet, DepositPreauthTx, SetRegularKey,
    SigningMode, TicketCreate, TransactionKind,
};
use xrpl_signature::KeyPair;

fn account_set(set_flag: Option<u32>, clear_flag: Option<u32>) -> TransactionKind {
    TransactionKind::AccountSet(AccountSet {
        set_flag,
        clear_flag,
        transfer_rate: None,
        tick_size: None,
    })
}

#[test]
fn set_and_clear_flags() {
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    let alice = env.account("alice");

    let tx = env.tx("alice", account_set(Some(asf::ASF_REQUIRE_DEST), None));
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    assert!(env
        .root(&alice)
        .unwrap()
        .has_flag(account_flags::LSF_REQUIRE_DEST_TAG));

    let tx = env.tx("alice", account_set(None, Some(asf::ASF_REQUIRE_DEST)));
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    assert!(!env
        .root(&alice)
        .unwrap()
        .has_flag(account_flags::LSF_REQUIRE_DEST_TAG));
}

#[test]
fn require_dest_tag_enforced() {
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    env.fund_xrp("bob", 10_000);
    let tx = env.tx("bob", account_set(Some(asf::ASF_REQUIRE_DEST), None));
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    let tx = env.pay_xrp("alice", "bob", 10);
    let outcome = env.submit(&tx);
    assert_eq!(outcome.result, TransactionResult::tecDST_TAG_NEEDED);
}

#[test]
fn deposit_auth_gates_payments() {
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    env.fund_xrp("bob", 10_000);
    let tx = env.tx("bob", account_set(Some(asf::ASF_DEPOSIT_AUTH), None));
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    let tx = env.pay_xrp("alice", "bob", 10);
    let outcome = env.submit(&tx);
    assert_eq!(outcome.result, TransactionResult::tecNO_PERMISSION);

    // preauthorization opens the door
    let authorize = env.account("alice");
    let tx = env.tx(
        "bob",
        TransactionKind::DepositPreauth(DepositPreauthTx {
            authorize: Some(authorize),
            unauthorize: None,
        }),
    );
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    let tx = env.pay_xrp("alice", "bob", 10);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
}

#[test]
fn preauth_bookkeeping() {
    let mut env = TestEnv::new();
    env.fund_xrp("bob", 10_000);
    env.fund_xrp("alice", 10_000);
    let alice = env.account("alice");
    let bob = env.account("bob");

    let tx = env.tx(
        "bob",
        TransactionKind::DepositPreauth(DepositPreauthTx {
            authorize: Some(alice),
            unauthorize: None,
        }),
    );
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    assert_eq!(env.owner_count(&bob), 1);

    // duplicates are rejected
    let tx = env.tx(
        "bob",
        TransactionKind::DepositPreauth(DepositPreauthTx {
            authorize: Some(alice),
            unauthorize: None,
        }),
    );
    let outcome = env.submit(&tx);
    assert_eq!(outcome.result, TransactionResult::tecDUPLICATE);

    // removal releases the reserve
    let tx = env.tx(
        "bob",
        TransactionKind::DepositPreauth(DepositPreauthTx {
            authorize: None,
            unauthorize: Some(alice),
        }),
    );
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    assert_eq!(env.owner_count(&bob), 0);

    // self-preauthorization is malformed
    let tx = env.tx(
        "bob",
        TransactionKind::DepositPreauth(DepositPreauthTx {
            authorize: Some(bob),
            unauthorize: None,
        }),
    );
    env.submit_expect(&tx, TransactionResult::temCAN_NOT_PREAUTH_SELF);
}

#[test]
fn regular_key_can_sign() {
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    env.fund_xrp("bob", 10_000);
    // the regular key is a separate keypair; bind it to alice
    let regular = KeyPair::from_seed_secp256k1(b"alice-regular");
    let regular_key =
        xrpl_models::AccountId::from_public_key(&regular.get_public_key());
    let tx = env.tx(
        "alice",
        TransactionKind::SetRegularKey(SetRegularKey {
            regular_key: Some(regular_key),
        }),
    );
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    // a payment signed with the regular key applies
    let mut tx = env.pay_xrp("alice", "bob", 10);
    tx.common.signing_pub_key = regular.get_public_key().to_bytes().to_vec();
    let payload = tx.sign_bytes(SigningMode::SingleSign).unwrap();
    tx.common.txn_signature = regular.sign(&payload).to_bytes();
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
}

#[test]
fn transfer_rate_bounds() {
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    let tx = env.tx(
        "alice",
        TransactionKind::AccountSet(AccountSet {
            set_flag: None,
            clear_flag: None,
            transfer_rate: Some(999_999_999),
            tick_size: None,
        }),
    );
    env.submit_expect(&tx, TransactionResult::temBAD_TRANSFER_RATE);

    let tx = env.tx(
        "alice",
        TransactionKind::AccountSet(AccountSet {
            set_flag: None,
            clear_flag: None,
            transfer_rate: None,
            tick_size: Some(2),
        }),
    );
    env.submit_expect(&tx, TransactionResult::temBAD_TICK_SIZE);
}

#[test]
fn tickets_mint_and_consume() {
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    env.fund_xrp("bob", 10_000);
    let alice = env.account("alice");

    let tx = env.tx(
        "alice",
        TransactionKind::TicketCreate(TicketCreate { ticket_count: 3 }),
    );
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    let root = env.root(&alice).unwrap();
    assert_eq!(root.ticket_count, 3);
    assert_eq!(root.owner_count, 3);
    // sequence jumped over the reserved slots
    assert_eq!(root.sequence, 5);

    // spend the middle ticket out of order
    let destination = env.account("bob");
    let kind = TransactionKind::Payment(xrpl_models::transaction::Payment {
        destination,
        amount: xrpl_models::Amount::from_drops(10 * XRP).unwrap(),
        send_max: None,
        deliver_min: None,
        destination_tag: None,
        invoice_id: None,
        paths: Default::default(),
    });
    let mut tx = env.tx_with("alice", kind, 0, 10);
    tx.common.ticket_sequence = Some(3);
    let keypair = KeyPair::from_seed_secp256k1(b"alice");
    let payload = tx.sign_bytes(SigningMode::SingleSign).unwrap();
    tx.common.txn_signature = keypair.sign(&payload).to_bytes();
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    let root = env.root(&alice).unwrap();
    assert_eq!(root.ticket_count, 2);
    assert_eq!(root.owner_count, 2);
    // consuming a ticket does not advance the sequence
    assert_eq!(root.sequence, 5);

    // the same ticket cannot be spent twice
    let replay = env.submit(&tx);
    assert_eq!(replay.result, TransactionResult::tefNO_TICKET);
}

#[test]
fn ticket_count_bounds() {
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    let tx = env.tx(
        "alice",
        TransactionKind::TicketCreate(TicketCreate { ticket_count: 0 }),
    );
    env.submit_expect(&tx, TransactionResult::temINVALID_COUNT);
    let tx = env.tx(
        "alice",
        TransactionKind::TicketCreate(TicketCreate { ticket_count: 251 }),
    );
    env.submit_expect(&tx, TransactionResult::temINVALID_COUNT);
}

#[test]
fn account_delete_lifecycle() {
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    env.fund_xrp("bob", 10_000);
    let alice = env.account("alice");
    let destination = env.account("bob");

    let delete = TransactionKind::AccountDelete(AccountDelete {
        destination,
        destination_tag: None,
    });

    // too soon: the sequence gap has not passed
    let tx = env.tx_with("alice", delete.clone(), 1, 2 * XRP);
    let outcome = env.submit(&tx);
    assert_eq!(outcome.result, TransactionResult::tecTOO_SOON);

    // fast-forward the ledger past the quarantine
    for _ in 0..26 {
        env.advance(10);
    }
    while env.ledger.header().sequence < 260 {
        env.ledger.close(env.parent_close_time() + 10);
    }

    // the ordinary base fee is not enough for a deletion
    let sequence = env.sequence(&alice);
    let tx = env.tx_with("alice", delete.clone(), sequence, 10);
    let outcome = env.submit(&tx);
    assert_eq!(outcome.result, TransactionResult::terINSUF_FEE_B);

    let sequence = env.sequence(&alice);
    let tx = env.tx_with("alice", delete, sequence, 2 * XRP);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    assert!(env.root(&alice).is_none());
    let bob = env.account("bob");
    // bob absorbed everything alice had left: her funding minus the fee
    // claimed by the too-soon attempt and the deletion fee itself
    assert_eq!(env.balance(&bob), 10_000 * XRP + 10_000 * XRP - 4 * XRP);
}

#[test]
fn account_delete_blocked_by_obligations() {
    let mut env = TestEnv::new();
    env.fund_xrp("issuer", 10_000);
    env.fund_xrp("alice", 10_000);
    env.fund_xrp("bob", 10_000);
    let tx = env.trust("alice", "100", "USD", "issuer");
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    while env.ledger.header().sequence < 270 {
        env.ledger.close(env.parent_close_time() + 10);
    }

    let destination = env.account("bob");
    let alice = env.account("alice");
    let sequence = env.sequence(&alice);
    let tx = env.tx_with(
        "alice",
        TransactionKind::AccountDelete(AccountDelete {
            destination,
            destination_tag: None,
        }),
        sequence,
        2 * XRP,
    );
    let outcome = env.submit(&tx);
    assert_eq!(outcome.result, TransactionResult::tecHAS_OBLIGATIONS);
}
