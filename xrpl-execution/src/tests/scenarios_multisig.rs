//! Signer lists and multisigned transactions.

use super::env::TestEnv;
use xrpl_models::features::{Feature, FeatureSet};
use xrpl_models::result::TransactionResult;
use xrpl_models::transaction::{OracleSet, PriceDataEntry, TransactionKind};

fn oracle_set(env: &mut TestEnv, name: &str) -> xrpl_models::transaction::Transaction {
    let last_update_time = env.parent_close_time();
    env.tx(
        name,
        TransactionKind::OracleSet(OracleSet {
            oracle_document_id: 1,
            provider: Some(vec![0x70; 32]),
            uri: None,
            asset_class: Some(b"currency".to_vec()),
            last_update_time,
            price_data_series: vec![PriceDataEntry {
                base_asset: xrpl_models::Currency::xrp(),
                quote_asset: xrpl_models::Currency::from_standard_code("USD").unwrap(),
                asset_price: Some(740),
                scale: Some(1),
            }],
        }),
    )
}

#[test]
fn quorum_rules() {
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    env.fund_xrp("becky", 1_000);
    env.fund_xrp("bogie", 1_000);
    env.fund_xrp("ed", 1_000);

    let tx = env.signer_list("alice", 2, &[("becky", 1), ("bogie", 1), ("ed", 2)]);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    // becky alone is below the quorum
    let tx = oracle_set(&mut env, "alice");
    let tx = env.multisign(tx, &["becky"]);
    let outcome = env.submit(&tx);
    assert_eq!(outcome.result, TransactionResult::tefBAD_QUORUM);

    // becky and bogie together meet it
    let tx = oracle_set(&mut env, "alice");
    let tx = env.multisign(tx, &["becky", "bogie"]);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    // ed's weight meets it alone; this updates the oracle
    env.advance(10);
    let tx = oracle_set(&mut env, "alice");
    let tx = env.multisign(tx, &["ed"]);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
}

#[test]
fn outside_signer_rejected() {
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    env.fund_xrp("becky", 1_000);
    env.fund_xrp("mallory", 1_000);

    let tx = env.signer_list("alice", 1, &[("becky", 1)]);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    let tx = oracle_set(&mut env, "alice");
    let tx = env.multisign(tx, &["mallory"]);
    let outcome = env.submit(&tx);
    assert_eq!(outcome.result, TransactionResult::tefBAD_SIGNATURE);
}

#[test]
fn no_list_means_no_multisign() {
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    env.fund_xrp("becky", 1_000);
    let tx = oracle_set(&mut env, "alice");
    let tx = env.multisign(tx, &["becky"]);
    let outcome = env.submit(&tx);
    assert_eq!(outcome.result, TransactionResult::tefNOT_MULTI_SIGNING);
}

#[test]
fn list_validation() {
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    env.fund_xrp("becky", 1_000);

    // the owner may not list itself
    let tx = env.signer_list("alice", 1, &[("alice", 1)]);
    env.submit_expect(&tx, TransactionResult::temBAD_SIGNER);

    // the quorum must be reachable
    let tx = env.signer_list("alice", 5, &[("becky", 1)]);
    env.submit_expect(&tx, TransactionResult::temBAD_QUORUM);

    // deleting a list that does not exist
    let tx = env.signer_list("alice", 0, &[]);
    let outcome = env.submit(&tx);
    assert_eq!(outcome.result, TransactionResult::tecNO_ENTRY);
}

#[test]
fn reserve_follows_multisign_reserve_amendment() {
    // legacy schedule: 2 + N owner units
    let mut env = TestEnv::with_features(FeatureSet::all().without(Feature::MultiSignReserve));
    env.fund_xrp("alice", 10_000);
    env.fund_xrp("becky", 1_000);
    env.fund_xrp("bogie", 1_000);
    let tx = env.signer_list("alice", 2, &[("becky", 1), ("bogie", 1)]);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    let alice = env.account("alice");
    assert_eq!(env.owner_count(&alice), 4);

    // reduced schedule: one unit flat
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    env.fund_xrp("becky", 1_000);
    env.fund_xrp("bogie", 1_000);
    let tx = env.signer_list("alice", 2, &[("becky", 1), ("bogie", 1)]);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    let alice = env.account("alice");
    assert_eq!(env.owner_count(&alice), 1);
}

#[test]
fn replace_and_delete_list() {
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    env.fund_xrp("becky", 1_000);
    env.fund_xrp("bogie", 1_000);

    let tx = env.signer_list("alice", 1, &[("becky", 1)]);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    let tx = env.signer_list("alice", 2, &[("becky", 1), ("bogie", 1)]);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    let tx = env.signer_list("alice", 0, &[]);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    let alice = env.account("alice");
    assert_eq!(env.owner_count(&alice), 0);
}
