//! Price oracles: creation, update-time bounds, pair bookkeeping,
//! deletion.

use super::env::TestEnv;
use xrpl_ledger::ReadView;
use xrpl_models::entry::LedgerEntry;
use xrpl_models::features::{Feature, FeatureSet};
use xrpl_models::keylet::Keylet;
use xrpl_models::result::TransactionResult;
use xrpl_models::transaction::{OracleDelete, OracleSet, PriceDataEntry, TransactionKind};
use xrpl_models::Currency;

fn pair(base: &str, quote: &str, price: u64, scale: u8) -> PriceDataEntry {
    let base_asset = if base == "XRP" {
        Currency::xrp()
    } else {
        Currency::from_standard_code(base).unwrap()
    };
    PriceDataEntry {
        base_asset,
        quote_asset: Currency::from_standard_code(quote).unwrap(),
        asset_price: Some(price),
        scale: Some(scale),
    }
}

fn delete_pair(base: &str, quote: &str) -> PriceDataEntry {
    PriceDataEntry {
        asset_price: None,
        scale: None,
        ..pair(base, quote, 0, 0)
    }
}

fn oracle_set(
    env: &mut TestEnv,
    name: &str,
    document_id: u32,
    last_update_time: u32,
    series: Vec<PriceDataEntry>,
) -> xrpl_models::transaction::Transaction {
    env.tx(
        name,
        TransactionKind::OracleSet(OracleSet {
            oracle_document_id: document_id,
            provider: Some(vec![0x70; 32]),
            uri: None,
            asset_class: Some(b"currency".to_vec()),
            last_update_time,
            price_data_series: series,
        }),
    )
}

#[test]
fn create_needs_reserve() {
    let mut env = TestEnv::new();
    // exactly the base reserve: one more owned entry is unaffordable
    env.fund_xrp("alice", 10);
    let now = env.parent_close_time();
    let tx = oracle_set(&mut env, "alice", 1, now, vec![pair("XRP", "USD", 740, 1)]);
    let outcome = env.submit(&tx);
    assert_eq!(outcome.result, TransactionResult::tecINSUFFICIENT_RESERVE);
    assert!(outcome.applied);
}

#[test]
fn update_time_bounds() {
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    let now = env.parent_close_time();
    let tx = oracle_set(&mut env, "alice", 1, now, vec![pair("XRP", "USD", 740, 1)]);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    env.advance(400);
    let now = env.parent_close_time();

    // too far in the past
    let tx = oracle_set(&mut env, "alice", 1, now - 301, vec![pair("XRP", "USD", 741, 1)]);
    let outcome = env.submit(&tx);
    assert_eq!(outcome.result, TransactionResult::tecINVALID_UPDATE_TIME);

    // too far in the future
    let tx = oracle_set(&mut env, "alice", 1, now + 311, vec![pair("XRP", "USD", 741, 1)]);
    let outcome = env.submit(&tx);
    assert_eq!(outcome.result, TransactionResult::tecINVALID_UPDATE_TIME);

    // right on the close time
    let tx = oracle_set(&mut env, "alice", 1, now, vec![pair("XRP", "USD", 741, 1)]);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
}

#[test]
fn stale_update_rejected() {
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    let now = env.parent_close_time();
    let tx = oracle_set(&mut env, "alice", 1, now, vec![pair("XRP", "USD", 740, 1)]);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    // the same timestamp is not an advance
    let tx = oracle_set(&mut env, "alice", 1, now, vec![pair("XRP", "USD", 741, 1)]);
    let outcome = env.submit(&tx);
    assert_eq!(outcome.result, TransactionResult::tecINVALID_UPDATE_TIME);
}

#[test]
fn series_validation() {
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    let now = env.parent_close_time();

    // empty series
    let tx = oracle_set(&mut env, "alice", 1, now, vec![]);
    env.submit_expect(&tx, TransactionResult::temARRAY_EMPTY);

    // more than ten pairs
    let codes = [
        "AAA", "BBB", "CCC", "DDD", "EEE", "FFF", "GGG", "HHH", "III", "JJJ", "KKK",
    ];
    let series: Vec<_> = codes.iter().map(|code| pair(code, "USD", 1, 0)).collect();
    let tx = oracle_set(&mut env, "alice", 1, now, series);
    env.submit_expect(&tx, TransactionResult::temARRAY_TOO_LARGE);

    // a duplicated pair
    let series = vec![pair("EUR", "USD", 1, 0), pair("EUR", "USD", 2, 0)];
    let tx = oracle_set(&mut env, "alice", 1, now, series);
    env.submit_expect(&tx, TransactionResult::temMALFORMED);

    // a scale beyond the cap
    let tx = oracle_set(&mut env, "alice", 1, now, vec![pair("EUR", "USD", 1, 9)]);
    env.submit_expect(&tx, TransactionResult::temMALFORMED);
}

#[test]
fn pair_lifecycle_and_reserve_units() {
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    let alice = env.account("alice");
    let now = env.parent_close_time();

    let series = vec![
        pair("XRP", "USD", 740, 1),
        pair("EUR", "USD", 108, 2),
        pair("GBP", "USD", 127, 2),
    ];
    let tx = oracle_set(&mut env, "alice", 7, now, series);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    assert_eq!(env.owner_count(&alice), 1);

    // growing past five pairs costs a second reserve unit
    env.advance(10);
    let now = env.parent_close_time();
    let series = vec![
        pair("JPY", "USD", 155, 0),
        pair("CHF", "USD", 88, 2),
        pair("CAD", "USD", 137, 2),
    ];
    let tx = oracle_set(&mut env, "alice", 7, now, series);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    assert_eq!(env.owner_count(&alice), 2);

    // deleting a pair the oracle does not hold
    env.advance(10);
    let now = env.parent_close_time();
    let tx = oracle_set(&mut env, "alice", 7, now, vec![delete_pair("ZZZ", "USD")]);
    let outcome = env.submit(&tx);
    assert_eq!(outcome.result, TransactionResult::tecTOKEN_PAIR_NOT_FOUND);

    // shrinking back under six pairs releases the unit
    env.advance(10);
    let now = env.parent_close_time();
    let tx = oracle_set(&mut env, "alice", 7, now, vec![delete_pair("JPY", "USD")]);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    assert_eq!(env.owner_count(&alice), 1);

    // deleting every remaining pair would empty the series
    env.advance(10);
    let now = env.parent_close_time();
    let series = vec![
        delete_pair("XRP", "USD"),
        delete_pair("EUR", "USD"),
        delete_pair("GBP", "USD"),
        delete_pair("CHF", "USD"),
        delete_pair("CAD", "USD"),
    ];
    let tx = oracle_set(&mut env, "alice", 7, now, series);
    let outcome = env.submit(&tx);
    assert_eq!(outcome.result, TransactionResult::tecARRAY_EMPTY);
}

#[test]
fn provider_immutable() {
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    let now = env.parent_close_time();
    let tx = oracle_set(&mut env, "alice", 1, now, vec![pair("XRP", "USD", 740, 1)]);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);

    env.advance(10);
    let last_update_time = env.parent_close_time();
    let tx = env.tx(
        "alice",
        TransactionKind::OracleSet(OracleSet {
            oracle_document_id: 1,
            provider: Some(b"someone else".to_vec()),
            uri: None,
            asset_class: Some(b"currency".to_vec()),
            last_update_time,
            price_data_series: vec![pair("XRP", "USD", 741, 1)],
        }),
    );
    env.submit_expect(&tx, TransactionResult::temMALFORMED);
}

#[test]
fn ordering_follows_the_fix_gate() {
    // without the fix, update order is insertion order
    let mut env = TestEnv::with_features(FeatureSet::all().without(Feature::FixPriceOracleOrder));
    env.fund_xrp("alice", 10_000);
    let alice = env.account("alice");
    let now = env.parent_close_time();
    let tx = oracle_set(
        &mut env,
        "alice",
        1,
        now,
        vec![pair("GBP", "USD", 1, 0), pair("EUR", "USD", 1, 0)],
    );
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    env.advance(10);
    let now = env.parent_close_time();
    let tx = oracle_set(&mut env, "alice", 1, now, vec![pair("AAA", "USD", 1, 0)]);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    let key = Keylet::oracle(&alice, 1).key;
    let Some(LedgerEntry::Oracle(oracle)) = env.ledger.get(&key) else {
        panic!("oracle missing");
    };
    let codes: Vec<String> = oracle
        .price_data_series
        .iter()
        .map(|p| p.base_asset.to_string())
        .collect();
    assert_eq!(codes, vec!["GBP", "EUR", "AAA"]);

    // with the fix, the series is sorted by pair
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    let alice = env.account("alice");
    let now = env.parent_close_time();
    let tx = oracle_set(
        &mut env,
        "alice",
        1,
        now,
        vec![pair("GBP", "USD", 1, 0), pair("EUR", "USD", 1, 0)],
    );
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    env.advance(10);
    let now = env.parent_close_time();
    let tx = oracle_set(&mut env, "alice", 1, now, vec![pair("AAA", "USD", 1, 0)]);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    let key = Keylet::oracle(&alice, 1).key;
    let Some(LedgerEntry::Oracle(oracle)) = env.ledger.get(&key) else {
        panic!("oracle missing");
    };
    let codes: Vec<String> = oracle
        .price_data_series
        .iter()
        .map(|p| p.base_asset.to_string())
        .collect();
    assert_eq!(codes, vec!["AAA", "EUR", "GBP"]);
}

#[test]
fn delete_oracle() {
    let mut env = TestEnv::new();
    env.fund_xrp("alice", 10_000);
    let alice = env.account("alice");
    let now = env.parent_close_time();
    let tx = oracle_set(&mut env, "alice", 3, now, vec![pair("XRP", "USD", 740, 1)]);
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    assert_eq!(env.owner_count(&alice), 1);

    let tx = env.tx(
        "alice",
        TransactionKind::OracleDelete(OracleDelete {
            oracle_document_id: 3,
        }),
    );
    env.submit_expect(&tx, TransactionResult::tesSUCCESS);
    assert_eq!(env.owner_count(&alice), 0);

    // deleting it twice names a missing entry
    let tx = env.tx(
        "alice",
        TransactionKind::OracleDelete(OracleDelete {
            oracle_document_id: 3,
        }),
    );
    let outcome = env.submit(&tx);
    assert_eq!(outcome.result, TransactionResult::tecNO_ENTRY);
}

#[test]
fn disabled_without_amendment() {
    let mut env = TestEnv::with_features(FeatureSet::all().without(Feature::PriceOracle));
    env.fund_xrp("alice", 10_000);
    let now = env.parent_close_time();
    let tx = oracle_set(&mut env, "alice", 1, now, vec![pair("XRP", "USD", 740, 1)]);
    env.submit_expect(&tx, TransactionResult::temDISABLED);
}
