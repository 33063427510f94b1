//! Signature checking: stateless cryptographic verification at preflight,
//! authority binding (master/regular key, signer list and quorum) at
//! preclaim.

use crate::common::account_root;
use tracing::debug;
use xrpl_ledger::ReadView;
use xrpl_models::account::AccountId;
use xrpl_models::entry::{account_flags, LedgerEntry, SignerList};
use xrpl_models::features::Feature;
use xrpl_models::keylet::Keylet;
use xrpl_models::result::TransactionResult;
use xrpl_models::transaction::{SigningMode, Transaction};
use xrpl_signature::{PublicKey, Signature};

/// Stateless signature verification. Single-signed transactions verify
/// against their own SigningPubKey; multisigned ones verify each signer's
/// signature against that signer's key, sorted order and uniqueness.
pub fn preflight_signature(tx: &Transaction) -> TransactionResult {
    let single = !tx.common.signing_pub_key.is_empty();
    let multi = !tx.common.signers.is_empty();
    match (single, multi) {
        (true, true) | (false, false) => TransactionResult::temBAD_SIGNATURE,
        (true, false) => {
            let Ok(public_key) = PublicKey::from_bytes(&tx.common.signing_pub_key) else {
                return TransactionResult::temBAD_SIGNATURE;
            };
            let Ok(signature) = Signature::from_bytes(&public_key, &tx.common.txn_signature)
            else {
                return TransactionResult::temBAD_SIGNATURE;
            };
            let Ok(payload) = tx.sign_bytes(SigningMode::SingleSign) else {
                return TransactionResult::temBAD_SIGNATURE;
            };
            if public_key.verify(&payload, &signature).is_err() {
                return TransactionResult::temBAD_SIGNATURE;
            }
            TransactionResult::tesSUCCESS
        }
        (false, true) => {
            // signers must be unique and ascending by account id, and may
            // not include the transaction's own account
            let mut previous: Option<AccountId> = None;
            for signer in &tx.common.signers {
                if signer.account == tx.common.account {
                    return TransactionResult::temBAD_SIGNER;
                }
                if let Some(previous) = previous {
                    if signer.account <= previous {
                        return TransactionResult::temBAD_SIGNER;
                    }
                }
                previous = Some(signer.account);

                let Ok(public_key) = PublicKey::from_bytes(&signer.signing_pub_key) else {
                    return TransactionResult::temBAD_SIGNATURE;
                };
                let Ok(signature) = Signature::from_bytes(&public_key, &signer.txn_signature)
                else {
                    return TransactionResult::temBAD_SIGNATURE;
                };
                let Ok(payload) = tx.sign_bytes(SigningMode::MultiSign(signer.account)) else {
                    return TransactionResult::temBAD_SIGNATURE;
                };
                if public_key.verify(&payload, &signature).is_err() {
                    return TransactionResult::temBAD_SIGNATURE;
                }
            }
            TransactionResult::tesSUCCESS
        }
    }
}

/// Authority checks against the ledger: the signing key must be the
/// account's master or regular key, or the signer set must meet the
/// account's signer-list quorum.
pub fn preclaim_signing_authority(view: &dyn ReadView, tx: &Transaction) -> TransactionResult {
    let account = tx.common.account;
    let Some(root) = account_root(view, &account) else {
        return TransactionResult::terNO_ACCOUNT;
    };

    if !tx.common.signers.is_empty() {
        if !view.header().features.is_enabled(Feature::MultiSign) {
            return TransactionResult::temDISABLED;
        }
        let Some(LedgerEntry::SignerList(list)) = view.get(&Keylet::signer_list(&account).key)
        else {
            return TransactionResult::tefNOT_MULTI_SIGNING;
        };
        return check_quorum(&list, tx);
    }

    // single signature: bind the key to the account
    let Ok(public_key) = PublicKey::from_bytes(&tx.common.signing_pub_key) else {
        return TransactionResult::tefBAD_AUTH;
    };
    let signing_account = AccountId::from_public_key(&public_key);
    if signing_account == account {
        if root.has_flag(account_flags::LSF_DISABLE_MASTER) {
            return TransactionResult::tefMASTER_DISABLED;
        }
        return TransactionResult::tesSUCCESS;
    }
    if root.regular_key == Some(signing_account) {
        return TransactionResult::tesSUCCESS;
    }
    TransactionResult::tefBAD_AUTH
}

fn check_quorum(list: &SignerList, tx: &Transaction) -> TransactionResult {
    let mut weight: u64 = 0;
    for signer in &tx.common.signers {
        let Some(entry) = list
            .signer_entries
            .iter()
            .find(|entry| entry.account == signer.account)
        else {
            // an account outside the list contributed a signature
            return TransactionResult::tefBAD_SIGNATURE;
        };
        // the signer must have signed with its own master key; regular
        // keys of signers are resolved by their account id derivation
        let Ok(public_key) = PublicKey::from_bytes(&signer.signing_pub_key) else {
            return TransactionResult::tefBAD_SIGNATURE;
        };
        if AccountId::from_public_key(&public_key) != signer.account {
            return TransactionResult::tefBAD_SIGNATURE;
        }
        weight += entry.weight as u64;
    }
    if weight < list.signer_quorum as u64 {
        debug!(
            weight,
            quorum = list.signer_quorum,
            "multisig quorum not met"
        );
        return TransactionResult::tefBAD_QUORUM;
    }
    TransactionResult::tesSUCCESS
}
