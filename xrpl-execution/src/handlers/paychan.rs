//! PaymentChannelCreate, PaymentChannelFund and PaymentChannelClaim.

use crate::common::{
    account_root, add_owned_entry, adjust_xrp_balance, remove_owned_entry, spendable_xrp,
    ApplyContext,
};
use tracing::debug;
use xrpl_hash::HashPrefix;
use xrpl_ledger::{ReadView, WriteView};
use xrpl_models::amount::Amount;
use xrpl_models::entry::{account_flags, LedgerEntry, PayChannel};
use xrpl_models::features::Feature;
use xrpl_models::keylet::Keylet;
use xrpl_models::result::TransactionResult;
use xrpl_models::transaction::{
    tx_flags, PaymentChannelClaim, PaymentChannelCreate, PaymentChannelFund, Transaction,
};
use xrpl_signature::{PublicKey, Signature};

fn native_positive(amount: &Amount) -> Result<i64, TransactionResult> {
    match amount {
        Amount::Xrp(xrp) if !xrp.is_negative() && !xrp.is_zero() => Ok(xrp.drops()),
        Amount::Xrp(_) => Err(TransactionResult::temBAD_AMOUNT),
        Amount::Iou(_) => Err(TransactionResult::temBAD_AMOUNT),
    }
}

fn valid_channel_key(public_key: &[u8]) -> bool {
    matches!(public_key.first(), Some(0x02) | Some(0x03) | Some(0xED))
        && PublicKey::from_bytes(public_key).is_ok()
}

/// The claim authorization payload: CLM prefix, channel id, authorized
/// drops.
fn claim_message(channel: &xrpl_hash::Hash, drops: u64) -> Vec<u8> {
    let mut message = HashPrefix::PaymentChannelClaim.to_bytes().to_vec();
    message.extend_from_slice(channel.to_bytes());
    message.extend_from_slice(&drops.to_be_bytes());
    message
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

pub fn preflight_create(tx: &Transaction, create: &PaymentChannelCreate) -> TransactionResult {
    if tx.common.flags & !tx_flags::TF_UNIVERSAL_MASK != 0 {
        return TransactionResult::temINVALID_FLAG;
    }
    if let Err(result) = native_positive(&create.amount) {
        return result;
    }
    if create.destination == tx.common.account {
        return TransactionResult::temDST_IS_SRC;
    }
    if !valid_channel_key(&create.public_key) {
        return TransactionResult::temMALFORMED;
    }
    TransactionResult::tesSUCCESS
}

pub fn preclaim_create(
    view: &dyn ReadView,
    tx: &Transaction,
    create: &PaymentChannelCreate,
) -> TransactionResult {
    if view.header().features.is_enabled(Feature::FixPayChanCancelAfter) {
        if let Some(cancel_after) = create.cancel_after {
            if cancel_after <= view.header().parent_close_time {
                return TransactionResult::tecEXPIRED;
            }
        }
    }
    let Some(destination) = account_root(view, &create.destination) else {
        return TransactionResult::tecNO_DST;
    };
    if destination.has_flag(account_flags::LSF_DISALLOW_INCOMING_PAYCHAN) {
        return TransactionResult::tecNO_PERMISSION;
    }
    if destination.has_flag(account_flags::LSF_REQUIRE_DEST_TAG) && create.destination_tag.is_none()
    {
        return TransactionResult::tecDST_TAG_NEEDED;
    }
    TransactionResult::tesSUCCESS
}

pub fn apply_create(context: &mut ApplyContext, create: &PaymentChannelCreate) -> TransactionResult {
    let account = context.account();
    // native_positive was checked in preflight
    let drops = native_positive(&create.amount).unwrap_or(0);

    let Some(root) = account_root(context.view, &account) else {
        return TransactionResult::tecINTERNAL;
    };
    // the locked amount must come out of spendable funds, above the
    // reserve including the channel's own unit
    let reserve_after = context.view.header().reserve(root.owner_count + 1).drops();
    if root.balance.drops() < reserve_after {
        return TransactionResult::tecINSUFFICIENT_RESERVE;
    }
    if root.balance.drops() - reserve_after < drops {
        return TransactionResult::tecUNFUNDED;
    }

    let sequence = context
        .tx
        .common
        .ticket_sequence
        .unwrap_or(context.tx.common.sequence);
    let keylet = Keylet::pay_channel(&account, &create.destination, sequence);
    let channel = PayChannel {
        account,
        destination: create.destination,
        amount: xrpl_models::amount::XrpAmount::from_drops(drops)
            .unwrap_or_else(|_| xrpl_models::amount::XrpAmount::zero()),
        balance: xrpl_models::amount::XrpAmount::zero(),
        public_key: create.public_key.clone(),
        settle_delay: create.settle_delay,
        owner_node: 0,
        expiration: None,
        cancel_after: create.cancel_after,
        destination_tag: create.destination_tag,
    };
    match add_owned_entry(
        context.view,
        &account,
        keylet.key,
        LedgerEntry::PayChannel(channel.clone()),
        1,
    ) {
        Ok(page) => {
            let mut channel = channel;
            channel.owner_node = page;
            context
                .view
                .update(keylet.key, LedgerEntry::PayChannel(channel));
        }
        Err(result) => return result,
    }
    if let Err(result) = adjust_xrp_balance(context.view, &account, -drops) {
        return result;
    }
    TransactionResult::tesSUCCESS
}

// ---------------------------------------------------------------------------
// Fund
// ---------------------------------------------------------------------------

pub fn preflight_fund(tx: &Transaction, fund: &PaymentChannelFund) -> TransactionResult {
    if tx.common.flags & !tx_flags::TF_UNIVERSAL_MASK != 0 {
        return TransactionResult::temINVALID_FLAG;
    }
    if let Err(result) = native_positive(&fund.amount) {
        return result;
    }
    TransactionResult::tesSUCCESS
}

pub fn preclaim_fund(
    view: &dyn ReadView,
    tx: &Transaction,
    fund: &PaymentChannelFund,
) -> TransactionResult {
    let Some(LedgerEntry::PayChannel(channel)) = view.get(&fund.channel) else {
        return TransactionResult::tecNO_TARGET;
    };
    if channel.account != tx.common.account {
        return TransactionResult::tecNO_PERMISSION;
    }
    let close_time = view.header().parent_close_time;
    if channel
        .cancel_after
        .map_or(false, |cancel_after| cancel_after <= close_time)
        || channel
            .expiration
            .map_or(false, |expiration| expiration <= close_time)
    {
        return TransactionResult::tecEXPIRED;
    }
    if let Some(expiration) = fund.expiration {
        // the owner may only move expiration beyond the settle delay
        if expiration < close_time.saturating_add(channel.settle_delay) {
            return TransactionResult::temBAD_EXPIRATION;
        }
    }
    TransactionResult::tesSUCCESS
}

pub fn apply_fund(context: &mut ApplyContext, fund: &PaymentChannelFund) -> TransactionResult {
    let account = context.account();
    let drops = native_positive(&fund.amount).unwrap_or(0);
    let Some(LedgerEntry::PayChannel(mut channel)) = context.view.get(&fund.channel) else {
        return TransactionResult::tecINTERNAL;
    };

    let Some(root) = account_root(context.view, &account) else {
        return TransactionResult::tecINTERNAL;
    };
    if spendable_xrp(context.view, &root) < drops {
        return TransactionResult::tecUNFUNDED;
    }

    let Some(new_amount) = channel.amount.checked_add(
        xrpl_models::amount::XrpAmount::from_drops(drops)
            .unwrap_or_else(|_| xrpl_models::amount::XrpAmount::zero()),
    ) else {
        return TransactionResult::tecINTERNAL;
    };
    channel.amount = new_amount;
    if let Some(expiration) = fund.expiration {
        channel.expiration = Some(expiration);
    }
    context
        .view
        .update(fund.channel, LedgerEntry::PayChannel(channel));
    if let Err(result) = adjust_xrp_balance(context.view, &account, -drops) {
        return result;
    }
    TransactionResult::tesSUCCESS
}

// ---------------------------------------------------------------------------
// Claim
// ---------------------------------------------------------------------------

pub fn preflight_claim(tx: &Transaction, claim: &PaymentChannelClaim) -> TransactionResult {
    if tx.common.flags & !tx_flags::TF_PAYCHAN_CLAIM_MASK != 0 {
        return TransactionResult::temINVALID_FLAG;
    }
    let flags = tx.common.flags;
    if flags & tx_flags::TF_CLOSE != 0 && flags & tx_flags::TF_RENEW != 0 {
        return TransactionResult::temMALFORMED;
    }
    let balance = match &claim.balance {
        Some(balance) => match native_positive(balance) {
            Ok(drops) => Some(drops),
            Err(result) => return result,
        },
        None => None,
    };
    let amount = match &claim.amount {
        Some(amount) => match native_positive(amount) {
            Ok(drops) => Some(drops),
            Err(result) => return result,
        },
        None => None,
    };
    if let (Some(balance), Some(amount)) = (balance, amount) {
        if balance > amount {
            return TransactionResult::temBAD_AMOUNT;
        }
    }
    if claim.signature.is_some() {
        // a signed claim needs all three authorization fields
        if claim.public_key.is_none() || balance.is_none() || amount.is_none() {
            return TransactionResult::temMALFORMED;
        }
        let Some(public_key) = &claim.public_key else {
            return TransactionResult::temMALFORMED;
        };
        if !valid_channel_key(public_key) {
            return TransactionResult::temMALFORMED;
        }
    }
    TransactionResult::tesSUCCESS
}

pub fn preclaim_claim(
    view: &dyn ReadView,
    tx: &Transaction,
    claim: &PaymentChannelClaim,
) -> TransactionResult {
    let Some(LedgerEntry::PayChannel(channel)) = view.get(&claim.channel) else {
        return TransactionResult::tecNO_TARGET;
    };
    let account = tx.common.account;
    if account != channel.account && account != channel.destination {
        return TransactionResult::tecNO_PERMISSION;
    }

    if let Some(balance) = &claim.balance {
        // only a claim carrying funds needs the authorization check; the
        // source needs no signature to authorize its own channel
        if account == channel.destination {
            let (Some(signature), Some(public_key), Some(amount)) =
                (&claim.signature, &claim.public_key, &claim.amount)
            else {
                return TransactionResult::temMALFORMED;
            };
            if *public_key != channel.public_key {
                return TransactionResult::tecNO_PERMISSION;
            }
            let Ok(authorized_drops) = native_positive(amount) else {
                return TransactionResult::temBAD_AMOUNT;
            };
            let Ok(key) = PublicKey::from_bytes(public_key) else {
                return TransactionResult::temMALFORMED;
            };
            let Ok(parsed_signature) = Signature::from_bytes(&key, signature) else {
                return TransactionResult::temBAD_SIGNATURE;
            };
            let message = claim_message(&claim.channel, authorized_drops as u64);
            if key.verify(&message, &parsed_signature).is_err() {
                return TransactionResult::temBAD_SIGNATURE;
            }
        }

        let Ok(claimed) = native_positive(balance) else {
            return TransactionResult::temBAD_AMOUNT;
        };
        if let Some(amount) = &claim.amount {
            let Ok(authorized) = native_positive(amount) else {
                return TransactionResult::temBAD_AMOUNT;
            };
            if claimed > authorized || authorized > channel.amount.drops() {
                return TransactionResult::tecUNFUNDED_PAYMENT;
            }
        }
        if claimed <= channel.balance.drops() {
            // nothing left to deliver under this authorization
            return TransactionResult::tecUNFUNDED_PAYMENT;
        }
        if claimed > channel.amount.drops() {
            return TransactionResult::tecUNFUNDED_PAYMENT;
        }
    }
    TransactionResult::tesSUCCESS
}

fn close_channel(
    context: &mut ApplyContext,
    channel_key: &xrpl_hash::Hash,
    channel: &PayChannel,
) -> TransactionResult {
    let remaining = channel.amount.drops() - channel.balance.drops();
    if remaining > 0 {
        if let Err(result) = adjust_xrp_balance(context.view, &channel.account, remaining) {
            return result;
        }
    }
    match remove_owned_entry(
        context.view,
        &channel.account,
        channel_key,
        channel.owner_node,
        1,
    ) {
        Ok(()) => TransactionResult::tesSUCCESS,
        Err(result) => result,
    }
}

pub fn apply_claim(context: &mut ApplyContext, claim: &PaymentChannelClaim) -> TransactionResult {
    let account = context.account();
    let Some(LedgerEntry::PayChannel(mut channel)) = context.view.get(&claim.channel) else {
        return TransactionResult::tecINTERNAL;
    };
    let close_time = context.parent_close_time();

    // a channel past its expiration closes instead of paying
    let expired = channel
        .cancel_after
        .map_or(false, |cancel_after| cancel_after <= close_time)
        || channel
            .expiration
            .map_or(false, |expiration| expiration <= close_time);
    if expired {
        debug!("claim on expired channel closes it");
        return close_channel(context, &claim.channel, &channel);
    }

    if let Some(balance) = &claim.balance {
        let claimed = match balance {
            Amount::Xrp(xrp) => xrp.drops(),
            Amount::Iou(_) => return TransactionResult::tecINTERNAL,
        };
        let payout = claimed - channel.balance.drops();
        if payout <= 0 {
            return TransactionResult::tecUNFUNDED_PAYMENT;
        }

        // destination deposit authorization applies to channel payouts
        let Some(destination_root) = account_root(context.view, &channel.destination) else {
            return TransactionResult::tecNO_DST;
        };
        if context
            .view
            .header()
            .features
            .is_enabled(Feature::DepositAuth)
            && destination_root.has_flag(account_flags::LSF_DEPOSIT_AUTH)
            && account != channel.destination
        {
            let preauth = Keylet::deposit_preauth(&channel.destination, &account);
            if !context.view.exists(&preauth.key) {
                return TransactionResult::tecNO_PERMISSION;
            }
        }

        if let Err(result) = adjust_xrp_balance(context.view, &channel.destination, payout) {
            return result;
        }
        channel.balance = match xrpl_models::amount::XrpAmount::from_drops(claimed) {
            Ok(balance) => balance,
            Err(_) => return TransactionResult::tecINTERNAL,
        };
    }

    let flags = context.tx.common.flags;
    if flags & tx_flags::TF_CLOSE != 0 {
        let drained = channel.balance.drops() >= channel.amount.drops();
        if account == channel.destination || drained {
            // the payee may always close; the payer may close a drained
            // channel at once
            return close_channel(context, &claim.channel, &channel);
        }
        // the payer starts the settle-delay countdown
        let countdown = close_time.saturating_add(channel.settle_delay);
        channel.expiration = Some(
            channel
                .expiration
                .map_or(countdown, |expiration| expiration.min(countdown)),
        );
    }
    if flags & tx_flags::TF_RENEW != 0 && account == channel.account {
        channel.expiration = None;
    }

    context
        .view
        .update(claim.channel, LedgerEntry::PayChannel(channel));
    TransactionResult::tesSUCCESS
}
