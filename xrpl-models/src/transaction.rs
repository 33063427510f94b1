//! Transactions: the signed envelope, the closed set of variants, canonical
//! serialization and total deserialization.
//!
//! The envelope fields shared by every type live in [`TransactionCommon`];
//! variant-specific fields live in per-case structs under
//! [`TransactionKind`]. Serialization has three modes: the full form (what
//! is hashed into the transaction id), the single-signing form (STX prefix,
//! signature fields omitted) and the multi-signing form (SMT prefix plus
//! the signer's account appended).

use crate::account::{AccountId, AccountIdDeserializer};
use crate::amount::{Amount, AmountDeserializer, XrpAmount};
use crate::currency::{Currency, CURRENCY_SIZE_BYTES};
use crate::entry::SignerEntry;
use crate::error::ModelsError;
use crate::paths::{PathSet, PathSetDeserializer, PathSetSerializer};
use crate::sfield;
use crate::writer::CanonicalWriter;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use xrpl_hash::{Hash, HashPrefix};
use xrpl_serialization::{
    DeserializeError, Deserializer, FieldHeader, FieldHeaderDeserializer, Serializer,
    U16BeDeserializer, U32BeDeserializer, U64BeDeserializer, U8Deserializer, VecU8Deserializer,
};

/// Transaction type codes.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, IntoPrimitive, TryFromPrimitive,
    Serialize, Deserialize,
)]
#[repr(u16)]
pub enum TransactionType {
    /// Move value.
    Payment = 0,
    /// Adjust account settings.
    AccountSet = 3,
    /// Assign or remove the regular key.
    SetRegularKey = 5,
    /// Place an offer.
    OfferCreate = 7,
    /// Cancel an offer.
    OfferCancel = 8,
    /// Mint tickets.
    TicketCreate = 10,
    /// Install, replace or remove a signer list.
    SignerListSet = 12,
    /// Open a payment channel.
    PaymentChannelCreate = 13,
    /// Add funds to a channel.
    PaymentChannelFund = 14,
    /// Claim from or close a channel.
    PaymentChannelClaim = 15,
    /// Grant or revoke deposit preauthorization.
    DepositPreauth = 19,
    /// Create, modify or delete a trust line.
    TrustSet = 20,
    /// Delete the account.
    AccountDelete = 21,
    /// Create or update a price oracle.
    OracleSet = 51,
    /// Delete a price oracle.
    OracleDelete = 52,
}

/// Universal and per-type transaction flags.
pub mod tx_flags {
    /// Require the fully-canonical signature form.
    pub const TF_FULLY_CANONICAL_SIG: u32 = 0x8000_0000;
    /// Mask of bits every transaction accepts.
    pub const TF_UNIVERSAL_MASK: u32 = TF_FULLY_CANONICAL_SIG;

    /// Payment: skip the implicit direct strand.
    pub const TF_NO_RIPPLE_DIRECT: u32 = 0x0001_0000;
    /// Payment: deliver what the paths allow, at least DeliverMin.
    pub const TF_PARTIAL_PAYMENT: u32 = 0x0002_0000;
    /// Payment: cap the worst quality consumed.
    pub const TF_LIMIT_QUALITY: u32 = 0x0004_0000;
    /// Mask of legal Payment flags.
    pub const TF_PAYMENT_MASK: u32 =
        TF_UNIVERSAL_MASK | TF_NO_RIPPLE_DIRECT | TF_PARTIAL_PAYMENT | TF_LIMIT_QUALITY;

    /// OfferCreate: do not consume offers of equal quality.
    pub const TF_PASSIVE: u32 = 0x0001_0000;
    /// OfferCreate: cross what is available now, never place the rest.
    pub const TF_IMMEDIATE_OR_CANCEL: u32 = 0x0002_0000;
    /// OfferCreate: cross fully or do nothing.
    pub const TF_FILL_OR_KILL: u32 = 0x0004_0000;
    /// OfferCreate: treat taker-gets as the fixed side.
    pub const TF_SELL: u32 = 0x0008_0000;
    /// Mask of legal OfferCreate flags.
    pub const TF_OFFER_CREATE_MASK: u32 =
        TF_UNIVERSAL_MASK | TF_PASSIVE | TF_IMMEDIATE_OR_CANCEL | TF_FILL_OR_KILL | TF_SELL;

    /// TrustSet: authorize the counterparty.
    pub const TF_SET_F_AUTH: u32 = 0x0001_0000;
    /// TrustSet: set NoRipple on this side.
    pub const TF_SET_NO_RIPPLE: u32 = 0x0002_0000;
    /// TrustSet: clear NoRipple on this side.
    pub const TF_CLEAR_NO_RIPPLE: u32 = 0x0004_0000;
    /// TrustSet: freeze this side.
    pub const TF_SET_FREEZE: u32 = 0x0010_0000;
    /// TrustSet: unfreeze this side.
    pub const TF_CLEAR_FREEZE: u32 = 0x0020_0000;
    /// Mask of legal TrustSet flags.
    pub const TF_TRUST_SET_MASK: u32 = TF_UNIVERSAL_MASK
        | TF_SET_F_AUTH
        | TF_SET_NO_RIPPLE
        | TF_CLEAR_NO_RIPPLE
        | TF_SET_FREEZE
        | TF_CLEAR_FREEZE;

    /// PaymentChannelClaim: re-arm the settle delay.
    pub const TF_RENEW: u32 = 0x0001_0000;
    /// PaymentChannelClaim: request channel close.
    pub const TF_CLOSE: u32 = 0x0002_0000;
    /// Mask of legal PaymentChannelClaim flags.
    pub const TF_PAYCHAN_CLAIM_MASK: u32 = TF_UNIVERSAL_MASK | TF_RENEW | TF_CLOSE;
}

/// AccountSet SetFlag/ClearFlag values.
pub mod account_set_flags {
    /// Require destination tags on incoming payments.
    pub const ASF_REQUIRE_DEST: u32 = 1;
    /// Require issuer authorization of trust lines.
    pub const ASF_REQUIRE_AUTH: u32 = 2;
    /// Discourage incoming XRP.
    pub const ASF_DISALLOW_XRP: u32 = 3;
    /// Disable the master key.
    pub const ASF_DISABLE_MASTER: u32 = 4;
    /// Track the account's last transaction id.
    pub const ASF_ACCOUNT_TXN_ID: u32 = 5;
    /// Permanently give up freezing.
    pub const ASF_NO_FREEZE: u32 = 6;
    /// Freeze all lines.
    pub const ASF_GLOBAL_FREEZE: u32 = 7;
    /// Make new lines ripple by default.
    pub const ASF_DEFAULT_RIPPLE: u32 = 8;
    /// Require preauthorization to deposit.
    pub const ASF_DEPOSIT_AUTH: u32 = 9;
}

/// An attached memo.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Memo {
    /// Memo type blob.
    pub memo_type: Option<Vec<u8>>,
    /// Memo payload blob.
    pub memo_data: Option<Vec<u8>>,
    /// Memo format blob.
    pub memo_format: Option<Vec<u8>>,
}

/// One signature of a multisigned transaction.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Signer {
    /// The signing account.
    pub account: AccountId,
    /// The signer's public key.
    pub signing_pub_key: Vec<u8>,
    /// The signature over the SMT-framed payload.
    pub txn_signature: Vec<u8>,
}

/// Fields shared by every transaction.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TransactionCommon {
    /// Sending account.
    pub account: AccountId,
    /// Fee in drops.
    pub fee: XrpAmount,
    /// Sequence number; zero when a ticket is used instead.
    pub sequence: u32,
    /// Ticket consumed in place of the sequence.
    pub ticket_sequence: Option<u32>,
    /// Signing public key; empty for multisigned transactions.
    pub signing_pub_key: Vec<u8>,
    /// Signature; empty for multisigned transactions.
    pub txn_signature: Vec<u8>,
    /// Multisig signatures, sorted ascending by signer account.
    pub signers: Vec<Signer>,
    /// Transaction flags.
    pub flags: u32,
    /// Highest ledger sequence this transaction may apply in.
    pub last_ledger_sequence: Option<u32>,
    /// Required hash of the account's previous transaction.
    pub account_txn_id: Option<Hash>,
    /// Arbitrary source tag.
    pub source_tag: Option<u32>,
    /// Attached memos.
    pub memos: Vec<Memo>,
}

impl TransactionCommon {
    /// A minimal unsigned envelope, used by builders and tests.
    pub fn new(account: AccountId, fee: XrpAmount, sequence: u32) -> Self {
        TransactionCommon {
            account,
            fee,
            sequence,
            ticket_sequence: None,
            signing_pub_key: Vec::new(),
            txn_signature: Vec::new(),
            signers: Vec::new(),
            flags: 0,
            last_ledger_sequence: None,
            account_txn_id: None,
            source_tag: None,
            memos: Vec::new(),
        }
    }
}

/// One price pair inside an OracleSet.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PriceDataEntry {
    /// Base asset code.
    pub base_asset: Currency,
    /// Quote asset code.
    pub quote_asset: Currency,
    /// Scaled price; absent to delete the pair.
    pub asset_price: Option<u64>,
    /// Decimal scale.
    pub scale: Option<u8>,
}

impl PriceDataEntry {
    /// The pair identity.
    pub fn pair(&self) -> (Currency, Currency) {
        (self.base_asset, self.quote_asset)
    }
}

/// The type-specific half of a transaction.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Move value from the sender to a destination.
    Payment(Payment),
    /// Adjust account settings.
    AccountSet(AccountSet),
    /// Assign or remove the regular key.
    SetRegularKey(SetRegularKey),
    /// Place an offer, crossing the book first.
    OfferCreate(OfferCreate),
    /// Cancel an offer.
    OfferCancel(OfferCancel),
    /// Mint tickets.
    TicketCreate(TicketCreate),
    /// Install, replace or remove the signer list.
    SignerListSet(SignerListSet),
    /// Open a payment channel.
    PaymentChannelCreate(PaymentChannelCreate),
    /// Add funds or extend a channel.
    PaymentChannelFund(PaymentChannelFund),
    /// Claim from or close a channel.
    PaymentChannelClaim(PaymentChannelClaim),
    /// Grant or revoke deposit preauthorization.
    DepositPreauth(DepositPreauthTx),
    /// Create, modify or delete a trust line.
    TrustSet(TrustSet),
    /// Delete the sending account.
    AccountDelete(AccountDelete),
    /// Create or update a price oracle.
    OracleSet(OracleSet),
    /// Delete a price oracle.
    OracleDelete(OracleDelete),
}

/// Payment fields.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Payment {
    /// Receiving account.
    pub destination: AccountId,
    /// Amount to deliver.
    pub amount: Amount,
    /// Most the sender will spend.
    pub send_max: Option<Amount>,
    /// Least a partial payment must deliver.
    pub deliver_min: Option<Amount>,
    /// Destination tag.
    pub destination_tag: Option<u32>,
    /// Invoice id carried opaquely.
    pub invoice_id: Option<Hash>,
    /// Explicit paths.
    pub paths: PathSet,
}

/// AccountSet fields.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct AccountSet {
    /// asf flag to set.
    pub set_flag: Option<u32>,
    /// asf flag to clear.
    pub clear_flag: Option<u32>,
    /// New transfer rate; 0 clears it.
    pub transfer_rate: Option<u32>,
    /// New tick size; 0 clears it.
    pub tick_size: Option<u8>,
}

/// SetRegularKey fields.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct SetRegularKey {
    /// New regular key; absent removes the current one.
    pub regular_key: Option<AccountId>,
}

/// OfferCreate fields.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct OfferCreate {
    /// What the taker must pay.
    pub taker_pays: Amount,
    /// What the taker receives.
    pub taker_gets: Amount,
    /// Optional expiration, seconds since the ledger epoch.
    pub expiration: Option<u32>,
    /// Offer of the same account to cancel first.
    pub offer_sequence: Option<u32>,
}

/// OfferCancel fields.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct OfferCancel {
    /// Sequence of the offer to cancel.
    pub offer_sequence: u32,
}

/// TicketCreate fields.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TicketCreate {
    /// How many tickets to mint (1..=250).
    pub ticket_count: u32,
}

/// SignerListSet fields.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SignerListSet {
    /// Required weight; zero removes the list.
    pub signer_quorum: u32,
    /// The signers.
    pub signer_entries: Vec<SignerEntry>,
}

/// PaymentChannelCreate fields.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PaymentChannelCreate {
    /// Payee.
    pub destination: AccountId,
    /// XRP to lock into the channel.
    pub amount: Amount,
    /// Seconds the source must wait to close while funds remain.
    pub settle_delay: u32,
    /// Key that will sign claims.
    pub public_key: Vec<u8>,
    /// Immutable expiration.
    pub cancel_after: Option<u32>,
    /// Destination tag.
    pub destination_tag: Option<u32>,
}

/// PaymentChannelFund fields.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PaymentChannelFund {
    /// Channel to fund.
    pub channel: Hash,
    /// XRP to add.
    pub amount: Amount,
    /// New mutable expiration.
    pub expiration: Option<u32>,
}

/// PaymentChannelClaim fields.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PaymentChannelClaim {
    /// Channel to claim from.
    pub channel: Hash,
    /// Total the destination is owed after this claim.
    pub balance: Option<Amount>,
    /// Authorized total, signed by the channel key.
    pub amount: Option<Amount>,
    /// Claim authorization signature.
    pub signature: Option<Vec<u8>>,
    /// The channel's public key.
    pub public_key: Option<Vec<u8>>,
}

/// DepositPreauth transaction fields.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct DepositPreauthTx {
    /// Account to preauthorize.
    pub authorize: Option<AccountId>,
    /// Account to un-preauthorize.
    pub unauthorize: Option<AccountId>,
}

/// TrustSet fields.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TrustSet {
    /// The limit towards the issuer named in the amount.
    pub limit_amount: Amount,
    /// Quality applied to incoming amounts, billionths.
    pub quality_in: Option<u32>,
    /// Quality applied to outgoing amounts, billionths.
    pub quality_out: Option<u32>,
}

/// AccountDelete fields.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct AccountDelete {
    /// Account receiving the remaining balance.
    pub destination: AccountId,
    /// Destination tag.
    pub destination_tag: Option<u32>,
}

/// OracleSet fields.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct OracleSet {
    /// Document id scoping the oracle under its owner.
    pub oracle_document_id: u32,
    /// Provider, required on create, immutable afterwards.
    pub provider: Option<Vec<u8>>,
    /// Optional URI.
    pub uri: Option<Vec<u8>>,
    /// Asset class, required on create, immutable afterwards.
    pub asset_class: Option<Vec<u8>>,
    /// Update time, seconds since the ledger epoch.
    pub last_update_time: u32,
    /// Pairs to set or delete.
    pub price_data_series: Vec<PriceDataEntry>,
}

/// OracleDelete fields.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct OracleDelete {
    /// Document id of the oracle to delete.
    pub oracle_document_id: u32,
}

/// How to frame a serialization.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SigningMode {
    /// Everything, signature fields included. Hashed into the tx id.
    Full,
    /// STX-prefixed single-signature payload.
    SingleSign,
    /// SMT-prefixed payload; the signer's account id is appended.
    MultiSign(AccountId),
}

/// A complete transaction.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Transaction {
    /// The shared envelope.
    pub common: TransactionCommon,
    /// The type-specific fields.
    pub kind: TransactionKind,
}

impl Transaction {
    /// The transaction's type code.
    pub fn transaction_type(&self) -> TransactionType {
        match &self.kind {
            TransactionKind::Payment(_) => TransactionType::Payment,
            TransactionKind::AccountSet(_) => TransactionType::AccountSet,
            TransactionKind::SetRegularKey(_) => TransactionType::SetRegularKey,
            TransactionKind::OfferCreate(_) => TransactionType::OfferCreate,
            TransactionKind::OfferCancel(_) => TransactionType::OfferCancel,
            TransactionKind::TicketCreate(_) => TransactionType::TicketCreate,
            TransactionKind::SignerListSet(_) => TransactionType::SignerListSet,
            TransactionKind::PaymentChannelCreate(_) => TransactionType::PaymentChannelCreate,
            TransactionKind::PaymentChannelFund(_) => TransactionType::PaymentChannelFund,
            TransactionKind::PaymentChannelClaim(_) => TransactionType::PaymentChannelClaim,
            TransactionKind::DepositPreauth(_) => TransactionType::DepositPreauth,
            TransactionKind::TrustSet(_) => TransactionType::TrustSet,
            TransactionKind::AccountDelete(_) => TransactionType::AccountDelete,
            TransactionKind::OracleSet(_) => TransactionType::OracleSet,
            TransactionKind::OracleDelete(_) => TransactionType::OracleDelete,
        }
    }

    /// Canonical serialization in the given mode.
    pub fn serialize_canonical(&self, mode: SigningMode) -> Result<Vec<u8>, ModelsError> {
        let mut writer = CanonicalWriter::new();
        let common = &self.common;

        writer.put_u16(
            sfield::TRANSACTION_TYPE,
            u16::from(self.transaction_type()),
        )?;
        writer.put_u32(sfield::FLAGS, common.flags)?;
        writer.put_u32(sfield::SEQUENCE, common.sequence)?;
        writer.put_amount(sfield::FEE, &Amount::Xrp(common.fee))?;
        writer.put_account(sfield::ACCOUNT_FIELD, &common.account)?;
        writer.put_blob(sfield::SIGNING_PUB_KEY, &common.signing_pub_key)?;
        if let Some(ticket_sequence) = common.ticket_sequence {
            writer.put_u32(sfield::TICKET_SEQUENCE, ticket_sequence)?;
        }
        if let Some(last_ledger_sequence) = common.last_ledger_sequence {
            writer.put_u32(sfield::LAST_LEDGER_SEQUENCE, last_ledger_sequence)?;
        }
        if let Some(account_txn_id) = &common.account_txn_id {
            writer.put_hash256(sfield::ACCOUNT_TXN_ID, account_txn_id)?;
        }
        if let Some(source_tag) = common.source_tag {
            writer.put_u32(sfield::SOURCE_TAG, source_tag)?;
        }
        if !common.memos.is_empty() {
            let mut memos = Vec::with_capacity(common.memos.len());
            for memo in &common.memos {
                let mut inner = CanonicalWriter::new();
                if let Some(memo_type) = &memo.memo_type {
                    inner.put_blob(sfield::MEMO_TYPE, memo_type)?;
                }
                if let Some(memo_data) = &memo.memo_data {
                    inner.put_blob(sfield::MEMO_DATA, memo_data)?;
                }
                if let Some(memo_format) = &memo.memo_format {
                    inner.put_blob(sfield::MEMO_FORMAT, memo_format)?;
                }
                memos.push((sfield::MEMO, inner));
            }
            writer.put_array(sfield::MEMOS, memos)?;
        }

        if matches!(mode, SigningMode::Full) {
            if !common.txn_signature.is_empty() {
                writer.put_blob(sfield::TXN_SIGNATURE, &common.txn_signature)?;
            }
            if !common.signers.is_empty() {
                let mut signers = Vec::with_capacity(common.signers.len());
                for signer in &common.signers {
                    let mut inner = CanonicalWriter::new();
                    inner.put_account(sfield::ACCOUNT_FIELD, &signer.account)?;
                    inner.put_blob(sfield::SIGNING_PUB_KEY, &signer.signing_pub_key)?;
                    inner.put_blob(sfield::TXN_SIGNATURE, &signer.txn_signature)?;
                    signers.push((sfield::SIGNER, inner));
                }
                writer.put_array(sfield::SIGNERS, signers)?;
            }
        }

        self.write_kind_fields(&mut writer)?;
        let body = writer.finish()?;

        Ok(match mode {
            SigningMode::Full => body,
            SigningMode::SingleSign => {
                let mut framed = HashPrefix::TxSign.to_bytes().to_vec();
                framed.extend(body);
                framed
            }
            SigningMode::MultiSign(signer) => {
                let mut framed = HashPrefix::TxMultiSign.to_bytes().to_vec();
                framed.extend(body);
                framed.extend_from_slice(signer.to_bytes());
                framed
            }
        })
    }

    fn write_kind_fields(&self, writer: &mut CanonicalWriter) -> Result<(), ModelsError> {
        match &self.kind {
            TransactionKind::Payment(payment) => {
                writer.put_account(sfield::DESTINATION, &payment.destination)?;
                writer.put_amount(sfield::AMOUNT, &payment.amount)?;
                if let Some(send_max) = &payment.send_max {
                    writer.put_amount(sfield::SEND_MAX, send_max)?;
                }
                if let Some(deliver_min) = &payment.deliver_min {
                    writer.put_amount(sfield::DELIVER_MIN, deliver_min)?;
                }
                if let Some(destination_tag) = payment.destination_tag {
                    writer.put_u32(sfield::DESTINATION_TAG, destination_tag)?;
                }
                if let Some(invoice_id) = &payment.invoice_id {
                    writer.put_hash256(sfield::INVOICE_ID, invoice_id)?;
                }
                if !payment.paths.is_empty() {
                    let mut payload = Vec::new();
                    PathSetSerializer::new().serialize(&payment.paths, &mut payload)?;
                    writer.put_raw(sfield::PATHS, payload);
                }
            }
            TransactionKind::AccountSet(account_set) => {
                if let Some(set_flag) = account_set.set_flag {
                    writer.put_u32(sfield::SET_FLAG, set_flag)?;
                }
                if let Some(clear_flag) = account_set.clear_flag {
                    writer.put_u32(sfield::CLEAR_FLAG, clear_flag)?;
                }
                if let Some(transfer_rate) = account_set.transfer_rate {
                    writer.put_u32(sfield::TRANSFER_RATE, transfer_rate)?;
                }
                if let Some(tick_size) = account_set.tick_size {
                    writer.put_u8(sfield::TICK_SIZE, tick_size)?;
                }
            }
            TransactionKind::SetRegularKey(set_regular_key) => {
                if let Some(regular_key) = &set_regular_key.regular_key {
                    writer.put_account(sfield::REGULAR_KEY, regular_key)?;
                }
            }
            TransactionKind::OfferCreate(offer) => {
                writer.put_amount(sfield::TAKER_PAYS, &offer.taker_pays)?;
                writer.put_amount(sfield::TAKER_GETS, &offer.taker_gets)?;
                if let Some(expiration) = offer.expiration {
                    writer.put_u32(sfield::EXPIRATION, expiration)?;
                }
                if let Some(offer_sequence) = offer.offer_sequence {
                    writer.put_u32(sfield::OFFER_SEQUENCE, offer_sequence)?;
                }
            }
            TransactionKind::OfferCancel(cancel) => {
                writer.put_u32(sfield::OFFER_SEQUENCE, cancel.offer_sequence)?;
            }
            TransactionKind::TicketCreate(create) => {
                writer.put_u32(sfield::TICKET_COUNT, create.ticket_count)?;
            }
            TransactionKind::SignerListSet(set) => {
                writer.put_u32(sfield::SIGNER_QUORUM, set.signer_quorum)?;
                if !set.signer_entries.is_empty() {
                    let mut entries = Vec::with_capacity(set.signer_entries.len());
                    for entry in &set.signer_entries {
                        let mut inner = CanonicalWriter::new();
                        inner.put_account(sfield::ACCOUNT_FIELD, &entry.account)?;
                        inner.put_u16(sfield::SIGNER_WEIGHT, entry.weight)?;
                        entries.push((sfield::SIGNER_ENTRY, inner));
                    }
                    writer.put_array(sfield::SIGNER_ENTRIES, entries)?;
                }
            }
            TransactionKind::PaymentChannelCreate(create) => {
                writer.put_account(sfield::DESTINATION, &create.destination)?;
                writer.put_amount(sfield::AMOUNT, &create.amount)?;
                writer.put_u32(sfield::SETTLE_DELAY, create.settle_delay)?;
                writer.put_blob(sfield::PUBLIC_KEY, &create.public_key)?;
                if let Some(cancel_after) = create.cancel_after {
                    writer.put_u32(sfield::CANCEL_AFTER, cancel_after)?;
                }
                if let Some(destination_tag) = create.destination_tag {
                    writer.put_u32(sfield::DESTINATION_TAG, destination_tag)?;
                }
            }
            TransactionKind::PaymentChannelFund(fund) => {
                writer.put_hash256(sfield::CHANNEL, &fund.channel)?;
                writer.put_amount(sfield::AMOUNT, &fund.amount)?;
                if let Some(expiration) = fund.expiration {
                    writer.put_u32(sfield::EXPIRATION, expiration)?;
                }
            }
            TransactionKind::PaymentChannelClaim(claim) => {
                writer.put_hash256(sfield::CHANNEL, &claim.channel)?;
                if let Some(balance) = &claim.balance {
                    writer.put_amount(sfield::BALANCE, balance)?;
                }
                if let Some(amount) = &claim.amount {
                    writer.put_amount(sfield::AMOUNT, amount)?;
                }
                if let Some(signature) = &claim.signature {
                    writer.put_blob(sfield::SIGNATURE, signature)?;
                }
                if let Some(public_key) = &claim.public_key {
                    writer.put_blob(sfield::PUBLIC_KEY, public_key)?;
                }
            }
            TransactionKind::DepositPreauth(preauth) => {
                if let Some(authorize) = &preauth.authorize {
                    writer.put_account(sfield::AUTHORIZE, authorize)?;
                }
                if let Some(unauthorize) = &preauth.unauthorize {
                    writer.put_account(sfield::UNAUTHORIZE, unauthorize)?;
                }
            }
            TransactionKind::TrustSet(trust_set) => {
                writer.put_amount(sfield::LIMIT_AMOUNT, &trust_set.limit_amount)?;
                if let Some(quality_in) = trust_set.quality_in {
                    writer.put_u32(sfield::QUALITY_IN, quality_in)?;
                }
                if let Some(quality_out) = trust_set.quality_out {
                    writer.put_u32(sfield::QUALITY_OUT, quality_out)?;
                }
            }
            TransactionKind::AccountDelete(delete) => {
                writer.put_account(sfield::DESTINATION, &delete.destination)?;
                if let Some(destination_tag) = delete.destination_tag {
                    writer.put_u32(sfield::DESTINATION_TAG, destination_tag)?;
                }
            }
            TransactionKind::OracleSet(set) => {
                writer.put_u32(sfield::ORACLE_DOCUMENT_ID, set.oracle_document_id)?;
                if let Some(provider) = &set.provider {
                    writer.put_blob(sfield::PROVIDER, provider)?;
                }
                if let Some(uri) = &set.uri {
                    writer.put_blob(sfield::URI, uri)?;
                }
                if let Some(asset_class) = &set.asset_class {
                    writer.put_blob(sfield::ASSET_CLASS, asset_class)?;
                }
                writer.put_u32(sfield::LAST_UPDATE_TIME, set.last_update_time)?;
                if !set.price_data_series.is_empty() {
                    let mut series = Vec::with_capacity(set.price_data_series.len());
                    for price in &set.price_data_series {
                        let mut inner = CanonicalWriter::new();
                        inner.put_hash160(sfield::BASE_ASSET, price.base_asset.to_bytes())?;
                        inner.put_hash160(sfield::QUOTE_ASSET, price.quote_asset.to_bytes())?;
                        if let Some(asset_price) = price.asset_price {
                            inner.put_u64(sfield::ASSET_PRICE, asset_price)?;
                        }
                        if let Some(scale) = price.scale {
                            inner.put_u8(sfield::SCALE, scale)?;
                        }
                        series.push((sfield::PRICE_DATA, inner));
                    }
                    writer.put_array(sfield::PRICE_DATA_SERIES, series)?;
                }
            }
            TransactionKind::OracleDelete(delete) => {
                writer.put_u32(sfield::ORACLE_DOCUMENT_ID, delete.oracle_document_id)?;
            }
        }
        Ok(())
    }

    /// The transaction id: SHA-512-Half over the TXN prefix and the full
    /// canonical form.
    pub fn hash(&self) -> Result<Hash, ModelsError> {
        let bytes = self.serialize_canonical(SigningMode::Full)?;
        Ok(Hash::compute_from_prefixed(
            HashPrefix::TransactionId,
            &[&bytes],
        ))
    }

    /// The bytes a signer must sign for the given mode.
    pub fn sign_bytes(&self, mode: SigningMode) -> Result<Vec<u8>, ModelsError> {
        match mode {
            SigningMode::Full => Err(ModelsError::Malformed(
                "the full form is hashed, not signed".to_string(),
            )),
            _ => self.serialize_canonical(mode),
        }
    }

    /// Parse a transaction from its full canonical form. Fields must be
    /// canonically ordered; unknown fields, truncation and non-canonical
    /// amounts are fatal.
    pub fn deserialize(buffer: &[u8]) -> Result<Transaction, ModelsError> {
        let (rest, tx) = parse_transaction::<DeserializeError>(buffer)
            .map_err(|err| ModelsError::Malformed(err.to_string()))?;
        if !rest.is_empty() {
            return Err(ModelsError::Malformed(format!(
                "{} trailing bytes after transaction",
                rest.len()
            )));
        }
        Ok(tx)
    }
}

// ---------------------------------------------------------------------------
// Deserialization
// ---------------------------------------------------------------------------

use nom::error::{ContextError, ParseError};
use nom::IResult;
use std::collections::BTreeMap;

/// Raw decoded value of one field.
enum FieldValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Hash256(Hash),
    Amount(Amount),
    Blob(Vec<u8>),
    Account(AccountId),
    Hash160([u8; 20]),
    Paths(PathSet),
    Signers(Vec<Signer>),
    SignerEntries(Vec<SignerEntry>),
    Memos(Vec<Memo>),
    PriceSeries(Vec<PriceDataEntry>),
}

struct FieldBag {
    fields: BTreeMap<FieldHeader, FieldValue>,
}

impl FieldBag {
    fn take_u8(&mut self, header: FieldHeader) -> Option<u8> {
        match self.fields.remove(&header) {
            Some(FieldValue::U8(v)) => Some(v),
            _ => None,
        }
    }
    fn take_u16(&mut self, header: FieldHeader) -> Option<u16> {
        match self.fields.remove(&header) {
            Some(FieldValue::U16(v)) => Some(v),
            _ => None,
        }
    }
    fn take_u32(&mut self, header: FieldHeader) -> Option<u32> {
        match self.fields.remove(&header) {
            Some(FieldValue::U32(v)) => Some(v),
            _ => None,
        }
    }
    fn take_u64(&mut self, header: FieldHeader) -> Option<u64> {
        match self.fields.remove(&header) {
            Some(FieldValue::U64(v)) => Some(v),
            _ => None,
        }
    }
    fn take_hash256(&mut self, header: FieldHeader) -> Option<Hash> {
        match self.fields.remove(&header) {
            Some(FieldValue::Hash256(v)) => Some(v),
            _ => None,
        }
    }
    fn take_amount(&mut self, header: FieldHeader) -> Option<Amount> {
        match self.fields.remove(&header) {
            Some(FieldValue::Amount(v)) => Some(v),
            _ => None,
        }
    }
    fn take_blob(&mut self, header: FieldHeader) -> Option<Vec<u8>> {
        match self.fields.remove(&header) {
            Some(FieldValue::Blob(v)) => Some(v),
            _ => None,
        }
    }
    fn take_account(&mut self, header: FieldHeader) -> Option<AccountId> {
        match self.fields.remove(&header) {
            Some(FieldValue::Account(v)) => Some(v),
            _ => None,
        }
    }
    fn take_paths(&mut self) -> Option<PathSet> {
        match self.fields.remove(&sfield::PATHS) {
            Some(FieldValue::Paths(v)) => Some(v),
            _ => None,
        }
    }
    fn take_signers(&mut self) -> Option<Vec<Signer>> {
        match self.fields.remove(&sfield::SIGNERS) {
            Some(FieldValue::Signers(v)) => Some(v),
            _ => None,
        }
    }
    fn take_signer_entries(&mut self) -> Option<Vec<SignerEntry>> {
        match self.fields.remove(&sfield::SIGNER_ENTRIES) {
            Some(FieldValue::SignerEntries(v)) => Some(v),
            _ => None,
        }
    }
    fn take_memos(&mut self) -> Option<Vec<Memo>> {
        match self.fields.remove(&sfield::MEMOS) {
            Some(FieldValue::Memos(v)) => Some(v),
            _ => None,
        }
    }
    fn take_price_series(&mut self) -> Option<Vec<PriceDataEntry>> {
        match self.fields.remove(&sfield::PRICE_DATA_SERIES) {
            Some(FieldValue::PriceSeries(v)) => Some(v),
            _ => None,
        }
    }
}

fn fail<'a, E: ParseError<&'a [u8]>>(input: &'a [u8]) -> nom::Err<E> {
    nom::Err::Error(ParseError::from_error_kind(
        input,
        nom::error::ErrorKind::Verify,
    ))
}

fn parse_hash256<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
    input: &'a [u8],
) -> IResult<&'a [u8], Hash, E> {
    xrpl_hash::HashDeserializer::new().deserialize(input)
}

fn parse_hash160<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
    input: &'a [u8],
) -> IResult<&'a [u8], [u8; 20], E> {
    if input.len() < CURRENCY_SIZE_BYTES {
        return Err(fail(input));
    }
    // length checked just above
    let bytes: [u8; 20] = input[..CURRENCY_SIZE_BYTES].try_into().unwrap();
    Ok((&input[CURRENCY_SIZE_BYTES..], bytes))
}

/// Parse an array of objects until the array end marker. Each element must
/// open with `element_header` and close with the object end marker;
/// element fields are returned as bags in order.
fn parse_object_array<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
    mut input: &'a [u8],
    element_header: FieldHeader,
) -> IResult<&'a [u8], Vec<FieldBag>, E> {
    let header_deserializer = FieldHeaderDeserializer::new();
    let mut elements = Vec::new();
    loop {
        let (rest, header) = header_deserializer.deserialize(input)?;
        input = rest;
        if header == sfield::ARRAY_END_MARKER {
            return Ok((input, elements));
        }
        if header != element_header {
            return Err(fail(input));
        }
        let mut fields = BTreeMap::new();
        let mut last_ordinal: Option<u16> = None;
        loop {
            let (rest, inner_header) = header_deserializer.deserialize(input)?;
            input = rest;
            if inner_header == sfield::OBJECT_END_MARKER {
                break;
            }
            if let Some(last) = last_ordinal {
                if inner_header.ordinal() <= last {
                    return Err(fail(input));
                }
            }
            last_ordinal = Some(inner_header.ordinal());
            let (rest, value) = parse_field_value(input, inner_header)?;
            input = rest;
            fields.insert(inner_header, value);
        }
        elements.push(FieldBag { fields });
    }
}

/// Parse the payload of one field given its header.
fn parse_field_value<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
    input: &'a [u8],
    header: FieldHeader,
) -> IResult<&'a [u8], FieldValue, E> {
    use crate::sfield::type_code;
    match header.type_code {
        type_code::UINT8 => {
            let (rest, v) = U8Deserializer::default().deserialize(input)?;
            Ok((rest, FieldValue::U8(v)))
        }
        type_code::UINT16 => {
            let (rest, v) = U16BeDeserializer::default().deserialize(input)?;
            Ok((rest, FieldValue::U16(v)))
        }
        type_code::UINT32 => {
            let (rest, v) = U32BeDeserializer::default().deserialize(input)?;
            Ok((rest, FieldValue::U32(v)))
        }
        type_code::UINT64 => {
            let (rest, v) = U64BeDeserializer::default().deserialize(input)?;
            Ok((rest, FieldValue::U64(v)))
        }
        type_code::HASH256 => {
            let (rest, v) = parse_hash256(input)?;
            Ok((rest, FieldValue::Hash256(v)))
        }
        type_code::HASH160 => {
            let (rest, v) = parse_hash160(input)?;
            Ok((rest, FieldValue::Hash160(v)))
        }
        type_code::AMOUNT => {
            let (rest, v) = AmountDeserializer::new().deserialize(input)?;
            Ok((rest, FieldValue::Amount(v)))
        }
        type_code::BLOB => {
            let (rest, v) = VecU8Deserializer::new().deserialize(input)?;
            Ok((rest, FieldValue::Blob(v)))
        }
        type_code::ACCOUNT => {
            let (rest, v) = AccountIdDeserializer::new().deserialize(input)?;
            Ok((rest, FieldValue::Account(v)))
        }
        type_code::PATHSET => {
            let (rest, v) = PathSetDeserializer::new().deserialize(input)?;
            Ok((rest, FieldValue::Paths(v)))
        }
        type_code::ARRAY => {
            if header == sfield::SIGNERS {
                let (rest, bags) = parse_object_array(input, sfield::SIGNER)?;
                let mut signers = Vec::with_capacity(bags.len());
                for mut bag in bags {
                    let account = bag.take_account(sfield::ACCOUNT_FIELD).ok_or(fail(input))?;
                    let signing_pub_key =
                        bag.take_blob(sfield::SIGNING_PUB_KEY).ok_or(fail(input))?;
                    let txn_signature =
                        bag.take_blob(sfield::TXN_SIGNATURE).ok_or(fail(input))?;
                    if !bag.fields.is_empty() {
                        return Err(fail(input));
                    }
                    signers.push(Signer {
                        account,
                        signing_pub_key,
                        txn_signature,
                    });
                }
                Ok((rest, FieldValue::Signers(signers)))
            } else if header == sfield::SIGNER_ENTRIES {
                let (rest, bags) = parse_object_array(input, sfield::SIGNER_ENTRY)?;
                let mut entries = Vec::with_capacity(bags.len());
                for mut bag in bags {
                    let account = bag.take_account(sfield::ACCOUNT_FIELD).ok_or(fail(input))?;
                    let weight = bag.take_u16(sfield::SIGNER_WEIGHT).ok_or(fail(input))?;
                    if !bag.fields.is_empty() {
                        return Err(fail(input));
                    }
                    entries.push(SignerEntry { account, weight });
                }
                Ok((rest, FieldValue::SignerEntries(entries)))
            } else if header == sfield::MEMOS {
                let (rest, bags) = parse_object_array(input, sfield::MEMO)?;
                let mut memos = Vec::with_capacity(bags.len());
                for mut bag in bags {
                    let memo = Memo {
                        memo_type: bag.take_blob(sfield::MEMO_TYPE),
                        memo_data: bag.take_blob(sfield::MEMO_DATA),
                        memo_format: bag.take_blob(sfield::MEMO_FORMAT),
                    };
                    if !bag.fields.is_empty() {
                        return Err(fail(input));
                    }
                    memos.push(memo);
                }
                Ok((rest, FieldValue::Memos(memos)))
            } else if header == sfield::PRICE_DATA_SERIES {
                let (rest, bags) = parse_object_array(input, sfield::PRICE_DATA)?;
                let mut series = Vec::with_capacity(bags.len());
                for mut bag in bags {
                    let base = match bag.fields.remove(&sfield::BASE_ASSET) {
                        Some(FieldValue::Hash160(v)) => Currency::from_bytes(v),
                        _ => return Err(fail(input)),
                    };
                    let quote = match bag.fields.remove(&sfield::QUOTE_ASSET) {
                        Some(FieldValue::Hash160(v)) => Currency::from_bytes(v),
                        _ => return Err(fail(input)),
                    };
                    let entry = PriceDataEntry {
                        base_asset: base,
                        quote_asset: quote,
                        asset_price: bag.take_u64(sfield::ASSET_PRICE),
                        scale: bag.take_u8(sfield::SCALE),
                    };
                    if !bag.fields.is_empty() {
                        return Err(fail(input));
                    }
                    series.push(entry);
                }
                Ok((rest, FieldValue::PriceSeries(series)))
            } else {
                Err(fail(input))
            }
        }
        _ => Err(fail(input)),
    }
}

fn parse_transaction<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
    buffer: &'a [u8],
) -> IResult<&'a [u8], Transaction, E> {
    let header_deserializer = FieldHeaderDeserializer::new();
    let mut fields: BTreeMap<FieldHeader, FieldValue> = BTreeMap::new();
    let mut last_ordinal: Option<u16> = None;
    let mut input = buffer;
    while !input.is_empty() {
        let (rest, header) = header_deserializer.deserialize(input)?;
        input = rest;
        if let Some(last) = last_ordinal {
            // canonical order is strictly ascending; duplicates are also
            // caught here
            if header.ordinal() <= last {
                return Err(fail(input));
            }
        }
        last_ordinal = Some(header.ordinal());
        let (rest, value) = parse_field_value(input, header)?;
        input = rest;
        fields.insert(header, value);
    }
    let mut bag = FieldBag { fields };

    let type_code = bag.take_u16(sfield::TRANSACTION_TYPE).ok_or(fail(buffer))?;
    let transaction_type =
        TransactionType::try_from(type_code).map_err(|_| fail(buffer))?;

    let account = bag.take_account(sfield::ACCOUNT_FIELD).ok_or(fail(buffer))?;
    let fee = match bag.take_amount(sfield::FEE) {
        Some(Amount::Xrp(fee)) => fee,
        _ => return Err(fail(buffer)),
    };
    let common = TransactionCommon {
        account,
        fee,
        sequence: bag.take_u32(sfield::SEQUENCE).ok_or(fail(buffer))?,
        ticket_sequence: bag.take_u32(sfield::TICKET_SEQUENCE),
        signing_pub_key: bag.take_blob(sfield::SIGNING_PUB_KEY).unwrap_or_default(),
        txn_signature: bag.take_blob(sfield::TXN_SIGNATURE).unwrap_or_default(),
        signers: bag.take_signers().unwrap_or_default(),
        flags: bag.take_u32(sfield::FLAGS).unwrap_or(0),
        last_ledger_sequence: bag.take_u32(sfield::LAST_LEDGER_SEQUENCE),
        account_txn_id: bag.take_hash256(sfield::ACCOUNT_TXN_ID),
        source_tag: bag.take_u32(sfield::SOURCE_TAG),
        memos: bag.take_memos().unwrap_or_default(),
    };

    let kind = match transaction_type {
        TransactionType::Payment => TransactionKind::Payment(Payment {
            destination: bag.take_account(sfield::DESTINATION).ok_or(fail(buffer))?,
            amount: bag.take_amount(sfield::AMOUNT).ok_or(fail(buffer))?,
            send_max: bag.take_amount(sfield::SEND_MAX),
            deliver_min: bag.take_amount(sfield::DELIVER_MIN),
            destination_tag: bag.take_u32(sfield::DESTINATION_TAG),
            invoice_id: bag.take_hash256(sfield::INVOICE_ID),
            paths: bag.take_paths().unwrap_or_default(),
        }),
        TransactionType::AccountSet => TransactionKind::AccountSet(AccountSet {
            set_flag: bag.take_u32(sfield::SET_FLAG),
            clear_flag: bag.take_u32(sfield::CLEAR_FLAG),
            transfer_rate: bag.take_u32(sfield::TRANSFER_RATE),
            tick_size: bag.take_u8(sfield::TICK_SIZE),
        }),
        TransactionType::SetRegularKey => TransactionKind::SetRegularKey(SetRegularKey {
            regular_key: bag.take_account(sfield::REGULAR_KEY),
        }),
        TransactionType::OfferCreate => TransactionKind::OfferCreate(OfferCreate {
            taker_pays: bag.take_amount(sfield::TAKER_PAYS).ok_or(fail(buffer))?,
            taker_gets: bag.take_amount(sfield::TAKER_GETS).ok_or(fail(buffer))?,
            expiration: bag.take_u32(sfield::EXPIRATION),
            offer_sequence: bag.take_u32(sfield::OFFER_SEQUENCE),
        }),
        TransactionType::OfferCancel => TransactionKind::OfferCancel(OfferCancel {
            offer_sequence: bag.take_u32(sfield::OFFER_SEQUENCE).ok_or(fail(buffer))?,
        }),
        TransactionType::TicketCreate => TransactionKind::TicketCreate(TicketCreate {
            ticket_count: bag.take_u32(sfield::TICKET_COUNT).ok_or(fail(buffer))?,
        }),
        TransactionType::SignerListSet => TransactionKind::SignerListSet(SignerListSet {
            signer_quorum: bag.take_u32(sfield::SIGNER_QUORUM).ok_or(fail(buffer))?,
            signer_entries: bag.take_signer_entries().unwrap_or_default(),
        }),
        TransactionType::PaymentChannelCreate => {
            TransactionKind::PaymentChannelCreate(PaymentChannelCreate {
                destination: bag.take_account(sfield::DESTINATION).ok_or(fail(buffer))?,
                amount: bag.take_amount(sfield::AMOUNT).ok_or(fail(buffer))?,
                settle_delay: bag.take_u32(sfield::SETTLE_DELAY).ok_or(fail(buffer))?,
                public_key: bag.take_blob(sfield::PUBLIC_KEY).ok_or(fail(buffer))?,
                cancel_after: bag.take_u32(sfield::CANCEL_AFTER),
                destination_tag: bag.take_u32(sfield::DESTINATION_TAG),
            })
        }
        TransactionType::PaymentChannelFund => {
            TransactionKind::PaymentChannelFund(PaymentChannelFund {
                channel: bag.take_hash256(sfield::CHANNEL).ok_or(fail(buffer))?,
                amount: bag.take_amount(sfield::AMOUNT).ok_or(fail(buffer))?,
                expiration: bag.take_u32(sfield::EXPIRATION),
            })
        }
        TransactionType::PaymentChannelClaim => {
            TransactionKind::PaymentChannelClaim(PaymentChannelClaim {
                channel: bag.take_hash256(sfield::CHANNEL).ok_or(fail(buffer))?,
                balance: bag.take_amount(sfield::BALANCE),
                amount: bag.take_amount(sfield::AMOUNT),
                signature: bag.take_blob(sfield::SIGNATURE),
                public_key: bag.take_blob(sfield::PUBLIC_KEY),
            })
        }
        TransactionType::DepositPreauth => TransactionKind::DepositPreauth(DepositPreauthTx {
            authorize: bag.take_account(sfield::AUTHORIZE),
            unauthorize: bag.take_account(sfield::UNAUTHORIZE),
        }),
        TransactionType::TrustSet => TransactionKind::TrustSet(TrustSet {
            limit_amount: bag.take_amount(sfield::LIMIT_AMOUNT).ok_or(fail(buffer))?,
            quality_in: bag.take_u32(sfield::QUALITY_IN),
            quality_out: bag.take_u32(sfield::QUALITY_OUT),
        }),
        TransactionType::AccountDelete => TransactionKind::AccountDelete(AccountDelete {
            destination: bag.take_account(sfield::DESTINATION).ok_or(fail(buffer))?,
            destination_tag: bag.take_u32(sfield::DESTINATION_TAG),
        }),
        TransactionType::OracleSet => TransactionKind::OracleSet(OracleSet {
            oracle_document_id: bag
                .take_u32(sfield::ORACLE_DOCUMENT_ID)
                .ok_or(fail(buffer))?,
            provider: bag.take_blob(sfield::PROVIDER),
            uri: bag.take_blob(sfield::URI),
            asset_class: bag.take_blob(sfield::ASSET_CLASS),
            last_update_time: bag.take_u32(sfield::LAST_UPDATE_TIME).ok_or(fail(buffer))?,
            price_data_series: bag.take_price_series().unwrap_or_default(),
        }),
        TransactionType::OracleDelete => TransactionKind::OracleDelete(OracleDelete {
            oracle_document_id: bag
                .take_u32(sfield::ORACLE_DOCUMENT_ID)
                .ok_or(fail(buffer))?,
        }),
    };

    // anything left over is a field this type does not carry
    if !bag.fields.is_empty() {
        return Err(fail(buffer));
    }

    Ok((
        &buffer[buffer.len()..],
        Transaction { common, kind },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::ACCOUNT_ID_SIZE_BYTES;
    use crate::amount::{IouAmount, IouValue};
    use std::str::FromStr;

    fn account(byte: u8) -> AccountId {
        AccountId::from_bytes([byte; 20])
    }

    fn envelope(sequence: u32) -> TransactionCommon {
        let mut common =
            TransactionCommon::new(account(1), XrpAmount::from_drops(10).unwrap(), sequence);
        common.signing_pub_key = vec![0x03; 33];
        common.txn_signature = vec![0x30; 70];
        common
    }

    fn payment() -> Transaction {
        Transaction {
            common: envelope(5),
            kind: TransactionKind::Payment(Payment {
                destination: account(2),
                amount: Amount::from_drops(100_000_000).unwrap(),
                send_max: None,
                deliver_min: None,
                destination_tag: Some(7),
                invoice_id: None,
                paths: PathSet::default(),
            }),
        }
    }

    #[test]
    fn test_roundtrip_payment() {
        let tx = payment();
        let bytes = tx.serialize_canonical(SigningMode::Full).unwrap();
        let decoded = Transaction::deserialize(&bytes).unwrap();
        assert_eq!(decoded, tx);
        // byte-identical re-serialization
        assert_eq!(
            decoded.serialize_canonical(SigningMode::Full).unwrap(),
            bytes
        );
    }

    #[test]
    fn test_roundtrip_every_kind() {
        let usd = Currency::from_standard_code("USD").unwrap();
        let limit = Amount::Iou(IouAmount::new(
            IouValue::from_str("100").unwrap(),
            usd,
            account(9),
        ));
        let kinds = vec![
            TransactionKind::AccountSet(AccountSet {
                set_flag: Some(8),
                clear_flag: None,
                transfer_rate: Some(1_010_000_000),
                tick_size: Some(6),
            }),
            TransactionKind::SetRegularKey(SetRegularKey {
                regular_key: Some(account(8)),
            }),
            TransactionKind::OfferCreate(OfferCreate {
                taker_pays: limit,
                taker_gets: Amount::from_drops(5_000_000).unwrap(),
                expiration: Some(600_000_000),
                offer_sequence: None,
            }),
            TransactionKind::OfferCancel(OfferCancel { offer_sequence: 11 }),
            TransactionKind::TicketCreate(TicketCreate { ticket_count: 3 }),
            TransactionKind::SignerListSet(SignerListSet {
                signer_quorum: 2,
                signer_entries: vec![
                    SignerEntry {
                        account: account(3),
                        weight: 1,
                    },
                    SignerEntry {
                        account: account(4),
                        weight: 2,
                    },
                ],
            }),
            TransactionKind::PaymentChannelCreate(PaymentChannelCreate {
                destination: account(2),
                amount: Amount::from_drops(1_000_000_000).unwrap(),
                settle_delay: 100,
                public_key: vec![0x03; 33],
                cancel_after: None,
                destination_tag: None,
            }),
            TransactionKind::PaymentChannelFund(PaymentChannelFund {
                channel: Hash::compute_from(b"channel"),
                amount: Amount::from_drops(1_000).unwrap(),
                expiration: None,
            }),
            TransactionKind::PaymentChannelClaim(PaymentChannelClaim {
                channel: Hash::compute_from(b"channel"),
                balance: Some(Amount::from_drops(500).unwrap()),
                amount: Some(Amount::from_drops(600).unwrap()),
                signature: Some(vec![0x30; 64]),
                public_key: Some(vec![0x03; 33]),
            }),
            TransactionKind::DepositPreauth(DepositPreauthTx {
                authorize: Some(account(6)),
                unauthorize: None,
            }),
            TransactionKind::TrustSet(TrustSet {
                limit_amount: limit,
                quality_in: None,
                quality_out: None,
            }),
            TransactionKind::AccountDelete(AccountDelete {
                destination: account(2),
                destination_tag: None,
            }),
            TransactionKind::OracleSet(OracleSet {
                oracle_document_id: 1,
                provider: Some(b"provider".to_vec()),
                uri: None,
                asset_class: Some(b"currency".to_vec()),
                last_update_time: 700_000_000,
                price_data_series: vec![PriceDataEntry {
                    base_asset: Currency::xrp(),
                    quote_asset: usd,
                    asset_price: Some(740),
                    scale: Some(1),
                }],
            }),
            TransactionKind::OracleDelete(OracleDelete {
                oracle_document_id: 1,
            }),
        ];
        for kind in kinds {
            let tx = Transaction {
                common: envelope(1),
                kind,
            };
            let bytes = tx.serialize_canonical(SigningMode::Full).unwrap();
            let decoded = Transaction::deserialize(&bytes).unwrap();
            assert_eq!(decoded, tx, "roundtrip failed for {:?}", tx.transaction_type());
            assert_eq!(
                decoded.serialize_canonical(SigningMode::Full).unwrap(),
                bytes
            );
        }
    }

    #[test]
    fn test_signing_forms_are_prefixed() {
        let tx = payment();
        let single = tx.sign_bytes(SigningMode::SingleSign).unwrap();
        assert_eq!(&single[..4], b"STX\0");
        let multi = tx
            .sign_bytes(SigningMode::MultiSign(account(3)))
            .unwrap();
        assert_eq!(&multi[..4], b"SMT\0");
        assert_eq!(&multi[multi.len() - ACCOUNT_ID_SIZE_BYTES..], account(3).to_bytes());
        // the signing forms never contain the signature
        let full = tx.serialize_canonical(SigningMode::Full).unwrap();
        assert!(full.len() > single.len());
    }

    #[test]
    fn test_hash_covers_signature() {
        let tx = payment();
        let mut signed_differently = tx.clone();
        signed_differently.common.txn_signature = vec![0x31; 70];
        assert_ne!(tx.hash().unwrap(), signed_differently.hash().unwrap());
    }

    #[test]
    fn test_truncated_input_rejected() {
        let tx = payment();
        let bytes = tx.serialize_canonical(SigningMode::Full).unwrap();
        assert!(Transaction::deserialize(&bytes[..bytes.len() - 3]).is_err());
    }

    #[test]
    fn test_unknown_type_rejected() {
        // TransactionType 9999
        let mut writer = CanonicalWriter::new();
        writer.put_u16(sfield::TRANSACTION_TYPE, 9999).unwrap();
        let bytes = writer.finish().unwrap();
        assert!(Transaction::deserialize(&bytes).is_err());
    }

    #[test]
    fn test_foreign_field_rejected() {
        // a Payment carrying an OfferSequence is not a valid Payment, even
        // with the field in canonical position
        let mut writer = CanonicalWriter::new();
        writer
            .put_u16(sfield::TRANSACTION_TYPE, TransactionType::Payment.into())
            .unwrap();
        writer.put_u32(sfield::SEQUENCE, 1).unwrap();
        writer.put_u32(sfield::OFFER_SEQUENCE, 1).unwrap();
        writer
            .put_amount(sfield::FEE, &Amount::from_drops(10).unwrap())
            .unwrap();
        writer
            .put_amount(sfield::AMOUNT, &Amount::from_drops(1).unwrap())
            .unwrap();
        writer.put_account(sfield::ACCOUNT_FIELD, &account(1)).unwrap();
        writer.put_account(sfield::DESTINATION, &account(2)).unwrap();
        let bytes = writer.finish().unwrap();
        assert!(Transaction::deserialize(&bytes).is_err());
    }

    #[test]
    fn test_out_of_order_fields_rejected() {
        let tx = payment();
        let mut bytes = tx.serialize_canonical(SigningMode::Full).unwrap();
        // append a low-ordinal field after the end
        let mut writer = CanonicalWriter::new();
        writer.put_u32(sfield::SOURCE_TAG, 1).unwrap();
        bytes.extend(writer.finish().unwrap());
        assert!(Transaction::deserialize(&bytes).is_err());
    }
}
