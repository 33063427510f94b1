//! Typed ledger entries.
//!
//! A closed set of record types, each addressed by its keylet. Every entry
//! carries its namespace tag in the type system, serializes canonically for
//! hashing and metadata, and knows how many owner-reserve units it costs.

use crate::account::AccountId;
use crate::amount::{Amount, IouAmount, XrpAmount};
use crate::currency::Currency;
use crate::error::ModelsError;
use crate::sfield;
use crate::writer::CanonicalWriter;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use xrpl_hash::{Hash, HashPrefix};

/// Ledger entry type tags, as stored in the LedgerEntryType field.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, IntoPrimitive, TryFromPrimitive,
    Serialize, Deserialize,
)]
#[repr(u16)]
pub enum LedgerEntryType {
    /// An account.
    AccountRoot = 0x61,
    /// A trust line.
    RippleState = 0x72,
    /// An order-book offer.
    Offer = 0x6F,
    /// A paged directory.
    DirectoryNode = 0x64,
    /// A unidirectional payment channel.
    PayChannel = 0x78,
    /// A multisig signer list.
    SignerList = 0x53,
    /// A pre-reserved sequence slot.
    Ticket = 0x54,
    /// A deposit preauthorization.
    DepositPreauth = 0x70,
    /// A price oracle.
    Oracle = 0x80,
    /// The singleton amendment list.
    Amendments = 0x66,
    /// The singleton fee settings.
    FeeSettings = 0x73,
    /// The recent-ledger-hash skip list.
    LedgerHashes = 0x68,
}

/// Account root flags.
pub mod account_flags {
    /// Incoming payments must carry a destination tag.
    pub const LSF_REQUIRE_DEST_TAG: u32 = 0x0002_0000;
    /// Trust lines must be authorized by the issuer.
    pub const LSF_REQUIRE_AUTH: u32 = 0x0004_0000;
    /// The account discourages receiving XRP.
    pub const LSF_DISALLOW_XRP: u32 = 0x0008_0000;
    /// The master key is disabled.
    pub const LSF_DISABLE_MASTER: u32 = 0x0010_0000;
    /// The account renounced the ability to freeze.
    pub const LSF_NO_FREEZE: u32 = 0x0020_0000;
    /// All of the account's lines are frozen.
    pub const LSF_GLOBAL_FREEZE: u32 = 0x0040_0000;
    /// New trust lines ripple by default.
    pub const LSF_DEFAULT_RIPPLE: u32 = 0x0080_0000;
    /// Only preauthorized senders may deposit.
    pub const LSF_DEPOSIT_AUTH: u32 = 0x0100_0000;
    /// The account refuses incoming payment channels.
    pub const LSF_DISALLOW_INCOMING_PAYCHAN: u32 = 0x1000_0000;
    /// The account refuses incoming trust lines.
    pub const LSF_DISALLOW_INCOMING_TRUSTLINE: u32 = 0x2000_0000;
}

/// Trust line flags; each property exists once per side.
pub mod line_flags {
    /// The low account contributes to its owner reserve.
    pub const LSF_LOW_RESERVE: u32 = 0x0001_0000;
    /// The high account contributes to its owner reserve.
    pub const LSF_HIGH_RESERVE: u32 = 0x0002_0000;
    /// The low side has authorized the line.
    pub const LSF_LOW_AUTH: u32 = 0x0004_0000;
    /// The high side has authorized the line.
    pub const LSF_HIGH_AUTH: u32 = 0x0008_0000;
    /// The low side disabled rippling.
    pub const LSF_LOW_NO_RIPPLE: u32 = 0x0010_0000;
    /// The high side disabled rippling.
    pub const LSF_HIGH_NO_RIPPLE: u32 = 0x0020_0000;
    /// The low side froze the line.
    pub const LSF_LOW_FREEZE: u32 = 0x0040_0000;
    /// The high side froze the line.
    pub const LSF_HIGH_FREEZE: u32 = 0x0080_0000;
}

/// Offer flags.
pub mod offer_flags {
    /// The offer does not consume matching offers of equal quality.
    pub const LSF_PASSIVE: u32 = 0x0001_0000;
    /// The offer was placed with tfSell.
    pub const LSF_SELL: u32 = 0x0002_0000;
}

/// Signer list flags.
pub mod signer_list_flags {
    /// The list counts one owner-reserve unit (MultiSignReserve).
    pub const LSF_ONE_OWNER_COUNT: u32 = 0x0001_0000;
}

/// An account root entry.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct AccountRoot {
    /// The account this root belongs to.
    pub account: AccountId,
    /// XRP balance in drops.
    pub balance: XrpAmount,
    /// Next valid sequence number.
    pub sequence: u32,
    /// Number of reserve-contributing entries owned.
    pub owner_count: u32,
    /// lsf flags.
    pub flags: u32,
    /// Optional regular key.
    pub regular_key: Option<AccountId>,
    /// Hash of the account's last applied transaction, when tracked.
    pub account_txn_id: Option<Hash>,
    /// Configured tick size, if any.
    pub tick_size: Option<u8>,
    /// Configured transfer rate, if any.
    pub transfer_rate: Option<u32>,
    /// Outstanding tickets.
    pub ticket_count: u32,
}

impl AccountRoot {
    /// A fresh account root, as created by a funding payment.
    pub fn new(account: AccountId, balance: XrpAmount, sequence: u32) -> Self {
        AccountRoot {
            account,
            balance,
            sequence,
            owner_count: 0,
            flags: 0,
            regular_key: None,
            account_txn_id: None,
            tick_size: None,
            transfer_rate: None,
            ticket_count: 0,
        }
    }

    /// Flag test helper.
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}

/// A trust line. The balance is stored once, signed from the low account's
/// perspective: positive means the high account owes the low account.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RippleState {
    /// Balance from the low perspective; the issuer slot of the amount is
    /// the neutral account.
    pub balance: IouAmount,
    /// Limit extended by the low account (its issuer slot names the low
    /// account).
    pub low_limit: IouAmount,
    /// Limit extended by the high account.
    pub high_limit: IouAmount,
    /// lsf flags.
    pub flags: u32,
    /// Quality the low side applies to incoming amounts, in billionths.
    pub low_quality_in: u32,
    /// Quality the low side applies to outgoing amounts.
    pub low_quality_out: u32,
    /// Quality the high side applies to incoming amounts.
    pub high_quality_in: u32,
    /// Quality the high side applies to outgoing amounts.
    pub high_quality_out: u32,
}

impl RippleState {
    /// The low account (from the low limit's issuer slot).
    pub fn low_account(&self) -> AccountId {
        self.low_limit.issuer
    }

    /// The high account.
    pub fn high_account(&self) -> AccountId {
        self.high_limit.issuer
    }

    /// Flag test helper.
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}

/// An order-book offer.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Offer {
    /// Owner.
    pub account: AccountId,
    /// Sequence (or ticket) that created the offer.
    pub sequence: u32,
    /// What the taker must pay the owner.
    pub taker_pays: Amount,
    /// What the taker receives from the owner.
    pub taker_gets: Amount,
    /// Key of the book directory page holding this offer.
    pub book_directory: Hash,
    /// Page hint within the book directory.
    pub book_node: u64,
    /// Page hint within the owner directory.
    pub owner_node: u64,
    /// Optional expiration, seconds since the ledger epoch.
    pub expiration: Option<u32>,
    /// lsf flags.
    pub flags: u32,
}

/// A unidirectional payment channel.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PayChannel {
    /// Funding account.
    pub account: AccountId,
    /// Payee.
    pub destination: AccountId,
    /// Total XRP allocated to the channel.
    pub amount: XrpAmount,
    /// XRP already paid out.
    pub balance: XrpAmount,
    /// Key that signs claim authorizations.
    pub public_key: Vec<u8>,
    /// Seconds the source must wait to close while funds remain.
    pub settle_delay: u32,
    /// Page hint within the owner directory.
    pub owner_node: u64,
    /// Mutable expiration, set by close requests.
    pub expiration: Option<u32>,
    /// Immutable expiration fixed at creation.
    pub cancel_after: Option<u32>,
    /// Destination tag required by the payee.
    pub destination_tag: Option<u32>,
}

/// One signer of a signer list.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SignerEntry {
    /// Signer account.
    pub account: AccountId,
    /// Weight this signer contributes towards the quorum.
    pub weight: u16,
}

/// A multisig signer list.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SignerList {
    /// Total weight that must sign.
    pub signer_quorum: u32,
    /// The signers, kept sorted ascending by account id.
    pub signer_entries: Vec<SignerEntry>,
    /// Page hint within the owner directory.
    pub owner_node: u64,
    /// lsf flags.
    pub flags: u32,
}

/// A pre-reserved sequence slot.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Ticket {
    /// Owner.
    pub account: AccountId,
    /// The sequence this ticket stands in for.
    pub ticket_sequence: u32,
    /// Page hint within the owner directory.
    pub owner_node: u64,
}

/// A page of a directory: the transparent paging layer under owner
/// directories and order books.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct DirectoryNode {
    /// Key of the root page of this directory.
    pub root_index: Hash,
    /// The keys stored on this page.
    pub indexes: Vec<Hash>,
    /// Next page, if any.
    pub index_next: Option<u64>,
    /// Previous page, if any.
    pub index_previous: Option<u64>,
    /// Owner account (owner directories only).
    pub owner: Option<AccountId>,
    /// Quality of this book page (book directories only).
    pub exchange_rate: Option<u64>,
    /// Taker-pays issue of the book (book directories only).
    pub taker_pays_currency: Option<Currency>,
    /// Taker-pays issuer.
    pub taker_pays_issuer: Option<AccountId>,
    /// Taker-gets issue of the book.
    pub taker_gets_currency: Option<Currency>,
    /// Taker-gets issuer.
    pub taker_gets_issuer: Option<AccountId>,
}

/// A deposit preauthorization entry.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DepositPreauthEntry {
    /// Account that granted the preauthorization.
    pub account: AccountId,
    /// Account allowed to deposit.
    pub authorize: AccountId,
    /// Page hint within the owner directory.
    pub owner_node: u64,
}

/// One asset-pair price inside an oracle.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PriceData {
    /// Base asset code.
    pub base_asset: Currency,
    /// Quote asset code.
    pub quote_asset: Currency,
    /// Price scaled by 10^scale; absent when the pair lapsed in an update.
    pub asset_price: Option<u64>,
    /// Decimal scale of the price.
    pub scale: Option<u8>,
}

impl PriceData {
    /// The pair identity used for dedup and lookups.
    pub fn pair(&self) -> (Currency, Currency) {
        (self.base_asset, self.quote_asset)
    }
}

/// A price oracle entry.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct OracleEntry {
    /// Owner.
    pub owner: AccountId,
    /// Provider identifier, immutable across updates.
    pub provider: Vec<u8>,
    /// Asset class label, immutable across updates.
    pub asset_class: Vec<u8>,
    /// Optional provider URI.
    pub uri: Option<Vec<u8>>,
    /// Time of the last update, seconds since the ledger epoch.
    pub last_update_time: u32,
    /// The price series.
    pub price_data_series: Vec<PriceData>,
    /// Page hint within the owner directory.
    pub owner_node: u64,
}

impl OracleEntry {
    /// Owner-reserve units this oracle costs: two for a large series.
    pub fn reserve_units(&self) -> u32 {
        if self.price_data_series.len() > 5 {
            2
        } else {
            1
        }
    }
}

/// Any ledger entry.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum LedgerEntry {
    /// Account root.
    AccountRoot(AccountRoot),
    /// Trust line.
    RippleState(RippleState),
    /// Offer.
    Offer(Offer),
    /// Payment channel.
    PayChannel(PayChannel),
    /// Signer list.
    SignerList(SignerList),
    /// Ticket.
    Ticket(Ticket),
    /// Directory page.
    DirectoryNode(DirectoryNode),
    /// Deposit preauthorization.
    DepositPreauth(DepositPreauthEntry),
    /// Price oracle.
    Oracle(OracleEntry),
}

impl LedgerEntry {
    /// The entry's type tag.
    pub fn entry_type(&self) -> LedgerEntryType {
        match self {
            LedgerEntry::AccountRoot(_) => LedgerEntryType::AccountRoot,
            LedgerEntry::RippleState(_) => LedgerEntryType::RippleState,
            LedgerEntry::Offer(_) => LedgerEntryType::Offer,
            LedgerEntry::PayChannel(_) => LedgerEntryType::PayChannel,
            LedgerEntry::SignerList(_) => LedgerEntryType::SignerList,
            LedgerEntry::Ticket(_) => LedgerEntryType::Ticket,
            LedgerEntry::DirectoryNode(_) => LedgerEntryType::DirectoryNode,
            LedgerEntry::DepositPreauth(_) => LedgerEntryType::DepositPreauth,
            LedgerEntry::Oracle(_) => LedgerEntryType::Oracle,
        }
    }

    /// Owner-reserve units the entry contributes to its owner's count.
    /// Directory pages are free; trust lines are counted per side by the
    /// reserve flags, handled by the ledger layer.
    pub fn reserve_units(&self) -> u32 {
        match self {
            LedgerEntry::AccountRoot(_) | LedgerEntry::DirectoryNode(_) => 0,
            LedgerEntry::RippleState(_) => 0,
            LedgerEntry::Offer(_)
            | LedgerEntry::PayChannel(_)
            | LedgerEntry::Ticket(_)
            | LedgerEntry::DepositPreauth(_) => 1,
            LedgerEntry::SignerList(list) => {
                if list.flags & signer_list_flags::LSF_ONE_OWNER_COUNT != 0 {
                    1
                } else {
                    2 + list.signer_entries.len() as u32
                }
            }
            LedgerEntry::Oracle(oracle) => oracle.reserve_units(),
        }
    }

    /// Canonical serialization of the entry, used for hashing and metadata
    /// field dumps.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, ModelsError> {
        let mut writer = CanonicalWriter::new();
        writer.put_u16(sfield::LEDGER_ENTRY_TYPE, u16::from(self.entry_type()))?;
        match self {
            LedgerEntry::AccountRoot(root) => {
                writer.put_u32(sfield::FLAGS, root.flags)?;
                writer.put_account(sfield::ACCOUNT_FIELD, &root.account)?;
                writer.put_amount(sfield::BALANCE, &Amount::Xrp(root.balance))?;
                writer.put_u32(sfield::SEQUENCE, root.sequence)?;
                writer.put_u32(sfield::OWNER_COUNT, root.owner_count)?;
                if let Some(regular_key) = &root.regular_key {
                    writer.put_account(sfield::REGULAR_KEY, regular_key)?;
                }
                if let Some(account_txn_id) = &root.account_txn_id {
                    writer.put_hash256(sfield::ACCOUNT_TXN_ID, account_txn_id)?;
                }
                if let Some(tick_size) = root.tick_size {
                    writer.put_u8(sfield::TICK_SIZE, tick_size)?;
                }
                if let Some(transfer_rate) = root.transfer_rate {
                    writer.put_u32(sfield::TRANSFER_RATE, transfer_rate)?;
                }
                if root.ticket_count > 0 {
                    writer.put_u32(sfield::TICKET_COUNT, root.ticket_count)?;
                }
            }
            LedgerEntry::RippleState(line) => {
                writer.put_u32(sfield::FLAGS, line.flags)?;
                writer.put_amount(sfield::BALANCE, &Amount::Iou(line.balance))?;
                writer.put_amount(sfield::LOW_LIMIT, &Amount::Iou(line.low_limit))?;
                writer.put_amount(sfield::HIGH_LIMIT, &Amount::Iou(line.high_limit))?;
                if line.low_quality_in != 0 {
                    writer.put_u32(sfield::LOW_QUALITY_IN, line.low_quality_in)?;
                }
                if line.low_quality_out != 0 {
                    writer.put_u32(sfield::LOW_QUALITY_OUT, line.low_quality_out)?;
                }
                if line.high_quality_in != 0 {
                    writer.put_u32(sfield::HIGH_QUALITY_IN, line.high_quality_in)?;
                }
                if line.high_quality_out != 0 {
                    writer.put_u32(sfield::HIGH_QUALITY_OUT, line.high_quality_out)?;
                }
            }
            LedgerEntry::Offer(offer) => {
                writer.put_u32(sfield::FLAGS, offer.flags)?;
                writer.put_account(sfield::ACCOUNT_FIELD, &offer.account)?;
                writer.put_u32(sfield::SEQUENCE, offer.sequence)?;
                writer.put_amount(sfield::TAKER_PAYS, &offer.taker_pays)?;
                writer.put_amount(sfield::TAKER_GETS, &offer.taker_gets)?;
                writer.put_hash256(sfield::BOOK_DIRECTORY, &offer.book_directory)?;
                writer.put_u64(sfield::BOOK_NODE, offer.book_node)?;
                writer.put_u64(sfield::OWNER_NODE, offer.owner_node)?;
                if let Some(expiration) = offer.expiration {
                    writer.put_u32(sfield::EXPIRATION, expiration)?;
                }
            }
            LedgerEntry::PayChannel(channel) => {
                writer.put_u32(sfield::FLAGS, 0)?;
                writer.put_account(sfield::ACCOUNT_FIELD, &channel.account)?;
                writer.put_account(sfield::DESTINATION, &channel.destination)?;
                writer.put_amount(sfield::AMOUNT, &Amount::Xrp(channel.amount))?;
                writer.put_amount(sfield::BALANCE, &Amount::Xrp(channel.balance))?;
                writer.put_blob(sfield::PUBLIC_KEY, &channel.public_key)?;
                writer.put_u32(sfield::SETTLE_DELAY, channel.settle_delay)?;
                writer.put_u64(sfield::OWNER_NODE, channel.owner_node)?;
                if let Some(expiration) = channel.expiration {
                    writer.put_u32(sfield::EXPIRATION, expiration)?;
                }
                if let Some(cancel_after) = channel.cancel_after {
                    writer.put_u32(sfield::CANCEL_AFTER, cancel_after)?;
                }
                if let Some(tag) = channel.destination_tag {
                    writer.put_u32(sfield::DESTINATION_TAG, tag)?;
                }
            }
            LedgerEntry::SignerList(list) => {
                writer.put_u32(sfield::FLAGS, list.flags)?;
                writer.put_u32(sfield::SIGNER_QUORUM, list.signer_quorum)?;
                writer.put_u64(sfield::OWNER_NODE, list.owner_node)?;
                let mut entries = Vec::with_capacity(list.signer_entries.len());
                for entry in &list.signer_entries {
                    let mut inner = CanonicalWriter::new();
                    inner.put_account(sfield::ACCOUNT_FIELD, &entry.account)?;
                    inner.put_u16(sfield::SIGNER_WEIGHT, entry.weight)?;
                    entries.push((sfield::SIGNER_ENTRY, inner));
                }
                writer.put_array(sfield::SIGNER_ENTRIES, entries)?;
            }
            LedgerEntry::Ticket(ticket) => {
                writer.put_u32(sfield::FLAGS, 0)?;
                writer.put_account(sfield::ACCOUNT_FIELD, &ticket.account)?;
                writer.put_u32(sfield::TICKET_SEQUENCE, ticket.ticket_sequence)?;
                writer.put_u64(sfield::OWNER_NODE, ticket.owner_node)?;
            }
            LedgerEntry::DirectoryNode(dir) => {
                writer.put_u32(sfield::FLAGS, 0)?;
                writer.put_hash256(sfield::ROOT_INDEX, &dir.root_index)?;
                writer.put_vector256(sfield::INDEXES, &dir.indexes)?;
                if let Some(next) = dir.index_next {
                    writer.put_u64(sfield::INDEX_NEXT, next)?;
                }
                if let Some(previous) = dir.index_previous {
                    writer.put_u64(sfield::INDEX_PREVIOUS, previous)?;
                }
                if let Some(owner) = &dir.owner {
                    writer.put_account(sfield::OWNER, owner)?;
                }
                if let Some(rate) = dir.exchange_rate {
                    writer.put_u64(sfield::EXCHANGE_RATE, rate)?;
                }
                if let Some(currency) = &dir.taker_pays_currency {
                    writer.put_hash160(sfield::TAKER_PAYS_CURRENCY, currency.to_bytes())?;
                }
                if let Some(issuer) = &dir.taker_pays_issuer {
                    writer.put_hash160(sfield::TAKER_PAYS_ISSUER, issuer.to_bytes())?;
                }
                if let Some(currency) = &dir.taker_gets_currency {
                    writer.put_hash160(sfield::TAKER_GETS_CURRENCY, currency.to_bytes())?;
                }
                if let Some(issuer) = &dir.taker_gets_issuer {
                    writer.put_hash160(sfield::TAKER_GETS_ISSUER, issuer.to_bytes())?;
                }
            }
            LedgerEntry::DepositPreauth(preauth) => {
                writer.put_u32(sfield::FLAGS, 0)?;
                writer.put_account(sfield::ACCOUNT_FIELD, &preauth.account)?;
                writer.put_account(sfield::AUTHORIZE, &preauth.authorize)?;
                writer.put_u64(sfield::OWNER_NODE, preauth.owner_node)?;
            }
            LedgerEntry::Oracle(oracle) => {
                writer.put_u32(sfield::FLAGS, 0)?;
                writer.put_account(sfield::OWNER, &oracle.owner)?;
                writer.put_blob(sfield::PROVIDER, &oracle.provider)?;
                writer.put_blob(sfield::ASSET_CLASS, &oracle.asset_class)?;
                if let Some(uri) = &oracle.uri {
                    writer.put_blob(sfield::URI, uri)?;
                }
                writer.put_u32(sfield::LAST_UPDATE_TIME, oracle.last_update_time)?;
                writer.put_u64(sfield::OWNER_NODE, oracle.owner_node)?;
                let mut series = Vec::with_capacity(oracle.price_data_series.len());
                for price in &oracle.price_data_series {
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
        writer.finish()
    }

    /// The consensus hash of the entry at its key: SHA-512-Half over the
    /// leaf-node prefix, the canonical form and the key.
    pub fn hash(&self, key: &Hash) -> Result<Hash, ModelsError> {
        let bytes = self.to_canonical_bytes()?;
        Ok(Hash::compute_from_prefixed(
            HashPrefix::LeafNode,
            &[&bytes, key.to_bytes()],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::IouValue;
    use std::str::FromStr;

    fn account(byte: u8) -> AccountId {
        AccountId::from_bytes([byte; 20])
    }

    fn usd(value: &str, issuer: AccountId) -> IouAmount {
        IouAmount::new(
            IouValue::from_str(value).unwrap(),
            Currency::from_standard_code("USD").unwrap(),
            issuer,
        )
    }

    #[test]
    fn test_entry_type_codes() {
        assert_eq!(u16::from(LedgerEntryType::AccountRoot), 0x61);
        assert_eq!(u16::from(LedgerEntryType::RippleState), 0x72);
        assert_eq!(u16::from(LedgerEntryType::Oracle), 0x80);
        assert_eq!(LedgerEntryType::try_from(0x54u16).unwrap(), LedgerEntryType::Ticket);
    }

    #[test]
    fn test_hash_depends_only_on_canonical_form() {
        let root = AccountRoot::new(account(1), XrpAmount::from_xrp(100).unwrap(), 1);
        let a = LedgerEntry::AccountRoot(root.clone());
        let b = LedgerEntry::AccountRoot(root);
        let key = Hash::compute_from(b"key");
        assert_eq!(a.hash(&key).unwrap(), b.hash(&key).unwrap());
        let other_key = Hash::compute_from(b"other");
        assert_ne!(a.hash(&key).unwrap(), a.hash(&other_key).unwrap());
    }

    #[test]
    fn test_signer_list_reserve_units() {
        let entries = vec![
            SignerEntry { account: account(2), weight: 1 },
            SignerEntry { account: account(3), weight: 1 },
        ];
        let legacy = LedgerEntry::SignerList(SignerList {
            signer_quorum: 2,
            signer_entries: entries.clone(),
            owner_node: 0,
            flags: 0,
        });
        assert_eq!(legacy.reserve_units(), 4);
        let reduced = LedgerEntry::SignerList(SignerList {
            signer_quorum: 2,
            signer_entries: entries,
            owner_node: 0,
            flags: signer_list_flags::LSF_ONE_OWNER_COUNT,
        });
        assert_eq!(reduced.reserve_units(), 1);
    }

    #[test]
    fn test_oracle_reserve_units() {
        let pair = |base: &str, quote: &str| PriceData {
            base_asset: Currency::from_standard_code(base).unwrap(),
            quote_asset: Currency::from_standard_code(quote).unwrap(),
            asset_price: Some(1),
            scale: Some(0),
        };
        let mut oracle = OracleEntry {
            owner: account(1),
            provider: b"provider".to_vec(),
            asset_class: b"currency".to_vec(),
            uri: None,
            last_update_time: 0,
            price_data_series: vec![
                pair("AAA", "BBB"),
                pair("CCC", "DDD"),
                pair("EEE", "FFF"),
                pair("GGG", "HHH"),
                pair("III", "JJJ"),
            ],
            owner_node: 0,
        };
        assert_eq!(oracle.reserve_units(), 1);
        oracle.price_data_series.push(pair("KKK", "LLL"));
        assert_eq!(oracle.reserve_units(), 2);
    }

    #[test]
    fn test_trust_line_sides() {
        let low = account(1);
        let high = account(2);
        let line = RippleState {
            balance: usd("5", AccountId::zero()),
            low_limit: usd("100", low),
            high_limit: usd("0", high),
            flags: line_flags::LSF_LOW_RESERVE,
            low_quality_in: 0,
            low_quality_out: 0,
            high_quality_in: 0,
            high_quality_out: 0,
        };
        assert_eq!(line.low_account(), low);
        assert_eq!(line.high_account(), high);
        assert!(line.has_flag(line_flags::LSF_LOW_RESERVE));
        assert!(!line.has_flag(line_flags::LSF_HIGH_RESERVE));
    }

    #[test]
    fn test_canonical_bytes_stable() {
        let entry = LedgerEntry::Ticket(Ticket {
            account: account(9),
            ticket_sequence: 41,
            owner_node: 0,
        });
        assert_eq!(
            entry.to_canonical_bytes().unwrap(),
            entry.to_canonical_bytes().unwrap()
        );
    }
}
