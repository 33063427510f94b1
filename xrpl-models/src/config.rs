//! Protocol constants.
//!
//! Fee and reserve values are the genesis defaults; the live values are
//! pinned on each ledger header and passed by reference into the engine,
//! never read from here during apply.

/// Number of drops in one XRP.
pub const DROPS_PER_XRP: u64 = 1_000_000;

/// Largest representable native amount, in drops (10^17 = 100 billion XRP).
pub const MAX_NATIVE_DROPS: i64 = 100_000_000_000_000_000;

/// Genesis base fee, in drops.
pub const DEFAULT_BASE_FEE: u64 = 10;

/// Genesis base reserve, in drops.
pub const DEFAULT_RESERVE_BASE: u64 = 10 * DROPS_PER_XRP;

/// Genesis owner-reserve increment, in drops.
pub const DEFAULT_RESERVE_INCREMENT: u64 = 2 * DROPS_PER_XRP;

/// Seconds between the Unix epoch and the ledger epoch (2000-01-01 UTC).
pub const EPOCH_OFFSET_SECONDS: i64 = 946_684_800;

/// Transfer rate denoting parity (no fee).
pub const PARITY_RATE: u32 = 1_000_000_000;

/// Largest legal transfer rate (a 100% fee).
pub const MAX_TRANSFER_RATE: u32 = 2_000_000_000;

/// Ledgers an account must wait after its last transaction before deletion.
pub const ACCOUNT_DELETE_SEQUENCE_GAP: u32 = 256;

/// Most tickets a single TicketCreate may mint, and the per-account cap.
pub const MAX_TICKET_COUNT: u32 = 250;

/// Most signers a signer list may carry.
pub const MAX_SIGNER_ENTRIES: usize = 32;

/// Most price pairs an oracle may carry.
pub const MAX_ORACLE_PAIRS: usize = 10;

/// Largest price scale an oracle pair accepts.
pub const MAX_ORACLE_SCALE: u8 = 8;

/// Oracle provider field length cap, in bytes.
pub const MAX_ORACLE_PROVIDER_LEN: usize = 256;

/// Oracle asset-class field length cap, in bytes.
pub const MAX_ORACLE_ASSET_CLASS_LEN: usize = 16;

/// Oracle URI field length cap, in bytes.
pub const MAX_ORACLE_URI_LEN: usize = 256;

/// Widest allowed gap between an oracle update time and the parent close
/// time, in seconds, in either direction.
pub const MAX_ORACLE_UPDATE_TIME_DELTA: u32 = 300;

/// Keys per owner-directory page.
pub const DIR_NODE_MAX: usize = 32;

/// Smallest tick size an account may configure (0 clears it).
pub const MIN_TICK_SIZE: u8 = 3;

/// Largest tick size an account may configure.
pub const MAX_TICK_SIZE: u8 = 15;

/// Most path elements a single path may carry.
pub const MAX_PATH_LENGTH: usize = 8;

/// Most paths a payment may carry.
pub const MAX_PATH_COUNT: usize = 6;
