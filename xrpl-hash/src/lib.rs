//! SHA-512-Half hashing.
//!
//! Every ledger entry, transaction and the ledger header itself is
//! identified by the first 32 bytes of a SHA-512 digest over a type-specific
//! domain prefix concatenated with the canonical encoding. The prefix keeps
//! the hash spaces of the different object families disjoint.

#![warn(missing_docs)]

mod error;
mod hash;
mod prefix;

pub use error::HashError;
pub use hash::{Hash, HashDeserializer, HashSerializer};
pub use prefix::HashPrefix;

/// Size in bytes of a SHA-512-Half digest.
pub const HASH_SIZE_BYTES: usize = 32;
