//! Core data model of the ledger: identifiers, amounts, ledger entries,
//! transactions, result codes and the amendment feature set.
//!
//! Everything here is a pure value type with a canonical binary form. The
//! serializer/deserializer pairs follow the workspace serialization traits;
//! the canonical encodings feed consensus-defining hashes, so any change to
//! them is a protocol change.

pub mod account;
pub mod amount;
pub mod config;
pub mod currency;
pub mod entry;
pub mod error;
pub mod features;
pub mod issue;
pub mod keylet;
pub mod paths;
pub mod rate;
pub mod result;
pub mod sfield;
pub mod transaction;
pub mod writer;

pub use account::AccountId;
pub use amount::{Amount, IouAmount, IouValue, XrpAmount};
pub use currency::Currency;
pub use error::ModelsError;
pub use issue::Issue;
pub use keylet::Keylet;
pub use rate::{Quality, Rate};
pub use result::TransactionResult;
