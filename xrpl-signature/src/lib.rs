// Signature management
//! Key pairs, public keys and signatures for the two signing algorithms the
//! ledger accepts: ECDSA over secp256k1 (DER signatures, digest signing) and
//! Ed25519 (raw 64-byte signatures over the full message).
//!
//! The algorithm is carried by the serialized public key itself: a 33-byte
//! key starting 0x02/0x03 is compressed secp256k1, a 33-byte key starting
//! 0xED wraps an Ed25519 verifying key. Callers frame the message with the
//! proper signing prefix before handing it here.

#![warn(missing_docs)]

mod error;
mod signature_impl;

pub use error::SignatureError;
pub use signature_impl::{
    account_id_digest, KeyPair, PublicKey, Signature, ACCOUNT_ID_SIZE_BYTES,
    PUBLIC_KEY_SIZE_BYTES,
};
