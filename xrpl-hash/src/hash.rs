use crate::error::HashError;
use crate::prefix::HashPrefix;
use crate::HASH_SIZE_BYTES;
use sha2::{Digest, Sha512};
use std::{cmp::Ordering, str::FromStr};
use xrpl_serialization::{Deserializer, SerializeError, Serializer};

use nom::{
    error::{context, ContextError, ParseError},
    IResult,
};

/// Hash wrapper, the underlying digest is SHA-512-Half: the first 32 bytes
/// of SHA-512 over the payload.
///
/// SHA-512-Half is what the network hashes everything with; the truncation
/// is part of the protocol, so the full 64-byte digest never leaves this
/// module.
#[derive(Eq, PartialEq, Copy, Clone, Hash, Default)]
pub struct Hash([u8; HASH_SIZE_BYTES]);

impl PartialOrd for Hash {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Hashes order byte-lexicographically; ledger state iteration and book
/// directory stepping rely on this order being stable.
impl Ord for Hash {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl Hash {
    /// Compute a hash from raw data, without a domain prefix.
    ///
    /// # Example
    /// ```
    /// # use xrpl_hash::Hash;
    /// let hash = Hash::compute_from(b"hello world");
    /// ```
    pub fn compute_from(data: &[u8]) -> Self {
        let mut hasher = Sha512::new();
        hasher.update(data);
        Self::from_digest(hasher)
    }

    /// Compute a hash over a domain prefix followed by one or more payload
    /// slices. This is the form every consensus object uses.
    pub fn compute_from_prefixed(prefix: HashPrefix, parts: &[&[u8]]) -> Self {
        let mut hasher = Sha512::new();
        hasher.update(prefix.to_bytes());
        for part in parts {
            hasher.update(part);
        }
        Self::from_digest(hasher)
    }

    /// Compute a hash over raw concatenated slices (used by keylet
    /// derivation, where the 2-byte namespace acts as the prefix).
    pub fn compute_from_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha512::new();
        for part in parts {
            hasher.update(part);
        }
        Self::from_digest(hasher)
    }

    fn from_digest(hasher: Sha512) -> Self {
        let digest = hasher.finalize();
        // the digest is 64 bytes, the protocol keeps the first 32
        let mut half = [0u8; HASH_SIZE_BYTES];
        half.copy_from_slice(&digest[..HASH_SIZE_BYTES]);
        Hash(half)
    }

    /// The all-zero hash, used as a sentinel (e.g. empty directory links).
    pub const fn zero() -> Self {
        Hash([0u8; HASH_SIZE_BYTES])
    }

    /// True if this is the all-zero sentinel.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_SIZE_BYTES]
    }

    /// Borrow the hash as bytes.
    pub fn to_bytes(&self) -> &[u8; HASH_SIZE_BYTES] {
        &self.0
    }

    /// Convert into bytes.
    pub fn into_bytes(self) -> [u8; HASH_SIZE_BYTES] {
        self.0
    }

    /// Build a Hash from bytes.
    pub fn from_bytes(data: &[u8; HASH_SIZE_BYTES]) -> Hash {
        Hash(*data)
    }

    /// Parse an uppercase or lowercase hex string.
    pub fn from_hex(data: &str) -> Result<Hash, HashError> {
        if data.len() != HASH_SIZE_BYTES * 2 {
            return Err(HashError::ParsingError(format!(
                "expected {} hex characters, got {}",
                HASH_SIZE_BYTES * 2,
                data.len()
            )));
        }
        let mut bytes = [0u8; HASH_SIZE_BYTES];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = &data[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(pair, 16)
                .map_err(|err| HashError::ParsingError(format!("{}", err)))?;
        }
        Ok(Hash(bytes))
    }
}

impl FromStr for Hash {
    type Err = HashError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s)
    }
}

/// Serializer for `Hash`
#[derive(Default, Clone)]
pub struct HashSerializer;

impl HashSerializer {
    /// Creates a serializer for `Hash`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<Hash> for HashSerializer {
    fn serialize(&self, value: &Hash, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend(value.to_bytes());
        Ok(())
    }
}

/// Deserializer for `Hash`
#[derive(Default, Clone)]
pub struct HashDeserializer;

impl HashDeserializer {
    /// Creates a deserializer for `Hash`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<Hash> for HashDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Hash, E> {
        context("Failed hash deserialization", |input: &'a [u8]| {
            if input.len() < HASH_SIZE_BYTES {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    nom::error::ErrorKind::LengthValue,
                )));
            }
            let mut bytes = [0u8; HASH_SIZE_BYTES];
            bytes.copy_from_slice(&input[..HASH_SIZE_BYTES]);
            Ok((&input[HASH_SIZE_BYTES..], Hash(bytes)))
        })(buffer)
    }
}

impl ::serde::Serialize for Hash {
    /// Human-readable serializers get the hex form, binary ones the raw
    /// bytes.
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.collect_str(&self)
        } else {
            s.serialize_bytes(self.to_bytes())
        }
    }
}

impl<'de> ::serde::Deserialize<'de> for Hash {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<Hash, D::Error> {
        if d.is_human_readable() {
            struct HexVisitor;

            impl<'de> ::serde::de::Visitor<'de> for HexVisitor {
                type Value = Hash;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("a 64-character hex string")
                }

                fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
                where
                    E: ::serde::de::Error,
                {
                    Hash::from_hex(v).map_err(E::custom)
                }
            }
            d.deserialize_str(HexVisitor)
        } else {
            struct BytesVisitor;

            impl<'de> ::serde::de::Visitor<'de> for BytesVisitor {
                type Value = Hash;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("a bytestring")
                }

                fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
                where
                    E: ::serde::de::Error,
                {
                    Ok(Hash::from_bytes(v.try_into().map_err(E::custom)?))
                }
            }

            d.deserialize_bytes(BytesVisitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha512_half() {
        // SHA-512("abc") truncated to 32 bytes
        let hash = Hash::compute_from(b"abc");
        assert_eq!(
            hash.to_string(),
            "DDAF35A193617ABACC417349AE20413112E6FA4E89A97EA20A9EEEE64B55D39A"
        );
    }

    #[test]
    fn test_prefixed_equals_manual_concat() {
        let body = [1u8, 2, 3, 4];
        let prefixed = Hash::compute_from_prefixed(HashPrefix::TransactionId, &[&body]);
        let mut manual = b"TXN\0".to_vec();
        manual.extend_from_slice(&body);
        assert_eq!(prefixed, Hash::compute_from(&manual));
    }

    #[test]
    fn test_hex_roundtrip() {
        let hash = Hash::compute_from(b"hello world");
        let parsed = Hash::from_hex(&hash.to_string()).unwrap();
        assert_eq!(hash, parsed);
        assert!(Hash::from_hex("abcd").is_err());
    }

    #[test]
    fn test_serde_json() {
        let hash = Hash::compute_from(b"hello world");
        let serialized = serde_json::to_string(&hash).unwrap();
        let deserialized: Hash = serde_json::from_str(&serialized).unwrap();
        assert_eq!(hash, deserialized);
    }
}
