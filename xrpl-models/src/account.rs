//! Account identifiers and the address codec.

use crate::error::ModelsError;
use nom::{
    error::{context, ContextError, ParseError},
    IResult,
};
use std::{cmp::Ordering, str::FromStr};
use xrpl_serialization::{
    Deserializer, SerializeError, Serializer, VlLengthDeserializer, VlLengthSerializer,
};
use xrpl_signature::PublicKey;

/// Size in bytes of an account id.
pub const ACCOUNT_ID_SIZE_BYTES: usize = 20;

/// Address type prefix byte for account ids ("r..." addresses).
const ACCOUNT_ADDRESS_PREFIX: u8 = 0x00;

/// A 160-bit account identifier, the RIPEMD-160∘SHA-256 digest of the
/// account's master public key.
///
/// Equality and ordering are byte-lexicographic; trust-line keys rely on
/// that order to pick their low/high sides.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct AccountId([u8; ACCOUNT_ID_SIZE_BYTES]);

impl PartialOrd for AccountId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AccountId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_address())
    }
}

impl std::fmt::Debug for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_address())
    }
}

impl AccountId {
    /// The all-zero sentinel account, the "issuer" of the native currency.
    pub const fn zero() -> Self {
        AccountId([0u8; ACCOUNT_ID_SIZE_BYTES])
    }

    /// True if this is the all-zero sentinel.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ACCOUNT_ID_SIZE_BYTES]
    }

    /// Derive an account id from a public key.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        AccountId(xrpl_signature::account_id_digest(public_key))
    }

    /// Account id as bytes.
    pub fn to_bytes(&self) -> &[u8; ACCOUNT_ID_SIZE_BYTES] {
        &self.0
    }

    /// Account id from bytes.
    pub const fn from_bytes(data: [u8; ACCOUNT_ID_SIZE_BYTES]) -> Self {
        AccountId(data)
    }

    /// Render as a ripple-alphabet base58check address ("r...").
    pub fn to_address(&self) -> String {
        let mut payload = Vec::with_capacity(1 + ACCOUNT_ID_SIZE_BYTES);
        payload.push(ACCOUNT_ADDRESS_PREFIX);
        payload.extend_from_slice(&self.0);
        bs58::encode(payload)
            .with_alphabet(bs58::Alphabet::RIPPLE)
            .with_check()
            .into_string()
    }

    /// Parse a base58check address, rejecting bad checksums, wrong payload
    /// sizes and wrong type prefixes.
    pub fn from_address(address: &str) -> Result<Self, ModelsError> {
        let decoded = bs58::decode(address)
            .with_alphabet(bs58::Alphabet::RIPPLE)
            .with_check(Some(ACCOUNT_ADDRESS_PREFIX))
            .into_vec()
            .map_err(|err| ModelsError::AccountParseError(format!("{}", err)))?;
        let bytes: [u8; ACCOUNT_ID_SIZE_BYTES] =
            decoded[1..].try_into().map_err(|_| {
                ModelsError::AccountParseError(format!(
                    "expected {} payload bytes, got {}",
                    ACCOUNT_ID_SIZE_BYTES,
                    decoded.len() - 1
                ))
            })?;
        Ok(AccountId(bytes))
    }
}

impl FromStr for AccountId {
    type Err = ModelsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountId::from_address(s)
    }
}

/// Serializer for `AccountId` in its VL-prefixed wire form (the form used
/// inside transactions and ledger entries).
#[derive(Clone, Default)]
pub struct AccountIdSerializer {
    length_serializer: VlLengthSerializer,
}

impl AccountIdSerializer {
    /// Creates a serializer for `AccountId`
    pub const fn new() -> Self {
        Self {
            length_serializer: VlLengthSerializer::new(),
        }
    }
}

impl Serializer<AccountId> for AccountIdSerializer {
    fn serialize(&self, value: &AccountId, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.length_serializer
            .serialize(&ACCOUNT_ID_SIZE_BYTES, buffer)?;
        buffer.extend_from_slice(value.to_bytes());
        Ok(())
    }
}

/// Deserializer for `AccountId` in its VL-prefixed wire form.
#[derive(Clone, Default)]
pub struct AccountIdDeserializer {
    length_deserializer: VlLengthDeserializer,
}

impl AccountIdDeserializer {
    /// Creates a deserializer for `AccountId`
    pub const fn new() -> Self {
        Self {
            length_deserializer: VlLengthDeserializer::new(),
        }
    }
}

impl Deserializer<AccountId> for AccountIdDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], AccountId, E> {
        context("Failed AccountId deserialization", |input: &'a [u8]| {
            let (rest, len) = self.length_deserializer.deserialize(input)?;
            if len != ACCOUNT_ID_SIZE_BYTES || rest.len() < ACCOUNT_ID_SIZE_BYTES {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    nom::error::ErrorKind::LengthValue,
                )));
            }
            let mut bytes = [0u8; ACCOUNT_ID_SIZE_BYTES];
            bytes.copy_from_slice(&rest[..ACCOUNT_ID_SIZE_BYTES]);
            Ok((&rest[ACCOUNT_ID_SIZE_BYTES..], AccountId(bytes)))
        })(buffer)
    }
}

impl ::serde::Serialize for AccountId {
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.collect_str(&self.to_address())
        } else {
            s.serialize_bytes(self.to_bytes())
        }
    }
}

impl<'de> ::serde::Deserialize<'de> for AccountId {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<AccountId, D::Error> {
        if d.is_human_readable() {
            struct AddressVisitor;

            impl<'de> ::serde::de::Visitor<'de> for AddressVisitor {
                type Value = AccountId;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("a base58check account address")
                }

                fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
                where
                    E: ::serde::de::Error,
                {
                    AccountId::from_address(v).map_err(E::custom)
                }
            }
            d.deserialize_str(AddressVisitor)
        } else {
            struct BytesVisitor;

            impl<'de> ::serde::de::Visitor<'de> for BytesVisitor {
                type Value = AccountId;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("a bytestring")
                }

                fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
                where
                    E: ::serde::de::Error,
                {
                    Ok(AccountId::from_bytes(v.try_into().map_err(E::custom)?))
                }
            }
            d.deserialize_bytes(BytesVisitor)
        }
    }
}
