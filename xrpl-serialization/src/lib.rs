//! Canonical binary serialization primitives shared by every wire-visible
//! type in the workspace.
//!
//! The XRP Ledger wire format is fixed-width big-endian with three framing
//! devices layered on top: a 1-3 byte variable-length prefix for blobs, a
//! 1-3 byte field header identifying (type code, field code), and domain
//! prefixes applied before hashing. All three live here so that model
//! serializers only compose them.

#![warn(missing_docs)]

use std::{
    collections::VecDeque,
    fmt::{Debug, Display},
};

use displaydoc::Display;
use nom::{
    error::{context, ContextError, ParseError},
    IResult,
};
use thiserror::Error;

mod field_header;
mod integers;
mod vl;

pub use field_header::{FieldHeader, FieldHeaderDeserializer, FieldHeaderSerializer};
pub use integers::{
    U16BeDeserializer, U16BeSerializer, U32BeDeserializer, U32BeSerializer, U64BeDeserializer,
    U64BeSerializer, U8Deserializer, U8Serializer,
};
pub use vl::{VecU8Deserializer, VecU8Serializer, VlLengthDeserializer, VlLengthSerializer};

/// Largest length a variable-length prefix can carry.
pub const MAX_VL_LENGTH: usize = 918_744;

#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
/// Errors raised while serializing a value
pub enum SerializeError {
    /// Number {0} is too big to be serialized
    NumberTooBig(String),
    /// Variable-length payload too long: {0}
    LengthTooBig(String),
    /// Value is not in canonical form: {0}
    NotCanonical(String),
    /// General error {0}
    GeneralError(String),
}

/// nom-compatible error accumulating context labels while deserializing.
#[derive(Clone, Error)]
pub struct DeserializeError<'a> {
    errors: VecDeque<(&'a [u8], String)>,
}

impl<'a> ContextError<&'a [u8]> for DeserializeError<'a> {
    fn add_context(input: &'a [u8], ctx: &'static str, mut other: Self) -> Self {
        other.errors.push_front((input, ctx.to_string()));
        other
    }
}

impl<'a> ParseError<&'a [u8]> for DeserializeError<'a> {
    fn append(input: &'a [u8], kind: nom::error::ErrorKind, mut other: Self) -> Self {
        other
            .errors
            .push_front((input, kind.description().to_string()));
        other
    }
    fn from_error_kind(input: &'a [u8], kind: nom::error::ErrorKind) -> Self {
        let mut errors = VecDeque::new();
        errors.push_front((input, kind.description().to_string()));
        Self { errors }
    }
    fn from_char(input: &'a [u8], _: char) -> Self {
        Self::from_error_kind(input, nom::error::ErrorKind::Char)
    }
    fn or(self, other: Self) -> Self {
        other
    }
}

impl<'a> Display for DeserializeError<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for error in &self.errors {
            write!(f, "{} / ", error.1)?;
        }
        Ok(())
    }
}

impl<'a> Debug for DeserializeError<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut last_input = None;
        for error in &self.errors {
            write!(f, "{} / ", error.1)?;
            last_input = Some(error.0);
        }
        if let Some(last_input) = last_input {
            writeln!(f, "Input: {:?}", last_input)?;
        }
        Ok(())
    }
}

/// Trait implemented by the deserializer companion of every wire type.
///
/// Deserializers are nom parsers: they consume from the front of `buffer`
/// and return the rest alongside the decoded value. Constraints (ranges,
/// canonical-form checks) live on the deserializer instance.
pub trait Deserializer<T> {
    /// Deserialize a value `T` from a buffer of `u8`.
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], T, E>;
}

/// Trait implemented by the serializer companion of every wire type.
///
/// Serialization is canonical: for a given logical value the produced bytes
/// are a total function, because they feed consensus-defining hashes.
pub trait Serializer<T> {
    /// Serialize a value `T` into a buffer of `u8`.
    fn serialize(&self, value: &T, buffer: &mut Vec<u8>) -> Result<(), SerializeError>;
}

/// Helper shared by fixed-width parsers: take `n` bytes or fail with a
/// length error.
pub(crate) fn take_exact<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
    buffer: &'a [u8],
    n: usize,
) -> IResult<&'a [u8], &'a [u8], E> {
    context("Failed byte read", |input: &'a [u8]| {
        if input.len() < n {
            return Err(nom::Err::Error(ParseError::from_error_kind(
                input,
                nom::error::ErrorKind::LengthValue,
            )));
        }
        Ok((&input[n..], &input[..n]))
    })(buffer)
}
