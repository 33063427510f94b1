//! Field header codec.
//!
//! Every serialized field opens with a header packing its type code and
//! field code. When both fit a nibble the header is a single byte
//! `(type << 4) | field`; a code of 16 or more is pushed into a trailing
//! byte, giving 2- or 3-byte headers. Fields inside an object are sorted
//! ascending by (type code, field code).

use crate::{take_exact, Deserializer, SerializeError, Serializer};
use nom::{
    error::{context, ContextError, ParseError},
    IResult,
};

/// A field identifier: serialization type code plus field code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldHeader {
    /// Serialization type code (1..=22).
    pub type_code: u8,
    /// Field code within the type.
    pub field_code: u8,
}

impl FieldHeader {
    /// Build a field header from its two codes.
    pub const fn new(type_code: u8, field_code: u8) -> Self {
        Self {
            type_code,
            field_code,
        }
    }

    /// Sort key: ascending (type code, field code), the canonical field
    /// order inside an object.
    pub const fn ordinal(&self) -> u16 {
        ((self.type_code as u16) << 8) | self.field_code as u16
    }
}

/// Serializer for `FieldHeader`
#[derive(Clone, Default)]
pub struct FieldHeaderSerializer;

impl FieldHeaderSerializer {
    /// Creates a serializer for `FieldHeader`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<FieldHeader> for FieldHeaderSerializer {
    fn serialize(&self, value: &FieldHeader, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        if value.type_code == 0 || value.field_code == 0 {
            return Err(SerializeError::NotCanonical(format!(
                "field header codes must be non-zero, got ({}, {})",
                value.type_code, value.field_code
            )));
        }
        match (value.type_code < 16, value.field_code < 16) {
            (true, true) => buffer.push((value.type_code << 4) | value.field_code),
            (true, false) => {
                buffer.push(value.type_code << 4);
                buffer.push(value.field_code);
            }
            (false, true) => {
                buffer.push(value.field_code);
                buffer.push(value.type_code);
            }
            (false, false) => {
                buffer.push(0);
                buffer.push(value.type_code);
                buffer.push(value.field_code);
            }
        }
        Ok(())
    }
}

/// Deserializer for `FieldHeader`
#[derive(Clone, Default)]
pub struct FieldHeaderDeserializer;

impl FieldHeaderDeserializer {
    /// Creates a deserializer for `FieldHeader`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<FieldHeader> for FieldHeaderDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], FieldHeader, E> {
        context("Failed field header deserialization", |input: &'a [u8]| {
            let (rest, b0) = take_exact(input, 1)?;
            let b0 = b0[0];
            let type_nibble = b0 >> 4;
            let field_nibble = b0 & 0x0F;
            match (type_nibble, field_nibble) {
                (0, 0) => {
                    let (rest, codes) = take_exact(rest, 2)?;
                    if codes[0] < 16 || codes[1] < 16 {
                        return Err(nom::Err::Error(ParseError::from_error_kind(
                            input,
                            nom::error::ErrorKind::Verify,
                        )));
                    }
                    Ok((rest, FieldHeader::new(codes[0], codes[1])))
                }
                (0, field) => {
                    // low nibble is the field code, type follows
                    let (rest, type_code) = take_exact(rest, 1)?;
                    if type_code[0] < 16 {
                        return Err(nom::Err::Error(ParseError::from_error_kind(
                            input,
                            nom::error::ErrorKind::Verify,
                        )));
                    }
                    Ok((rest, FieldHeader::new(type_code[0], field)))
                }
                (type_code, 0) => {
                    let (rest, field_code) = take_exact(rest, 1)?;
                    if field_code[0] < 16 {
                        return Err(nom::Err::Error(ParseError::from_error_kind(
                            input,
                            nom::error::ErrorKind::Verify,
                        )));
                    }
                    Ok((rest, FieldHeader::new(type_code, field_code[0])))
                }
                (type_code, field_code) => Ok((rest, FieldHeader::new(type_code, field_code))),
            }
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeserializeError;

    fn encode(type_code: u8, field_code: u8) -> Vec<u8> {
        let mut buffer = Vec::new();
        FieldHeaderSerializer::new()
            .serialize(&FieldHeader::new(type_code, field_code), &mut buffer)
            .unwrap();
        buffer
    }

    #[test]
    fn test_single_byte_headers() {
        // TransactionType: UInt16 type=1 field=2
        assert_eq!(hex::encode(encode(1, 2)), "12");
        // LedgerEntryType: type=1 field=1
        assert_eq!(hex::encode(encode(1, 1)), "11");
        // Flags: UInt32 type=2 field=2
        assert_eq!(hex::encode(encode(2, 2)), "22");
        // Sequence: type=2 field=4
        assert_eq!(hex::encode(encode(2, 4)), "24");
        // DestinationTag: type=2 field=14
        assert_eq!(hex::encode(encode(2, 14)), "2e");
        // OwnerNode: UInt64 type=3 field=4
        assert_eq!(hex::encode(encode(3, 4)), "34");
        // EmailHash: Hash128 type=4 field=1
        assert_eq!(hex::encode(encode(4, 1)), "41");
        // Fee: Amount type=6 field=8
        assert_eq!(hex::encode(encode(6, 8)), "68");
        // Account: AccountID type=8 field=1
        assert_eq!(hex::encode(encode(8, 1)), "81");
    }

    #[test]
    fn test_multi_byte_headers() {
        // field code above 15: TickSize is UInt8 type=16 field=16
        assert_eq!(hex::encode(encode(16, 16)), "001010");
        // type above 15, field below 16
        assert_eq!(hex::encode(encode(16, 1)), "0110");
        // type below 16, field above 15
        assert_eq!(hex::encode(encode(2, 40)), "2028");
    }

    #[test]
    fn test_header_roundtrip() {
        let deserializer = FieldHeaderDeserializer::new();
        for (type_code, field_code) in
            [(1u8, 2u8), (2, 14), (6, 8), (8, 1), (16, 1), (2, 40), (16, 16)]
        {
            let encoded = encode(type_code, field_code);
            let (rest, header) = deserializer
                .deserialize::<DeserializeError>(&encoded)
                .unwrap();
            assert!(rest.is_empty());
            assert_eq!(header, FieldHeader::new(type_code, field_code));
        }
    }

    #[test]
    fn test_ordering_matches_codes() {
        let order = [
            FieldHeader::new(1, 2),
            FieldHeader::new(2, 2),
            FieldHeader::new(2, 3),
            FieldHeader::new(2, 4),
            FieldHeader::new(2, 14),
            FieldHeader::new(6, 8),
            FieldHeader::new(8, 1),
        ];
        let mut sorted = order;
        sorted.sort_by_key(|h| h.ordinal());
        assert_eq!(sorted, order);
    }
}
