//! Variable-length prefix codec.
//!
//! Lengths in [0, 918744] are framed in one to three bytes. The size classes
//! and their continuation rules are consensus-critical:
//!
//! | first byte | form | length |
//! |---|---|---|
//! | 0..=192 | 1 byte | `b0` |
//! | 193..=240 | 2 bytes | `193 + (b0 - 193) * 256 + b1` |
//! | 241..=254 | 3 bytes | `12481 + (b0 - 241) * 65536 + b1 * 256 + b2` |

use crate::{take_exact, Deserializer, SerializeError, Serializer, MAX_VL_LENGTH};
use nom::{
    error::{context, ContextError, ParseError},
    IResult,
};

/// Serializer for a variable-length prefix (the length alone, no payload).
#[derive(Clone, Default)]
pub struct VlLengthSerializer;

impl VlLengthSerializer {
    /// Create a serializer for variable-length prefixes.
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<usize> for VlLengthSerializer {
    fn serialize(&self, value: &usize, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        let len = *value;
        if len <= 192 {
            buffer.push(len as u8);
        } else if len <= 12_480 {
            let rem = len - 193;
            buffer.push(193 + (rem >> 8) as u8);
            buffer.push((rem & 0xFF) as u8);
        } else if len <= MAX_VL_LENGTH {
            let rem = len - 12_481;
            buffer.push(241 + (rem >> 16) as u8);
            buffer.push(((rem >> 8) & 0xFF) as u8);
            buffer.push((rem & 0xFF) as u8);
        } else {
            return Err(SerializeError::LengthTooBig(format!(
                "variable-length prefix cannot carry {} bytes",
                len
            )));
        }
        Ok(())
    }
}

/// Deserializer for a variable-length prefix.
#[derive(Clone, Default)]
pub struct VlLengthDeserializer;

impl VlLengthDeserializer {
    /// Create a deserializer for variable-length prefixes.
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<usize> for VlLengthDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], usize, E> {
        context("Failed VL prefix deserialization", |input: &'a [u8]| {
            let (rest, b0) = take_exact(input, 1)?;
            let b0 = b0[0] as usize;
            match b0 {
                0..=192 => Ok((rest, b0)),
                193..=240 => {
                    let (rest, b1) = take_exact(rest, 1)?;
                    Ok((rest, 193 + (b0 - 193) * 256 + b1[0] as usize))
                }
                241..=254 => {
                    let (rest, tail) = take_exact(rest, 2)?;
                    Ok((
                        rest,
                        12_481 + (b0 - 241) * 65_536 + tail[0] as usize * 256 + tail[1] as usize,
                    ))
                }
                _ => Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    nom::error::ErrorKind::Verify,
                ))),
            }
        })(buffer)
    }
}

/// Serializer for a VL-prefixed byte blob.
#[derive(Clone, Default)]
pub struct VecU8Serializer {
    length_serializer: VlLengthSerializer,
}

impl VecU8Serializer {
    /// Create a serializer for VL-prefixed blobs.
    pub const fn new() -> Self {
        Self {
            length_serializer: VlLengthSerializer::new(),
        }
    }
}

impl Serializer<Vec<u8>> for VecU8Serializer {
    fn serialize(&self, value: &Vec<u8>, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.length_serializer.serialize(&value.len(), buffer)?;
        buffer.extend_from_slice(value);
        Ok(())
    }
}

/// Deserializer for a VL-prefixed byte blob.
#[derive(Clone, Default)]
pub struct VecU8Deserializer {
    length_deserializer: VlLengthDeserializer,
}

impl VecU8Deserializer {
    /// Create a deserializer for VL-prefixed blobs.
    pub const fn new() -> Self {
        Self {
            length_deserializer: VlLengthDeserializer::new(),
        }
    }
}

impl Deserializer<Vec<u8>> for VecU8Deserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Vec<u8>, E> {
        context("Failed VL blob deserialization", |input: &'a [u8]| {
            let (rest, len) = self.length_deserializer.deserialize(input)?;
            let (rest, data) = take_exact(rest, len)?;
            Ok((rest, data.to_vec()))
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeserializeError;

    fn encode(len: usize) -> Result<Vec<u8>, SerializeError> {
        let mut buffer = Vec::new();
        VlLengthSerializer::new().serialize(&len, &mut buffer)?;
        Ok(buffer)
    }

    #[test]
    fn test_vl_encoding_vectors() {
        // one-byte class
        assert_eq!(hex::encode(encode(0).unwrap()), "00");
        assert_eq!(hex::encode(encode(1).unwrap()), "01");
        assert_eq!(hex::encode(encode(100).unwrap()), "64");
        assert_eq!(hex::encode(encode(192).unwrap()), "c0");
        // two-byte class
        assert_eq!(hex::encode(encode(193).unwrap()), "c100");
        assert_eq!(hex::encode(encode(200).unwrap()), "c107");
        assert_eq!(hex::encode(encode(1000).unwrap()), "c427");
        assert_eq!(hex::encode(encode(12479).unwrap()), "f0fe");
        assert_eq!(hex::encode(encode(12480).unwrap()), "f0ff");
        // three-byte class
        assert_eq!(hex::encode(encode(12481).unwrap()), "f10000");
        assert_eq!(hex::encode(encode(100000).unwrap()), "f255df");
        assert_eq!(hex::encode(encode(918744).unwrap()), "fed417");
        // beyond the maximum
        assert!(encode(918745).is_err());
    }

    #[test]
    fn test_vl_decoding_vectors() {
        let deserializer = VlLengthDeserializer::new();
        for (input, expected) in [
            ("00", 0usize),
            ("01", 1),
            ("c0", 192),
            ("c100", 193),
            ("c107", 200),
            ("f0fe", 12479),
            ("f0ff", 12480),
            ("f10000", 12481),
            ("fed417", 918744),
        ] {
            let data = hex::decode(input).unwrap();
            let (rest, len) = deserializer
                .deserialize::<DeserializeError>(&data)
                .unwrap();
            assert!(rest.is_empty());
            assert_eq!(len, expected, "vector {}", input);
        }
    }

    #[test]
    fn test_vl_roundtrip() {
        let deserializer = VlLengthDeserializer::new();
        for len in [
            0usize, 1, 10, 100, 192, 193, 200, 1000, 5000, 12480, 12481, 50000, 100000, 918744,
        ] {
            let encoded = encode(len).unwrap();
            let (rest, decoded) = deserializer
                .deserialize::<DeserializeError>(&encoded)
                .unwrap();
            assert!(rest.is_empty());
            assert_eq!(decoded, len);
        }
    }

    #[test]
    fn test_blob_roundtrip() {
        let serializer = VecU8Serializer::new();
        let deserializer = VecU8Deserializer::new();
        let blob = vec![0xAB; 300];
        let mut buffer = Vec::new();
        serializer.serialize(&blob, &mut buffer).unwrap();
        let (rest, decoded) = deserializer
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, blob);
    }

    #[test]
    fn test_blob_truncated() {
        let deserializer = VecU8Deserializer::new();
        // prefix says 5 bytes, only 2 present
        assert!(deserializer
            .deserialize::<DeserializeError>(&[0x05, 0x01, 0x02])
            .is_err());
    }
}
