//! Fixed-width big-endian integer codecs.
//!
//! Unlike varint encodings, the XRPL wire format stores every integer at its
//! declared width in network byte order; the deserializers still carry an
//! inclusive-bound range so callers can constrain counts and codes at the
//! parsing boundary.

use crate::{take_exact, Deserializer, SerializeError, Serializer};
use nom::{
    error::{context, ContextError, ParseError},
    IResult,
};
use std::ops::{Bound, RangeBounds};

macro_rules! gen_be_int {
    ($($type:ident, $s:ident, $ds:ident, $d:expr);*) => {
        $(
            #[doc = " Serializer for "]
            #[doc = $d]
            #[doc = " in big-endian form."]
            #[derive(Clone, Default)]
            pub struct $s;

            impl $s {
                #[doc = "Create a serializer for "]
                #[doc = $d]
                #[doc = " in big-endian form."]
                pub const fn new() -> Self {
                    Self
                }
            }

            impl Serializer<$type> for $s {
                fn serialize(&self, value: &$type, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
                    buffer.extend_from_slice(&value.to_be_bytes());
                    Ok(())
                }
            }

            #[doc = " Deserializer for "]
            #[doc = $d]
            #[doc = " in big-endian form."]
            #[derive(Clone)]
            pub struct $ds {
                range: (Bound<$type>, Bound<$type>),
            }

            impl $ds {
                #[doc = "Create a deserializer for "]
                #[doc = $d]
                #[doc = " constrained to the given range."]
                pub const fn new(min: Bound<$type>, max: Bound<$type>) -> Self {
                    Self { range: (min, max) }
                }
            }

            impl Default for $ds {
                fn default() -> Self {
                    Self::new(Bound::Included($type::MIN), Bound::Included($type::MAX))
                }
            }

            impl Deserializer<$type> for $ds {
                fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
                    &self,
                    buffer: &'a [u8],
                ) -> IResult<&'a [u8], $type, E> {
                    context(concat!("Failed ", stringify!($type), " deserialization"), |input: &'a [u8]| {
                        let (rest, raw) = take_exact(input, std::mem::size_of::<$type>())?;
                        // try_into cannot fail: take_exact returned the exact width
                        let value = $type::from_be_bytes(raw.try_into().unwrap());
                        if !self.range.contains(&value) {
                            return Err(nom::Err::Error(ParseError::from_error_kind(
                                input,
                                nom::error::ErrorKind::Verify,
                            )));
                        }
                        Ok((rest, value))
                    })(buffer)
                }
            }
        )*
    };
}

gen_be_int! {
    u8, U8Serializer, U8Deserializer, "`u8`";
    u16, U16BeSerializer, U16BeDeserializer, "`u16`";
    u32, U32BeSerializer, U32BeDeserializer, "`u32`";
    u64, U64BeSerializer, U64BeDeserializer, "`u64`"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeserializeError;

    #[test]
    fn test_u32_roundtrip() {
        let serializer = U32BeSerializer::new();
        let deserializer = U32BeDeserializer::default();
        let mut buffer = Vec::new();
        serializer.serialize(&0xDEAD_BEEFu32, &mut buffer).unwrap();
        assert_eq!(buffer, vec![0xDE, 0xAD, 0xBE, 0xEF]);
        let (rest, value) = deserializer
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(value, 0xDEAD_BEEF);
    }

    #[test]
    fn test_range_rejected() {
        let deserializer = U16BeDeserializer::new(Bound::Included(1), Bound::Included(10));
        assert!(deserializer
            .deserialize::<DeserializeError>(&[0x00, 0x00])
            .is_err());
        assert!(deserializer
            .deserialize::<DeserializeError>(&[0x00, 0x0B])
            .is_err());
        assert!(deserializer
            .deserialize::<DeserializeError>(&[0x00, 0x0A])
            .is_ok());
    }

    #[test]
    fn test_truncated_input() {
        let deserializer = U64BeDeserializer::default();
        assert!(deserializer
            .deserialize::<DeserializeError>(&[0x01, 0x02, 0x03])
            .is_err());
    }
}
