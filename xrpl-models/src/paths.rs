//! Payment paths.
//!
//! A path is a list of elements, each naming an account, a currency, an
//! issuer, or a combination. On the wire a path set is the concatenation of
//! its paths separated by 0xFF and terminated by 0x00; each element is one
//! flag byte followed by the fields its bits announce.

use crate::account::{AccountId, ACCOUNT_ID_SIZE_BYTES};
use crate::currency::{Currency, CURRENCY_SIZE_BYTES};
use nom::{
    error::{context, ContextError, ParseError},
    IResult,
};
use serde::{Deserialize, Serialize};
use xrpl_serialization::{Deserializer, SerializeError, Serializer};

/// Element carries an account hop.
pub const PATH_ELEMENT_ACCOUNT: u8 = 0x01;
/// Element switches currency.
pub const PATH_ELEMENT_CURRENCY: u8 = 0x10;
/// Element switches issuer.
pub const PATH_ELEMENT_ISSUER: u8 = 0x20;

const PATH_SEPARATOR: u8 = 0xFF;
const PATHSET_END: u8 = 0x00;

/// One hop of a path.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct PathElement {
    /// Account to ripple through.
    pub account: Option<AccountId>,
    /// Currency to change into.
    pub currency: Option<Currency>,
    /// Issuer to change to.
    pub issuer: Option<AccountId>,
}

impl PathElement {
    /// An account hop.
    pub fn account(account: AccountId) -> Self {
        PathElement {
            account: Some(account),
            ..Default::default()
        }
    }

    /// A currency/issuer change (an implied order book).
    pub fn book(currency: Currency, issuer: Option<AccountId>) -> Self {
        PathElement {
            account: None,
            currency: Some(currency),
            issuer,
        }
    }

    /// The wire flag byte.
    pub fn type_bits(&self) -> u8 {
        let mut bits = 0;
        if self.account.is_some() {
            bits |= PATH_ELEMENT_ACCOUNT;
        }
        if self.currency.is_some() {
            bits |= PATH_ELEMENT_CURRENCY;
        }
        if self.issuer.is_some() {
            bits |= PATH_ELEMENT_ISSUER;
        }
        bits
    }

    /// An element with no type bits is malformed.
    pub fn is_empty(&self) -> bool {
        self.type_bits() == 0
    }
}

/// One ordered sequence of hops.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Path(pub Vec<PathElement>);

/// The set of explicit paths a payment carries.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct PathSet(pub Vec<Path>);

impl PathSet {
    /// True when no explicit paths are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Serializer for `PathSet`
#[derive(Clone, Default)]
pub struct PathSetSerializer;

impl PathSetSerializer {
    /// Creates a serializer for `PathSet`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<PathSet> for PathSetSerializer {
    fn serialize(&self, value: &PathSet, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        for (i, path) in value.0.iter().enumerate() {
            if i > 0 {
                buffer.push(PATH_SEPARATOR);
            }
            for element in &path.0 {
                let bits = element.type_bits();
                if bits == 0 {
                    return Err(SerializeError::NotCanonical(
                        "path element with no type bits".to_string(),
                    ));
                }
                buffer.push(bits);
                if let Some(account) = &element.account {
                    buffer.extend_from_slice(account.to_bytes());
                }
                if let Some(currency) = &element.currency {
                    buffer.extend_from_slice(currency.to_bytes());
                }
                if let Some(issuer) = &element.issuer {
                    buffer.extend_from_slice(issuer.to_bytes());
                }
            }
        }
        buffer.push(PATHSET_END);
        Ok(())
    }
}

/// Deserializer for `PathSet`
#[derive(Clone, Default)]
pub struct PathSetDeserializer;

impl PathSetDeserializer {
    /// Creates a deserializer for `PathSet`
    pub const fn new() -> Self {
        Self
    }
}

fn take_fixed<'a, const N: usize, E: ParseError<&'a [u8]>>(
    input: &'a [u8],
) -> Result<(&'a [u8], [u8; N]), nom::Err<E>> {
    if input.len() < N {
        return Err(nom::Err::Error(ParseError::from_error_kind(
            input,
            nom::error::ErrorKind::LengthValue,
        )));
    }
    // cannot fail, length checked
    let bytes: [u8; N] = input[..N].try_into().unwrap();
    Ok((&input[N..], bytes))
}

impl Deserializer<PathSet> for PathSetDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], PathSet, E> {
        context("Failed PathSet deserialization", |input: &'a [u8]| {
            let mut rest = input;
            let mut paths = Vec::new();
            let mut current = Path::default();
            loop {
                let Some((&flag, tail)) = rest.split_first() else {
                    return Err(nom::Err::Error(ParseError::from_error_kind(
                        input,
                        nom::error::ErrorKind::Eof,
                    )));
                };
                rest = tail;
                match flag {
                    PATHSET_END => {
                        if !current.0.is_empty() {
                            paths.push(current);
                        }
                        return Ok((rest, PathSet(paths)));
                    }
                    PATH_SEPARATOR => {
                        if current.0.is_empty() {
                            // empty path before a separator is malformed
                            return Err(nom::Err::Error(ParseError::from_error_kind(
                                input,
                                nom::error::ErrorKind::Verify,
                            )));
                        }
                        paths.push(std::mem::take(&mut current));
                    }
                    bits => {
                        if bits & !(PATH_ELEMENT_ACCOUNT | PATH_ELEMENT_CURRENCY | PATH_ELEMENT_ISSUER)
                            != 0
                        {
                            return Err(nom::Err::Error(ParseError::from_error_kind(
                                input,
                                nom::error::ErrorKind::Verify,
                            )));
                        }
                        let mut element = PathElement::default();
                        if bits & PATH_ELEMENT_ACCOUNT != 0 {
                            let (tail, bytes) =
                                take_fixed::<ACCOUNT_ID_SIZE_BYTES, E>(rest)?;
                            rest = tail;
                            element.account = Some(AccountId::from_bytes(bytes));
                        }
                        if bits & PATH_ELEMENT_CURRENCY != 0 {
                            let (tail, bytes) = take_fixed::<CURRENCY_SIZE_BYTES, E>(rest)?;
                            rest = tail;
                            element.currency = Some(Currency::from_bytes(bytes));
                        }
                        if bits & PATH_ELEMENT_ISSUER != 0 {
                            let (tail, bytes) =
                                take_fixed::<ACCOUNT_ID_SIZE_BYTES, E>(rest)?;
                            rest = tail;
                            element.issuer = Some(AccountId::from_bytes(bytes));
                        }
                        current.0.push(element);
                    }
                }
            }
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xrpl_serialization::DeserializeError;

    fn account(byte: u8) -> AccountId {
        AccountId::from_bytes([byte; 20])
    }

    #[test]
    fn test_roundtrip() {
        let usd = Currency::from_standard_code("USD").unwrap();
        let set = PathSet(vec![
            Path(vec![
                PathElement::account(account(1)),
                PathElement::book(usd, Some(account(2))),
            ]),
            Path(vec![PathElement::account(account(3))]),
        ]);
        let mut buffer = Vec::new();
        PathSetSerializer::new().serialize(&set, &mut buffer).unwrap();
        // account elem: 1+20; book elem: 1+20+20; separator; account elem; end
        assert_eq!(buffer.len(), 21 + 41 + 1 + 21 + 1);
        assert_eq!(buffer[buffer.len() - 1], 0x00);
        let (rest, decoded) = PathSetDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, set);
    }

    #[test]
    fn test_empty_set_is_one_byte() {
        let mut buffer = Vec::new();
        PathSetSerializer::new()
            .serialize(&PathSet::default(), &mut buffer)
            .unwrap();
        assert_eq!(buffer, vec![0x00]);
    }

    #[test]
    fn test_unknown_type_bits_rejected() {
        // flag byte 0x02 is not a legal element type
        let buffer = vec![0x02, 0x00];
        assert!(PathSetDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .is_err());
    }

    #[test]
    fn test_empty_element_unserializable() {
        let set = PathSet(vec![Path(vec![PathElement::default()])]);
        let mut buffer = Vec::new();
        assert!(PathSetSerializer::new().serialize(&set, &mut buffer).is_err());
    }
}
