//! Currency codes.

use crate::error::ModelsError;
use std::{cmp::Ordering, str::FromStr};

/// Size in bytes of a currency code.
pub const CURRENCY_SIZE_BYTES: usize = 20;

/// A 160-bit currency code.
///
/// Two shapes exist: the reserved all-zero native code (rendered "XRP") and
/// issued codes, either a 3-letter ASCII code zero-padded into bytes 12..15
/// or an arbitrary 160-bit value. Native and issued never interoperate.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct Currency([u8; CURRENCY_SIZE_BYTES]);

impl PartialOrd for Currency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Currency {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Currency {
    /// The native currency code (all zeros).
    pub const fn xrp() -> Self {
        Currency([0u8; CURRENCY_SIZE_BYTES])
    }

    /// True for the native code.
    pub fn is_xrp(&self) -> bool {
        self.0 == [0u8; CURRENCY_SIZE_BYTES]
    }

    /// Build an issued currency from a 3-letter ASCII code.
    pub fn from_standard_code(code: &str) -> Result<Self, ModelsError> {
        if code == "XRP" {
            return Err(ModelsError::CurrencyParseError(
                "the native code is reserved; issued currencies cannot be named XRP".to_string(),
            ));
        }
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(|b| b.is_ascii_alphanumeric()) {
            return Err(ModelsError::CurrencyParseError(format!(
                "invalid standard currency code {:?}",
                code
            )));
        }
        let mut out = [0u8; CURRENCY_SIZE_BYTES];
        out[12..15].copy_from_slice(bytes);
        Ok(Currency(out))
    }

    /// Build a currency from its raw 160-bit form.
    pub const fn from_bytes(data: [u8; CURRENCY_SIZE_BYTES]) -> Self {
        Currency(data)
    }

    /// Currency as bytes.
    pub fn to_bytes(&self) -> &[u8; CURRENCY_SIZE_BYTES] {
        &self.0
    }

    /// True if this is a zero-padded 3-letter code.
    fn standard_code(&self) -> Option<&[u8]> {
        let (head, tail) = (&self.0[..12], &self.0[15..]);
        if head.iter().all(|&b| b == 0)
            && tail.iter().all(|&b| b == 0)
            && self.0[12..15].iter().all(|b| b.is_ascii_alphanumeric())
        {
            Some(&self.0[12..15])
        } else {
            None
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.is_xrp() {
            return write!(f, "XRP");
        }
        match self.standard_code() {
            // standard_code only returns valid ASCII
            Some(code) => write!(f, "{}", std::str::from_utf8(code).unwrap()),
            None => {
                for byte in &self.0 {
                    write!(f, "{:02X}", byte)?;
                }
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for Currency {
    type Err = ModelsError;

    /// Accepts "XRP", a 3-letter code, or 40 hex characters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "XRP" {
            return Ok(Currency::xrp());
        }
        if s.len() == 3 {
            return Currency::from_standard_code(s);
        }
        if s.len() == CURRENCY_SIZE_BYTES * 2 {
            let mut bytes = [0u8; CURRENCY_SIZE_BYTES];
            for (i, byte) in bytes.iter_mut().enumerate() {
                *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                    .map_err(|err| ModelsError::CurrencyParseError(format!("{}", err)))?;
            }
            return Ok(Currency(bytes));
        }
        Err(ModelsError::CurrencyParseError(format!(
            "cannot parse currency from {:?}",
            s
        )))
    }
}

impl ::serde::Serialize for Currency {
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.collect_str(&self)
        } else {
            s.serialize_bytes(self.to_bytes())
        }
    }
}

impl<'de> ::serde::Deserialize<'de> for Currency {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<Currency, D::Error> {
        struct CurrencyVisitor;

        impl<'de> ::serde::de::Visitor<'de> for CurrencyVisitor {
            type Value = Currency;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a currency code")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: ::serde::de::Error,
            {
                Currency::from_str(v).map_err(E::custom)
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: ::serde::de::Error,
            {
                Ok(Currency::from_bytes(v.try_into().map_err(E::custom)?))
            }
        }
        if d.is_human_readable() {
            d.deserialize_str(CurrencyVisitor)
        } else {
            d.deserialize_bytes(CurrencyVisitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_code_layout() {
        let usd = Currency::from_standard_code("USD").unwrap();
        assert_eq!(
            hex::encode(usd.to_bytes()),
            "0000000000000000000000005553440000000000"
        );
        let eur = Currency::from_standard_code("EUR").unwrap();
        assert_eq!(
            hex::encode(eur.to_bytes()),
            "0000000000000000000000004555520000000000"
        );
        let btc = Currency::from_standard_code("BTC").unwrap();
        assert_eq!(
            hex::encode(btc.to_bytes()),
            "0000000000000000000000004254430000000000"
        );
    }

    #[test]
    fn test_xrp_reserved() {
        assert!(Currency::from_standard_code("XRP").is_err());
        assert!(Currency::xrp().is_xrp());
        assert_eq!(Currency::xrp().to_string(), "XRP");
    }

    #[test]
    fn test_nonstandard_roundtrip() {
        let raw = "015841551A748AD2C1F76FF6ECB0CCCD00000000";
        let currency = Currency::from_str(raw).unwrap();
        assert_eq!(currency.to_string(), raw);
        assert!(!currency.is_xrp());
    }

    #[test]
    fn test_display_standard() {
        assert_eq!(Currency::from_standard_code("USD").unwrap().to_string(), "USD");
    }
}
