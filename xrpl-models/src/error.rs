use displaydoc::Display;
use thiserror::Error;

/// models error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum ModelsError {
    /// amount parsing error: {0}
    AmountParseError(String),
    /// amount arithmetic overflow
    AmountOverflow,
    /// account id parsing error: {0}
    AccountParseError(String),
    /// currency parsing error: {0}
    CurrencyParseError(String),
    /// malformed wire data: {0}
    Malformed(String),
    /// serialization error: {0}
    SerializeError(String),
}

impl From<xrpl_serialization::SerializeError> for ModelsError {
    fn from(err: xrpl_serialization::SerializeError) -> Self {
        ModelsError::SerializeError(err.to_string())
    }
}
