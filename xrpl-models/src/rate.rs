//! Transfer rates and offer quality.

use crate::amount::{Amount, IouValue, Rounding};
use crate::config::{MAX_TRANSFER_RATE, PARITY_RATE};
use crate::error::ModelsError;
use serde::{Deserialize, Serialize};

/// A transfer rate: 10^9 is parity, 1.01 * 10^9 charges 1% on transfers of
/// an issued currency through its issuer. Zero means "unset" and reads as
/// parity.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Rate(u32);

impl Rate {
    /// Parity (no transfer fee).
    pub const fn parity() -> Self {
        Rate(PARITY_RATE)
    }

    /// Validate a raw rate from a transaction or account root.
    pub fn new(raw: u32) -> Result<Self, ModelsError> {
        if raw != 0 && !(PARITY_RATE..=MAX_TRANSFER_RATE).contains(&raw) {
            return Err(ModelsError::AmountParseError(format!(
                "transfer rate {} out of range",
                raw
            )));
        }
        Ok(Rate(if raw == 0 { PARITY_RATE } else { raw }))
    }

    /// The raw billionths value.
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// True when no fee is charged.
    pub fn is_parity(&self) -> bool {
        self.0 == PARITY_RATE
    }

    /// Multiply an issued value by the rate. `Rounding::Up` computes what a
    /// sender must part with for the receiver to net `value`;
    /// `Rounding::Down` computes what crossing the issuer leaves of `value`.
    pub fn apply(&self, value: IouValue, mode: Rounding) -> Result<IouValue, ModelsError> {
        if self.is_parity() {
            return Ok(value);
        }
        let rate = IouValue::new(self.0 as i64, -9)?;
        match mode {
            Rounding::Up => value.checked_mul(rate, Rounding::Up),
            _ => value.checked_div(rate, Rounding::Down),
        }
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::parity()
    }
}

/// Offer quality: the ratio taker-pays / taker-gets used to order a book.
/// Lower is better for the taker.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct Quality(IouValue);

impl Quality {
    /// Quality of an offer from its two sides; fails on a zero taker-gets.
    pub fn from_amounts(taker_pays: &Amount, taker_gets: &Amount) -> Result<Self, ModelsError> {
        let pays = value_of(taker_pays)?;
        let gets = value_of(taker_gets)?;
        Ok(Quality(pays.checked_div(gets, Rounding::Nearest)?))
    }

    /// The underlying ratio.
    pub const fn value(&self) -> IouValue {
        self.0
    }
}

/// Read any amount as a plain numeric value (drops count as integers).
pub fn value_of(amount: &Amount) -> Result<IouValue, ModelsError> {
    match amount {
        Amount::Xrp(xrp) => IouValue::from_integer(xrp.drops()),
        Amount::Iou(iou) => Ok(iou.value),
    }
}
