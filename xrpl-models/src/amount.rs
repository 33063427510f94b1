//! Native and issued amounts, and their exact arithmetic.
//!
//! Native amounts are signed drops capped at 10^17. Issued amounts are
//! decimal floating point: a mantissa in [10^15, 10^16) with a signed
//! exponent in [-96, +80], zero having one canonical encoding. Arithmetic
//! re-normalizes after every operation using a guard that preserves the
//! digits shifted out during scale-down, so round-half-to-even and the
//! directed rounding modes are exact.

use crate::account::AccountId;
use crate::config::MAX_NATIVE_DROPS;
use crate::currency::{Currency, CURRENCY_SIZE_BYTES};
use crate::error::ModelsError;
use crate::issue::Issue;
use nom::{
    error::{context, ContextError, ParseError},
    IResult,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use xrpl_serialization::{Deserializer, SerializeError, Serializer};

/// Smallest canonical mantissa.
pub const MIN_MANTISSA: u64 = 1_000_000_000_000_000;
/// Largest canonical mantissa.
pub const MAX_MANTISSA: u64 = 9_999_999_999_999_999;
/// Smallest exponent an issued amount may carry.
pub const MIN_EXPONENT: i32 = -96;
/// Largest exponent an issued amount may carry.
pub const MAX_EXPONENT: i32 = 80;

/// Exponent used by the canonical zero.
const ZERO_EXPONENT: i32 = -100;

/// Rounding direction for multiply and divide.
///
/// Transfer-rate application depends on the direction: round down for what
/// the sender is charged, round up for what the receiver must end up with,
/// otherwise value leaks across the rate boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Round towards zero.
    Down,
    /// Round half to even.
    Nearest,
    /// Round away from zero.
    Up,
}

// ---------------------------------------------------------------------------
// Native amounts
// ---------------------------------------------------------------------------

/// A signed quantity of drops.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, Hash,
)]
pub struct XrpAmount(i64);

impl XrpAmount {
    /// Zero drops.
    pub const fn zero() -> Self {
        XrpAmount(0)
    }

    /// Build from a signed drop count; fails beyond the 10^17 cap.
    pub fn from_drops(drops: i64) -> Result<Self, ModelsError> {
        if drops.checked_abs().map_or(true, |a| a > MAX_NATIVE_DROPS) {
            return Err(ModelsError::AmountParseError(format!(
                "{} drops exceeds the native cap",
                drops
            )));
        }
        Ok(XrpAmount(drops))
    }

    /// Build from whole XRP, for fixtures.
    pub fn from_xrp(xrp: u64) -> Result<Self, ModelsError> {
        let drops = xrp
            .checked_mul(crate::config::DROPS_PER_XRP)
            .ok_or(ModelsError::AmountOverflow)?;
        Self::from_drops(drops as i64)
    }

    /// The signed drop count.
    pub const fn drops(&self) -> i64 {
        self.0
    }

    /// True if zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// True if strictly negative.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Checked addition, `None` past the cap.
    pub fn checked_add(self, other: XrpAmount) -> Option<XrpAmount> {
        let sum = self.0.checked_add(other.0)?;
        XrpAmount::from_drops(sum).ok()
    }

    /// Checked subtraction, `None` past the cap.
    pub fn checked_sub(self, other: XrpAmount) -> Option<XrpAmount> {
        let diff = self.0.checked_sub(other.0)?;
        XrpAmount::from_drops(diff).ok()
    }

    /// Negation; always representable because the cap is symmetric.
    #[must_use]
    pub const fn negate(self) -> XrpAmount {
        XrpAmount(-self.0)
    }
}

impl std::fmt::Display for XrpAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} drops", self.0)
    }
}

impl std::fmt::Debug for XrpAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

// ---------------------------------------------------------------------------
// Issued-amount value arithmetic
// ---------------------------------------------------------------------------

/// Guard preserving digits discarded while scaling a mantissa down; 16 BCD
/// digits packed into a u64 plus a sticky bit for anything shifted past
/// them. Rounding directions are magnitude-relative, so the guard does not
/// track the sign.
#[derive(Default)]
struct Guard {
    digits: u64,
    xbit: bool,
}

impl Guard {
    fn push(&mut self, digit: u64) {
        self.xbit = self.xbit || (self.digits & 0x0F) != 0;
        self.digits >>= 4;
        self.digits |= (digit & 0x0F) << 60;
    }

    fn pop(&mut self) -> u64 {
        let digit = (self.digits & 0xF000_0000_0000_0000) >> 60;
        self.digits <<= 4;
        digit
    }

    /// Rounding decision: 1 round up in magnitude, -1 round down, 0 exactly
    /// half (caller applies half-to-even).
    fn round(&self, mode: Rounding) -> i32 {
        match mode {
            Rounding::Down => -1,
            Rounding::Up => {
                if self.digits > 0 || self.xbit {
                    1
                } else {
                    -1
                }
            }
            Rounding::Nearest => {
                if self.digits > 0x5000_0000_0000_0000 {
                    1
                } else if self.digits < 0x5000_0000_0000_0000 {
                    -1
                } else if self.xbit {
                    1
                } else {
                    0
                }
            }
        }
    }
}

/// The numeric part of an issued amount: canonical mantissa and exponent,
/// without the issue.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct IouValue {
    mantissa: i64,
    exponent: i32,
}

impl IouValue {
    /// Canonical zero.
    pub const fn zero() -> Self {
        IouValue {
            mantissa: 0,
            exponent: ZERO_EXPONENT,
        }
    }

    /// Build and canonicalize from a raw (mantissa, exponent) pair.
    pub fn new(mantissa: i64, exponent: i32) -> Result<Self, ModelsError> {
        let mut value = IouValue { mantissa, exponent };
        value.normalize(Rounding::Nearest)?;
        value.clamp_range()
    }

    /// Build from an integer.
    pub fn from_integer(value: i64) -> Result<Self, ModelsError> {
        Self::new(value, 0)
    }

    /// Mantissa (signed, canonical magnitude or 0).
    pub const fn mantissa(&self) -> i64 {
        self.mantissa
    }

    /// Exponent.
    pub const fn exponent(&self) -> i32 {
        self.exponent
    }

    /// True if zero.
    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    /// True if strictly negative.
    pub fn is_negative(&self) -> bool {
        self.mantissa < 0
    }

    /// Negation.
    #[must_use]
    pub fn negate(self) -> Self {
        IouValue {
            mantissa: -self.mantissa,
            exponent: self.exponent,
        }
    }

    /// Normalize mantissa into [10^15, 10^16) applying `mode` to the digits
    /// scaled away. An exponent above the issued range is an overflow.
    fn normalize(&mut self, mode: Rounding) -> Result<(), ModelsError> {
        if self.mantissa == 0 {
            *self = IouValue::zero();
            return Ok(());
        }
        let negative = self.mantissa < 0;
        let mut mantissa = self.mantissa.unsigned_abs();
        let mut exponent = self.exponent;

        while mantissa < MIN_MANTISSA {
            if exponent <= MIN_EXPONENT {
                // underflow to the canonical zero
                *self = IouValue::zero();
                return Ok(());
            }
            mantissa *= 10;
            exponent -= 1;
        }

        let mut guard = Guard::default();
        while mantissa > MAX_MANTISSA {
            guard.push(mantissa % 10);
            mantissa /= 10;
            exponent += 1;
        }

        let round = guard.round(mode);
        if round == 1 || (round == 0 && (mantissa & 1) == 1) {
            mantissa += 1;
            if mantissa > MAX_MANTISSA {
                mantissa /= 10;
                exponent += 1;
            }
        }

        if exponent > MAX_EXPONENT {
            return Err(ModelsError::AmountOverflow);
        }
        if exponent < MIN_EXPONENT {
            *self = IouValue::zero();
            return Ok(());
        }

        self.mantissa = if negative {
            -(mantissa as i64)
        } else {
            mantissa as i64
        };
        self.exponent = exponent;
        Ok(())
    }

    fn clamp_range(self) -> Result<Self, ModelsError> {
        if self.is_zero() {
            return Ok(IouValue::zero());
        }
        if self.exponent > MAX_EXPONENT {
            return Err(ModelsError::AmountOverflow);
        }
        if self.exponent < MIN_EXPONENT {
            return Ok(IouValue::zero());
        }
        Ok(self)
    }

    /// Addition with round-half-to-even on the lost digits.
    pub fn checked_add(self, other: IouValue) -> Result<IouValue, ModelsError> {
        if other.is_zero() {
            return Ok(self);
        }
        if self.is_zero() {
            return Ok(other);
        }
        if self == other.negate() {
            return Ok(IouValue::zero());
        }

        let (mut xm, mut xe, mut xn) = (self.mantissa.unsigned_abs(), self.exponent, self.mantissa.signum());
        let (mut ym, ye, yn) = (other.mantissa.unsigned_abs(), other.exponent, other.mantissa.signum());
        let mut ye = ye;

        let mut guard = Guard::default();
        if xe < ye {
            while xe < ye {
                guard.push(xm % 10);
                xm /= 10;
                xe += 1;
            }
        } else if xe > ye {
            while xe > ye {
                guard.push(ym % 10);
                ym /= 10;
                ye += 1;
            }
        }

        if xn == yn {
            xm += ym;
            if xm > MAX_MANTISSA {
                guard.push(xm % 10);
                xm /= 10;
                xe += 1;
            }
            let round = guard.round(Rounding::Nearest);
            if round == 1 || (round == 0 && (xm & 1) == 1) {
                xm += 1;
                if xm > MAX_MANTISSA {
                    xm /= 10;
                    xe += 1;
                }
            }
            if xe > MAX_EXPONENT {
                return Err(ModelsError::AmountOverflow);
            }
        } else {
            if xm > ym {
                xm -= ym;
            } else {
                xm = ym - xm;
                xe = ye;
                xn = yn;
            }
            if xm == 0 {
                // the operands differed only in digits the guard absorbed
                return Ok(IouValue::zero());
            }
            // pull precision back out of the guard
            while xm < MIN_MANTISSA {
                if xe <= MIN_EXPONENT {
                    return Ok(IouValue::zero());
                }
                xm *= 10;
                let digit = guard.pop();
                // the guard digits were shifted off the smaller operand; on
                // a subtraction they borrow from the difference
                xm -= digit;
                xe -= 1;
            }
            let round = guard.round(Rounding::Nearest);
            if round == 1 || (round == 0 && (xm & 1) == 1) {
                xm -= 1;
                if xm < MIN_MANTISSA {
                    if xe <= MIN_EXPONENT {
                        return Ok(IouValue::zero());
                    }
                    xm *= 10;
                    xe -= 1;
                }
            }
            if xe < MIN_EXPONENT {
                return Ok(IouValue::zero());
            }
        }

        Ok(IouValue {
            mantissa: xm as i64 * xn,
            exponent: xe,
        })
    }

    /// Subtraction.
    pub fn checked_sub(self, other: IouValue) -> Result<IouValue, ModelsError> {
        self.checked_add(other.negate())
    }

    /// Multiplication with an explicit rounding direction.
    pub fn checked_mul(self, other: IouValue, mode: Rounding) -> Result<IouValue, ModelsError> {
        if self.is_zero() {
            return Ok(self);
        }
        if other.is_zero() {
            return Ok(IouValue::zero());
        }

        let negative = (self.mantissa < 0) != (other.mantissa < 0);
        let mut product =
            self.mantissa.unsigned_abs() as u128 * other.mantissa.unsigned_abs() as u128;
        let mut exponent = self.exponent + other.exponent;

        let mut guard = Guard::default();
        while product > MAX_MANTISSA as u128 {
            guard.push((product % 10) as u64);
            product /= 10;
            exponent += 1;
        }

        let mut mantissa = product as u64;
        let round = guard.round(mode);
        if round == 1 || (round == 0 && (mantissa & 1) == 1) {
            mantissa += 1;
            if mantissa > MAX_MANTISSA {
                mantissa /= 10;
                exponent += 1;
            }
        }

        if exponent > MAX_EXPONENT {
            return Err(ModelsError::AmountOverflow);
        }
        if exponent < MIN_EXPONENT {
            return Ok(IouValue::zero());
        }
        Ok(IouValue {
            mantissa: if negative {
                -(mantissa as i64)
            } else {
                mantissa as i64
            },
            exponent,
        })
    }

    /// Division with an explicit rounding direction.
    pub fn checked_div(self, other: IouValue, mode: Rounding) -> Result<IouValue, ModelsError> {
        if other.is_zero() {
            return Err(ModelsError::AmountParseError("division by zero".to_string()));
        }
        if self.is_zero() {
            return Ok(self);
        }

        let negative = (self.mantissa < 0) != (other.mantissa < 0);
        // scale by 10^17 for full precision before the divide
        let numerator = self.mantissa.unsigned_abs() as u128 * 100_000_000_000_000_000u128;
        let denominator = other.mantissa.unsigned_abs() as u128;
        let quotient = numerator / denominator;
        let remainder = numerator % denominator;

        let mut value = IouValue {
            mantissa: 0,
            exponent: self.exponent - other.exponent - 17,
        };
        let mut mantissa = quotient;
        let mut exponent = value.exponent;

        let mut guard = Guard::default();
        if remainder != 0 {
            guard.xbit = true;
        }
        while mantissa > MAX_MANTISSA as u128 {
            guard.push((mantissa % 10) as u64);
            mantissa /= 10;
            exponent += 1;
        }
        let mut m = mantissa as u64;
        while m != 0 && m < MIN_MANTISSA {
            if exponent <= MIN_EXPONENT {
                return Ok(IouValue::zero());
            }
            m *= 10;
            m += guard.pop();
            exponent -= 1;
        }
        let round = guard.round(mode);
        if round == 1 || (round == 0 && (m & 1) == 1) {
            m += 1;
            if m > MAX_MANTISSA {
                m /= 10;
                exponent += 1;
            }
        }

        if exponent > MAX_EXPONENT {
            return Err(ModelsError::AmountOverflow);
        }
        if exponent < MIN_EXPONENT || m == 0 {
            return Ok(IouValue::zero());
        }
        value.mantissa = if negative { -(m as i64) } else { m as i64 };
        value.exponent = exponent;
        Ok(value)
    }
}

impl PartialOrd for IouValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IouValue {
    /// Numeric comparison; `+0 == -0` holds because zero is canonical.
    fn cmp(&self, other: &Self) -> Ordering {
        let sign_cmp = self.mantissa.signum().cmp(&other.mantissa.signum());
        if sign_cmp != Ordering::Equal {
            return sign_cmp;
        }
        if self.mantissa == 0 {
            return Ordering::Equal;
        }
        let exp_cmp = if self.mantissa > 0 {
            self.exponent.cmp(&other.exponent)
        } else {
            other.exponent.cmp(&self.exponent)
        };
        if exp_cmp != Ordering::Equal {
            return exp_cmp;
        }
        self.mantissa.cmp(&other.mantissa)
    }
}

impl std::fmt::Display for IouValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        write!(f, "{}e{}", self.mantissa, self.exponent)
    }
}

impl std::fmt::Debug for IouValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl std::str::FromStr for IouValue {
    type Err = ModelsError;

    /// Parse a plain decimal like "3.1", "-2" or "0.31".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (integral, fractional) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if integral.is_empty() && fractional.is_empty() {
            return Err(ModelsError::AmountParseError(format!("empty amount {:?}", s)));
        }
        let digits: String = format!("{}{}", integral, fractional);
        if !digits.chars().all(|c| c.is_ascii_digit()) || digits.len() > 32 {
            return Err(ModelsError::AmountParseError(format!(
                "cannot parse amount from {:?}",
                s
            )));
        }
        let mantissa: i64 = digits
            .parse::<u64>()
            .map_err(|err| ModelsError::AmountParseError(format!("{}", err)))?
            .try_into()
            .map_err(|_| ModelsError::AmountOverflow)?;
        let mantissa = if negative { -mantissa } else { mantissa };
        IouValue::new(mantissa, -(fractional.len() as i32))
    }
}

// ---------------------------------------------------------------------------
// Issued amount with its issue, and the tagged Amount
// ---------------------------------------------------------------------------

/// An issued amount: a value within an obligation family.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct IouAmount {
    /// Numeric value.
    pub value: IouValue,
    /// Currency code (never native).
    pub currency: Currency,
    /// Issuer account.
    pub issuer: AccountId,
}

impl IouAmount {
    /// Build an issued amount.
    pub fn new(value: IouValue, currency: Currency, issuer: AccountId) -> Self {
        IouAmount {
            value,
            currency,
            issuer,
        }
    }

    /// The issue of this amount.
    pub fn issue(&self) -> Issue {
        Issue::new(self.currency, self.issuer)
    }
}

impl std::fmt::Display for IouAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}/{}", self.value, self.currency, self.issuer)
    }
}

impl std::fmt::Debug for IouAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

/// A tagged amount: native drops or an issued value.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum Amount {
    /// Native drops.
    Xrp(XrpAmount),
    /// Issued value.
    Iou(IouAmount),
}

impl Amount {
    /// Zero in the given issue.
    pub fn zero_of(issue: &Issue) -> Self {
        match issue {
            Issue::Xrp => Amount::Xrp(XrpAmount::zero()),
            Issue::Iou { currency, issuer } => {
                Amount::Iou(IouAmount::new(IouValue::zero(), *currency, *issuer))
            }
        }
    }

    /// Native constructor from drops.
    pub fn from_drops(drops: i64) -> Result<Self, ModelsError> {
        Ok(Amount::Xrp(XrpAmount::from_drops(drops)?))
    }

    /// True for the native variant.
    pub fn is_xrp(&self) -> bool {
        matches!(self, Amount::Xrp(_))
    }

    /// True if zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Amount::Xrp(x) => x.is_zero(),
            Amount::Iou(i) => i.value.is_zero(),
        }
    }

    /// True if strictly negative.
    pub fn is_negative(&self) -> bool {
        match self {
            Amount::Xrp(x) => x.is_negative(),
            Amount::Iou(i) => i.value.is_negative(),
        }
    }

    /// The issue of this amount.
    pub fn issue(&self) -> Issue {
        match self {
            Amount::Xrp(_) => Issue::Xrp,
            Amount::Iou(i) => i.issue(),
        }
    }

    /// Negation.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Amount::Xrp(x) => Amount::Xrp(x.negate()),
            Amount::Iou(mut i) => {
                i.value = i.value.negate();
                Amount::Iou(i)
            }
        }
    }

    /// Checked addition; both operands must share an issue.
    pub fn checked_add(self, other: Amount) -> Result<Amount, ModelsError> {
        match (self, other) {
            (Amount::Xrp(a), Amount::Xrp(b)) => a
                .checked_add(b)
                .map(Amount::Xrp)
                .ok_or(ModelsError::AmountOverflow),
            (Amount::Iou(a), Amount::Iou(b)) if a.issue() == b.issue() => {
                Ok(Amount::Iou(IouAmount::new(
                    a.value.checked_add(b.value)?,
                    a.currency,
                    a.issuer,
                )))
            }
            _ => Err(ModelsError::AmountParseError(
                "cannot add amounts of different issues".to_string(),
            )),
        }
    }

    /// Checked subtraction; both operands must share an issue.
    pub fn checked_sub(self, other: Amount) -> Result<Amount, ModelsError> {
        self.checked_add(other.negate())
    }

    /// Compare two amounts of the same issue.
    pub fn compare(&self, other: &Amount) -> Result<Ordering, ModelsError> {
        match (self, other) {
            (Amount::Xrp(a), Amount::Xrp(b)) => Ok(a.cmp(b)),
            (Amount::Iou(a), Amount::Iou(b)) if a.issue() == b.issue() => Ok(a.value.cmp(&b.value)),
            _ => Err(ModelsError::AmountParseError(
                "cannot compare amounts of different issues".to_string(),
            )),
        }
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Amount::Xrp(x) => write!(f, "{}", x),
            Amount::Iou(i) => write!(f, "{}", i),
        }
    }
}

impl std::fmt::Debug for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

// ---------------------------------------------------------------------------
// Wire codec
// ---------------------------------------------------------------------------

const NOT_XRP_BIT: u64 = 1 << 63;
const POSITIVE_BIT: u64 = 1 << 62;
const EXPONENT_BIAS: i32 = 97;

/// Serializer for `Amount` in its 8-byte native / 48-byte issued wire form.
#[derive(Clone, Default)]
pub struct AmountSerializer;

impl AmountSerializer {
    /// Creates a serializer for `Amount`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<Amount> for AmountSerializer {
    fn serialize(&self, value: &Amount, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        match value {
            Amount::Xrp(xrp) => {
                let magnitude = xrp.drops().unsigned_abs();
                let mut word = magnitude;
                if !xrp.is_negative() {
                    word |= POSITIVE_BIT;
                }
                buffer.extend_from_slice(&word.to_be_bytes());
            }
            Amount::Iou(iou) => {
                let word = if iou.value.is_zero() {
                    // canonical zero: only the not-XRP bit
                    NOT_XRP_BIT
                } else {
                    let mantissa = iou.value.mantissa().unsigned_abs();
                    if !(MIN_MANTISSA..=MAX_MANTISSA).contains(&mantissa) {
                        return Err(SerializeError::NotCanonical(format!(
                            "issued mantissa {} out of canonical range",
                            mantissa
                        )));
                    }
                    let mut word = NOT_XRP_BIT
                        | (((iou.value.exponent() + EXPONENT_BIAS) as u64) << 54)
                        | mantissa;
                    if !iou.value.is_negative() {
                        word |= POSITIVE_BIT;
                    }
                    word
                };
                buffer.extend_from_slice(&word.to_be_bytes());
                buffer.extend_from_slice(iou.currency.to_bytes());
                buffer.extend_from_slice(iou.issuer.to_bytes());
            }
        }
        Ok(())
    }
}

/// Deserializer for `Amount`.
#[derive(Clone, Default)]
pub struct AmountDeserializer;

impl AmountDeserializer {
    /// Creates a deserializer for `Amount`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<Amount> for AmountDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Amount, E> {
        context("Failed Amount deserialization", |input: &'a [u8]| {
            if input.len() < 8 {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    nom::error::ErrorKind::LengthValue,
                )));
            }
            // try_into cannot fail: 8 bytes checked above
            let word = u64::from_be_bytes(input[..8].try_into().unwrap());
            if word & NOT_XRP_BIT == 0 {
                // native
                let magnitude = (word & !(POSITIVE_BIT | NOT_XRP_BIT)) as i64;
                let drops = if word & POSITIVE_BIT != 0 {
                    magnitude
                } else {
                    -magnitude
                };
                let amount = XrpAmount::from_drops(drops).map_err(|_| {
                    nom::Err::Error(ParseError::from_error_kind(
                        input,
                        nom::error::ErrorKind::Verify,
                    ))
                })?;
                // -0 is not canonical
                if magnitude == 0 && word & POSITIVE_BIT == 0 {
                    return Err(nom::Err::Error(ParseError::from_error_kind(
                        input,
                        nom::error::ErrorKind::Verify,
                    )));
                }
                return Ok((&input[8..], Amount::Xrp(amount)));
            }

            if input.len() < 8 + 2 * CURRENCY_SIZE_BYTES {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    nom::error::ErrorKind::LengthValue,
                )));
            }
            let mut currency_bytes = [0u8; CURRENCY_SIZE_BYTES];
            currency_bytes.copy_from_slice(&input[8..28]);
            let currency = Currency::from_bytes(currency_bytes);
            let mut issuer_bytes = [0u8; CURRENCY_SIZE_BYTES];
            issuer_bytes.copy_from_slice(&input[28..48]);
            let issuer = AccountId::from_bytes(issuer_bytes);

            if currency.is_xrp() {
                // the native code may not appear in issued position
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    nom::error::ErrorKind::Verify,
                )));
            }

            let mantissa = (word & ((1 << 54) - 1)) as i64;
            let value = if word == NOT_XRP_BIT && mantissa == 0 {
                IouValue::zero()
            } else {
                let exponent = (((word >> 54) & 0xFF) as i32) - EXPONENT_BIAS;
                if !(MIN_MANTISSA..=MAX_MANTISSA).contains(&(mantissa as u64))
                    || !(MIN_EXPONENT..=MAX_EXPONENT).contains(&exponent)
                {
                    return Err(nom::Err::Error(ParseError::from_error_kind(
                        input,
                        nom::error::ErrorKind::Verify,
                    )));
                }
                let mantissa = if word & POSITIVE_BIT != 0 {
                    mantissa
                } else {
                    -mantissa
                };
                IouValue { mantissa, exponent }
            };
            Ok((
                &input[48..],
                Amount::Iou(IouAmount::new(value, currency, issuer)),
            ))
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use xrpl_serialization::DeserializeError;

    fn usd_issuer() -> AccountId {
        AccountId::from_address("rvYAfWj5gh67oV6fW32ZzP3Aw4Eubs59B").unwrap()
    }

    fn usd(value: &str) -> Amount {
        Amount::Iou(IouAmount::new(
            IouValue::from_str(value).unwrap(),
            Currency::from_standard_code("USD").unwrap(),
            usd_issuer(),
        ))
    }

    fn encode(amount: &Amount) -> String {
        let mut buffer = Vec::new();
        AmountSerializer::new().serialize(amount, &mut buffer).unwrap();
        hex::encode(buffer)
    }

    #[test]
    fn test_native_vectors() {
        for (drops, expected) in [
            (0i64, "4000000000000000"),
            (1, "4000000000000001"),
            (100, "4000000000000064"),
            (1_000_000, "40000000000f4240"),
            (10_000_000, "4000000000989680"),
            (100_000_000, "4000000005f5e100"),
            (1_000_000_000, "400000003b9aca00"),
            (10_000_000_000, "40000002540be400"),
            (100_000_000_000_000_000, "416345785d8a0000"),
        ] {
            let amount = Amount::from_drops(drops).unwrap();
            assert_eq!(encode(&amount), expected, "drops {}", drops);
        }
    }

    #[test]
    fn test_native_cap() {
        assert!(XrpAmount::from_drops(MAX_NATIVE_DROPS).is_ok());
        assert!(XrpAmount::from_drops(MAX_NATIVE_DROPS + 1).is_err());
        assert!(XrpAmount::from_drops(-MAX_NATIVE_DROPS).is_ok());
    }

    #[test]
    fn test_iou_vectors() {
        let issuer_hex = "0a20b3c85f482532a9578dbb3950b85ca06594d1";
        let usd_hex = "0000000000000000000000005553440000000000";
        for (value, word) in [
            ("1", "d4838d7ea4c68000"),
            ("10", "d4c38d7ea4c68000"),
            ("100", "d5038d7ea4c68000"),
            ("-2", "94871afd498d0000"),
            ("3.1", "d48b036efecdc000"),
            ("0.31", "d44b036efecdc000"),
            ("0", "8000000000000000"),
        ] {
            let amount = usd(value);
            assert_eq!(
                encode(&amount),
                format!("{}{}{}", word, usd_hex, issuer_hex),
                "value {}",
                value
            );
        }
    }

    #[test]
    fn test_wire_roundtrip() {
        let deserializer = AmountDeserializer::new();
        for amount in [
            Amount::from_drops(0).unwrap(),
            Amount::from_drops(99_999).unwrap(),
            Amount::from_drops(-5).unwrap(),
            usd("1"),
            usd("-2"),
            usd("0"),
            usd("0.000001"),
        ] {
            let mut buffer = Vec::new();
            AmountSerializer::new().serialize(&amount, &mut buffer).unwrap();
            let (rest, decoded) = deserializer
                .deserialize::<DeserializeError>(&buffer)
                .unwrap();
            assert!(rest.is_empty());
            assert_eq!(decoded, amount);
        }
    }

    #[test]
    fn test_non_canonical_rejected() {
        let deserializer = AmountDeserializer::new();
        // issued word with mantissa below the canonical minimum
        let mut buffer = Vec::new();
        let word: u64 = NOT_XRP_BIT | POSITIVE_BIT | ((82u64) << 54) | 5;
        buffer.extend_from_slice(&word.to_be_bytes());
        buffer.extend_from_slice(
            Currency::from_standard_code("USD").unwrap().to_bytes(),
        );
        buffer.extend_from_slice(usd_issuer().to_bytes());
        assert!(deserializer
            .deserialize::<DeserializeError>(&buffer)
            .is_err());
    }

    #[test]
    fn test_value_normalization() {
        // 740 scale 1 -> 74.0, mantissa normalized to [10^15, 10^16)
        let value = IouValue::new(740, -1).unwrap();
        assert_eq!(value.mantissa(), 7_400_000_000_000_000);
        assert_eq!(value.exponent(), -14);
    }

    #[test]
    fn test_add_sub() {
        let a = IouValue::from_str("1.5").unwrap();
        let b = IouValue::from_str("2.25").unwrap();
        assert_eq!(a.checked_add(b).unwrap(), IouValue::from_str("3.75").unwrap());
        assert_eq!(b.checked_sub(a).unwrap(), IouValue::from_str("0.75").unwrap());
        assert!(a.checked_sub(a).unwrap().is_zero());
    }

    #[test]
    fn test_zero_signs_compare_equal() {
        let plus = IouValue::zero();
        let minus = IouValue::zero().negate();
        assert_eq!(plus.cmp(&minus), Ordering::Equal);
    }

    #[test]
    fn test_mul_div_roundtrip() {
        let a = IouValue::from_str("3").unwrap();
        let b = IouValue::from_str("7").unwrap();
        let product = a.checked_mul(b, Rounding::Nearest).unwrap();
        assert_eq!(product, IouValue::from_str("21").unwrap());
        let quotient = product.checked_div(b, Rounding::Nearest).unwrap();
        assert_eq!(quotient, a);
    }

    #[test]
    fn test_directed_rounding_diverges() {
        let one = IouValue::from_str("1").unwrap();
        let three = IouValue::from_str("3").unwrap();
        let down = one.checked_div(three, Rounding::Down).unwrap();
        let up = one.checked_div(three, Rounding::Up).unwrap();
        assert!(down < up);
        assert_eq!(up.checked_sub(down).unwrap(), IouValue::new(1, -16).unwrap());
    }

    #[test]
    fn test_overflow_errors() {
        let big = IouValue::new(9_000_000_000_000_000, MAX_EXPONENT).unwrap();
        assert!(matches!(
            big.checked_mul(big, Rounding::Nearest),
            Err(ModelsError::AmountOverflow)
        ));
    }

    #[test]
    fn test_underflow_is_zero() {
        let tiny = IouValue::new(1_000_000_000_000_000, MIN_EXPONENT).unwrap();
        let smaller = tiny.checked_mul(tiny, Rounding::Nearest).unwrap();
        assert!(smaller.is_zero());
    }

    #[test]
    fn test_amount_issue_mismatch() {
        assert!(Amount::from_drops(1)
            .unwrap()
            .checked_add(usd("1"))
            .is_err());
    }
}
