//! Obligation families: (currency, issuer) pairs.

use crate::account::AccountId;
use crate::currency::Currency;
use serde::{Deserialize, Serialize};

/// An issue identifies a family of obligations: a currency together with
/// its issuer. The native currency is a distinct variant carrying the
/// sentinel account, so native and issued can never be confused.
#[derive(Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Issue {
    /// The native currency.
    Xrp,
    /// An issued currency.
    Iou {
        /// Currency code (never the native code).
        currency: Currency,
        /// Issuing account.
        issuer: AccountId,
    },
}

impl Issue {
    /// Build an issue, folding the native code into the `Xrp` variant.
    pub fn new(currency: Currency, issuer: AccountId) -> Self {
        if currency.is_xrp() {
            Issue::Xrp
        } else {
            Issue::Iou { currency, issuer }
        }
    }

    /// True for the native variant.
    pub fn is_xrp(&self) -> bool {
        matches!(self, Issue::Xrp)
    }

    /// The currency code (all-zero for native).
    pub fn currency(&self) -> Currency {
        match self {
            Issue::Xrp => Currency::xrp(),
            Issue::Iou { currency, .. } => *currency,
        }
    }

    /// The issuer (the sentinel account for native).
    pub fn issuer(&self) -> AccountId {
        match self {
            Issue::Xrp => AccountId::zero(),
            Issue::Iou { issuer, .. } => *issuer,
        }
    }

    /// The same issue with a different issuer; a no-op on native.
    pub fn with_issuer(&self, issuer: AccountId) -> Self {
        match self {
            Issue::Xrp => Issue::Xrp,
            Issue::Iou { currency, .. } => Issue::Iou {
                currency: *currency,
                issuer,
            },
        }
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Issue::Xrp => write!(f, "XRP"),
            Issue::Iou { currency, issuer } => write!(f, "{}/{}", currency, issuer),
        }
    }
}

impl std::fmt::Debug for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_folding() {
        let issuer = AccountId::from_bytes([7u8; 20]);
        assert_eq!(Issue::new(Currency::xrp(), issuer), Issue::Xrp);
        assert!(Issue::new(Currency::xrp(), issuer).issuer().is_zero());
    }

    #[test]
    fn test_iou_accessors() {
        let usd = Currency::from_standard_code("USD").unwrap();
        let issuer = AccountId::from_bytes([7u8; 20]);
        let issue = Issue::new(usd, issuer);
        assert!(!issue.is_xrp());
        assert_eq!(issue.currency(), usd);
        assert_eq!(issue.issuer(), issuer);
    }
}
