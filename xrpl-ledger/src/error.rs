use displaydoc::Display;
use thiserror::Error;

/// ledger error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum LedgerError {
    /// entry not found
    NotFound,
    /// entry already exists
    AlreadyExists,
    /// directory page is full
    DirFull,
    /// wrong entry type at key: {0}
    WrongType(String),
    /// serialization failure: {0}
    Serialization(String),
    /// arithmetic overflow while adjusting balances
    BalanceOverflow,
}

impl From<xrpl_models::ModelsError> for LedgerError {
    fn from(err: xrpl_models::ModelsError) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}
