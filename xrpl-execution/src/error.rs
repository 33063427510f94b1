use displaydoc::Display;
use thiserror::Error;

/// Errors of the execution component.
#[non_exhaustive]
#[derive(Clone, Display, Error, Debug)]
pub enum ExecutionError {
    /// Internal invariant violated: {0}
    Internal(String),
    /// Serialization failure: {0}
    Serialization(String),
}

impl From<xrpl_models::ModelsError> for ExecutionError {
    fn from(err: xrpl_models::ModelsError) -> Self {
        ExecutionError::Serialization(err.to_string())
    }
}

impl From<xrpl_ledger::LedgerError> for ExecutionError {
    fn from(err: xrpl_ledger::LedgerError) -> Self {
        ExecutionError::Internal(err.to_string())
    }
}
