use displaydoc::Display;
use thiserror::Error;

/// Errors of the hash component.
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum HashError {
    /// Parsing error: {0}
    ParsingError(String),
}
