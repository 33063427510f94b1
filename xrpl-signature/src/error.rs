use displaydoc::Display;
use thiserror::Error;

/// Errors of the signature component.
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum SignatureError {
    /// Public key parsing error: {0}
    PublicKeyError(String),
    /// Signature parsing error: {0}
    SignatureParseError(String),
    /// Signature verification failed: {0}
    VerifyError(String),
}
