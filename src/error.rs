// TOTP Warden — Top-level error types
//
// Aggregates errors from the keys, crypto, invoker, and store modules into
// a single error enum for the application boundary. None of these variants
// crosses the trust boundary toward a caller; the service maps them all to
// one opaque failure signal before returning.

use thiserror::Error;

/// Top-level error type for all enrollment operations.
#[derive(Debug, Error)]
pub enum WardenError {
    #[error("Key store error: {0}")]
    Key(#[from] crate::keys::KeyError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] crate::crypto::CryptoError),

    #[error("Invocation error: {0}")]
    Invoke(#[from] crate::invoker::InvokeError),

    #[error("Storage error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Generator output did not contain the enrollment markers")]
    ParseIncomplete,

    #[error("{0}")]
    Provision(#[from] crate::service::ProvisionFailure),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WardenError>;
