// TOTP Warden — Crypto error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Secure random source unavailable")]
    RandomUnavailable,

    #[error("Cipher operation failed")]
    CipherFailure,

    #[error("Stored blob is malformed")]
    MalformedBlob,
}
