// TOTP Warden — Crypto Module
//
// Authenticated encryption of enrollment secrets under the master key.
// Stored blobs are `base64(iv || ciphertext)` with a fresh random 16-byte
// IV per encryption.

mod codec;
mod error;

pub use codec::{decrypt, encrypt, EncryptedBlob, IV_LEN};
pub use error::CryptoError;
