// TOTP Warden — Secret Codec
//
// AES-256-GCM with a 16-byte nonce, so a stored blob is always a 16-byte
// IV followed by ciphertext (tag included). The IV comes from the OS
// random source on every call; an RNG failure aborts the operation rather
// than degrading to a weaker source. Decryption authenticates and fails
// closed on any tamper.

use aes::Aes256;
use aes_gcm::aead::generic_array::typenum::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{AesGcm, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::rngs::OsRng;
use rand::TryRngCore;
use zeroize::Zeroizing;

use crate::keys::MasterKey;

use super::CryptoError;

/// Length of the per-encryption initialization vector.
pub const IV_LEN: usize = 16;

type SecretCipher = AesGcm<Aes256, U16>;

/// A self-contained ciphertext: IV plus authenticated ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    pub iv: [u8; IV_LEN],
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Encode as `base64(iv || ciphertext)` for storage.
    pub fn encode(&self) -> String {
        let mut raw = Vec::with_capacity(IV_LEN + self.ciphertext.len());
        raw.extend_from_slice(&self.iv);
        raw.extend_from_slice(&self.ciphertext);
        STANDARD.encode(raw)
    }

    /// Decode a stored blob. The inverse of [`EncryptedBlob::encode`].
    pub fn decode(text: &str) -> Result<Self, CryptoError> {
        let raw = STANDARD
            .decode(text.trim())
            .map_err(|_| CryptoError::MalformedBlob)?;
        if raw.len() <= IV_LEN {
            return Err(CryptoError::MalformedBlob);
        }
        let (iv_bytes, ciphertext) = raw.split_at(IV_LEN);
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(iv_bytes);
        Ok(Self {
            iv,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

/// Encrypt `plaintext` under the master key with a fresh random IV.
pub fn encrypt(plaintext: &[u8], key: &MasterKey) -> Result<EncryptedBlob, CryptoError> {
    let mut iv = [0u8; IV_LEN];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|_| CryptoError::RandomUnavailable)?;

    let cipher =
        SecretCipher::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::CipherFailure)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|_| CryptoError::CipherFailure)?;

    Ok(EncryptedBlob { iv, ciphertext })
}

/// Decrypt a blob under the master key. Fails on any tag mismatch.
///
/// The provisioning path never calls this; it exists for the round-trip
/// contract and for the collaborators that read stored blobs back.
pub fn decrypt(blob: &EncryptedBlob, key: &MasterKey) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let cipher =
        SecretCipher::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::CipherFailure)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&blob.iv), blob.ciphertext.as_slice())
        .map_err(|_| CryptoError::CipherFailure)?;
    Ok(Zeroizing::new(plaintext))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
