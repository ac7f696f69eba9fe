// TOTP Warden — Master Key Accessor
//
// Reads exactly 32 bytes of symmetric key material from a fixed file.
// A missing or short file is a fatal misconfiguration: the service must
// refuse to operate rather than fall back to a default, padded, or
// derived key.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::KeyError;

/// Length of the master key in bytes (256-bit key material).
pub const MASTER_KEY_LEN: usize = 32;

/// Process-lifetime symmetric master key. Never serialized, never logged;
/// zeroed when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; MASTER_KEY_LEN]);

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}

impl MasterKey {
    /// Load the master key from `path`.
    ///
    /// The file must hold at least `MASTER_KEY_LEN` bytes; only the first
    /// `MASTER_KEY_LEN` are used. A shorter file yields
    /// [`KeyError::ShortKey`], a missing file [`KeyError::NotFound`].
    pub fn load(path: &Path) -> Result<Self, KeyError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(KeyError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(KeyError::Io(e)),
        };

        warn_if_permissive(&file, path);

        let mut material = Zeroizing::new(Vec::with_capacity(MASTER_KEY_LEN));
        file.take(MASTER_KEY_LEN as u64)
            .read_to_end(&mut material)?;

        if material.len() < MASTER_KEY_LEN {
            return Err(KeyError::ShortKey(material.len(), MASTER_KEY_LEN));
        }

        let mut key = [0u8; MASTER_KEY_LEN];
        key.copy_from_slice(&material);

        tracing::debug!(path = %path.display(), "Master key loaded");
        Ok(Self(key))
    }

    /// Build a key from raw bytes (codec tests and key generation).
    pub fn from_bytes(bytes: [u8; MASTER_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw key material for cipher construction.
    pub fn as_bytes(&self) -> &[u8; MASTER_KEY_LEN] {
        &self.0
    }
}

/// Surface a key file readable by group or world. The load still succeeds;
/// the operator gets one unambiguous warning per process start.
fn warn_if_permissive(file: &File, path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(meta) = file.metadata() {
            let mode = meta.permissions().mode();
            if mode & 0o077 != 0 {
                tracing::warn!(
                    path = %path.display(),
                    mode = format!("{:04o}", mode & 0o7777),
                    "Master key file is readable by group or world"
                );
            }
        }
    }
    #[cfg(not(unix))]
    let _ = (file, path);
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn key_file(bytes: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.key");
        let mut file = File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_exact_key() {
        let (_dir, path) = key_file(&[7u8; MASTER_KEY_LEN]);
        let key = MasterKey::load(&path).unwrap();
        assert_eq!(key.as_bytes(), &[7u8; MASTER_KEY_LEN]);
    }

    #[test]
    fn test_short_key_is_rejected() {
        let (_dir, path) = key_file(&[7u8; 20]);
        let err = MasterKey::load(&path).unwrap_err();
        match err {
            KeyError::ShortKey(got, expected) => {
                assert_eq!(got, 20);
                assert_eq!(expected, MASTER_KEY_LEN);
            }
            other => panic!("Expected ShortKey, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_key_file_is_rejected() {
        let (_dir, path) = key_file(&[]);
        assert!(matches!(
            MasterKey::load(&path),
            Err(KeyError::ShortKey(0, MASTER_KEY_LEN))
        ));
    }

    #[test]
    fn test_missing_key_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.key");
        assert!(matches!(
            MasterKey::load(&path),
            Err(KeyError::NotFound(_))
        ));
    }

    #[test]
    fn test_oversized_key_file_uses_first_32_bytes() {
        let mut bytes = vec![1u8; MASTER_KEY_LEN];
        bytes.extend_from_slice(b"trailing garbage");
        let (_dir, path) = key_file(&bytes);
        let key = MasterKey::load(&path).unwrap();
        assert_eq!(key.as_bytes(), &[1u8; MASTER_KEY_LEN]);
    }
}
