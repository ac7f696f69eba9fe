// TOTP Warden — Secure Persister
//
// Writes `<root>/<account>.enc` with owner-only permissions, overwriting
// any previous blob for the account. The account name is validated as a
// single safe path component before it is ever joined to a path.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::StoreError;

/// Extension for per-account ciphertext files.
pub const SECRET_FILE_EXT: &str = "enc";

/// Longest accepted account name.
const MAX_ACCOUNT_NAME_LEN: usize = 64;

/// Reject anything that is not a plain, safe filename component:
/// ASCII alphanumerics plus `-`, `_`, `.`, `@`; no separators, no control
/// characters, no leading dot, bounded length.
pub fn validate_account_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() {
        return Err(StoreError::InvalidAccountName("empty".to_string()));
    }
    if name.len() > MAX_ACCOUNT_NAME_LEN {
        return Err(StoreError::InvalidAccountName("too long".to_string()));
    }
    if name.starts_with('.') {
        return Err(StoreError::InvalidAccountName(
            "must not start with a dot".to_string(),
        ));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '-' | '_' | '.' | '@'))
    {
        return Err(StoreError::InvalidAccountName(format!(
            "forbidden character {bad:?}"
        )));
    }
    Ok(())
}

/// Filesystem-backed blob storage rooted at one secure directory.
#[derive(Debug, Clone)]
pub struct SecretFileStore {
    root: PathBuf,
}

impl SecretFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path the blob for `account` is stored at. `account` must already
    /// have passed [`validate_account_name`].
    pub fn path_for(&self, account: &str) -> PathBuf {
        self.root.join(format!("{account}.{SECRET_FILE_EXT}"))
    }

    /// Write the encoded blob for `account`, truncating any previous one.
    ///
    /// The file is created with mode 0600 and the mode is re-asserted
    /// after the write; if that final step fails the write is reported as
    /// insecure and the caller must fail the request.
    pub fn store(&self, account: &str, encoded: &str) -> Result<PathBuf, StoreError> {
        validate_account_name(account)?;

        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
            set_mode(&self.root, 0o700).map_err(|_| {
                StoreError::InsecurePermissions(self.root.clone())
            })?;
        }

        let path = self.path_for(account);
        let mut file = open_owner_only(&path)?;
        file.write_all(encoded.as_bytes())?;
        file.sync_all()?;
        drop(file);

        // A pre-existing file keeps its old mode through truncation;
        // re-assert owner-only explicitly.
        set_mode(&path, 0o600)
            .map_err(|_| StoreError::InsecurePermissions(path.clone()))?;

        tracing::info!(account = %account, "Encrypted secret stored");
        Ok(path)
    }
}

fn open_owner_only(path: &Path) -> Result<fs::File, StoreError> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    Ok(options.open(path)?)
}

fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
    }
    #[cfg(not(unix))]
    {
        let _ = (path, mode);
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
