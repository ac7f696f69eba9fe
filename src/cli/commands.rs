// TOTP Warden — CLI Command Handlers
//
// Each function handles one subcommand. `enroll` reproduces the classic
// proxy contract: on success exactly one line, `QR_CODE_URL:<url>`, goes
// to stdout; on failure the process exits nonzero with a generic message.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::config::ServiceConfig;
use crate::crypto::CryptoError;
use crate::invoker::UidAllowlist;
use crate::keys::MASTER_KEY_LEN;
use crate::service::ProvisioningService;
use crate::WardenError;

use super::Commands;

/// Execute the parsed CLI command.
pub fn execute(command: Commands) -> Result<(), WardenError> {
    match command {
        Commands::Enroll {
            account,
            key_file,
            secret_root,
            allow_uid,
            allow_gid,
        } => cmd_enroll(account, key_file, secret_root, allow_uid, allow_gid),
        Commands::Keygen { key_file, force } => cmd_keygen(key_file, force),
    }
}

// ─── Enroll ──────────────────────────────────────────────────────────────────

fn cmd_enroll(
    account: String,
    key_file: Option<PathBuf>,
    secret_root: Option<PathBuf>,
    allow_uid: Vec<u32>,
    allow_gid: Vec<u32>,
) -> Result<(), WardenError> {
    let mut config = ServiceConfig::default();
    if let Some(path) = key_file {
        config.key_path = path;
    }
    if let Some(path) = secret_root {
        config.secret_root = path;
    }
    if !allow_uid.is_empty() || !allow_gid.is_empty() {
        config.authorized_uids = allow_uid;
        config.authorized_gids = allow_gid;
    }

    let policy = UidAllowlist::new(
        config.authorized_uids.iter().copied(),
        config.authorized_gids.iter().copied(),
    );
    let service = ProvisioningService::new(&config, Box::new(policy))?;

    let url = service.provision(&account)?;
    println!("QR_CODE_URL:{url}");
    Ok(())
}

// ─── Keygen ──────────────────────────────────────────────────────────────────

fn cmd_keygen(key_file: Option<PathBuf>, force: bool) -> Result<(), WardenError> {
    let path = key_file.unwrap_or_else(|| ServiceConfig::default().key_path);
    write_master_key(&path, force)?;
    println!("Master key written to {}", path.display());
    Ok(())
}

/// Generate 32 random bytes and write them owner-only at `path`.
fn write_master_key(path: &Path, force: bool) -> Result<(), WardenError> {
    if path.exists() && !force {
        return Err(WardenError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "key file already exists (use --force to replace it)",
        )));
    }

    let mut material = [0u8; MASTER_KEY_LEN];
    OsRng
        .try_fill_bytes(&mut material)
        .map_err(|_| CryptoError::RandomUnavailable)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
            set_mode(parent, 0o700)?;
        }
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(&material)?;
    file.sync_all()?;
    drop(file);
    set_mode(path, 0o600)?;

    tracing::info!(path = %path.display(), "Master key generated");
    Ok(())
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
