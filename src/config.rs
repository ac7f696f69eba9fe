// TOTP Warden — Service Configuration
//
// An explicitly constructed configuration context, passed by reference into
// the service. There is no process-wide singleton: tests build their own
// config pointing at fixtures, production code uses the defaults below.
//
// The generator executable and its argument vector are pinned here and in
// `invoker::GENERATOR_ARGV`; nothing caller-supplied can change them.

use std::path::PathBuf;
use std::time::Duration;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Absolute path of the only program the invoker will ever execute.
pub const GENERATOR_EXECUTABLE: &str = "/usr/bin/google-authenticator";

/// Unprivileged identity the generator child runs as.
pub const SERVICE_USER: &str = "totp-service";

/// Fixed location of the 32-byte master key.
pub const MASTER_KEY_PATH: &str = "/etc/totp-service/master.key";

/// Root directory for per-account encrypted secret files.
pub const SECRET_ROOT: &str = "/var/lib/totp-service";

/// Upper bound on bytes captured from the generator child.
pub const MAX_CAPTURE_BYTES: usize = 4096;

/// How long the parent will wait for the child's output before killing it.
pub const CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);

// ─── Config ──────────────────────────────────────────────────────────────────

/// Runtime configuration for one provisioning service instance.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Pinned generator executable path.
    pub executable: PathBuf,
    /// Identity the child drops to before exec. `None` skips the drop
    /// (test fixtures only; production config always names the service user).
    pub service_user: Option<String>,
    /// Path of the 32-byte master key file.
    pub key_path: PathBuf,
    /// Directory that receives `<account>.enc` files.
    pub secret_root: PathBuf,
    /// Real UIDs allowed to request enrollment. Empty means nobody.
    pub authorized_uids: Vec<u32>,
    /// Real GIDs allowed to request enrollment.
    pub authorized_gids: Vec<u32>,
    /// Capture bound for child output.
    pub max_capture: usize,
    /// Deadline for the capture-and-reap window.
    pub capture_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(GENERATOR_EXECUTABLE),
            service_user: Some(SERVICE_USER.to_string()),
            key_path: PathBuf::from(MASTER_KEY_PATH),
            secret_root: PathBuf::from(SECRET_ROOT),
            authorized_uids: vec![0],
            authorized_gids: Vec::new(),
            max_capture: MAX_CAPTURE_BYTES,
            capture_timeout: CAPTURE_TIMEOUT,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
