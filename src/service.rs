// TOTP Warden — Provisioning Service
//
// Composes invoke → parse → encrypt → persist and returns only the
// provisioning URL. Every internal error is logged here and collapsed to
// one opaque failure before it reaches the caller: no parser text, key
// material, or file path ever crosses the trust boundary.

use thiserror::Error;
use zeroize::Zeroizing;

use crate::config::ServiceConfig;
use crate::crypto;
use crate::invoker::{AuthorizationPolicy, ControlledInvoker};
use crate::keys::MasterKey;
use crate::parser::parse_enrollment;
use crate::store::{validate_account_name, SecretFileStore};
use crate::WardenError;

/// The only failure a caller ever sees. Carries no internal detail.
#[derive(Debug, Error)]
#[error("Enrollment provisioning failed")]
pub struct ProvisionFailure;

/// One explicitly constructed service context: master key, invoker, and
/// store. Passed by reference wherever it is needed; there is no global.
pub struct ProvisioningService {
    key: MasterKey,
    invoker: ControlledInvoker,
    store: SecretFileStore,
}

impl std::fmt::Debug for ProvisioningService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisioningService").finish_non_exhaustive()
    }
}

impl ProvisioningService {
    /// Build a service from configuration and an authorization policy.
    ///
    /// Fails if the master key is missing or short: the service must not
    /// come up with a default or partial key.
    pub fn new(
        config: &ServiceConfig,
        policy: Box<dyn AuthorizationPolicy>,
    ) -> Result<Self, WardenError> {
        let key = MasterKey::load(&config.key_path)?;
        Ok(Self {
            key,
            invoker: ControlledInvoker::new(config, policy),
            store: SecretFileStore::new(&config.secret_root),
        })
    }

    /// Provision a TOTP enrollment for `account_name`.
    ///
    /// On success the caller receives the provisioning URL and nothing
    /// else; the secret exists outside this call only as ciphertext on
    /// disk.
    pub fn provision(&self, account_name: &str) -> Result<String, ProvisionFailure> {
        self.provision_inner(account_name).map_err(|e| {
            tracing::error!(error = %e, "Enrollment request failed");
            ProvisionFailure
        })
    }

    fn provision_inner(&self, account_name: &str) -> Result<String, WardenError> {
        // Validate the untrusted name before anything else runs.
        validate_account_name(account_name)?;

        let raw = self.invoker.invoke()?;
        let text = Zeroizing::new(String::from_utf8_lossy(&raw).into_owned());
        drop(raw);

        let parsed = parse_enrollment(&text);
        let (secret, url) = match (parsed.secret, parsed.provisioning_url) {
            (Some(secret), Some(url)) => (secret, url),
            _ => return Err(WardenError::ParseIncomplete),
        };

        let blob = crypto::encrypt(secret.as_bytes(), &self.key)?;
        // The plaintext secret is zeroed here, before persistence and on
        // every failure path after it (Zeroizing guards `text` as well).
        drop(secret);

        self.store.store(account_name, &blob.encode())?;

        tracing::info!(account = %account_name, "Enrollment provisioned");
        Ok(url)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
//
// End-to-end service behavior is covered in tests/provisioning.rs with a
// fake generator; the unit tests here pin the failure mapping.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::CallerIdentity;
    use std::io::Write;
    use std::path::PathBuf;

    struct AllowAll;
    impl AuthorizationPolicy for AllowAll {
        fn authorize(&self, _caller: &CallerIdentity) -> bool {
            true
        }
    }

    fn write_key(dir: &std::path::Path, len: usize) -> PathBuf {
        let path = dir.join("master.key");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&vec![0x42u8; len]).unwrap();
        path
    }

    #[test]
    fn test_short_key_prevents_construction() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig {
            key_path: write_key(dir.path(), 20),
            secret_root: dir.path().join("secrets"),
            ..ServiceConfig::default()
        };
        let err = ProvisioningService::new(&config, Box::new(AllowAll)).unwrap_err();
        assert!(matches!(err, WardenError::Key(_)));
    }

    #[test]
    fn test_missing_key_prevents_construction() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig {
            key_path: dir.path().join("absent.key"),
            secret_root: dir.path().join("secrets"),
            ..ServiceConfig::default()
        };
        assert!(ProvisioningService::new(&config, Box::new(AllowAll)).is_err());
    }

    #[test]
    fn test_failure_display_is_opaque() {
        let shown = format!("{}", ProvisionFailure);
        assert!(!shown.contains('/'), "No paths may leak to the caller");
        assert!(!shown.contains("key"), "No key detail may leak to the caller");
    }
}
