// TOTP Warden — Controlled Invoker
//
// Orchestrates one generator run: authorize the caller, verify the pinned
// executable, execute it in an isolated child with a fixed argument
// vector, and hand the bounded capture back. No caller-supplied data ever
// reaches the executable path, argv, or environment of the child.

mod error;
mod exec;
mod identity;

pub use error::InvokeError;
pub use exec::{run_captured, CaptureOutcome, ChildStatus, ExecRequest};
pub use identity::{AuthorizationPolicy, CallerIdentity, UidAllowlist};

use std::path::PathBuf;
use std::time::Duration;

use nix::sys::signal::Signal;
use nix::unistd::{access, AccessFlags};
use zeroize::Zeroizing;

use crate::config::ServiceConfig;

/// Fixed argument vector for the generator: time-based, disallow reuse,
/// force, rate-limit 3 per 30 seconds.
pub const GENERATOR_ARGV: &[&str] = &[
    "google-authenticator",
    "-t",
    "-d",
    "-f",
    "-r",
    "3",
    "-R",
    "30",
];

/// Authorizes, pins, executes, captures.
pub struct ControlledInvoker {
    executable: PathBuf,
    service_user: Option<String>,
    max_capture: usize,
    timeout: Duration,
    policy: Box<dyn AuthorizationPolicy>,
}

impl ControlledInvoker {
    pub fn new(config: &ServiceConfig, policy: Box<dyn AuthorizationPolicy>) -> Self {
        Self {
            executable: config.executable.clone(),
            service_user: config.service_user.clone(),
            max_capture: config.max_capture,
            timeout: config.capture_timeout,
            policy,
        }
    }

    /// Run the pinned generator once and return its captured output.
    ///
    /// Authorization happens before anything privileged: a denied or
    /// unresolvable caller produces no pipe, no fork, and no exec.
    pub fn invoke(&self) -> Result<Zeroizing<Vec<u8>>, InvokeError> {
        let caller = CallerIdentity::current()?;
        if !self.policy.authorize(&caller) {
            tracing::warn!(caller = %caller, "Unauthorized enrollment attempt");
            return Err(InvokeError::Unauthorized);
        }
        tracing::debug!(caller = %caller, "Caller authorized");

        access(&self.executable, AccessFlags::X_OK)
            .map_err(|_| InvokeError::ExecutableUnavailable(self.executable.clone()))?;

        let request = ExecRequest {
            executable: &self.executable,
            argv: GENERATOR_ARGV,
            drop_to: self.service_user.as_deref(),
            max_capture: self.max_capture,
            timeout: self.timeout,
        };
        let outcome = run_captured(&request)?;

        if outcome.output.is_empty() {
            return Err(InvokeError::GenerationFailed(
                "generator produced no output".to_string(),
            ));
        }
        match outcome.status {
            ChildStatus::Exited(0) => Ok(outcome.output),
            // A child that died writing past the capture bound was not
            // abnormal: the excess is simply never read.
            ChildStatus::Signaled(Signal::SIGPIPE)
                if outcome.output.len() == self.max_capture =>
            {
                Ok(outcome.output)
            }
            ChildStatus::Exited(code) => Err(InvokeError::GenerationFailed(format!(
                "generator exited with status {code}"
            ))),
            ChildStatus::Signaled(_) | ChildStatus::Unknown => Err(
                InvokeError::GenerationFailed("generator terminated abnormally".to_string()),
            ),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    struct AllowAll;
    impl AuthorizationPolicy for AllowAll {
        fn authorize(&self, _caller: &CallerIdentity) -> bool {
            true
        }
    }

    struct DenyAll;
    impl AuthorizationPolicy for DenyAll {
        fn authorize(&self, _caller: &CallerIdentity) -> bool {
            false
        }
    }

    fn config_for(executable: &std::path::Path) -> ServiceConfig {
        ServiceConfig {
            executable: executable.to_path_buf(),
            service_user: None,
            capture_timeout: Duration::from_secs(5),
            ..ServiceConfig::default()
        }
    }

    #[test]
    fn test_denied_caller_gets_unauthorized() {
        let invoker = ControlledInvoker::new(
            &config_for(std::path::Path::new("/bin/echo")),
            Box::new(DenyAll),
        );
        assert!(matches!(invoker.invoke(), Err(InvokeError::Unauthorized)));
    }

    #[test]
    fn test_missing_executable_is_rejected_before_fork() {
        let invoker = ControlledInvoker::new(
            &config_for(std::path::Path::new("/nonexistent/generator")),
            Box::new(AllowAll),
        );
        assert!(matches!(
            invoker.invoke(),
            Err(InvokeError::ExecutableUnavailable(_))
        ));
    }

    #[test]
    fn test_invoke_captures_generator_output() {
        // /bin/echo ignores the fixed flags and prints them; good enough
        // to prove the pinned-argv plumbing end to end.
        let invoker = ControlledInvoker::new(
            &config_for(std::path::Path::new("/bin/echo")),
            Box::new(AllowAll),
        );
        let output = invoker.invoke().unwrap();
        let text = String::from_utf8_lossy(&output);
        assert!(text.contains("-t"));
        assert!(text.contains("-R 30") || text.contains("30"));
    }

    #[test]
    fn test_fixed_argv_never_contains_caller_data() {
        assert_eq!(GENERATOR_ARGV[0], "google-authenticator");
        assert!(GENERATOR_ARGV.iter().all(|arg| !arg.contains('/')));
    }
}
