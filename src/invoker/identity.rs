// TOTP Warden — Caller Verification
//
// Identifies the process requesting an enrollment by resolving its real
// uid/gid to a passwd entry, and applies an authorization policy over that
// identity. Resolution failure is treated the same as a policy denial:
// the request fails closed before any process is created.

use std::collections::BTreeSet;
use std::fmt;

use nix::unistd::{getegid, geteuid, User};

use super::InvokeError;

/// Identity of the process invoking the provisioning service.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    /// Effective user ID of the caller.
    pub uid: u32,
    /// Effective group ID of the caller.
    pub gid: u32,
    /// Account name from the passwd database.
    pub username: String,
}

impl CallerIdentity {
    /// Resolve the current process's effective identity.
    ///
    /// A uid with no passwd entry cannot be authorized: there is no
    /// identity to evaluate a policy against.
    pub fn current() -> Result<Self, InvokeError> {
        let uid = geteuid();
        let gid = getegid();

        let user = User::from_uid(uid)
            .map_err(|_| InvokeError::Unauthorized)?
            .ok_or(InvokeError::Unauthorized)?;

        Ok(Self {
            uid: uid.as_raw(),
            gid: gid.as_raw(),
            username: user.name,
        })
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (uid:{} gid:{})", self.username, self.uid, self.gid)
    }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Pluggable authorization predicate over the caller's identity.
pub trait AuthorizationPolicy: Send + Sync {
    /// True if this caller may request an enrollment.
    fn authorize(&self, caller: &CallerIdentity) -> bool;
}

/// Allow callers whose uid or gid appears in a fixed allowlist.
/// An empty allowlist authorizes nobody.
pub struct UidAllowlist {
    uids: BTreeSet<u32>,
    gids: BTreeSet<u32>,
}

impl UidAllowlist {
    pub fn new(uids: impl IntoIterator<Item = u32>, gids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            uids: uids.into_iter().collect(),
            gids: gids.into_iter().collect(),
        }
    }
}

impl AuthorizationPolicy for UidAllowlist {
    fn authorize(&self, caller: &CallerIdentity) -> bool {
        self.uids.contains(&caller.uid) || self.gids.contains(&caller.gid)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(uid: u32, gid: u32) -> CallerIdentity {
        CallerIdentity {
            uid,
            gid,
            username: "tester".to_string(),
        }
    }

    #[test]
    fn test_current_identity_resolves() {
        let identity = CallerIdentity::current().expect("Current process must have an identity");
        assert!(!identity.username.is_empty());
        assert_eq!(identity.uid, nix::unistd::geteuid().as_raw());
    }

    #[test]
    fn test_display_omits_nothing_sensitive() {
        let identity = caller(1000, 1000);
        let shown = format!("{}", identity);
        assert!(shown.contains("tester"));
        assert!(shown.contains("uid:1000"));
    }

    #[test]
    fn test_empty_allowlist_denies_everyone() {
        let policy = UidAllowlist::new([], []);
        assert!(!policy.authorize(&caller(0, 0)));
        assert!(!policy.authorize(&caller(1000, 1000)));
    }

    #[test]
    fn test_uid_match_authorizes() {
        let policy = UidAllowlist::new([1000], []);
        assert!(policy.authorize(&caller(1000, 33)));
        assert!(!policy.authorize(&caller(1001, 33)));
    }

    #[test]
    fn test_gid_match_authorizes() {
        let policy = UidAllowlist::new([], [33]);
        assert!(policy.authorize(&caller(1000, 33)));
        assert!(!policy.authorize(&caller(1000, 34)));
    }
}
