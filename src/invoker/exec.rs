// TOTP Warden — Isolated Execution
//
// Runs one pinned executable in a forked child with stdout/stderr
// redirected into a pipe, privileges dropped before exec, and a bounded,
// deadline-guarded capture in the parent. The argument vector is fixed by
// the caller of this abstraction; nothing here consults the environment
// or external input.

use std::ffi::{CStr, CString};
use std::fs::File;
use std::io::Read;
use std::os::fd::{AsFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::time::{Duration, Instant};

use nix::poll::{poll, PollFd, PollFlags};
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{
    dup2, execv, fork, geteuid, pipe, setgid, setgroups, setuid, ForkResult, Gid, Pid, Uid, User,
};
use zeroize::Zeroizing;

use super::InvokeError;

// Child exit codes for failures before/at exec. The parent only ever sees
// these as "abnormal exit"; they are distinguishable in debug logs.
const EXIT_DROP_FAILED: i32 = 125;
const EXIT_SETUP_FAILED: i32 = 126;
const EXIT_EXEC_FAILED: i32 = 127;

/// One isolated execution request: pinned path, fixed argv, target
/// identity, capture bound, and deadline.
pub struct ExecRequest<'a> {
    pub executable: &'a Path,
    pub argv: &'a [&'a str],
    /// User to drop to before exec. `None` skips the drop (test fixtures).
    pub drop_to: Option<&'a str>,
    pub max_capture: usize,
    pub timeout: Duration,
}

/// How the child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildStatus {
    Exited(i32),
    Signaled(Signal),
    Unknown,
}

/// Captured output and exit status of one child run.
impl std::fmt::Debug for CaptureOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureOutcome")
            .field("output", &format_args!("<{} bytes>", self.output.len()))
            .field("status", &self.status)
            .finish()
    }
}

pub struct CaptureOutcome {
    /// Combined stdout/stderr, at most `max_capture` bytes, zeroed on drop.
    pub output: Zeroizing<Vec<u8>>,
    pub status: ChildStatus,
}

/// Fork, redirect, drop privileges, exec, capture, reap.
///
/// The child is always reaped before this returns, including on every
/// error path after a successful fork; a child still alive at the
/// deadline is SIGKILLed.
pub fn run_captured(req: &ExecRequest<'_>) -> Result<CaptureOutcome, InvokeError> {
    let exe = CString::new(req.executable.as_os_str().as_bytes())
        .map_err(|_| InvokeError::ProcessCreation("executable path contains NUL".to_string()))?;
    let argv: Vec<CString> = req
        .argv
        .iter()
        .map(|arg| CString::new(*arg))
        .collect::<Result<_, _>>()
        .map_err(|_| InvokeError::ProcessCreation("argument contains NUL".to_string()))?;
    let drop_ids = resolve_drop_target(req.drop_to)?;

    let (read_fd, write_fd) =
        pipe().map_err(|e| InvokeError::ProcessCreation(format!("pipe: {e}")))?;

    // The child touches only async-signal-safe calls between fork and
    // exec; everything it needs was allocated above.
    match unsafe { fork() } {
        Err(e) => Err(InvokeError::ProcessCreation(format!("fork: {e}"))),
        Ok(ForkResult::Child) => child_exec(read_fd, write_fd, drop_ids, &exe, &argv),
        Ok(ForkResult::Parent { child }) => {
            drop(write_fd);
            let deadline = Instant::now() + req.timeout;

            let mut reader = File::from(read_fd);
            let captured = capture_bounded(&mut reader, req.max_capture, deadline);
            // Closing the read end unblocks a child still writing past
            // the capture bound.
            drop(reader);

            let status = reap_child(child, deadline);
            let captured = captured?;
            if captured.timed_out {
                return Err(InvokeError::GenerationFailed(
                    "generator did not complete before the deadline".to_string(),
                ));
            }

            Ok(CaptureOutcome {
                output: captured.data,
                status,
            })
        }
    }
}

/// Resolve the privilege-drop target before forking.
///
/// When the process is not privileged the drop is skipped: it cannot
/// succeed, and there is no privilege to shed. When privileged, a target
/// that cannot be resolved fails the whole request here, before any child
/// exists.
fn resolve_drop_target(drop_to: Option<&str>) -> Result<Option<(Uid, Gid)>, InvokeError> {
    let Some(name) = drop_to else {
        return Ok(None);
    };
    if !geteuid().is_root() {
        tracing::debug!(user = name, "Not privileged; skipping privilege drop");
        return Ok(None);
    }
    let user = User::from_name(name)
        .map_err(|e| InvokeError::ProcessCreation(format!("service user lookup failed: {e}")))?
        .ok_or_else(|| {
            InvokeError::ProcessCreation(format!("service user not found: {name}"))
        })?;
    Ok(Some((user.uid, user.gid)))
}

/// Child side: redirect, drop, exec. Never returns to caller-reachable
/// code; every failure is an immediate `_exit`.
fn child_exec(
    read_fd: OwnedFd,
    write_fd: OwnedFd,
    drop_ids: Option<(Uid, Gid)>,
    exe: &CStr,
    argv: &[CString],
) -> ! {
    drop(read_fd);

    let raw = write_fd.as_raw_fd();
    if dup2(raw, nix::libc::STDOUT_FILENO).is_err() {
        unsafe { nix::libc::_exit(EXIT_SETUP_FAILED) }
    }
    if dup2(raw, nix::libc::STDERR_FILENO).is_err() {
        unsafe { nix::libc::_exit(EXIT_SETUP_FAILED) }
    }
    drop(write_fd);

    if let Some((uid, gid)) = drop_ids {
        // Order matters: groups and gid first, uid last. Each step is
        // checked; running the generator with privileges intact is never
        // acceptable.
        if setgroups(&[gid]).is_err() || setgid(gid).is_err() || setuid(uid).is_err() {
            unsafe { nix::libc::_exit(EXIT_DROP_FAILED) }
        }
        // The drop must be irreversible: regaining root means it failed.
        if setuid(Uid::from_raw(0)).is_ok() {
            unsafe { nix::libc::_exit(EXIT_DROP_FAILED) }
        }
    }

    let _ = execv(exe, argv);
    unsafe { nix::libc::_exit(EXIT_EXEC_FAILED) }
}

struct Captured {
    data: Zeroizing<Vec<u8>>,
    timed_out: bool,
}

/// Read at most `max` bytes from the pipe, never blocking past `deadline`.
/// Excess child output is simply not read.
fn capture_bounded(
    reader: &mut File,
    max: usize,
    deadline: Instant,
) -> Result<Captured, InvokeError> {
    let mut data = Zeroizing::new(vec![0u8; max]);
    let mut filled = 0usize;
    let mut timed_out = false;

    while filled < max {
        let now = Instant::now();
        if now >= deadline {
            timed_out = true;
            break;
        }
        let millis = u16::try_from((deadline - now).as_millis())
            .unwrap_or(u16::MAX)
            .max(1);

        let ready = {
            let mut fds = [PollFd::new(reader.as_fd(), PollFlags::POLLIN)];
            poll(&mut fds, millis)
        };
        match ready {
            Ok(0) => continue,
            Ok(_) => match reader.read(&mut data[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(InvokeError::GenerationFailed(format!("capture failed: {e}")))
                }
            },
            Err(nix::errno::Errno::EINTR) => continue,
            Err(e) => return Err(InvokeError::GenerationFailed(format!("poll failed: {e}"))),
        }
    }

    data.truncate(filled);
    Ok(Captured { data, timed_out })
}

/// Collect the child's exit status, forcibly terminating it if it is
/// still alive at the deadline. Always leaves no zombie behind.
fn reap_child(child: Pid, deadline: Instant) -> ChildStatus {
    loop {
        match waitpid(child, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(_, code)) => return ChildStatus::Exited(code),
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                tracing::debug!(?signal, "Generator child was signaled");
                return ChildStatus::Signaled(signal);
            }
            Ok(_) => {
                if Instant::now() >= deadline {
                    tracing::warn!(pid = child.as_raw(), "Killing unresponsive generator child");
                    let _ = kill(child, Signal::SIGKILL);
                    return match waitpid(child, None) {
                        Ok(WaitStatus::Exited(_, code)) => ChildStatus::Exited(code),
                        Ok(WaitStatus::Signaled(_, signal, _)) => ChildStatus::Signaled(signal),
                        _ => ChildStatus::Unknown,
                    };
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(e) => {
                tracing::debug!(pid = child.as_raw(), error = %e, "waitpid failed");
                return ChildStatus::Unknown;
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
