//! Running the installed toolchain
//!
//! The child inherits stdio and gets an environment pointing `GOROOT` and
//! `PATH` at the installation. Its exit code becomes ours.

use crate::env;
use crate::error::{Error, Result};
use crate::platform::{CASE_INSENSITIVE_ENV, EXE_SUFFIX};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Once;

/// Exit code used when the child could not be run or died from a signal.
pub const GENERIC_FAILURE: i32 = 1;

/// Path of the delegated executable inside an installation.
pub fn delegate_path(root: &Path) -> PathBuf {
    root.join("bin").join(format!("go{}", EXE_SUFFIX))
}

static SIGNALS: Once = Once::new();

#[cfg(unix)]
extern "C" fn discard_signal(_: libc::c_int) {}

#[cfg(unix)]
fn install_quit_handler() {
    // SAFETY: installs an async-signal-safe no-op handler with an empty
    // mask; the sigaction struct is fully initialised.
    let rc = unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = discard_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
        action.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&mut action.sa_mask);
        libc::sigaction(libc::SIGQUIT, &action, std::ptr::null_mut())
    };
    if rc != 0 {
        crate::output::warning(&format!(
            "cannot install quit handler: {}",
            std::io::Error::last_os_error()
        ));
    }
}

#[cfg(not(unix))]
fn install_quit_handler() {}

/// Leave interrupt and quit to the child.
///
/// Both signals get a no-op handler in this process, so the terminal's
/// Ctrl-C or Ctrl-\ reaches the child (same process group) and only the
/// child reacts. Handlers, unlike ignored dispositions, are reset by
/// `exec`, so the child starts with defaults. Registration is done once and
/// lives until this process exits; there is no unsubscription.
pub fn leave_signals_to_child() {
    SIGNALS.call_once(|| {
        if let Err(e) = ctrlc::set_handler(|| {}) {
            crate::output::warning(&format!("cannot install interrupt handler: {}", e));
        }

        install_quit_handler();
    });
}

/// Run the toolchain installed at `root` with `args` and return the exit
/// code to propagate.
pub fn run_delegate(root: &Path, args: &[OsString]) -> Result<i32> {
    let program = delegate_path(root);
    let environment = env::delegate_env(root, std::env::vars_os(), CASE_INSENSITIVE_ENV);

    let mut cmd = Command::new(&program);
    cmd.args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .env_clear()
        .envs(environment);

    leave_signals_to_child();

    let status = cmd.status().map_err(|source| Error::DelegateSpawnFailure {
        path: program.clone(),
        source,
    })?;

    Ok(status.code().unwrap_or(GENERIC_FAILURE))
}
