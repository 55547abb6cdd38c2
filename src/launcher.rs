//! Per-version entry point
//!
//! `godl` dispatches one invocation for one pinned version:
//!
//! - `<version> download` installs the release and exits 0, or 1 on failure.
//! - `<version> <args...>` requires a completed install and runs the
//!   toolchain's `go` binary with `args`, exiting with its exit code.

use crate::config::Settings;
use crate::delegate::{self, GENERIC_FAILURE};
use crate::error::Error;
use crate::install::{self, Installer};
use crate::output;
use std::ffi::OsString;

/// The only argument vector that is handled here instead of delegated.
pub const DOWNLOAD_COMMAND: &str = "download";

/// Run `version` with `args` (program name excluded) using the process
/// environment. Returns the exit code for the process.
pub fn run(version: &str, args: &[OsString]) -> i32 {
    run_with(&Settings::from_env(), version, args)
}

/// [`run`] with explicit settings.
pub fn run_with(settings: &Settings, version: &str, args: &[OsString]) -> i32 {
    let root = match settings.install_dir(version) {
        Ok(root) => root,
        Err(e) => {
            output::error(&format!("{}: {}", version, e));
            return GENERIC_FAILURE;
        }
    };

    if args.len() == 1 && args[0] == DOWNLOAD_COMMAND {
        let result =
            Installer::new(settings).and_then(|installer| installer.ensure_installed(&root, version));
        return match result {
            Ok(()) => 0,
            Err(e) => {
                output::error(&format!("{}: download failed: {}", version, e));
                GENERIC_FAILURE
            }
        };
    }

    if !install::is_installed(&root) {
        let e = Error::NotInstalled {
            version: version.to_string(),
            root,
        };
        output::error(&format!("{}: {}", version, e));
        return GENERIC_FAILURE;
    }

    match delegate::run_delegate(&root, args) {
        Ok(code) => code,
        Err(e) => {
            output::error(&format!("{}: {}", version, e));
            GENERIC_FAILURE
        }
    }
}
