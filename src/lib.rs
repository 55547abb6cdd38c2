//! Version-pinned Go toolchain launcher
//!
//! `godl` makes a command named after a Go release (for example `go1.24.3`)
//! behave like that release's `go` tool. The first run of
//! `go1.24.3 download` fetches the release archive, checks its SHA-256
//! against the published digest, and unpacks it under `~/sdk/go1.24.3` (or
//! `$GOPATH/sdk/go1.24.3`). Every other invocation runs the unpacked `go`
//! binary with the same arguments, standard streams and exit code.
//!
//! # Layout of an installation
//!
//! ```text
//! ~/sdk/go1.24.3/
//!     bin/go                        unpacked distribution (go/ prefix stripped)
//!     go1.24.3.linux-amd64.tar.gz   cached archive, reused when its size matches
//!     .unpacked-success             written only after a verified, complete unpack
//! ```
//!
//! # Pipeline
//!
//! - [`fetch`] - HEAD probe, archive download, `.sha256` sidecar
//! - [`verify`] - SHA-256 of the archive
//! - [`extract`] - tar.gz / zip unpacking with entry-name hardening
//! - [`install`] - the idempotent orchestration of the above
//! - [`delegate`] - running the installed binary
//! - [`launcher`] - `download` vs. delegate dispatch

pub mod config;
pub mod delegate;
pub mod env;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod install;
pub mod launcher;
pub mod output;
pub mod platform;
pub mod progress;
pub mod verify;

pub use config::Settings;
pub use error::{Error, Result};
pub use install::Installer;
pub use launcher::run;
