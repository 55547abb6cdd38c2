//! Environment-driven configuration
//!
//! All knobs come from environment variables, read once into [`Settings`]:
//!
//! - `GOPATH` - installation root override (`$GOPATH/sdk/<version>`)
//! - `HOME` / `USERPROFILE` - home directory fallback (`~/sdk/<version>`)
//! - `GODL_DOWNLOAD_BASE` - where release archives are served from

use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Default location of release archives.
pub const DEFAULT_DOWNLOAD_BASE: &str = "https://dl.google.com/go/";

/// Directory under the root that holds one subdirectory per version.
pub const SDK_DIR: &str = "sdk";

/// Resolved launcher configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Installation root override (`GOPATH`).
    pub root_override: Option<PathBuf>,
    /// Home directory, if one could be determined.
    pub home: Option<PathBuf>,
    /// Why `home` is missing, reported when it is needed.
    pub home_error: Option<String>,
    /// Base URL of release archives, always ending in `/`.
    pub download_base: String,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(std::env::consts::OS, |key| std::env::var_os(key))
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup(os: &str, lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let (home, home_error) = match home_dir(os, &non_empty) {
            Ok(home) => (Some(home), None),
            Err(e) => (None, Some(e)),
        };

        let mut download_base = non_empty("GODL_DOWNLOAD_BASE")
            .map(|v| v.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_DOWNLOAD_BASE.to_string());
        if !download_base.ends_with('/') {
            download_base.push('/');
        }

        Self {
            root_override: non_empty("GOPATH").map(PathBuf::from),
            home,
            home_error,
            download_base,
        }
    }

    /// Settings rooted at an explicit directory, downloading from `download_base`.
    pub fn with_root(root: impl Into<PathBuf>, download_base: &str) -> Self {
        let mut download_base = download_base.to_string();
        if !download_base.ends_with('/') {
            download_base.push('/');
        }
        Self {
            root_override: Some(root.into()),
            home: None,
            home_error: None,
            download_base,
        }
    }

    /// Installation directory for `version`.
    pub fn install_dir(&self, version: &str) -> Result<PathBuf> {
        validate_version(version)?;

        if let Some(root) = &self.root_override {
            return Ok(root.join(SDK_DIR).join(version));
        }

        match &self.home {
            Some(home) => Ok(home.join(SDK_DIR).join(version)),
            None => Err(Error::Resolution(format!(
                "failed to get home directory: {}",
                self.home_error
                    .as_deref()
                    .unwrap_or("can't find user home directory")
            ))),
        }
    }
}

fn home_dir(
    os: &str,
    lookup: &impl Fn(&str) -> Option<OsString>,
) -> std::result::Result<PathBuf, String> {
    match os {
        "plan9" => Err(format!("{:?} not yet supported", os)),
        "windows" => lookup("USERPROFILE")
            .map(PathBuf::from)
            .ok_or_else(|| "can't find user home directory; %USERPROFILE% is empty".to_string()),
        _ => lookup("HOME")
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .ok_or_else(|| "can't find user home directory; $HOME is empty".to_string()),
    }
}

/// A version is only a lookup key, but it becomes a directory name.
fn validate_version(version: &str) -> Result<()> {
    let mut components = Path::new(version).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_normal || version.contains(['/', '\\']) {
        return Err(Error::Resolution(format!(
            "invalid version identifier {:?}",
            version
        )));
    }
    Ok(())
}
