//! OS/architecture lookup for release archives
//!
//! Maps Rust's `std::env::consts` names onto the labels used in upstream
//! release file names, together with the archive container each OS ships.

use crate::error::{Error, Result};

/// Archive container served for a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Zip,
}

impl ArchiveKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
        }
    }
}

/// A resolved release platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: &'static str,
    pub arch: &'static str,
    pub archive: ArchiveKind,
}

/// Rust OS name -> release OS label.
const OS_TABLE: &[(&str, &str)] = &[
    ("linux", "linux"),
    ("macos", "darwin"),
    ("windows", "windows"),
    ("freebsd", "freebsd"),
    ("netbsd", "netbsd"),
    ("openbsd", "openbsd"),
    ("dragonfly", "dragonfly"),
    ("illumos", "illumos"),
    ("solaris", "solaris"),
    ("android", "android"),
    ("aix", "aix"),
];

/// Rust arch name -> release arch label. Rows with a concrete OS take
/// precedence over the `*` fallback rows.
const ARCH_TABLE: &[(&str, &str, &str)] = &[
    ("linux", "arm", "armv6l"),
    ("*", "x86", "386"),
    ("*", "x86_64", "amd64"),
    ("*", "arm", "arm"),
    ("*", "aarch64", "arm64"),
    ("*", "powerpc64", POWERPC64),
    ("*", "riscv64", "riscv64"),
    ("*", "s390x", "s390x"),
    ("*", "loongarch64", "loong64"),
    ("*", "mips", "mips"),
    ("*", "mips64", "mips64"),
];

#[cfg(target_endian = "little")]
const POWERPC64: &str = "ppc64le";
#[cfg(target_endian = "big")]
const POWERPC64: &str = "ppc64";

impl Platform {
    /// Platform of the running process.
    pub fn current() -> Result<Self> {
        Self::lookup(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Resolve a platform from Rust's OS and architecture names.
    pub fn lookup(os: &str, arch: &str) -> Result<Self> {
        let unsupported = || Error::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        };

        let os_label = OS_TABLE
            .iter()
            .find(|(rust, _)| *rust == os)
            .map(|(_, label)| *label)
            .ok_or_else(unsupported)?;

        let arch_label = ARCH_TABLE
            .iter()
            .find(|(o, a, _)| *o == os && *a == arch)
            .or_else(|| ARCH_TABLE.iter().find(|(o, a, _)| *o == "*" && *a == arch))
            .map(|(_, _, label)| *label)
            .ok_or_else(unsupported)?;

        let archive = if os == "windows" {
            ArchiveKind::Zip
        } else {
            ArchiveKind::TarGz
        };

        Ok(Self {
            os: os_label,
            arch: arch_label,
            archive,
        })
    }

    /// Release file name for `version`, e.g. `go1.24.3.linux-amd64.tar.gz`.
    pub fn archive_name(&self, version: &str) -> String {
        format!(
            "{}.{}-{}.{}",
            version,
            self.os,
            self.arch,
            self.archive.extension()
        )
    }
}

/// Suffix of executables on the running OS.
pub const EXE_SUFFIX: &str = std::env::consts::EXE_SUFFIX;

/// Separator between entries of `PATH`.
#[cfg(windows)]
pub const PATH_LIST_SEPARATOR: &str = ";";
#[cfg(not(windows))]
pub const PATH_LIST_SEPARATOR: &str = ":";

/// Environment keys compare case-insensitively on Windows only.
pub const CASE_INSENSITIVE_ENV: bool = cfg!(windows);
