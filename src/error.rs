//! Error types for the fetch, verify, unpack and delegate pipeline.

use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while installing or running a pinned toolchain.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Resolution(String),

    #[error("unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("no binary release of {version} for {os}/{arch} at {url}")]
    NoRelease {
        version: String,
        os: String,
        arch: String,
        url: String,
    },

    #[error("server returned {status} for {url}")]
    Server { status: String, url: String },

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<ureq::Transport>,
    },

    #[error("error downloading {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: Box<Error>,
    },

    #[error("downloaded file {} size {actual} doesn't match server size {expected}", path.display())]
    DownloadSizeMismatch {
        path: PathBuf,
        actual: u64,
        expected: u64,
    },

    #[error("copied {actual} bytes; expected {expected}")]
    TruncatedBody { actual: u64, expected: u64 },

    #[error("{} corrupt? does not have expected SHA-256 of {expected} (got {actual})", path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("error verifying SHA256 of {}: {source}", path.display())]
    Verify {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("archive contained invalid name {0:?}")]
    UnsafeArchiveEntry(String),

    #[error("archive entry {name} contained unsupported file type {kind}")]
    UnsupportedEntryType { name: String, kind: String },

    #[error("unsupported archive file: {}", .0.display())]
    UnsupportedArchiveFormat(PathBuf),

    #[error("only wrote {actual} bytes to {}; expected {expected}", path.display())]
    ShortWrite {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("extracting archive {}: {source}", archive.display())]
    Extract {
        archive: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("archive read error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("not downloaded. Run '{version} download' to install to {}", root.display())]
    NotInstalled { version: String, root: PathBuf },

    #[error("cannot run {}: {source}", path.display())]
    DelegateSpawnFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Attach a path to an I/O error.
    pub(crate) fn io_at(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
        move |source| Error::IoAt {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Map a `ureq` failure into a server or transport error for `url`.
    pub(crate) fn from_ureq(url: &str, err: ureq::Error) -> Error {
        match err {
            ureq::Error::Status(code, response) => Error::Server {
                status: format!("{} {}", code, response.status_text()),
                url: url.to_string(),
            },
            ureq::Error::Transport(transport) => Error::Network {
                url: url.to_string(),
                source: Box::new(transport),
            },
        }
    }
}
