//! Installing a pinned toolchain
//!
//! [`Installer::ensure_installed`] runs probe, download, verify, unpack and
//! mark. It is idempotent: the sentinel file [`SENTINEL`] in the
//! installation directory is the only record of a completed install, and it
//! is written last, atomically. A cached archive whose size matches the
//! server's is reused on retry.
//!
//! Concurrent downloads of the same version serialize on an advisory lock
//! in the installation directory.

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::extract;
use crate::fetch::{Fetcher, RemoteArchive};
use crate::output;
use crate::platform::Platform;
use crate::progress;
use crate::verify;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Zero-byte file marking a successfully downloaded and unpacked version.
pub const SENTINEL: &str = ".unpacked-success";

/// Advisory lock held while downloading into an installation directory.
const LOCK_FILE: &str = ".download.lock";

/// Suffix of the digest file published next to each archive.
const CHECKSUM_SUFFIX: &str = ".sha256";

/// Whether a completed installation exists at `root`.
pub fn is_installed(root: &Path) -> bool {
    std::fs::metadata(root.join(SENTINEL)).is_ok()
}

/// Downloads and unpacks releases for one platform.
pub struct Installer {
    fetcher: Fetcher,
    platform: Platform,
    download_base: String,
}

impl Installer {
    /// Installer for the running platform.
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self::for_platform(settings, Platform::current()?))
    }

    pub fn for_platform(settings: &Settings, platform: Platform) -> Self {
        Self {
            fetcher: Fetcher::new(),
            platform,
            download_base: settings.download_base.clone(),
        }
    }

    /// URL of the release archive for `version`.
    pub fn archive_url(&self, version: &str) -> String {
        format!("{}{}", self.download_base, self.platform.archive_name(version))
    }

    /// Make sure `version` is installed in `target_dir`.
    pub fn ensure_installed(&self, target_dir: &Path, version: &str) -> Result<()> {
        if is_installed(target_dir) {
            output::skip(&format!(
                "{}: already downloaded in {}",
                version,
                target_dir.display()
            ));
            return Ok(());
        }

        let url = self.archive_url(version);
        let remote = self.fetcher.probe(&url)?.ok_or_else(|| Error::NoRelease {
            version: version.to_string(),
            os: self.platform.os.to_string(),
            arch: self.platform.arch.to_string(),
            url: url.clone(),
        })?;

        std::fs::create_dir_all(target_dir).map_err(Error::io_at(target_dir))?;
        let _lock = lock_install_dir(target_dir, version)?;
        if is_installed(target_dir) {
            output::skip(&format!(
                "{}: already downloaded in {}",
                version,
                target_dir.display()
            ));
            return Ok(());
        }

        let file_name = url.rsplit('/').next().unwrap_or(&url);
        let archive = target_dir.join(file_name);
        self.fetch_archive(&remote, &archive)?;

        let want = self
            .fetcher
            .fetch_text(&format!("{}{}", url, CHECKSUM_SUFFIX))?;
        verify::verify_sha256(&archive, want.trim()).map_err(|e| Error::Verify {
            path: archive.clone(),
            source: Box::new(e),
        })?;

        output::detail(&format!("Unpacking {} ...", archive.display()));
        progress::with_spinner(&format!("unpacking {}", file_name), || {
            extract::unpack(target_dir, &archive)
        })
        .map_err(|e| Error::Extract {
            archive: archive.clone(),
            source: Box::new(e),
        })?;

        write_sentinel(target_dir)?;
        output::success(&format!("Success. You may now run '{}'", version));
        Ok(())
    }

    /// Ensure `archive` holds the full remote file, downloading unless a
    /// cached copy already has the advertised size.
    fn fetch_archive(&self, remote: &RemoteArchive, archive: &Path) -> Result<()> {
        match std::fs::metadata(archive) {
            Ok(meta) if Some(meta.len()) == remote.content_length => {
                output::detail(&format!("using cached {}", archive.display()));
                return Ok(());
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            // Something odd is at that path; don't download over it.
            Err(e) => return Err(Error::io_at(archive)(e)),
        }

        self.fetcher
            .download(&remote.url, archive)
            .map_err(|e| Error::Download {
                url: remote.url.clone(),
                source: Box::new(e),
            })?;

        let size = std::fs::metadata(archive)
            .map_err(Error::io_at(archive))?
            .len();
        if let Some(expected) = remote.content_length
            && size != expected
        {
            return Err(Error::DownloadSizeMismatch {
                path: archive.to_path_buf(),
                actual: size,
                expected,
            });
        }
        Ok(())
    }
}

/// Take the download lock for `dir`, waiting for any other holder.
fn lock_install_dir(dir: &Path, version: &str) -> Result<File> {
    let path = dir.join(LOCK_FILE);
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
        .map_err(Error::io_at(&path))?;

    if FileExt::try_lock_exclusive(&file).is_err() {
        output::info(&format!(
            "{}: waiting for another download to finish",
            version
        ));
        FileExt::lock_exclusive(&file).map_err(Error::io_at(&path))?;
    }
    Ok(file)
}

/// Create the sentinel by renaming a temp file into place.
fn write_sentinel(dir: &Path) -> Result<()> {
    let path = dir.join(SENTINEL);
    let tmp = tempfile::NamedTempFile::new_in(dir).map_err(Error::io_at(dir))?;
    tmp.persist(&path).map_err(|e| Error::IoAt {
        path: path.clone(),
        source: e.error,
    })?;
    Ok(())
}
