//! Archive unpacking
//!
//! Extracts a release archive (`.tar.gz` or `.zip`) into an installation
//! directory, dropping the archive's wrapping `go/` directory. Entry names
//! are validated before anything is written: an empty name, a backslash, a
//! leading `/` or a `..` segment fails with [`Error::UnsafeArchiveEntry`].
//!
//! Extraction is not transactional. A failure leaves whatever entries were
//! already written; a retry overwrites them file by file.

use crate::error::{Error, Result};
use crate::output;
use filetime::FileTime;
use flate2::read::GzDecoder;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};

/// Top-level directory every upstream archive wraps its contents in.
pub const ROOT_PREFIX: &str = "go/";

/// Unpack `archive` into `target_dir`, choosing the format by file suffix.
pub fn unpack(target_dir: &Path, archive: &Path) -> Result<()> {
    let name = archive
        .file_name()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if name.ends_with(".zip") {
        unpack_zip(target_dir, archive)
    } else if name.ends_with(".tar.gz") {
        unpack_tar_gz(target_dir, archive)
    } else {
        Err(Error::UnsupportedArchiveFormat(archive.to_path_buf()))
    }
}

/// Map an archive entry name to a path relative to the target directory.
///
/// Returns `None` for the wrapping root directory itself.
fn entry_relative_path(name: &str) -> Result<Option<PathBuf>> {
    let unsafe_entry = || Error::UnsafeArchiveEntry(name.to_string());

    if name.is_empty()
        || name.contains('\\')
        || name.starts_with('/')
        || name.split('/').any(|seg| seg == "..")
    {
        return Err(unsafe_entry());
    }

    let stripped = name.strip_prefix(ROOT_PREFIX).unwrap_or(name);
    let rel: PathBuf = stripped
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect();

    // Catches drive prefixes and anything else the platform parses specially.
    if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
        return Err(unsafe_entry());
    }

    if rel.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(rel))
    }
}

/// Create `dir` and its ancestors with standard permissions.
fn make_dir_all(dir: &Path) -> Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(dir).map_err(Error::io_at(dir))
}

/// Tracks which parent directories already exist.
#[derive(Default)]
struct DirCache(HashSet<PathBuf>);

impl DirCache {
    fn ensure_parent(&mut self, file: &Path) -> Result<()> {
        if let Some(dir) = file.parent()
            && !self.0.contains(dir)
        {
            make_dir_all(dir)?;
            self.0.insert(dir.to_path_buf());
        }
        Ok(())
    }

    fn make(&mut self, dir: &Path) -> Result<()> {
        make_dir_all(dir)?;
        self.0.insert(dir.to_path_buf());
        Ok(())
    }
}

/// Write exactly `expected` bytes from `reader` to a fresh file at `path`.
fn write_file(path: &Path, reader: &mut impl Read, mode: u32, expected: u64) -> Result<()> {
    let mut opts = OpenOptions::new();
    opts.read(true).write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut out = opts.open(path).map_err(Error::io_at(path))?;
    let written = std::io::copy(reader, &mut out).map_err(Error::io_at(path))?;

    if written != expected {
        return Err(Error::ShortWrite {
            path: path.to_path_buf(),
            expected,
            actual: written,
        });
    }
    Ok(())
}

fn restore_mtime(path: &Path, mtime: u64) {
    let time = FileTime::from_unix_time(mtime as i64, 0);
    if let Err(e) = filetime::set_file_times(path, time, time) {
        output::warning(&format!("error changing modtime of {}: {}", path.display(), e));
    }
}

/// Seconds since the Unix epoch for a zip timestamp, read as UTC.
fn zip_unix_time(t: zip::DateTime) -> u64 {
    let days = days_from_civil(t.year().into(), t.month().into(), t.day().into());
    let secs = days * 86_400
        + i64::from(t.hour()) * 3_600
        + i64::from(t.minute()) * 60
        + i64::from(t.second());
    secs.max(0) as u64
}

/// Days from 1970-01-01 to a proleptic Gregorian date.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = year.div_euclid(400);
    let yoe = year - era * 400;
    let doy = (153 * ((month + 9) % 12) + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn unpack_tar_gz(target_dir: &Path, archive: &Path) -> Result<()> {
    let file = File::open(archive).map_err(Error::io_at(archive))?;
    unpack_tar(GzDecoder::new(BufReader::new(file)), target_dir)
}

/// Extract a tar stream. The first bad entry aborts the whole extraction.
fn unpack_tar<R: Read>(reader: R, target_dir: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    let mut dirs = DirCache::default();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_type = entry.header().entry_type();
        if entry_type == tar::EntryType::XGlobalHeader {
            continue;
        }

        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let rel = entry_relative_path(&name)?;
        let abs = match &rel {
            Some(rel) => target_dir.join(rel),
            None => target_dir.to_path_buf(),
        };

        match entry_type {
            tar::EntryType::Regular | tar::EntryType::Continuous => {
                if rel.is_none() {
                    return Err(Error::UnsafeArchiveEntry(name));
                }
                let size = entry.size();
                let mode = entry.header().mode()? & 0o777;
                let mtime = entry.header().mtime().unwrap_or(0);

                dirs.ensure_parent(&abs)?;
                write_file(&abs, &mut entry, mode, size)?;
                if mtime != 0 {
                    restore_mtime(&abs, mtime);
                }
            }
            tar::EntryType::Directory => dirs.make(&abs)?,
            other => {
                return Err(Error::UnsupportedEntryType {
                    name,
                    kind: format!("{:?}", other),
                });
            }
        }
    }

    Ok(())
}

/// Extract a zip archive. Entries are checked one at a time as they are reached.
fn unpack_zip(target_dir: &Path, archive: &Path) -> Result<()> {
    let file = File::open(archive).map_err(Error::io_at(archive))?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file))?;
    let mut dirs = DirCache::default();

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = entry.name().to_string();
        let rel = entry_relative_path(&name)?;
        let abs = match &rel {
            Some(rel) => target_dir.join(rel),
            None => target_dir.to_path_buf(),
        };

        if entry.is_dir() {
            dirs.make(&abs)?;
            continue;
        }
        if rel.is_none() {
            return Err(Error::UnsafeArchiveEntry(name));
        }
        if entry.is_symlink() {
            return Err(Error::UnsupportedEntryType {
                name,
                kind: "Symlink".to_string(),
            });
        }

        let mode = entry.unix_mode().map(|m| m & 0o777).unwrap_or(0o644);
        let size = entry.size();
        let mtime = entry.last_modified().map(zip_unix_time);
        dirs.ensure_parent(&abs)?;
        write_file(&abs, &mut entry, mode, size)?;
        if let Some(mtime) = mtime {
            restore_mtime(&abs, mtime);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Build a tar.gz whose entry names are written verbatim into the
    /// header, bypassing the builder's own path checks.
    fn raw_tar_gz(path: &Path, entries: &[(&str, tar::EntryType, &[u8])]) {
        let file = File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for (name, kind, data) in entries {
            let mut header = tar::Header::new_old();
            header.set_entry_type(*kind);
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_mtime(1_600_000_000);
            header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
            header.set_cksum();
            builder.append(&header, *data).unwrap();
        }

        let encoder = builder.into_inner().unwrap();
        encoder.finish().unwrap();
    }

    fn zip_file(path: &Path, entries: &[(&str, Option<&[u8]>)]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .unix_permissions(0o755)
            .last_modified_time(zip::DateTime::from_date_and_time(2020, 9, 13, 12, 26, 40).unwrap());
        for (name, data) in entries {
            match data {
                Some(data) => {
                    zip.start_file(*name, options).unwrap();
                    zip.write_all(data).unwrap();
                }
                None => zip.add_directory(*name, options).unwrap(),
            }
        }
        zip.finish().unwrap();
    }

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_entry_relative_path() {
        assert_eq!(
            entry_relative_path("go/bin/go").unwrap(),
            Some(PathBuf::from("bin").join("go"))
        );
        assert_eq!(entry_relative_path("go/").unwrap(), None);
        assert_eq!(
            entry_relative_path("go/pkg/").unwrap(),
            Some(PathBuf::from("pkg"))
        );

        for bad in ["", "/etc/passwd", "go/../evil", "go/bin/..", "..", "go\\bin\\go"] {
            assert!(
                matches!(entry_relative_path(bad), Err(Error::UnsafeArchiveEntry(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_unpack_tar_gz_strips_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive = temp_dir.path().join("go1.24.3.linux-amd64.tar.gz");
        let target = temp_dir.path().join("target");

        let go_binary = b"#!/bin/sh\necho go\n";
        raw_tar_gz(
            &archive,
            &[
                ("go/", tar::EntryType::Directory, b"".as_slice()),
                ("go/bin/go", tar::EntryType::Regular, go_binary.as_slice()),
                ("go/lib/foo.txt", tar::EntryType::Regular, b"foo".as_slice()),
                ("go/pkg/", tar::EntryType::Directory, b"".as_slice()),
            ],
        );

        unpack(&target, &archive).unwrap();

        assert_eq!(listing(&target), ["bin", "lib", "pkg"]);
        assert_eq!(std::fs::read(target.join("bin/go")).unwrap(), go_binary);
        assert_eq!(
            std::fs::metadata(target.join("bin/go")).unwrap().len(),
            go_binary.len() as u64
        );
        assert_eq!(std::fs::read_to_string(target.join("lib/foo.txt")).unwrap(), "foo");
        assert!(target.join("pkg").is_dir());

        let meta = std::fs::metadata(target.join("lib/foo.txt")).unwrap();
        assert_eq!(
            FileTime::from_last_modification_time(&meta).unix_seconds(),
            1_600_000_000
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(target.join("bin/go")).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn test_unpack_tar_gz_over_existing_tree() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive = temp_dir.path().join("go.tar.gz");
        let target = temp_dir.path().join("target");
        std::fs::create_dir_all(target.join("bin")).unwrap();
        std::fs::write(target.join("bin/go"), b"stale contents that are longer").unwrap();

        raw_tar_gz(
            &archive,
            &[
                ("go/bin/", tar::EntryType::Directory, b"".as_slice()),
                ("go/bin/go", tar::EntryType::Regular, b"fresh".as_slice()),
            ],
        );

        unpack(&target, &archive).unwrap();
        assert_eq!(std::fs::read(target.join("bin/go")).unwrap(), b"fresh");
    }

    #[test]
    fn test_unpack_tar_gz_rejects_traversal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let target = temp_dir.path().join("target");

        for bad in ["go/../evil.txt", "/evil.txt", "go\\..\\evil.txt"] {
            let archive = temp_dir.path().join("bad.tar.gz");
            raw_tar_gz(
                &archive,
                &[
                    ("go/first.txt", tar::EntryType::Regular, b"1".as_slice()),
                    (bad, tar::EntryType::Regular, b"pwned".as_slice()),
                    ("go/last.txt", tar::EntryType::Regular, b"2".as_slice()),
                ],
            );

            let err = unpack(&target, &archive).unwrap_err();
            assert!(
                matches!(&err, Error::UnsafeArchiveEntry(name) if name == bad),
                "got {err}"
            );
            assert!(!temp_dir.path().join("evil.txt").exists());
            assert!(target.join("first.txt").exists());
            assert!(!target.join("last.txt").exists());
        }
    }

    #[test]
    fn test_unpack_tar_gz_rejects_symlink() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive = temp_dir.path().join("link.tar.gz");
        let target = temp_dir.path().join("target");

        raw_tar_gz(&archive, &[("go/bin/gofmt", tar::EntryType::Symlink, b"".as_slice())]);

        let err = unpack(&target, &archive).unwrap_err();
        match err {
            Error::UnsupportedEntryType { name, kind } => {
                assert_eq!(name, "go/bin/gofmt");
                assert_eq!(kind, "Symlink");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!target.join("bin/gofmt").exists());
    }

    #[test]
    fn test_unpack_zip_strips_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive = temp_dir.path().join("go1.24.3.windows-amd64.zip");
        let target = temp_dir.path().join("target");

        zip_file(
            &archive,
            &[
                ("go/bin/go.exe", Some(b"MZ binary".as_slice())),
                ("go/lib/foo.txt", Some(b"foo".as_slice())),
                ("go/pkg/", None),
            ],
        );

        unpack(&target, &archive).unwrap();

        assert_eq!(listing(&target), ["bin", "lib", "pkg"]);
        assert_eq!(std::fs::read(target.join("bin/go.exe")).unwrap(), b"MZ binary");
        assert_eq!(std::fs::read_to_string(target.join("lib/foo.txt")).unwrap(), "foo");
        assert!(target.join("pkg").is_dir());

        let meta = std::fs::metadata(target.join("lib/foo.txt")).unwrap();
        assert_eq!(
            FileTime::from_last_modification_time(&meta).unix_seconds(),
            1_600_000_000
        );
    }

    #[test]
    fn test_zip_unix_time() {
        let epoch = zip::DateTime::from_date_and_time(1980, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(zip_unix_time(epoch), 315_532_800);
        let leap = zip::DateTime::from_date_and_time(2024, 2, 29, 23, 59, 58).unwrap();
        assert_eq!(zip_unix_time(leap), 1_709_251_198);
    }

    #[test]
    fn test_unpack_zip_rejects_symlink() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive = temp_dir.path().join("link.zip");
        let target = temp_dir.path().join("target");

        let file = File::create(&archive).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.add_symlink("go/bin/gofmt", "go", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.finish().unwrap();

        let err = unpack(&target, &archive).unwrap_err();
        match err {
            Error::UnsupportedEntryType { name, kind } => {
                assert_eq!(name, "go/bin/gofmt");
                assert_eq!(kind, "Symlink");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!target.join("bin/gofmt").exists());
    }

    #[test]
    fn test_short_write() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("go");

        let err = write_file(&path, &mut b"abc".as_slice(), 0o644, 10).unwrap_err();
        match err {
            Error::ShortWrite {
                path: p,
                expected,
                actual,
            } => {
                assert_eq!(p, path);
                assert_eq!(expected, 10);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unpack_zip_rejects_traversal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive = temp_dir.path().join("bad.zip");
        let target = temp_dir.path().join("target");

        zip_file(&archive, &[("go/../evil.txt", Some(b"pwned".as_slice()))]);

        let err = unpack(&target, &archive).unwrap_err();
        assert!(matches!(err, Error::UnsafeArchiveEntry(_)), "got {err}");
        assert!(!temp_dir.path().join("evil.txt").exists());
    }

    #[test]
    fn test_unsupported_format() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = unpack(temp_dir.path(), Path::new("go1.24.3.linux-amd64.tar.xz")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedArchiveFormat(_)));
    }
}
