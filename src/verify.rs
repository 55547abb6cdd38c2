//! SHA-256 verification of downloaded archives

use crate::error::{Error, Result};
use crate::progress;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Chunk size for reading files during hashing (1MB)
const CHUNK_SIZE: usize = 1024 * 1024;

/// Threshold for showing progress (100MB)
const PROGRESS_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Verify that `file` has the SHA-256 digest `expected` (hex, any case).
///
/// Reads the whole file; fails with [`Error::ChecksumMismatch`] naming both
/// digests when they differ.
pub fn verify_sha256(file: &Path, expected: &str) -> Result<()> {
    let actual = sha256_file(file)?;
    let expected = expected.trim().to_lowercase();

    if actual != expected {
        return Err(Error::ChecksumMismatch {
            path: file.to_path_buf(),
            expected,
            actual,
        });
    }

    Ok(())
}

/// Hex SHA-256 of a file's full contents.
pub fn sha256_file(file: &Path) -> Result<String> {
    let mut f = std::fs::File::open(file).map_err(Error::io_at(file))?;
    let file_size = f.metadata().map(|m| m.len()).unwrap_or(0);

    let pb = (file_size > PROGRESS_THRESHOLD).then(|| progress::create_byte_progress(file_size));

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let n = f.read(&mut buffer).map_err(Error::io_at(file))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        if let Some(pb) = &pb {
            pb.inc(n as u64);
        }
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    Ok(hex::encode(hasher.finalize()))
}
