//! Shared fixtures: release archives built in memory and a mock release server.

#![allow(dead_code)]

use sha2::{Digest, Sha256};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Script standing in for the real `go` binary. It records its arguments
/// and `PATH` under `$GOROOT`, then exits with `code`.
pub fn fake_go(code: i32) -> String {
    format!(
        "#!/bin/sh\nprintf '%s\\n' \"$@\" > \"$GOROOT/args.txt\"\nprintf '%s\\n' \"$PATH\" > \"$GOROOT/path.txt\"\nexit {}\n",
        code
    )
}

/// A tar.gz laid out like an upstream release: everything under `go/`.
pub fn release_tarball(go_binary: &[u8]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for dir in ["go/bin", "go/pkg"] {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, dir, std::io::empty()).unwrap();
    }

    let files: [(&str, &[u8], u32); 2] = [
        ("go/bin/go", go_binary, 0o755),
        ("go/lib/foo.txt", b"foo", 0o644),
    ];
    for (name, data, mode) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_mtime(1_600_000_000);
        header.set_cksum();
        builder.append_data(&mut header, name, data).unwrap();
    }

    let encoder = builder.into_inner().unwrap();
    encoder.finish().unwrap()
}

/// A tar.gz with one entry whose name is written verbatim into the header.
pub fn tarball_with_raw_name(name: &str, data: &[u8]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut header = tar::Header::new_old();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
    header.set_cksum();
    builder.append(&header, data).unwrap();

    let encoder = builder.into_inner().unwrap();
    encoder.finish().unwrap()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Serve `archive` at `/<name>` (HEAD and GET) and its digest at
/// `/<name>.sha256`. With `hits`, each mock must be hit exactly that often.
pub async fn mount_release(server: &MockServer, name: &str, archive: &[u8], hits: Option<u64>) {
    mount_release_with(server, name, archive, archive.len(), &sha256_hex(archive), hits).await;
}

/// Like [`mount_release`] but with an explicit advertised size and digest.
pub async fn mount_release_with(
    server: &MockServer,
    name: &str,
    archive: &[u8],
    advertised_len: usize,
    digest: &str,
    hits: Option<u64>,
) {
    let archive_path = format!("/{}", name);
    let digest_path = format!("/{}.sha256", name);

    let head = Mock::given(method("HEAD"))
        .and(path(archive_path.as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-length", advertised_len.to_string().as_str())
                .set_body_bytes(vec![0u8; advertised_len]),
        );
    let get = Mock::given(method("GET"))
        .and(path(archive_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive.to_vec()));
    let sidecar = Mock::given(method("GET"))
        .and(path(digest_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("{}\n", digest)));

    match hits {
        Some(n) => {
            head.expect(n).mount(server).await;
            get.expect(n).mount(server).await;
            sidecar.expect(n).mount(server).await;
        }
        None => {
            head.mount(server).await;
            get.mount(server).await;
            sidecar.mount(server).await;
        }
    }
}

/// Lay out a completed installation whose `bin/go` is `script`.
#[cfg(unix)]
pub fn fake_install(root: &std::path::Path, script: &str) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::create_dir_all(root.join("bin")).unwrap();
    let go = root.join("bin/go");
    std::fs::write(&go, script).unwrap();
    std::fs::set_permissions(&go, std::fs::Permissions::from_mode(0o755)).unwrap();
    std::fs::write(root.join(godl::install::SENTINEL), b"").unwrap();
}
