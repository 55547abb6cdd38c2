//! HTTP access to the release server
//!
//! Three operations back an installation: a HEAD probe for existence and
//! size, a GET of the archive body streamed to disk with progress, and a GET
//! of the small `.sha256` sidecar. Every request carries a `User-Agent`
//! derived from this crate's version.
//!
//! Proxies are taken from the usual `HTTP_PROXY`/`HTTPS_PROXY`/`NO_PROXY`
//! variables.

use crate::error::{Error, Result};
use crate::progress::ProgressWriter;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Build the `User-Agent` value for a crate version. Pre-release and build
/// suffixes are collapsed so the product token stays well-formed.
pub fn user_agent_for(version: &str) -> String {
    let version = if version.contains(['-', '+', ' ']) {
        "devel"
    } else {
        version
    };
    format!("godl/{}", version)
}

/// `User-Agent` sent with every request.
pub fn user_agent() -> String {
    user_agent_for(env!("CARGO_PKG_VERSION"))
}

/// Result of a successful metadata probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteArchive {
    pub url: String,
    /// Size advertised by the server, when it sent one.
    pub content_length: Option<u64>,
}

/// Client for the release server.
pub struct Fetcher {
    /// Metadata probe and sidecar fetches.
    agent: ureq::Agent,
    /// Archive bodies: one connection per request, no idle pooling.
    body_agent: ureq::Agent,
}

impl Fetcher {
    pub fn new() -> Self {
        let ua = user_agent();

        let agent = ureq::AgentBuilder::new()
            .user_agent(&ua)
            .try_proxy_from_env(true)
            .build();

        let body_agent = ureq::AgentBuilder::new()
            .user_agent(&ua)
            .try_proxy_from_env(true)
            .max_idle_connections(0)
            .max_idle_connections_per_host(0)
            .build();

        Self { agent, body_agent }
    }

    /// HEAD `url`. Returns `None` when the server answers 404.
    pub fn probe(&self, url: &str) -> Result<Option<RemoteArchive>> {
        let response = match self.agent.head(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(404, _)) => return Ok(None),
            Err(e) => return Err(Error::from_ureq(url, e)),
        };

        if response.status() != 200 {
            return Err(Error::Server {
                status: format!("{} {}", response.status(), response.status_text()),
                url: url.to_string(),
            });
        }

        let content_length = response
            .header("content-length")
            .and_then(|s| s.trim().parse().ok());

        Ok(Some(RemoteArchive {
            url: url.to_string(),
            content_length,
        }))
    }

    /// Download `url` into `dest`, reporting progress on stderr.
    ///
    /// The partially written file is removed on failure.
    pub fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let file = File::create(dest).map_err(Error::io_at(dest))?;
        let result = self.copy_body(url, file, std::io::stderr());
        if result.is_err() {
            let _ = std::fs::remove_file(dest);
        }
        result
    }

    fn copy_body(&self, url: &str, file: File, progress_out: impl Write) -> Result<u64> {
        let response = self
            .body_agent
            .get(url)
            .set("Accept-Encoding", "identity")
            .set("Connection", "close")
            .call()
            .map_err(|e| Error::from_ureq(url, e))?;

        if response.status() != 200 {
            return Err(Error::Server {
                status: format!("{} {}", response.status(), response.status_text()),
                url: url.to_string(),
            });
        }

        let content_length: Option<u64> = response
            .header("content-length")
            .and_then(|s| s.trim().parse().ok());

        let mut reader = response.into_reader();
        let mut pw = ProgressWriter::new(BufWriter::new(file), content_length, progress_out);
        let copied = std::io::copy(&mut reader, &mut pw)?;

        if let Some(expected) = content_length
            && expected != copied
        {
            return Err(Error::TruncatedBody {
                actual: copied,
                expected,
            });
        }

        let file = pw
            .finish()?
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))?;
        file.sync_all()?;
        Ok(copied)
    }

    /// GET a small text resource.
    pub fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| Error::from_ureq(url, e))?;

        if response.status() != 200 {
            return Err(Error::Server {
                status: format!("{} {}", response.status(), response.status_text()),
                url: url.to_string(),
            });
        }

        response.into_string().map_err(|source| Error::Download {
            url: url.to_string(),
            source: Box::new(Error::Io(source)),
        })
    }
}
