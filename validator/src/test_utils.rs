//! Shared test utilities for the validator crate.
//!
//! Builds in-memory `.foxe` archives and serves canned HTTP responses so
//! that the validation pipeline can be exercised end to end offline.

use crate::artefact::digest::Sha256Digest;
use crate::artefact::fetch::{DocumentResponse, ExtensionFetcher, FetchError};
use crate::catalog::CatalogEntry;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::Mutex;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Entry point used by fixture manifests.
pub const FIXTURE_MAIN: &str = "./dist/extension.js";

/// Builder for in-memory zip archives.
#[derive(Debug, Default)]
pub struct ExtensionArchiveBuilder {
    entries: Vec<FixtureEntry>,
}

#[derive(Debug)]
enum FixtureEntry {
    Directory(String),
    File {
        path: String,
        contents: String,
        compression: CompressionMethod,
    },
}

impl ExtensionArchiveBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a deflate-compressed file.
    #[must_use]
    pub fn file(self, path: &str, contents: &str) -> Self {
        self.with_file(path, contents, CompressionMethod::Deflated)
    }

    /// Add a file stored without compression.
    #[must_use]
    pub fn stored_file(self, path: &str, contents: &str) -> Self {
        self.with_file(path, contents, CompressionMethod::Stored)
    }

    /// Add a directory entry.
    #[must_use]
    pub fn directory(mut self, path: &str) -> Self {
        self.entries.push(FixtureEntry::Directory(path.to_owned()));
        self
    }

    fn with_file(mut self, path: &str, contents: &str, compression: CompressionMethod) -> Self {
        self.entries.push(FixtureEntry::File {
            path: path.to_owned(),
            contents: contents.to_owned(),
            compression,
        });
        self
    }

    /// Serialise the archive.
    ///
    /// # Panics
    ///
    /// Panics if the in-memory zip writer fails.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in self.entries {
            match entry {
                FixtureEntry::Directory(path) => writer
                    .add_directory(path, SimpleFileOptions::default())
                    .expect("add directory"),
                FixtureEntry::File {
                    path,
                    contents,
                    compression,
                } => {
                    let options = SimpleFileOptions::default().compression_method(compression);
                    writer.start_file(path, options).expect("start file");
                    writer
                        .write_all(contents.as_bytes())
                        .expect("write file contents");
                }
            }
        }
        writer.finish().expect("finish archive").into_inner()
    }
}

/// Render a `package.json` for a fixture extension.
///
/// `publisher` and `build_tool_range` are omitted from the JSON when
/// `None`.
#[must_use]
pub fn package_json(name: &str, publisher: Option<&str>, build_tool_range: Option<&str>) -> String {
    let mut manifest = serde_json::json!({
        "name": name,
        "version": "1.0.0",
        "main": FIXTURE_MAIN,
        "devDependencies": {},
    });
    if let Some(publisher) = publisher {
        manifest["publisher"] = serde_json::Value::from(publisher);
    }
    if let Some(range) = build_tool_range {
        manifest["devDependencies"]["create-foxglove-extension"] = serde_json::Value::from(range);
    }
    manifest.to_string()
}

/// Build a well-formed extension archive around `package_json`.
#[must_use]
pub fn extension_archive(package_json: &str) -> Vec<u8> {
    ExtensionArchiveBuilder::new()
        .file("package.json", package_json)
        .file("dist/extension.js", "module.exports.activate = () => {};")
        .build()
}

/// Return the lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256Digest::compute(bytes).as_str().to_owned()
}

/// Build a catalog entry whose URLs live under `https://registry.test/<slug>/`.
#[must_use]
pub fn catalog_entry(id: &str, expected_digest: &str) -> CatalogEntry {
    let slug = id.replace('.', "-");
    CatalogEntry {
        id: id.to_owned(),
        artifact_url: format!("https://registry.test/{slug}/extension.foxe"),
        expected_digest: expected_digest.to_owned(),
        readme_url: format!("https://raw.githubusercontent.com/test/{slug}/main/README.md"),
        changelog_url: format!("https://raw.githubusercontent.com/test/{slug}/main/CHANGELOG.md"),
    }
}

/// A canned response served by [`StubFetcher`].
#[derive(Debug, Clone)]
pub enum StubResponse {
    /// An artefact download answered with status 200.
    Artifact(Vec<u8>),
    /// Any response described by its status line and content type.
    Document(DocumentResponse),
    /// A transport failure.
    Unreachable(String),
}

impl StubResponse {
    /// A 200 response with the given content type.
    #[must_use]
    pub fn text(content_type: &str) -> Self {
        Self::Document(DocumentResponse {
            status: 200,
            reason: "OK".to_owned(),
            content_type: Some(content_type.to_owned()),
        })
    }

    /// A response with the given status and no content type.
    #[must_use]
    pub fn status(status: u16, reason: &str) -> Self {
        Self::Document(DocumentResponse {
            status,
            reason: reason.to_owned(),
            content_type: None,
        })
    }
}

/// An [`ExtensionFetcher`] serving canned responses keyed by URL.
///
/// Unknown URLs answer 404. Every request is recorded.
#[derive(Debug, Default)]
pub struct StubFetcher {
    responses: HashMap<String, StubResponse>,
    requests: Mutex<Vec<String>>,
}

impl StubFetcher {
    /// Create a fetcher with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` for `url`.
    #[must_use]
    pub fn route(mut self, url: &str, response: StubResponse) -> Self {
        self.responses.insert(url.to_owned(), response);
        self
    }

    /// Serve `archive` for the entry's artefact and plain-text documents for
    /// its readme and changelog.
    #[must_use]
    pub fn serve_entry(self, entry: &CatalogEntry, archive: Vec<u8>) -> Self {
        self.route(&entry.artifact_url, StubResponse::Artifact(archive))
            .route(&entry.readme_url, StubResponse::text("text/plain; charset=utf-8"))
            .route(&entry.changelog_url, StubResponse::text("text/plain; charset=utf-8"))
    }

    /// Return every URL requested so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the request log mutex is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("request log lock").clone()
    }

    fn lookup(&self, url: &str) -> Option<StubResponse> {
        self.requests
            .lock()
            .expect("request log lock")
            .push(url.to_owned());
        self.responses.get(url).cloned()
    }
}

impl ExtensionFetcher for StubFetcher {
    fn fetch_artifact(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        match self.lookup(url) {
            Some(StubResponse::Artifact(bytes)) => Ok(bytes),
            Some(StubResponse::Document(response)) => Err(FetchError::UnexpectedStatus {
                url: url.to_owned(),
                status: response.status,
            }),
            Some(StubResponse::Unreachable(reason)) => Err(FetchError::Transport {
                url: url.to_owned(),
                reason,
            }),
            None => Err(FetchError::UnexpectedStatus {
                url: url.to_owned(),
                status: 404,
            }),
        }
    }

    fn fetch_document(&self, url: &str) -> Result<DocumentResponse, FetchError> {
        match self.lookup(url) {
            Some(StubResponse::Document(response)) => Ok(response),
            Some(StubResponse::Artifact(_)) => Ok(DocumentResponse {
                status: 200,
                reason: "OK".to_owned(),
                content_type: Some("application/octet-stream".to_owned()),
            }),
            Some(StubResponse::Unreachable(reason)) => Err(FetchError::Transport {
                url: url.to_owned(),
                reason,
            }),
            None => Ok(DocumentResponse {
                status: 404,
                reason: "Not Found".to_owned(),
                content_type: Some("text/html".to_owned()),
            }),
        }
    }
}
