//! Readme and changelog link checks.
//!
//! Documentation links must serve plain text. Links to the GitHub web UI
//! render HTML and are rejected without a request.

use crate::artefact::fetch::{ExtensionFetcher, FetchError};
use log::debug;
use std::fmt;
use url::Url;

/// Hosts serving the GitHub web UI rather than raw file contents.
const WEB_UI_HOSTS: [&str; 2] = ["github.com", "www.github.com"];

/// Required prefix of the `content-type` header.
const PLAIN_TEXT_PREFIX: &str = "text/plain";

/// Which documentation link is being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// The extension's readme.
    Readme,
    /// The extension's changelog.
    Changelog,
}

impl DocumentKind {
    /// Both kinds, in checking order.
    pub const ALL: [Self; 2] = [Self::Readme, Self::Changelog];
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Readme => write!(f, "readme"),
            Self::Changelog => write!(f, "changelog"),
        }
    }
}

/// Errors arising from documentation link checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// The link is not an absolute URL.
    #[error("Invalid {kind} URL \"{url}\": {reason}")]
    InvalidUrl {
        /// Which link.
        kind: DocumentKind,
        /// The link as written.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The link points at the GitHub web UI.
    #[error("Invalid {kind} URL: use raw.githubusercontent.com instead of github.com")]
    WebUiHost {
        /// Which link.
        kind: DocumentKind,
    },

    /// The request failed outright.
    #[error("Invalid {kind} URL: {source}")]
    Unreachable {
        /// Which link.
        kind: DocumentKind,
        /// The transport failure.
        #[source]
        source: FetchError,
    },

    /// The server answered with a non-success status.
    #[error("Invalid {kind} URL: expected status 200, got {status} {reason}")]
    UnexpectedStatus {
        /// Which link.
        kind: DocumentKind,
        /// The observed status.
        status: u16,
        /// The reason phrase.
        reason: String,
    },

    /// The response is not plain text.
    #[error("Invalid {kind} URL: expected content-type text/plain, got: {}", content_type.as_deref().unwrap_or("none"))]
    NotPlainText {
        /// Which link.
        kind: DocumentKind,
        /// The observed content type.
        content_type: Option<String>,
    },
}

/// Check that `url` serves plain text.
///
/// # Errors
///
/// Returns a [`DocumentError`] describing the first problem found.
pub fn verify_document_link(
    fetcher: &dyn ExtensionFetcher,
    url: &str,
    kind: DocumentKind,
) -> Result<(), DocumentError> {
    let parsed = Url::parse(url).map_err(|err| DocumentError::InvalidUrl {
        kind,
        url: url.to_owned(),
        reason: err.to_string(),
    })?;
    if parsed
        .host_str()
        .is_some_and(|host| WEB_UI_HOSTS.contains(&host))
    {
        return Err(DocumentError::WebUiHost { kind });
    }

    debug!("checking {kind} link {url}");
    let response = fetcher
        .fetch_document(url)
        .map_err(|source| DocumentError::Unreachable { kind, source })?;
    if !response.is_success() {
        return Err(DocumentError::UnexpectedStatus {
            kind,
            status: response.status,
            reason: response.reason,
        });
    }
    match response.content_type {
        Some(content_type) if content_type.starts_with(PLAIN_TEXT_PREFIX) => Ok(()),
        content_type => Err(DocumentError::NotPlainText { kind, content_type }),
    }
}
