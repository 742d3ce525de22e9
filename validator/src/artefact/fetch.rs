//! HTTP retrieval for extension archives and their documentation.
//!
//! Provides a trait-based abstraction over the network so that the
//! validation pipeline can be exercised without network access. Nothing in
//! this module retries; every failure is reported to the caller as-is.

use log::debug;
use std::sync::OnceLock;
use std::time::Duration;

/// Network timeout applied to every request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound on the size of a downloaded `.foxe` archive.
const MAX_ARTIFACT_BYTES: u64 = 512 * 1024 * 1024;

/// The HTTP status an artefact download must return.
const STATUS_OK: u16 = 200;

/// Trait for retrieving catalog resources.
///
/// # Examples
///
/// ```
/// use registry_validator::artefact::fetch::HttpFetcher;
///
/// let fetcher = HttpFetcher;
/// // Use fetcher.fetch_artifact("https://example.com/ext.foxe") in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ExtensionFetcher {
    /// Download the archive at `url` and return its bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::UnexpectedStatus`] unless the server answers
    /// with status 200 exactly, and [`FetchError::Transport`] or
    /// [`FetchError::Body`] when the request or body read fails.
    fn fetch_artifact(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Request the document at `url` and report its status and content type.
    ///
    /// Error statuses are returned as data so that callers can render
    /// them; only transport failures are errors.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] when no response was received.
    fn fetch_document(&self, url: &str) -> Result<DocumentResponse, FetchError>;
}

/// Status line and content type of a documentation response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The canonical reason phrase for `status`, empty when unknown.
    pub reason: String,
    /// The raw `content-type` header value, if any.
    pub content_type: Option<String>,
}

impl DocumentResponse {
    /// Return true for any 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Errors arising from resource retrieval.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The request could not be completed.
    #[error("request to {url} failed: {reason}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The server answered with a status other than 200.
    #[error("invalid foxe URL {url}: expected 200 response, got {status}")]
    UnexpectedStatus {
        /// The URL that was requested.
        url: String,
        /// The observed HTTP status.
        status: u16,
    },

    /// The response body could not be read.
    #[error("failed to read response body from {url}: {reason}")]
    Body {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },
}

/// HTTP-based fetcher using `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

impl ExtensionFetcher for HttpFetcher {
    fn fetch_artifact(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!("downloading {url}");
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| transport_error(url, &e))?;
        let status = response.status().as_u16();
        if status != STATUS_OK {
            return Err(FetchError::UnexpectedStatus {
                url: url.to_owned(),
                status,
            });
        }
        response
            .into_body()
            .with_config()
            .limit(MAX_ARTIFACT_BYTES)
            .read_to_vec()
            .map_err(|e| FetchError::Body {
                url: url.to_owned(),
                reason: e.to_string(),
            })
    }

    fn fetch_document(&self, url: &str) -> Result<DocumentResponse, FetchError> {
        debug!("requesting {url}");
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| transport_error(url, &e))?;
        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        Ok(DocumentResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_owned(),
            content_type,
        })
    }
}

/// Shared `ureq` agent that reports HTTP error statuses as responses.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .http_status_as_error(false)
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`FetchError`].
fn transport_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(status) => FetchError::UnexpectedStatus {
            url: url.to_owned(),
            status: *status,
        },
        other => FetchError::Transport {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
