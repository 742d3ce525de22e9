//! Registry catalog loading.
//!
//! The catalog is the `extensions.json` array maintained in the registry
//! repository. Only the keys needed for validation are kept; descriptive
//! keys such as `name`, `license` or `keywords` are accepted and ignored.

use crate::error::{Result, ValidatorError};
use camino::Utf8Path;
use serde::Deserialize;

/// One extension listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogEntry {
    /// Canonical `<publisher>.<name>` identifier.
    pub id: String,
    /// Download URL of the `.foxe` archive.
    #[serde(rename = "foxe")]
    pub artifact_url: String,
    /// Lowercase hex SHA-256 of the archive.
    #[serde(rename = "sha256sum")]
    pub expected_digest: String,
    /// URL of the plain-text readme.
    #[serde(rename = "readme")]
    pub readme_url: String,
    /// URL of the plain-text changelog.
    #[serde(rename = "changelog")]
    pub changelog_url: String,
}

/// Parse catalog JSON.
///
/// # Errors
///
/// Returns [`ValidatorError::CatalogParse`] when `contents` is not a JSON
/// array of catalog entries.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use registry_validator::catalog::parse_catalog;
///
/// let json = r#"[{
///     "id": "acme.panel",
///     "name": "Panel",
///     "foxe": "https://example.com/panel.foxe",
///     "sha256sum": "00",
///     "readme": "https://raw.githubusercontent.com/acme/panel/main/README.md",
///     "changelog": "https://raw.githubusercontent.com/acme/panel/main/CHANGELOG.md"
/// }]"#;
/// let entries = parse_catalog(json, Utf8Path::new("extensions.json")).expect("valid catalog");
/// assert_eq!(entries.len(), 1);
/// ```
pub fn parse_catalog(contents: &str, path: &Utf8Path) -> Result<Vec<CatalogEntry>> {
    serde_json::from_str(contents).map_err(|err| ValidatorError::CatalogParse {
        path: path.to_owned(),
        reason: err.to_string(),
    })
}

/// Read and parse the catalog file at `path`.
///
/// # Errors
///
/// Returns [`ValidatorError::CatalogRead`] when the file cannot be read
/// and [`ValidatorError::CatalogParse`] when it is malformed.
pub fn load_catalog(path: &Utf8Path) -> Result<Vec<CatalogEntry>> {
    let contents = std::fs::read_to_string(path).map_err(|source| ValidatorError::CatalogRead {
        path: path.to_owned(),
        source,
    })?;
    let entries = parse_catalog(&contents, path)?;
    log::debug!("loaded {} catalog entries from {path}", entries.len());
    Ok(entries)
}
