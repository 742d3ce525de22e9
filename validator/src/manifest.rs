//! `package.json` validation and canonical identifier derivation.
//!
//! Every `.foxe` archive embeds the extension's `package.json`. The
//! manifest is parsed into a strict record, the publisher-qualified
//! identifier is derived from it and compared with the catalog entry, and
//! the declared `main` script is located inside the archive.

use crate::artefact::archive::{ArchiveError, ArchiveView, normalize_entry_path};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// Name of the manifest entry inside an extension archive.
pub const MANIFEST_PATH: &str = "package.json";

/// How the publisher is determined when `package.json` has no `publisher`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublisherPolicy {
    /// The `publisher` field is mandatory.
    #[default]
    RequireExplicit,
    /// Fall back to the scope of a scoped package name (`@acme/ext`).
    ScopeFallback,
}

impl fmt::Display for PublisherPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequireExplicit => write!(f, "require-explicit"),
            Self::ScopeFallback => write!(f, "scope-fallback"),
        }
    }
}

/// Errors arising from manifest validation.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The archive has no `package.json`.
    #[error("missing package.json in extension")]
    MissingManifest,

    /// `package.json` could not be read or parsed.
    #[error("invalid package.json: {reason}")]
    InvalidManifest {
        /// Description of the parse failure.
        reason: String,
    },

    /// The `name` field is missing or empty.
    #[error("invalid extension: missing name")]
    MissingName,

    /// No publisher could be determined.
    #[error("invalid extension: missing publisher for package \"{name}\"")]
    MissingPublisher {
        /// The package name.
        name: String,
    },

    /// The publisher contains no identifier characters.
    #[error("invalid extension: publisher \"{publisher}\" has no valid identifier characters")]
    EmptyPublisher {
        /// The publisher as written in the manifest.
        publisher: String,
    },

    /// The derived identifier differs from the catalog's.
    #[error("identifier mismatch: catalog declares \"{declared}\", package.json yields \"{derived}\"")]
    IdentifierMismatch {
        /// The identifier recorded in the catalog.
        declared: String,
        /// The identifier derived from the manifest.
        derived: String,
    },

    /// The `main` field is missing or not a non-empty string.
    #[error("extension package.json main is missing")]
    MissingMain,

    /// The `main` script is not in the archive.
    #[error("extension is corrupted: unable to extract main JS file {path}")]
    MainEntryMissing {
        /// The normalised `main` path.
        path: String,
    },
}

/// The fields of `package.json` this validator reads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    name: Option<String>,
    publisher: Option<String>,
    main: Option<serde_json::Value>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, String>,
}

/// A validated extension manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    /// The package name as written, possibly scoped.
    pub name: String,
    /// The canonical `<publisher>.<name>` identifier.
    pub identifier: String,
    /// The normalised path of the main script inside the archive.
    pub main: String,
    /// Development dependencies mapped to their version ranges.
    pub dev_dependencies: BTreeMap<String, String>,
}

/// Derive the canonical identifier for a package.
///
/// The publisher keeps only ASCII letters, digits, `_` and whitespace; the
/// package name loses any `@scope/` prefix and is lower-cased.
///
/// # Errors
///
/// Returns [`ManifestError::MissingPublisher`] when no publisher is
/// available under `policy`, and [`ManifestError::EmptyPublisher`] when
/// the publisher normalises to nothing.
///
/// # Examples
///
/// ```
/// use registry_validator::manifest::{PublisherPolicy, canonical_identifier};
///
/// let id = canonical_identifier("@acme/My-Ext", None, PublisherPolicy::ScopeFallback)
///     .expect("scope supplies the publisher");
/// assert_eq!(id, "acme.my-ext");
///
/// let id = canonical_identifier("panel", Some("Acme, Inc."), PublisherPolicy::RequireExplicit)
///     .expect("explicit publisher");
/// assert_eq!(id, "Acme Inc.panel");
/// ```
pub fn canonical_identifier(
    name: &str,
    publisher: Option<&str>,
    policy: PublisherPolicy,
) -> Result<String, ManifestError> {
    let (scope, base_name) = split_scope(name);
    let raw_publisher = match (publisher, policy) {
        (Some(explicit), _) => explicit,
        (None, PublisherPolicy::ScopeFallback) => scope.ok_or_else(|| missing_publisher(name))?,
        (None, PublisherPolicy::RequireExplicit) => return Err(missing_publisher(name)),
    };
    let normalized: String = raw_publisher
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    if normalized.is_empty() {
        return Err(ManifestError::EmptyPublisher {
            publisher: raw_publisher.to_owned(),
        });
    }
    Ok(format!("{normalized}.{}", base_name.to_lowercase()))
}

/// Read, parse and cross-check the archive's `package.json`.
///
/// # Errors
///
/// Returns the first [`ManifestError`] encountered; later checks do not
/// run.
pub fn validate_manifest(
    archive: &mut ArchiveView,
    declared_id: &str,
    policy: PublisherPolicy,
) -> Result<PackageManifest, ManifestError> {
    let raw = read_raw_manifest(archive)?;
    let name = raw
        .name
        .filter(|name| !name.is_empty())
        .ok_or(ManifestError::MissingName)?;

    let identifier = canonical_identifier(&name, raw.publisher.as_deref(), policy)?;
    if identifier != declared_id {
        return Err(ManifestError::IdentifierMismatch {
            declared: declared_id.to_owned(),
            derived: identifier,
        });
    }

    let main = match raw.main {
        Some(serde_json::Value::String(main)) if !main.is_empty() => main,
        _ => return Err(ManifestError::MissingMain),
    };
    let main_path = normalize_entry_path(&main)
        .ok_or_else(|| ManifestError::MainEntryMissing { path: main.clone() })?;
    if archive.file(&main_path).is_none() {
        return Err(ManifestError::MainEntryMissing { path: main_path });
    }

    Ok(PackageManifest {
        name,
        identifier,
        main: main_path,
        dev_dependencies: raw.dev_dependencies,
    })
}

fn read_raw_manifest(archive: &mut ArchiveView) -> Result<RawManifest, ManifestError> {
    let text = archive.read_text(MANIFEST_PATH).map_err(|err| match err {
        ArchiveError::NotFound { .. } => ManifestError::MissingManifest,
        other => ManifestError::InvalidManifest {
            reason: other.to_string(),
        },
    })?;
    serde_json::from_str(&text).map_err(|err| ManifestError::InvalidManifest {
        reason: err.to_string(),
    })
}

/// Split `@scope/name` into its scope and bare name.
fn split_scope(name: &str) -> (Option<&str>, &str) {
    name.strip_prefix('@')
        .and_then(|scoped| scoped.split_once('/'))
        .map_or((None, name), |(scope, base)| (Some(scope), base))
}

fn missing_publisher(name: &str) -> ManifestError {
    ManifestError::MissingPublisher {
        name: name.to_owned(),
    }
}
