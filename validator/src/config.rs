//! Validation settings and the optional TOML configuration file.
//!
//! [`ValidationConfig`] carries the floor version, exemption list and
//! publisher policy into the pipeline. It is built from defaults, then
//! from `registry-validator.toml` when one is found, and finally from
//! command-line overrides.

use crate::artefact::digest::Sha256Digest;
use crate::build_tool::DEFAULT_FLOOR_VERSION;
use crate::error::{Result, ValidatorError};
use crate::exemptions::ExemptionList;
use crate::manifest::PublisherPolicy;
use camino::Utf8Path;
use semver::Version;
use serde::Deserialize;

/// Configuration file looked up in the working directory when no
/// `--config` path is given.
pub const DEFAULT_CONFIG_FILE: &str = "registry-validator.toml";

/// Settings shared by every entry of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationConfig {
    /// Lowest build-tool version accepted without an exemption.
    pub floor_version: Version,
    /// Digests allowed to stay below the floor.
    pub exemptions: ExemptionList,
    /// How a missing `publisher` is handled.
    pub publisher_policy: PublisherPolicy,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            floor_version: DEFAULT_FLOOR_VERSION,
            exemptions: ExemptionList::embedded(),
            publisher_policy: PublisherPolicy::default(),
        }
    }
}

/// Contents of a configuration file. Absent keys keep their defaults.
///
/// ```toml
/// floor_version = "1.0.0"
/// publisher_policy = "scope-fallback"
/// exempt_digests = [
///     "0c5e1f0a0d2f7c7f0b6b1e3d8f2a4c6e9b1d3f5a7c9e1b3d5f7a9c1e3b5d7f9a",
/// ]
/// ```
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Replacement floor version.
    pub floor_version: Option<String>,
    /// Replacement exemption list.
    pub exempt_digests: Option<Vec<String>>,
    /// Publisher policy override.
    pub publisher_policy: Option<PublisherPolicy>,
}

impl FileConfig {
    /// Parse configuration text read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::ConfigParse`] for malformed TOML or
    /// unknown keys.
    pub fn parse(contents: &str, path: &Utf8Path) -> Result<Self> {
        toml::from_str(contents).map_err(|err| ValidatorError::ConfigParse {
            path: path.to_owned(),
            reason: err.to_string(),
        })
    }

    /// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] when
    /// it exists and no path is given.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::ConfigRead`] when an explicit path cannot
    /// be read and [`ValidatorError::ConfigParse`] when the file is
    /// malformed.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => {
                let fallback = Utf8Path::new(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    log::debug!("no {DEFAULT_CONFIG_FILE} found; using defaults");
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let contents = std::fs::read_to_string(path).map_err(|source| ValidatorError::ConfigRead {
            path: path.to_owned(),
            source,
        })?;
        log::debug!("loaded configuration from {path}");
        Self::parse(&contents, path)
    }

    /// Apply the file's values over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::InvalidConfig`] when the floor is not a
    /// semantic version or a digest is not 64 hex characters.
    pub fn into_validation_config(self) -> Result<ValidationConfig> {
        let mut config = ValidationConfig::default();
        if let Some(floor) = self.floor_version {
            config.floor_version =
                Version::parse(floor.trim()).map_err(|err| ValidatorError::InvalidConfig {
                    key: "floor_version",
                    reason: format!("\"{floor}\": {err}"),
                })?;
        }
        if let Some(digests) = self.exempt_digests {
            let digests = digests
                .into_iter()
                .map(Sha256Digest::try_from)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|err| ValidatorError::InvalidConfig {
                    key: "exempt_digests",
                    reason: err.to_string(),
                })?;
            config.exemptions = ExemptionList::new(digests);
        }
        if let Some(policy) = self.publisher_policy {
            config.publisher_policy = policy;
        }
        Ok(config)
    }
}
