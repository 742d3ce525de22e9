//! Digests grandfathered past the build-tool floor.
//!
//! Extensions published before the floor was introduced may declare an
//! older build tool. Their archive digests are listed here; a listed
//! extension that fails the floor check produces a warning rather than an
//! error. The list is kept honest in both directions: a digest that no
//! catalog entry uses is stale, and so is a digest whose extension already
//! meets the floor.

use crate::artefact::digest::Sha256Digest;
use crate::catalog::CatalogEntry;
use std::collections::BTreeSet;

/// Digests exempt from the build-tool floor when no configuration file
/// overrides them.
pub const DEFAULT_EXEMPT_DIGESTS: &[&str] = &[];

/// An immutable set of exempt archive digests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExemptionList {
    digests: BTreeSet<String>,
}

impl ExemptionList {
    /// Build a list from validated digests.
    ///
    /// # Examples
    ///
    /// ```
    /// use registry_validator::artefact::digest::Sha256Digest;
    /// use registry_validator::exemptions::ExemptionList;
    ///
    /// let digest = Sha256Digest::compute(b"legacy.foxe");
    /// let list = ExemptionList::new([digest.clone()]);
    /// assert!(list.contains(digest.as_str()));
    /// ```
    #[must_use]
    pub fn new(digests: impl IntoIterator<Item = Sha256Digest>) -> Self {
        Self {
            digests: digests
                .into_iter()
                .map(|digest| digest.as_str().to_owned())
                .collect(),
        }
    }

    /// The list compiled into the validator.
    #[must_use]
    pub fn embedded() -> Self {
        Self {
            digests: DEFAULT_EXEMPT_DIGESTS
                .iter()
                .map(|digest| (*digest).to_owned())
                .collect(),
        }
    }

    /// Return whether `digest` is exempt.
    #[must_use]
    pub fn contains(&self, digest: &str) -> bool {
        self.digests.contains(digest)
    }

    /// Iterate over the digests in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.digests.iter().map(String::as_str)
    }

    /// Number of exempt digests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// Return true when nothing is exempt.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    /// Digests that match no catalog entry's expected digest.
    #[must_use]
    pub fn stale_digests(&self, entries: &[CatalogEntry]) -> Vec<&str> {
        let published: BTreeSet<&str> = entries
            .iter()
            .map(|entry| entry.expected_digest.as_str())
            .collect();
        self.iter()
            .filter(|digest| !published.contains(digest))
            .collect()
    }
}
