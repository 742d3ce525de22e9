//! SHA-256 digest newtype for artefact verification.
//!
//! Catalog entries pin each `.foxe` archive by the hex-encoded SHA-256 of
//! its exact bytes. The digest is recomputed after download and compared
//! case-sensitively against the pinned value.

use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Expected length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// A validated hex-encoded SHA-256 digest string.
///
/// # Examples
///
/// ```
/// use registry_validator::artefact::digest::Sha256Digest;
///
/// let hex = "a".repeat(64);
/// let digest = Sha256Digest::try_from(hex.as_str()).expect("valid digest");
/// assert_eq!(digest.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sha256Digest(String);

/// Rejection reason for a malformed digest string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid SHA-256 digest \"{value}\": {reason}")]
pub struct InvalidDigest {
    /// The rejected string.
    pub value: String,
    /// Description of the validation failure.
    pub reason: String,
}

/// The downloaded bytes do not hash to the pinned digest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected: {expected}, actual: {actual}")]
pub struct DigestMismatch {
    /// The digest recorded in the catalog.
    pub expected: String,
    /// The digest computed over the downloaded bytes.
    pub actual: Sha256Digest,
}

impl Sha256Digest {
    /// Hash `bytes` and return the lowercase hex digest.
    ///
    /// # Examples
    ///
    /// ```
    /// use registry_validator::artefact::digest::Sha256Digest;
    ///
    /// let digest = Sha256Digest::compute(b"");
    /// assert_eq!(
    ///     digest.as_str(),
    ///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    /// );
    /// ```
    #[must_use]
    pub fn compute(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Sha256Digest {
    type Error = InvalidDigest;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        validate_sha256(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Sha256Digest {
    type Error = InvalidDigest;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_sha256(&value)?;
        Ok(Self(value))
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hash `bytes` and compare the result with the catalog's `expected` digest.
///
/// The comparison is exact: an uppercase rendering of the right digest is
/// still a mismatch.
///
/// # Errors
///
/// Returns [`DigestMismatch`] carrying both digests when they differ.
pub fn verify_digest(bytes: &[u8], expected: &str) -> Result<Sha256Digest, DigestMismatch> {
    let actual = Sha256Digest::compute(bytes);
    if actual.as_str() == expected {
        Ok(actual)
    } else {
        Err(DigestMismatch {
            expected: expected.to_owned(),
            actual,
        })
    }
}

/// Validate that `value` is a well-formed hex-encoded SHA-256 digest.
fn validate_sha256(value: &str) -> Result<(), InvalidDigest> {
    let reject = |reason: String| InvalidDigest {
        value: value.to_owned(),
        reason,
    };
    if value.len() != DIGEST_HEX_LEN {
        return Err(reject(format!(
            "expected {DIGEST_HEX_LEN} hex characters, got {}",
            value.len()
        )));
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(reject(format!("non-hex character '{bad}'")));
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(reject("digest must be lowercase".to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn compute_matches_known_vector() {
        let digest = Sha256Digest::compute(b"abc");
        assert_eq!(
            digest.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn verify_accepts_matching_bytes() {
        let expected = Sha256Digest::compute(b"payload");
        let actual = verify_digest(b"payload", expected.as_str()).expect("digest matches");
        assert_eq!(actual, expected);
    }

    #[test]
    fn single_byte_change_never_matches() {
        let original = b"extension archive bytes".to_vec();
        let expected = Sha256Digest::compute(&original);
        for index in 0..original.len() {
            let mut tampered = original.clone();
            if let Some(byte) = tampered.get_mut(index) {
                *byte ^= 0x01;
            }
            assert!(
                verify_digest(&tampered, expected.as_str()).is_err(),
                "flipping byte {index} must change the digest"
            );
        }
    }

    #[test]
    fn mismatch_reports_both_digests() {
        let err = verify_digest(b"payload", "abc123").expect_err("digest differs");
        assert_eq!(err.expected, "abc123");
        assert_eq!(err.actual, Sha256Digest::compute(b"payload"));
        let msg = err.to_string();
        assert!(msg.contains("expected: abc123"));
        assert!(msg.contains(err.actual.as_str()));
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let upper = Sha256Digest::compute(b"payload").as_str().to_ascii_uppercase();
        assert!(verify_digest(b"payload", &upper).is_err());
    }

    #[test]
    fn accepts_valid_sixty_four_char_hex() {
        assert!(Sha256Digest::try_from("a".repeat(64)).is_ok());
    }

    #[rstest]
    #[case::too_short("abcdef".to_owned())]
    #[case::too_long("a".repeat(65))]
    #[case::non_hex(format!("{}g", "a".repeat(63)))]
    #[case::uppercase("A".repeat(64))]
    fn rejects_malformed_digests(#[case] value: String) {
        assert!(Sha256Digest::try_from(value).is_err());
    }
}
