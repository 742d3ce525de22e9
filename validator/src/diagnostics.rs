//! Validation findings.
//!
//! Checks never print. They return [`Diagnostic`] values which the
//! reporters in [`crate::report`] render for a particular host.

use serde::Serialize;
use std::fmt;

/// File tag attached to every diagnostic: the catalog they were raised
/// against.
pub const CATALOG_FILE: &str = "extensions.json";

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Recorded but does not fail the run.
    Warning,
    /// Fails the run.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The severity.
    pub severity: Severity,
    /// The catalog entry the finding belongs to, if any.
    pub entry_id: Option<String>,
    /// Human-readable description.
    pub message: String,
    /// The file the finding is attributed to.
    pub file: &'static str,
}

impl Diagnostic {
    /// Create an error-level diagnostic.
    ///
    /// # Examples
    ///
    /// ```
    /// use registry_validator::diagnostics::{Diagnostic, Severity};
    ///
    /// let diagnostic = Diagnostic::error(Some("acme.ext"), "Digest mismatch");
    /// assert_eq!(diagnostic.severity, Severity::Error);
    /// assert_eq!(diagnostic.file, "extensions.json");
    /// ```
    #[must_use]
    pub fn error(entry_id: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, entry_id, message)
    }

    /// Create a warning-level diagnostic.
    #[must_use]
    pub fn warning(entry_id: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, entry_id, message)
    }

    fn new(severity: Severity, entry_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            severity,
            entry_id: entry_id.map(str::to_owned),
            message: message.into(),
            file: CATALOG_FILE,
        }
    }

    /// Return true for error-level diagnostics.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entry_id {
            Some(id) => write!(f, "{}[{id}]: {}", self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_entry_id() {
        let diagnostic = Diagnostic::warning(Some("acme.ext"), "stored without compression");
        assert_eq!(
            diagnostic.to_string(),
            "warning[acme.ext]: stored without compression"
        );
    }

    #[test]
    fn display_without_entry_id() {
        let diagnostic = Diagnostic::error(None, "stale exemption entry");
        assert_eq!(diagnostic.to_string(), "error: stale exemption entry");
        assert!(diagnostic.is_error());
    }

    #[test]
    fn serialises_severity_in_lowercase() {
        let diagnostic = Diagnostic::warning(None, "note");
        let json = serde_json::to_value(&diagnostic).expect("serialisable");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["file"], "extensions.json");
    }
}
