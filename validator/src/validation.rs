//! Catalog-wide validation.
//!
//! Runs the per-entry pipeline for every catalog entry in order and
//! cross-checks the exemption list against the catalog. A failing entry
//! never stops the run.

use crate::artefact::fetch::ExtensionFetcher;
use crate::catalog::CatalogEntry;
use crate::config::ValidationConfig;
use crate::diagnostics::{Diagnostic, Severity};
use crate::pipeline::{EntryReport, validate_entry};
use log::info;

/// Everything one validation run found.
#[derive(Debug)]
pub struct RunReport {
    /// Diagnostics not tied to a single entry.
    pub catalog_diagnostics: Vec<Diagnostic>,
    /// Per-entry results in catalog order.
    pub entries: Vec<EntryReport>,
}

impl RunReport {
    /// All diagnostics: catalog-level first, then each entry's in order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.catalog_diagnostics
            .iter()
            .chain(self.entries.iter().flat_map(|entry| &entry.diagnostics))
    }

    /// Return true when no error was raised.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.error_count() == 0
    }

    /// Number of error diagnostics.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Number of warning diagnostics.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics()
            .filter(|diagnostic| diagnostic.severity == severity)
            .count()
    }
}

/// Validate every entry of `entries`.
///
/// Exempt digests that no entry publishes are reported first as
/// catalog-level errors.
#[must_use]
pub fn validate_catalog(
    entries: &[CatalogEntry],
    fetcher: &dyn ExtensionFetcher,
    config: &ValidationConfig,
) -> RunReport {
    let catalog_diagnostics = config
        .exemptions
        .stale_digests(entries)
        .into_iter()
        .map(|digest| Diagnostic::error(None, format!("stale exemption entry: {digest}")))
        .collect();

    let entries = entries
        .iter()
        .map(|entry| {
            info!("Validating {}...", entry.id);
            validate_entry(entry, fetcher, config)
        })
        .collect();

    RunReport {
        catalog_diagnostics,
        entries,
    }
}
