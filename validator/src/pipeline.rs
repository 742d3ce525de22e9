//! Per-entry validation pipeline.
//!
//! One catalog entry is checked in a fixed order: download, digest,
//! archive integrity, manifest, build-tool floor and finally the two
//! documentation links. The first five steps short-circuit: once one of
//! them fails nothing after it can be trusted. The documentation links are
//! checked independently of each other.

use crate::artefact::archive::{ArchiveError, ArchiveView};
use crate::artefact::digest::{DigestMismatch, verify_digest};
use crate::artefact::fetch::{ExtensionFetcher, FetchError};
use crate::build_tool::{BuildToolError, FloorVerdict, StaleExemption, check_build_tool};
use crate::catalog::CatalogEntry;
use crate::config::ValidationConfig;
use crate::diagnostics::Diagnostic;
use crate::doc_links::{DocumentError, DocumentKind, verify_document_link};
use crate::manifest::{ManifestError, validate_manifest};
use log::debug;
use std::fmt;

/// The checks of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    /// Downloading the `.foxe` archive.
    Fetch,
    /// Comparing the archive digest with the catalog.
    Digest,
    /// Opening the archive and checking entry integrity.
    Archive,
    /// Validating `package.json`.
    Manifest,
    /// Checking the build-tool floor.
    BuildTool,
    /// Checking readme and changelog links.
    Documentation,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetch => "fetch",
            Self::Digest => "digest",
            Self::Archive => "archive",
            Self::Manifest => "manifest",
            Self::BuildTool => "build tool",
            Self::Documentation => "documentation",
        };
        write!(f, "{name}")
    }
}

/// A classified failure of one pipeline step.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// The archive could not be downloaded.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The archive bytes do not match the catalog digest.
    #[error("Digest mismatch for {url}, {mismatch}")]
    Digest {
        /// The archive URL.
        url: String,
        /// Expected and actual digests.
        mismatch: DigestMismatch,
    },

    /// The archive is unreadable or corrupt.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// `package.json` is missing, malformed or inconsistent.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The build-tool declaration fails the floor.
    #[error(transparent)]
    BuildTool(#[from] BuildToolError),

    /// The digest is exempt although the floor is met.
    #[error(transparent)]
    StaleExemption(#[from] StaleExemption),

    /// A documentation link is unusable.
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// How validation of one entry ended.
#[derive(Debug)]
pub enum EntryOutcome {
    /// Every check passed; warnings may still have been raised.
    Passed,
    /// The first check that raised an error.
    FailedAt {
        /// The failing step.
        step: Step,
        /// What went wrong.
        error: StepError,
    },
}

impl EntryOutcome {
    /// Return true for [`EntryOutcome::Passed`].
    #[must_use]
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Result of validating one catalog entry.
#[derive(Debug)]
pub struct EntryReport {
    /// The catalog identifier.
    pub id: String,
    /// How validation ended.
    pub outcome: EntryOutcome,
    /// Every finding, in the order raised.
    pub diagnostics: Vec<Diagnostic>,
}

/// A failure that stops the remaining checks for an entry.
struct Halt {
    step: Step,
    error: StepError,
}

trait AtStep<T> {
    fn at(self, step: Step) -> Result<T, Halt>;
}

impl<T, E: Into<StepError>> AtStep<T> for Result<T, E> {
    fn at(self, step: Step) -> Result<T, Halt> {
        self.map_err(|error| Halt {
            step,
            error: error.into(),
        })
    }
}

/// Accumulates findings while one entry is checked.
struct EntryRun<'a> {
    entry: &'a CatalogEntry,
    diagnostics: Vec<Diagnostic>,
    failure: Option<(Step, StepError)>,
}

impl<'a> EntryRun<'a> {
    fn new(entry: &'a CatalogEntry) -> Self {
        Self {
            entry,
            diagnostics: Vec::new(),
            failure: None,
        }
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::warning(Some(self.entry.id.as_str()), message));
    }

    fn fail(&mut self, step: Step, error: StepError) {
        self.diagnostics
            .push(Diagnostic::error(Some(self.entry.id.as_str()), error.to_string()));
        if self.failure.is_none() {
            self.failure = Some((step, error));
        }
    }

    fn finish(self) -> EntryReport {
        let outcome = match self.failure {
            None => EntryOutcome::Passed,
            Some((step, error)) => EntryOutcome::FailedAt { step, error },
        };
        EntryReport {
            id: self.entry.id.clone(),
            outcome,
            diagnostics: self.diagnostics,
        }
    }
}

/// Validate one catalog entry.
///
/// Failures are recorded in the returned report; nothing here aborts the
/// caller.
#[must_use]
pub fn validate_entry(
    entry: &CatalogEntry,
    fetcher: &dyn ExtensionFetcher,
    config: &ValidationConfig,
) -> EntryReport {
    let mut run = EntryRun::new(entry);
    if let Err(Halt { step, error }) = check_artifact(&mut run, fetcher, config) {
        debug!("{}: stopped at {step}", entry.id);
        run.fail(step, error);
        return run.finish();
    }
    for kind in DocumentKind::ALL {
        let url = match kind {
            DocumentKind::Readme => &entry.readme_url,
            DocumentKind::Changelog => &entry.changelog_url,
        };
        if let Err(error) = verify_document_link(fetcher, url, kind) {
            run.fail(Step::Documentation, error.into());
        }
    }
    run.finish()
}

/// Run the short-circuiting steps: fetch through build-tool floor.
fn check_artifact(
    run: &mut EntryRun<'_>,
    fetcher: &dyn ExtensionFetcher,
    config: &ValidationConfig,
) -> Result<(), Halt> {
    let entry = run.entry;
    let bytes = fetcher.fetch_artifact(&entry.artifact_url).at(Step::Fetch)?;

    let digest = verify_digest(&bytes, &entry.expected_digest)
        .map_err(|mismatch| StepError::Digest {
            url: entry.artifact_url.clone(),
            mismatch,
        })
        .at(Step::Digest)?;

    let mut archive = ArchiveView::open(bytes).at(Step::Archive)?;
    let uncompressed = archive.uncompressed_files();
    if !uncompressed.is_empty() {
        let listing = uncompressed.join(", ");
        run.warn(format!(
            "the following files are stored without compression: {listing}"
        ));
    }

    let manifest = validate_manifest(&mut archive, &entry.id, config.publisher_policy)
        .at(Step::Manifest)?;
    debug!("{}: manifest valid, main is {}", entry.id, manifest.main);

    let verdict = check_build_tool(
        &manifest,
        digest.as_str(),
        &config.floor_version,
        &config.exemptions,
    )
    .at(Step::BuildTool)?;
    let summary = verdict.to_string();
    match verdict {
        FloorVerdict::Satisfied { .. } => debug!("{}: {summary}", entry.id),
        FloorVerdict::Grandfathered { .. } => run.warn(summary),
        FloorVerdict::ExemptionNotNeeded(stale) => run.fail(Step::BuildTool, stale.into()),
    }
    Ok(())
}
