//! Rendering of a [`RunReport`] for people and machines.
//!
//! Collection and emission are separate: the validation modules only build
//! diagnostics, and a [`DiagnosticReporter`] chosen on the command line
//! writes them out.

use crate::diagnostics::{CATALOG_FILE, Diagnostic, Severity};
use crate::error::{Result, ValidatorError};
use crate::validation::RunReport;
use serde::Serialize;
use std::io::Write;

/// Output formats selectable with `--format`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Console,
    /// GitHub Actions workflow commands.
    Github,
    /// A JSON document.
    Json,
}

/// Writes a finished run somewhere.
pub trait DiagnosticReporter {
    /// Emit every diagnostic of `report`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::WriteFailed`] when the output cannot be
    /// written.
    fn report(&mut self, report: &RunReport) -> Result<()>;
}

/// Build the reporter for `format` writing to `out`.
#[must_use]
pub fn reporter_for<'a>(
    format: OutputFormat,
    out: &'a mut dyn Write,
) -> Box<dyn DiagnosticReporter + 'a> {
    match format {
        OutputFormat::Console => Box::new(ConsoleReporter::new(out)),
        OutputFormat::Github => Box::new(GithubReporter::new(out)),
        OutputFormat::Json => Box::new(JsonReporter::new(out)),
    }
}

fn write_failed(source: std::io::Error) -> ValidatorError {
    ValidatorError::WriteFailed { source }
}

/// Plain text: one line per diagnostic and a closing summary.
///
/// ```text
/// error[acme.panel]: Digest mismatch for https://..., expected: ..., actual: ...
/// validated 12 extensions: 1 error, 0 warnings
/// ```
pub struct ConsoleReporter<W> {
    out: W,
}

impl<W: Write> ConsoleReporter<W> {
    /// Create a reporter writing to `out`.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> DiagnosticReporter for ConsoleReporter<W> {
    fn report(&mut self, report: &RunReport) -> Result<()> {
        for diagnostic in report.diagnostics() {
            writeln!(self.out, "{diagnostic}").map_err(write_failed)?;
        }
        writeln!(
            self.out,
            "validated {} {}: {} {}, {} {}",
            report.entries.len(),
            plural(report.entries.len(), "extension", "extensions"),
            report.error_count(),
            plural(report.error_count(), "error", "errors"),
            report.warning_count(),
            plural(report.warning_count(), "warning", "warnings"),
        )
        .map_err(write_failed)
    }
}

fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}

/// GitHub Actions workflow commands, which annotate the catalog file in a
/// pull request.
pub struct GithubReporter<W> {
    out: W,
}

impl<W: Write> GithubReporter<W> {
    /// Create a reporter writing to `out`.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> DiagnosticReporter for GithubReporter<W> {
    fn report(&mut self, report: &RunReport) -> Result<()> {
        for diagnostic in report.diagnostics() {
            writeln!(self.out, "{}", workflow_command(diagnostic)).map_err(write_failed)?;
        }
        Ok(())
    }
}

/// Format one diagnostic as `::error file=...,title=...::message`.
#[must_use]
pub fn workflow_command(diagnostic: &Diagnostic) -> String {
    let command = match diagnostic.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };
    let mut properties = format!("file={}", escape_property(diagnostic.file));
    if let Some(id) = &diagnostic.entry_id {
        properties.push_str(",title=");
        properties.push_str(&escape_property(id));
    }
    format!(
        "::{command} {properties}::{}",
        escape_data(&diagnostic.message)
    )
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

/// A single JSON document describing the run.
pub struct JsonReporter<W> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    /// Create a reporter writing to `out`.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

#[derive(Serialize)]
struct JsonRun<'a> {
    file: &'static str,
    passed: bool,
    entries: usize,
    errors: usize,
    warnings: usize,
    diagnostics: Vec<&'a Diagnostic>,
}

impl<W: Write> DiagnosticReporter for JsonReporter<W> {
    fn report(&mut self, report: &RunReport) -> Result<()> {
        let run = JsonRun {
            file: CATALOG_FILE,
            passed: report.passed(),
            entries: report.entries.len(),
            errors: report.error_count(),
            warnings: report.warning_count(),
            diagnostics: report.diagnostics().collect(),
        };
        serde_json::to_writer_pretty(&mut self.out, &run)
            .map_err(|err| write_failed(err.into()))?;
        writeln!(self.out).map_err(write_failed)
    }
}
