//! Registry validator CLI entrypoint.
//!
//! Loads the catalog and configuration, validates every entry over HTTP and
//! writes the findings in the requested format. Exits non-zero when any
//! error was found or the run could not complete.

use clap::Parser;
use registry_validator::artefact::fetch::{ExtensionFetcher, HttpFetcher};
use registry_validator::catalog::load_catalog;
use registry_validator::cli::Cli;
use registry_validator::config::FileConfig;
use registry_validator::error::Result;
use registry_validator::report::{OutputFormat, reporter_for};
use registry_validator::validation::validate_catalog;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &HttpFetcher, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Validate the catalog and report. Returns whether the run passed.
fn run<'a>(
    cli: &Cli,
    fetcher: &dyn ExtensionFetcher,
    stdout: &'a mut dyn Write,
    stderr: &'a mut dyn Write,
) -> Result<bool> {
    let file_config = FileConfig::load(cli.config.as_deref())?;
    let config = cli.apply_overrides(file_config.into_validation_config()?);
    log::debug!(
        "floor {}, {} exempt digests, publisher policy {}",
        config.floor_version,
        config.exemptions.len(),
        config.publisher_policy
    );
    let entries = load_catalog(&cli.catalog)?;
    let report = validate_catalog(&entries, fetcher, &config);

    let out = match cli.format {
        OutputFormat::Console => stderr,
        OutputFormat::Github | OutputFormat::Json => stdout,
    };
    reporter_for(cli.format, out).report(&report)?;
    if !report.passed() {
        log::error!(
            "{} of {} extensions failed validation",
            report
                .entries
                .iter()
                .filter(|entry| !entry.outcome.is_passed())
                .count(),
            report.entries.len()
        );
    }
    Ok(report.passed())
}

fn exit_code_for_run_result(result: Result<bool>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

#[cfg(test)]
mod tests;
