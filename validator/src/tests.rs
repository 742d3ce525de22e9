//! Unit tests for the registry validator entrypoint.

use super::*;
use camino::{Utf8Path, Utf8PathBuf};
use registry_validator::catalog::CatalogEntry;
use registry_validator::error::ValidatorError;
use registry_validator::test_utils::{
    StubFetcher, catalog_entry, extension_archive, package_json, sha256_hex,
};
use rstest::rstest;

struct Workspace {
    _dir: tempfile::TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
        Self { _dir: dir, root }
    }

    fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.root.join(name);
        std::fs::write(&path, contents).expect("write fixture file");
        path
    }

    fn write_catalog(&self, entries: &[CatalogEntry]) -> Utf8PathBuf {
        let json: Vec<_> = entries
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "id": entry.id,
                    "name": entry.id,
                    "foxe": entry.artifact_url,
                    "sha256sum": entry.expected_digest,
                    "readme": entry.readme_url,
                    "changelog": entry.changelog_url,
                })
            })
            .collect();
        self.write("extensions.json", &serde_json::Value::from(json).to_string())
    }

    fn empty_config(&self) -> Utf8PathBuf {
        self.write("registry-validator.toml", "")
    }
}

fn cli_for(catalog: &Utf8Path, config: &Utf8Path, format: OutputFormat) -> Cli {
    Cli::parse_from([
        "registry-validator",
        catalog.as_str(),
        "--config",
        config.as_str(),
        "--format",
        match format {
            OutputFormat::Console => "console",
            OutputFormat::Github => "github",
            OutputFormat::Json => "json",
        },
    ])
}

fn published(range: &str) -> (CatalogEntry, StubFetcher) {
    let archive = extension_archive(&package_json("panel", Some("acme"), Some(range)));
    let entry = catalog_entry("acme.panel", &sha256_hex(&archive));
    let fetcher = StubFetcher::new().serve_entry(&entry, archive);
    (entry, fetcher)
}

fn run_captured(cli: &Cli, fetcher: &StubFetcher) -> (Result<bool>, String, String) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let result = run(cli, fetcher, &mut stdout, &mut stderr);
    (
        result,
        String::from_utf8(stdout).expect("stdout was not UTF-8"),
        String::from_utf8(stderr).expect("stderr was not UTF-8"),
    )
}

#[test]
fn exit_code_for_run_result_returns_zero_on_pass() {
    let mut stderr = Vec::new();
    assert_eq!(exit_code_for_run_result(Ok(true), &mut stderr), 0);
    assert!(stderr.is_empty());
}

#[test]
fn exit_code_for_run_result_returns_one_on_failed_validation() {
    let mut stderr = Vec::new();
    assert_eq!(exit_code_for_run_result(Ok(false), &mut stderr), 1);
    assert!(stderr.is_empty());
}

#[test]
fn exit_code_for_run_result_prints_error_and_returns_one() {
    let err = ValidatorError::InvalidConfig {
        key: "floor_version",
        reason: "\"one\": unexpected character".to_owned(),
    };
    let mut stderr = Vec::new();
    assert_eq!(exit_code_for_run_result(Err(err), &mut stderr), 1);
    let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
    assert!(stderr_text.contains("invalid configuration value for floor_version"));
}

#[test]
fn passing_catalog_reports_to_stderr_in_console_mode() {
    let workspace = Workspace::new();
    let (entry, fetcher) = published("^1.0.0");
    let cli = cli_for(
        &workspace.write_catalog(&[entry]),
        &workspace.empty_config(),
        OutputFormat::Console,
    );

    let (result, stdout, stderr) = run_captured(&cli, &fetcher);

    assert!(result.expect("run completes"));
    assert!(stdout.is_empty());
    assert_eq!(stderr, "validated 1 extension: 0 errors, 0 warnings\n");
}

#[rstest]
#[case::github(OutputFormat::Github, "::error file=extensions.json,title=acme.panel::must upgrade")]
#[case::json(OutputFormat::Json, "\"passed\": false")]
fn machine_formats_write_to_stdout(#[case] format: OutputFormat, #[case] expected: &str) {
    let workspace = Workspace::new();
    let (entry, fetcher) = published("^0.9.0");
    let cli = cli_for(
        &workspace.write_catalog(&[entry]),
        &workspace.empty_config(),
        format,
    );

    let (result, stdout, stderr) = run_captured(&cli, &fetcher);

    assert!(!result.expect("run completes"));
    assert!(stdout.contains(expected), "stdout: {stdout}");
    assert!(stderr.is_empty());
}

#[test]
fn configured_exemption_turns_failure_into_warning() {
    let workspace = Workspace::new();
    let (entry, fetcher) = published("^0.9.0");
    let config = workspace.write(
        "exemptions.toml",
        &format!("exempt_digests = [\"{}\"]", entry.expected_digest),
    );
    let cli = cli_for(&workspace.write_catalog(&[entry]), &config, OutputFormat::Console);

    let (result, _, stderr) = run_captured(&cli, &fetcher);

    assert!(result.expect("run completes"));
    assert!(stderr.starts_with("warning[acme.panel]: "), "stderr: {stderr}");
}

#[test]
fn missing_catalog_is_a_run_error() {
    let workspace = Workspace::new();
    let cli = cli_for(
        &workspace.root.join("absent.json"),
        &workspace.empty_config(),
        OutputFormat::Console,
    );

    let (result, _, _) = run_captured(&cli, &StubFetcher::new());

    assert!(matches!(result, Err(ValidatorError::CatalogRead { .. })));
}

#[test]
fn invalid_configuration_stops_before_fetching() {
    let workspace = Workspace::new();
    let (entry, fetcher) = published("^1.0.0");
    let config = workspace.write("bad.toml", "floor_version = \"latest\"");
    let cli = cli_for(&workspace.write_catalog(&[entry]), &config, OutputFormat::Console);

    let (result, _, _) = run_captured(&cli, &fetcher);

    assert!(matches!(result, Err(ValidatorError::InvalidConfig { .. })));
    assert!(fetcher.requests().is_empty());
}
