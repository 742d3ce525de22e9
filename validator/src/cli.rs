//! Command-line interface of the registry validator.
//!
//! Kept apart from the binary so that argument parsing can be tested
//! without spawning a process.

use crate::config::ValidationConfig;
use crate::diagnostics::CATALOG_FILE;
use crate::manifest::PublisherPolicy;
use crate::report::OutputFormat;
use camino::Utf8PathBuf;
use clap::Parser;
use log::LevelFilter;
use semver::Version;

/// Validate the extension registry catalog.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "registry-validator")]
#[command(version, about)]
#[command(long_about = concat!(
    "Validate the extension registry catalog.\n\n",
    "Every entry is downloaded and checked: the archive digest must match the ",
    "catalog, the archive must be intact, package.json must agree with the ",
    "catalog identifier and name an existing main script, the build tool must ",
    "meet the floor version, and the readme and changelog links must serve ",
    "plain text.\n\n",
    "Settings are read from registry-validator.toml in the current directory ",
    "when present, or from the file given with --config. Command-line flags ",
    "override the file.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Validate extensions.json in the current directory:\n",
    "    $ registry-validator\n\n",
    "  Annotate a pull request from GitHub Actions:\n",
    "    $ registry-validator --format github\n\n",
    "  Try a stricter floor:\n",
    "    $ registry-validator --floor-version 1.2.0 catalog/extensions.json",
))]
pub struct Cli {
    /// Path of the catalog to validate.
    #[arg(value_name = "CATALOG", default_value = CATALOG_FILE)]
    pub catalog: Utf8PathBuf,

    /// Configuration file [default: registry-validator.toml if present].
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// How diagnostics are written.
    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,

    /// Lowest build-tool version accepted without an exemption.
    #[arg(long, value_name = "VERSION")]
    pub floor_version: Option<Version>,

    /// Take the publisher from the package scope when package.json has none.
    #[arg(long)]
    pub allow_scope_publisher: bool,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Apply command-line overrides to `config`.
    #[must_use]
    pub fn apply_overrides(&self, mut config: ValidationConfig) -> ValidationConfig {
        if let Some(floor) = &self.floor_version {
            config.floor_version = floor.clone();
        }
        if self.allow_scope_publisher {
            config.publisher_policy = PublisherPolicy::ScopeFallback;
        }
        config
    }

    /// The log level requested by `-v` and `-q`. `RUST_LOG` still wins.
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
