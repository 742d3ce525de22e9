//! Extension registry validator library.
//!
//! Checks every entry of the registry catalog against the `.foxe` archive
//! it points at: the archive is downloaded, its digest compared with the
//! catalog, its zip structure verified, its `package.json` reconciled with
//! the catalog identifier, its build-tool version checked against a floor,
//! and its documentation links probed. Findings are collected as
//! diagnostics and rendered by a reporter.
//!
//! # Modules
//!
//! - [`artefact`] - Downloading, hashing and opening extension archives
//! - [`build_tool`] - Build-tool floor check and npm range minimums
//! - [`catalog`] - Catalog file loading
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Validation settings and the TOML configuration file
//! - [`diagnostics`] - Validation findings
//! - [`doc_links`] - Readme and changelog link checks
//! - [`error`] - Process-level error types
//! - [`exemptions`] - Digests grandfathered past the build-tool floor
//! - [`manifest`] - `package.json` validation and canonical identifiers
//! - [`pipeline`] - The ordered checks run for one catalog entry
//! - [`report`] - Console, GitHub Actions and JSON reporters
//! - [`validation`] - Catalog-wide orchestration

pub mod artefact;
pub mod build_tool;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod doc_links;
pub mod error;
pub mod exemptions;
pub mod manifest;
pub mod pipeline;
pub mod report;
pub mod validation;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
