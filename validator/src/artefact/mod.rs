//! Retrieval and integrity checks for published extension archives.
//!
//! # Sub-modules
//!
//! - [`fetch`] - HTTP retrieval trait and `ureq` implementation.
//! - [`digest`] - SHA-256 digest newtype and verification.
//! - [`archive`] - Read-only view over a `.foxe` zip archive.

pub mod archive;
pub mod digest;
pub mod fetch;
