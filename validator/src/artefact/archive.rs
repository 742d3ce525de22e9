//! Read-only view over a downloaded `.foxe` archive.
//!
//! `.foxe` files are zip archives. Opening one reads every file entry to the
//! end so that the zip reader checks each CRC-32; an archive with any
//! corrupt entry is rejected as a whole. Entry paths are indexed in their
//! normalised form (forward slashes, no `.` or `..` segments) and every
//! lookup normalises the requested path the same way.

use std::collections::BTreeMap;
use std::io::{self, Cursor, Read};
use zip::{CompressionMethod, ZipArchive};

/// Metadata for a single archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Normalised entry path.
    pub path: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Compression method recorded for the entry.
    pub compression: CompressionMethod,
}

/// Errors arising from archive inspection.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The bytes are not a readable zip archive or an entry failed its
    /// integrity check.
    #[error("extension is corrupted: {reason}")]
    Corrupted {
        /// Description of the failure reported by the zip reader.
        reason: String,
    },

    /// No non-directory entry exists at the requested path.
    #[error("{path} not found in archive")]
    NotFound {
        /// The requested path, as given by the caller.
        path: String,
    },

    /// The entry exists but is not valid UTF-8 text.
    #[error("{path} is not valid UTF-8 text: {source}")]
    NotText {
        /// The normalised entry path.
        path: String,
        /// The underlying read error.
        #[source]
        source: io::Error,
    },
}

/// An opened, integrity-checked archive.
pub struct ArchiveView {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    entries: BTreeMap<String, (usize, ArchiveEntry)>,
}

impl ArchiveView {
    /// Open `bytes` as a zip archive and check every entry.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Corrupted`] if the central directory cannot
    /// be read or any entry fails to decompress or fails its CRC-32 check.
    pub fn open(bytes: Vec<u8>) -> Result<Self, ArchiveError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(corrupted)?;
        let mut entries = BTreeMap::new();
        for index in 0..archive.len() {
            let mut file = archive.by_index(index).map_err(corrupted)?;
            let entry = ArchiveEntry {
                path: normalize_entry_path(file.name()).unwrap_or_else(|| file.name().to_owned()),
                is_dir: file.is_dir(),
                compression: file.compression(),
            };
            if !entry.is_dir {
                io::copy(&mut file, &mut io::sink()).map_err(|e| ArchiveError::Corrupted {
                    reason: format!("{}: {e}", entry.path),
                })?;
            }
            entries.insert(entry.path.clone(), (index, entry));
        }
        Ok(Self { archive, entries })
    }

    /// Iterate over every entry in path order.
    pub fn entries(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries.values().map(|(_, entry)| entry)
    }

    /// Return the non-directory entry at `path`, if any.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<&ArchiveEntry> {
        let normalized = normalize_entry_path(path)?;
        self.entries
            .get(&normalized)
            .map(|(_, entry)| entry)
            .filter(|entry| !entry.is_dir)
    }

    /// Read the non-directory entry at `path` as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotFound`] when no such file exists and
    /// [`ArchiveError::NotText`] when its contents are not UTF-8.
    pub fn read_text(&mut self, path: &str) -> Result<String, ArchiveError> {
        let (index, entry_path) = normalize_entry_path(path)
            .and_then(|normalized| self.entries.get(&normalized))
            .filter(|(_, entry)| !entry.is_dir)
            .map(|(index, entry)| (*index, entry.path.clone()))
            .ok_or_else(|| ArchiveError::NotFound {
                path: path.to_owned(),
            })?;
        let mut file = self.archive.by_index(index).map_err(corrupted)?;
        let mut text = String::new();
        file.read_to_string(&mut text)
            .map_err(|source| ArchiveError::NotText {
                path: entry_path,
                source,
            })?;
        Ok(text)
    }

    /// Paths of non-directory entries stored with a method other than
    /// Deflate.
    #[must_use]
    pub fn uncompressed_files(&self) -> Vec<&str> {
        self.entries()
            .filter(|entry| !entry.is_dir && entry.compression != CompressionMethod::Deflated)
            .map(|entry| entry.path.as_str())
            .collect()
    }
}

/// Normalise an archive path for lookup.
///
/// Backslashes become forward slashes, empty and `.` segments are dropped
/// and `..` removes the preceding segment. Returns `None` when the path
/// is empty or climbs above the archive root.
///
/// # Examples
///
/// ```
/// use registry_validator::artefact::archive::normalize_entry_path;
///
/// assert_eq!(normalize_entry_path("./dist/extension.js").as_deref(), Some("dist/extension.js"));
/// assert_eq!(normalize_entry_path("dist\\..\\index.js").as_deref(), Some("index.js"));
/// assert_eq!(normalize_entry_path("../escape.js"), None);
/// ```
#[must_use]
pub fn normalize_entry_path(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

fn corrupted(err: zip::result::ZipError) -> ArchiveError {
    ArchiveError::Corrupted {
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ExtensionArchiveBuilder;
    use rstest::rstest;

    fn sample_archive() -> ArchiveView {
        let bytes = ExtensionArchiveBuilder::new()
            .directory("dist/")
            .file("package.json", r#"{"name":"demo"}"#)
            .file("dist/extension.js", "module.exports = {};")
            .stored_file("README.md", "# Demo")
            .build();
        ArchiveView::open(bytes).expect("valid archive")
    }

    #[test]
    fn lists_entries_with_metadata() {
        let view = sample_archive();
        let entries: Vec<_> = view.entries().collect();
        assert_eq!(entries.len(), 4);
        let dir = view.entries().find(|e| e.path == "dist").expect("dist entry");
        assert!(dir.is_dir);
        let readme = view.file("README.md").expect("readme entry");
        assert_eq!(readme.compression, CompressionMethod::Stored);
    }

    #[rstest]
    #[case::plain("dist/extension.js")]
    #[case::dot_prefix("./dist/extension.js")]
    #[case::backslash("dist\\extension.js")]
    #[case::redundant("dist/./lib/../extension.js")]
    fn reads_text_through_normalised_paths(#[case] path: &str) {
        let mut view = sample_archive();
        let text = view.read_text(path).expect("entry readable");
        assert_eq!(text, "module.exports = {};");
    }

    #[test]
    fn missing_entry_is_not_found() {
        let mut view = sample_archive();
        let err = view.read_text("dist/missing.js").expect_err("no such entry");
        assert!(matches!(err, ArchiveError::NotFound { .. }));
    }

    #[test]
    fn directories_are_not_readable_as_text() {
        let mut view = sample_archive();
        assert!(view.file("dist").is_none());
        assert!(matches!(
            view.read_text("dist/"),
            Err(ArchiveError::NotFound { .. })
        ));
    }

    #[test]
    fn reports_files_stored_without_compression() {
        let view = sample_archive();
        assert_eq!(view.uncompressed_files(), vec!["README.md"]);
    }

    #[test]
    fn rejects_bytes_that_are_not_an_archive() {
        let err = ArchiveView::open(b"not a zip".to_vec())
            .err()
            .expect("garbage must not open");
        assert!(err.to_string().starts_with("extension is corrupted"));
    }

    #[test]
    fn rejects_entry_failing_crc_check() {
        let mut bytes = ExtensionArchiveBuilder::new()
            .stored_file("package.json", r#"{"name":"demo"}"#)
            .stored_file("index.js", "console.log('intact');")
            .build();
        let needle = b"intact";
        let offset = bytes
            .windows(needle.len())
            .position(|window| window == needle)
            .expect("stored payload present");
        if let Some(byte) = bytes.get_mut(offset) {
            *byte = b'I';
        }
        let err = ArchiveView::open(bytes).err().expect("corrupt entry");
        assert!(matches!(err, ArchiveError::Corrupted { .. }));
    }

    #[rstest]
    #[case::empty("")]
    #[case::only_dots("./.")]
    #[case::escapes("a/../../b")]
    fn unresolvable_paths_normalise_to_none(#[case] path: &str) {
        assert_eq!(normalize_entry_path(path), None);
    }
}
