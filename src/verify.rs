//! Directory verification against the dataset manifest.
//!
//! Produces a fresh report of which manifest files are present in the data
//! directory and how large they are. The report is a pure function of
//! filesystem state at call time; nothing is cached between checks.

use crate::manifest::DataManifest;
use camino::Utf8Path;

/// Presence and size of one manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStatus {
    /// The manifest filename.
    pub name: String,
    /// Whether the file exists directly under the data directory.
    pub present: bool,
    /// File size in bytes, when the file is present.
    pub size_bytes: Option<u64>,
}

/// The result of checking a data directory against the manifest.
///
/// Entries appear in manifest order.
///
/// # Examples
///
/// ```
/// use b2t::manifest::DataManifest;
/// use b2t::verify::verify_directory;
/// use camino::Utf8Path;
///
/// let manifest = DataManifest::new(["absent.bin"]);
/// let report = verify_directory(Utf8Path::new("/nonexistent"), &manifest);
/// assert!(!report.all_present());
/// assert_eq!(report.missing(), vec!["absent.bin"]);
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryReport {
    entries: Vec<ArtifactStatus>,
}

impl DirectoryReport {
    /// True iff every manifest entry is present.
    #[must_use]
    pub fn all_present(&self) -> bool {
        self.entries.iter().all(|entry| entry.present)
    }

    /// Manifest entries not present, in manifest order.
    #[must_use]
    pub fn missing(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| !entry.present)
            .map(|entry| entry.name.as_str())
            .collect()
    }

    /// Entries that are present, in manifest order.
    #[must_use]
    pub fn present(&self) -> Vec<&ArtifactStatus> {
        self.entries.iter().filter(|entry| entry.present).collect()
    }

    /// All per-entry statuses, in manifest order.
    #[must_use]
    pub fn entries(&self) -> &[ArtifactStatus] {
        &self.entries
    }
}

/// Check `dir` against the manifest.
///
/// A nonexistent directory is treated as "all missing", not an error:
/// metadata lookups simply fail for every entry. Only regular files count
/// as present; a directory with a manifest name does not satisfy the check.
#[must_use]
pub fn verify_directory(dir: &Utf8Path, manifest: &DataManifest) -> DirectoryReport {
    let entries = manifest
        .names()
        .map(|name| status_of(dir, name))
        .collect();
    DirectoryReport { entries }
}

fn status_of(dir: &Utf8Path, name: &str) -> ArtifactStatus {
    let path = dir.join(name);
    match std::fs::metadata(path.as_std_path()) {
        Ok(metadata) if metadata.is_file() => ArtifactStatus {
            name: name.to_owned(),
            present: true,
            size_bytes: Some(metadata.len()),
        },
        _ => ArtifactStatus {
            name: name.to_owned(),
            present: false,
            size_bytes: None,
        },
    }
}
