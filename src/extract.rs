//! Zip bundle extraction for downloaded competition data.
//!
//! Extracts `.zip` archives into the data directory with path traversal
//! protection to prevent zip-slip attacks. Extraction is all-or-nothing
//! per archive: a failure partway through is surfaced to the caller, never
//! swallowed.

use camino::Utf8Path;
use std::path::{Component, Path};

/// Trait for extracting downloaded archives, enabling test mocking.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the list of file names that were extracted.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry attempts to
    /// escape the destination directory.
    /// Returns [`ExtractionError::EmptyArchive`] if no files are found.
    /// Returns [`ExtractionError::InvalidArchive`] when the archive cannot
    /// be read as a zip file, and [`ExtractionError::Io`] on I/O failures.
    fn extract(
        &self,
        archive_path: &Utf8Path,
        dest_dir: &Utf8Path,
    ) -> Result<Vec<String>, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive is not a readable zip file.
    #[error("invalid archive {path}: {reason}")]
    InvalidArchive {
        /// Path of the unreadable archive.
        path: String,
        /// Description of the format error.
        reason: String,
    },

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no files.
    #[error("archive contains no files")]
    EmptyArchive,
}

/// Default extractor using the `zip` crate.
///
/// Validates each entry path before extraction to guard against path
/// traversal attacks (zip-slip).
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(
        &self,
        archive_path: &Utf8Path,
        dest_dir: &Utf8Path,
    ) -> Result<Vec<String>, ExtractionError> {
        let file = std::fs::File::open(archive_path.as_std_path())?;
        let mut archive =
            zip::ZipArchive::new(file).map_err(|e| ExtractionError::InvalidArchive {
                path: archive_path.to_string(),
                reason: e.to_string(),
            })?;
        let mut extracted = Vec::new();

        for index in 0..archive.len() {
            let mut entry =
                archive
                    .by_index(index)
                    .map_err(|e| ExtractionError::InvalidArchive {
                        path: archive_path.to_string(),
                        reason: e.to_string(),
                    })?;
            let entry_path = Path::new(entry.name()).to_path_buf();

            validate_entry_path(&entry_path)?;

            let dest_path = dest_dir.as_std_path().join(&entry_path);
            if entry.is_dir() {
                std::fs::create_dir_all(&dest_path)?;
                continue;
            }
            if let Some(parent) = dest_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = std::fs::File::create(&dest_path)?;
            std::io::copy(&mut entry, &mut out)?;

            if let Some(name) = entry_path.file_name() {
                extracted.push(name.to_string_lossy().into_owned());
            }
        }

        if extracted.is_empty() {
            return Err(ExtractionError::EmptyArchive);
        }

        Ok(extracted)
    }
}

/// Validate that a zip entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    if path.is_absolute() {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    for component in path.components() {
        if matches!(component, Component::ParentDir) {
            return Err(ExtractionError::PathTraversal {
                path: path.display().to_string(),
            });
        }
    }
    Ok(())
}
