//! Error types for the b2t CLI.
//!
//! This module defines semantic error variants that provide actionable
//! guidance when acquisition or pipeline hand-off fails. Transient
//! conditions (rate limiting, incomplete delivery) are not errors; they are
//! modelled as [`crate::fetch::FetchOutcome`] values. Everything here is a
//! genuine failure that propagates to the caller.

use crate::extract::ExtractionError;
use crate::source::kaggle::DownloadError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur during data acquisition or pipeline hand-off.
#[derive(Debug, Error)]
pub enum B2tError {
    /// The credential file exists but could not be read or parsed.
    ///
    /// An absent credential file is not an error; it short-circuits the
    /// primary source with [`crate::fetch::FetchOutcome::AuthMissing`].
    #[error("credential file {path} could not be used: {reason}")]
    CredentialsUnreadable {
        /// Path to the unusable credential file.
        path: Utf8PathBuf,
        /// Description of the read or parse failure.
        reason: String,
    },

    /// The configuration file could not be parsed.
    #[error("invalid configuration at {path}: {reason}")]
    InvalidConfig {
        /// Path to the invalid configuration file.
        path: Utf8PathBuf,
        /// Description of the parse error.
        reason: String,
    },

    /// A required default path could not be resolved from the environment.
    #[error("configuration resolution failed: {reason}")]
    ConfigResolution {
        /// Description of what could not be resolved.
        reason: String,
    },

    /// A download request failed with a non-retryable error.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Extracting a downloaded archive failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The external pipeline executable was not found.
    #[error("pipeline executable not found at {path}")]
    PipelineNotFound {
        /// Path where the executable was expected.
        path: Utf8PathBuf,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`B2tError`].
pub type Result<T> = std::result::Result<T, B2tError>;
