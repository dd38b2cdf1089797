//! Data acquisition: retry loop, backoff schedule, and source policy.
//!
//! Implements the resilient fetch-and-verify procedure: try the primary
//! source with bounded exponential-backoff retry on rate limiting, fall
//! back to the secondary archival source, and end with manual-download
//! instructions when neither source can satisfy the manifest. The
//! filesystem is the only durable store; the directory is re-verified
//! after every attempt rather than trusting any reported success.

use crate::config::FetchConfig;
use crate::error::Result;
use crate::extract::{ArchiveExtractor, ZipExtractor};
use crate::output::{
    ManualInstructions, credential_instructions, partial_state_summary, present_file_listing,
    write_stderr_line,
};
use crate::source::dryad::check_secondary;
use crate::source::kaggle::{CompetitionClient, KaggleClient, load_credentials};
use crate::verify::verify_directory;
use camino::{Utf8Path, Utf8PathBuf};
use std::io::Write;
use std::time::Duration;

/// Maximum number of download attempts against the primary source.
pub const MAX_RETRIES: u32 = 5;

/// Cap on the exponential backoff delay.
const MAX_BACKOFF_SECS: u64 = 60;

/// Terminal result of an acquisition run.
///
/// Only [`AllPresent`](Self::AllPresent) satisfies the manifest; every
/// other variant is a classified failure that the caller escalates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Every manifest file is present in the data directory.
    AllPresent,
    /// The source delivered without error, but files are still missing.
    PartialOrMissing,
    /// The primary-source credential file is absent; no network call was
    /// made.
    AuthMissing,
    /// Every attempt was rejected with a rate-limit response.
    RateLimitExhausted,
    /// The secondary source has no programmatic download path.
    SourceUnavailable,
}

impl FetchOutcome {
    /// True iff the manifest is satisfied.
    #[must_use]
    pub fn is_satisfied(self) -> bool {
        self == Self::AllPresent
    }
}

/// How a single retry-loop iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The download completed and the manifest was satisfied.
    Success,
    /// The download completed but files are still missing.
    Incomplete,
    /// The source rejected the request with a rate-limit response.
    RateLimited,
}

/// Record of one retry-loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchAttempt {
    /// 1-indexed attempt number.
    pub attempt: u32,
    /// Seconds slept before this attempt (0 for the first).
    pub wait_seconds: u64,
    /// How the attempt ended.
    pub outcome: AttemptOutcome,
}

/// Result of the primary-source fetch, with the per-attempt record.
#[derive(Debug)]
pub struct PrimaryReport {
    /// Terminal outcome of the primary fetch.
    pub outcome: FetchOutcome,
    /// One record per retry-loop iteration, in order.
    pub attempts: Vec<FetchAttempt>,
}

impl PrimaryReport {
    /// Report for a run that short-circuited on missing credentials.
    #[must_use]
    pub fn auth_missing() -> Self {
        Self {
            outcome: FetchOutcome::AuthMissing,
            attempts: Vec::new(),
        }
    }
}

/// Backoff delay before the given 1-indexed attempt.
///
/// The first attempt starts immediately; attempt `k` (k >= 2) waits
/// `min(2^(k-1), 60)` seconds.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use b2t::fetch::backoff_before;
///
/// assert_eq!(backoff_before(1), None);
/// assert_eq!(backoff_before(2), Some(Duration::from_secs(2)));
/// assert_eq!(backoff_before(5), Some(Duration::from_secs(16)));
/// assert_eq!(backoff_before(8), Some(Duration::from_secs(60)));
/// ```
#[must_use]
pub fn backoff_before(attempt: u32) -> Option<Duration> {
    if attempt <= 1 {
        return None;
    }
    let exponent = attempt - 1;
    let secs = if exponent >= 6 {
        MAX_BACKOFF_SECS
    } else {
        (1_u64 << exponent).min(MAX_BACKOFF_SECS)
    };
    Some(Duration::from_secs(secs))
}

/// Abstraction over blocking sleeps, so tests can record the backoff
/// schedule instead of waiting it out.
pub trait Sleeper {
    /// Block the current thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Sleeps on the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Run the overall acquisition policy with production implementations.
///
/// # Errors
///
/// Propagates non-rate-limit download errors, extraction failures, and
/// I/O errors. Transient and classified conditions are returned as
/// [`FetchOutcome`] values, not errors.
pub fn acquire(config: &FetchConfig, stderr: &mut dyn Write) -> Result<FetchOutcome> {
    acquire_with(config, &KaggleClient, &ZipExtractor, &ThreadSleeper, stderr)
}

/// Testable acquisition policy with injected dependencies.
///
/// Check first (a satisfied manifest performs zero network calls), then
/// the primary source, then the secondary source, and finally print
/// manual-download instructions when nothing satisfied the manifest.
///
/// # Errors
///
/// See [`acquire`].
pub fn acquire_with(
    config: &FetchConfig,
    client: &dyn CompetitionClient,
    extractor: &dyn ArchiveExtractor,
    sleeper: &dyn Sleeper,
    stderr: &mut dyn Write,
) -> Result<FetchOutcome> {
    let report = verify_directory(&config.data_dir, &config.manifest);
    if report.all_present() {
        if !config.quiet {
            write_stderr_line(stderr, "All data files already exist:");
            for line in present_file_listing(&report) {
                write_stderr_line(stderr, line);
            }
        }
        return Ok(FetchOutcome::AllPresent);
    }

    if !config.quiet {
        if !report.present().is_empty() {
            for line in partial_state_summary(&report, &config.manifest) {
                write_stderr_line(stderr, line);
            }
        }
        write_stderr_line(stderr, format!("Data directory: {}", config.data_dir));
        write_stderr_line(stderr, format!("Required files: {}", config.manifest));
        write_stderr_line(stderr, "Trying the Kaggle API...");
    }

    let primary = fetch_primary_with(config, client, extractor, sleeper, stderr)?;
    if primary.outcome.is_satisfied() {
        return Ok(FetchOutcome::AllPresent);
    }

    if !config.quiet {
        write_stderr_line(stderr, "Trying the Dryad archive...");
    }
    let _ = check_secondary(&config.secondary_url, config.quiet, stderr);

    write_stderr_line(stderr, "");
    let instructions = ManualInstructions {
        data_dir: &config.data_dir,
        manifest: &config.manifest,
        competition: &config.competition,
        secondary_url: &config.secondary_url,
    };
    write_stderr_line(stderr, instructions.display_text());
    Ok(primary.outcome)
}

/// Fetch from the primary source with bounded retry, with injected
/// dependencies.
///
/// The credential precondition is checked before any network call: an
/// absent credential file short-circuits with
/// [`FetchOutcome::AuthMissing`]. Only rate-limit errors consume retry
/// attempts; an incomplete-but-successful delivery returns after a single
/// attempt, and any other error propagates immediately.
///
/// # Errors
///
/// Returns unreadable-credential, extraction, I/O, and non-rate-limit
/// download errors.
pub fn fetch_primary_with(
    config: &FetchConfig,
    client: &dyn CompetitionClient,
    extractor: &dyn ArchiveExtractor,
    sleeper: &dyn Sleeper,
    stderr: &mut dyn Write,
) -> Result<PrimaryReport> {
    if !config.credentials_path.is_file() {
        write_stderr_line(stderr, credential_instructions(&config.credentials_path));
        return Ok(PrimaryReport::auth_missing());
    }
    let Some(credentials) = load_credentials(&config.credentials_path)? else {
        // Deleted between the existence check and the read; treat as absent.
        write_stderr_line(stderr, credential_instructions(&config.credentials_path));
        return Ok(PrimaryReport::auth_missing());
    };
    std::fs::create_dir_all(config.data_dir.as_std_path())?;

    let mut attempts = Vec::new();
    for attempt in 1..=MAX_RETRIES {
        let wait_seconds = match backoff_before(attempt) {
            Some(delay) => {
                if !config.quiet {
                    write_stderr_line(
                        stderr,
                        format!(
                            "Waiting {} seconds before retry {attempt}/{MAX_RETRIES}...",
                            delay.as_secs()
                        ),
                    );
                }
                sleeper.sleep(delay);
                delay.as_secs()
            }
            None => 0,
        };

        match client.download_all(&credentials, &config.competition, &config.data_dir) {
            Ok(()) => {
                extract_archives(&config.data_dir, extractor, config.quiet, stderr)?;
                let report = verify_directory(&config.data_dir, &config.manifest);
                if report.all_present() {
                    attempts.push(FetchAttempt {
                        attempt,
                        wait_seconds,
                        outcome: AttemptOutcome::Success,
                    });
                    if !config.quiet {
                        write_stderr_line(stderr, "All data files downloaded successfully.");
                    }
                    return Ok(PrimaryReport {
                        outcome: FetchOutcome::AllPresent,
                        attempts,
                    });
                }

                attempts.push(FetchAttempt {
                    attempt,
                    wait_seconds,
                    outcome: AttemptOutcome::Incomplete,
                });
                write_stderr_line(stderr, "Files in the data directory:");
                for line in present_file_listing(&report) {
                    write_stderr_line(stderr, line);
                }
                write_stderr_line(stderr, "Some required files are missing after download.");
                return Ok(PrimaryReport {
                    outcome: FetchOutcome::PartialOrMissing,
                    attempts,
                });
            }
            Err(error) if error.is_rate_limited() => {
                attempts.push(FetchAttempt {
                    attempt,
                    wait_seconds,
                    outcome: AttemptOutcome::RateLimited,
                });
                log::debug!("rate limited on attempt {attempt}: {error}");
                if attempt < MAX_RETRIES {
                    if !config.quiet {
                        write_stderr_line(stderr, "Rate limited; retrying...");
                    }
                    continue;
                }
                write_stderr_line(
                    stderr,
                    format!(
                        "Rate limited after {MAX_RETRIES} attempts. \
                         Wait a few minutes and try again, or download manually."
                    ),
                );
                return Ok(PrimaryReport {
                    outcome: FetchOutcome::RateLimitExhausted,
                    attempts,
                });
            }
            Err(error) => return Err(error.into()),
        }
    }

    Ok(PrimaryReport {
        outcome: FetchOutcome::PartialOrMissing,
        attempts,
    })
}

/// Extract every zip archive in `dir` into `dir`, deleting each archive
/// after successful extraction. Extraction failures propagate.
fn extract_archives(
    dir: &Utf8Path,
    extractor: &dyn ArchiveExtractor,
    quiet: bool,
    stderr: &mut dyn Write,
) -> Result<()> {
    let mut archives: Vec<Utf8PathBuf> = Vec::new();
    for entry in dir.read_dir_utf8()? {
        let entry = entry?;
        if entry.file_type()?.is_file() && entry.path().extension() == Some("zip") {
            archives.push(entry.path().to_owned());
        }
    }
    archives.sort();

    for archive in &archives {
        if !quiet {
            let name = archive.file_name().unwrap_or(archive.as_str());
            write_stderr_line(stderr, format!("Extracting {name}..."));
        }
        extractor.extract(archive, dir)?;
        std::fs::remove_file(archive.as_std_path())?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "fetch_tests.rs"]
mod tests;
