//! Secondary-source fallback: the Dryad archival repository.
//!
//! Dryad hosts the dataset for archival access but exposes no stable
//! programmatic download path, so this check never transfers data. It
//! prints manual-access instructions and reports
//! [`FetchOutcome::SourceUnavailable`]. It is deliberately infallible: a
//! degraded fallback must never turn an acquisition attempt into a crash.

use crate::fetch::FetchOutcome;
use crate::output::write_stderr_line;
use std::io::Write;

/// The Dryad dataset landing page (DOI resolver URL).
pub const DRYAD_DATASET_URL: &str = "https://datadryad.org/dataset/doi:10.5061/dryad.dncjsxm85";

/// Check the secondary archival source.
///
/// Always reports [`FetchOutcome::SourceUnavailable`] together with the
/// manual-access URL. Never fails.
pub fn check_secondary(url: &str, quiet: bool, stderr: &mut dyn Write) -> FetchOutcome {
    if !quiet {
        write_stderr_line(stderr, "Checking the Dryad archival repository...");
        write_stderr_line(
            stderr,
            "Dryad has no programmatic download path; manual access is required:",
        );
        write_stderr_line(stderr, format!("  {url}"));
    }
    FetchOutcome::SourceUnavailable
}
