//! External pipeline invocation and exit-code propagation.
//!
//! The multi-stage pipeline (preprocessing, training, inference,
//! submission generation) is an opaque external executable. This module
//! verifies or acquires the data files, locates the executable, spawns it
//! with an explicit working directory and inherited stdio, blocks until it
//! completes, and propagates its exit code verbatim.

use crate::config::RunConfig;
use crate::error::{B2tError, Result};
use crate::extract::{ArchiveExtractor, ZipExtractor};
use crate::fetch::{Sleeper, ThreadSleeper, acquire_with};
use crate::output::{partial_state_summary, write_stderr_line};
use crate::source::kaggle::{CompetitionClient, KaggleClient};
use crate::verify::verify_directory;
use camino::Utf8Path;
use std::io::Write;
use std::process::{Command, ExitStatus};

/// Abstraction for spawning the external pipeline process.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessRunner {
    /// Spawn `program` with no arguments in `working_dir`, inherit stdio,
    /// and block until it exits.
    ///
    /// # Errors
    ///
    /// Returns any I/O error encountered while spawning or waiting.
    fn run(&self, program: &Utf8Path, working_dir: &Utf8Path) -> std::io::Result<ExitStatus>;
}

/// Spawns processes on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, program: &Utf8Path, working_dir: &Utf8Path) -> std::io::Result<ExitStatus> {
        Command::new(program.as_std_path())
            .current_dir(working_dir.as_std_path())
            .status()
    }
}

/// Map a child's exit status to this process's exit code.
///
/// Codes pass through verbatim; termination by signal (no code) maps to 1.
#[must_use]
pub fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// Run the full pipeline with production implementations.
///
/// # Errors
///
/// Returns [`B2tError::PipelineNotFound`] when the pipeline executable is
/// absent, and propagates I/O errors from spawning it. Fetch-step
/// failures of any kind are observed as outcomes only: they lead to one
/// more verification and then a classified exit code, never an error.
pub fn run_pipeline(config: &RunConfig, stderr: &mut dyn Write) -> Result<i32> {
    run_pipeline_with(
        config,
        &KaggleClient,
        &ZipExtractor,
        &ThreadSleeper,
        &SystemProcessRunner,
        stderr,
    )
}

/// Testable pipeline sequencer with injected dependencies.
///
/// Strictly linear: verify, fetch when unsatisfied (unless skipped), then
/// spawn the external pipeline and propagate its exit code. A failed
/// fetch step is followed by one more verification before giving up,
/// because a reported failure does not prove the files are absent (the
/// bundle may have landed before the step errored).
///
/// # Errors
///
/// See [`run_pipeline`].
pub fn run_pipeline_with(
    config: &RunConfig,
    client: &dyn CompetitionClient,
    extractor: &dyn ArchiveExtractor,
    sleeper: &dyn Sleeper,
    runner: &dyn ProcessRunner,
    stderr: &mut dyn Write,
) -> Result<i32> {
    if !config.quiet() {
        write_stderr_line(stderr, "Checking for data files...");
    }
    let report = verify_directory(&config.fetch.data_dir, &config.fetch.manifest);

    if report.all_present() {
        if !config.quiet() {
            write_stderr_line(stderr, "All data files already exist.");
        }
    } else if config.skip_fetch {
        write_stderr_line(stderr, "Data files are missing and the fetch step was skipped.");
        for line in partial_state_summary(&report, &config.fetch.manifest) {
            write_stderr_line(stderr, line);
        }
        return Ok(1);
    } else {
        let satisfied = match acquire_with(&config.fetch, client, extractor, sleeper, stderr) {
            Ok(outcome) => outcome.is_satisfied(),
            Err(error) => {
                write_stderr_line(stderr, format!("Data fetch failed: {error}"));
                false
            }
        };
        if !satisfied {
            // The fetch step can fail with the files already in place;
            // check once more before giving up.
            let recheck = verify_directory(&config.fetch.data_dir, &config.fetch.manifest);
            if !recheck.all_present() {
                write_stderr_line(stderr, "Cannot proceed without the data files.");
                return Ok(1);
            }
            if !config.quiet() {
                write_stderr_line(stderr, "Found the data files after all; proceeding.");
            }
        }
    }

    let program = &config.pipeline_command;
    if !program.is_file() {
        return Err(B2tError::PipelineNotFound {
            path: program.clone(),
        });
    }
    if !config.quiet() {
        write_stderr_line(stderr, "Running preprocessing, training, and inference...");
    }
    let status = runner.run(program, &config.base_dir)?;
    Ok(exit_code(status))
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
