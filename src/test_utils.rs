//! Shared test utilities for the b2t crate.
//!
//! Stub implementations of the network, extraction, and subprocess seams,
//! available to unit tests and (behind the `test-support` feature) to
//! external test suites. None of these touch the network or spawn
//! processes.

use crate::fetch::Sleeper;
use crate::pipeline::ProcessRunner;
use crate::source::kaggle::{CompetitionClient, DownloadError, KaggleCredentials};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::VecDeque;
use std::io::Write as _;
use std::process::ExitStatus;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Writes a valid `kaggle.json` into `dir` and returns its path.
pub fn write_credentials(dir: &Utf8Path) -> Utf8PathBuf {
    let path = dir.join("kaggle.json");
    std::fs::write(
        path.as_std_path(),
        br#"{"username": "tester", "key": "token"}"#,
    )
    .expect("write credentials");
    path
}

/// Writes a zip archive containing the given entries.
pub fn write_zip(path: &Utf8Path, entries: &[(String, Vec<u8>)]) {
    let file = std::fs::File::create(path.as_std_path()).expect("create archive");
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, contents) in entries {
        writer
            .start_file(name.as_str(), options)
            .expect("start entry");
        writer.write_all(contents).expect("write entry");
    }
    writer.finish().expect("finish archive");
}

fn write_files(dir: &Utf8Path, files: &[(String, Vec<u8>)]) {
    for (name, contents) in files {
        std::fs::write(dir.join(name).as_std_path(), contents).expect("write file");
    }
}

fn rate_limited_error() -> DownloadError {
    DownloadError::RateLimited {
        url: "stub://kaggle".to_owned(),
        reason: "HTTP 429 Too Many Requests".to_owned(),
    }
}

/// One scripted response for [`StubCompetitionClient`].
#[derive(Debug)]
pub enum ScriptedResponse {
    /// Write the given files into the destination directory.
    Deliver(Vec<(String, Vec<u8>)>),
    /// Write a zip archive with the given name and entries into the
    /// destination directory.
    DeliverArchive {
        /// Archive filename.
        name: String,
        /// Entry names and contents.
        entries: Vec<(String, Vec<u8>)>,
    },
    /// Write the given files, then report a rate-limit error anyway —
    /// models a tool that errors after the data has already landed.
    DeliverThenRateLimit(Vec<(String, Vec<u8>)>),
    /// Report a rate-limit error.
    RateLimited,
    /// Report a non-retryable error with the given reason.
    Fail(String),
}

/// A stub implementation of [`CompetitionClient`] driven by a script of
/// responses, one per call. Records the number of calls made.
#[derive(Debug)]
pub struct StubCompetitionClient {
    script: Mutex<VecDeque<ScriptedResponse>>,
    calls: AtomicUsize,
}

impl StubCompetitionClient {
    /// Build a client that replays the given responses in order.
    pub fn new(script: impl IntoIterator<Item = ScriptedResponse>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A client that reports rate limiting on every one of `times` calls.
    #[must_use]
    pub fn rate_limited(times: usize) -> Self {
        Self::new((0..times).map(|_| ScriptedResponse::RateLimited))
    }

    /// Number of calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompetitionClient for StubCompetitionClient {
    fn download_all(
        &self,
        _credentials: &KaggleCredentials,
        _competition: &str,
        dest_dir: &Utf8Path,
    ) -> Result<(), DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self.script.lock().expect("lock").pop_front();
        match response {
            None => Err(DownloadError::Http {
                url: "stub://kaggle".to_owned(),
                reason: "stub script exhausted".to_owned(),
            }),
            Some(ScriptedResponse::Deliver(files)) => {
                write_files(dest_dir, &files);
                Ok(())
            }
            Some(ScriptedResponse::DeliverArchive { name, entries }) => {
                write_zip(&dest_dir.join(name), &entries);
                Ok(())
            }
            Some(ScriptedResponse::DeliverThenRateLimit(files)) => {
                write_files(dest_dir, &files);
                Err(rate_limited_error())
            }
            Some(ScriptedResponse::RateLimited) => Err(rate_limited_error()),
            Some(ScriptedResponse::Fail(reason)) => Err(DownloadError::Http {
                url: "stub://kaggle".to_owned(),
                reason,
            }),
        }
    }
}

/// A sleeper that records requested delays instead of blocking.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Build a sleeper with an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded delays, in seconds, in request order.
    #[must_use]
    pub fn waits_secs(&self) -> Vec<u64> {
        self.waits
            .lock()
            .expect("lock")
            .iter()
            .map(Duration::as_secs)
            .collect()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.waits.lock().expect("lock").push(duration);
    }
}

/// A stub [`ProcessRunner`] that records invocations and returns a fixed
/// exit status without spawning anything.
#[derive(Debug)]
pub struct StubProcessRunner {
    exit_code: i32,
    invocations: Mutex<Vec<(Utf8PathBuf, Utf8PathBuf)>>,
}

impl StubProcessRunner {
    /// Build a runner whose children always exit with `exit_code`.
    #[must_use]
    pub fn new(exit_code: i32) -> Self {
        Self {
            exit_code,
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// The recorded `(program, working_dir)` pairs, in invocation order.
    #[must_use]
    pub fn invocations(&self) -> Vec<(Utf8PathBuf, Utf8PathBuf)> {
        self.invocations.lock().expect("lock").clone()
    }
}

impl ProcessRunner for StubProcessRunner {
    fn run(&self, program: &Utf8Path, working_dir: &Utf8Path) -> std::io::Result<ExitStatus> {
        self.invocations
            .lock()
            .expect("lock")
            .push((program.to_owned(), working_dir.to_owned()));
        Ok(exit_status(self.exit_code))
    }
}
