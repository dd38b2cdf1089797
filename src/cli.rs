//! CLI argument definitions for the b2t tool.
//!
//! This module defines the command-line interface using clap. It is
//! separated from the main entrypoint to keep the binary small and focused
//! on orchestration.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Acquire the brain-to-text competition data and run the pipeline.
#[derive(Parser, Debug)]
#[command(name = "b2t")]
#[command(version, about)]
#[command(long_about = concat!(
    "Acquire the brain-to-text competition data and run the pipeline.\n\n",
    "The fetch step verifies the data directory against the required file ",
    "manifest, downloads the competition bundle from Kaggle when files are ",
    "missing (retrying with exponential backoff on rate limiting), falls ",
    "back to the Dryad archive, and prints manual-download instructions ",
    "when neither source can satisfy the manifest.\n\n",
    "The run step performs the fetch when needed and then hands off to the ",
    "external multi-stage pipeline executable, propagating its exit code.",
))]
#[command(after_help = concat!(
    "REQUIRED DATA FILES:\n",
    "  data_train.hdf5    Training split\n",
    "  data_val.hdf5      Validation split\n",
    "  data_test.hdf5     Test split\n\n",
    "EXAMPLES:\n",
    "  Download and verify the data files:\n",
    "    $ b2t fetch\n\n",
    "  Run the complete pipeline (fetching data first when needed):\n",
    "    $ b2t run\n\n",
    "  Run against an existing data directory, no network access:\n",
    "    $ b2t run --skip-fetch --data-dir /datasets/b2t\n\n",
    "  Preview the resolved configuration without doing anything:\n",
    "    $ b2t run --dry-run\n\n",
    "Kaggle credentials are read from ~/.kaggle/kaggle.json by default; ",
    "download the file from https://www.kaggle.com/settings.",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Run arguments (used when no subcommand is given).
    #[command(flatten)]
    pub run: RunArgs,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download and verify the competition data files.
    Fetch(FetchArgs),

    /// Acquire data if needed, then run the full pipeline (default).
    Run(RunArgs),
}

/// Arguments shared by the fetch step.
#[derive(Parser, Debug, Clone)]
pub struct FetchArgs {
    /// Data directory for the dataset files [default: <base-dir>/data].
    #[arg(short, long, value_name = "DIR")]
    pub data_dir: Option<Utf8PathBuf>,

    /// Competition identifier on the primary source.
    #[arg(long, value_name = "NAME")]
    pub competition: Option<String>,

    /// Path to the kaggle.json credential file [default: ~/.kaggle/kaggle.json].
    #[arg(long, value_name = "FILE")]
    pub credentials: Option<Utf8PathBuf>,

    /// Configuration file [default: b2t.toml when present].
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Suppress progress output (errors and instructions still shown).
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the run command.
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Fetch-step arguments.
    #[command(flatten)]
    pub fetch: FetchArgs,

    /// External pipeline executable [default: <base-dir>/run_full_pipeline.py].
    #[arg(long, value_name = "FILE")]
    pub pipeline: Option<Utf8PathBuf>,

    /// Base directory: working directory for the pipeline child process.
    #[arg(short, long, value_name = "DIR")]
    pub base_dir: Option<Utf8PathBuf>,

    /// Do not fetch; require the data files to already be present.
    #[arg(long)]
    pub skip_fetch: bool,

    /// Show the resolved configuration and exit without doing anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl Default for FetchArgs {
    /// Creates a `FetchArgs` instance with no overrides set.
    fn default() -> Self {
        Self {
            data_dir: None,
            competition: None,
            credentials: None,
            config: None,
            quiet: false,
        }
    }
}

impl Default for RunArgs {
    /// Creates a `RunArgs` instance with no overrides set.
    fn default() -> Self {
        Self {
            fetch: FetchArgs::default(),
            pipeline: None,
            base_dir: None,
            skip_fetch: false,
            dry_run: false,
        }
    }
}

impl Cli {
    /// Returns the effective run arguments.
    ///
    /// If a `Run` subcommand was provided, returns those arguments.
    /// Otherwise returns the flattened run arguments, so that invoking the
    /// binary with no subcommand behaves like `b2t run`.
    #[must_use]
    pub fn run_args(&self) -> &RunArgs {
        match &self.command {
            Some(Command::Run(args)) => args,
            Some(Command::Fetch(_)) | None => &self.run,
        }
    }
}
