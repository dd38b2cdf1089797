//! b2t CLI entrypoint.
//!
//! Dispatches the `fetch` and `run` subcommands (defaulting to `run`),
//! maps classified outcomes and errors to process exit codes, and keeps
//! all orchestration behind testable library functions.

use b2t::cli::{Cli, Command, FetchArgs, RunArgs};
use b2t::config::{FetchConfig, RunConfig};
use b2t::dirs::{SystemUserDirs, UserDirs};
use b2t::error::Result;
use b2t::fetch;
use b2t::output::write_stderr_line;
use b2t::pipeline;
use camino::Utf8Path;
use clap::Parser;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let exit_code = match dispatch(&cli, &SystemUserDirs, &mut stderr) {
        Ok(code) => code,
        Err(err) => {
            write_stderr_line(&mut stderr, &err);
            1
        }
    };
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn dispatch(cli: &Cli, dirs: &dyn UserDirs, stderr: &mut dyn Write) -> Result<i32> {
    match &cli.command {
        Some(Command::Fetch(args)) => fetch_command(args, dirs, stderr),
        Some(Command::Run(_)) | None => run_command(cli.run_args(), dirs, stderr),
    }
}

/// Acquire the data files; exit 0 only when the manifest is satisfied.
fn fetch_command(args: &FetchArgs, dirs: &dyn UserDirs, stderr: &mut dyn Write) -> Result<i32> {
    let config = FetchConfig::resolve(args, dirs, Utf8Path::new("."))?;
    let outcome = fetch::acquire(&config, stderr)?;
    Ok(if outcome.is_satisfied() { 0 } else { 1 })
}

/// Acquire data when needed, then run the external pipeline.
fn run_command(args: &RunArgs, dirs: &dyn UserDirs, stderr: &mut dyn Write) -> Result<i32> {
    let config = RunConfig::resolve(args, dirs)?;
    if args.dry_run {
        write_stderr_line(stderr, config.display_plan());
        return Ok(0);
    }
    pipeline::run_pipeline(&config, stderr)
}
