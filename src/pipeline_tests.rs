use super::*;
use crate::config::{FetchConfig, RunConfig};
use crate::manifest::DataManifest;
use crate::test_utils::{
    RecordingSleeper, ScriptedResponse, StubCompetitionClient, StubProcessRunner, exit_status,
    write_credentials,
};
use camino::Utf8PathBuf;

struct Workspace {
    _temp: tempfile::TempDir,
    config: RunConfig,
}

fn workspace() -> Workspace {
    let temp = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 temp path");
    let credentials_path = write_credentials(&root);
    let fetch = FetchConfig {
        data_dir: root.join("data"),
        manifest: DataManifest::competition(),
        credentials_path,
        competition: "brain-to-text-25".to_owned(),
        secondary_url: "https://example.test/dataset".to_owned(),
        quiet: true,
    };
    let config = RunConfig {
        fetch,
        base_dir: root.clone(),
        pipeline_command: root.join("run_full_pipeline.py"),
        skip_fetch: false,
    };
    Workspace {
        _temp: temp,
        config,
    }
}

fn manifest_files() -> Vec<(String, Vec<u8>)> {
    DataManifest::competition()
        .names()
        .map(|name| (name.to_owned(), b"payload".to_vec()))
        .collect()
}

fn place_all_files(config: &RunConfig) {
    std::fs::create_dir_all(config.fetch.data_dir.as_std_path()).expect("create data dir");
    for (name, contents) in manifest_files() {
        std::fs::write(config.fetch.data_dir.join(name).as_std_path(), contents)
            .expect("write file");
    }
}

fn place_pipeline(config: &RunConfig) {
    std::fs::write(config.pipeline_command.as_std_path(), b"#!/bin/sh\nexit 0\n")
        .expect("write pipeline");
}

fn run(
    config: &RunConfig,
    client: &StubCompetitionClient,
    runner: &StubProcessRunner,
) -> crate::error::Result<i32> {
    run_pipeline_with(
        config,
        client,
        &ZipExtractor,
        &RecordingSleeper::new(),
        runner,
        &mut Vec::new(),
    )
}

#[test]
fn pipeline_exit_code_propagates_verbatim() {
    let ws = workspace();
    place_all_files(&ws.config);
    place_pipeline(&ws.config);
    let client = StubCompetitionClient::new([]);
    let runner = StubProcessRunner::new(7);

    let code = run(&ws.config, &client, &runner).expect("run succeeds");

    assert_eq!(code, 7);
    let invocations = runner.invocations();
    assert_eq!(invocations.len(), 1);
    assert_eq!(
        invocations.first(),
        Some(&(ws.config.pipeline_command.clone(), ws.config.base_dir.clone()))
    );
}

#[test]
fn present_data_skips_the_fetch_entirely() {
    let ws = workspace();
    place_all_files(&ws.config);
    place_pipeline(&ws.config);
    let client = StubCompetitionClient::new([]);
    let runner = StubProcessRunner::new(0);

    let code = run(&ws.config, &client, &runner).expect("run succeeds");

    assert_eq!(code, 0);
    assert_eq!(client.call_count(), 0);
}

#[test]
fn missing_pipeline_executable_is_an_error() {
    let ws = workspace();
    place_all_files(&ws.config);
    let client = StubCompetitionClient::new([]);
    let runner = StubProcessRunner::new(0);

    let err = run(&ws.config, &client, &runner).expect_err("pipeline is absent");

    assert!(matches!(err, B2tError::PipelineNotFound { .. }));
    assert!(runner.invocations().is_empty());
}

#[test]
fn skipped_fetch_with_missing_data_exits_one() {
    let ws = workspace();
    place_pipeline(&ws.config);
    let config = RunConfig {
        skip_fetch: true,
        ..ws.config.clone()
    };
    let client = StubCompetitionClient::new([]);
    let runner = StubProcessRunner::new(0);

    let code = run(&config, &client, &runner).expect("classified exit");

    assert_eq!(code, 1);
    assert_eq!(client.call_count(), 0);
    assert!(runner.invocations().is_empty());
}

#[test]
fn failed_fetch_without_files_exits_one() {
    let ws = workspace();
    place_pipeline(&ws.config);
    let client = StubCompetitionClient::rate_limited(crate::fetch::MAX_RETRIES as usize);
    let runner = StubProcessRunner::new(0);

    let code = run(&ws.config, &client, &runner).expect("classified exit");

    assert_eq!(code, 1);
    assert!(runner.invocations().is_empty());
}

#[test]
fn hard_fetch_error_is_observed_as_an_exit_code() {
    let ws = workspace();
    place_pipeline(&ws.config);
    let client = StubCompetitionClient::new([ScriptedResponse::Fail(
        "connection reset by peer".to_owned(),
    )]);
    let runner = StubProcessRunner::new(0);
    let mut stderr = Vec::new();

    let code = run_pipeline_with(
        &ws.config,
        &client,
        &ZipExtractor,
        &RecordingSleeper::new(),
        &runner,
        &mut stderr,
    )
    .expect("fetch errors become classified exits");

    assert_eq!(code, 1);
    assert!(runner.invocations().is_empty());
    let text = String::from_utf8(stderr).expect("stderr was not UTF-8");
    assert!(text.contains("Data fetch failed:"));
}

#[test]
fn failed_fetch_is_forgiven_when_files_are_present_anyway() {
    // Models a download step that errors after the data has landed: the
    // sequencer re-verifies once before giving up.
    let ws = workspace();
    place_pipeline(&ws.config);
    let script: Vec<ScriptedResponse> = (0..crate::fetch::MAX_RETRIES)
        .map(|_| ScriptedResponse::DeliverThenRateLimit(manifest_files()))
        .collect();
    let client = StubCompetitionClient::new(script);
    let runner = StubProcessRunner::new(0);

    let code = run(&ws.config, &client, &runner).expect("run succeeds");

    assert_eq!(code, 0);
    assert_eq!(runner.invocations().len(), 1);
}

#[test]
fn exit_code_passes_through_normal_termination() {
    assert_eq!(exit_code(exit_status(7)), 7);
    assert_eq!(exit_code(exit_status(0)), 0);
}

#[cfg(unix)]
#[test]
fn exit_code_maps_signal_termination_to_one() {
    use std::os::unix::process::ExitStatusExt;

    // Raw wait status 9 = terminated by SIGKILL, no exit code.
    let status = ExitStatus::from_raw(9);
    assert_eq!(exit_code(status), 1);
}

#[cfg(unix)]
#[test]
fn system_runner_propagates_a_real_exit_code() {
    use std::os::unix::fs::PermissionsExt;

    let temp = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 temp path");
    let script = root.join("exit-seven.sh");
    std::fs::write(script.as_std_path(), b"#!/bin/sh\nexit 7\n").expect("write script");
    let mut perms = std::fs::metadata(script.as_std_path())
        .expect("script metadata")
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(script.as_std_path(), perms).expect("set permissions");

    let status = SystemProcessRunner
        .run(&script, &root)
        .expect("spawn succeeds");
    assert_eq!(exit_code(status), 7);
}
