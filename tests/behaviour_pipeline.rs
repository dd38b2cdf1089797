//! BDD tests for the pipeline run workflow.

use b2t::config::{FetchConfig, RunConfig};
use b2t::error::B2tError;
use b2t::extract::ZipExtractor;
use b2t::manifest::DataManifest;
use b2t::pipeline::run_pipeline_with;
use b2t::test_utils::{
    RecordingSleeper, StubCompetitionClient, StubProcessRunner, write_credentials,
};
use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

struct PipelineWorld {
    _temp: tempfile::TempDir,
    config: RunConfig,
    runner_code: i32,
    runner: Option<StubProcessRunner>,
    result: Option<Result<i32, B2tError>>,
    stderr: Vec<u8>,
}

#[fixture]
fn world() -> PipelineWorld {
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
    PipelineWorld {
        _temp: temp,
        config,
        runner_code: 0,
        runner: None,
        result: None,
        stderr: Vec::new(),
    }
}

#[given("a data directory containing every required file")]
fn given_all_files(world: &mut PipelineWorld) {
    std::fs::create_dir_all(world.config.fetch.data_dir.as_std_path()).expect("create data dir");
    for name in DataManifest::competition().names() {
        std::fs::write(
            world.config.fetch.data_dir.join(name).as_std_path(),
            b"payload",
        )
        .expect("write file");
    }
}

#[given("a pipeline executable whose exit code is {code}")]
fn given_pipeline_executable(world: &mut PipelineWorld, code: String) {
    world.runner_code = code.parse().expect("numeric exit code");
    std::fs::write(
        world.config.pipeline_command.as_std_path(),
        b"#!/bin/sh\nexit 0\n",
    )
    .expect("write pipeline");
}

#[given("the fetch step is skipped")]
fn given_skip_fetch(world: &mut PipelineWorld) {
    world.config.skip_fetch = true;
}

#[when("the pipeline run executes")]
fn when_run_executes(world: &mut PipelineWorld) {
    let client = StubCompetitionClient::new([]);
    let runner = StubProcessRunner::new(world.runner_code);
    let result = run_pipeline_with(
        &world.config,
        &client,
        &ZipExtractor,
        &RecordingSleeper::new(),
        &runner,
        &mut world.stderr,
    );
    world.runner = Some(runner);
    world.result = Some(result);
}

#[then("the run exit code is {code}")]
fn then_exit_code(world: &mut PipelineWorld, code: String) {
    let expected: i32 = code.parse().expect("numeric exit code");
    let result = world.result.as_ref().expect("run executed");
    let actual = result.as_ref().expect("run succeeded");
    assert_eq!(*actual, expected);
}

#[then("the run fails because the pipeline executable is missing")]
fn then_pipeline_missing(world: &mut PipelineWorld) {
    let result = world.result.as_ref().expect("run executed");
    let err = result.as_ref().expect_err("run failed");
    assert!(matches!(err, B2tError::PipelineNotFound { .. }));
}

#[then("the pipeline child runs in the base directory")]
fn then_child_in_base_dir(world: &mut PipelineWorld) {
    let runner = world.runner.as_ref().expect("run executed");
    let invocations = runner.invocations();
    assert_eq!(invocations.len(), 1);
    assert_eq!(
        invocations.first().map(|(_, dir)| dir.clone()),
        Some(world.config.base_dir.clone())
    );
}

#[then("the pipeline child is never spawned")]
fn then_child_never_spawned(world: &mut PipelineWorld) {
    let runner = world.runner.as_ref().expect("run executed");
    assert!(runner.invocations().is_empty());
}

#[scenario(
    path = "tests/features/pipeline_run.feature",
    name = "Pipeline exit code propagates verbatim"
)]
fn scenario_exit_code_propagation(world: PipelineWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/pipeline_run.feature",
    name = "Missing pipeline executable aborts the run"
)]
fn scenario_missing_pipeline(world: PipelineWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/pipeline_run.feature",
    name = "Missing data with fetch skipped aborts the run"
)]
fn scenario_skip_fetch_missing_data(world: PipelineWorld) {
    let _ = world;
}
