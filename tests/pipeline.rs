//! End-to-end pipeline runs against fake collaborators.

mod common;

use common::{
    Fixture, PROBE_EVENT, RunnerScript, TEST_VERSION, events, packager_runs, populate_runtime,
};
use installer_build::{
    Error,
    cli::OutputManager,
    pipeline::{PipelineRunner, PipelineState},
};

const ALL_STEPS: [&str; 8] = [
    "locate-toolchain",
    "fetch-runtime",
    "stage-runtime",
    "install-application",
    "prune-runtime",
    "query-version",
    "build-installer",
    "publish-artifact",
];

#[tokio::test]
async fn fresh_run_publishes_installer() {
    let fx = Fixture::new();
    let tools = fx.collaborators(true, RunnerScript::default());
    let runner = PipelineRunner::new(&fx.build, &fx.config, &tools, OutputManager::silent());
    assert_eq!(runner.step_names(), ALL_STEPS);

    let report = runner.execute().await;

    assert!(report.succeeded(), "{:?}", report.error);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.completed, ALL_STEPS);
    assert_eq!(report.run_state.version.as_deref(), Some(TEST_VERSION));

    let published = fx.build.dest_dir().join(format!("RBTools-{TEST_VERSION}.exe"));
    assert!(published.is_file());
    assert_eq!(report.run_state.published, vec![published]);

    let build_root = fx.build.build_root();
    assert!(build_root.join("python.exe").is_file());
    assert!(build_root.join("Lib/site-packages").is_dir());
    assert!(!build_root.join("Doc").exists());
    assert!(!build_root.join("tcl").exists());
    assert!(!build_root.join("Lib/test").exists());
    assert!(!fx.build.version_marker().exists());
}

#[tokio::test]
async fn empty_cache_downloads_and_verifies_empty_file() {
    let fx = Fixture::new();
    let tools = fx.collaborators(true, RunnerScript::default());

    let report = PipelineRunner::new(&fx.build, &fx.config, &tools, OutputManager::silent())
        .execute()
        .await;

    assert!(report.succeeded());
    let log = events(&fx.log);
    assert_eq!(log[0], PROBE_EVENT);
    assert_eq!(log[1], "download https://downloads.example.com/python-2.7.18.msi");
    assert_eq!(log[2], "install python-2.7.18.msi");
    assert_eq!(log[3], "run python.exe setup.py");
    assert!(!fx.download_path().exists());
}

#[tokio::test]
async fn populated_cache_ignores_wrong_checksum() {
    let mut fx = Fixture::new();
    populate_runtime(&fx.runtime_cache());
    fx.config.runtime.checksum = "ffffffffffffffffffffffffffffffff".into();
    let tools = fx.collaborators(true, RunnerScript::default());

    let report = PipelineRunner::new(&fx.build, &fx.config, &tools, OutputManager::silent())
        .execute()
        .await;

    assert!(report.succeeded(), "{:?}", report.error);
    assert!(!events(&fx.log).iter().any(|e| e.starts_with("download")));
}

#[tokio::test]
async fn failed_application_install_aborts_before_prune() {
    let fx = Fixture::new();
    let script = RunnerScript {
        install_exit: 1,
        ..RunnerScript::default()
    };
    let tools = fx.collaborators(true, script);

    let report = PipelineRunner::new(&fx.build, &fx.config, &tools, OutputManager::silent())
        .execute()
        .await;

    assert_eq!(
        report.state,
        PipelineState::Aborted {
            index: 3,
            step: "install-application"
        }
    );
    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.completed, ALL_STEPS[..3]);
    assert!(matches!(report.error, Some(Error::Install { .. })));

    // Post-copy state: nothing pruned, nothing packaged.
    assert!(fx.build.build_root().join("Doc/python.chm").is_file());
    assert_eq!(packager_runs(&fx.log), 0);
    assert!(!fx.build.dest_dir().exists());
}

#[tokio::test]
async fn failing_version_probe_does_not_stop_the_build() {
    let fx = Fixture::new();
    let script = RunnerScript {
        probe_exit: 1,
        ..RunnerScript::default()
    };
    let tools = fx.collaborators(true, script);

    let report = PipelineRunner::new(&fx.build, &fx.config, &tools, OutputManager::silent())
        .execute()
        .await;

    assert!(report.succeeded(), "{:?}", report.error);
    assert_eq!(events(&fx.log)[0], PROBE_EVENT);
    assert_eq!(packager_runs(&fx.log), 1);
}

#[tokio::test]
async fn missing_toolchain_runs_nothing_else() {
    let fx = Fixture::new();
    let tools = fx.collaborators(false, RunnerScript::default());

    let report = PipelineRunner::new(&fx.build, &fx.config, &tools, OutputManager::silent())
        .execute()
        .await;

    assert!(matches!(report.error, Some(Error::ToolchainNotFound(_))));
    assert!(report.completed.is_empty());
    assert!(events(&fx.log).is_empty());
    assert!(!fx.build.build_root().exists());
}

#[tokio::test]
async fn packager_failure_publishes_nothing() {
    let fx = Fixture::new();
    let script = RunnerScript {
        packager_exit: 2,
        ..RunnerScript::default()
    };
    let tools = fx.collaborators(true, script);

    let report = PipelineRunner::new(&fx.build, &fx.config, &tools, OutputManager::silent())
        .execute()
        .await;

    assert!(matches!(report.error, Some(Error::Packaging(_))));
    assert_eq!(report.completed.last(), Some(&"query-version"));
    assert!(!fx.build.dest_dir().exists());
}

#[tokio::test]
async fn missing_artifact_is_a_packaging_failure() {
    let fx = Fixture::new();
    let script = RunnerScript {
        packager_writes_artifact: false,
        ..RunnerScript::default()
    };
    let tools = fx.collaborators(true, script);

    let report = PipelineRunner::new(&fx.build, &fx.config, &tools, OutputManager::silent())
        .execute()
        .await;

    assert_eq!(
        report.state,
        PipelineState::Aborted {
            index: 7,
            step: "publish-artifact"
        }
    );
    assert!(matches!(report.error, Some(Error::Packaging(_))));
    let dest = fx.build.dest_dir();
    assert!(dest.is_dir());
    assert_eq!(std::fs::read_dir(dest).unwrap().count(), 0);
}

#[tokio::test]
async fn earlier_installer_is_not_republished() {
    let fx = Fixture::new();
    let first = PipelineRunner::new(
        &fx.build,
        &fx.config,
        &fx.collaborators(true, RunnerScript::default()),
        OutputManager::silent(),
    )
    .execute()
    .await;
    assert!(first.succeeded(), "{:?}", first.error);
    std::fs::remove_dir_all(fx.build.dest_dir()).unwrap();

    let script = RunnerScript {
        packager_writes_artifact: false,
        ..RunnerScript::default()
    };
    let second = PipelineRunner::new(
        &fx.build,
        &fx.config,
        &fx.collaborators(true, script),
        OutputManager::silent(),
    )
    .execute()
    .await;

    assert!(matches!(second.error, Some(Error::Packaging(_))));
    assert!(second.run_state.published.is_empty());
    assert_eq!(std::fs::read_dir(fx.build.dest_dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn failed_version_query_cleans_marker() {
    let fx = Fixture::new();
    let script = RunnerScript {
        version_exit: 1,
        ..RunnerScript::default()
    };
    let tools = fx.collaborators(true, script);

    let report = PipelineRunner::new(&fx.build, &fx.config, &tools, OutputManager::silent())
        .execute()
        .await;

    assert!(matches!(report.error, Some(Error::Install { .. })));
    assert!(!fx.build.version_marker().exists());
    assert_eq!(report.run_state.version, None);
}

#[tokio::test]
async fn rerun_restages_from_scratch() {
    let fx = Fixture::new();
    let tools = fx.collaborators(true, RunnerScript::default());
    let runner = PipelineRunner::new(&fx.build, &fx.config, &tools, OutputManager::silent());

    assert!(runner.execute().await.succeeded());
    std::fs::write(fx.build.build_root().join("stale.txt"), "old").unwrap();

    let second = runner.execute().await;
    assert!(second.succeeded(), "{:?}", second.error);
    assert!(!fx.build.build_root().join("stale.txt").exists());
    assert_eq!(
        events(&fx.log)
            .iter()
            .filter(|e| e.starts_with("download"))
            .count(),
        1
    );
}

#[tokio::test]
async fn run_maps_outcome_to_exit_code() {
    let fx = Fixture::new();
    let tools = fx.collaborators(false, RunnerScript::default());
    let code = PipelineRunner::new(&fx.build, &fx.config, &tools, OutputManager::silent())
        .run()
        .await;
    assert_eq!(code, 1);
}
