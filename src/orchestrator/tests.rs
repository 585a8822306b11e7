use super::*;
use crate::error::{ProcessError, ReportError, SnapshotError};
use crate::lock::ProcessTable;
use crate::report::{ReportRequest, ReportTool};
use crate::runner::{RAW_RESULTS_FILE, RunHandle};
use crate::snapshot::Snapshot;
use crate::snapshot::test_support::FixtureSource;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::{TempDir, tempdir};

/// Writes a raw results file, or fails with a non-zero exit.
struct FakeGenerator {
    fail: bool,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl LoadGenerator for FakeGenerator {
    async fn run(&self, case: &TestCase, work_dir: &Path) -> Result<RunHandle, ProcessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProcessError::Exit {
                program: "jmeter".to_owned(),
                code: Some(2),
                stderr_tail: format!("{} broke", case.name()),
            });
        }
        let artifact = work_dir.join(RAW_RESULTS_FILE);
        std::fs::write(&artifact, "timeStamp,elapsed\n").map_err(|source| ProcessError::Spawn {
            program: "jmeter".to_owned(),
            source,
        })?;
        Ok(RunHandle::new(work_dir.to_path_buf(), artifact, Some(0)))
    }
}

/// Produces every report except the ones listed as failing.
struct FakeReporter {
    failing: &'static [&'static str],
}

#[async_trait]
impl ReportTool for FakeReporter {
    async fn render(
        &self,
        _input: &Path,
        request: &ReportRequest,
        work_dir: &Path,
    ) -> Result<(), ReportError> {
        if self.failing.contains(&request.plugin) {
            return Err(ReportError::Process(ProcessError::Exit {
                program: "java".to_owned(),
                code: Some(1),
                stderr_tail: "Reporter failed".to_owned(),
            }));
        }
        std::fs::write(work_dir.join(&request.file_name), "report").map_err(|source| {
            ReportError::Process(ProcessError::Spawn {
                program: "java".to_owned(),
                source,
            })
        })
    }
}

/// Remembers how many tests each published run carried.
#[derive(Clone, Default)]
struct RecordingSink {
    seen: Arc<Mutex<Vec<usize>>>,
}

#[async_trait]
impl ResultsSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn publish(&self, run: &BenchmarkRun) -> AppResult<()> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(run.tests().len());
        }
        Ok(())
    }
}

struct Harness {
    root: TempDir,
    source: FixtureSource,
    generator_fails: bool,
    failing_reports: &'static [&'static str],
    holder_alive: bool,
    sinks: Vec<Box<dyn ResultsSink>>,
    generator_calls: Arc<AtomicUsize>,
}

impl Harness {
    fn new() -> Result<Self, String> {
        Ok(Self {
            root: tempdir().map_err(|err| format!("tempdir failed: {}", err))?,
            source: FixtureSource::load()?,
            generator_fails: false,
            failing_reports: &[],
            holder_alive: false,
            sinks: Vec::new(),
            generator_calls: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn root(&self) -> &Path {
        self.root.path()
    }

    fn lock_path(&self) -> PathBuf {
        self.root().join("update.pid")
    }

    /// Creates query files under `<root>/queries` and returns that directory.
    fn queries(&self, names: &[&str]) -> Result<String, String> {
        let dir = self.root().join("queries");
        std::fs::create_dir_all(&dir).map_err(|err| format!("mkdir failed: {}", err))?;
        for name in names {
            std::fs::write(dir.join(name), "title:star\n")
                .map_err(|err| format!("write failed: {}", err))?;
        }
        Ok(dir.to_string_lossy().into_owned())
    }

    fn plan(&self, pattern: String) -> RunPlan {
        RunPlan {
            work_root: self.root().to_path_buf(),
            queries_pattern: Some(pattern),
            default_glob: self
                .root()
                .join("missing")
                .join("*.queries")
                .to_string_lossy()
                .into_owned(),
            ..RunPlan::default()
        }
    }

    fn orchestrator(&mut self, plan: RunPlan) -> Orchestrator {
        let alive = self.holder_alive;
        let processes: Box<dyn ProcessTable> = Box::new(move |_pid: u32| alive);
        let parts = Collaborators {
            lock: LockManager::with_pid(self.lock_path(), 9001, processes),
            snapshots: SnapshotClient::new(Box::new(self.source.clone())),
            generator: Box::new(FakeGenerator {
                fail: self.generator_fails,
                calls: Arc::clone(&self.generator_calls),
            }),
            reports: ReportGenerator::new(Box::new(FakeReporter {
                failing: self.failing_reports,
            })),
            sinks: std::mem::take(&mut self.sinks),
        };
        Orchestrator::new(plan, parts)
    }
}

fn expect_file(path: &Path) -> Result<(), String> {
    if path.is_file() {
        Ok(())
    } else {
        Err(format!("Expected {} to exist", path.display()))
    }
}

#[tokio::test(flavor = "current_thread")]
async fn busy_lock_aborts_without_touching_work_root() -> Result<(), String> {
    let mut harness = Harness::new()?;
    harness.holder_alive = true;
    let pattern = harness.queries(&["q1.queries"])?;
    std::fs::write(harness.lock_path(), "555").map_err(|err| format!("write failed: {}", err))?;

    let plan = harness.plan(pattern);
    let mut orchestrator = harness.orchestrator(plan);
    let err = match orchestrator.run().await {
        Ok(_) => return Err("Expected busy lock".to_owned()),
        Err(err) => err,
    };
    if !err.is_lock_busy() {
        return Err(format!("Unexpected error: {}", err));
    }
    if orchestrator.history() != [RunState::Idle, RunState::Aborted] {
        return Err(format!("Unexpected history: {:?}", orchestrator.history()));
    }
    let content = std::fs::read_to_string(harness.lock_path())
        .map_err(|err| format!("read failed: {}", err))?;
    if content != "555" {
        return Err(format!("Lock file was overwritten: {}", content));
    }
    if harness.root().join("q1.queries_results").exists()
        || harness.root().join(BEFORE_RUN_FILE).exists()
    {
        return Err("Busy run must not create artifacts".to_owned());
    }
    if harness.source.fetch_count() != 0 {
        return Err("Busy run must not query the server".to_owned());
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn failing_report_kind_is_a_warning_and_post_snapshot_persists() -> Result<(), String> {
    let mut harness = Harness::new()?;
    harness.failing_reports = &["AggregateReport"];
    let pattern = harness.queries(&["q1.queries"])?;

    let plan = harness.plan(pattern);
    let mut orchestrator = harness.orchestrator(plan);
    let run = orchestrator
        .run()
        .await
        .map_err(|err| format!("run failed: {}", err))?;

    if run.warning_count() != 1 {
        return Err(format!("Unexpected warning count: {}", run.warning_count()));
    }
    let record = run.tests().first().ok_or("Missing test record")?;
    if record.case.name() != "q1.queries" {
        return Err(format!("Unexpected test name: {}", record.case.name()));
    }
    let hits = record
        .reports
        .artifacts
        .iter()
        .any(|artifact| artifact.path.ends_with("hits-per-sec.png"));
    if !hits {
        return Err("hits-per-sec report missing".to_owned());
    }
    if record.post.len() != Snapshot::schema_len() {
        return Err("Post-test snapshot incomplete".to_owned());
    }

    let test_dir = harness.root().join("q1.queries_results");
    expect_file(&harness.root().join(BEFORE_RUN_FILE))?;
    expect_file(&test_dir.join("before-test-q1.queries.json"))?;
    expect_file(&test_dir.join("after-test-q1.queries.json"))?;
    expect_file(&test_dir.join(RAW_RESULTS_FILE))?;
    if harness.lock_path().exists() {
        return Err("Lock file must be removed".to_owned());
    }
    if harness.source.fetch_count() != 9 {
        return Err(format!("Unexpected fetches: {}", harness.source.fetch_count()));
    }
    let expected = [
        RunState::Idle,
        RunState::Locked,
        RunState::Discovering,
        RunState::PreSnapshot,
        RunState::PerTest { index: 0 },
        RunState::PostCollected,
        RunState::Unlocked,
        RunState::Done,
    ];
    if orchestrator.history() != expected {
        return Err(format!("Unexpected history: {:?}", orchestrator.history()));
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn after_snapshot_is_valid_json_with_full_schema() -> Result<(), String> {
    let mut harness = Harness::new()?;
    let pattern = harness.queries(&["q1.queries"])?;
    let plan = harness.plan(pattern);
    harness
        .orchestrator(plan)
        .run()
        .await
        .map_err(|err| format!("run failed: {}", err))?;

    let path = harness
        .root()
        .join("q1.queries_results")
        .join("after-test-q1.queries.json");
    let content = std::fs::read_to_string(&path).map_err(|err| format!("read failed: {}", err))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|err| format!("parse failed: {}", err))?;
    let object = value.as_object().ok_or("Snapshot must be an object")?;
    if object.len() != Snapshot::schema_len() {
        return Err(format!("Unexpected field count: {}", object.len()));
    }
    if object.get("indexNumDocs") != Some(&serde_json::json!(9_784_203)) {
        return Err("indexNumDocs mismatch".to_owned());
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn snapshot_failure_mid_loop_releases_lock() -> Result<(), String> {
    let mut harness = Harness::new()?;
    harness.source.fail_after = Some(3);
    let pattern = harness.queries(&["a.queries", "b.queries"])?;

    let plan = harness.plan(pattern);
    let mut orchestrator = harness.orchestrator(plan);
    match orchestrator.run().await {
        Err(AppError::Snapshot(SnapshotError::Status { status: 503, .. })) => {}
        Err(err) => return Err(format!("Unexpected error: {}", err)),
        Ok(_) => return Err("Expected snapshot failure".to_owned()),
    }
    if harness.lock_path().exists() {
        return Err("Lock file must be removed after abort".to_owned());
    }
    if harness.generator_calls.load(Ordering::SeqCst) != 0 {
        return Err("Generator must not run without a pre-test snapshot".to_owned());
    }
    let history = orchestrator.history();
    if !history.contains(&RunState::PerTest { index: 0 })
        || history.contains(&RunState::PerTest { index: 1 })
    {
        return Err(format!("Unexpected history: {:?}", history));
    }
    if history.last() != Some(&RunState::Aborted) || !history.contains(&RunState::Unlocked) {
        return Err(format!("Unexpected terminal states: {:?}", history));
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn no_tests_found_releases_lock_before_any_snapshot() -> Result<(), String> {
    let mut harness = Harness::new()?;
    let pattern = harness
        .root()
        .join("nowhere")
        .join("*.queries")
        .to_string_lossy()
        .into_owned();

    let plan = harness.plan(pattern);
    let mut orchestrator = harness.orchestrator(plan);
    match orchestrator.run().await {
        Err(AppError::Discovery(_)) => {}
        Err(err) => return Err(format!("Unexpected error: {}", err)),
        Ok(_) => return Err("Expected no tests".to_owned()),
    }
    if harness.lock_path().exists() {
        return Err("Lock file must be removed".to_owned());
    }
    if harness.source.fetch_count() != 0 {
        return Err("Discovery failure must precede snapshots".to_owned());
    }
    if orchestrator.state() != RunState::Aborted {
        return Err(format!("Unexpected state: {:?}", orchestrator.state()));
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn generator_failure_is_fatal() -> Result<(), String> {
    let mut harness = Harness::new()?;
    harness.generator_fails = true;
    let pattern = harness.queries(&["q1.queries", "q2.queries"])?;

    let plan = harness.plan(pattern);
    let mut orchestrator = harness.orchestrator(plan);
    match orchestrator.run().await {
        Err(AppError::Process(ProcessError::Exit { code: Some(2), .. })) => {}
        Err(err) => return Err(format!("Unexpected error: {}", err)),
        Ok(_) => return Err("Expected generator failure".to_owned()),
    }
    if harness.generator_calls.load(Ordering::SeqCst) != 1 {
        return Err("Second test must not start".to_owned());
    }
    let test_dir = harness.root().join("q1.queries_results");
    expect_file(&test_dir.join("before-test-q1.queries.json"))?;
    if test_dir.join("after-test-q1.queries.json").exists() {
        return Err("No post-test snapshot after a failed run".to_owned());
    }
    if harness.lock_path().exists() {
        return Err("Lock file must be removed".to_owned());
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn purge_controls_previous_results() -> Result<(), String> {
    for purge in [false, true] {
        let mut harness = Harness::new()?;
        let pattern = harness.queries(&["q1.queries"])?;
        let test_dir = harness.root().join("q1.queries_results");
        std::fs::create_dir_all(&test_dir).map_err(|err| format!("mkdir failed: {}", err))?;
        let leftover = test_dir.join("old-report.png");
        std::fs::write(&leftover, "old").map_err(|err| format!("write failed: {}", err))?;

        let mut plan = harness.plan(pattern);
        plan.purge = purge;
        harness
            .orchestrator(plan)
            .run()
            .await
            .map_err(|err| format!("run failed: {}", err))?;

        if leftover.exists() == purge {
            return Err(format!("purge={} left leftover={}", purge, leftover.exists()));
        }
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn sinks_receive_the_run_after_every_test() -> Result<(), String> {
    let mut harness = Harness::new()?;
    let recording = RecordingSink::default();
    let save_dir = harness.root().join("saved");
    harness.sinks = vec![
        Box::new(recording.clone()),
        Box::new(JsonRunWriter::new(save_dir.clone())),
    ];
    let pattern = harness.queries(&["b.queries", "a.queries"])?;

    let plan = harness.plan(pattern);
    let run = harness
        .orchestrator(plan)
        .run()
        .await
        .map_err(|err| format!("run failed: {}", err))?;

    let names: Vec<&str> = run.tests().iter().map(|record| record.case.name()).collect();
    if names != ["a.queries", "b.queries"] {
        return Err(format!("Unexpected order: {:?}", names));
    }
    let seen = recording
        .seen
        .lock()
        .map_err(|_| "sink mutex poisoned".to_owned())?
        .clone();
    if seen != [1, 2] {
        return Err(format!("Unexpected publications: {:?}", seen));
    }
    let content = std::fs::read_to_string(save_dir.join(RUN_SUMMARY_FILE))
        .map_err(|err| format!("read failed: {}", err))?;
    let saved: serde_json::Value =
        serde_json::from_str(&content).map_err(|err| format!("parse failed: {}", err))?;
    let tests = saved
        .get("tests")
        .and_then(serde_json::Value::as_array)
        .ok_or("Saved run has no tests")?;
    if tests.len() != 2 {
        return Err(format!("Unexpected saved tests: {}", tests.len()));
    }
    Ok(())
}

#[cfg(unix)]
#[tokio::test(flavor = "current_thread")]
async fn update_command_runs_before_discovery() -> Result<(), String> {
    let mut harness = Harness::new()?;
    let pattern = harness.queries(&["q1.queries"])?;
    let mut plan = harness.plan(pattern);
    plan.update_command = Some("echo rebuilt-index".to_owned());
    harness
        .orchestrator(plan)
        .run()
        .await
        .map_err(|err| format!("run failed: {}", err))?;

    let log = std::fs::read_to_string(harness.root().join(UPDATE_LOG_FILE))
        .map_err(|err| format!("read failed: {}", err))?;
    if !log.contains("rebuilt-index") {
        return Err(format!("Unexpected update log: {}", log));
    }
    Ok(())
}

#[cfg(unix)]
#[tokio::test(flavor = "current_thread")]
async fn failing_update_command_aborts_before_discovery() -> Result<(), String> {
    let mut harness = Harness::new()?;
    let pattern = harness.queries(&["q1.queries"])?;
    let mut plan = harness.plan(pattern);
    plan.update_command = Some("echo compile error >&2; exit 3".to_owned());

    let mut orchestrator = harness.orchestrator(plan);
    match orchestrator.run().await {
        Err(AppError::Process(ProcessError::Exit { code: Some(3), .. })) => {}
        Err(err) => return Err(format!("Unexpected error: {}", err)),
        Ok(_) => return Err("Expected update failure".to_owned()),
    }
    if orchestrator.history().contains(&RunState::Discovering) {
        return Err("Discovery must not start".to_owned());
    }
    if harness.lock_path().exists() {
        return Err("Lock file must be removed".to_owned());
    }
    Ok(())
}
