//! The benchmark pipeline: lock, discover, then snapshot/run/report/snapshot
//! for each test in order, and unlock on every terminal path.
mod run;
mod sink;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::discovery::{self, TestCase, TestSelection};
use crate::error::{AppError, AppResult};
use crate::lock::LockManager;
use crate::process::run_shell_logged;
use crate::report::ReportGenerator;
use crate::runner::LoadGenerator;
use crate::snapshot::SnapshotClient;

pub use run::{BenchmarkRun, TestRecord};
pub use sink::{JsonRunWriter, RUN_SUMMARY_FILE, ResultsSink};

/// Snapshot taken once before any test, written to the work root.
pub const BEFORE_RUN_FILE: &str = "before-test.json";
/// Output of the update command, written to the work root.
pub const UPDATE_LOG_FILE: &str = "running_update_command.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Locked,
    Discovering,
    PreSnapshot,
    PerTest { index: usize },
    PostCollected,
    Unlocked,
    Done,
    Aborted,
}

/// What to run and where.
#[derive(Debug, Clone, Default)]
pub struct RunPlan {
    pub work_root: PathBuf,
    pub explicit_tests: Vec<String>,
    pub queries_pattern: Option<String>,
    pub default_glob: String,
    pub purge: bool,
    pub update_command: Option<String>,
}

/// The collaborators the pipeline drives.
pub struct Collaborators {
    pub lock: LockManager,
    pub snapshots: SnapshotClient,
    pub generator: Box<dyn LoadGenerator>,
    pub reports: ReportGenerator,
    pub sinks: Vec<Box<dyn ResultsSink>>,
}

pub struct Orchestrator {
    plan: RunPlan,
    parts: Collaborators,
    history: Vec<RunState>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(plan: RunPlan, parts: Collaborators) -> Self {
        Self {
            plan,
            parts,
            history: vec![RunState::Idle],
        }
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.history.last().copied().unwrap_or(RunState::Idle)
    }

    /// Every state visited so far, starting with `Idle`.
    #[must_use]
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    fn enter(&mut self, state: RunState) {
        tracing::debug!("Run state: {:?}", state);
        self.history.push(state);
    }

    /// Runs the whole pipeline once.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: busy lock, no tests, snapshot failure,
    /// update command or load generator failure, artifact write failure. The
    /// lock is released before the error is returned whenever it was taken.
    pub async fn run(&mut self) -> AppResult<BenchmarkRun> {
        let token = match self.parts.lock.try_acquire() {
            Ok(token) => token,
            Err(err) => {
                self.enter(RunState::Aborted);
                return Err(err.into());
            }
        };
        self.enter(RunState::Locked);

        let outcome = self.run_locked().await;
        let released = self.parts.lock.release(token);
        if released.is_ok() {
            self.enter(RunState::Unlocked);
        }

        match (outcome, released) {
            (Ok(run), Ok(())) => {
                self.enter(RunState::Done);
                Ok(run)
            }
            (Ok(_), Err(err)) => {
                self.enter(RunState::Aborted);
                Err(err.into())
            }
            (Err(err), released) => {
                if let Err(release_err) = released {
                    tracing::error!("Failed to release lock after abort: {}", release_err);
                }
                self.enter(RunState::Aborted);
                Err(err)
            }
        }
    }

    async fn run_locked(&mut self) -> AppResult<BenchmarkRun> {
        if let Some(script) = self.plan.update_command.clone() {
            tracing::info!("Running update command: {}", script);
            let log_path = self.plan.work_root.join(UPDATE_LOG_FILE);
            run_shell_logged(&script, &self.plan.work_root, &log_path).await?;
        }

        self.enter(RunState::Discovering);
        let cases = discovery::resolve(TestSelection {
            explicit: &self.plan.explicit_tests,
            pattern: self.plan.queries_pattern.as_deref(),
            default_glob: &self.plan.default_glob,
        })?;

        self.enter(RunState::PreSnapshot);
        let before = self.parts.snapshots.capture().await?;
        write_json(&self.plan.work_root.join(BEFORE_RUN_FILE), &before).await?;

        let mut run = BenchmarkRun::new(before);
        let total = cases.len();
        for (index, case) in cases.into_iter().enumerate() {
            self.enter(RunState::PerTest { index });
            tracing::info!(
                "Test {}/{}: {}",
                index.saturating_add(1),
                total,
                case.path().display()
            );
            let record = self.run_test(case).await?;
            run.push(record);
            for sink in &self.parts.sinks {
                sink.publish(&run).await?;
                tracing::debug!("Published run to {} sink", sink.name());
            }
        }

        self.enter(RunState::PostCollected);
        Ok(run)
    }

    async fn run_test(&self, case: TestCase) -> AppResult<TestRecord> {
        let work_dir = self.plan.work_root.join(case.results_dir_name());
        prepare_work_dir(&work_dir, self.plan.purge).await?;

        let pre = self.parts.snapshots.capture().await?;
        write_json(&work_dir.join(format!("before-test-{}.json", case.name())), &pre).await?;

        let handle = self.parts.generator.run(&case, &work_dir).await?;
        let reports = self
            .parts
            .reports
            .generate(handle.artifact(), &work_dir)
            .await;

        let post = self.parts.snapshots.capture().await?;
        write_json(&work_dir.join(format!("after-test-{}.json", case.name())), &post).await?;

        Ok(TestRecord {
            case,
            pre,
            handle,
            reports,
            post,
        })
    }
}

async fn prepare_work_dir(work_dir: &Path, purge: bool) -> AppResult<()> {
    let prepare_error = |source| AppError::PrepareWorkDir {
        path: work_dir.to_path_buf(),
        source,
    };
    if purge && tokio::fs::try_exists(work_dir).await.map_err(prepare_error)? {
        tracing::info!("Purging {}", work_dir.display());
        tokio::fs::remove_dir_all(work_dir)
            .await
            .map_err(prepare_error)?;
    }
    tokio::fs::create_dir_all(work_dir)
        .await
        .map_err(prepare_error)
}

async fn write_json<T>(path: &Path, value: &T) -> AppResult<()>
where
    T: Serialize + Sync,
{
    let payload = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, payload)
        .await
        .map_err(|source| AppError::WriteArtifact {
            path: path.to_path_buf(),
            source,
        })
}
