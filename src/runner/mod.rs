//! Drives the external load generator (JMeter in non-GUI mode) for one test.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;

use crate::discovery::TestCase;
use crate::error::ProcessError;
use crate::process::run_captured;

/// Raw results file the generator writes into the test's working directory.
pub const RAW_RESULTS_FILE: &str = "results.jtl";

#[derive(Debug, Clone)]
pub struct LoadGeneratorConfig {
    pub jmeter: PathBuf,
    pub jmx_test: PathBuf,
    /// Forwarded verbatim as `-D<key>=<value>` overrides.
    pub properties: BTreeMap<String, String>,
}

/// A finished generator run. The artifact outlives the handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunHandle {
    work_dir: PathBuf,
    artifact: PathBuf,
    exit_code: Option<i32>,
}

impl RunHandle {
    #[must_use]
    pub const fn new(work_dir: PathBuf, artifact: PathBuf, exit_code: Option<i32>) -> Self {
        Self {
            work_dir,
            artifact,
            exit_code,
        }
    }

    #[must_use]
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    #[must_use]
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }
}

/// Executes one test case and blocks until the generator exits.
#[async_trait]
pub trait LoadGenerator: Send + Sync {
    async fn run(&self, case: &TestCase, work_dir: &Path) -> Result<RunHandle, ProcessError>;
}

#[derive(Debug, Clone)]
pub struct JmeterRunner {
    config: LoadGeneratorConfig,
}

impl JmeterRunner {
    #[must_use]
    pub const fn new(config: LoadGeneratorConfig) -> Self {
        Self { config }
    }

    /// Arguments passed to the generator for `case` run inside `work_dir`.
    #[must_use]
    pub fn command_args(&self, case: &TestCase, work_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-n".into(),
            "-t".into(),
            self.config.jmx_test.clone().into(),
        ];
        for (key, value) in &self.config.properties {
            args.push(format!("-D{}={}", key, value).into());
        }
        args.push("-l".into());
        args.push(RAW_RESULTS_FILE.into());
        args.push(define("queryFile", &absolute(case.path())));
        args.push(define("baseDir", &absolute(work_dir)));
        args
    }
}

fn define(key: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(format!("-D{}=", key));
    arg.push(path.as_os_str());
    arg
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[async_trait]
impl LoadGenerator for JmeterRunner {
    async fn run(&self, case: &TestCase, work_dir: &Path) -> Result<RunHandle, ProcessError> {
        let artifact = work_dir.join(RAW_RESULTS_FILE);
        // A leftover from an interrupted run must never reach the reporter.
        if let Err(err) = tokio::fs::remove_file(&artifact).await
            && err.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!("Failed to remove stale {}: {}", artifact.display(), err);
        }

        let program = self.config.jmeter.display().to_string();
        let mut command = Command::new(&self.config.jmeter);
        command
            .args(self.command_args(case, work_dir))
            .current_dir(work_dir);

        tracing::info!("Running {} against {}", case.name(), work_dir.display());
        let output = run_captured(command, &program).await?;
        tracing::debug!(
            "{} output:\n{}",
            program,
            String::from_utf8_lossy(&output.stdout)
        );

        Ok(RunHandle::new(
            work_dir.to_path_buf(),
            artifact,
            output.status.code(),
        ))
    }
}
