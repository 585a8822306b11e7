//! Derives the report catalog from a raw results file.
//!
//! Each invocation is independent: a failing report kind is logged and
//! recorded as a warning, the rest still run.
mod catalog;


use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;

use crate::error::ReportError;
use crate::process::run_captured;

pub use catalog::{CATALOG, ReportFormat, ReportKind, ReportRequest, requests};

/// Renders one report into `work_dir/<request.file_name>`.
#[async_trait]
pub trait ReportTool: Send + Sync {
    async fn render(
        &self,
        input: &Path,
        request: &ReportRequest,
        work_dir: &Path,
    ) -> Result<(), ReportError>;
}

/// The JMeter plugins command-line reporter (`CMDRunner.jar --tool Reporter`).
#[derive(Debug, Clone)]
pub struct CmdRunnerReporter {
    java: PathBuf,
    jar: PathBuf,
}

impl CmdRunnerReporter {
    #[must_use]
    pub const fn new(java: PathBuf, jar: PathBuf) -> Self {
        Self { java, jar }
    }

    #[must_use]
    pub fn command_args(&self, input: &Path, request: &ReportRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-jar".into(),
            self.jar.clone().into(),
            "--tool".into(),
            "Reporter".into(),
            "--input-jtl".into(),
            input.into(),
            "--plugin-type".into(),
            request.plugin.into(),
            request.format.flag().into(),
            request.file_name.clone().into(),
        ];
        if let Some(granulation) = request.granulation {
            args.push("--granulation".into());
            args.push(granulation.to_string().into());
        }
        args
    }
}

#[async_trait]
impl ReportTool for CmdRunnerReporter {
    async fn render(
        &self,
        input: &Path,
        request: &ReportRequest,
        work_dir: &Path,
    ) -> Result<(), ReportError> {
        let mut command = Command::new(&self.java);
        command
            .args(self.command_args(input, request))
            .current_dir(work_dir);
        run_captured(command, request.plugin).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportArtifact {
    pub plugin: &'static str,
    pub format: ReportFormat,
    pub granulation: Option<u32>,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportWarning {
    pub plugin: &'static str,
    pub file_name: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportOutcome {
    pub artifacts: Vec<ReportArtifact>,
    pub warnings: Vec<ReportWarning>,
}

pub struct ReportGenerator {
    tool: Box<dyn ReportTool>,
}

impl ReportGenerator {
    #[must_use]
    pub fn new(tool: Box<dyn ReportTool>) -> Self {
        Self { tool }
    }

    /// Runs every catalog invocation against `raw` inside `work_dir`.
    pub async fn generate(&self, raw: &Path, work_dir: &Path) -> ReportOutcome {
        // The reporter runs inside `work_dir`.
        let raw = std::path::absolute(raw).unwrap_or_else(|_| raw.to_path_buf());
        let mut outcome = ReportOutcome::default();
        for request in requests() {
            let path = work_dir.join(&request.file_name);
            let result = match remove_previous_output(&path).await {
                Ok(()) => match self.tool.render(&raw, &request, work_dir).await {
                    Ok(()) if path.is_file() => Ok(()),
                    Ok(()) => Err(ReportError::MissingOutput { path: path.clone() }),
                    Err(err) => Err(err),
                },
                Err(err) => Err(err),
            };
            match result {
                Ok(()) => outcome.artifacts.push(ReportArtifact {
                    plugin: request.plugin,
                    format: request.format,
                    granulation: request.granulation,
                    path,
                }),
                Err(err) => {
                    tracing::warn!("Report {} failed: {}", request.file_name, err);
                    outcome.warnings.push(ReportWarning {
                        plugin: request.plugin,
                        file_name: request.file_name,
                        message: err.to_string(),
                    });
                }
            }
        }
        tracing::info!(
            "Generated {} report(s) in {} ({} failed)",
            outcome.artifacts.len(),
            work_dir.display(),
            outcome.warnings.len()
        );
        outcome
    }
}

/// A report left by an earlier run in a reused directory must not pass for
/// this run's output.
async fn remove_previous_output(path: &Path) -> Result<(), ReportError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!("Removed previous report {}", path.display());
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ReportError::StaleOutput {
            path: path.to_path_buf(),
            source,
        }),
    }
}
