use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{AppError, AppResult};

use super::BenchmarkRun;

/// Receives the run after every completed test.
#[async_trait]
pub trait ResultsSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn publish(&self, run: &BenchmarkRun) -> AppResult<()>;
}

/// File written by [`JsonRunWriter`] into its directory.
pub const RUN_SUMMARY_FILE: &str = "benchmark-run.json";

/// Saves the run as pretty-printed JSON, replacing the previous version.
#[derive(Debug, Clone)]
pub struct JsonRunWriter {
    dir: PathBuf,
}

impl JsonRunWriter {
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl ResultsSink for JsonRunWriter {
    fn name(&self) -> &'static str {
        "save"
    }

    async fn publish(&self, run: &BenchmarkRun) -> AppResult<()> {
        let path = self.dir.join(RUN_SUMMARY_FILE);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| AppError::WriteArtifact {
                path: self.dir.clone(),
                source,
            })?;
        let payload = serde_json::to_vec_pretty(run)?;
        tokio::fs::write(&path, payload)
            .await
            .map_err(|source| AppError::WriteArtifact { path, source })
    }
}
