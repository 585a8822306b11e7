use std::path::PathBuf;
use thiserror::Error;

use super::ProcessError;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Reporter failed: {0}")]
    Process(#[from] ProcessError),
    #[error("Reporter exited cleanly but produced no '{path}'.")]
    MissingOutput { path: PathBuf },
    #[error("Failed to remove previous report '{path}': {source}")]
    StaleOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
