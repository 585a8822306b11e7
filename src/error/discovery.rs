use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("No test name(s) supplied nor found in: {searched}")]
    NoTestsFound { searched: String },
    #[error("Invalid test pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("Failed to list test directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Test path '{path}' has no file name.")]
    UnnamedTest { path: PathBuf },
}
