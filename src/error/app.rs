use thiserror::Error;

use super::{
    ConfigError, DiscoveryError, LockError, ProcessError, SnapshotError, ValidationError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("CLI error: {source}")]
    Clap {
        #[from]
        source: clap::Error,
    },
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Lock error: {0}")]
    Lock(#[from] LockError),
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),
    #[error("Failed to write {path}: {source}")]
    WriteArtifact {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to prepare working directory {path}: {source}")]
    PrepareWorkDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation<E>(error: E) -> Self
    where
        E: Into<ValidationError>,
    {
        error.into().into()
    }

    pub fn config<E>(error: E) -> Self
    where
        E: Into<ConfigError>,
    {
        error.into().into()
    }

    /// True when another live run holds the install lock.
    #[must_use]
    pub const fn is_lock_busy(&self) -> bool {
        matches!(self, AppError::Lock(LockError::Busy { .. }))
    }
}
