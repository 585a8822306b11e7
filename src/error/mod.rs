mod app;
mod config;
mod discovery;
mod lock;
mod process;
mod report;
mod snapshot;
mod validation;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use discovery::DiscoveryError;
pub use lock::LockError;
pub use process::ProcessError;
pub use report::ReportError;
pub use snapshot::SnapshotError;
pub use validation::ValidationError;
