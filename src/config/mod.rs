//! Configuration loading, merging and validation.
pub(crate) mod apply;
mod loader;
mod settings;
pub mod types;


pub use apply::apply_config;
pub use loader::{DEFAULT_CONFIG_FILES, load_config};
pub use settings::BenchConfig;

#[cfg(test)]
pub(crate) use loader::load_config_file;
