//! Core library for the `searchbench` CLI.
//!
//! A benchmark run takes a single-instance lock, resolves the query files to
//! run, and for each one snapshots the Solr server's counters, drives JMeter,
//! derives the plugin reports and snapshots the counters again. The building
//! blocks are public so each stage can be driven with its own collaborators;
//! the primary interface remains the `searchbench` binary.
pub mod args;
pub mod config;
pub mod discovery;
pub mod entry;
pub mod error;
pub mod lock;
pub mod orchestrator;
pub mod report;
pub mod runner;
pub mod snapshot;

mod logger;
mod process;
