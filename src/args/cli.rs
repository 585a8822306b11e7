use clap::Parser;
use std::time::Duration;

use super::parsers::{parse_duration_arg, parse_property};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Runs JMeter query benchmarks against a Solr server, capturing server counters before and after every test and deriving the JMeter plugin reports.",
    next_help_heading = "Advanced Options"
)]
pub struct BenchArgs {
    /// Query files to run in order (disables pattern discovery)
    #[arg(value_name = "TESTS", help_heading = "Common Options")]
    pub tests: Vec<String>,

    /// Installation directory; results go to <install-dir>/searchbench
    #[arg(long = "install-dir", env = "SEARCHBENCH_INSTDIR")]
    pub install_dir: Option<String>,

    /// JMeter test plan (.jmx)
    #[arg(long = "jmx-test", short = 'x', help_heading = "Common Options")]
    pub jmx_test: Option<String>,

    /// JMeter executable (defaults to the first jmeter on PATH)
    #[arg(long)]
    pub jmeter: Option<String>,

    /// Java executable used to run the report tool
    #[arg(long, short = 'J', default_value = "java")]
    pub java: String,

    /// JMeter plugins CMDRunner.jar (defaults to <jmeter>/../../lib/ext/CMDRunner.jar)
    #[arg(long = "cmd-runner-jar")]
    pub cmd_runner_jar: Option<String>,

    /// Directory of *.queries files, or a glob matching query files
    #[arg(long = "queries-pattern", short = 'p', help_heading = "Common Options")]
    pub queries_pattern: Option<String>,

    /// Shell command run in the work root before discovery
    #[arg(long = "update-command", short = 'u')]
    pub update_command: Option<String>,

    /// Directory receiving benchmark-run.json after every test
    #[arg(long, short = 's')]
    pub save: Option<String>,

    /// Remove previous results of a test before running it
    #[arg(long, short = 'P')]
    pub purge: bool,

    /// Solr host name
    #[arg(
        long = "server-name",
        short = 'e',
        default_value = "localhost",
        help_heading = "Common Options"
    )]
    pub server_name: String,

    /// Solr port
    #[arg(long = "server-port", short = 'o', help_heading = "Common Options")]
    pub server_port: Option<u16>,

    /// Solr base URL (defaults to http://<server-name>:<server-port>/solr)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Test duration in seconds (durationInSecs)
    #[arg(long = "duration", short = 'i', default_value_t = 5)]
    pub duration_secs: u64,

    /// Ramp-up period in seconds (rampUpInSecs)
    #[arg(long = "ramp-up", short = 'r', default_value_t = 0)]
    pub ramp_up_secs: u64,

    /// Number of concurrent users (noOfUsers)
    #[arg(long = "users", short = 'U', default_value_t = 0)]
    pub users: u64,

    /// Extra JMeter property in 'KEY=VALUE' format (repeatable)
    #[arg(long = "property", short = 'D', value_parser = parse_property)]
    pub properties: Vec<(String, String)>,

    /// Timeout for each Solr introspection request (e.g. 500ms, 30s)
    #[arg(long = "request-timeout", default_value = "30s", value_parser = parse_duration_arg)]
    pub request_timeout: Duration,

    /// Enable verbose logging (sets log level to debug unless overridden by SEARCHBENCH_LOG/RUST_LOG)
    #[arg(long, short = 'v', help_heading = "Common Options")]
    pub verbose: bool,

    /// Path to config file (TOML/JSON). Defaults to ./searchbench.toml or ./searchbench.json if present.
    #[arg(long, help_heading = "Common Options")]
    pub config: Option<String>,
}
