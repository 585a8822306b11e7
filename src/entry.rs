use std::ffi::OsString;
use std::path::Path;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::args::BenchArgs;
use crate::config::{BenchConfig, DEFAULT_CONFIG_FILES};
use crate::error::{AppError, AppResult};
use crate::lock::{LockManager, OsProcessTable};
use crate::orchestrator::{
    BenchmarkRun, Collaborators, JsonRunWriter, Orchestrator, ResultsSink, RunPlan,
};
use crate::report::{CmdRunnerReporter, ReportGenerator};
use crate::runner::{JmeterRunner, LoadGeneratorConfig};
use crate::snapshot::{HttpIntrospection, SnapshotClient};

/// Parses the command line, merges the config file and runs one benchmark.
///
/// # Errors
///
/// Returns the fatal error that stopped the run.
pub fn run() -> AppResult<()> {
    let (mut args, matches) = match parse_args()? {
        Some(parsed) => parsed,
        None => return Ok(()),
    };

    let merged = merge_config(&mut args, &matches);
    crate::logger::init_logging(args.verbose);

    let result = merged.and_then(|()| BenchConfig::from_args(&args)).and_then(|config| {
        config.log_summary();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(run_benchmark(&config))
    });

    match result {
        Ok(run) => {
            tracing::info!(
                "Finished {} test(s) with {} report warning(s)",
                run.tests().len(),
                run.warning_count()
            );
            Ok(())
        }
        Err(err) => {
            if err.is_lock_busy() {
                tracing::error!("Another benchmark run is in progress: {}", err);
            } else {
                tracing::error!("Benchmark run failed: {}", err);
            }
            Err(err)
        }
    }
}

fn parse_args() -> AppResult<Option<(BenchArgs, ArgMatches)>> {
    let mut cmd = BenchArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if should_show_help(&raw_args) {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = cmd.get_matches_from(raw_args);
    let args = BenchArgs::from_arg_matches(&matches)?;
    Ok(Some((args, matches)))
}

fn merge_config(args: &mut BenchArgs, matches: &ArgMatches) -> AppResult<()> {
    if let Some(config) = crate::config::load_config(args.config.as_deref())? {
        crate::config::apply_config(args, matches, &config)?;
    }
    Ok(())
}

/// A bare invocation prints help unless the install dir or a default config
/// file could supply the required settings.
fn should_show_help(raw_args: &[OsString]) -> bool {
    let treat_as_empty =
        matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--");
    if !treat_as_empty {
        return false;
    }

    std::env::var_os("SEARCHBENCH_INSTDIR").is_none()
        && !DEFAULT_CONFIG_FILES
            .iter()
            .any(|path| Path::new(path).exists())
}

async fn run_benchmark(config: &BenchConfig) -> AppResult<BenchmarkRun> {
    tokio::fs::create_dir_all(&config.work_root)
        .await
        .map_err(|source| AppError::PrepareWorkDir {
            path: config.work_root.clone(),
            source,
        })?;

    let introspection = HttpIntrospection::new(&config.endpoint, config.request_timeout)?;
    let generator = JmeterRunner::new(LoadGeneratorConfig {
        jmeter: config.jmeter.clone(),
        jmx_test: config.jmx_test.clone(),
        properties: config.passthrough_properties.clone(),
    });
    let reporter = CmdRunnerReporter::new(config.java.clone(), config.cmd_runner_jar.clone());
    let mut sinks: Vec<Box<dyn ResultsSink>> = Vec::new();
    if let Some(dir) = config.save_dir.clone() {
        sinks.push(Box::new(JsonRunWriter::new(dir)));
    }

    let parts = Collaborators {
        lock: LockManager::new(config.lock_path.clone(), Box::new(OsProcessTable)),
        snapshots: SnapshotClient::new(Box::new(introspection)),
        generator: Box::new(generator),
        reports: ReportGenerator::new(Box::new(reporter)),
        sinks,
    };
    let plan = RunPlan {
        work_root: config.work_root.clone(),
        explicit_tests: config.tests.clone(),
        queries_pattern: config.queries_pattern.clone(),
        default_glob: config.default_glob.clone(),
        purge: config.purge,
        update_command: config.update_command.clone(),
    };

    Orchestrator::new(plan, parts).run().await
}
