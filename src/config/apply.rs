use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::BenchArgs;
use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

/// Fills every argument not given on the command line (or through its
/// environment variable) from the config file.
///
/// Config properties are merged under `-D` entries; a key given on the
/// command line, as `-D` or as its typed option, keeps its command-line value.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_config(
    args: &mut BenchArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "tests")
        && let Some(tests) = config.tests.clone()
    {
        args.tests = tests;
    }

    fill_option(matches, "install_dir", &mut args.install_dir, config.install_dir.as_deref());
    fill_option(matches, "jmx_test", &mut args.jmx_test, config.jmx_test.as_deref());
    fill_option(matches, "jmeter", &mut args.jmeter, config.jmeter.as_deref());
    fill_option(
        matches,
        "cmd_runner_jar",
        &mut args.cmd_runner_jar,
        config.cmd_runner_jar.as_deref(),
    );
    fill_option(
        matches,
        "queries_pattern",
        &mut args.queries_pattern,
        config.queries_pattern.as_deref(),
    );
    fill_option(
        matches,
        "update_command",
        &mut args.update_command,
        config.update_command.as_deref(),
    );
    fill_option(matches, "save", &mut args.save, config.save.as_deref());
    fill_option(matches, "endpoint", &mut args.endpoint, config.endpoint.as_deref());

    if !is_cli(matches, "java")
        && let Some(java) = config.java.clone()
    {
        args.java = java;
    }

    if !is_cli(matches, "purge")
        && let Some(purge) = config.purge
    {
        args.purge = purge;
    }

    if !is_cli(matches, "server_name")
        && let Some(server_name) = config.server_name.clone()
    {
        args.server_name = server_name;
    }

    if !is_cli(matches, "server_port")
        && let Some(port) = config.server_port
    {
        args.server_port = Some(port);
    }

    if !is_cli(matches, "duration_secs")
        && let Some(duration) = config.duration
    {
        args.duration_secs = duration;
    }

    if !is_cli(matches, "ramp_up_secs")
        && let Some(ramp_up) = config.ramp_up
    {
        args.ramp_up_secs = ramp_up;
    }

    if !is_cli(matches, "users")
        && let Some(users) = config.users
    {
        args.users = users;
    }

    if !is_cli(matches, "request_timeout")
        && let Some(timeout) = config.request_timeout.as_ref()
    {
        args.request_timeout = timeout.to_duration()?;
    }

    if !is_cli(matches, "verbose")
        && let Some(verbose) = config.verbose
    {
        args.verbose = verbose;
    }

    if let Some(properties) = config.properties.as_ref() {
        let mut merged = Vec::with_capacity(properties.len().saturating_add(args.properties.len()));
        for (key, value) in properties {
            let key = key.trim();
            if key.is_empty() {
                return Err(AppError::config(ConfigError::InvalidProperty {
                    value: format!("{}={}", key, value.to_property_string()),
                    reason: "property keys must not be empty",
                }));
            }
            if typed_on_cli(matches, key) {
                tracing::warn!(
                    "Ignoring config property {} because its command-line option is set",
                    key
                );
                continue;
            }
            if !args.properties.iter().any(|(cli_key, _)| cli_key == key) {
                merged.push((key.to_owned(), value.to_property_string()));
            }
        }
        merged.append(&mut args.properties);
        args.properties = merged;
    }

    Ok(())
}

fn fill_option(
    matches: &ArgMatches,
    name: &str,
    target: &mut Option<String>,
    value: Option<&str>,
) {
    if !is_cli(matches, name)
        && let Some(value) = value
    {
        *target = Some(value.to_owned());
    }
}

/// Pass-through keys that also have a typed option.
const TYPED_PROPERTIES: [(&str, &str); 5] = [
    ("serverName", "server_name"),
    ("serverPort", "server_port"),
    ("durationInSecs", "duration_secs"),
    ("rampUpInSecs", "ramp_up_secs"),
    ("noOfUsers", "users"),
];

fn typed_on_cli(matches: &ArgMatches, key: &str) -> bool {
    TYPED_PROPERTIES
        .iter()
        .any(|(property, arg)| *property == key && is_cli(matches, arg))
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}
