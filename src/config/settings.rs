use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::args::BenchArgs;
use crate::error::{AppError, AppResult, ValidationError};

/// Directory under the install dir that holds results, logs and the lock.
pub const WORK_DIR_NAME: &str = "searchbench";
pub const LOCK_FILE_NAME: &str = "update.pid";

const DEFAULT_JMX_TEST: &str = "perpetuum/montysolr/contrib/examples/jmeter/SolrQueryTest.jmx";
const DEFAULT_QUERIES_GLOB: &str = "perpetuum/montysolr/contrib/examples/adsabs/jmeter/*.queries";
const JMETER_BINARY: &str = "jmeter";
const CMD_RUNNER_JAR: &str = "lib/ext/CMDRunner.jar";

/// Validated settings for one benchmark run.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub install_dir: PathBuf,
    pub work_root: PathBuf,
    pub lock_path: PathBuf,
    pub tests: Vec<String>,
    pub queries_pattern: Option<String>,
    pub default_glob: String,
    pub jmx_test: PathBuf,
    pub jmeter: PathBuf,
    pub java: PathBuf,
    pub cmd_runner_jar: PathBuf,
    pub update_command: Option<String>,
    pub save_dir: Option<PathBuf>,
    pub purge: bool,
    pub endpoint: Url,
    pub request_timeout: Duration,
    /// Forwarded to the load generator as `-D<key>=<value>`.
    pub passthrough_properties: BTreeMap<String, String>,
}

impl BenchConfig {
    /// Resolves defaults against the current directory and `PATH`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a missing port, a bad endpoint, a
    /// missing test plan or an unresolvable load generator.
    pub fn from_args(args: &BenchArgs) -> AppResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|source| AppError::validation(ValidationError::CurrentDir { source }))?;
        let search_path = std::env::var_os("PATH");
        Self::resolve(args, &cwd, search_path.as_deref())
    }

    pub(crate) fn resolve(
        args: &BenchArgs,
        cwd: &Path,
        search_path: Option<&OsStr>,
    ) -> AppResult<Self> {
        let install_dir = args
            .install_dir
            .as_deref()
            .map_or_else(|| cwd.to_path_buf(), |dir| cwd.join(dir));
        let work_root = install_dir.join(WORK_DIR_NAME);
        let lock_path = work_root.join(LOCK_FILE_NAME);

        let endpoint = resolve_endpoint(args)?;

        let jmx_test = args
            .jmx_test
            .as_deref()
            .map_or_else(|| install_dir.join(DEFAULT_JMX_TEST), |path| cwd.join(path));
        if !jmx_test.is_file() {
            return Err(AppError::validation(ValidationError::JmxTestMissing {
                path: jmx_test,
            }));
        }

        let jmeter = resolve_jmeter(args.jmeter.as_deref(), cwd, &work_root, search_path)?;
        let cmd_runner_jar = match args.cmd_runner_jar.as_deref() {
            Some(jar) => cwd.join(jar),
            None => default_cmd_runner_jar(&jmeter)?,
        };

        let default_glob = install_dir
            .join(DEFAULT_QUERIES_GLOB)
            .to_string_lossy()
            .into_owned();

        Ok(Self {
            install_dir,
            work_root,
            lock_path,
            tests: args.tests.clone(),
            queries_pattern: args.queries_pattern.clone(),
            default_glob,
            jmx_test,
            jmeter,
            java: PathBuf::from(&args.java),
            cmd_runner_jar,
            update_command: args
                .update_command
                .clone()
                .filter(|command| !command.trim().is_empty()),
            save_dir: args.save.as_deref().map(|dir| cwd.join(dir)),
            purge: args.purge,
            endpoint,
            request_timeout: args.request_timeout,
            passthrough_properties: passthrough_properties(args),
        })
    }

    /// Logs the effective configuration, masking password-like properties.
    pub fn log_summary(&self) {
        tracing::info!("Install dir: {}", self.install_dir.display());
        tracing::info!("Work root: {}", self.work_root.display());
        tracing::info!("Endpoint: {}", self.endpoint);
        tracing::info!("Test plan: {}", self.jmx_test.display());
        tracing::info!("JMeter: {}", self.jmeter.display());
        tracing::info!(
            "Reporter: {} -jar {}",
            self.java.display(),
            self.cmd_runner_jar.display()
        );
        if let Some(pattern) = self.queries_pattern.as_deref() {
            tracing::info!("Queries pattern: {}", pattern);
        }
        if let Some(command) = self.update_command.as_deref() {
            tracing::info!("Update command: {}", command);
        }
        if let Some(dir) = self.save_dir.as_deref() {
            tracing::info!("Saving run summary to {}", dir.display());
        }
        tracing::info!("Purge previous results: {}", self.purge);
        for (key, value) in &self.passthrough_properties {
            tracing::info!("Property {}={}", key, masked(key, value));
        }
    }
}

pub(super) fn masked<'val>(key: &str, value: &'val str) -> &'val str {
    if key.to_ascii_lowercase().contains("password") {
        "******"
    } else {
        value
    }
}

fn resolve_endpoint(args: &BenchArgs) -> AppResult<Url> {
    let raw = match (args.endpoint.as_deref(), args.server_port) {
        (Some(endpoint), _) => endpoint.to_owned(),
        (None, Some(port)) => format!("http://{}:{}/solr", args.server_name, port),
        (None, None) => return Err(AppError::validation(ValidationError::MissingServerPort)),
    };
    let url = Url::parse(&raw).map_err(|source| {
        AppError::validation(ValidationError::InvalidEndpoint {
            value: raw.clone(),
            source,
        })
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::validation(
            ValidationError::UnsupportedEndpointScheme { value: raw },
        ));
    }
    Ok(url)
}

fn resolve_jmeter(
    configured: Option<&str>,
    cwd: &Path,
    work_root: &Path,
    search_path: Option<&OsStr>,
) -> AppResult<PathBuf> {
    if let Some(configured) = configured {
        let path = Path::new(configured);
        if path.components().count() > 1 {
            return Ok(cwd.join(path));
        }
        return find_on_path(configured, search_path)
            .ok_or_else(|| AppError::validation(ValidationError::JmeterNotFound));
    }

    if let Some(found) = find_on_path(JMETER_BINARY, search_path) {
        return Ok(found);
    }
    let bundled = work_root.join("jmeter").join("bin").join(JMETER_BINARY);
    if bundled.is_file() {
        return Ok(bundled);
    }
    Err(AppError::validation(ValidationError::JmeterNotFound))
}

fn find_on_path(name: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let search_path = search_path?;
    std::env::split_paths(search_path)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// `<jmeter>/../../lib/ext/CMDRunner.jar`, i.e. the JMeter home's plugin dir.
fn default_cmd_runner_jar(jmeter: &Path) -> AppResult<PathBuf> {
    jmeter
        .parent()
        .and_then(Path::parent)
        .filter(|home| !home.as_os_str().is_empty())
        .map(|home| home.join(CMD_RUNNER_JAR))
        .ok_or_else(|| {
            AppError::validation(ValidationError::CmdRunnerJarUnresolved {
                path: jmeter.to_path_buf(),
            })
        })
}

fn passthrough_properties(args: &BenchArgs) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    if !args.server_name.is_empty() {
        properties.insert("serverName".to_owned(), args.server_name.clone());
    }
    if let Some(port) = args.server_port.filter(|port| *port != 0) {
        properties.insert("serverPort".to_owned(), port.to_string());
    }
    for (key, value) in [
        ("durationInSecs", args.duration_secs),
        ("rampUpInSecs", args.ramp_up_secs),
        ("noOfUsers", args.users),
    ] {
        if value != 0 {
            properties.insert(key.to_owned(), value.to_string());
        }
    }
    for (key, value) in &args.properties {
        properties.insert(key.clone(), value.clone());
    }
    properties
}
