//! Child-process helpers shared by the load generator, the reporter and the
//! update hook.
//!
//! Children are spawned with `kill_on_drop`, so dropping the returned future
//! (for example from a supervising timeout) kills the process.
use std::path::Path;
use std::process::{Output, Stdio};

use tokio::process::Command;

use crate::error::ProcessError;

/// Number of stderr lines kept in a [`ProcessError::Exit`].
const STDERR_TAIL_LINES: usize = 20;

/// Runs `command` to completion with captured output.
///
/// # Errors
///
/// Returns an error when the program cannot be spawned or exits non-zero.
pub(crate) async fn run_captured(
    mut command: Command,
    program: &str,
) -> Result<Output, ProcessError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    tracing::debug!("Running {:?}", command.as_std());

    let output = command
        .output()
        .await
        .map_err(|source| ProcessError::Spawn {
            program: program.to_owned(),
            source,
        })?;

    if !output.status.success() {
        return Err(ProcessError::Exit {
            program: program.to_owned(),
            code: output.status.code(),
            stderr_tail: tail_lines(&String::from_utf8_lossy(&output.stderr)),
        });
    }
    Ok(output)
}

/// Runs a shell command with stdout and stderr written to `log_path`.
///
/// # Errors
///
/// Returns an error when the log cannot be opened, the shell cannot be
/// spawned, or the command exits non-zero.
pub(crate) async fn run_shell_logged(
    script: &str,
    cwd: &Path,
    log_path: &Path,
) -> Result<(), ProcessError> {
    const SHELL: &str = "sh";
    let log_error = |source| ProcessError::Log {
        program: SHELL.to_owned(),
        path: log_path.to_path_buf(),
        source,
    };
    let stdout = std::fs::File::create(log_path).map_err(log_error)?;
    let stderr = stdout.try_clone().map_err(log_error)?;

    let mut command = Command::new(SHELL);
    command
        .arg("-c")
        .arg(script)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .kill_on_drop(true);

    let status = command
        .status()
        .await
        .map_err(|source| ProcessError::Spawn {
            program: SHELL.to_owned(),
            source,
        })?;
    if status.success() {
        return Ok(());
    }

    let logged = tokio::fs::read_to_string(log_path)
        .await
        .unwrap_or_default();
    Err(ProcessError::Exit {
        program: format!("{} -c {:?}", SHELL, script),
        code: status.code(),
        stderr_tail: tail_lines(&logged),
    })
}

fn tail_lines(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let skip = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines.into_iter().skip(skip).collect::<Vec<_>>().join("\n")
}
