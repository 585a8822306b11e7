use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {}: {stderr_tail}", exit_label(.code))]
    Exit {
        program: String,
        code: Option<i32>,
        stderr_tail: String,
    },
    #[error("Failed to open log '{path}' for {program}: {source}")]
    Log {
        program: String,
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_owned(), |code| format!("status {}", code))
}
