use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration must be > 0.")]
    DurationZero,
    #[error("Invalid property '{value}'. Expected 'KEY=VALUE'.")]
    InvalidPropertyFormat { value: String },
    #[error("Property key must not be empty in '{value}'.")]
    PropertyKeyEmpty { value: String },
    #[error("Missing server port (set --server-port, --endpoint, or provide in config).")]
    MissingServerPort,
    #[error("Invalid endpoint '{value}': {source}")]
    InvalidEndpoint {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Endpoint '{value}' must use http or https.")]
    UnsupportedEndpointScheme { value: String },
    #[error("Test plan must point to a valid JMX file, got '{path}'.")]
    JmxTestMissing { path: PathBuf },
    #[error("Cannot find executable jmeter (is $PATH set correctly?).")]
    JmeterNotFound,
    #[error("Cannot derive the reporter jar location from '{path}'.")]
    CmdRunnerJarUnresolved { path: PathBuf },
    #[error("Failed to resolve working directory: {source}")]
    CurrentDir {
        #[source]
        source: std::io::Error,
    },
}
