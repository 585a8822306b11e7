use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to {endpoint} returned status {status}.")]
    Status { endpoint: String, status: u16 },
    #[error("Failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to build HTTP client: {source}")]
    BuildClient {
        #[source]
        source: reqwest::Error,
    },
    #[error("Bean category '{label}' not found.")]
    CategoryNotFound { label: String },
    #[error("Malformed bean list: {reason}")]
    MalformedBeans { reason: &'static str },
    #[error("Cores response has no defaultCoreName.")]
    DefaultCoreNameMissing,
    #[error("Default core '{name}' missing from cores status.")]
    DefaultCoreMissing { name: String },
    #[error("Missing field '{field}' at '{path}'.")]
    MissingField { field: &'static str, path: String },
    #[error("Field '{field}' at '{path}' is not a list of strings.")]
    NotStringList { field: &'static str, path: String },
}
