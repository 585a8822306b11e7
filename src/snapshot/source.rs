use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::error::SnapshotError;

/// The three introspection endpoints a snapshot is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    System,
    Beans,
    Cores,
}

impl Endpoint {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Endpoint::System => "admin/system",
            Endpoint::Beans => "admin/mbeans",
            Endpoint::Cores => "admin/cores",
        }
    }

    #[must_use]
    pub const fn wants_stats(self) -> bool {
        matches!(self, Endpoint::Beans | Endpoint::Cores)
    }
}

/// Fetches one introspection document from the target server.
#[async_trait]
pub trait IntrospectionSource: Send + Sync {
    async fn fetch(&self, endpoint: Endpoint) -> Result<Value, SnapshotError>;
}

/// Reads introspection documents over HTTP.
#[derive(Debug, Clone)]
pub struct HttpIntrospection {
    client: reqwest::Client,
    base: String,
}

impl HttpIntrospection {
    /// Builds a client for `base` (e.g. `http://host:8983/solr`).
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(base: &Url, request_timeout: Duration) -> Result<Self, SnapshotError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("searchbench/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| SnapshotError::BuildClient { source })?;
        Ok(Self {
            client,
            base: base.as_str().trim_end_matches('/').to_owned(),
        })
    }

    #[must_use]
    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base, endpoint.path())
    }
}

#[async_trait]
impl IntrospectionSource for HttpIntrospection {
    async fn fetch(&self, endpoint: Endpoint) -> Result<Value, SnapshotError> {
        let url = self.endpoint_url(endpoint);
        let mut request = self.client.get(&url).query(&[("wt", "json")]);
        if endpoint.wants_stats() {
            request = request.query(&[("stats", "true")]);
        }

        let response = request
            .send()
            .await
            .map_err(|source| SnapshotError::Request {
                endpoint: url.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(SnapshotError::Status {
                endpoint: url,
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|source| SnapshotError::Decode {
                endpoint: url,
                source,
            })
    }
}
