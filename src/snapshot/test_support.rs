use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SnapshotError;

use super::{Endpoint, IntrospectionSource};

pub(crate) const SYSTEM_FIXTURE: &str = include_str!("fixtures/system.json");
pub(crate) const BEANS_FIXTURE: &str = include_str!("fixtures/mbeans.json");
pub(crate) const CORES_FIXTURE: &str = include_str!("fixtures/cores.json");

/// Serves canned introspection documents and counts the requests made.
#[derive(Debug, Clone)]
pub(crate) struct FixtureSource {
    pub(crate) system: Value,
    pub(crate) beans: Value,
    pub(crate) cores: Value,
    pub(crate) fail_after: Option<usize>,
    pub(crate) fetches: Arc<AtomicUsize>,
}

impl FixtureSource {
    pub(crate) fn load() -> Result<Self, String> {
        Ok(Self {
            system: parse(SYSTEM_FIXTURE)?,
            beans: parse(BEANS_FIXTURE)?,
            cores: parse(CORES_FIXTURE)?,
            fail_after: None,
            fetches: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Drops a category label and its payload from the bean list.
    pub(crate) fn without_category(mut self, label: &str) -> Result<Self, String> {
        let list = self
            .beans
            .get_mut("solr-mbeans")
            .and_then(Value::as_array_mut)
            .ok_or("fixture has no solr-mbeans list")?;
        let position = list
            .iter()
            .position(|entry| entry.as_str() == Some(label))
            .ok_or_else(|| format!("fixture has no {} category", label))?;
        list.drain(position..position.saturating_add(2));
        Ok(self)
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

fn parse(content: &str) -> Result<Value, String> {
    serde_json::from_str(content).map_err(|err| format!("fixture parse failed: {}", err))
}

#[async_trait]
impl IntrospectionSource for FixtureSource {
    async fn fetch(&self, endpoint: Endpoint) -> Result<Value, SnapshotError> {
        let seen = self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| seen >= limit) {
            return Err(SnapshotError::Status {
                endpoint: endpoint.path().to_owned(),
                status: 503,
            });
        }
        Ok(match endpoint {
            Endpoint::System => self.system.clone(),
            Endpoint::Beans => self.beans.clone(),
            Endpoint::Cores => self.cores.clone(),
        })
    }
}
