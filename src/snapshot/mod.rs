//! Point-in-time capture of the target server's performance counters.
mod beans;
mod schema;
mod source;

#[cfg(test)]
pub(crate) mod test_support;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::error::SnapshotError;

use beans::{BeanCategories, BeanCategory};
use schema::{Source, schema};

pub use source::{Endpoint, HttpIntrospection, IntrospectionSource};

/// One named value of a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotField {
    pub name: &'static str,
    pub value: Value,
}

/// A flat, complete record of server counters.
///
/// Only [`SnapshotClient::capture`] and [`Snapshot::from_responses`] build
/// one, and only when every schema field resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    fields: Vec<SnapshotField>,
}

impl Snapshot {
    /// Assembles a snapshot from the three introspection documents.
    ///
    /// # Errors
    ///
    /// Fails as a whole when a bean category, the default core, or any
    /// schema field is missing.
    pub fn from_responses(
        system: &Value,
        beans: &Value,
        cores: &Value,
    ) -> Result<Self, SnapshotError> {
        let categories = BeanCategories::parse(beans)?;
        tracing::debug!(
            "mbeans categories: {}",
            categories.labels().collect::<Vec<_>>().join(",")
        );
        let core_bean = categories.require(BeanCategory::Core)?;
        let handler_bean = categories.require(BeanCategory::QueryHandler)?;
        let cache_bean = categories.require(BeanCategory::Cache)?;
        let core_status = default_core_status(cores)?;

        let mut fields = Vec::with_capacity(schema().len());
        for spec in schema() {
            let root = match spec.source {
                Source::System => system,
                Source::CoreStatus => core_status,
                Source::Bean(BeanCategory::Core) => core_bean,
                Source::Bean(BeanCategory::QueryHandler) => handler_bean,
                Source::Bean(BeanCategory::Cache) => cache_bean,
            };
            fields.push(SnapshotField {
                name: spec.name.as_str(),
                value: spec.extract(root)?,
            });
        }
        Ok(Self { fields })
    }

    /// Number of fields every complete snapshot carries.
    #[must_use]
    pub fn schema_len() -> usize {
        schema().len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SnapshotField> {
        self.fields.iter()
    }
}

impl Serialize for Snapshot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(field.name, &field.value)?;
        }
        map.end()
    }
}

fn default_core_status(cores: &Value) -> Result<&Value, SnapshotError> {
    let name = cores
        .get("defaultCoreName")
        .and_then(Value::as_str)
        .ok_or(SnapshotError::DefaultCoreNameMissing)?;
    cores
        .get("status")
        .and_then(|status| status.get(name))
        .ok_or_else(|| SnapshotError::DefaultCoreMissing {
            name: name.to_owned(),
        })
}

/// Captures snapshots from an introspection source.
pub struct SnapshotClient {
    source: Box<dyn IntrospectionSource>,
}

impl SnapshotClient {
    #[must_use]
    pub fn new(source: Box<dyn IntrospectionSource>) -> Self {
        Self { source }
    }

    /// Queries system info, beans and cores, then builds the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error when an endpoint is unreachable or the responses do
    /// not cover the full schema.
    pub async fn capture(&self) -> Result<Snapshot, SnapshotError> {
        let system = self.source.fetch(Endpoint::System).await?;
        let beans = self.source.fetch(Endpoint::Beans).await?;
        let cores = self.source.fetch(Endpoint::Cores).await?;
        Snapshot::from_responses(&system, &beans, &cores)
    }
}
