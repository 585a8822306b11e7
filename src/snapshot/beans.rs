//! The mbeans response lists categories as `[label, payload, label, payload, ...]`.
//! It is re-read here as explicit (label, payload) pairs.
use serde_json::Value;

use crate::error::SnapshotError;

const BEANS_KEY: &str = "solr-mbeans";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BeanCategory {
    Core,
    QueryHandler,
    Cache,
}

impl BeanCategory {
    #[must_use]
    pub(crate) const fn label(self) -> &'static str {
        match self {
            BeanCategory::Core => "CORE",
            BeanCategory::QueryHandler => "QUERYHANDLER",
            BeanCategory::Cache => "CACHE",
        }
    }
}

#[derive(Debug)]
pub(crate) struct BeanCategories<'resp> {
    entries: Vec<(&'resp str, &'resp Value)>,
}

impl<'resp> BeanCategories<'resp> {
    pub(crate) fn parse(response: &'resp Value) -> Result<Self, SnapshotError> {
        let list = response
            .get(BEANS_KEY)
            .and_then(Value::as_array)
            .ok_or(SnapshotError::MalformedBeans {
                reason: "missing solr-mbeans list",
            })?;

        let mut entries = Vec::new();
        for pair in list.chunks(2) {
            match pair {
                [label, payload] => {
                    let label = label.as_str().ok_or(SnapshotError::MalformedBeans {
                        reason: "category label is not a string",
                    })?;
                    entries.push((label, payload));
                }
                _ => {
                    return Err(SnapshotError::MalformedBeans {
                        reason: "category label without payload",
                    });
                }
            }
        }
        Ok(Self { entries })
    }

    pub(crate) fn find(&self, label: &str) -> Option<&'resp Value> {
        self.entries
            .iter()
            .find(|(name, _)| *name == label)
            .map(|(_, payload)| *payload)
    }

    pub(crate) fn require(&self, category: BeanCategory) -> Result<&'resp Value, SnapshotError> {
        self.find(category.label())
            .ok_or_else(|| SnapshotError::CategoryNotFound {
                label: category.label().to_owned(),
            })
    }

    pub(crate) fn labels(&self) -> impl Iterator<Item = &'resp str> + '_ {
        self.entries.iter().map(|(label, _)| *label)
    }
}
