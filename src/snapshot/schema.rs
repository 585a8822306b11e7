//! The flat snapshot schema.
//!
//! Every field is declared once here with the response it comes from and
//! its path inside that response. Field names are the keys of the
//! serialized artifacts.
use std::sync::OnceLock;

use serde_json::Value;

use crate::error::SnapshotError;

use super::beans::BeanCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Source {
    /// `/admin/system`
    System,
    /// `status.<defaultCoreName>` of `/admin/cores`
    CoreStatus,
    /// Payload of one category in `/admin/mbeans`
    Bean(BeanCategory),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    /// Copied as parsed.
    Value,
    /// A list of strings joined by single spaces.
    JoinedStrings,
}

#[derive(Debug)]
pub(crate) struct FieldSpec {
    pub(crate) name: String,
    pub(crate) source: Source,
    pub(crate) path: Vec<&'static str>,
    pub(crate) shape: Shape,
}

impl FieldSpec {
    pub(crate) fn extract(&'static self, root: &Value) -> Result<Value, SnapshotError> {
        let value = self
            .path
            .iter()
            .try_fold(root, |node, key| node.get(*key))
            .ok_or_else(|| SnapshotError::MissingField {
                field: self.name.as_str(),
                path: self.path.join("."),
            })?;

        match self.shape {
            Shape::Value => Ok(value.clone()),
            Shape::JoinedStrings => join_strings(value).ok_or_else(|| {
                SnapshotError::NotStringList {
                    field: self.name.as_str(),
                    path: self.path.join("."),
                }
            }),
        }
    }
}

fn join_strings(value: &Value) -> Option<Value> {
    let items = value.as_array()?;
    let parts = items
        .iter()
        .map(Value::as_str)
        .collect::<Option<Vec<_>>>()?;
    Some(Value::String(parts.join(" ")))
}

struct Fixed {
    name: &'static str,
    source: Source,
    path: &'static [&'static str],
    shape: Shape,
}

const fn plain(name: &'static str, source: Source, path: &'static [&'static str]) -> Fixed {
    Fixed {
        name,
        source,
        path,
        shape: Shape::Value,
    }
}

const CORE_BEAN: Source = Source::Bean(BeanCategory::Core);
const HANDLER_BEAN: Source = Source::Bean(BeanCategory::QueryHandler);

const FIXED_FIELDS: &[Fixed] = &[
    plain("host", Source::System, &["core", "host"]),
    plain("now", Source::System, &["core", "now"]),
    plain("start", Source::System, &["core", "start"]),
    plain("jvmVersion", Source::System, &["jvm", "version"]),
    plain("jvmName", Source::System, &["jvm", "name"]),
    plain("jvmProcessors", Source::System, &["jvm", "processors"]),
    plain("jvmFree", Source::System, &["jvm", "memory", "free"]),
    plain("jvmTotal", Source::System, &["jvm", "memory", "total"]),
    plain("jvmMax", Source::System, &["jvm", "memory", "max"]),
    plain("jvmUsed", Source::System, &["jvm", "memory", "used"]),
    plain("jvmUsedRaw", Source::System, &["jvm", "memory", "raw", "used"]),
    Fixed {
        name: "jvmCommandLineArgs",
        source: Source::System,
        path: &["jvm", "jmx", "commandLineArgs"],
        shape: Shape::JoinedStrings,
    },
    plain("systemName", Source::System, &["system", "name"]),
    plain("systemVersion", Source::System, &["system", "version"]),
    plain("systemArch", Source::System, &["system", "arch"]),
    plain("systemLoadAverage", Source::System, &["system", "systemLoadAverage"]),
    plain(
        "systemCommittedVirtualMemorySize",
        Source::System,
        &["system", "committedVirtualMemorySize"],
    ),
    plain(
        "systemFreePhysicalMemorySize",
        Source::System,
        &["system", "freePhysicalMemorySize"],
    ),
    plain(
        "systemFreeSwapSpaceSize",
        Source::System,
        &["system", "freeSwapSpaceSize"],
    ),
    plain("systemProcessCpuTime", Source::System, &["system", "processCpuTime"]),
    plain(
        "systemTotalPhysicalMemorySize",
        Source::System,
        &["system", "totalPhysicalMemorySize"],
    ),
    plain(
        "systemTotalSwapSpaceSize",
        Source::System,
        &["system", "totalSwapSpaceSize"],
    ),
    plain(
        "systemOpenFileDescriptorCount",
        Source::System,
        &["system", "openFileDescriptorCount"],
    ),
    plain(
        "systemMaxFileDescriptorCount",
        Source::System,
        &["system", "maxFileDescriptorCount"],
    ),
    plain("systemUname", Source::System, &["system", "uname"]),
    plain("systemUptime", Source::System, &["system", "uptime"]),
    plain("solrSpecVersion", Source::System, &["lucene", "solr-spec-version"]),
    plain("solrImplVersion", Source::System, &["lucene", "solr-impl-version"]),
    plain("luceneSpecVersion", Source::System, &["lucene", "lucene-spec-version"]),
    plain("luceneImplVersion", Source::System, &["lucene", "lucene-impl-version"]),
    plain("instanceDir", Source::CoreStatus, &["instanceDir"]),
    plain("dataDir", Source::CoreStatus, &["dataDir"]),
    plain("startTime", Source::CoreStatus, &["startTime"]),
    plain("uptime", Source::CoreStatus, &["uptime"]),
    plain("indexNumDocs", Source::CoreStatus, &["index", "numDocs"]),
    plain("indexMaxDoc", Source::CoreStatus, &["index", "maxDoc"]),
    plain("indexVersion", Source::CoreStatus, &["index", "version"]),
    plain("indexSegmentCount", Source::CoreStatus, &["index", "segmentCount"]),
    plain("indexCurrent", Source::CoreStatus, &["index", "current"]),
    plain("indexHasDeletions", Source::CoreStatus, &["index", "hasDeletions"]),
    plain("indexDirectory", Source::CoreStatus, &["index", "directory"]),
    // Downstream consumers key on this exact spelling.
    plain("indexLstModified", Source::CoreStatus, &["index", "lastModified"]),
    plain("indexSizeInBytes", Source::CoreStatus, &["index", "sizeInBytes"]),
    plain("indexSize", Source::CoreStatus, &["index", "size"]),
    plain("coreRefCount", CORE_BEAN, &["core", "stats", "refCount"]),
    plain("searcherClass", CORE_BEAN, &["searcher", "class"]),
    plain("searcherCaching", CORE_BEAN, &["searcher", "stats", "caching"]),
    plain("searcherReader", CORE_BEAN, &["searcher", "stats", "reader"]),
    plain("searcherOpenedAt", CORE_BEAN, &["searcher", "stats", "openedAt"]),
    plain(
        "searcherRegisteredAt",
        CORE_BEAN,
        &["searcher", "stats", "registeredAt"],
    ),
    plain("searcherWarmupTime", CORE_BEAN, &["searcher", "stats", "warmupTime"]),
    plain("selectClass", HANDLER_BEAN, &["/select", "class"]),
    plain("selectVersion", HANDLER_BEAN, &["/select", "version"]),
    plain("selectDescription", HANDLER_BEAN, &["/select", "description"]),
    plain("selectRequests", HANDLER_BEAN, &["/select", "stats", "requests"]),
    plain("selectErrors", HANDLER_BEAN, &["/select", "stats", "errors"]),
    plain("selectTimeouts", HANDLER_BEAN, &["/select", "stats", "timeouts"]),
    plain("selectTotalTime", HANDLER_BEAN, &["/select", "stats", "totalTime"]),
    plain(
        "selectAvgTimePerRequest",
        HANDLER_BEAN,
        &["/select", "stats", "avgTimePerRequest"],
    ),
    plain(
        "selectAvgRequestsPerSecond",
        HANDLER_BEAN,
        &["/select", "stats", "avgRequestsPerSecond"],
    ),
];

/// Counters every searcher cache reports, as (name suffix, path in the cache object).
const CACHE_COUNTERS: &[(&str, &[&str])] = &[
    ("Class", &["class"]),
    ("Version", &["version"]),
    ("Description", &["description"]),
    ("Lookups", &["stats", "lookups"]),
    ("Hits", &["stats", "hits"]),
    ("HitRatio", &["stats", "hitratio"]),
    ("Evictions", &["stats", "evictions"]),
    ("Size", &["stats", "size"]),
    ("WarmupTime", &["stats", "warmupTime"]),
    ("CumulativeLookups", &["stats", "cumulative_lookups"]),
    ("CumulativeHits", &["stats", "cumulative_hits"]),
    ("CumulativeHitRatio", &["stats", "cumulative_hitratio"]),
    ("CumulativeInserts", &["stats", "cumulative_inserts"]),
    ("CumulativeEvictions", &["stats", "cumulative_evictions"]),
];

/// The Lucene field cache only reports how many entries it holds.
const FIELD_CACHE_COUNTERS: &[(&str, &[&str])] = &[
    ("Class", &["class"]),
    ("Version", &["version"]),
    ("Description", &["description"]),
    ("EntriesCount", &["stats", "entries_count"]),
];

/// (name prefix, key in the CACHE payload, counters)
const CACHES: &[(&str, &str, &[(&str, &[&str])])] = &[
    ("Query", "queryResultCache", CACHE_COUNTERS),
    ("Field", "fieldCache", FIELD_CACHE_COUNTERS),
    ("Document", "documentCache", CACHE_COUNTERS),
    ("FieldValue", "fieldValueCache", CACHE_COUNTERS),
    ("Filter", "filterCache", CACHE_COUNTERS),
];

/// All snapshot fields in output order.
pub(crate) fn schema() -> &'static [FieldSpec] {
    static SCHEMA: OnceLock<Vec<FieldSpec>> = OnceLock::new();
    SCHEMA.get_or_init(build_schema).as_slice()
}

fn build_schema() -> Vec<FieldSpec> {
    let mut fields: Vec<FieldSpec> = FIXED_FIELDS
        .iter()
        .map(|fixed| FieldSpec {
            name: fixed.name.to_owned(),
            source: fixed.source,
            path: fixed.path.to_vec(),
            shape: fixed.shape,
        })
        .collect();

    for (prefix, cache_key, counters) in CACHES {
        for (suffix, counter_path) in *counters {
            let mut path = Vec::with_capacity(counter_path.len().saturating_add(1));
            path.push(*cache_key);
            path.extend_from_slice(counter_path);
            fields.push(FieldSpec {
                name: format!("cache{}{}", prefix, suffix),
                source: Source::Bean(BeanCategory::Cache),
                path,
                shape: Shape::Value,
            });
        }
    }

    fields
}
