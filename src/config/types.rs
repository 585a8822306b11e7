use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::args::parsers::parse_duration_arg;
use crate::error::AppResult;

/// On-disk configuration. Every field is optional; command-line values win.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub tests: Option<Vec<String>>,
    pub install_dir: Option<String>,
    pub jmx_test: Option<String>,
    pub jmeter: Option<String>,
    pub java: Option<String>,
    pub cmd_runner_jar: Option<String>,
    pub queries_pattern: Option<String>,
    pub update_command: Option<String>,
    pub save: Option<String>,
    pub purge: Option<bool>,
    pub server_name: Option<String>,
    pub server_port: Option<u16>,
    pub endpoint: Option<String>,
    pub duration: Option<u64>,
    pub ramp_up: Option<u64>,
    pub users: Option<u64>,
    pub properties: Option<BTreeMap<String, PropertyValue>>,
    pub request_timeout: Option<DurationValue>,
    pub verbose: Option<bool>,
}

/// A JMeter property as written in TOML or JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

impl PropertyValue {
    #[must_use]
    pub fn to_property_string(&self) -> String {
        match self {
            PropertyValue::Text(text) => text.clone(),
            PropertyValue::Integer(value) => value.to_string(),
            PropertyValue::Float(value) => value.to_string(),
            PropertyValue::Flag(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> AppResult<Duration> {
        match self {
            DurationValue::Seconds(secs) => parse_duration_arg(&secs.to_string()),
            DurationValue::Text(text) => parse_duration_arg(text),
        }
    }
}
