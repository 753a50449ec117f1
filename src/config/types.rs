use std::time::Duration;

use serde::Deserialize;

use crate::args::StoreKind;
use crate::error::ConfigError;

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(alias = "backend")]
    pub backend_url: Option<String>,
    pub refresh_interval: Option<DurationValue>,
    pub startup_interval: Option<DurationValue>,
    pub startup_max_attempts: Option<u32>,
    pub request_timeout: Option<DurationValue>,
    pub store: Option<StoreKind>,
    pub store_path: Option<String>,
    pub charts_path: Option<String>,
    pub no_color: Option<bool>,
    pub verbose: Option<bool>,
}

/// Plan file passed to `start --plan`.
#[derive(Debug, Default, Deserialize)]
pub struct PlanFile {
    pub name: String,
    #[serde(default)]
    pub stages: Vec<PlanStageConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlanStageConfig {
    pub requests: Option<u64>,
    pub duration: Option<DurationValue>,
    #[serde(alias = "users")]
    pub concurrent_users: Option<u64>,
    /// Whole seconds.
    pub ramp_up_period: Option<u64>,
    pub min_wait: Option<DurationValue>,
    pub max_wait: Option<DurationValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ConfigError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ConfigError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => super::parse_duration_value(text),
        }
    }

    /// Stage waits, where zero is a valid value.
    pub(crate) fn to_wait(&self) -> Result<Duration, ConfigError> {
        match self {
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => super::parse_wait_value(text),
        }
    }
}
