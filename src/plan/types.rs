use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Plan submitted to `POST /api/v1/plan`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub name: String,
    pub stages: Vec<PlanStage>,
}

/// One stage of a plan. Durations and waits travel as integer nanoseconds;
/// `ramp_up_period` is whole seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrent_users: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ramp_up_period: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_wait: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wait: Option<u64>,
}

impl PlanStage {
    /// A stage ends once it has sent `requests` or run for `duration`.
    #[must_use]
    pub const fn has_exit_condition(&self) -> bool {
        matches!(self.requests, Some(requests) if requests > 0)
            || matches!(self.duration, Some(duration) if duration > 0)
    }
}

/// Reply of the plan endpoints. A missing `result` means the request failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanResponse {
    #[serde(default)]
    pub result: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl PlanResponse {
    #[must_use]
    pub fn message(&self) -> &str {
        self.error_message.as_deref().unwrap_or("no reason given")
    }
}

/// Encodes a duration the way the backend decodes it.
#[must_use]
pub fn duration_to_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
