use std::path::Path;
use std::time::Duration;

use crate::error::{AppResult, ConfigError, ValidationError};
use crate::plan::{PlanRequest, PlanStage, duration_to_nanos};

use super::loader::load_plan_file;
use super::types::{DurationValue, PlanFile, PlanStageConfig};

/// Reads a plan file and converts it into the request sent to the backend.
///
/// # Errors
///
/// Returns an error when the file cannot be loaded or a stage duration is
/// malformed. Semantic checks happen at submission.
pub fn load_plan(path: &Path) -> AppResult<PlanRequest> {
    let file = load_plan_file(path)?;
    Ok(plan_request(file)?)
}

pub(crate) fn plan_request(file: PlanFile) -> Result<PlanRequest, ValidationError> {
    let mut stages = Vec::with_capacity(file.stages.len());
    for (index, stage) in file.stages.iter().enumerate() {
        stages.push(plan_stage(index, stage)?);
    }
    Ok(PlanRequest {
        name: file.name,
        stages,
    })
}

fn plan_stage(index: usize, stage: &PlanStageConfig) -> Result<PlanStage, ValidationError> {
    Ok(PlanStage {
        requests: stage.requests,
        duration: nanos(index, "duration", stage.duration.as_ref(), DurationValue::to_duration)?,
        concurrent_users: stage.concurrent_users,
        ramp_up_period: stage.ramp_up_period,
        min_wait: nanos(index, "min_wait", stage.min_wait.as_ref(), DurationValue::to_wait)?,
        max_wait: nanos(index, "max_wait", stage.max_wait.as_ref(), DurationValue::to_wait)?,
    })
}

fn nanos(
    index: usize,
    field: &'static str,
    value: Option<&DurationValue>,
    convert: fn(&DurationValue) -> Result<Duration, ConfigError>,
) -> Result<Option<u64>, ValidationError> {
    value
        .map(|value| {
            convert(value)
                .map(duration_to_nanos)
                .map_err(|err| ValidationError::StageDuration {
                    index,
                    field,
                    message: err.to_string(),
                })
        })
        .transpose()
}
