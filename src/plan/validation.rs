use crate::error::ValidationError;

use super::types::PlanRequest;

/// Rejects plans the backend would refuse, so mistakes surface before any
/// request is sent.
///
/// # Errors
///
/// Returns the first violated rule.
pub fn validate_plan(plan: &PlanRequest) -> Result<(), ValidationError> {
    if plan.name.trim().is_empty() {
        return Err(ValidationError::PlanNameEmpty);
    }
    if plan.stages.is_empty() {
        return Err(ValidationError::PlanStagesEmpty);
    }
    let last = plan.stages.len().saturating_sub(1);
    for (index, stage) in plan.stages.iter().enumerate() {
        if !matches!(stage.concurrent_users, Some(users) if users > 0) {
            return Err(ValidationError::StageUsersMissing { index });
        }
        if index < last && !stage.has_exit_condition() {
            return Err(ValidationError::StageNeverEnds { index });
        }
        if let (Some(min_wait), Some(max_wait)) = (stage.min_wait, stage.max_wait)
            && min_wait > max_wait
        {
            return Err(ValidationError::StageWaitRange { index });
        }
    }
    Ok(())
}
