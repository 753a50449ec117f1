use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Plan name must not be empty.")]
    PlanNameEmpty,
    #[error("Plan must contain at least one stage.")]
    PlanStagesEmpty,
    #[error("Stage {index} must set concurrent_users > 0.")]
    StageUsersMissing { index: usize },
    #[error("Stage {index} never ends; only the last stage may omit requests and duration.")]
    StageNeverEnds { index: usize },
    #[error("Stage {index} has min_wait greater than max_wait.")]
    StageWaitRange { index: usize },
    #[error("Invalid duration for '{field}' in stage {index}: {message}")]
    StageDuration {
        index: usize,
        field: &'static str,
        message: String,
    },
}
