//! Plan payloads exchanged with the backend.
mod types;
mod validation;


pub use types::{PlanRequest, PlanResponse, PlanStage, duration_to_nanos};
pub use validation::validate_plan;
