//! Per-attacker statistics derived from a parsed scrape.
//!
//! The extractor knows the backend's metric names through a fixed lookup
//! table and produces a [`Snapshot`]: one [`TargetStatistics`] per attacker,
//! the chart points for this instant, and the plan run state the scrape
//! implies.
mod extractor;
mod families;
mod types;


pub use extractor::extract;
pub use families::{
    ATTACKER_LABEL, CURRENT_USERS, FAILURE_RATIO, FAILURES_TOTAL, PLAN_LABEL, REQUESTS_TOTAL,
    RESPONSE_TIME, RESPONSE_TIME_AVG, RESPONSE_TIME_MAX, RESPONSE_TIME_MIN, SLAVES, TPS_CURRENT,
    TPS_TOTAL,
};
pub use types::{PlanRunState, Quantile, SeriesPoint, Snapshot, TargetStatistics};
