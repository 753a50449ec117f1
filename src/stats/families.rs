use crate::exposition::MetricInstance;

use super::types::{Quantile, TargetStatistics};

pub const ATTACKER_LABEL: &str = "attacker";
pub const PLAN_LABEL: &str = "plan";

pub const RESPONSE_TIME: &str = "ultron_attacker_response_time";
pub const RESPONSE_TIME_MIN: &str = "ultron_attacker_response_time_min";
pub const RESPONSE_TIME_MAX: &str = "ultron_attacker_response_time_max";
pub const RESPONSE_TIME_AVG: &str = "ultron_attacker_response_time_avg";
pub const REQUESTS_TOTAL: &str = "ultron_attacker_requests_total";
pub const FAILURES_TOTAL: &str = "ultron_attacker_failures_total";
pub const TPS_CURRENT: &str = "ultron_attacker_tps_current";
pub const TPS_TOTAL: &str = "ultron_attacker_tps_total";
pub const FAILURE_RATIO: &str = "ultron_attacker_failure_ratio";
pub const CURRENT_USERS: &str = "ultron_current_users";
pub const SLAVES: &str = "ultron_slaves";

/// Families reported once for the whole plan rather than per attacker.
pub(super) const GLOBAL_FAMILIES: [&str; 2] = [CURRENT_USERS, SLAVES];

/// A per-attacker family and the fields it fills.
pub(super) struct TargetFamily {
    pub(super) name: &'static str,
    pub(super) apply: fn(&MetricInstance, &mut TargetStatistics),
}

/// Applied in order; the min/max gauges come after the summary so they only
/// fill quantiles the summary did not export.
pub(super) const TARGET_FAMILIES: [TargetFamily; 9] = [
    TargetFamily {
        name: RESPONSE_TIME,
        apply: apply_quantiles,
    },
    TargetFamily {
        name: RESPONSE_TIME_MIN,
        apply: apply_min,
    },
    TargetFamily {
        name: RESPONSE_TIME_MAX,
        apply: apply_max,
    },
    TargetFamily {
        name: RESPONSE_TIME_AVG,
        apply: apply_avg,
    },
    TargetFamily {
        name: REQUESTS_TOTAL,
        apply: apply_requests,
    },
    TargetFamily {
        name: FAILURES_TOTAL,
        apply: apply_failures,
    },
    TargetFamily {
        name: TPS_CURRENT,
        apply: apply_tps_current,
    },
    TargetFamily {
        name: TPS_TOTAL,
        apply: apply_tps_total,
    },
    TargetFamily {
        name: FAILURE_RATIO,
        apply: apply_failure_ratio,
    },
];

pub(super) fn is_known_family(name: &str) -> bool {
    GLOBAL_FAMILIES.contains(&name) || TARGET_FAMILIES.iter().any(|family| family.name == name)
}

/// Converts a gauge reading into a count. Negative and non-finite readings
/// are treated as missing.
pub(super) fn to_count(value: f64) -> Option<u64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(value.round() as u64)
}

fn apply_quantiles(instance: &MetricInstance, stats: &mut TargetStatistics) {
    for quantile in Quantile::ALL {
        if let Some(value) = instance.quantile(quantile.level()) {
            *stats.quantile_mut(quantile) = Some(value);
        }
    }
    if stats.plan.is_none() {
        stats.plan = instance.label(PLAN_LABEL).map(str::to_owned);
    }
}

fn apply_min(instance: &MetricInstance, stats: &mut TargetStatistics) {
    if stats.min.is_none() {
        stats.min = instance.value;
    }
}

fn apply_max(instance: &MetricInstance, stats: &mut TargetStatistics) {
    if stats.max.is_none() {
        stats.max = instance.value;
    }
}

fn apply_avg(instance: &MetricInstance, stats: &mut TargetStatistics) {
    stats.avg = instance.value;
    if stats.attacker.is_empty() {
        if let Some(attacker) = instance.label(ATTACKER_LABEL) {
            attacker.clone_into(&mut stats.attacker);
        }
    }
}

fn apply_requests(instance: &MetricInstance, stats: &mut TargetStatistics) {
    stats.requests = instance.value.and_then(to_count);
}

fn apply_failures(instance: &MetricInstance, stats: &mut TargetStatistics) {
    stats.failures = instance.value.and_then(to_count);
}

fn apply_tps_current(instance: &MetricInstance, stats: &mut TargetStatistics) {
    stats.tps_current = instance.value;
}

fn apply_tps_total(instance: &MetricInstance, stats: &mut TargetStatistics) {
    stats.tps_total = instance.value;
}

fn apply_failure_ratio(instance: &MetricInstance, stats: &mut TargetStatistics) {
    stats.failure_ratio = instance
        .value
        .filter(|value| value.is_finite())
        .map(|value| value.clamp(0.0, 1.0));
}
