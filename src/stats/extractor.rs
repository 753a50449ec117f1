use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::exposition::{MetricFamily, MetricInstance};

use super::families::{
    ATTACKER_LABEL, CURRENT_USERS, PLAN_LABEL, RESPONSE_TIME, SLAVES, TARGET_FAMILIES,
    is_known_family, to_count,
};
use super::types::{PlanRunState, Quantile, SeriesPoint, Snapshot, TargetStatistics};

/// Derives per-attacker statistics, chart points and the plan run state from
/// one parsed scrape.
///
/// Every summary instance of the latency family is one target. A scrape
/// without that family (or with an empty one) means nothing is running.
#[must_use]
pub fn extract(families: &[MetricFamily], now: DateTime<Utc>) -> Snapshot {
    let by_name = index_families(families);

    let Some(summary) = by_name.get(RESPONSE_TIME) else {
        debug!("No latency summary in scrape; treating plan as ended.");
        return Snapshot::ended(now);
    };

    for family in families {
        if family.name != RESPONSE_TIME && !is_known_family(&family.name) {
            trace!("Skipping unrecognized family {}", family.name);
        }
    }

    let users = global_value(&by_name, CURRENT_USERS).and_then(to_count);
    let slaves = global_value(&by_name, SLAVES).and_then(to_count);

    let mut seen = HashSet::new();
    let mut stats = Vec::with_capacity(summary.instances.len());
    for (index, target) in summary.instances.iter().enumerate() {
        let record = build_target(&by_name, target, index, users);
        if record.attacker.is_empty() {
            debug!("Dropping latency instance {} without an attacker name", index);
            continue;
        }
        if !seen.insert(record.attacker.clone()) {
            debug!("Ignoring repeated attacker {}", record.attacker);
            continue;
        }
        stats.push(record);
    }

    let run_state = derive_run_state(&stats);
    let plan = stats
        .iter()
        .find_map(|record| record.plan.clone())
        .or_else(|| global_label(&by_name, CURRENT_USERS, PLAN_LABEL));

    let mut latency_points = Vec::new();
    let mut throughput_points = Vec::new();
    for record in &stats {
        push_points(record, now, &mut latency_points, &mut throughput_points);
    }

    Snapshot {
        taken_at: now,
        stats,
        latency_points,
        throughput_points,
        run_state,
        users,
        slaves,
        plan,
    }
}

/// Run state is derived from this scrape alone: live throughput means the
/// plan is running, overall throughput means it has finished.
fn derive_run_state(stats: &[TargetStatistics]) -> PlanRunState {
    if stats.iter().any(|record| record.tps_current.is_some()) {
        PlanRunState::Running
    } else if stats.iter().any(|record| record.tps_total.is_some()) {
        PlanRunState::Ended
    } else {
        PlanRunState::Starting
    }
}

fn index_families(families: &[MetricFamily]) -> HashMap<&str, &MetricFamily> {
    let mut by_name = HashMap::with_capacity(families.len());
    for family in families.iter().filter(|family| !family.is_empty()) {
        by_name.entry(family.name.as_str()).or_insert(family);
    }
    by_name
}

fn build_target(
    by_name: &HashMap<&str, &MetricFamily>,
    target: &MetricInstance,
    index: usize,
    users: Option<u64>,
) -> TargetStatistics {
    let mut record = TargetStatistics {
        attacker: target.label(ATTACKER_LABEL).unwrap_or_default().to_owned(),
        users,
        ..TargetStatistics::default()
    };
    for family in &TARGET_FAMILIES {
        let Some(source) = by_name.get(family.name) else {
            continue;
        };
        if let Some(instance) = joined_instance(source, target, index) {
            (family.apply)(instance, &mut record);
        }
    }
    record
}

/// Finds the instance of `family` describing the same target: identical
/// labels first, then the same attacker, then (for unlabelled targets) the
/// same position.
fn joined_instance<'family>(
    family: &'family MetricFamily,
    target: &MetricInstance,
    index: usize,
) -> Option<&'family MetricInstance> {
    if let Some(instance) = family.instance_with_labels(&target.labels) {
        return Some(instance);
    }
    match target.label(ATTACKER_LABEL) {
        Some(attacker) => family
            .instances
            .iter()
            .find(|instance| instance.label(ATTACKER_LABEL) == Some(attacker)),
        None => family.instances.get(index),
    }
}

fn global_value(by_name: &HashMap<&str, &MetricFamily>, name: &str) -> Option<f64> {
    by_name
        .get(name)?
        .instances
        .iter()
        .find_map(|instance| instance.value)
}

fn global_label(
    by_name: &HashMap<&str, &MetricFamily>,
    name: &str,
    label: &str,
) -> Option<String> {
    by_name
        .get(name)?
        .instances
        .iter()
        .find_map(|instance| instance.label(label).map(str::to_owned))
}

fn push_points(
    record: &TargetStatistics,
    now: DateTime<Utc>,
    latency: &mut Vec<SeriesPoint>,
    throughput: &mut Vec<SeriesPoint>,
) {
    for quantile in Quantile::CHARTED {
        if let Some(value) = record.quantile(quantile) {
            latency.push(SeriesPoint::new(
                now,
                value,
                format!("{}_{}", record.attacker, quantile.percent_label()),
            ));
        }
    }
    if let Some(tps) = record.tps_current {
        throughput.push(SeriesPoint::new(
            now,
            tps,
            format!("{}_TPS", record.attacker),
        ));
    }
    if let Some(ratio) = record.failure_ratio {
        throughput.push(SeriesPoint::new(
            now,
            ratio * 100.0,
            format!("{}_failure ratio", record.attacker),
        ));
    }
}
