use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Quantile levels exported by the latency summary, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantile {
    Min,
    P50,
    P60,
    P70,
    P80,
    P90,
    P95,
    P97,
    P98,
    P99,
    Max,
}

impl Quantile {
    pub const ALL: [Quantile; 11] = [
        Quantile::Min,
        Quantile::P50,
        Quantile::P60,
        Quantile::P70,
        Quantile::P80,
        Quantile::P90,
        Quantile::P95,
        Quantile::P97,
        Quantile::P98,
        Quantile::P99,
        Quantile::Max,
    ];

    /// Levels drawn on the latency chart.
    pub const CHARTED: [Quantile; 4] = [Quantile::P50, Quantile::P90, Quantile::P95, Quantile::P99];

    /// Level string exactly as it appears in the `quantile` label.
    #[must_use]
    pub const fn level(self) -> &'static str {
        match self {
            Quantile::Min => "0",
            Quantile::P50 => "0.5",
            Quantile::P60 => "0.6",
            Quantile::P70 => "0.7",
            Quantile::P80 => "0.8",
            Quantile::P90 => "0.9",
            Quantile::P95 => "0.95",
            Quantile::P97 => "0.97",
            Quantile::P98 => "0.98",
            Quantile::P99 => "0.99",
            Quantile::Max => "1",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Quantile::Min => "min",
            Quantile::P50 => "p50",
            Quantile::P60 => "p60",
            Quantile::P70 => "p70",
            Quantile::P80 => "p80",
            Quantile::P90 => "p90",
            Quantile::P95 => "p95",
            Quantile::P97 => "p97",
            Quantile::P98 => "p98",
            Quantile::P99 => "p99",
            Quantile::Max => "max",
        }
    }

    /// Chart category suffix, e.g. `"90% percentile"`.
    #[must_use]
    pub const fn percent_label(self) -> &'static str {
        match self {
            Quantile::Min => "0% percentile",
            Quantile::P50 => "50% percentile",
            Quantile::P60 => "60% percentile",
            Quantile::P70 => "70% percentile",
            Quantile::P80 => "80% percentile",
            Quantile::P90 => "90% percentile",
            Quantile::P95 => "95% percentile",
            Quantile::P97 => "97% percentile",
            Quantile::P98 => "98% percentile",
            Quantile::P99 => "99% percentile",
            Quantile::Max => "100% percentile",
        }
    }
}

/// Lifecycle of the active plan as seen from the metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanRunState {
    #[default]
    NotStarted,
    Starting,
    Running,
    Ended,
}

impl PlanRunState {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            PlanRunState::NotStarted => "not started",
            PlanRunState::Starting => "starting",
            PlanRunState::Running => "running",
            PlanRunState::Ended => "ended",
        }
    }
}

impl fmt::Display for PlanRunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-attacker statistics. Unset fields were not exported by the backend;
/// zero is always a real reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetStatistics {
    pub attacker: String,
    pub plan: Option<String>,
    pub min: Option<f64>,
    pub p50: Option<f64>,
    pub p60: Option<f64>,
    pub p70: Option<f64>,
    pub p80: Option<f64>,
    pub p90: Option<f64>,
    pub p95: Option<f64>,
    pub p97: Option<f64>,
    pub p98: Option<f64>,
    pub p99: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub requests: Option<u64>,
    pub failures: Option<u64>,
    pub users: Option<u64>,
    pub tps_current: Option<f64>,
    pub tps_total: Option<f64>,
    pub failure_ratio: Option<f64>,
}

impl TargetStatistics {
    #[must_use]
    pub const fn quantile(&self, quantile: Quantile) -> Option<f64> {
        match quantile {
            Quantile::Min => self.min,
            Quantile::P50 => self.p50,
            Quantile::P60 => self.p60,
            Quantile::P70 => self.p70,
            Quantile::P80 => self.p80,
            Quantile::P90 => self.p90,
            Quantile::P95 => self.p95,
            Quantile::P97 => self.p97,
            Quantile::P98 => self.p98,
            Quantile::P99 => self.p99,
            Quantile::Max => self.max,
        }
    }

    pub(super) fn quantile_mut(&mut self, quantile: Quantile) -> &mut Option<f64> {
        match quantile {
            Quantile::Min => &mut self.min,
            Quantile::P50 => &mut self.p50,
            Quantile::P60 => &mut self.p60,
            Quantile::P70 => &mut self.p70,
            Quantile::P80 => &mut self.p80,
            Quantile::P90 => &mut self.p90,
            Quantile::P95 => &mut self.p95,
            Quantile::P97 => &mut self.p97,
            Quantile::P98 => &mut self.p98,
            Quantile::P99 => &mut self.p99,
            Quantile::Max => &mut self.max,
        }
    }

    /// Throughput to display: the live rate while running, the overall
    /// rate once the plan has finished.
    #[must_use]
    pub fn tps(&self) -> Option<f64> {
        self.tps_current.or(self.tps_total)
    }
}

/// One chart sample. Serialized as-is into the persisted series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub category: String,
}

impl SeriesPoint {
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, value: f64, category: String) -> Self {
        Self {
            timestamp,
            value,
            category,
        }
    }
}

/// Everything derived from one metrics scrape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub stats: Vec<TargetStatistics>,
    pub latency_points: Vec<SeriesPoint>,
    pub throughput_points: Vec<SeriesPoint>,
    pub run_state: PlanRunState,
    pub users: Option<u64>,
    pub slaves: Option<u64>,
    pub plan: Option<String>,
}

impl Snapshot {
    /// A scrape without any latency summary: nothing is running.
    #[must_use]
    pub const fn ended(taken_at: DateTime<Utc>) -> Self {
        Self {
            taken_at,
            stats: Vec::new(),
            latency_points: Vec::new(),
            throughput_points: Vec::new(),
            run_state: PlanRunState::Ended,
            users: None,
            slaves: None,
            plan: None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    #[must_use]
    pub fn total_requests(&self) -> Option<u64> {
        sum_counts(self.stats.iter().map(|stats| stats.requests))
    }

    #[must_use]
    pub fn total_failures(&self) -> Option<u64> {
        sum_counts(self.stats.iter().map(|stats| stats.failures))
    }

    #[must_use]
    pub fn total_tps(&self) -> Option<f64> {
        self.stats
            .iter()
            .filter_map(TargetStatistics::tps)
            .reduce(|total, value| total + value)
    }

    /// Overall failure percentage across attackers, when both totals are known.
    #[must_use]
    pub fn failure_percent(&self) -> Option<f64> {
        let requests = self.total_requests()?;
        let failures = self.total_failures()?;
        if requests == 0 {
            return Some(0.0);
        }
        Some(failures as f64 * 100.0 / requests as f64)
    }
}

fn sum_counts<I>(values: I) -> Option<u64>
where
    I: Iterator<Item = Option<u64>>,
{
    values
        .flatten()
        .fold(None, |total: Option<u64>, value| {
            Some(total.unwrap_or(0).saturating_add(value))
        })
}
