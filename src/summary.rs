//! Plain-text rendering of a snapshot: one status line plus a table with a
//! row per attacker. Unset readings print as `-`.
use crate::controller::ControllerState;
use crate::stats::{Quantile, Snapshot, TargetStatistics};

const MISSING: &str = "-";
const ATTACKER_WIDTH: usize = 20;
const COLUMN_WIDTH: usize = 10;
const TABLE_QUANTILES: [Quantile; 6] = [
    Quantile::Min,
    Quantile::P50,
    Quantile::P90,
    Quantile::P95,
    Quantile::P99,
    Quantile::Max,
];

#[must_use]
pub fn status_line(snapshot: &Snapshot, state: ControllerState) -> String {
    format!(
        "[{}] plan {} | {} | {} | users {} | slaves {} | requests {} | failures {} ({}) | tps {}",
        snapshot.taken_at.format("%H:%M:%S"),
        snapshot.plan.as_deref().unwrap_or(MISSING),
        snapshot.run_state,
        state.label(),
        count(snapshot.users),
        count(snapshot.slaves),
        count(snapshot.total_requests()),
        count(snapshot.total_failures()),
        percent(snapshot.failure_percent()),
        decimal(snapshot.total_tps()),
    )
}

#[must_use]
pub fn table_lines(snapshot: &Snapshot) -> Vec<String> {
    if snapshot.is_empty() {
        return vec!["no attackers reported".to_owned()];
    }
    let mut lines = Vec::with_capacity(snapshot.stats.len().saturating_add(1));
    lines.push(header());
    lines.extend(snapshot.stats.iter().map(row));
    lines
}

/// Status line followed by the table, newline separated.
#[must_use]
pub fn render(snapshot: &Snapshot, state: ControllerState) -> String {
    let mut lines = vec![status_line(snapshot, state)];
    lines.extend(table_lines(snapshot));
    lines.join("\n")
}

fn header() -> String {
    let titles = ["requests", "failures", "fail %", "tps"]
        .into_iter()
        .chain(TABLE_QUANTILES.iter().map(|quantile| quantile.label()))
        .chain(["avg"])
        .map(ToOwned::to_owned);
    line("attacker", titles)
}

fn row(stats: &TargetStatistics) -> String {
    let ratio = stats.failure_ratio.map(|ratio| ratio * 100.0);
    let cells = [
        count(stats.requests),
        count(stats.failures),
        percent(ratio),
        decimal(stats.tps()),
    ]
    .into_iter()
    .chain(
        TABLE_QUANTILES
            .iter()
            .map(|quantile| decimal(stats.quantile(*quantile))),
    )
    .chain([decimal(stats.avg)]);
    line(&stats.attacker, cells)
}

fn line<I>(first: &str, cells: I) -> String
where
    I: Iterator<Item = String>,
{
    let mut out = format!("{:<ATTACKER_WIDTH$}", first);
    out.extend(cells.map(|cell| format!("{:>COLUMN_WIDTH$}", cell)));
    out
}

fn count(value: Option<u64>) -> String {
    value.map_or_else(|| MISSING.to_owned(), |value| value.to_string())
}

fn decimal(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_owned(), |value| format!("{:.2}", value))
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_owned(), |value| format!("{:.2}%", value))
}
