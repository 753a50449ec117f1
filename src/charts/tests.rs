use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::tempdir;

use super::*;
use crate::clock::{Clock, ManualClock};
use crate::series::MemoryStore;
use crate::stats::SeriesPoint;

fn start() -> Result<DateTime<Utc>, String> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .ok_or_else(|| "invalid fixture time".to_owned())
}

fn point(at: DateTime<Utc>, value: f64, category: &str) -> SeriesPoint {
    SeriesPoint::new(at, value, category.to_owned())
}

#[test]
fn grouping_keeps_category_order_and_offsets() -> Result<(), String> {
    let origin = start()?;
    let later = origin
        .checked_add_signed(chrono::TimeDelta::milliseconds(2500))
        .ok_or_else(|| "timestamp overflow".to_owned())?;
    let points = vec![
        point(origin, 10.0, "login_50% percentile"),
        point(origin, 30.0, "login_99% percentile"),
        point(later, 12.0, "login_50% percentile"),
        point(later, f64::NAN, "login_99% percentile"),
    ];
    let groups = group_by_category(&points);
    let categories: Vec<&str> = groups.iter().map(|group| group.category.as_str()).collect();
    if categories != ["login_50% percentile", "login_99% percentile"] {
        return Err(format!("unexpected categories: {:?}", categories));
    }
    let first = groups.first().ok_or_else(|| "missing group".to_owned())?;
    let offsets: Vec<u64> = first
        .points
        .iter()
        .map(|(x, _)| (x * 1000.0) as u64)
        .collect();
    if offsets != [0, 2500] {
        return Err(format!("unexpected offsets: {:?}", offsets));
    }
    let second = groups.get(1).ok_or_else(|| "missing group".to_owned())?;
    if second.points.len() != 1 {
        return Err(format!("non-finite point kept: {:?}", second.points));
    }
    Ok(())
}

#[tokio::test]
async fn render_writes_both_charts() -> Result<(), String> {
    let clock = ManualClock::new(start()?);
    let buffer = SeriesBuffer::new(MemoryStore::new(), clock.clone());
    for step in 0..5_u32 {
        let now = clock.now();
        buffer
            .append(
                LATENCY_SERIES_KEY,
                vec![
                    point(now, f64::from(step) + 10.0, "login_50% percentile"),
                    point(now, f64::from(step) + 40.0, "login_99% percentile"),
                ],
            )
            .await
            .map_err(|err| err.to_string())?;
        buffer
            .append(
                THROUGHPUT_SERIES_KEY,
                vec![point(now, 100.0, "login_TPS"), point(now, 1.5, "login_failure ratio")],
            )
            .await
            .map_err(|err| err.to_string())?;
        clock.advance(Duration::from_secs(5));
    }

    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let out = dir.path().join("charts");
    let written = render_charts(&buffer, &out)
        .await
        .map_err(|err| err.to_string())?;
    if written != [out.join(LATENCY_CHART_FILE), out.join(THROUGHPUT_CHART_FILE)] {
        return Err(format!("unexpected files: {:?}", written));
    }
    for path in &written {
        let size = std::fs::metadata(path)
            .map_err(|err| format!("missing {}: {}", path.display(), err))?
            .len();
        if size == 0 {
            return Err(format!("{} is empty", path.display()));
        }
    }
    Ok(())
}

#[tokio::test]
async fn empty_history_writes_nothing() -> Result<(), String> {
    let buffer = SeriesBuffer::new(MemoryStore::new(), ManualClock::new(start()?));
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let out = dir.path().join("charts");
    let written = render_charts(&buffer, &out)
        .await
        .map_err(|err| err.to_string())?;
    if !written.is_empty() || out.exists() {
        return Err(format!("unexpected output: {:?}", written));
    }
    Ok(())
}
