//! PNG export of the stored chart history.
mod plot;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{error, info};

use crate::clock::Clock;
use crate::error::AppResult;
use crate::series::{KvStore, LATENCY_SERIES_KEY, SeriesBuffer, THROUGHPUT_SERIES_KEY};

pub use plot::{CategorySeries, group_by_category, plot_series};

pub const LATENCY_CHART_FILE: &str = "latency.png";
pub const THROUGHPUT_CHART_FILE: &str = "throughput.png";

/// Renders the latency and throughput series into `out`. Empty series are
/// skipped; the paths of the files written are returned.
///
/// # Errors
///
/// Returns an error when the history cannot be read, the directory cannot be
/// created, or drawing fails.
pub async fn render_charts<S, C>(series: &SeriesBuffer<S, C>, out: &Path) -> AppResult<Vec<PathBuf>>
where
    S: KvStore,
    C: Clock,
{
    let latency = series.read(LATENCY_SERIES_KEY).await?;
    let throughput = series.read(THROUGHPUT_SERIES_KEY).await?;
    if latency.is_empty() && throughput.is_empty() {
        info!("No chart history stored yet.");
        return Ok(Vec::new());
    }

    if let Err(err) = fs::create_dir_all(out).await {
        error!("Failed to create output directory '{}': {}", out.display(), err);
        return Err(err.into());
    }

    let mut written = Vec::with_capacity(2);

    info!("Plotting latency percentiles...");
    let latency_path = out.join(LATENCY_CHART_FILE);
    if plot_series(
        &group_by_category(&latency),
        "Response Time Percentiles",
        "Latency (ms)",
        &latency_path,
    )? {
        written.push(latency_path);
    }

    info!("Plotting throughput...");
    let throughput_path = out.join(THROUGHPUT_CHART_FILE);
    if plot_series(
        &group_by_category(&throughput),
        "Throughput and Failure Ratio",
        "Requests per Second / Failure %",
        &throughput_path,
    )? {
        written.push(throughput_path);
    }

    Ok(written)
}
