use std::path::Path;

use chrono::{DateTime, Utc};
use plotters::prelude::*;

use crate::error::AppResult;
use crate::stats::SeriesPoint;

const PALETTE: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

/// Points of one chart category. `x` is seconds since the earliest point of
/// the whole chart.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySeries {
    pub category: String,
    pub points: Vec<(f64, f64)>,
}

/// Splits a stored series into one line per category, in first-seen order.
/// Non-finite values are skipped.
#[must_use]
pub fn group_by_category(points: &[SeriesPoint]) -> Vec<CategorySeries> {
    let Some(origin) = points.iter().map(|point| point.timestamp).min() else {
        return Vec::new();
    };
    let mut groups: Vec<CategorySeries> = Vec::new();
    for point in points.iter().filter(|point| point.value.is_finite()) {
        let sample = (seconds_since(origin, point.timestamp), point.value);
        match groups
            .iter_mut()
            .find(|group| group.category == point.category)
        {
            Some(group) => group.points.push(sample),
            None => groups.push(CategorySeries {
                category: point.category.clone(),
                points: vec![sample],
            }),
        }
    }
    groups
}

fn seconds_since(origin: DateTime<Utc>, at: DateTime<Utc>) -> f64 {
    at.signed_duration_since(origin).num_milliseconds() as f64 / 1000.0
}

/// Draws one line per category into a PNG at `path`. Returns `false` without
/// touching the file when there is nothing to draw.
///
/// # Errors
///
/// Returns an error when plotters fails to draw or write the image.
pub fn plot_series(
    groups: &[CategorySeries],
    title: &str,
    y_desc: &str,
    path: &Path,
) -> AppResult<bool> {
    if groups.iter().all(|group| group.points.is_empty()) {
        return Ok(false);
    }
    let (x_max, y_max) = groups
        .iter()
        .flat_map(|group| group.points.iter())
        .fold((0.0_f64, 0.0_f64), |(x_max, y_max), (x, y)| {
            (x_max.max(*x), y_max.max(*y))
        });
    let x_max = if x_max > 0.0 { x_max } else { 1.0 };
    let y_max = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };

    let root = BitMapBackend::new(path, (1600, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0_f64..x_max, 0.0_f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Elapsed Time (seconds)")
        .y_desc(y_desc)
        .draw()?;

    for (group, color) in groups.iter().zip(PALETTE.iter().cycle()) {
        let color = *color;
        chart
            .draw_series(LineSeries::new(group.points.iter().copied(), color))?
            .label(group.category.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x.saturating_add(20), y)], color));
    }

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    Ok(true)
}
