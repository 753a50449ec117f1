//! Prometheus text exposition parsing.
//!
//! The backend exports one metric family per statistic (requests, failures,
//! latency summary, throughput, ...). This module turns a raw scrape into an
//! ordered list of typed families without interpreting any of them.
mod parser;
mod types;


pub use parser::{parse, parse_bytes};
pub use types::{MetricFamily, MetricInstance, MetricType, QUANTILE_LABEL};
