use clap::{Args, Parser, Subcommand};
use std::time::Duration;

use super::defaults::{
    DEFAULT_BACKEND_URL, DEFAULT_REFRESH, DEFAULT_REQUEST_TIMEOUT, DEFAULT_STARTUP_ATTEMPTS,
    DEFAULT_STARTUP_INTERVAL, default_charts_path, default_store_path,
};
use super::parsers::{parse_bool_env, parse_duration_arg, parse_positive_u32};
use super::types::{PositiveU32, StoreKind};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Operator console for an ultron load-testing backend: start and stop plans, watch live throughput and latency."
)]
pub struct DashboardArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Backend base URL
    #[arg(
        long = "backend",
        short = 'b',
        env = "ULTRON_BACKEND",
        default_value = DEFAULT_BACKEND_URL,
        global = true
    )]
    pub backend_url: String,

    /// Path to config file (TOML/JSON). Defaults to ./ultron-dashboard.toml or ./ultron-dashboard.json if present.
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    /// Where chart history is kept
    #[arg(long = "store", value_enum, default_value_t = StoreKind::Sqlite, global = true)]
    pub store: StoreKind,

    /// SQLite database used by `--store sqlite`
    #[arg(long = "store-path", default_value_t = default_store_path(), global = true)]
    pub store_path: String,

    /// Timeout for each backend request (supports ms/s/m/h)
    #[arg(
        long = "request-timeout",
        default_value = DEFAULT_REQUEST_TIMEOUT,
        value_parser = parse_duration_arg,
        global = true
    )]
    pub request_timeout: Duration,

    /// Enable verbose logging (sets log level to debug unless overridden by ULTRON_DASHBOARD_LOG/RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable color output
    #[arg(
        long = "no-color",
        env = "NO_COLOR",
        value_parser = parse_bool_env,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        global = true
    )]
    pub no_color: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Follow the running plan and print a table on every refresh
    Watch(WatchArgs),
    /// Submit a plan, wait for it to run, then keep watching
    Start(StartArgs),
    /// Stop the running plan
    Stop,
    /// Fetch the metrics once and print them
    Snapshot(SnapshotArgs),
    /// Render the stored chart history to PNG files
    Charts(ChartsArgs),
}

#[derive(Debug, Args, Clone)]
pub struct WatchArgs {
    /// Refresh interval (supports ms/s/m/h)
    #[arg(long = "refresh", default_value = DEFAULT_REFRESH, value_parser = parse_duration_arg)]
    pub refresh: Duration,
}

#[derive(Debug, Args, Clone)]
pub struct StartArgs {
    /// Plan file (TOML/JSON) with `name` and `[[stages]]`
    #[arg(long = "plan", short = 'p')]
    pub plan: String,

    /// Poll interval while waiting for the plan to start
    #[arg(
        long = "startup-interval",
        default_value = DEFAULT_STARTUP_INTERVAL,
        value_parser = parse_duration_arg
    )]
    pub startup_interval: Duration,

    /// Polls before giving up and stopping the plan
    #[arg(
        long = "startup-attempts",
        default_value = DEFAULT_STARTUP_ATTEMPTS,
        value_parser = parse_positive_u32
    )]
    pub startup_attempts: PositiveU32,

    /// Refresh interval once the plan is running
    #[arg(long = "refresh", default_value = DEFAULT_REFRESH, value_parser = parse_duration_arg)]
    pub refresh: Duration,

    /// Exit as soon as the plan is running
    #[arg(long = "detach")]
    pub detach: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SnapshotArgs {
    /// Print the snapshot as JSON instead of a table
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ChartsArgs {
    /// Output directory for the PNG files
    #[arg(long = "out", short = 'o', default_value_t = default_charts_path())]
    pub out: String,
}
