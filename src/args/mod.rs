//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;


pub use cli::{ChartsArgs, Command, DashboardArgs, SnapshotArgs, StartArgs, WatchArgs};
pub use defaults::DEFAULT_BACKEND_URL;
pub use types::{PositiveU32, StoreKind};

pub(crate) use defaults::DEFAULT_USER_AGENT;
#[cfg(test)]
pub(crate) use defaults::{default_charts_path, default_store_path};
