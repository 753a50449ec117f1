//! Configuration and plan file loading.
mod apply;
mod loader;
mod parse;
mod plan;
pub mod types;

#[cfg(test)]
mod tests;

pub use apply::apply_config;
pub use loader::{DEFAULT_CONFIG_FILES, load_config, load_plan_file};
pub use plan::load_plan;

pub(crate) use parse::{parse_duration_value, parse_wait_value};
