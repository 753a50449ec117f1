use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

use crate::error::ConfigError;

/// Where series history is persisted.
#[derive(Debug, Clone, Copy, ValueEnum, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Kept in process memory; lost on exit.
    Memory,
    /// SQLite database at `--store-path`.
    #[default]
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositiveU32(NonZeroU32);

impl PositiveU32 {
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for PositiveU32 {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        NonZeroU32::new(value)
            .map(PositiveU32)
            .ok_or(ConfigError::FieldMustBePositive {
                field: "startup_max_attempts",
            })
    }
}

impl std::str::FromStr for PositiveU32 {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s.trim().parse().map_err(|err| ConfigError::InvalidNumber {
            value: s.to_owned(),
            source: err,
        })?;
        PositiveU32::try_from(value)
    }
}
