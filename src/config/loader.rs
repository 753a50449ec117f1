use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult, ConfigError};

use super::types::{ConfigFile, PlanFile};

/// Default config filenames checked when `--config` is not given.
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["ultron-dashboard.toml", "ultron-dashboard.json"];

/// Loads a configuration file from the provided path or default locations.
///
/// # Errors
///
/// Returns an error when the config file cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> AppResult<Option<ConfigFile>> {
    if let Some(path) = path {
        return Ok(Some(load_document(Path::new(path))?));
    }

    for candidate in DEFAULT_CONFIG_FILES {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Ok(Some(load_document(&path)?));
        }
    }

    Ok(None)
}

/// Loads a plan file (TOML or JSON by extension).
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed.
pub fn load_plan_file(path: &Path) -> AppResult<PlanFile> {
    load_document(path)
}

pub(crate) fn load_document<T>(path: &Path) -> AppResult<T>
where
    T: DeserializeOwned,
{
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseToml {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some("json") => serde_json::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some(ext) => Err(AppError::config(ConfigError::UnsupportedExtension {
            ext: ext.to_owned(),
        })),
        None => Err(AppError::config(ConfigError::MissingExtension)),
    }
}
