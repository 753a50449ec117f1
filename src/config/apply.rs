use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{Command, DashboardArgs, PositiveU32};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::{ConfigFile, DurationValue};

/// Applies configuration values to CLI arguments. Values given on the command
/// line or through an environment variable win over the file.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_config(
    args: &mut DashboardArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    let sub_matches = matches.subcommand().map(|(_, sub)| sub);
    let global_is_explicit = |name: &str| {
        is_explicit(matches, name) || sub_matches.is_some_and(|sub| is_explicit(sub, name))
    };

    if !global_is_explicit("backend_url")
        && let Some(url) = config.backend_url.as_ref()
    {
        url.clone_into(&mut args.backend_url);
    }

    if !global_is_explicit("request_timeout")
        && let Some(timeout) = config.request_timeout.as_ref()
    {
        args.request_timeout = field_duration("request_timeout", timeout)?;
    }

    if !global_is_explicit("store")
        && let Some(store) = config.store
    {
        args.store = store;
    }

    if !global_is_explicit("store_path")
        && let Some(path) = config.store_path.as_ref()
    {
        path.clone_into(&mut args.store_path);
    }

    if !global_is_explicit("verbose")
        && let Some(verbose) = config.verbose
    {
        args.verbose = verbose;
    }

    if !global_is_explicit("no_color")
        && let Some(no_color) = config.no_color
    {
        args.no_color = no_color;
    }

    let sub_is_explicit = |name: &str| sub_matches.is_some_and(|sub| is_explicit(sub, name));
    match &mut args.command {
        Command::Watch(watch) => {
            if !sub_is_explicit("refresh")
                && let Some(refresh) = config.refresh_interval.as_ref()
            {
                watch.refresh = field_duration("refresh_interval", refresh)?;
            }
        }
        Command::Start(start) => {
            if !sub_is_explicit("refresh")
                && let Some(refresh) = config.refresh_interval.as_ref()
            {
                start.refresh = field_duration("refresh_interval", refresh)?;
            }
            if !sub_is_explicit("startup_interval")
                && let Some(interval) = config.startup_interval.as_ref()
            {
                start.startup_interval = field_duration("startup_interval", interval)?;
            }
            if !sub_is_explicit("startup_attempts")
                && let Some(attempts) = config.startup_max_attempts
            {
                start.startup_attempts = PositiveU32::try_from(attempts)?;
            }
        }
        Command::Charts(charts) => {
            if !sub_is_explicit("out")
                && let Some(path) = config.charts_path.as_ref()
            {
                path.clone_into(&mut charts.out);
            }
        }
        Command::Stop | Command::Snapshot(_) => {}
    }

    Ok(())
}

fn is_explicit(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}

fn field_duration(
    field: &'static str,
    value: &DurationValue,
) -> AppResult<std::time::Duration> {
    value.to_duration().map_err(|err| {
        AppError::config(ConfigError::InvalidField {
            field,
            source: Box::new(err),
        })
    })
}
