use std::path::Path;
use std::time::Duration;

use clap::{CommandFactory, FromArgMatches};
use tempfile::tempdir;

use super::loader::load_document;
use super::plan::plan_request;
use super::types::{ConfigFile, PlanFile};
use super::*;
use crate::args::{Command, DashboardArgs, StoreKind};
use crate::error::{AppError, ConfigError, ValidationError};

fn parse_with_config(
    argv: &[&str],
    config: &ConfigFile,
) -> Result<DashboardArgs, String> {
    let matches = DashboardArgs::command()
        .try_get_matches_from(argv)
        .map_err(|err| format!("parse failed: {}", err))?;
    let mut args = DashboardArgs::from_arg_matches(&matches)
        .map_err(|err| format!("from_arg_matches failed: {}", err))?;
    apply_config(&mut args, &matches, config).map_err(|err| format!("apply failed: {}", err))?;
    Ok(args)
}

fn write_file(dir: &Path, name: &str, content: &str) -> Result<std::path::PathBuf, String> {
    let path = dir.join(name);
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;
    Ok(path)
}

#[test]
fn toml_config_fills_defaults() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = write_file(
        dir.path(),
        "dashboard.toml",
        r#"
backend = "http://ultron.local:2017"
refresh_interval = "2s"
startup_interval = 500
startup_max_attempts = 10
request_timeout = "250ms"
store = "memory"
no_color = true
"#,
    )?;
    let config: ConfigFile = load_document(&path).map_err(|err| format!("load failed: {}", err))?;
    let args = parse_with_config(&["ultron-dashboard", "start", "--plan", "plan.toml"], &config)?;

    let Command::Start(start) = &args.command else {
        return Err(format!("unexpected command: {:?}", args.command));
    };
    let checks = [
        (args.backend_url == "http://ultron.local:2017", "backend_url"),
        (args.request_timeout == Duration::from_millis(250), "request_timeout"),
        (args.store == StoreKind::Memory, "store"),
        (args.no_color, "no_color"),
        (start.refresh == Duration::from_secs(2), "refresh"),
        (start.startup_interval == Duration::from_secs(500), "startup_interval"),
        (start.startup_attempts.get() == 10, "startup_attempts"),
    ];
    for (ok, field) in checks {
        if !ok {
            return Err(format!("config value not applied: {}", field));
        }
    }
    Ok(())
}

#[test]
fn command_line_wins_over_config() -> Result<(), String> {
    let config = ConfigFile {
        backend_url: Some("http://from-config:2017".to_owned()),
        refresh_interval: Some(super::types::DurationValue::Seconds(30)),
        ..ConfigFile::default()
    };
    let args = parse_with_config(
        &[
            "ultron-dashboard",
            "watch",
            "--backend",
            "http://from-cli:2017",
            "--refresh",
            "3s",
        ],
        &config,
    )?;
    if args.backend_url != "http://from-cli:2017" {
        return Err(format!("unexpected backend: {}", args.backend_url));
    }
    let Command::Watch(watch) = &args.command else {
        return Err(format!("unexpected command: {:?}", args.command));
    };
    if watch.refresh != Duration::from_secs(3) {
        return Err(format!("unexpected refresh: {:?}", watch.refresh));
    }
    Ok(())
}

#[test]
fn invalid_config_values_are_reported() -> Result<(), String> {
    let config = ConfigFile {
        startup_max_attempts: Some(0),
        ..ConfigFile::default()
    };
    let matches = DashboardArgs::command()
        .try_get_matches_from(["ultron-dashboard", "start", "--plan", "p.toml"])
        .map_err(|err| format!("parse failed: {}", err))?;
    let mut args = DashboardArgs::from_arg_matches(&matches)
        .map_err(|err| format!("from_arg_matches failed: {}", err))?;
    match apply_config(&mut args, &matches, &config) {
        Err(AppError::Config(ConfigError::FieldMustBePositive { .. })) => {}
        other => return Err(format!("expected FieldMustBePositive, got {:?}", other)),
    }

    let config = ConfigFile {
        request_timeout: Some(super::types::DurationValue::Text("5 fortnights".to_owned())),
        ..ConfigFile::default()
    };
    match apply_config(&mut args, &matches, &config) {
        Err(AppError::Config(ConfigError::InvalidField {
            field: "request_timeout",
            ..
        })) => Ok(()),
        other => Err(format!("expected InvalidField, got {:?}", other)),
    }
}

#[test]
fn charts_path_only_applies_to_charts() -> Result<(), String> {
    let config = ConfigFile {
        charts_path: Some("/tmp/ultron-charts".to_owned()),
        ..ConfigFile::default()
    };
    let args = parse_with_config(&["ultron-dashboard", "charts"], &config)?;
    match &args.command {
        Command::Charts(charts) if charts.out == "/tmp/ultron-charts" => Ok(()),
        other => Err(format!("unexpected command: {:?}", other)),
    }
}

#[test]
fn json_plan_file_converts_to_request() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = write_file(
        dir.path(),
        "plan.json",
        r#"{
  "name": "smoke",
  "stages": [
    {"requests": 1000, "users": 10, "ramp_up_period": 2, "min_wait": "10ms", "max_wait": "50ms"},
    {"duration": "1m", "concurrent_users": 20}
  ]
}"#,
    )?;
    let request = load_plan(&path).map_err(|err| format!("load failed: {}", err))?;
    if request.name != "smoke" || request.stages.len() != 2 {
        return Err(format!("unexpected request: {:?}", request));
    }
    let first = request
        .stages
        .first()
        .ok_or_else(|| "missing first stage".to_owned())?;
    let second = request
        .stages
        .get(1)
        .ok_or_else(|| "missing second stage".to_owned())?;
    let checks = [
        (first.requests == Some(1000), "first.requests"),
        (first.concurrent_users == Some(10), "first.users"),
        (first.ramp_up_period == Some(2), "first.ramp_up_period"),
        (first.min_wait == Some(10_000_000), "first.min_wait"),
        (first.max_wait == Some(50_000_000), "first.max_wait"),
        (first.duration.is_none(), "first.duration"),
        (second.duration == Some(60_000_000_000), "second.duration"),
        (second.concurrent_users == Some(20), "second.users"),
    ];
    for (ok, field) in checks {
        if !ok {
            return Err(format!("unexpected stage field: {}", field));
        }
    }
    Ok(())
}

#[test]
fn bad_stage_duration_names_the_stage() -> Result<(), String> {
    let file = PlanFile {
        name: "broken".to_owned(),
        stages: vec![super::types::PlanStageConfig {
            duration: Some(super::types::DurationValue::Text("soon".to_owned())),
            concurrent_users: Some(1),
            ..super::types::PlanStageConfig::default()
        }],
    };
    match plan_request(file) {
        Err(ValidationError::StageDuration {
            index: 0,
            field: "duration",
            ..
        }) => Ok(()),
        other => Err(format!("expected StageDuration, got {:?}", other)),
    }
}

#[test]
fn unsupported_extension_is_rejected() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = write_file(dir.path(), "plan.yaml", "name: smoke")?;
    match load_plan_file(&path) {
        Err(AppError::Config(ConfigError::UnsupportedExtension { ext })) if ext == "yaml" => Ok(()),
        other => Err(format!("expected UnsupportedExtension, got {:?}", other)),
    }
}

#[test]
fn explicit_missing_config_is_an_error() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let missing = dir.path().join("absent.toml");
    let missing = missing
        .to_str()
        .ok_or_else(|| "non UTF-8 temp path".to_owned())?;
    match load_config(Some(missing)) {
        Err(AppError::Config(ConfigError::ReadConfig { .. })) => Ok(()),
        other => Err(format!("expected ReadConfig, got {:?}", other.map(|_| ()))),
    }
}

#[test]
fn zero_waits_are_accepted() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = write_file(
        dir.path(),
        "plan.toml",
        "name = \"smoke\"\n\n[[stages]]\nduration = \"10s\"\nconcurrent_users = 5\nmin_wait = 0\nmax_wait = \"2s\"\n\n[[stages]]\nduration = \"5s\"\nconcurrent_users = 5\nmin_wait = \"0s\"\nmax_wait = \"0ms\"\n",
    )?;
    let request = load_plan(&path).map_err(|err| format!("load failed: {}", err))?;
    let waits: Vec<(Option<u64>, Option<u64>)> = request
        .stages
        .iter()
        .map(|stage| (stage.min_wait, stage.max_wait))
        .collect();
    if waits != [(Some(0), Some(2_000_000_000)), (Some(0), Some(0))] {
        return Err(format!("unexpected waits: {:?}", waits));
    }
    crate::plan::validate_plan(&request).map_err(|err| format!("validation failed: {}", err))?;

    let zero_duration = PlanFile {
        name: "smoke".to_owned(),
        stages: vec![super::types::PlanStageConfig {
            duration: Some(super::types::DurationValue::Seconds(0)),
            concurrent_users: Some(1),
            ..super::types::PlanStageConfig::default()
        }],
    };
    match plan_request(zero_duration) {
        Err(ValidationError::StageDuration {
            field: "duration", ..
        }) => Ok(()),
        other => Err(format!("zero stage duration accepted: {:?}", other)),
    }
}
