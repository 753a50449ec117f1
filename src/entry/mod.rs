mod commands;
mod follow;


use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tracing::error;

use crate::args::DashboardArgs;
use crate::config::{apply_config, load_config};
use crate::error::AppResult;
use crate::logger::init_logging;
use crate::shutdown::{setup_signal_shutdown_handler, shutdown_channel};

/// Parses the command line, applies the config file and runs the selected
/// subcommand on a multi-threaded runtime.
///
/// # Errors
///
/// Returns the first fatal error of the subcommand.
pub fn run() -> AppResult<()> {
    let (mut args, matches) = parse_args()?;
    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, &matches, &config)?;
    }

    init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(&args))
}

fn parse_args() -> AppResult<(DashboardArgs, ArgMatches)> {
    let matches = DashboardArgs::command().get_matches();
    let args = DashboardArgs::from_arg_matches(&matches)?;
    Ok((args, matches))
}

async fn run_async(args: &DashboardArgs) -> AppResult<()> {
    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let signal_task = setup_signal_shutdown_handler(&shutdown_tx);

    let result = commands::execute(args, &shutdown_tx).await;

    drop(shutdown_tx.send(()));
    if let Err(err) = signal_task.await {
        tracing::debug!("Signal handler task ended abnormally: {}", err);
    }
    if let Err(err) = &result {
        error!("{}", err);
    }
    result
}
