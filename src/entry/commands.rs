use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::args::{Command, DashboardArgs, StoreKind};
use crate::backend::{Backend, HttpBackend};
use crate::charts::render_charts;
use crate::clock::{Clock, SystemClock};
use crate::config::load_plan;
use crate::controller::{
    ControllerHandle, ControllerState, DEFAULT_STARTUP_INTERVAL, PollController, PollSettings,
    spawn_controller,
};
use crate::error::AppResult;
use crate::exposition::parse;
use crate::series::{KvStore, MemoryStore, SeriesBuffer, SqliteStore};
use crate::shutdown::ShutdownSender;
use crate::stats::extract;
use crate::summary::render;

use super::follow::{FollowMode, follow};

type SharedStore = Arc<dyn KvStore>;

pub(super) async fn execute(args: &DashboardArgs, shutdown_tx: &ShutdownSender) -> AppResult<()> {
    match &args.command {
        Command::Snapshot(snapshot) => {
            let client = backend(args)?;
            println!("{}", snapshot_text(&client, &SystemClock, snapshot.json).await?);
            Ok(())
        }
        Command::Charts(charts) => {
            let store = open_store(args.store, &args.store_path).await?;
            let series = SeriesBuffer::new(store, SystemClock);
            let written = render_charts(&series, Path::new(&charts.out)).await?;
            if written.is_empty() {
                println!("No chart history to render.");
            }
            for path in written {
                println!("{}", path.display());
            }
            Ok(())
        }
        Command::Stop => {
            let settings = PollSettings {
                refresh_interval: DEFAULT_STARTUP_INTERVAL,
                ..PollSettings::default()
            };
            let store: SharedStore = Arc::new(MemoryStore::new());
            drive(backend(args)?, store, settings, shutdown_tx, FollowMode::Stop, |handle| async move {
                handle.stop().await
            })
            .await
        }
        Command::Watch(watch) => {
            let settings = PollSettings {
                refresh_interval: watch.refresh,
                ..PollSettings::default()
            };
            let store = open_store(args.store, &args.store_path).await?;
            drive(backend(args)?, store, settings, shutdown_tx, FollowMode::Watch, |handle| async move {
                handle.attach().await
            })
            .await
        }
        Command::Start(start) => {
            let plan = load_plan(Path::new(&start.plan))?;
            info!("Submitting plan '{}' with {} stage(s)", plan.name, plan.stages.len());
            let settings = PollSettings {
                refresh_interval: start.refresh,
                startup_interval: start.startup_interval,
                startup_max_attempts: start.startup_attempts.get(),
            };
            let mode = FollowMode::Start {
                detach: start.detach,
            };
            let store = open_store(args.store, &args.store_path).await?;
            drive(backend(args)?, store, settings, shutdown_tx, mode, |handle| async move {
                handle.start(plan).await
            })
            .await
        }
    }
}

fn backend(args: &DashboardArgs) -> AppResult<HttpBackend> {
    HttpBackend::new(&args.backend_url, args.request_timeout)
}

/// Spawns the poll loop, sends the opening command and prints its events
/// until the mode is satisfied or shutdown is requested.
async fn drive<F, Fut>(
    backend: HttpBackend,
    store: SharedStore,
    settings: PollSettings,
    shutdown_tx: &ShutdownSender,
    mode: FollowMode,
    open: F,
) -> AppResult<()>
where
    F: FnOnce(ControllerHandle) -> Fut,
    Fut: Future<Output = AppResult<()>>,
{
    let series = SeriesBuffer::new(store, SystemClock);
    let controller = PollController::new(backend, series, SystemClock, settings);
    let follow_shutdown = shutdown_tx.subscribe();
    let (handle, events, task) = spawn_controller(controller, shutdown_tx.subscribe());

    let outcome = match open(handle).await {
        Ok(()) => follow(events, follow_shutdown, mode).await,
        Err(err) => Err(err),
    };

    drop(shutdown_tx.send(()));
    task.await??;
    outcome
}

pub(super) async fn snapshot_text<B, C>(backend: &B, clock: &C, json: bool) -> AppResult<String>
where
    B: Backend,
    C: Clock,
{
    let body = backend.fetch_metrics().await?;
    let snapshot = extract(&parse(&body), clock.now());
    if json {
        Ok(serde_json::to_string_pretty(&snapshot)?)
    } else {
        Ok(render(&snapshot, ControllerState::Idle))
    }
}

pub(super) async fn open_store(kind: StoreKind, path: &str) -> AppResult<SharedStore> {
    match kind {
        StoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreKind::Sqlite => {
            info!("Using series store at {}", path);
            Ok(Arc::new(SqliteStore::open(Path::new(path)).await?))
        }
    }
}
