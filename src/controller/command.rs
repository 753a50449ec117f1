use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::backend::Backend;
use crate::clock::Clock;
use crate::error::{AppError, AppResult, ControllerError};
use crate::plan::PlanRequest;
use crate::series::KvStore;
use crate::shutdown::ShutdownReceiver;

use super::poll::PollController;
use super::state::{TickFetch, TickOutcome};

const COMMAND_BUFFER: usize = 16;
const EVENT_BUFFER: usize = 64;

pub enum ControlCommand {
    Start {
        plan: PlanRequest,
        respond_to: oneshot::Sender<AppResult<()>>,
    },
    Attach {
        respond_to: oneshot::Sender<AppResult<()>>,
    },
    Stop {
        respond_to: oneshot::Sender<AppResult<()>>,
    },
}

/// Published after every tick that produced something.
#[derive(Debug)]
pub enum ControllerEvent {
    Tick(TickOutcome),
    Failed(AppError),
}

/// Cloneable sender side of a running controller loop.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    sender: mpsc::Sender<ControlCommand>,
}

impl ControllerHandle {
    /// # Errors
    ///
    /// Returns the controller's answer, or `Unavailable` if the loop exited.
    pub async fn start(&self, plan: PlanRequest) -> AppResult<()> {
        let (respond_to, response_rx) = oneshot::channel();
        self.request(ControlCommand::Start { plan, respond_to }, response_rx)
            .await
    }

    /// # Errors
    ///
    /// Returns the controller's answer, or `Unavailable` if the loop exited.
    pub async fn attach(&self) -> AppResult<()> {
        let (respond_to, response_rx) = oneshot::channel();
        self.request(ControlCommand::Attach { respond_to }, response_rx)
            .await
    }

    /// # Errors
    ///
    /// Returns `Unavailable` if the loop exited.
    pub async fn stop(&self) -> AppResult<()> {
        let (respond_to, response_rx) = oneshot::channel();
        self.request(ControlCommand::Stop { respond_to }, response_rx)
            .await
    }

    async fn request(
        &self,
        command: ControlCommand,
        response_rx: oneshot::Receiver<AppResult<()>>,
    ) -> AppResult<()> {
        if self.sender.send(command).await.is_err() {
            return Err(AppError::controller(ControllerError::Unavailable));
        }
        response_rx
            .await
            .unwrap_or_else(|_| Err(AppError::controller(ControllerError::Unavailable)))
    }
}

/// Spawns the controller loop on the current runtime.
pub fn spawn_controller<B, S, C>(
    controller: PollController<B, S, C>,
    shutdown_rx: ShutdownReceiver,
) -> (
    ControllerHandle,
    mpsc::Receiver<ControllerEvent>,
    JoinHandle<AppResult<()>>,
)
where
    B: Backend + Clone + 'static,
    S: KvStore + 'static,
    C: Clock + Clone + 'static,
{
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
    let task = tokio::spawn(run_controller(controller, command_rx, event_tx, shutdown_rx));
    (ControllerHandle { sender: command_tx }, event_rx, task)
}

/// Sleeps for the state's interval, ticks, and applies commands as they
/// arrive. Ticks never overlap; a command that lands while a fetch is in
/// flight is applied immediately and the stale response is discarded.
///
/// # Errors
///
/// Currently never fails; the result type leaves room for fatal loop errors.
pub async fn run_controller<B, S, C>(
    mut controller: PollController<B, S, C>,
    mut commands: mpsc::Receiver<ControlCommand>,
    events: mpsc::Sender<ControllerEvent>,
    mut shutdown_rx: ShutdownReceiver,
) -> AppResult<()>
where
    B: Backend + Clone + 'static,
    S: KvStore + 'static,
    C: Clock + Clone + 'static,
{
    let clock = controller.clock().clone();
    let mut commands_open = true;
    loop {
        let delay = controller.next_delay();
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            command = commands.recv(), if commands_open => {
                match command {
                    Some(command) => apply_command(&mut controller, command).await,
                    None => commands_open = false,
                }
                continue;
            }
            () = clock.sleep(delay) => {}
        }

        let Some(ticket) = controller.begin_tick() else {
            continue;
        };
        let mut fetch = Box::pin(controller.fetcher(ticket).fetch());
        let fetched: Option<TickFetch> = loop {
            tokio::select! {
                fetched = &mut fetch => break Some(fetched),
                _ = shutdown_rx.recv() => break None,
                command = commands.recv(), if commands_open => {
                    match command {
                        Some(command) => apply_command(&mut controller, command).await,
                        None => commands_open = false,
                    }
                }
            }
        };
        let Some(fetched) = fetched else {
            break;
        };

        let event = match controller.complete_tick(ticket, fetched).await {
            Ok(TickOutcome::Discarded) => continue,
            Ok(outcome) => ControllerEvent::Tick(outcome),
            Err(err) => ControllerEvent::Failed(err),
        };
        if events.send(event).await.is_err() {
            debug!("Controller event receiver dropped");
        }
    }
    info!("Poll controller stopped");
    Ok(())
}

async fn apply_command<B, S, C>(controller: &mut PollController<B, S, C>, command: ControlCommand)
where
    B: Backend + Clone,
    S: KvStore,
    C: Clock + Clone,
{
    match command {
        ControlCommand::Start { plan, respond_to } => {
            let result = controller.submit_plan(plan).await;
            if respond_to.send(result).is_err() {
                // Requester dropped the response channel.
            }
        }
        ControlCommand::Attach { respond_to } => {
            let result = controller.attach();
            if respond_to.send(result).is_err() {
                // Requester dropped the response channel.
            }
        }
        ControlCommand::Stop { respond_to } => {
            controller.request_stop();
            if respond_to.send(Ok(())).is_err() {
                // Requester dropped the response channel.
            }
        }
    }
}
