use tokio::sync::mpsc;
use tracing::info;

use crate::controller::{ControllerEvent, ControllerState, TickOutcome};
use crate::error::AppResult;
use crate::shutdown::ShutdownReceiver;
use crate::summary::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FollowMode {
    Watch,
    Start { detach: bool },
    Stop,
}

#[derive(Debug, PartialEq, Eq)]
pub(super) enum Step {
    Continue(Option<String>),
    Done(Option<String>),
}

pub(super) async fn follow(
    mut events: mpsc::Receiver<ControllerEvent>,
    mut shutdown_rx: ShutdownReceiver,
    mode: FollowMode,
) -> AppResult<()> {
    loop {
        let event = tokio::select! {
            _ = shutdown_rx.recv() => return Ok(()),
            event = events.recv() => event,
        };
        let Some(event) = event else {
            return Ok(());
        };
        match step(event, mode)? {
            Step::Continue(output) => print_output(output.as_deref()),
            Step::Done(output) => {
                print_output(output.as_deref());
                return Ok(());
            }
        }
    }
}

fn print_output(output: Option<&str>) {
    if let Some(text) = output {
        println!("{}\n", text);
    }
}

/// Decides what one controller event prints and whether following ends.
///
/// # Errors
///
/// Failures published by the controller are returned as-is.
pub(super) fn step(event: ControllerEvent, mode: FollowMode) -> AppResult<Step> {
    let outcome = match event {
        ControllerEvent::Tick(outcome) => outcome,
        ControllerEvent::Failed(err) => return Err(err),
    };
    let next = match outcome {
        TickOutcome::Idle | TickOutcome::Skipped | TickOutcome::Discarded => Step::Continue(None),
        TickOutcome::Waiting { attempt, .. } => {
            info!("Waiting for the plan to start (poll {})", attempt);
            Step::Continue(None)
        }
        TickOutcome::Started(snapshot) => {
            let text = render(&snapshot, ControllerState::SteadyPoll);
            if mode == (FollowMode::Start { detach: true }) {
                Step::Done(Some(text))
            } else {
                Step::Continue(Some(text))
            }
        }
        TickOutcome::Updated(snapshot) => {
            Step::Continue(Some(render(&snapshot, ControllerState::SteadyPoll)))
        }
        TickOutcome::Stopped {
            acknowledged: true, ..
        } => Step::Done(Some("Plan stopped.".to_owned())),
        TickOutcome::Stopped {
            acknowledged: false,
            message,
        } => Step::Done(Some(format!(
            "Backend did not confirm the stop: {}",
            message.as_deref().unwrap_or("no reason given")
        ))),
    };
    Ok(next)
}
