use std::time::Duration;

use crate::plan::PlanResponse;
use crate::stats::Snapshot;
use crate::error::AppResult;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_STARTUP_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_STARTUP_MAX_ATTEMPTS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    #[default]
    Idle,
    PollingStartup,
    SteadyPoll,
    PollingStop,
}

impl ControllerState {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ControllerState::Idle => "idle",
            ControllerState::PollingStartup => "waiting for the plan to start",
            ControllerState::SteadyPoll => "polling",
            ControllerState::PollingStop => "stopping",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub refresh_interval: Duration,
    pub startup_interval: Duration,
    pub startup_max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            startup_interval: DEFAULT_STARTUP_INTERVAL,
            startup_max_attempts: DEFAULT_STARTUP_MAX_ATTEMPTS,
        }
    }
}

/// Result of one completed tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Nothing to poll.
    Idle,
    /// Still waiting for the submitted plan to report throughput.
    Waiting {
        attempt: u32,
        snapshot: Option<Snapshot>,
    },
    /// The plan reported running; steady polling begins.
    Started(Snapshot),
    Updated(Snapshot),
    /// The fetch failed; the next tick retries.
    Skipped,
    Stopped {
        acknowledged: bool,
        message: Option<String>,
    },
    /// The response belonged to an earlier epoch and was ignored.
    Discarded,
}

/// Identifies the state a fetch was started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTicket {
    pub epoch: u64,
    pub state: ControllerState,
}

/// Response of a tick's network call, handed back to the controller.
#[derive(Debug)]
pub enum TickFetch {
    Metrics(AppResult<Snapshot>),
    Stop(AppResult<PlanResponse>),
}
