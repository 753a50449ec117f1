//! Completion poll controller.
//!
//! After a plan is submitted the controller polls quickly until the metrics
//! show live throughput, gives up (and stops the plan) after a bounded
//! number of attempts, then settles into a slower refresh cadence.
mod command;
mod poll;
mod state;


pub use command::{
    ControlCommand, ControllerEvent, ControllerHandle, run_controller, spawn_controller,
};
pub use poll::{PollController, TickFetcher};
pub use state::{
    ControllerState, DEFAULT_REFRESH_INTERVAL, DEFAULT_STARTUP_INTERVAL,
    DEFAULT_STARTUP_MAX_ATTEMPTS, PollSettings, TickFetch, TickOutcome, TickTicket,
};
