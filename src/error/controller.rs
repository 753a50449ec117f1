use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Plan rejected by backend: {message}")]
    PlanRejected { message: String },
    #[error("Plan did not report running after {attempts} polls; stop requested.")]
    StartupTimeout { attempts: u32 },
    #[error("Cannot {command} while {state}.")]
    InvalidTransition {
        command: &'static str,
        state: &'static str,
    },
    #[error("Poll controller is no longer running.")]
    Unavailable,
}
