use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::backend::Backend;
use crate::clock::Clock;
use crate::error::{AppError, AppResult, ControllerError};
use crate::exposition::parse;
use crate::plan::{PlanRequest, validate_plan};
use crate::series::{KvStore, LATENCY_SERIES_KEY, SeriesBuffer, THROUGHPUT_SERIES_KEY};
use crate::stats::{PlanRunState, Snapshot, extract};

use super::state::{ControllerState, PollSettings, TickFetch, TickOutcome, TickTicket};

/// Drives startup detection and steady refresh for one backend.
///
/// The controller owns the plan run state. Each tick is split into
/// [`PollController::begin_tick`], a network call that does not borrow the
/// controller ([`TickFetcher::fetch`]), and
/// [`PollController::complete_tick`]. Any transition in between bumps the
/// epoch, so the late response is discarded instead of applied.
pub struct PollController<B, S, C> {
    backend: B,
    series: SeriesBuffer<S, C>,
    clock: C,
    settings: PollSettings,
    state: ControllerState,
    run_state: PlanRunState,
    attempts: u32,
    epoch: u64,
    latest: Option<Snapshot>,
}

/// Owned handle that performs the network half of a tick.
pub struct TickFetcher<B, C> {
    backend: B,
    clock: C,
    state: ControllerState,
}

impl<B, C> TickFetcher<B, C>
where
    B: Backend,
    C: Clock,
{
    pub async fn fetch(self) -> TickFetch {
        match self.state {
            ControllerState::PollingStop => TickFetch::Stop(self.backend.stop_plan().await),
            ControllerState::Idle
            | ControllerState::PollingStartup
            | ControllerState::SteadyPoll => {
                let snapshot = self
                    .backend
                    .fetch_metrics()
                    .await
                    .map(|text| extract(&parse(&text), self.clock.now()));
                TickFetch::Metrics(snapshot)
            }
        }
    }
}

impl<B, S, C> PollController<B, S, C>
where
    B: Backend + Clone,
    S: KvStore,
    C: Clock + Clone,
{
    pub fn new(backend: B, series: SeriesBuffer<S, C>, clock: C, settings: PollSettings) -> Self {
        Self {
            backend,
            series,
            clock,
            settings,
            state: ControllerState::Idle,
            run_state: PlanRunState::NotStarted,
            attempts: 0,
            epoch: 0,
            latest: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> ControllerState {
        self.state
    }

    #[must_use]
    pub const fn run_state(&self) -> PlanRunState {
        self.run_state
    }

    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub const fn latest(&self) -> Option<&Snapshot> {
        self.latest.as_ref()
    }

    #[must_use]
    pub const fn series(&self) -> &SeriesBuffer<S, C> {
        &self.series
    }

    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Delay before the next tick for the current state.
    #[must_use]
    pub const fn next_delay(&self) -> Duration {
        match self.state {
            ControllerState::PollingStartup => self.settings.startup_interval,
            ControllerState::Idle | ControllerState::SteadyPoll | ControllerState::PollingStop => {
                self.settings.refresh_interval
            }
        }
    }

    fn transition(&mut self, next: ControllerState) {
        self.epoch = self.epoch.wrapping_add(1);
        if self.state != next {
            info!(
                "Poll controller: {} -> {}",
                self.state.label(),
                next.label()
            );
        }
        self.state = next;
    }

    fn invalid(&self, command: &'static str) -> AppError {
        AppError::controller(ControllerError::InvalidTransition {
            command,
            state: self.state.label(),
        })
    }

    /// Validates and submits a plan, then starts waiting for it to run.
    ///
    /// Series history is cleared only after the backend accepted the plan.
    ///
    /// # Errors
    ///
    /// Returns an error when a plan is being started or stopped, when the
    /// plan is invalid, when the request fails, or when the backend rejects
    /// the plan. The state is unchanged in every error case.
    pub async fn submit_plan(&mut self, plan: PlanRequest) -> AppResult<()> {
        if !matches!(
            self.state,
            ControllerState::Idle | ControllerState::SteadyPoll
        ) {
            return Err(self.invalid("start a plan"));
        }
        validate_plan(&plan)?;

        let response = self.backend.submit_plan(&plan).await?;
        if !response.result {
            let message = response.message().to_owned();
            warn!("Backend rejected plan '{}': {}", plan.name, message);
            return Err(AppError::controller(ControllerError::PlanRejected { message }));
        }

        info!(
            "Plan '{}' accepted with {} stage(s)",
            plan.name,
            plan.stages.len()
        );
        self.series.clear_all().await?;
        self.attempts = 0;
        self.latest = None;
        self.run_state = PlanRunState::Starting;
        self.transition(ControllerState::PollingStartup);
        Ok(())
    }

    /// Follows a plan that was started elsewhere.
    ///
    /// # Errors
    ///
    /// Returns an error while a plan is starting or stopping.
    pub fn attach(&mut self) -> AppResult<()> {
        match self.state {
            ControllerState::SteadyPoll => Ok(()),
            ControllerState::Idle => {
                self.transition(ControllerState::SteadyPoll);
                Ok(())
            }
            ControllerState::PollingStartup | ControllerState::PollingStop => {
                Err(self.invalid("attach"))
            }
        }
    }

    /// Schedules a stop request for the next tick.
    pub fn request_stop(&mut self) {
        self.transition(ControllerState::PollingStop);
    }

    #[must_use]
    pub const fn begin_tick(&self) -> Option<TickTicket> {
        match self.state {
            ControllerState::Idle => None,
            ControllerState::PollingStartup
            | ControllerState::SteadyPoll
            | ControllerState::PollingStop => Some(TickTicket {
                epoch: self.epoch,
                state: self.state,
            }),
        }
    }

    #[must_use]
    pub fn fetcher(&self, ticket: TickTicket) -> TickFetcher<B, C> {
        TickFetcher {
            backend: self.backend.clone(),
            clock: self.clock.clone(),
            state: ticket.state,
        }
    }

    /// Runs one full tick without interleaving.
    ///
    /// # Errors
    ///
    /// See [`PollController::complete_tick`].
    pub async fn tick(&mut self) -> AppResult<TickOutcome> {
        let Some(ticket) = self.begin_tick() else {
            return Ok(TickOutcome::Idle);
        };
        let fetched = self.fetcher(ticket).fetch().await;
        self.complete_tick(ticket, fetched).await
    }

    /// Applies a tick's response to the controller.
    ///
    /// # Errors
    ///
    /// Returns `StartupTimeout` once the startup cap is exceeded (after the
    /// stop request was issued), and store errors raised while appending
    /// series points.
    pub async fn complete_tick(
        &mut self,
        ticket: TickTicket,
        fetched: TickFetch,
    ) -> AppResult<TickOutcome> {
        if ticket.epoch != self.epoch || self.state == ControllerState::Idle {
            debug!(
                "Discarding response from epoch {} (now {})",
                ticket.epoch, self.epoch
            );
            return Ok(TickOutcome::Discarded);
        }

        match (self.state, fetched) {
            (ControllerState::PollingStartup, TickFetch::Metrics(result)) => {
                self.complete_startup(result).await
            }
            (ControllerState::SteadyPoll, TickFetch::Metrics(result)) => {
                self.complete_steady(result).await
            }
            (ControllerState::PollingStop, TickFetch::Stop(result)) => {
                Ok(self.complete_stop(result))
            }
            (state, _) => {
                debug!("Response does not match state {}", state.label());
                Ok(TickOutcome::Discarded)
            }
        }
    }

    async fn complete_startup(&mut self, result: AppResult<Snapshot>) -> AppResult<TickOutcome> {
        let snapshot = match result {
            Ok(snapshot) if snapshot.run_state == PlanRunState::Running => {
                self.record(&snapshot).await?;
                self.run_state = PlanRunState::Running;
                self.transition(ControllerState::SteadyPoll);
                return Ok(TickOutcome::Started(snapshot));
            }
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!("Startup poll failed: {}", err);
                None
            }
        };

        self.attempts = self.attempts.saturating_add(1);
        if self.attempts > self.settings.startup_max_attempts {
            let attempts = self.attempts;
            error!(
                "Plan did not start after {} polls; requesting stop",
                attempts
            );
            match self.backend.stop_plan().await {
                Ok(response) if !response.result => {
                    warn!("Stop request not acknowledged: {}", response.message());
                }
                Ok(_) => {}
                Err(err) => warn!("Stop request failed: {}", err),
            }
            self.run_state = PlanRunState::Ended;
            self.transition(ControllerState::Idle);
            return Err(AppError::controller(ControllerError::StartupTimeout {
                attempts,
            }));
        }

        debug!(
            "Plan not running yet (attempt {}/{})",
            self.attempts, self.settings.startup_max_attempts
        );
        if let Some(snapshot) = snapshot.as_ref() {
            self.latest = Some(snapshot.clone());
        }
        Ok(TickOutcome::Waiting {
            attempt: self.attempts,
            snapshot,
        })
    }

    async fn complete_steady(&mut self, result: AppResult<Snapshot>) -> AppResult<TickOutcome> {
        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("Metrics refresh failed: {}", err);
                return Ok(TickOutcome::Skipped);
            }
        };
        match snapshot.run_state {
            PlanRunState::Running | PlanRunState::Ended => {
                if self.run_state != snapshot.run_state {
                    info!("Plan is {}", snapshot.run_state);
                }
                self.run_state = snapshot.run_state;
            }
            PlanRunState::NotStarted | PlanRunState::Starting => {}
        }
        self.record(&snapshot).await?;
        Ok(TickOutcome::Updated(snapshot))
    }

    fn complete_stop(&mut self, result: AppResult<crate::plan::PlanResponse>) -> TickOutcome {
        match result {
            Ok(response) => {
                if response.result {
                    info!("Backend acknowledged stop");
                } else {
                    warn!("Backend answered stop with: {}", response.message());
                }
                self.run_state = PlanRunState::Ended;
                self.transition(ControllerState::Idle);
                TickOutcome::Stopped {
                    acknowledged: response.result,
                    message: response.error_message,
                }
            }
            Err(err) => {
                warn!("Stop request failed, retrying: {}", err);
                TickOutcome::Skipped
            }
        }
    }

    async fn record(&mut self, snapshot: &Snapshot) -> AppResult<()> {
        if !snapshot.latency_points.is_empty() {
            self.series
                .append(LATENCY_SERIES_KEY, snapshot.latency_points.clone())
                .await?;
        }
        if !snapshot.throughput_points.is_empty() {
            self.series
                .append(THROUGHPUT_SERIES_KEY, snapshot.throughput_points.clone())
                .await?;
        }
        self.latest = Some(snapshot.clone());
        Ok(())
    }
}
