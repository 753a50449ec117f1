//! The load-testing backend as seen by the dashboard.
mod http;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::plan::{PlanRequest, PlanResponse};

pub use http::HttpBackend;

pub const METRICS_PATH: &str = "/metrics";
pub const PLAN_PATH: &str = "/api/v1/plan";

#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetches the raw exposition text.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures or non-2xx responses.
    async fn fetch_metrics(&self) -> AppResult<String>;

    /// # Errors
    ///
    /// Returns an error when the request cannot be sent or the reply cannot
    /// be decoded. A decoded rejection is returned as `Ok`.
    async fn submit_plan(&self, plan: &PlanRequest) -> AppResult<PlanResponse>;

    /// # Errors
    ///
    /// Same contract as [`Backend::submit_plan`].
    async fn stop_plan(&self) -> AppResult<PlanResponse>;
}

#[async_trait]
impl<T> Backend for Arc<T>
where
    T: Backend + ?Sized,
{
    async fn fetch_metrics(&self) -> AppResult<String> {
        (**self).fetch_metrics().await
    }

    async fn submit_plan(&self, plan: &PlanRequest) -> AppResult<PlanResponse> {
        (**self).submit_plan(plan).await
    }

    async fn stop_plan(&self) -> AppResult<PlanResponse> {
        (**self).stop_plan().await
    }
}
