use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use tracing::debug;
use url::Url;

use crate::args::DEFAULT_USER_AGENT;
use crate::error::{AppError, AppResult, HttpError};
use crate::plan::{PlanRequest, PlanResponse};

use super::{Backend, METRICS_PATH, PLAN_PATH};

const METRICS_ENDPOINT: &str = "GET /metrics";
const SUBMIT_ENDPOINT: &str = "POST /api/v1/plan";
const STOP_ENDPOINT: &str = "DELETE /api/v1/plan";

/// `reqwest` client bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    metrics_url: Url,
    plan_url: Url,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the client cannot be
    /// built.
    pub fn new(base_url: &str, request_timeout: Duration) -> AppResult<Self> {
        let base = Url::parse(base_url).map_err(|err| {
            AppError::http(HttpError::InvalidUrl {
                url: base_url.to_owned(),
                source: err,
            })
        })?;
        let metrics_url = join(&base, METRICS_PATH)?;
        let plan_url = join(&base, PLAN_PATH)?;

        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|err| AppError::http(HttpError::BuildClientFailed { source: err }))?;

        Ok(Self {
            client,
            metrics_url,
            plan_url,
        })
    }

    async fn plan_call(
        &self,
        request: RequestBuilder,
        endpoint: &'static str,
    ) -> AppResult<PlanResponse> {
        let response = request
            .send()
            .await
            .map_err(|err| AppError::http(HttpError::RequestFailed { endpoint, source: err }))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| AppError::http(HttpError::ReadBody { endpoint, source: err }))?;
        debug!("{} answered {} ({} bytes)", endpoint, status, body.len());

        match serde_json::from_slice::<PlanResponse>(&body) {
            Ok(decoded) => Ok(decoded),
            Err(_) if !status.is_success() => {
                Err(AppError::http(HttpError::UnexpectedStatus {
                    endpoint,
                    status: status.as_u16(),
                }))
            }
            Err(err) => Err(AppError::http(HttpError::DecodeResponse {
                endpoint,
                source: err,
            })),
        }
    }
}

fn join(base: &Url, path: &str) -> AppResult<Url> {
    base.join(path).map_err(|err| {
        AppError::http(HttpError::JoinUrlFailed {
            url: format!("{}{}", base, path),
            source: err,
        })
    })
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch_metrics(&self) -> AppResult<String> {
        let response = self
            .client
            .get(self.metrics_url.clone())
            .send()
            .await
            .map_err(|err| {
                AppError::http(HttpError::RequestFailed {
                    endpoint: METRICS_ENDPOINT,
                    source: err,
                })
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::http(HttpError::UnexpectedStatus {
                endpoint: METRICS_ENDPOINT,
                status: status.as_u16(),
            }));
        }
        response.text().await.map_err(|err| {
            AppError::http(HttpError::ReadBody {
                endpoint: METRICS_ENDPOINT,
                source: err,
            })
        })
    }

    async fn submit_plan(&self, plan: &PlanRequest) -> AppResult<PlanResponse> {
        let request = self.client.post(self.plan_url.clone()).json(plan);
        self.plan_call(request, SUBMIT_ENDPOINT).await
    }

    async fn stop_plan(&self) -> AppResult<PlanResponse> {
        let request = self.client.delete(self.plan_url.clone());
        self.plan_call(request, STOP_ENDPOINT).await
    }
}
