use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Invalid backend URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to join URL '{url}': {source}")]
    JoinUrlFailed {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to build HTTP client: {source}")]
    BuildClientFailed {
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to {endpoint} failed: {source}")]
    RequestFailed {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} answered with HTTP {status}.")]
    UnexpectedStatus { endpoint: &'static str, status: u16 },
    #[error("Failed to read {endpoint} response body: {source}")]
    ReadBody {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to decode {endpoint} response: {source}")]
    DecodeResponse {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
