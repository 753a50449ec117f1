mod app;
mod config;
mod controller;
mod http;
mod store;
mod validation;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use controller::ControllerError;
pub use http::HttpError;
pub use store::StoreError;
pub use validation::ValidationError;
