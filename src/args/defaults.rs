use std::path::PathBuf;

pub(crate) const DEFAULT_USER_AGENT: &str = concat!("ultron-dashboard/", env!("CARGO_PKG_VERSION"));

/// The backend's default listen address.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:2017";

pub(crate) const DEFAULT_REQUEST_TIMEOUT: &str = "10s";
pub(crate) const DEFAULT_REFRESH: &str = "5s";
pub(crate) const DEFAULT_STARTUP_INTERVAL: &str = "1s";
pub(crate) const DEFAULT_STARTUP_ATTEMPTS: &str = "60";

pub(crate) fn default_store_path() -> String {
    default_base_dir()
        .join("series.db")
        .to_string_lossy()
        .into_owned()
}

pub(crate) fn default_charts_path() -> String {
    default_base_dir()
        .join("charts")
        .to_string_lossy()
        .into_owned()
}

fn default_base_dir() -> PathBuf {
    if let Some(home) = user_home_dir() {
        return home.join(".ultron-dashboard");
    }

    PathBuf::from(".ultron-dashboard")
}

fn user_home_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        if let Some(value) = std::env::var_os("USERPROFILE") {
            return Some(PathBuf::from(value));
        }
    }

    std::env::var_os("HOME").map(PathBuf::from)
}
