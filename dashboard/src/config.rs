use std::time::Duration;

pub const DEFAULT_REPORT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} must be a number of milliseconds, got {value:?}")]
    InvalidMillis { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Base address of the diagnostics API, without the `/api` suffix.
    pub api_address: String,
    /// Delay between two report status requests.
    pub report_poll_interval: Duration,
    /// Default log filter when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Config {
    pub fn new(api_address: impl Into<String>) -> Self {
        Self {
            api_address: api_address.into(),
            report_poll_interval: DEFAULT_REPORT_POLL_INTERVAL,
            log_filter: "info".into(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        use std::env::var;

        let api_address = var("DASHBOARD_API_URL")
            .map_err(|_| ConfigError::Missing("DASHBOARD_API_URL"))?
            .trim_end_matches('/')
            .to_string();

        let report_poll_interval = match var("REPORT_POLL_INTERVAL_MS") {
            Ok(value) => parse_millis("REPORT_POLL_INTERVAL_MS", &value)?,
            Err(_) => DEFAULT_REPORT_POLL_INTERVAL,
        };

        Ok(Config {
            api_address,
            report_poll_interval,
            log_filter: var("LOG_FILTER").unwrap_or_else(|_| "info".into()),
        })
    }
}

fn parse_millis(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidMillis {
            name,
            value: value.to_string(),
        })
}
