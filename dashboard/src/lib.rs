//! View models of the diagnostics dashboard.
//!
//! Each page module owns the fetchers its page needs and exposes the
//! uniform read model from [`fetch`]. Pages are torn down by dropping them.

pub mod config;
pub mod conprof;
pub mod conprof_settings;
pub mod report_status;
pub mod slow_query;
pub mod telemetry;

pub use config::{Config, ConfigError};

use fetch::ErrorBar;
use payloads::APIClient;

/// Everything a page needs from the application shell.
#[derive(Clone)]
pub struct Dashboard {
    pub config: Config,
    pub client: APIClient,
    pub error_bar: ErrorBar,
}

impl Dashboard {
    pub fn new(config: Config) -> Self {
        let client = APIClient::new(config.api_address.clone());
        Self::with_client(config, client)
    }

    pub fn with_client(config: Config, client: APIClient) -> Self {
        Self {
            config,
            client,
            error_bar: ErrorBar::new(),
        }
    }
}
