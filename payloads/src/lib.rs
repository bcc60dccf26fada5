//! Request and response types shared between the dashboard front end and
//! the diagnostics API.

pub mod api_client;
pub mod requests;
pub mod responses;

pub use api_client::{APIClient, ClientError};
pub use reqwest::StatusCode;

use serde::{Deserialize, Serialize};

/// Identifier of a generated diagnostic report.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
pub struct ReportId(pub String);

impl From<&str> for ReportId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Number of instances of each component kind that took part in a
/// continuous profiling round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentNum {
    pub tidb: u32,
    pub pd: u32,
    pub tikv: u32,
    pub tiflash: u32,
}

/// Continuous profiling settings as stored by the monitoring component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuousProfilingConfig {
    pub enable: bool,
    #[serde(default)]
    pub profile_seconds: u64,
    #[serde(default)]
    pub interval_seconds: u64,
    #[serde(default)]
    pub timeout_seconds: u64,
    pub data_retention_seconds: u64,
}
