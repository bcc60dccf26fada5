use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{ComponentNum, ContinuousProfilingConfig, ReportId};

/// Error body returned by the diagnostics API for any non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    #[serde(default)]
    pub error: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowQuery {
    pub digest: String,
    pub query: String,
    pub instance: String,
    pub db: String,
    pub connection_id: String,
    pub success: bool,
    /// Unix seconds with sub-second precision.
    pub timestamp: f64,
    pub query_time: f64,
    #[serde(default)]
    pub parse_time: f64,
    #[serde(default)]
    pub compile_time: f64,
    #[serde(default)]
    pub process_time: f64,
    #[serde(default)]
    pub memory_max: u64,
    #[serde(default)]
    pub txn_start_ts: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupProfile {
    /// Unix seconds at which the profiling round started.
    pub ts: i64,
    pub profile_duration_secs: u64,
    pub state: String,
    pub component_num: ComponentNum,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NgMonitoringConfig {
    #[serde(default)]
    pub continuous_profiling: Option<ContinuousProfilingConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateSize {
    pub instance_count: u32,
    pub profile_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportStatus {
    pub id: ReportId,
    pub created_at: Timestamp,
    /// Generation progress in percent, 100 when done.
    pub progress: u32,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    #[serde(default)]
    pub compare_start_time: Option<Timestamp>,
    #[serde(default)]
    pub compare_end_time: Option<Timestamp>,
}

impl ReportStatus {
    pub fn is_finished(&self) -> bool {
        self.progress >= 100
    }
}
