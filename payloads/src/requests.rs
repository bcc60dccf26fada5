use serde::{Deserialize, Serialize};

use crate::ContinuousProfilingConfig;

/// Query parameters for `slow_query/list`.
///
/// Times are unix seconds. `db` is sent as a comma separated list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlowQueryList {
    pub begin_time: i64,
    pub end_time: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub db: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub limit: u32,
    #[serde(rename = "orderBy")]
    pub order_by: String,
    pub desc: bool,
}

/// Query parameters for `continuous_profiling/group_profiles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupProfiles {
    pub begin_time: i64,
    pub end_time: i64,
}

/// Body for `POST continuous_profiling/config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNgMonitoringConfig {
    pub continuous_profiling: ContinuousProfilingConfig,
}
