//! In-memory data behind the mock API, shared by all workers.
//!
//! Tests reach into the store to seed data, inject failures and count how
//! many requests an endpoint received.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use jiff::{Span, Timestamp};
use payloads::{
    ComponentNum, ContinuousProfilingConfig, ReportId, requests, responses,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    SlowQueryList,
    GroupProfiles,
    Config,
    UpdateConfig,
    EstimateSize,
    ReportStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedFailure {
    pub status: u16,
    pub body: responses::ErrorBody,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid time range")]
    InvalidTimeRange,
    #[error("report {0} not found")]
    ReportNotFound(ReportId),
    #[error("report {0} is still being generated")]
    ReportNotReady(ReportId),
    #[error("{}", .0.body.message)]
    Injected(InjectedFailure),
}

struct MockReport {
    status: responses::ReportStatus,
    /// Progress added by every status request.
    step: u32,
}

#[derive(Default)]
struct StoreInner {
    slow_queries: Vec<responses::SlowQuery>,
    group_profiles: Vec<responses::GroupProfile>,
    config: responses::NgMonitoringConfig,
    estimate: Option<responses::EstimateSize>,
    reports: HashMap<ReportId, MockReport>,
    failures: HashMap<Endpoint, VecDeque<InjectedFailure>>,
    hits: HashMap<Endpoint, u32>,
}

#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<StoreInner>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

pub fn default_conprof_config() -> ContinuousProfilingConfig {
    ContinuousProfilingConfig {
        enable: true,
        profile_seconds: 10,
        interval_seconds: 60,
        timeout_seconds: 120,
        data_retention_seconds: 3 * 24 * 60 * 60,
    }
}

impl Store {
    pub fn new() -> Self {
        let inner = StoreInner {
            config: responses::NgMonitoringConfig {
                continuous_profiling: Some(default_conprof_config()),
            },
            estimate: Some(responses::EstimateSize {
                instance_count: 4,
                profile_size: 12_400_000,
            }),
            ..StoreInner::default()
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// A store with some history around `now`, for the dev-server.
    pub fn seeded(now: Timestamp) -> Self {
        let store = Self::new();
        let states = ["finished", "running", "finished_with_error", "failed"];
        let profiles = (0..12)
            .map(|i| responses::GroupProfile {
                ts: (now - Span::new().minutes(10 * i)).as_second(),
                profile_duration_secs: 10,
                state: states[i as usize % states.len()].to_string(),
                component_num: ComponentNum {
                    tidb: 1,
                    pd: 1,
                    tikv: 3,
                    tiflash: 0,
                },
            })
            .collect();
        store.set_group_profiles(profiles);

        let queries = (0..20)
            .map(|i| responses::SlowQuery {
                digest: format!("{i:064x}"),
                query: format!("SELECT SLEEP({}.{i})", i % 3),
                instance: "127.0.0.1:4000".into(),
                db: if i % 2 == 0 { "test" } else { "mysql" }.into(),
                connection_id: (400 + i).to_string(),
                success: i % 7 != 0,
                timestamp: (now - Span::new().minutes(i)).as_second() as f64,
                query_time: 0.5 + f64::from(i as u32) / 10.0,
                parse_time: 0.001,
                compile_time: 0.002,
                process_time: 0.4,
                memory_max: 1024 * u64::from(i as u32 + 1),
                txn_start_ts: 0,
            })
            .collect();
        store.set_slow_queries(queries);

        store.add_report(
            ReportId::from("1"),
            now - Span::new().hours(1),
            now,
            10,
        );
        store
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // a panicking test thread must not wedge the other workers
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_slow_queries(&self, queries: Vec<responses::SlowQuery>) {
        self.lock().slow_queries = queries;
    }

    pub fn set_group_profiles(&self, profiles: Vec<responses::GroupProfile>) {
        self.lock().group_profiles = profiles;
    }

    pub fn set_conprof_config(&self, config: Option<ContinuousProfilingConfig>) {
        self.lock().config.continuous_profiling = config;
    }

    pub fn conprof_config(&self) -> Option<ContinuousProfilingConfig> {
        self.lock().config.continuous_profiling.clone()
    }

    /// Register a report whose progress grows by `step` per status request.
    pub fn add_report(
        &self,
        id: ReportId,
        start_time: Timestamp,
        end_time: Timestamp,
        step: u32,
    ) {
        let status = responses::ReportStatus {
            id: id.clone(),
            created_at: end_time,
            progress: 0,
            start_time,
            end_time,
            compare_start_time: None,
            compare_end_time: None,
        };
        self.lock().reports.insert(id, MockReport { status, step });
    }

    /// Make the next request to `endpoint` fail with the given error.
    pub fn fail_next(&self, endpoint: Endpoint, status: u16, code: &str, message: &str) {
        let failure = InjectedFailure {
            status,
            body: responses::ErrorBody {
                code: code.into(),
                error: true,
                message: message.into(),
            },
        };
        self.lock()
            .failures
            .entry(endpoint)
            .or_default()
            .push_back(failure);
    }

    /// Number of requests `endpoint` received, failed ones included.
    pub fn hits(&self, endpoint: Endpoint) -> u32 {
        self.lock().hits.get(&endpoint).copied().unwrap_or(0)
    }

    fn enter(&self, endpoint: Endpoint) -> Result<MutexGuard<'_, StoreInner>, StoreError> {
        let mut inner = self.lock();
        *inner.hits.entry(endpoint).or_default() += 1;
        let failure = inner
            .failures
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front);
        match failure {
            Some(failure) => Err(StoreError::Injected(failure)),
            None => Ok(inner),
        }
    }

    pub fn slow_query_list(
        &self,
        query: &requests::SlowQueryList,
    ) -> Result<Vec<responses::SlowQuery>, StoreError> {
        let inner = self.enter(Endpoint::SlowQueryList)?;
        if query.begin_time > query.end_time {
            return Err(StoreError::InvalidTimeRange);
        }

        let databases: Vec<&str> =
            query.db.split(',').filter(|db| !db.is_empty()).collect();
        let mut queries: Vec<_> = inner
            .slow_queries
            .iter()
            .filter(|q| {
                let ts = q.timestamp as i64;
                ts >= query.begin_time && ts <= query.end_time
            })
            .filter(|q| databases.is_empty() || databases.contains(&q.db.as_str()))
            .filter(|q| query.digest.as_ref().is_none_or(|d| &q.digest == d))
            .filter(|q| {
                query.text.as_ref().is_none_or(|text| {
                    q.query.to_lowercase().contains(&text.to_lowercase())
                })
            })
            .cloned()
            .collect();

        match query.order_by.as_str() {
            "query_time" => {
                queries.sort_by(|a, b| a.query_time.total_cmp(&b.query_time))
            }
            "memory_max" => queries.sort_by_key(|q| q.memory_max),
            _ => queries.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp)),
        }
        if query.desc {
            queries.reverse();
        }
        queries.truncate(query.limit as usize);
        Ok(queries)
    }

    pub fn group_profiles(
        &self,
        query: &requests::GroupProfiles,
    ) -> Result<Vec<responses::GroupProfile>, StoreError> {
        let inner = self.enter(Endpoint::GroupProfiles)?;
        if query.begin_time > query.end_time {
            return Err(StoreError::InvalidTimeRange);
        }
        let mut profiles: Vec<_> = inner
            .group_profiles
            .iter()
            .filter(|p| p.ts >= query.begin_time && p.ts <= query.end_time)
            .cloned()
            .collect();
        profiles.sort_by_key(|p| std::cmp::Reverse(p.ts));
        Ok(profiles)
    }

    pub fn config(&self) -> Result<responses::NgMonitoringConfig, StoreError> {
        Ok(self.enter(Endpoint::Config)?.config.clone())
    }

    pub fn update_config(
        &self,
        details: &requests::UpdateNgMonitoringConfig,
    ) -> Result<(), StoreError> {
        let mut inner = self.enter(Endpoint::UpdateConfig)?;
        inner.config.continuous_profiling = Some(details.continuous_profiling.clone());
        Ok(())
    }

    pub fn estimate_size(&self) -> Result<responses::EstimateSize, StoreError> {
        let inner = self.enter(Endpoint::EstimateSize)?;
        Ok(inner.estimate.unwrap_or(responses::EstimateSize {
            instance_count: 0,
            profile_size: 0,
        }))
    }

    /// Report the status, advancing generation by one step.
    pub fn report_status(
        &self,
        id: &ReportId,
    ) -> Result<responses::ReportStatus, StoreError> {
        let mut inner = self.enter(Endpoint::ReportStatus)?;
        let report = inner
            .reports
            .get_mut(id)
            .ok_or_else(|| StoreError::ReportNotFound(id.clone()))?;
        report.status.progress = (report.status.progress + report.step).min(100);
        Ok(report.status.clone())
    }

    pub fn report_detail(&self, id: &ReportId) -> Result<String, StoreError> {
        let inner = self.lock();
        let report = inner
            .reports
            .get(id)
            .ok_or_else(|| StoreError::ReportNotFound(id.clone()))?;
        if !report.status.is_finished() {
            return Err(StoreError::ReportNotReady(id.clone()));
        }
        Ok(format!(
            "<html><body><h1>Diagnostic report {id}</h1>\
             <p>{} to {}</p></body></html>",
            report.status.start_time, report.status.end_time
        ))
    }
}
