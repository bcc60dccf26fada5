//! Continuous profiling list page.
//!
//! Shows the profiling rounds of the two hours before a selectable end time
//! together with the monitoring config, which tells whether the feature is
//! switched off.

use fetch::{FetchOptions, FetchReturn, Fetcher, Refetch};
use jiff::{Span, Timestamp};
use payloads::{requests, responses};
use tokio::sync::watch;

use crate::Dashboard;

/// Length of the listed window, ending at the selected end time.
pub const RANGE_DURATION_HOURS: i64 = 2;

/// Outcome of one profiling round, from the backend's `state` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileState {
    Running,
    Finished,
    PartialFinished,
    Failed,
    Unknown,
}

impl ProfileState {
    pub fn parse(state: &str) -> Self {
        match state {
            "running" => Self::Running,
            "finished" | "success" => Self::Finished,
            "finished_with_error" | "partial failed" => Self::PartialFinished,
            "failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

/// What the page body shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListView {
    /// Feature switched off and nothing to list: offer to open settings.
    DisabledEmpty,
    /// Feature switched off but older rounds exist: info banner above table.
    DisabledWithHistory,
    Table,
}

pub fn detail_path(ts: i64) -> String {
    format!("/continuous_profiling/detail?ts={ts}")
}

/// Start and end of the listed window, in unix seconds.
pub fn query_range(range_end: Option<Timestamp>) -> requests::GroupProfiles {
    let end = range_end.unwrap_or_else(Timestamp::now);
    let begin = end - Span::new().hours(RANGE_DURATION_HOURS);
    requests::GroupProfiles {
        begin_time: begin.as_second(),
        end_time: end.as_second(),
    }
}

pub struct ConProfList {
    dashboard: Dashboard,
    /// Keyed by the selected end time; `None` means "now", resolved when
    /// the request is issued.
    profiles: Fetcher<Vec<responses::GroupProfile>, Option<Timestamp>>,
    config: Fetcher<responses::NgMonitoringConfig>,
}

impl ConProfList {
    pub fn mount(dashboard: &Dashboard, range_end: Option<Timestamp>) -> Self {
        let mut page = Self {
            dashboard: dashboard.clone(),
            // rendered inline in the table
            profiles: Fetcher::new(
                FetchOptions::custom_errors(),
                dashboard.error_bar.clone(),
            ),
            config: Fetcher::new(
                FetchOptions::default(),
                dashboard.error_bar.clone(),
            ),
        };

        let client = dashboard.client.clone();
        page.config.execute((), move || {
            let client = client.clone();
            async move { client.continuous_profiling_config().await }
        });
        page.set_range_end(range_end);
        page
    }

    pub fn set_range_end(
        &mut self,
        range_end: Option<Timestamp>,
    ) -> FetchReturn<Vec<responses::GroupProfile>> {
        let client = self.dashboard.client.clone();
        self.profiles.execute(range_end, move || {
            let client = client.clone();
            let range = query_range(range_end);
            async move { client.continuous_profiling_group_profiles(&range).await }
        })
    }

    /// Submit the query form. Unlike [`set_range_end`](Self::set_range_end)
    /// this always requests, so querying "now" again moves the window.
    pub fn query(
        &mut self,
        range_end: Option<Timestamp>,
    ) -> FetchReturn<Vec<responses::GroupProfile>> {
        if self.profiles.key() == Some(&range_end) {
            self.profiles.refetch();
            return self.profiles.snapshot();
        }
        self.set_range_end(range_end)
    }

    pub fn range_end(&self) -> Option<Timestamp> {
        self.profiles.key().copied().flatten()
    }

    /// Reload both the config and the list.
    pub fn refresh(&self) {
        self.config.refetch();
        self.profiles.refetch();
    }

    /// Handle for the settings form to reload the config after saving.
    pub fn config_refetch(&self) -> Refetch {
        self.config.refetch_handle()
    }

    pub fn profiles(&self) -> FetchReturn<Vec<responses::GroupProfile>> {
        self.profiles.snapshot()
    }

    pub fn config(&self) -> FetchReturn<responses::NgMonitoringConfig> {
        self.config.snapshot()
    }

    pub fn profiles_subscribe(
        &self,
    ) -> watch::Receiver<FetchReturn<Vec<responses::GroupProfile>>> {
        self.profiles.subscribe()
    }

    pub fn config_subscribe(
        &self,
    ) -> watch::Receiver<FetchReturn<responses::NgMonitoringConfig>> {
        self.config.subscribe()
    }

    pub fn is_disabled(&self) -> bool {
        self.config
            .snapshot()
            .data()
            .and_then(|config| config.continuous_profiling.as_ref())
            .is_some_and(|conprof| !conprof.enable)
    }

    pub fn view(&self) -> ListView {
        let profiles = self.profiles.snapshot();
        match (self.is_disabled(), profiles.data()) {
            (true, Some(rounds)) if rounds.is_empty() => ListView::DisabledEmpty,
            (true, Some(_)) => ListView::DisabledWithHistory,
            _ => ListView::Table,
        }
    }
}
