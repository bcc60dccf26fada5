//! Slow query list page.

use fetch::{FetchOptions, FetchReturn, Fetcher};
use jiff::{Span, Timestamp};
use payloads::{requests, responses};
use tokio::sync::watch;

use crate::Dashboard;

pub const DEFAULT_LIMIT: u32 = 100;
pub const DEFAULT_ORDER_BY: &str = "timestamp";

/// Everything the list depends on. A different filter means a new request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlowQueryFilter {
    pub begin_time: Timestamp,
    pub end_time: Timestamp,
    pub databases: Vec<String>,
    pub digest: Option<String>,
    pub text: Option<String>,
    pub limit: u32,
    pub order_by: String,
    pub desc: bool,
}

impl SlowQueryFilter {
    /// The default view: the last `minutes` before `now`, newest first.
    pub fn recent(now: Timestamp, minutes: i64) -> Self {
        Self {
            begin_time: now - Span::new().minutes(minutes),
            end_time: now,
            databases: Vec::new(),
            digest: None,
            text: None,
            limit: DEFAULT_LIMIT,
            order_by: DEFAULT_ORDER_BY.into(),
            desc: true,
        }
    }

    pub fn to_request(&self) -> requests::SlowQueryList {
        requests::SlowQueryList {
            begin_time: self.begin_time.as_second(),
            end_time: self.end_time.as_second(),
            db: self.databases.join(","),
            digest: self.digest.clone(),
            text: self.text.clone().filter(|text| !text.trim().is_empty()),
            limit: self.limit,
            order_by: self.order_by.clone(),
            desc: self.desc,
        }
    }
}

/// Backend rejections (e.g. a malformed filter) go to the page-level error
/// bar.
pub struct SlowQueryList {
    dashboard: Dashboard,
    queries: Fetcher<Vec<responses::SlowQuery>, SlowQueryFilter>,
}

impl SlowQueryList {
    pub fn mount(dashboard: &Dashboard, filter: SlowQueryFilter) -> Self {
        let mut page = Self {
            dashboard: dashboard.clone(),
            queries: Fetcher::new(
                FetchOptions::default(),
                dashboard.error_bar.clone(),
            ),
        };
        page.set_filter(filter);
        page
    }

    /// Switch to `filter`; only requests when it differs from the current one.
    pub fn set_filter(
        &mut self,
        filter: SlowQueryFilter,
    ) -> FetchReturn<Vec<responses::SlowQuery>> {
        let client = self.dashboard.client.clone();
        let request = filter.to_request();
        self.queries.execute(filter, move || {
            let client = client.clone();
            let request = request.clone();
            async move { client.slow_query_list(&request).await }
        })
    }

    pub fn filter(&self) -> Option<&SlowQueryFilter> {
        self.queries.key()
    }

    pub fn refresh(&self) {
        self.queries.refetch();
    }

    pub fn state(&self) -> FetchReturn<Vec<responses::SlowQuery>> {
        self.queries.snapshot()
    }

    pub fn subscribe(
        &self,
    ) -> watch::Receiver<FetchReturn<Vec<responses::SlowQuery>>> {
        self.queries.subscribe()
    }
}
