//! Diagnostic report generation status.
//!
//! Polls the report status until generation reaches 100%. Transient
//! failures are shown but do not end the wait.

use fetch::{ErrorInfo, FetchOptions, PollingController, PollingReturn, SessionStatus};
use payloads::{ReportId, responses};
use tokio::sync::watch;

use crate::Dashboard;

/// Keep polling while the report is missing or still generating.
pub fn should_continue(
    report: Option<&responses::ReportStatus>,
    _error: Option<&ErrorInfo>,
) -> bool {
    report.is_none_or(|report| !report.is_finished())
}

pub struct ReportStatusPage {
    report_id: ReportId,
    detail_url: String,
    poller: PollingController<responses::ReportStatus>,
}

impl ReportStatusPage {
    pub fn mount(dashboard: &Dashboard, report_id: ReportId) -> Self {
        let mut poller = PollingController::new(
            FetchOptions::default(),
            dashboard.error_bar.clone(),
        );

        let client = dashboard.client.clone();
        let id = report_id.clone();
        poller.start_polling(
            move || {
                let client = client.clone();
                let id = id.clone();
                async move { client.report_status(&id).await }
            },
            should_continue,
            dashboard.config.report_poll_interval,
        );
        tracing::info!(%report_id, "watching report generation");

        Self {
            detail_url: dashboard.client.report_detail_url(&report_id),
            report_id,
            poller,
        }
    }

    pub fn report_id(&self) -> &ReportId {
        &self.report_id
    }

    pub fn state(&self) -> PollingReturn<responses::ReportStatus> {
        self.poller.snapshot()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_polling()
    }

    pub fn stop(&mut self) {
        self.poller.stop();
    }

    /// The "view report" button is enabled once generation completed.
    pub fn can_view_detail(&self) -> bool {
        self.poller
            .snapshot()
            .data()
            .is_some_and(responses::ReportStatus::is_finished)
    }

    pub fn detail_url(&self) -> &str {
        &self.detail_url
    }

    pub fn subscribe(
        &self,
    ) -> watch::Receiver<fetch::FetchReturn<responses::ReportStatus>> {
        self.poller.subscribe()
    }

    pub fn subscribe_session(&self) -> watch::Receiver<SessionStatus> {
        self.poller.subscribe_session()
    }
}
