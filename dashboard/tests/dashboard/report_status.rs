use std::time::Duration;

use dashboard::report_status::ReportStatusPage;
use fetch::SessionStatus;
use jiff::{Span, Timestamp};
use mock_api::Endpoint;
use payloads::ReportId;
use test_helpers::{TestApp, spawn_app};
use tokio::sync::watch;
use tokio::task::LocalSet;
use tokio::time::{sleep, timeout};

use crate::{SETTLE_TIMEOUT, dashboard_for};

fn add_report(app: &TestApp, id: &str, step: u32) -> ReportId {
    let end = Timestamp::now();
    let id = ReportId::from(id);
    app.store
        .add_report(id.clone(), end - Span::new().hours(1), end, step);
    id
}

async fn wait_finished(
    session: &mut watch::Receiver<SessionStatus>,
) -> anyhow::Result<SessionStatus> {
    let status = timeout(SETTLE_TIMEOUT, session.wait_for(|s| !s.active)).await??;
    Ok(*status)
}

#[tokio::test]
async fn polls_until_report_is_generated() -> anyhow::Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = spawn_app().await;
            let id = add_report(&app, "r1", 40);
            let dashboard = dashboard_for(&app);

            let page = ReportStatusPage::mount(&dashboard, id.clone());
            assert!(page.is_polling());
            assert!(!page.can_view_detail());

            let session = wait_finished(&mut page.subscribe_session()).await?;
            assert_eq!(session.attempt_count, 3);
            assert_eq!(app.store.hits(Endpoint::ReportStatus), 3);

            let state = page.state();
            assert!(!state.is_polling);
            assert!(!state.is_loading);
            assert_eq!(state.data().map(|r| r.progress), Some(100));
            assert!(page.can_view_detail());
            assert_eq!(page.report_id(), &id);
            assert_eq!(
                page.detail_url(),
                format!("{}/api/diagnose/reports/r1/detail", app.address)
            );
            Ok(())
        })
        .await
}

#[tokio::test]
async fn transient_failures_do_not_end_polling() -> anyhow::Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = spawn_app().await;
            let id = add_report(&app, "r2", 100);
            for _ in 0..2 {
                app.store.fail_next(
                    Endpoint::ReportStatus,
                    500,
                    "common.unknown",
                    "report store busy",
                );
            }
            let dashboard = dashboard_for(&app);

            let page = ReportStatusPage::mount(&dashboard, id);
            let session = wait_finished(&mut page.subscribe_session()).await?;

            assert_eq!(session.attempt_count, 3);
            assert_eq!(app.store.hits(Endpoint::ReportStatus), 3);
            let state = page.state();
            assert_eq!(state.error, None);
            assert_eq!(state.data().map(|r| r.progress), Some(100));
            // the same failure twice shows as one entry
            let entries = dashboard.error_bar.entries();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].error.message(), "report store busy");
            Ok(())
        })
        .await
}

#[tokio::test]
async fn unknown_report_keeps_polling_until_stopped() -> anyhow::Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = spawn_app().await;
            let dashboard = dashboard_for(&app);

            let mut page =
                ReportStatusPage::mount(&dashboard, ReportId::from("missing"));
            let mut session = page.subscribe_session();
            timeout(
                SETTLE_TIMEOUT,
                session.wait_for(|s| s.attempt_count >= 3),
            )
            .await??;
            assert!(page.is_polling());

            page.stop();
            page.stop();
            assert!(!page.is_polling());
            assert!(!page.state().is_loading);
            assert!(!page.can_view_detail());

            let attempts = page.state().attempt_count;
            sleep(Duration::from_millis(30)).await;
            assert_eq!(page.state().attempt_count, attempts);
            assert!(!page.is_polling());
            // a cancelled request may or may not have reached the server
            assert!(app.store.hits(Endpoint::ReportStatus) <= attempts);
            assert!(dashboard.error_bar.entries().iter().all(|entry| {
                entry.error.code() == Some("common.not_found")
            }));
            Ok(())
        })
        .await
}

#[tokio::test]
async fn leaving_the_page_stops_polling() -> anyhow::Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = spawn_app().await;
            let id = add_report(&app, "r3", 1);
            let dashboard = dashboard_for(&app);

            let page = ReportStatusPage::mount(&dashboard, id);
            let mut session = page.subscribe_session();
            timeout(
                SETTLE_TIMEOUT,
                session.wait_for(|s| s.attempt_count >= 2),
            )
            .await??;
            drop(page);

            // the session status closes once the polling task is gone
            timeout(SETTLE_TIMEOUT, async {
                while session.changed().await.is_ok() {}
            })
            .await?;
            let attempts = session.borrow().attempt_count;
            assert!(attempts >= 2);
            assert!(app.store.hits(Endpoint::ReportStatus) <= attempts);
            Ok(())
        })
        .await
}
