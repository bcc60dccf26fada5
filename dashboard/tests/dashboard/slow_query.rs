use dashboard::slow_query::{SlowQueryFilter, SlowQueryList};
use fetch::Status;
use jiff::{Span, Timestamp};
use mock_api::Endpoint;
use payloads::APIClient;
use test_helpers::{slow_query, spawn_app};
use tokio::task::LocalSet;

use crate::{dashboard_for, wait_settled};

#[tokio::test]
async fn lists_matching_queries_newest_first() -> anyhow::Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = spawn_app().await;
            let now = Timestamp::now();
            app.store.set_slow_queries(vec![
                slow_query(now, 20, "test", "select 1"),
                slow_query(now, 5, "test", "select 2"),
                slow_query(now, 10, "mysql", "select 3"),
                slow_query(now, 90, "test", "select 4"),
            ]);
            let dashboard = dashboard_for(&app);

            let mut filter = SlowQueryFilter::recent(now, 60);
            filter.databases = vec!["test".into()];
            let page = SlowQueryList::mount(&dashboard, filter);
            assert!(page.state().is_initial_loading());

            let state = wait_settled(&mut page.subscribe()).await?;
            assert_eq!(state.status, Status::Success);
            let queries: Vec<&str> = state
                .data()
                .unwrap()
                .iter()
                .map(|q| q.query.as_str())
                .collect();
            assert_eq!(queries, vec!["select 2", "select 1"]);
            assert!(dashboard.error_bar.is_empty());
            Ok(())
        })
        .await
}

#[tokio::test]
async fn rejected_filter_is_shown_on_error_bar() -> anyhow::Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = spawn_app().await;
            let dashboard = dashboard_for(&app);
            let now = Timestamp::now();

            let mut filter = SlowQueryFilter::recent(now, 30);
            filter.begin_time = now + Span::new().minutes(5);
            let page = SlowQueryList::mount(&dashboard, filter);

            let state = wait_settled(&mut page.subscribe()).await?;
            assert_eq!(state.status, Status::Error);
            assert!(state.data().is_none());
            let error = state.error.unwrap();
            assert_eq!(error.status_code(), Some(400));
            assert_eq!(error.code(), Some("common.bad_request"));

            let entries = dashboard.error_bar.entries();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].error, error);
            Ok(())
        })
        .await
}

#[tokio::test]
async fn unchanged_filter_does_not_refetch() -> anyhow::Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = spawn_app().await;
            let dashboard = dashboard_for(&app);
            let filter = SlowQueryFilter::recent(Timestamp::now(), 30);

            let mut page = SlowQueryList::mount(&dashboard, filter.clone());
            let mut states = page.subscribe();
            wait_settled(&mut states).await?;

            let state = page.set_filter(filter.clone());
            assert!(!state.is_loading);
            assert_eq!(app.store.hits(Endpoint::SlowQueryList), 1);

            page.refresh();
            wait_settled(&mut states).await?;
            assert_eq!(app.store.hits(Endpoint::SlowQueryList), 2);

            let mut narrower = filter;
            narrower.text = Some("sleep".into());
            let state = page.set_filter(narrower.clone());
            assert!(state.is_loading);
            wait_settled(&mut states).await?;
            assert_eq!(app.store.hits(Endpoint::SlowQueryList), 3);
            assert_eq!(page.filter(), Some(&narrower));
            Ok(())
        })
        .await
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() -> anyhow::Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = spawn_app().await;
            let mut dashboard = dashboard_for(&app);
            // nothing listens on the discard port
            dashboard.client = APIClient::new("http://127.0.0.1:9");

            let page = SlowQueryList::mount(
                &dashboard,
                SlowQueryFilter::recent(Timestamp::now(), 30),
            );
            let state = wait_settled(&mut page.subscribe()).await?;
            let error = state.error.unwrap();
            assert_eq!(error.status_code(), None);
            assert_eq!(dashboard.error_bar.len(), 1);
            Ok(())
        })
        .await
}
