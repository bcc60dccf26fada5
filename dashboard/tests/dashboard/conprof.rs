use std::time::Duration;

use dashboard::conprof::{ConProfList, ListView};
use dashboard::conprof_settings::{
    ConProfSettings, ONE_DAY_SECONDS, SettingsValues, SubmitOutcome,
};
use fetch::Status;
use jiff::Timestamp;
use mock_api::{Endpoint, store::default_conprof_config};
use payloads::ContinuousProfilingConfig;
use test_helpers::{group_profile, spawn_app};
use tokio::task::LocalSet;
use tokio::time::timeout;

use crate::{dashboard_for, wait_settled};

fn disabled() -> ContinuousProfilingConfig {
    ContinuousProfilingConfig {
        enable: false,
        ..default_conprof_config()
    }
}

#[tokio::test]
async fn lists_rounds_of_the_selected_window() -> anyhow::Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = spawn_app().await;
            let end = Timestamp::now();
            app.store.set_group_profiles(vec![
                group_profile(end, 150, "finished"),
                group_profile(end, 90, "finished"),
                group_profile(end, 30, "running"),
            ]);
            let dashboard = dashboard_for(&app);

            let page = ConProfList::mount(&dashboard, Some(end));
            let profiles = wait_settled(&mut page.profiles_subscribe()).await?;
            wait_settled(&mut page.config_subscribe()).await?;

            let ts: Vec<i64> =
                profiles.data().unwrap().iter().map(|p| p.ts).collect();
            assert_eq!(
                ts,
                vec![
                    group_profile(end, 30, "").ts,
                    group_profile(end, 90, "").ts
                ]
            );
            assert_eq!(page.range_end(), Some(end));
            assert!(!page.is_disabled());
            assert_eq!(page.view(), ListView::Table);
            Ok(())
        })
        .await
}

#[tokio::test]
async fn querying_same_end_time_requests_again() -> anyhow::Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = spawn_app().await;
            let dashboard = dashboard_for(&app);

            let mut page = ConProfList::mount(&dashboard, None);
            let mut profiles = page.profiles_subscribe();
            wait_settled(&mut profiles).await?;
            assert_eq!(app.store.hits(Endpoint::GroupProfiles), 1);

            // changing nothing through the setter does not request
            let state = page.set_range_end(None);
            assert!(!state.is_loading);
            assert_eq!(app.store.hits(Endpoint::GroupProfiles), 1);

            let state = page.query(None);
            assert!(state.is_loading);
            wait_settled(&mut profiles).await?;
            assert_eq!(app.store.hits(Endpoint::GroupProfiles), 2);

            let end = Timestamp::now();
            page.query(Some(end));
            wait_settled(&mut profiles).await?;
            assert_eq!(app.store.hits(Endpoint::GroupProfiles), 3);
            assert_eq!(page.range_end(), Some(end));
            Ok(())
        })
        .await
}

#[tokio::test]
async fn profile_list_errors_stay_inline() -> anyhow::Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = spawn_app().await;
            app.store.fail_next(
                Endpoint::GroupProfiles,
                500,
                "conprof.query_failed",
                "profile storage unavailable",
            );
            let dashboard = dashboard_for(&app);

            let page = ConProfList::mount(&dashboard, None);
            let profiles = wait_settled(&mut page.profiles_subscribe()).await?;
            wait_settled(&mut page.config_subscribe()).await?;

            assert_eq!(profiles.status, Status::Error);
            let error = profiles.error.unwrap();
            assert_eq!(error.code(), Some("conprof.query_failed"));
            assert_eq!(error.message(), "profile storage unavailable");
            assert!(dashboard.error_bar.is_empty());
            Ok(())
        })
        .await
}

#[tokio::test]
async fn config_errors_go_to_error_bar() -> anyhow::Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = spawn_app().await;
            app.store.fail_next(
                Endpoint::Config,
                503,
                "common.unavailable",
                "monitoring component unreachable",
            );
            let dashboard = dashboard_for(&app);

            let page = ConProfList::mount(&dashboard, None);
            let config = wait_settled(&mut page.config_subscribe()).await?;

            assert_eq!(config.status, Status::Error);
            let entries = dashboard.error_bar.entries();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].error.status_code(), Some(503));
            assert!(!page.is_disabled());
            Ok(())
        })
        .await
}

#[tokio::test]
async fn disabled_feature_views() -> anyhow::Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = spawn_app().await;
            app.store.set_conprof_config(Some(disabled()));
            let dashboard = dashboard_for(&app);

            let page = ConProfList::mount(&dashboard, None);
            wait_settled(&mut page.profiles_subscribe()).await?;
            wait_settled(&mut page.config_subscribe()).await?;
            assert!(page.is_disabled());
            assert_eq!(page.view(), ListView::DisabledEmpty);
            drop(page);

            let end = Timestamp::now();
            app.store
                .set_group_profiles(vec![group_profile(end, 10, "finished")]);
            let page = ConProfList::mount(&dashboard, Some(end));
            wait_settled(&mut page.profiles_subscribe()).await?;
            wait_settled(&mut page.config_subscribe()).await?;
            assert_eq!(page.view(), ListView::DisabledWithHistory);
            Ok(())
        })
        .await
}

#[tokio::test]
async fn saving_settings_reloads_list_config() -> anyhow::Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = spawn_app().await;
            let dashboard = dashboard_for(&app);

            let list = ConProfList::mount(&dashboard, None);
            let mut list_config = list.config_subscribe();
            wait_settled(&mut list_config).await?;
            assert!(!list.is_disabled());

            let settings =
                ConProfSettings::mount(&dashboard, Some(list.config_refetch()));
            let mut settings_config = settings.config_subscribe();
            wait_settled(&mut settings_config).await?;
            wait_settled(&mut settings.estimate_subscribe()).await?;
            assert_eq!(
                settings.initial_values(),
                Some(SettingsValues {
                    enable: true,
                    data_retention_seconds: 3 * ONE_DAY_SECONDS,
                })
            );
            assert_eq!(settings.targets_hint(), ("4".into(), "12 MB".into()));

            let values = SettingsValues {
                enable: false,
                data_retention_seconds: 5 * ONE_DAY_SECONDS,
            };
            let outcome = settings.submit(values, false).await?;
            assert_eq!(outcome, SubmitOutcome::NeedsConfirmation);
            assert_eq!(app.store.hits(Endpoint::UpdateConfig), 0);

            let outcome = settings.submit(values, true).await?;
            assert_eq!(outcome, SubmitOutcome::Saved);
            assert!(!settings.is_submitting());

            let stored = app.store.conprof_config().unwrap();
            assert!(!stored.enable);
            assert_eq!(stored.data_retention_seconds, 5 * ONE_DAY_SECONDS);
            // untouched fields are sent back as loaded
            assert_eq!(stored.profile_seconds, default_conprof_config().profile_seconds);

            wait_settled(&mut list_config).await?;
            wait_settled(&mut settings_config).await?;
            assert!(list.is_disabled());
            assert_eq!(settings.initial_values(), Some(values));
            // two initial loads, then one reload each
            assert_eq!(app.store.hits(Endpoint::Config), 4);
            Ok(())
        })
        .await
}

#[tokio::test]
async fn abandoned_save_is_not_left_submitting() -> anyhow::Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = spawn_app().await;
            let dashboard = dashboard_for(&app);
            let settings = ConProfSettings::mount(&dashboard, None);
            wait_settled(&mut settings.config_subscribe()).await?;

            let values = SettingsValues {
                enable: true,
                data_retention_seconds: 5 * ONE_DAY_SECONDS,
            };
            // polled once, then dropped while the request is in flight
            let _ = timeout(Duration::ZERO, settings.submit(values, false)).await;
            assert!(!settings.is_submitting());
            Ok(())
        })
        .await
}

#[tokio::test]
async fn failed_save_is_reported() -> anyhow::Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = spawn_app().await;
            app.store.fail_next(
                Endpoint::UpdateConfig,
                500,
                "common.unknown",
                "write failed",
            );
            let dashboard = dashboard_for(&app);
            let settings = ConProfSettings::mount(&dashboard, None);
            wait_settled(&mut settings.config_subscribe()).await?;

            let values = SettingsValues {
                enable: true,
                data_retention_seconds: 10 * ONE_DAY_SECONDS,
            };
            let error = settings.submit(values, false).await.unwrap_err();
            assert_eq!(error.message(), "write failed");
            assert_eq!(dashboard.error_bar.len(), 1);
            assert!(app.store.conprof_config().unwrap().enable);
            assert_eq!(
                app.store.conprof_config().unwrap().data_retention_seconds,
                3 * ONE_DAY_SECONDS
            );
            Ok(())
        })
        .await
}
