mod conprof;
mod report_status;
mod slow_query;

use std::time::Duration;

use dashboard::{Config, Dashboard};
use fetch::FetchReturn;
use test_helpers::{TestApp, spawn_app};
use tokio::sync::watch;
use tokio::time::timeout;

const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// A dashboard talking to the mock API, polling reports every 10ms.
pub fn dashboard_for(app: &TestApp) -> Dashboard {
    let mut config = Config::new(app.address.clone());
    config.report_poll_interval = Duration::from_millis(10);
    Dashboard::with_client(config, app.client.clone())
}

/// Wait until the request behind `states` is no longer loading.
pub async fn wait_settled<T: Clone>(
    states: &mut watch::Receiver<FetchReturn<T>>,
) -> anyhow::Result<FetchReturn<T>> {
    let state = timeout(SETTLE_TIMEOUT, states.wait_for(|s| !s.is_loading))
        .await??;
    Ok(state.clone())
}

#[tokio::test]
async fn health_check() -> anyhow::Result<()> {
    let app = spawn_app().await;

    app.client.health_check().await?;

    Ok(())
}
