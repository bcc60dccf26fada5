//! Development server for working on the dashboard without a cluster
//!
//! Runs the mock diagnostics API with a seeded store: slow queries and
//! profiling rounds from the last few hours plus report `1`, which finishes
//! after ten status requests.
//!
//! Usage: cargo run -p dev-server

use anyhow::Result;
use jiff::Timestamp;
use mock_api::Store;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let subscriber = dashboard::telemetry::get_subscriber("info".into());
    dashboard::telemetry::init_subscriber(subscriber)?;

    let config = mock_api::Config::from_env()?;
    let app = test_helpers::spawn_app_with_config(
        config,
        Store::seeded(Timestamp::now()),
    )
    .await;

    info!("mock API running on {}", app.address);
    info!(
        "watch a report with: DASHBOARD_API_URL={} cargo run -p dashboard -- 1",
        app.address
    );
    info!("press Ctrl+C to shut down");

    tokio::signal::ctrl_c().await?;
    info!("shutting down development server");
    Ok(())
}
