use anyhow::Context;
use dashboard::{
    Config, Dashboard,
    report_status::ReportStatusPage,
    telemetry::{get_subscriber, init_subscriber},
};
use payloads::ReportId;
use tokio::task::LocalSet;
use tracing::info;

/// Watch a diagnostic report until it has been generated.
///
/// Environment variables can be set directly or loaded from a .env file in
/// the project root.
///
/// Required environment variables:
/// - DASHBOARD_API_URL: address of the diagnostics API, e.g. http://127.0.0.1:12333/dashboard
///
/// Optional environment variables:
/// - REPORT_POLL_INTERVAL_MS: delay between status requests (default 1000)
/// - LOG_FILTER: log filter when RUST_LOG is unset (default info)
///
/// Example:
/// DASHBOARD_API_URL=http://127.0.0.1:12333/dashboard cargo run -p dashboard -- <report-id>
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if available
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    init_subscriber(get_subscriber(config.log_filter.clone()))?;

    let report_id = std::env::args()
        .nth(1)
        .map(ReportId)
        .context("usage: dashboard <report-id>")?;

    let dashboard = Dashboard::new(config);
    LocalSet::new()
        .run_until(watch_report(dashboard, report_id))
        .await
}

async fn watch_report(
    dashboard: Dashboard,
    report_id: ReportId,
) -> anyhow::Result<()> {
    let mut page = ReportStatusPage::mount(&dashboard, report_id);
    let mut states = page.subscribe();
    let mut session = page.subscribe_session();

    loop {
        tokio::select! {
            changed = states.changed() => {
                changed?;
                let state = page.state();
                if let Some(report) = state.data() {
                    info!(progress = report.progress, "report status");
                }
                if let Some(error) = &state.error {
                    info!("status request failed, retrying: {error}");
                }
            }
            finished = session.wait_for(|session| !session.active) => {
                finished?;
                break;
            }
            interrupted = tokio::signal::ctrl_c() => {
                interrupted?;
                page.stop();
                info!("stopped watching");
                return Ok(());
            }
        }
    }

    info!("report ready: {}", page.detail_url());
    Ok(())
}
