//! Continuous profiling settings drawer.

use std::cell::Cell;

use fetch::{ErrorInfo, FetchOptions, FetchReturn, Fetcher, Refetch};
use payloads::{ContinuousProfilingConfig, requests, responses};
use tokio::sync::watch;

use crate::Dashboard;
use crate::telemetry::log_error;

pub const ONE_DAY_SECONDS: u64 = 24 * 60 * 60;

/// Retention durations always offered.
pub const RETENTION_SECONDS: [u64; 3] =
    [3 * ONE_DAY_SECONDS, 5 * ONE_DAY_SECONDS, 10 * ONE_DAY_SECONDS];

/// Editable fields of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsValues {
    pub enable: bool,
    pub data_retention_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Switching the feature off must be confirmed first; nothing was sent.
    NeedsConfirmation,
    Saved,
}

/// Retention choices: the fixed ones plus the current value when it is a
/// whole number of days, ascending.
pub fn retention_options(current: Option<u64>) -> Vec<u64> {
    let mut options = RETENTION_SECONDS.to_vec();
    let extra = current.filter(|&seconds| {
        seconds != 0
            && seconds % ONE_DAY_SECONDS == 0
            && !options.contains(&seconds)
    });
    if let Some(current) = extra {
        options.push(current);
        options.sort_unstable();
    }
    options
}

pub fn format_retention_days(seconds: u64) -> String {
    if seconds % ONE_DAY_SECONDS != 0 {
        tracing::warn!("{seconds} is not a multiple of one day");
    }
    let days = seconds as f64 / ONE_DAY_SECONDS as f64;
    format!("{days} days")
}

/// Byte size with decimal (SI) units and no fraction, e.g. `12 MB`.
pub fn format_decbytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "kB", "MB", "GB", "TB", "PB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    format!("{value:.0} {}", UNITS[unit])
}

/// Marks a save as in flight until dropped, also when the caller gives up
/// on the `submit` future.
struct Submitting<'a>(&'a Cell<bool>);

impl<'a> Submitting<'a> {
    fn start(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for Submitting<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct ConProfSettings {
    dashboard: Dashboard,
    config: Fetcher<responses::NgMonitoringConfig>,
    estimate: Fetcher<responses::EstimateSize>,
    on_config_updated: Option<Refetch>,
    submitting: Cell<bool>,
}

impl ConProfSettings {
    /// `on_config_updated` runs after a successful save, typically the list
    /// page's [`config_refetch`](crate::conprof::ConProfList::config_refetch).
    pub fn mount(dashboard: &Dashboard, on_config_updated: Option<Refetch>) -> Self {
        let mut form = Self {
            dashboard: dashboard.clone(),
            config: Fetcher::new(
                FetchOptions::custom_errors(),
                dashboard.error_bar.clone(),
            ),
            estimate: Fetcher::new(
                FetchOptions::custom_errors(),
                dashboard.error_bar.clone(),
            ),
            on_config_updated,
            submitting: Cell::new(false),
        };

        let client = dashboard.client.clone();
        form.config.execute((), move || {
            let client = client.clone();
            async move { client.continuous_profiling_config().await }
        });
        let client = dashboard.client.clone();
        form.estimate.execute((), move || {
            let client = client.clone();
            async move { client.continuous_profiling_estimate_size().await }
        });
        form
    }

    pub fn config(&self) -> FetchReturn<responses::NgMonitoringConfig> {
        self.config.snapshot()
    }

    pub fn estimate(&self) -> FetchReturn<responses::EstimateSize> {
        self.estimate.snapshot()
    }

    pub fn config_subscribe(
        &self,
    ) -> watch::Receiver<FetchReturn<responses::NgMonitoringConfig>> {
        self.config.subscribe()
    }

    pub fn estimate_subscribe(
        &self,
    ) -> watch::Receiver<FetchReturn<responses::EstimateSize>> {
        self.estimate.subscribe()
    }

    /// Initial form values, once the config is loaded.
    pub fn initial_values(&self) -> Option<SettingsValues> {
        let config = self.config.snapshot();
        let conprof = config.data()?.continuous_profiling.as_ref()?;
        Some(SettingsValues {
            enable: conprof.enable,
            data_retention_seconds: conprof.data_retention_seconds,
        })
    }

    pub fn retention_options(&self) -> Vec<u64> {
        retention_options(
            self.initial_values()
                .map(|values| values.data_retention_seconds),
        )
    }

    /// Hint under the target selector: instance count and estimated daily
    /// size, `?` while unknown.
    pub fn targets_hint(&self) -> (String, String) {
        match self.estimate.snapshot().data() {
            Some(estimate) => (
                estimate.instance_count.to_string(),
                format_decbytes(estimate.profile_size),
            ),
            None => ("?".into(), "?".into()),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.get()
    }

    /// Save the settings. Failures are shown on the error bar and returned.
    pub async fn submit(
        &self,
        values: SettingsValues,
        confirmed: bool,
    ) -> Result<SubmitOutcome, ErrorInfo> {
        if !values.enable && !confirmed {
            return Ok(SubmitOutcome::NeedsConfirmation);
        }

        let current = self
            .config
            .snapshot()
            .data()
            .and_then(|config| config.continuous_profiling.clone())
            .unwrap_or_default();
        let details = requests::UpdateNgMonitoringConfig {
            continuous_profiling: ContinuousProfilingConfig {
                enable: values.enable,
                data_retention_seconds: values.data_retention_seconds,
                ..current
            },
        };

        let result = {
            let _submitting = Submitting::start(&self.submitting);
            self.dashboard
                .client
                .update_continuous_profiling_config(&details)
                .await
        };

        match result {
            Ok(()) => {
                tracing::info!(
                    enable = values.enable,
                    retention = values.data_retention_seconds,
                    "continuous profiling settings saved"
                );
                self.config.refetch();
                if let Some(on_config_updated) = &self.on_config_updated {
                    on_config_updated.emit();
                }
                Ok(SubmitOutcome::Saved)
            }
            Err(e) => {
                let error = ErrorInfo::from(e);
                log_error(
                    anyhow::Error::new(error.clone())
                        .context("failed to save continuous profiling settings"),
                );
                self.dashboard.error_bar.push(error.clone());
                Err(error)
            }
        }
    }
}
