use crate::{ReportId, requests, responses};
use reqwest::StatusCode;
use serde::Serialize;

type ReqwestResult = Result<reqwest::Response, reqwest::Error>;

/// An API client for interfacing with the diagnostics backend.
#[derive(Clone)]
pub struct APIClient {
    pub address: String,
    pub inner_client: reqwest::Client,
}

/// Helper methods for http actions
impl APIClient {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            inner_client: reqwest::Client::new(),
        }
    }

    fn format_url(&self, path: &str) -> String {
        format!("{}/api/{path}", &self.address)
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> ReqwestResult {
        let request = self.inner_client.post(self.format_url(path)).json(body);

        #[cfg(target_arch = "wasm32")]
        let request = request.fetch_credentials_include();

        request.send().await
    }

    async fn empty_get(&self, path: &str) -> ReqwestResult {
        let request = self.inner_client.get(self.format_url(path));

        #[cfg(target_arch = "wasm32")]
        let request = request.fetch_credentials_include();

        request.send().await
    }

    async fn query_get(
        &self,
        path: &str,
        query: &impl Serialize,
    ) -> ReqwestResult {
        let request = self.inner_client.get(self.format_url(path)).query(query);

        #[cfg(target_arch = "wasm32")]
        let request = request.fetch_credentials_include();

        request.send().await
    }
}

/// Methods on the diagnostics API
impl APIClient {
    pub async fn health_check(&self) -> Result<(), ClientError> {
        let response = self.empty_get("health_check").await?;
        ok_empty(response).await
    }

    /// List slow queries matching the filter.
    pub async fn slow_query_list(
        &self,
        query: &requests::SlowQueryList,
    ) -> Result<Vec<responses::SlowQuery>, ClientError> {
        let response = self.query_get("slow_query/list", query).await?;
        ok_body(response).await
    }

    /// List continuous profiling rounds started inside the time range.
    pub async fn continuous_profiling_group_profiles(
        &self,
        query: &requests::GroupProfiles,
    ) -> Result<Vec<responses::GroupProfile>, ClientError> {
        let response = self
            .query_get("continuous_profiling/group_profiles", query)
            .await?;
        ok_body(response).await
    }

    pub async fn continuous_profiling_config(
        &self,
    ) -> Result<responses::NgMonitoringConfig, ClientError> {
        let response = self.empty_get("continuous_profiling/config").await?;
        ok_body(response).await
    }

    pub async fn update_continuous_profiling_config(
        &self,
        details: &requests::UpdateNgMonitoringConfig,
    ) -> Result<(), ClientError> {
        let response = self.post("continuous_profiling/config", details).await?;
        ok_empty(response).await
    }

    /// Estimated storage used by one day of continuous profiling.
    pub async fn continuous_profiling_estimate_size(
        &self,
    ) -> Result<responses::EstimateSize, ClientError> {
        let response = self
            .empty_get("continuous_profiling/estimate_size")
            .await?;
        ok_body(response).await
    }

    pub async fn report_status(
        &self,
        report_id: &ReportId,
    ) -> Result<responses::ReportStatus, ClientError> {
        let response = self
            .empty_get(&format!("diagnose/reports/{report_id}/status"))
            .await?;
        ok_body(response).await
    }

    /// Returns the URL of the rendered report.
    /// Use this for links in the UI.
    pub fn report_detail_url(&self, report_id: &ReportId) -> String {
        format!("{}/api/diagnose/reports/{report_id}/detail", self.address)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An unhandled API error to display, containing response text.
    #[error("{1}")]
    APIError(StatusCode, String),
    #[error("Network error. Please check your connection.")]
    Network(#[from] reqwest::Error),
}

impl ClientError {
    /// The structured error body, if the backend sent one.
    pub fn error_body(&self) -> Option<responses::ErrorBody> {
        match self {
            ClientError::APIError(_, text) => serde_json::from_str(text).ok(),
            ClientError::Network(_) => None,
        }
    }
}

/// Deserialize a successful request into the desired type, or return an
/// appropriate error.
pub async fn ok_body<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::APIError(
            response.status(),
            response.text().await?,
        ));
    }
    Ok(response.json::<T>().await?)
}

/// Check that an empty response is OK, returning a ClientError if not.
pub async fn ok_empty(response: reqwest::Response) -> Result<(), ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::APIError(
            response.status(),
            response.text().await?,
        ));
    }
    Ok(())
}
