use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::ApiError;
use super::types::{AnalysisRecord, PaymentStatus, StartedAnalysis, UserSnapshot};
use super::ReportsApi;

const DEFAULT_BASE_URL: &str = "http://localhost:8001/api";

/// HTTP client for the report storefront backend.
#[derive(Clone)]
pub struct ApiClient {
    token: Option<String>,
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(token: Option<String>) -> Result<Self, ApiError> {
        Self::with_base_url(token, DEFAULT_BASE_URL.to_string(), Duration::from_secs(30))
    }

    /// Create a client pointing at a custom base URL (the `/api` prefix included).
    pub fn with_base_url(
        token: Option<String>,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            token: token.filter(|t| !t.is_empty()),
            client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Append path segments to the base URL. Each segment is percent-encoded,
    /// so ids containing `/`, `?` or `#` stay a single segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let response = checked(self.authorized(req).send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    /// Lists every analysis owned by the user. Backs the dashboard view.
    pub async fn list_analyses(&self) -> Result<Vec<AnalysisRecord>, ApiError> {
        self.send(self.client.get(self.endpoint(&["analyses"]))).await
    }

    /// Downloads the rendered PDF of a completed analysis.
    ///
    /// The backend answers 404 "PDF not available" until rendering finished.
    pub async fn download_report(&self, analysis_id: &str) -> Result<Vec<u8>, ApiError> {
        let req = self
            .client
            .get(self.endpoint(&["analysis", analysis_id, "download"]));
        let response = checked(self.authorized(req).send().await?).await?;
        let body = response.bytes().await?;
        debug!(analysis_id, bytes = body.len(), "report downloaded");
        Ok(body.to_vec())
    }
}

/// Turn a non-2xx response into the matching [`ApiError`].
async fn checked(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    debug!(status = status.as_u16(), url = %response.url(), "backend response");

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::from_status(status.as_u16(), &body));
    }
    Ok(response)
}

impl ReportsApi for ApiClient {
    async fn start_analysis_job(&self, property_id: &str) -> Result<StartedAnalysis, ApiError> {
        let url = self.endpoint(&["analysis", "generate", property_id]);
        self.send(self.client.post(url)).await
    }

    async fn get_analysis_status(&self, job_id: &str) -> Result<AnalysisRecord, ApiError> {
        self.send(self.client.get(self.endpoint(&["analysis", job_id])))
            .await
    }

    async fn get_payment_status(&self, session_id: &str) -> Result<PaymentStatus, ApiError> {
        let url = self.endpoint(&["payments", "status", session_id]);
        self.send(self.client.get(url)).await
    }

    async fn get_current_user_snapshot(&self) -> Result<UserSnapshot, ApiError> {
        self.send(self.client.get(self.endpoint(&["auth", "me"])))
            .await
    }
}
