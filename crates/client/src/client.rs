//! HTTP client for the reconciliation dashboard API.
//!
//! One `ApiClient` per page/session. The anti-forgery token is injected once
//! at construction and attached to every request; it is never re-derived per
//! call. All failures convert into the typed errors from
//! `concilia-core::errors` before reaching any caller.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;

use concilia_core::constants::{DEFAULT_READ_TIMEOUT_SECS, LOGIN_PATH, MAX_PROCESS_TIMEOUT_SECS};
use concilia_core::errors::{Error, Result};
use concilia_core::snapshot::Snapshot;
use concilia_core::upload::UploadSummary;

use crate::models::{
    DetailEnvelope, DetailPage, DetailQuery, KpisEnvelope, ProcessEnvelope, ProcessRequest,
    ReconciliationOutcome, UploadEnvelope,
};

/// Header carrying the anti-forgery token.
const CSRF_HEADER: &str = "X-CSRF-Token";

/// Builds the login route with the interrupted path as the return target.
pub fn login_redirect(path: &str) -> String {
    format!("{}?next={}", LOGIN_PATH, urlencoding::encode(path))
}

/// Trait for the drill-down modal's page-driven data source.
///
/// Each page change re-invokes this with an updated `page`; the modal never
/// slices a client-held full list.
#[async_trait]
pub trait DetailFetcher: Send + Sync {
    async fn fetch_page(&self, query: &DetailQuery) -> Result<DetailPage>;
}

/// HTTP client for the dashboard API.
///
/// # Example
///
/// ```ignore
/// let client = ApiClient::new("https://painel.example", csrf_token)?;
/// let snapshot = client.fetch_kpis().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    csrf_header: HeaderValue,
    read_timeout: Duration,
}

impl ApiClient {
    /// Creates a client for `base_url`, capturing the anti-forgery token.
    pub fn new(base_url: &str, csrf_token: &str) -> Result<Self> {
        let csrf_header = HeaderValue::from_str(csrf_token)
            .map_err(|e| Error::BadPayload(format!("invalid CSRF token: {}", e)))?;

        let read_timeout = Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS);
        let client = reqwest::Client::builder()
            .timeout(read_timeout)
            .build()
            .map_err(|e| Error::Network(format!("failed to initialize HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            csrf_header,
            read_timeout,
        })
    }

    /// Overrides the default read timeout (30 s).
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    /// Default headers: the token on every request.
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CSRF_HEADER, self.csrf_header.clone());
        headers
    }

    /// Sends a request and parses the JSON body, mapping transport and HTTP
    /// failures into the typed taxonomy. `path` is used for the 401/403
    /// login-redirect rule on API routes.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
        timeout: Duration,
    ) -> Result<T> {
        let response = match tokio::time::timeout(timeout, request.send()).await {
            Err(_) => return Err(Error::Timeout(timeout)),
            Ok(Err(e)) if e.is_timeout() => return Err(Error::Timeout(timeout)),
            Ok(Err(e)) => return Err(Error::Network(e.to_string())),
            Ok(Ok(response)) => response,
        };

        let status = response.status().as_u16();
        if (status == 401 || status == 403) && path.starts_with("/api/") {
            return Err(Error::Unauthorized {
                login_path: login_redirect(path),
            });
        }
        if !(200..300).contains(&status) {
            return Err(Error::Http { status });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| Error::BadJson(e.to_string()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Endpoints
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetches the aggregate KPI payload and validates it into a snapshot.
    pub async fn fetch_kpis(&self) -> Result<Snapshot> {
        let path = "/api/v1/dashboard/kpis";
        debug!("[ApiClient] GET {}", path);

        let request = self.client.get(self.url(path)).headers(self.headers());
        let envelope: KpisEnvelope = self.execute(request, path, self.read_timeout).await?;
        envelope.into_snapshot(Utc::now())
    }

    /// Fetches one page of reconciliation detail rows.
    pub async fn fetch_detail(&self, query: &DetailQuery) -> Result<DetailPage> {
        let path = format!("/api/v1/conciliacao/detalhes?{}", query.to_query_string());
        debug!("[ApiClient] GET {}", path);

        let request = self.client.get(self.url(&path)).headers(self.headers());
        let envelope: DetailEnvelope = self.execute(request, &path, self.read_timeout).await?;
        envelope.into_page()
    }

    /// Submits a prepared multipart form to the upload endpoint.
    ///
    /// The caller builds the form so it can instrument the file parts with
    /// progress reporting; see the upload pipeline.
    pub async fn upload_multipart(
        &self,
        form: reqwest::multipart::Form,
        timeout: Duration,
    ) -> Result<UploadSummary> {
        let path = "/operacoes/upload";
        debug!("[ApiClient] POST {} (multipart)", path);

        let request = self
            .client
            .post(self.url(path))
            .headers(self.headers())
            .multipart(form);
        let envelope: UploadEnvelope = self.execute(request, path, timeout).await?;
        envelope.into_summary()
    }

    /// Triggers the server-side reconciliation run.
    ///
    /// Reconciliation over a large period is slow, so the timeout is
    /// caller-configurable up to 60 s.
    pub async fn run_reconciliation(
        &self,
        body: &ProcessRequest,
        timeout: Duration,
    ) -> Result<ReconciliationOutcome> {
        let path = "/api/v1/conciliacao/processar";
        let timeout = timeout.min(Duration::from_secs(MAX_PROCESS_TIMEOUT_SECS));
        debug!("[ApiClient] POST {} (timeout {:?})", path, timeout);

        let mut headers = self.headers();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let request = self
            .client
            .post(self.url(path))
            .headers(headers)
            .json(body);
        let envelope: ProcessEnvelope = self.execute(request, path, timeout).await?;
        envelope.into_outcome()
    }
}

#[async_trait]
impl DetailFetcher for ApiClient {
    async fn fetch_page(&self, query: &DetailQuery) -> Result<DetailPage> {
        self.fetch_detail(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation_and_url_normalization() {
        let client = ApiClient::new("https://painel.example/", "tok-123").unwrap();
        assert_eq!(client.base_url, "https://painel.example");
        assert_eq!(client.url("/api/v1/dashboard/kpis"), "https://painel.example/api/v1/dashboard/kpis");
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        assert!(ApiClient::new("https://painel.example", "bad\ntoken").is_err());
    }

    #[test]
    fn test_login_redirect_carries_return_target() {
        assert_eq!(
            login_redirect("/api/v1/dashboard/kpis"),
            "/auth/login?next=%2Fapi%2Fv1%2Fdashboard%2Fkpis"
        );
    }

    #[test]
    fn test_headers_always_carry_token() {
        let client = ApiClient::new("https://painel.example", "tok-123").unwrap();
        let headers = client.headers();
        assert_eq!(headers.get(CSRF_HEADER).unwrap(), "tok-123");
    }
}
