//! Runtime configuration from environment variables.

use std::time::Duration;

/// Dashboard configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the reconciliation server.
    pub base_url: String,
    /// Anti-forgery token, injected once and attached to every request.
    pub csrf_token: String,
    /// Company the dashboard is scoped to.
    pub empresa_id: String,
    /// KPI poll interval.
    pub poll_interval: Duration,
    /// Page size for the drill-down detail table.
    pub per_page: u32,
}

impl Config {
    pub fn from_env() -> Self {
        let poll_secs = std::env::var("CONCILIA_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(10)
            .max(1);
        let per_page = std::env::var("CONCILIA_PER_PAGE")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(50)
            .clamp(1, 500);

        Self {
            base_url: std::env::var("CONCILIA_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:5000".to_string()),
            csrf_token: std::env::var("CONCILIA_CSRF_TOKEN").unwrap_or_default(),
            empresa_id: std::env::var("CONCILIA_EMPRESA_ID").unwrap_or_default(),
            poll_interval: Duration::from_secs(poll_secs),
            per_page,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            csrf_token: String::new(),
            empresa_id: String::new(),
            poll_interval: Duration::from_secs(10),
            per_page: 50,
        }
    }
}
