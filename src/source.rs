//! Remote data sources: the backend functions endpoint and an in-memory stand-in.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::json;
use tracing::debug;

use crate::config::BackendConfig;
use crate::filters::FilterSet;
use crate::payload::{normalize_payload, DashboardPayload, FetchError};

const MAX_ERROR_BODY_CHARS: usize = 512;

#[async_trait]
pub trait DashboardDataSource: Send + Sync + 'static {
    async fn fetch_dashboard_data(
        &self,
        operation: &str,
        filters: &FilterSet,
    ) -> Result<DashboardPayload, FetchError>;
}

/// Calls `POST {base_url}/functions/v1/{operation}` with `{"filters": {...}}`.
#[derive(Debug, Clone)]
pub struct HttpDataSource {
    client: reqwest::Client,
    config: BackendConfig,
}

impl HttpDataSource {
    pub fn new(config: BackendConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn endpoint_url(&self, operation: &str) -> String {
        endpoint_url(&self.config.base_url, operation)
    }
}

pub fn endpoint_url(base_url: &str, operation: &str) -> String {
    format!(
        "{}/functions/v1/{}",
        base_url.trim_end_matches('/'),
        operation.trim_start_matches('/')
    )
}

pub fn request_body(filters: &FilterSet) -> serde_json::Value {
    json!({ "filters": filters })
}

#[async_trait]
impl DashboardDataSource for HttpDataSource {
    async fn fetch_dashboard_data(
        &self,
        operation: &str,
        filters: &FilterSet,
    ) -> Result<DashboardPayload, FetchError> {
        let url = self.endpoint_url(operation);
        let body = serde_json::to_vec(&request_body(filters))
            .map_err(|err| FetchError::Malformed(err.to_string()))?;

        debug!(
            component = "http_source",
            event = "http_source.request",
            operation,
            url = %url
        );

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.config.access_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.config.access_key))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_body(&bytes),
            });
        }

        normalize_payload(&bytes)
    }
}

fn truncate_body(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect()
}

/// Per-operation canned responses. Operations without an entry return an
/// empty payload.
#[derive(Debug, Default)]
pub struct StaticDataSource {
    responses: RwLock<HashMap<String, Result<DashboardPayload, FetchError>>>,
}

impl StaticDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(self, operation: &str, payload: DashboardPayload) -> Self {
        self.set_payload(operation, payload);
        self
    }

    pub fn set_payload(&self, operation: &str, payload: DashboardPayload) {
        self.responses
            .write()
            .expect("static source lock should not be poisoned")
            .insert(operation.to_string(), Ok(payload));
    }

    pub fn set_failure(&self, operation: &str, error: FetchError) {
        self.responses
            .write()
            .expect("static source lock should not be poisoned")
            .insert(operation.to_string(), Err(error));
    }
}

#[async_trait]
impl DashboardDataSource for StaticDataSource {
    async fn fetch_dashboard_data(
        &self,
        operation: &str,
        _filters: &FilterSet,
    ) -> Result<DashboardPayload, FetchError> {
        self.responses
            .read()
            .expect("static source lock should not be poisoned")
            .get(operation)
            .cloned()
            .unwrap_or_else(|| Ok(DashboardPayload::new()))
    }
}
