use crate::config::FrontendConfig;
use crate::error::{AppError, Result};
use crate::models::{FetchOutcome, InsertReceipt, MessageSet};
use futures::future::join_all;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of probing one backend endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProbeReport {
    /// The endpoint answered, whatever the status
    Responded { status_code: u16, body: Value },
    /// No HTTP answer at all
    Failed { error: String },
}

impl ProbeReport {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeReport::Responded { status_code, .. } if (200..300).contains(status_code))
    }
}

/// HTTP client for the backend gateway
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: Url,
    timeout_secs: u64,
    probe_endpoints: Vec<String>,
}

impl BackendClient {
    pub fn new(config: &FrontendConfig) -> Result<Self> {
        let base_url = Url::parse(&config.backend_url).map_err(|e| {
            AppError::Configuration(format!(
                "Invalid backend URL '{}': {}",
                config.backend_url, e
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Configuration(format!(
                "Invalid backend URL '{}': not a base URL",
                config.backend_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("search-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout_secs: config.timeout_secs,
            probe_endpoints: config.probe_endpoints.clone(),
        })
    }

    /// Backend URL for a path such as `/get` or `/documents/`
    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}{}", base, path))
            .map_err(|e| AppError::Configuration(format!("Invalid backend path '{}': {}", path, e)))
    }

    fn network_error(&self, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::Network(format!(
                "Backend request timed out after {} seconds",
                self.timeout_secs
            ))
        } else if err.is_connect() {
            AppError::Network(format!("Failed to connect to backend: {}", err))
        } else {
            AppError::Network(format!("Backend request failed: {}", err))
        }
    }

    async fn ensure_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_else(|_| String::new());
        Err(AppError::Network(format!(
            "Backend returned non-success status {}: {}",
            status,
            if body.is_empty() {
                "No response body"
            } else {
                &body
            }
        )))
    }

    /// Forward `/get`. Never fails: a broken backend yields an empty mapping
    /// and the reason.
    pub async fn fetch_documents(&self, query: Option<&str>) -> FetchOutcome {
        match self.try_fetch_documents(query).await {
            Ok(set) => set.into(),
            Err(e) => {
                warn!(error = %e, "Falling back to empty result set");
                FetchOutcome::failed(e.to_string())
            }
        }
    }

    async fn try_fetch_documents(&self, query: Option<&str>) -> Result<MessageSet> {
        let mut request = self.client.get(self.endpoint("/get")?);
        if let Some(query) = query {
            request = request.query(&[("query", query)]);
        }

        let response = request.send().await.map_err(|e| self.network_error(e))?;
        let response = Self::ensure_success(response).await?;
        response
            .json::<MessageSet>()
            .await
            .map_err(|e| AppError::Serialization(format!("Unexpected backend response: {}", e)))
    }

    /// Forward an insert whose text is part of the route
    pub async fn insert_via_path(&self, text: &str) -> Result<InsertReceipt> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Configuration(format!("Cannot extend URL {}", self.base_url)))?
            .pop_if_empty()
            .push("insert")
            .push(text);

        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| self.network_error(e))?;
        let response = Self::ensure_success(response).await?;
        let receipt = response
            .json::<InsertReceipt>()
            .await
            .map_err(|e| AppError::Serialization(format!("Unexpected backend response: {}", e)))?;

        debug!(document_id = %receipt.document.id, "Insert forwarded");
        Ok(receipt)
    }

    /// Probe every configured endpoint concurrently. Each report stands on its
    /// own; one failing endpoint does not affect the others.
    pub async fn diagnose_peers(&self) -> BTreeMap<String, ProbeReport> {
        let probes = self
            .probe_endpoints
            .iter()
            .map(|path| async move { (path.clone(), self.probe(path).await) });

        join_all(probes).await.into_iter().collect()
    }

    async fn probe(&self, path: &str) -> ProbeReport {
        let url = match self.endpoint(path) {
            Ok(url) => url,
            Err(e) => {
                return ProbeReport::Failed {
                    error: e.to_string(),
                }
            }
        };

        match self.client.get(url).send().await {
            Ok(response) => {
                let status_code = response.status().as_u16();
                let text = response.text().await.unwrap_or_else(|_| String::new());
                let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
                ProbeReport::Responded { status_code, body }
            }
            Err(e) => {
                warn!(endpoint = %path, error = %e, "Backend probe failed");
                ProbeReport::Failed {
                    error: self.network_error(e).to_string(),
                }
            }
        }
    }
}
