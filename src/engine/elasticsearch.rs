//! Elasticsearch REST client

use crate::config::ElasticsearchConfig;
use crate::engine::{EngineError, EngineResult, Hit, SearchEngine, StoredDocument};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Search engine backed by an Elasticsearch cluster
#[derive(Clone)]
pub struct ElasticsearchClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source")]
    source: Option<StoredDocument>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: Option<f64>,
    #[serde(rename = "_source")]
    source: StoredDocument,
}

impl From<RawHit> for Hit {
    fn from(raw: RawHit) -> Self {
        Hit {
            id: raw.id,
            score: raw.score,
            source: raw.source,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

impl ElasticsearchClient {
    /// Create a client for the cluster at `base_url`. No request is made.
    pub fn new(base_url: &str, timeout: Duration) -> EngineResult<Self> {
        let parsed = Url::parse(base_url).map_err(|e| {
            EngineError::Client(format!("Invalid Elasticsearch URL '{}': {}", base_url, e))
        })?;
        if parsed.cannot_be_a_base() {
            return Err(EngineError::Client(format!(
                "Invalid Elasticsearch URL '{}': not a base URL",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("search-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EngineError::Client(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: parsed,
            timeout,
        })
    }

    pub fn from_config(config: &ElasticsearchConfig) -> EngineResult<Self> {
        Self::new(&config.url, config.timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL with `segments` appended, each percent-encoded
    fn url(&self, segments: &[&str]) -> EngineResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| EngineError::Client(format!("Cannot extend URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Make writes visible to the next read or search
    fn with_refresh(mut url: Url) -> Url {
        url.query_pairs_mut().append_pair("refresh", "wait_for");
        url
    }

    async fn send(&self, request: RequestBuilder) -> EngineResult<Response> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                EngineError::Unavailable(format!(
                    "Request timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            } else {
                e.into()
            }
        })
    }
}

async fn status_error(response: Response) -> EngineError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    EngineError::Status { status, body }
}

async fn decode<T: DeserializeOwned>(response: Response) -> EngineResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| EngineError::Decode(e.to_string()))
}

#[async_trait]
impl SearchEngine for ElasticsearchClient {
    async fn ping(&self) -> EngineResult<()> {
        let response = self.send(self.client.head(self.base_url.clone())).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(EngineError::Unavailable(format!(
                "Ping returned status {}",
                response.status()
            )))
        }
    }

    async fn cluster_health(&self) -> EngineResult<Value> {
        let url = self.url(&["_cluster", "health"])?;
        let response = self.send(self.client.get(url)).await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        decode(response).await
    }

    async fn index_exists(&self, index: &str) -> EngineResult<bool> {
        let url = self.url(&[index])?;
        let response = self.send(self.client.head(url)).await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(status_error(response).await),
        }
    }

    async fn create_index(&self, index: &str, definition: &Value) -> EngineResult<()> {
        let url = self.url(&[index])?;
        let response = self.send(self.client.put(url).json(definition)).await?;
        if response.status().is_success() {
            return Ok(());
        }

        match status_error(response).await {
            // another instance created it between our existence check and now
            EngineError::Status { status: 400, body }
                if body.contains("resource_already_exists_exception") =>
            {
                debug!(index, "Index already exists");
                Ok(())
            }
            err => Err(err),
        }
    }

    async fn index_document(
        &self,
        index: &str,
        id: Option<&str>,
        document: &StoredDocument,
    ) -> EngineResult<String> {
        let request = match id {
            Some(id) => self
                .client
                .put(Self::with_refresh(self.url(&[index, "_doc", id])?)),
            None => self
                .client
                .post(Self::with_refresh(self.url(&[index, "_doc"])?)),
        };

        let response = self.send(request.json(document)).await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let written: WriteResponse = decode(response).await?;
        debug!(index, document_id = %written.id, "Document indexed");
        Ok(written.id)
    }

    async fn get_document(&self, index: &str, id: &str) -> EngineResult<Option<Hit>> {
        let url = self.url(&[index, "_doc", id])?;
        let response = self.send(self.client.get(url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let found: GetResponse = decode(response).await?;
                Ok(match (found.found, found.source) {
                    (true, Some(source)) => Some(Hit {
                        id: found.id,
                        score: None,
                        source,
                    }),
                    _ => None,
                })
            }
            _ => Err(status_error(response).await),
        }
    }

    async fn update_text(&self, index: &str, id: &str, text: &str) -> EngineResult<()> {
        let url = Self::with_refresh(self.url(&[index, "_update", id])?);
        let body = json!({ "doc": { "text": text } });
        let response = self.send(self.client.post(url).json(&body)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(EngineError::NotFound(format!(
                "Document {} not found",
                id
            ))),
            status if status.is_success() => Ok(()),
            _ => Err(status_error(response).await),
        }
    }

    async fn delete_document(&self, index: &str, id: &str) -> EngineResult<()> {
        let url = Self::with_refresh(self.url(&[index, "_doc", id])?);
        let response = self.send(self.client.delete(url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(EngineError::NotFound(format!(
                "Document {} not found",
                id
            ))),
            status if status.is_success() => Ok(()),
            _ => Err(status_error(response).await),
        }
    }

    async fn search(
        &self,
        index: &str,
        query: Option<&str>,
        size: usize,
    ) -> EngineResult<Vec<Hit>> {
        let url = self.url(&[index, "_search"])?;
        let query = match query {
            Some(text) => json!({ "match": { "text": text } }),
            None => json!({ "match_all": {} }),
        };
        let body = json!({ "query": query, "size": size });

        let response = self.send(self.client.post(url).json(&body)).await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let found: SearchResponse = decode(response).await?;
        Ok(found.hits.hits.into_iter().map(Hit::from).collect())
    }

    async fn count(&self, index: &str) -> EngineResult<u64> {
        let url = self.url(&[index, "_count"])?;
        let response = self.send(self.client.get(url)).await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        let counted: CountResponse = decode(response).await?;
        Ok(counted.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ElasticsearchClient {
        ElasticsearchClient::new(base, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_rejects_invalid_url() {
        assert!(ElasticsearchClient::new("not a url", Duration::from_secs(1)).is_err());
        assert!(ElasticsearchClient::new("mailto:ops@example.com", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_url_building_encodes_segments() {
        let es = client("http://elasticsearch:9200");
        let url = es.url(&["documents", "_doc", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://elasticsearch:9200/documents/_doc/a%2Fb%20c");
    }

    #[test]
    fn test_url_building_keeps_base_path() {
        let es = client("http://proxy.local/es/");
        let url = es.url(&["documents", "_count"]).unwrap();
        assert_eq!(url.as_str(), "http://proxy.local/es/documents/_count");
    }

    #[test]
    fn test_refresh_parameter() {
        let es = client("http://elasticsearch:9200");
        let url = ElasticsearchClient::with_refresh(es.url(&["documents", "_doc"]).unwrap());
        assert_eq!(url.query(), Some("refresh=wait_for"));
    }
}
