//! Search engine access.
//!
//! All persistence and retrieval is delegated to an external full-text engine
//! reached through the [`SearchEngine`] trait:
//!
//! - [`ElasticsearchClient`] talks to an Elasticsearch cluster over its REST API
//! - [`InMemoryEngine`] keeps documents in process (development and tests)
//! - [`ConnectionSupervisor`] gates traffic on a verified connection and
//!   provisions the document index exactly once

mod elasticsearch;
mod error;
mod memory;
mod supervisor;

pub use elasticsearch::ElasticsearchClient;
pub use error::{EngineError, EngineResult};
pub use memory::InMemoryEngine;
pub use supervisor::{
    acquire_connection, probe, provision_index, seed_documents, ConnectionSupervisor,
    STARTER_DOCUMENTS,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Document body as stored in the engine (`_source`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
}

impl StoredDocument {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
        }
    }

    pub fn with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            text: text.into(),
        }
    }
}

/// A single result record: store-assigned id plus the stored body
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    pub score: Option<f64>,
    pub source: StoredDocument,
}

/// Index definition: `id` is an exact-match keyword, `text` is analyzed full text
pub fn document_index_definition() -> Value {
    json!({
        "mappings": {
            "properties": {
                "id": {"type": "keyword"},
                "text": {"type": "text"}
            }
        }
    })
}

/// Operations the gateway needs from a search engine
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Lightweight reachability check
    async fn ping(&self) -> EngineResult<()>;

    /// Cluster health document
    async fn cluster_health(&self) -> EngineResult<Value>;

    async fn index_exists(&self, index: &str) -> EngineResult<bool>;

    /// Create an index. Creating an index that already exists is not an error.
    async fn create_index(&self, index: &str, definition: &Value) -> EngineResult<()>;

    /// Store a document, returning its id. With `id == None` the engine assigns one.
    async fn index_document(
        &self,
        index: &str,
        id: Option<&str>,
        document: &StoredDocument,
    ) -> EngineResult<String>;

    async fn get_document(&self, index: &str, id: &str) -> EngineResult<Option<Hit>>;

    /// Partial update of the `text` field. Missing ids yield [`EngineError::NotFound`].
    async fn update_text(&self, index: &str, id: &str, text: &str) -> EngineResult<()>;

    /// Missing ids yield [`EngineError::NotFound`].
    async fn delete_document(&self, index: &str, id: &str) -> EngineResult<()>;

    /// Full-text `match` on `text` when `query` is given, every document otherwise
    async fn search(&self, index: &str, query: Option<&str>, size: usize)
        -> EngineResult<Vec<Hit>>;

    async fn count(&self, index: &str) -> EngineResult<u64>;
}
