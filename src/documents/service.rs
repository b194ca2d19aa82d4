use crate::config::{ElasticsearchConfig, IdStrategy};
use crate::engine::{ConnectionSupervisor, SearchEngine, StoredDocument};
use crate::error::{AppError, Result};
use crate::models::{Document, MessageSet, RankedHit};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Translates CRUD and search calls into engine operations and reshapes the
/// results into the API contract.
pub struct DocumentService {
    supervisor: Arc<ConnectionSupervisor>,
    id_strategy: IdStrategy,
    max_results: usize,
}

/// Blank queries list everything
fn normalize_query(query: Option<&str>) -> Option<&str> {
    query.map(str::trim).filter(|q| !q.is_empty())
}

impl DocumentService {
    pub fn new(supervisor: Arc<ConnectionSupervisor>) -> Self {
        Self {
            supervisor,
            id_strategy: IdStrategy::Engine,
            max_results: 1000,
        }
    }

    pub fn from_config(supervisor: Arc<ConnectionSupervisor>, config: &ElasticsearchConfig) -> Self {
        Self::new(supervisor)
            .with_id_strategy(config.id_strategy)
            .with_max_results(config.max_results)
    }

    pub fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    fn index(&self) -> &str {
        self.supervisor.index()
    }

    async fn engine(&self) -> Result<Arc<dyn SearchEngine>> {
        Ok(self.supervisor.acquire().await?)
    }

    /// Store a new document and return it with its assigned id
    pub async fn create_document(&self, text: &str) -> Result<Document> {
        let engine = self.engine().await?;

        let id = match self.id_strategy {
            IdStrategy::Engine => {
                engine
                    .index_document(self.index(), None, &StoredDocument::text(text))
                    .await?
            }
            IdStrategy::Sequential => {
                let next = (engine.count(self.index()).await? + 1).to_string();
                engine
                    .index_document(
                        self.index(),
                        Some(next.as_str()),
                        &StoredDocument::with_id(next.clone(), text),
                    )
                    .await?
            }
        };

        info!(document_id = %id, "Document created");
        Ok(Document::new(id, text))
    }

    pub async fn read_document(&self, id: &str) -> Result<Document> {
        let engine = self.engine().await?;
        engine
            .get_document(self.index(), id)
            .await?
            .map(Document::from)
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))
    }

    /// Full-text match on `text` when a query is given, every document otherwise.
    /// Documents come back in engine order.
    pub async fn list_or_search(&self, query: Option<&str>) -> Result<Vec<Document>> {
        let engine = self.engine().await?;
        let query = normalize_query(query);
        let hits = engine.search(self.index(), query, self.max_results).await?;
        debug!(query = ?query, hits = hits.len(), "Search completed");
        Ok(hits.into_iter().map(Document::from).collect())
    }

    /// Same selection as [`Self::list_or_search`], reshaped into the id mapping
    pub async fn messages(&self, query: Option<&str>) -> Result<MessageSet> {
        Ok(MessageSet::from_documents(self.list_or_search(query).await?))
    }

    /// Hits in relevance order with their scores
    pub async fn ranked_search(&self, query: &str) -> Result<Vec<RankedHit>> {
        let query = normalize_query(Some(query))
            .ok_or_else(|| AppError::Validation("query must not be empty".to_string()))?;
        let engine = self.engine().await?;
        let hits = engine
            .search(self.index(), Some(query), self.max_results)
            .await?;
        Ok(hits.into_iter().map(RankedHit::from).collect())
    }

    /// Replace the text of an existing document. The id never changes.
    pub async fn update_document(&self, id: &str, text: &str) -> Result<Document> {
        let engine = self.engine().await?;
        engine.update_text(self.index(), id, text).await?;
        info!(document_id = %id, "Document updated");
        Ok(Document::new(id, text))
    }

    /// Delete by id. A missing id is reported as not found.
    pub async fn delete_document(&self, id: &str) -> Result<()> {
        let engine = self.engine().await?;
        engine.delete_document(self.index(), id).await?;
        info!(document_id = %id, "Document deleted");
        Ok(())
    }

    /// Cluster health of the engine behind this service
    pub async fn store_status(&self) -> Result<Value> {
        let engine = self.engine().await?;
        Ok(engine.cluster_health().await?)
    }
}
