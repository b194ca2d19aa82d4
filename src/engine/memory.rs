use crate::engine::{EngineError, EngineResult, Hit, SearchEngine, StoredDocument};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredEntry {
    seq: u64,
    document: StoredDocument,
}

#[derive(Debug, Clone, Default)]
struct InMemoryIndex {
    definition: Value,
    documents: HashMap<String, StoredEntry>,
}

/// In-process search engine (for development and testing).
///
/// Matching lowercases and splits on non-alphanumeric characters; a document
/// matches when it shares at least one term with the query, scored by the
/// number of shared terms.
#[derive(Clone, Default)]
pub struct InMemoryEngine {
    indices: Arc<DashMap<String, InMemoryIndex>>,
    seq: Arc<AtomicU64>,
    failing_pings: Arc<AtomicU32>,
    pings: Arc<AtomicU32>,
    ping_delay: Duration,
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose first `failures` pings are refused
    pub fn unavailable_for(failures: u32) -> Self {
        let engine = Self::new();
        engine.failing_pings.store(failures, Ordering::SeqCst);
        engine
    }

    /// Every ping takes `delay` before answering
    pub fn with_ping_delay(mut self, delay: Duration) -> Self {
        self.ping_delay = delay;
        self
    }

    /// Number of pings received so far
    pub fn ping_count(&self) -> u32 {
        self.pings.load(Ordering::SeqCst)
    }

    /// Definition the index was created with
    pub fn index_definition(&self, index: &str) -> Option<Value> {
        self.indices.get(index).map(|i| i.definition.clone())
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }

    fn not_found(id: &str) -> EngineError {
        EngineError::NotFound(format!("Document {} not found", id))
    }
}

#[async_trait]
impl SearchEngine for InMemoryEngine {
    async fn ping(&self) -> EngineResult<()> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if !self.ping_delay.is_zero() {
            tokio::time::sleep(self.ping_delay).await;
        }
        let refused = self
            .failing_pings
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if refused {
            Err(EngineError::Unavailable("Connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    async fn cluster_health(&self) -> EngineResult<Value> {
        Ok(json!({
            "cluster_name": "in-memory",
            "status": "green",
            "number_of_nodes": 1,
            "indices": self.indices.len(),
        }))
    }

    async fn index_exists(&self, index: &str) -> EngineResult<bool> {
        Ok(self.indices.contains_key(index))
    }

    async fn create_index(&self, index: &str, definition: &Value) -> EngineResult<()> {
        self.indices
            .entry(index.to_string())
            .or_insert_with(|| InMemoryIndex {
                definition: definition.clone(),
                documents: HashMap::new(),
            });
        Ok(())
    }

    async fn index_document(
        &self,
        index: &str,
        id: Option<&str>,
        document: &StoredDocument,
    ) -> EngineResult<String> {
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let seq = self.next_seq();

        let mut target = self.indices.entry(index.to_string()).or_default();
        target.documents.insert(
            id.clone(),
            StoredEntry {
                seq,
                document: document.clone(),
            },
        );
        tracing::debug!(index, document_id = %id, "Document indexed");
        Ok(id)
    }

    async fn get_document(&self, index: &str, id: &str) -> EngineResult<Option<Hit>> {
        Ok(self.indices.get(index).and_then(|i| {
            i.documents.get(id).map(|entry| Hit {
                id: id.to_string(),
                score: None,
                source: entry.document.clone(),
            })
        }))
    }

    async fn update_text(&self, index: &str, id: &str, text: &str) -> EngineResult<()> {
        let mut target = self.indices.get_mut(index).ok_or_else(|| Self::not_found(id))?;
        let entry = target
            .documents
            .get_mut(id)
            .ok_or_else(|| Self::not_found(id))?;
        entry.document.text = text.to_string();
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &str) -> EngineResult<()> {
        let mut target = self.indices.get_mut(index).ok_or_else(|| Self::not_found(id))?;
        target
            .documents
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(id))
    }

    async fn search(
        &self,
        index: &str,
        query: Option<&str>,
        size: usize,
    ) -> EngineResult<Vec<Hit>> {
        let target = self.indices.get(index).ok_or_else(|| EngineError::Status {
            status: 404,
            body: format!("index_not_found_exception: no such index [{}]", index),
        })?;

        let query_terms = query.map(terms);
        let mut scored: Vec<(f64, u64, Hit)> = target
            .documents
            .iter()
            .filter_map(|(id, entry)| {
                let score = match &query_terms {
                    Some(wanted) => {
                        let shared = terms(&entry.document.text).intersection(wanted).count();
                        if shared == 0 {
                            return None;
                        }
                        shared as f64
                    }
                    None => 1.0,
                };
                Some((
                    score,
                    entry.seq,
                    Hit {
                        id: id.clone(),
                        score: Some(score),
                        source: entry.document.clone(),
                    },
                ))
            })
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        Ok(scored.into_iter().take(size).map(|(_, _, hit)| hit).collect())
    }

    async fn count(&self, index: &str) -> EngineResult<u64> {
        Ok(self
            .indices
            .get(index)
            .map(|i| i.documents.len() as u64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_pings_then_recovers() {
        let engine = InMemoryEngine::unavailable_for(2);
        assert!(engine.ping().await.is_err());
        assert!(engine.ping().await.is_err());
        assert!(engine.ping().await.is_ok());
        assert_eq!(engine.ping_count(), 3);
    }

    #[tokio::test]
    async fn test_match_ranks_by_shared_terms() {
        let engine = InMemoryEngine::new();
        let a = engine
            .index_document("docs", None, &StoredDocument::text("alpha beta"))
            .await
            .unwrap();
        let b = engine
            .index_document("docs", None, &StoredDocument::text("alpha beta gamma"))
            .await
            .unwrap();
        engine
            .index_document("docs", None, &StoredDocument::text("delta"))
            .await
            .unwrap();

        let hits = engine.search("docs", Some("Beta, gamma!"), 10).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.clone()).collect();
        assert_eq!(ids, vec![b, a]);
    }

    #[tokio::test]
    async fn test_match_all_in_insertion_order_and_size() {
        let engine = InMemoryEngine::new();
        for text in ["one", "two", "three"] {
            engine
                .index_document("docs", Some(text), &StoredDocument::text(text))
                .await
                .unwrap();
        }

        let hits = engine.search("docs", None, 2).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_missing_document_operations() {
        let engine = InMemoryEngine::new();
        assert!(engine.get_document("docs", "1").await.unwrap().is_none());
        assert!(matches!(
            engine.update_text("docs", "1", "x").await,
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            engine.delete_document("docs", "1").await,
            Err(EngineError::NotFound(_))
        ));
        assert_eq!(engine.count("docs").await.unwrap(), 0);
    }
}
