use crate::config::ElasticsearchConfig;
use crate::engine::{
    document_index_definition, ElasticsearchClient, EngineError, EngineResult, SearchEngine,
    StoredDocument,
};
use crate::retry::{retry_with_policy, RetryPolicy};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Documents indexed under fixed ids when seeding is enabled
pub const STARTER_DOCUMENTS: [(&str, &str); 4] = [
    ("1", "India is a country in South Asia."),
    ("2", "It is the seventh-largest country by land area."),
    ("3", "India has a rich cultural heritage."),
    ("4", "New Delhi is the capital city of India."),
];

/// Owns the search engine handle and hands it out only once the engine has
/// answered a probe and the document index exists.
///
/// The handle is initialized at most once: concurrent first callers wait on
/// the same initialization. A failed initialization leaves the supervisor
/// unconnected so a later caller can try again.
pub struct ConnectionSupervisor {
    engine: Arc<dyn SearchEngine>,
    index: String,
    seed: bool,
    startup_policy: RetryPolicy,
    ready: OnceCell<Arc<dyn SearchEngine>>,
}

impl ConnectionSupervisor {
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        index: impl Into<String>,
        startup_policy: RetryPolicy,
    ) -> Self {
        Self {
            engine,
            index: index.into(),
            seed: false,
            startup_policy,
            ready: OnceCell::new(),
        }
    }

    pub fn from_config(engine: Arc<dyn SearchEngine>, config: &ElasticsearchConfig) -> Self {
        Self::new(engine, config.index.clone(), config.retry_policy())
            .with_seed_documents(config.seed_documents)
    }

    /// Index [`STARTER_DOCUMENTS`] as part of establishing the connection
    pub fn with_seed_documents(mut self, seed: bool) -> Self {
        self.seed = seed;
        self
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn is_connected(&self) -> bool {
        self.ready.initialized()
    }

    /// Startup gate: probe with the startup retry policy, then provision.
    ///
    /// Returns [`EngineError::Unavailable`] once the policy is exhausted.
    pub async fn connect(&self) -> EngineResult<Arc<dyn SearchEngine>> {
        self.ready
            .get_or_try_init(|| self.establish(&self.startup_policy))
            .await
            .map(Arc::clone)
    }

    /// Handle for request paths. Connects on first use with a single probe;
    /// later calls return the shared handle.
    pub async fn acquire(&self) -> EngineResult<Arc<dyn SearchEngine>> {
        if let Some(engine) = self.ready.get() {
            return Ok(engine.clone());
        }
        let single = RetryPolicy::once();
        self.ready
            .get_or_try_init(|| self.establish(&single))
            .await
            .map(Arc::clone)
    }

    async fn establish(&self, policy: &RetryPolicy) -> EngineResult<Arc<dyn SearchEngine>> {
        let engine = self.engine.clone();
        retry_with_policy(policy, "search engine probe", |attempt| {
            let engine = engine.clone();
            async move {
                debug!(attempt, "Probing search engine");
                probe(engine.as_ref()).await
            }
        })
        .await
        .map_err(|e| {
            EngineError::Unavailable(format!(
                "Search engine not reachable after {} attempt(s): {}",
                e.attempts, e.last_error
            ))
        })?;

        provision_index(self.engine.as_ref(), &self.index).await?;

        if self.seed {
            seed_documents(self.engine.as_ref(), &self.index).await?;
        }

        info!(index = %self.index, "Connected to search engine");
        Ok(self.engine.clone())
    }
}

/// Reachability probe: ping, then refuse a red cluster
pub async fn probe(engine: &dyn SearchEngine) -> EngineResult<()> {
    engine.ping().await?;
    let health = engine.cluster_health().await?;
    match health.get("status").and_then(Value::as_str) {
        Some("red") => Err(EngineError::Unavailable(
            "Cluster health is red".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Create the document index if it is missing. Returns whether it was created.
pub async fn provision_index(engine: &dyn SearchEngine, index: &str) -> EngineResult<bool> {
    if engine.index_exists(index).await? {
        debug!(index, "Index already provisioned");
        return Ok(false);
    }

    engine
        .create_index(index, &document_index_definition())
        .await?;
    info!(index, "Created index");
    Ok(true)
}

/// Index the starter documents under their fixed ids. Re-running overwrites
/// the same ids rather than adding copies.
pub async fn seed_documents(engine: &dyn SearchEngine, index: &str) -> EngineResult<usize> {
    for (id, text) in STARTER_DOCUMENTS {
        engine
            .index_document(index, Some(id), &StoredDocument::with_id(id, text))
            .await?;
    }
    info!(index, count = STARTER_DOCUMENTS.len(), "Seeded starter documents");
    Ok(STARTER_DOCUMENTS.len())
}

/// Build an Elasticsearch client from configuration and wait for it to come
/// up, retrying per `max_attempts` / `retry_delay_secs`.
pub async fn acquire_connection(
    config: &ElasticsearchConfig,
) -> EngineResult<Arc<ConnectionSupervisor>> {
    let client = ElasticsearchClient::from_config(config)?;
    info!(
        url = %client.base_url(),
        max_attempts = config.max_attempts,
        retry_delay_secs = config.retry_delay_secs,
        "Connecting to Elasticsearch"
    );

    let supervisor = Arc::new(ConnectionSupervisor::from_config(Arc::new(client), config));
    if let Err(e) = supervisor.connect().await {
        warn!(error = %e, "Elasticsearch is not available");
        return Err(e);
    }
    Ok(supervisor)
}
