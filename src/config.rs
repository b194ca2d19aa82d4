use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variables honoured on top of the layered configuration.
pub const ELASTICSEARCH_URL_ENV: &str = "ELASTICSEARCH_URL";
pub const ELASTICSEARCH_TIMEOUT_ENV: &str = "ELASTICSEARCH_TIMEOUT";
pub const BACKEND_URL_ENV: &str = "BACKEND_URL";

/// Main application configuration, shared by both gateways
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend gateway listener
    #[serde(default)]
    pub backend: BackendConfig,

    /// Search engine connection
    #[serde(default)]
    pub elasticsearch: ElasticsearchConfig,

    /// Frontend gateway listener and upstream
    #[serde(default)]
    pub frontend: FrontendConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());
        Self::load_from(&config_path)
    }

    /// Load with the override file given on the command line, falling back to
    /// `CONFIG_PATH`
    pub fn load_or_default(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        match config_path {
            Some(path) => Self::load_from(path),
            None => Self::load(),
        }
    }

    /// Load configuration using an explicit override file
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let mut loaded: Config = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(config_path).required(false))
            // Override with environment variables (prefix: SEARCH_GW)
            .add_source(
                config::Environment::with_prefix("SEARCH_GW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        loaded.apply_legacy_env(|key| std::env::var(key).ok())?;
        Ok(loaded)
    }

    /// Apply the deployment variables (`ELASTICSEARCH_URL`, `ELASTICSEARCH_TIMEOUT`,
    /// `BACKEND_URL`). These win over every other source.
    pub fn apply_legacy_env<F>(&mut self, lookup: F) -> Result<(), config::ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ELASTICSEARCH_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.elasticsearch.url = url;
        }

        if let Some(raw) = lookup(ELASTICSEARCH_TIMEOUT_ENV).filter(|v| !v.trim().is_empty()) {
            self.elasticsearch.timeout_secs = raw.trim().parse().map_err(|_| {
                config::ConfigError::Message(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ELASTICSEARCH_TIMEOUT_ENV, raw
                ))
            })?;
        }

        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.frontend.backend_url = url;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_backend_port")]
    pub port: u16,

    /// Directory served at `/`
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_backend_port(),
            static_dir: default_static_dir(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Base URL of the cluster
    #[serde(default = "default_elasticsearch_url")]
    pub url: String,

    /// Index holding the documents
    #[serde(default = "default_index")]
    pub index: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Startup probe attempts before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between startup probes (seconds)
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Delay multiplier applied after each failed probe; 1 keeps the delay fixed
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: u32,

    /// Connect before serving traffic instead of on first use
    #[serde(default = "default_true")]
    pub eager_connect: bool,

    /// Index the starter documents at startup
    #[serde(default = "default_true")]
    pub seed_documents: bool,

    /// How new document ids are chosen
    #[serde(default)]
    pub id_strategy: IdStrategy,

    /// Upper bound on hits returned by a single query
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl ElasticsearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry policy used by the startup supervisor
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.retry_delay_secs))
            .with_multiplier(self.backoff_multiplier)
    }
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: default_elasticsearch_url(),
            index: default_index(),
            timeout_secs: default_timeout(),
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            eager_connect: true,
            seed_documents: true,
            id_strategy: IdStrategy::default(),
            max_results: default_max_results(),
        }
    }
}

/// Id assignment for newly created documents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Let the engine generate the id
    #[default]
    Engine,
    /// `document count + 1`. Racy under concurrent creates; kept for
    /// deployments that depend on numeric ids.
    Sequential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_frontend_port")]
    pub port: u16,

    /// Directory served under `/static`
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Base URL of the backend gateway
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Timeout for calls to the backend (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Backend paths probed by `/check-backend`
    #[serde(default = "default_probe_endpoints")]
    pub probe_endpoints: Vec<String>,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_frontend_port(),
            static_dir: default_static_dir(),
            backend_url: default_backend_url(),
            timeout_secs: default_timeout(),
            probe_endpoints: default_probe_endpoints(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Service name
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            service_name: default_service_name(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_backend_port() -> u16 {
    9567
}

fn default_frontend_port() -> u16 {
    8080
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_request_timeout() -> u64 {
    30
}

fn default_elasticsearch_url() -> String {
    "http://elasticsearch:9567".to_string()
}

fn default_backend_url() -> String {
    "http://backend:9567".to_string()
}

fn default_index() -> String {
    "documents".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    10
}

fn default_retry_delay() -> u64 {
    5
}

fn default_backoff_multiplier() -> u32 {
    1
}

fn default_max_results() -> usize {
    1000
}

fn default_probe_endpoints() -> Vec<String> {
    vec![
        "/health".to_string(),
        "/es-status".to_string(),
        "/documents/".to_string(),
    ]
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "search-gateway".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config_values() {
        assert_eq!(default_backend_port(), 9567);
        assert_eq!(default_frontend_port(), 8080);
        assert_eq!(default_elasticsearch_url(), "http://elasticsearch:9567");
        assert_eq!(default_backend_url(), "http://backend:9567");
        assert_eq!(default_probe_endpoints().len(), 3);
        assert!(default_true());
    }

    #[test]
    fn test_embedded_defaults_parse() {
        let config = Config::load_from("does/not/exist.toml").unwrap();
        assert_eq!(config.elasticsearch.index, "documents");
        assert_eq!(config.elasticsearch.max_attempts, 10);
        assert_eq!(config.elasticsearch.id_strategy, IdStrategy::Engine);
        assert_eq!(config.frontend.probe_endpoints.len(), 3);
    }

    #[test]
    fn test_override_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[elasticsearch]\nindex = \"notes\"\nid_strategy = \"sequential\"\n\n[frontend]\nport = 9000"
        )
        .unwrap();

        let config = Config::load_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.elasticsearch.index, "notes");
        assert_eq!(config.elasticsearch.id_strategy, IdStrategy::Sequential);
        assert_eq!(config.frontend.port, 9000);
        // untouched keys keep their defaults
        assert_eq!(config.backend.port, 9567);
    }

    #[test]
    fn test_legacy_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ELASTICSEARCH_URL_ENV, "http://localhost:9200"),
            (ELASTICSEARCH_TIMEOUT_ENV, "3"),
            (BACKEND_URL_ENV, "http://localhost:9567"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_legacy_env(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.elasticsearch.url, "http://localhost:9200");
        assert_eq!(config.elasticsearch.timeout(), Duration::from_secs(3));
        assert_eq!(config.frontend.backend_url, "http://localhost:9567");
    }

    #[test]
    fn test_legacy_env_rejects_bad_timeout() {
        let mut config = Config::default();
        let result = config.apply_legacy_env(|key| {
            (key == ELASTICSEARCH_TIMEOUT_ENV).then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_legacy_env_is_ignored() {
        let mut config = Config::default();
        config.apply_legacy_env(|_| Some("  ".to_string())).unwrap();
        assert_eq!(config.elasticsearch.url, default_elasticsearch_url());
    }

    #[test]
    fn test_retry_policy_from_config() {
        let config = ElasticsearchConfig::default();
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts(), 10);
        assert_eq!(policy.delay_before(2), Duration::from_secs(5));
    }
}
