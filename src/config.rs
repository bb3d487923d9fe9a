use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where event and ticket data is persisted
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Embedding provider configuration
    pub embedding: EmbeddingConfig,
    /// Lower bound on the ANN candidate pool. The pool is sized to the full
    /// indexed event count, but never below this, so approximate retrieval
    /// on small collections is effectively exhaustive.
    pub min_candidate_pool: usize,
    /// How many events go into one embedding request during backfill
    pub backfill_batch_size: usize,
    /// How many backfill batches run concurrently
    pub backfill_concurrency: usize,
    /// Disable vector retrieval entirely (search degrades to filter-only)
    pub vector_index_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the embedding API
    pub base_url: String,
    /// Model name for embeddings
    pub model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Embedding vector dimension
    pub dimension: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:9100".to_string(),
            embedding: EmbeddingConfig::default(),
            min_candidate_pool: 10_000,
            backfill_batch_size: 32,
            backfill_concurrency: 4,
            vector_index_enabled: true,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            api_key: None,
            dimension: 384,
            timeout_secs: 60,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("EVENT_SEARCH_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("EVENT_SEARCH_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(val) = std::env::var("EVENT_SEARCH_MIN_CANDIDATE_POOL") {
            if let Ok(v) = val.parse() {
                config.min_candidate_pool = v;
            }
        }
        if let Ok(val) = std::env::var("EVENT_SEARCH_BACKFILL_BATCH_SIZE") {
            if let Ok(v) = val.parse::<usize>() {
                config.backfill_batch_size = v.max(1);
            }
        }
        if let Ok(val) = std::env::var("EVENT_SEARCH_BACKFILL_CONCURRENCY") {
            if let Ok(v) = val.parse::<usize>() {
                config.backfill_concurrency = v.max(1);
            }
        }
        if let Ok(val) = std::env::var("EVENT_SEARCH_VECTOR_INDEX_ENABLED") {
            config.vector_index_enabled = val != "0" && val.to_lowercase() != "false";
        }

        if let Ok(provider) = std::env::var("EMBEDDING_PROVIDER") {
            config.embedding.provider = provider;
        }
        if let Ok(url) = std::env::var("EMBEDDING_BASE_URL") {
            config.embedding.base_url = url;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Ok(key) = std::env::var("EMBEDDING_API_KEY") {
            config.embedding.api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("EMBEDDING_DIM") {
            if let Ok(d) = dim.parse() {
                config.embedding.dimension = d;
            }
        }
        if let Ok(val) = std::env::var("EMBEDDING_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.embedding.timeout_secs = v;
            }
        }

        config
    }

    pub fn events_path(&self) -> PathBuf {
        self.data_dir.join("events.json")
    }

    pub fn tickets_path(&self) -> PathBuf {
        self.data_dir.join("tickets.json")
    }
}
