use std::sync::Arc;

use crate::config::Config;
use crate::embedding::{Embedder, HttpEmbedder};
use crate::search::pipeline::SearchPipeline;
use crate::store::EventStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<EventStore>,
    pub embedder: Arc<dyn Embedder>,
    pub pipeline: Arc<SearchPipeline>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let embedder: Arc<dyn Embedder> =
            Arc::new(HttpEmbedder::new(config.embedding.clone())?);
        Self::with_embedder(config, embedder)
    }

    /// Build state around an externally supplied embedder. The provider is
    /// the one piece of process-wide lazily-initialized machinery, so it is
    /// injected rather than constructed ambiently; tests pass a stub here.
    pub fn with_embedder(config: Config, embedder: Arc<dyn Embedder>) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let store = Arc::new(EventStore::open_or_create(&config.data_dir)?);
        let pipeline = Arc::new(SearchPipeline::new(
            store.clone(),
            embedder.clone(),
            &config,
        ));

        Ok(Self {
            config,
            store,
            embedder,
            pipeline,
        })
    }
}
