use axum::routing::{delete, get, post, put};
use axum::Router;
use tracing_subscriber::EnvFilter;

use event_search::api;
use event_search::config::Config;
use event_search::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!(
        "Embedding provider: {} ({}, dimension {})",
        config.embedding.provider,
        config.embedding.base_url,
        config.embedding.dimension
    );

    let state = AppState::new(config.clone())?;

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/events", get(api::events::list_events))
        .route("/api/events", post(api::events::add_event))
        .route("/api/events/{id}", delete(api::events::delete_event))
        .route("/api/events/{id}/tickets", put(api::events::set_tickets))
        .route("/api/search", post(api::search::search))
        .route("/api/embeddings/backfill", post(api::events::backfill))
        .route("/api/config", get(api::events::get_config))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}
