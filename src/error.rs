use axum::http::StatusCode;

/// Error taxonomy of the search pipeline.
///
/// Embedding and index failures are surfaced to the request boundary as-is;
/// no retries happen inside the pipeline (retries belong to the HTTP client
/// or the model runtime, not here).
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Embedding model could not be initialized or inference failed.
    /// Fatal to the current search request.
    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Vector index missing or misconfigured. The search pipeline degrades
    /// to filter-only ranking instead of failing the request.
    #[error("vector index unavailable: {0}")]
    IndexUnavailable(String),

    /// Malformed query parameters, rejected before any embedding or index
    /// work is performed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl SearchError {
    /// Map to the `(StatusCode, String)` tuple the API handlers return.
    pub fn into_response_parts(self) -> (StatusCode, String) {
        match self {
            SearchError::InvalidQuery(msg) => (StatusCode::BAD_REQUEST, msg),
            SearchError::EmbeddingUnavailable(msg) | SearchError::IndexUnavailable(msg) => {
                // Internal detail stays in the logs; clients get a generic
                // service error.
                tracing::error!("search dependency failure: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Search backend unavailable".to_string(),
                )
            }
        }
    }
}
