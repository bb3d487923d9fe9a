use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::models::{SearchRequest, SearchResponse};
use crate::state::AppState;

/// POST /api/search - Ranked semantic event search:
///   1. Validate the query (cheap fail-fast)
///   2. Embed the keyword text
///   3. ANN candidate retrieval from the vector index
///   4. Structured predicate filtering
///   5. Exact-cosine re-ranking with keyword-match boost
///   6. Sort override + pagination
pub async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let response = state
        .pipeline
        .search(&req)
        .await
        .map_err(|e| e.into_response_parts())?;

    tracing::info!(
        "search returned {} of {} results (page {}, degraded: {})",
        response.items.len(),
        response.pagination.total,
        response.pagination.page,
        response.degraded
    );

    Ok(Json(response))
}
