use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::models::{
    AddEventRequest, BackfillReport, BackfillRequest, Event, SetTicketsRequest, Ticket,
};
use crate::state::AppState;

/// GET /api/events - List all stored events.
pub async fn list_events(State(state): State<AppState>) -> Json<Vec<Event>> {
    Json(state.store.list_events())
}

/// POST /api/events - Store a new event and embed its description.
///
/// An embedding failure is not fatal here: the event is stored without a
/// vector (reachable by exact filters only) and picked up by a later
/// backfill.
pub async fn add_event(
    State(state): State<AppState>,
    Json(req): Json<AddEventRequest>,
) -> Result<(StatusCode, Json<Event>), (StatusCode, String)> {
    if req.title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title is required".to_string()));
    }
    if req.end_time < req.start_time {
        return Err((
            StatusCode::BAD_REQUEST,
            "end_time must not precede start_time".to_string(),
        ));
    }

    let embedding = match state.embedder.embed(&req.description).await {
        Ok(vector) => Some(vector),
        Err(e) => {
            tracing::warn!("embedding new event failed, storing without vector: {e}");
            None
        }
    };

    let event = Event {
        id: Uuid::new_v4(),
        title: req.title,
        description: req.description,
        category: req.category,
        event_type: req.event_type,
        artist: req.artist,
        location: req.location,
        start_time: req.start_time,
        end_time: req.end_time,
        embedding,
        created_at: Utc::now(),
    };

    state
        .store
        .upsert_event(event.clone())
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;

    tracing::info!("added event {} ('{}')", event.id, event.title);
    Ok((StatusCode::CREATED, Json(event)))
}

/// DELETE /api/events/{id} - Remove an event and its ticket records.
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let removed = state
        .store
        .delete_event(&id)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Event not found".to_string()))
    }
}

/// PUT /api/events/{id}/tickets - Replace the ticket tiers for an event.
pub async fn set_tickets(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetTicketsRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.store.get_event(&id).is_none() {
        return Err((StatusCode::NOT_FOUND, "Event not found".to_string()));
    }
    if req
        .tickets
        .iter()
        .any(|t| !t.price.is_finite() || t.price < 0.0)
    {
        return Err((
            StatusCode::BAD_REQUEST,
            "Ticket prices must be non-negative numbers".to_string(),
        ));
    }

    let tickets: Vec<Ticket> = req
        .tickets
        .into_iter()
        .map(|t| Ticket {
            id: Uuid::new_v4(),
            event_id: id,
            tier: t.tier,
            price: t.price,
        })
        .collect();

    state
        .store
        .set_tickets(id, tickets)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/embeddings/backfill - Recompute embeddings for a set of
/// events. Per-id outcomes in the body; one bad id never fails the call.
pub async fn backfill(
    State(state): State<AppState>,
    Json(req): Json<BackfillRequest>,
) -> Result<Json<BackfillReport>, (StatusCode, String)> {
    if req.event_ids.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "event_ids must not be empty".to_string(),
        ));
    }

    let report = crate::backfill::run_backfill(
        state.store.clone(),
        state.embedder.clone(),
        state.config.backfill_batch_size,
        state.config.backfill_concurrency,
        req.event_ids,
    )
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;

    Ok(Json(report))
}

/// GET /api/config - Current configuration with the API key masked.
pub async fn get_config(State(state): State<AppState>) -> Json<crate::config::Config> {
    let mut config = state.config.clone();
    if config.embedding.api_key.is_some() {
        config.embedding.api_key = Some("***".to_string());
    }
    Json(config)
}
