use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where an event takes place. `full_address` is precomputed at ingestion
/// time so keyword matching never has to re-join the parts per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub venue: String,
    pub city: String,
    pub full_address: String,
}

/// A searchable event.
///
/// The embedding is derived from the description and carries the model's
/// fixed dimension once computed. An event without an embedding is skipped
/// by vector retrieval but still reachable through the filter-only path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub event_type: String,
    pub artist: String,
    pub location: Location,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

/// A ticket tier attached to an event. Min/max price aggregates are derived
/// from these at query time, never stored on the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub event_id: Uuid,
    pub tier: String,
    pub price: f64,
}

/// Explicit sort override. When present it supersedes relevance ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Soonest,
    Latest,
    PriceAsc,
    PriceDesc,
}

/// Search request. Unset text predicates match everything; unset price
/// bounds default to -inf/+inf; the date predicate only applies when
/// `start_time` is given.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub event_type: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub sort: Option<SortOrder>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    10
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            location: String::new(),
            category: String::new(),
            event_type: String::new(),
            start_time: None,
            end_time: None,
            price_min: None,
            price_max: None,
            sort: None,
            page: default_page(),
            limit: default_limit(),
        }
    }
}

/// One ranked search result.
#[derive(Debug, Clone, Serialize)]
pub struct RankedEvent {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub event_type: String,
    pub artist: String,
    pub location: Location,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub vector_score: f32,
    pub keyword_matches: usize,
    pub overall_relevance: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

/// Search response. `degraded` is set when the vector index was unavailable
/// and ranking fell back to keyword matching only.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub items: Vec<RankedEvent>,
    pub pagination: Pagination,
    pub degraded: bool,
}

/// Add-event request. The server assigns the id and computes the embedding.
#[derive(Debug, Clone, Deserialize)]
pub struct AddEventRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub event_type: String,
    pub artist: String,
    pub location: Location,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Replace the ticket tiers for an event.
#[derive(Debug, Clone, Deserialize)]
pub struct SetTicketsRequest {
    pub tickets: Vec<TicketTier>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicketTier {
    pub tier: String,
    pub price: f64,
}

/// Backfill request: recompute embeddings for the given event ids.
#[derive(Debug, Clone, Deserialize)]
pub struct BackfillRequest {
    pub event_ids: Vec<Uuid>,
}

/// Per-id backfill outcome. A failing id never aborts its siblings.
#[derive(Debug, Clone, Serialize)]
pub struct BackfillReport {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<BackfillFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackfillFailure {
    pub event_id: Uuid,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_serializes_to_snake_case() {
        let json = serde_json::to_value(SortOrder::PriceAsc).unwrap();
        assert_eq!(json, "price_asc");
    }

    #[test]
    fn test_search_request_defaults() {
        let req: SearchRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 10);
        assert!(req.keyword.is_empty());
        assert!(req.sort.is_none());
    }
}
