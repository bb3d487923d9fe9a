//! The search pipeline: validate → embed → retrieve → filter → score →
//! assemble.
//!
//! Validation rejects malformed queries before any embedding or index work
//! happens. Embedding failure is fatal to the request. Index failure is
//! not: the pipeline degrades to filter-only ranking and flags the
//! response, so callers never get a silently half-ranked list.

use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::embedding::Embedder;
use crate::error::SearchError;
use crate::models::{Event, SearchRequest, SearchResponse};
use crate::search::score::{cosine_similarity, Candidate};
use crate::search::{assemble, filter, score};
use crate::store::vector::VectorIndex;
use crate::store::EventStore;

/// Hard cap on page size; anything above is an invalid query.
const MAX_LIMIT: usize = 100;

pub struct SearchPipeline {
    store: Arc<EventStore>,
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
    min_candidate_pool: usize,
}

impl SearchPipeline {
    pub fn new(store: Arc<EventStore>, embedder: Arc<dyn Embedder>, config: &Config) -> Self {
        let index = VectorIndex::new(
            store.clone(),
            config.vector_index_enabled,
            embedder.dimension(),
        );
        Self {
            store,
            index,
            embedder,
            min_candidate_pool: config.min_candidate_pool,
        }
    }

    pub async fn search(&self, req: &SearchRequest) -> Result<SearchResponse, SearchError> {
        validate(req)?;

        let keyword = req.keyword.trim();
        let price_ranges = self.store.price_ranges();

        let (mut candidates, degraded) = if keyword.is_empty() {
            // Nothing to embed: plain filtered browse over the whole store.
            (self.all_candidates(&price_ranges), false)
        } else {
            let query_vector = self.embedder.embed(keyword).await?;
            let pool = self.index.candidate_pool_size(self.min_candidate_pool);

            // Result limit equals the pool on purpose: filters cut
            // arbitrarily deep and `total` must count the whole filtered
            // set, so retrieval cannot truncate below the pool here.
            match self.index.nearest_neighbors(&query_vector, pool, pool) {
                Ok(neighbors) => {
                    let mut candidates = self.candidates_from_neighbors(
                        &neighbors.iter().map(|n| n.event_id).collect::<Vec<_>>(),
                        &query_vector,
                        &price_ranges,
                    );
                    // Events without a usable embedding are invisible to
                    // the index but stay reachable through exact filters.
                    candidates.extend(self.unindexed_candidates(&price_ranges));
                    (candidates, false)
                }
                Err(SearchError::IndexUnavailable(reason)) => {
                    tracing::warn!("vector index unavailable, degrading to filter-only: {reason}");
                    (self.all_candidates(&price_ranges), true)
                }
                Err(e) => return Err(e),
            }
        };

        candidates.retain_mut(|c| {
            match filter::apply(&c.event, req, c.min_price.zip(c.max_price)) {
                Some(matches) => {
                    c.keyword_matches = matches;
                    true
                }
                None => false,
            }
        });

        if degraded {
            score::rank_keyword_only(&mut candidates);
        } else {
            score::rank(&mut candidates, !keyword.is_empty());
        }

        assemble::apply_sort_override(&mut candidates, req.sort);
        let (items, pagination) = assemble::paginate(candidates, req.page, req.limit);

        Ok(SearchResponse {
            items,
            pagination,
            degraded,
        })
    }

    /// Every stored event as a zero-similarity candidate.
    fn all_candidates(&self, price_ranges: &HashMap<Uuid, (f64, f64)>) -> Vec<Candidate> {
        self.store
            .list_events()
            .into_iter()
            .map(|event| make_candidate(event, 0.0, price_ranges))
            .collect()
    }

    /// Candidates for retrieved neighbor ids, with similarity recomputed
    /// exactly from the stored embedding. The index score is approximate
    /// and only trusted for candidate reduction.
    fn candidates_from_neighbors(
        &self,
        ids: &[Uuid],
        query_vector: &[f32],
        price_ranges: &HashMap<Uuid, (f64, f64)>,
    ) -> Vec<Candidate> {
        ids.iter()
            .filter_map(|id| self.store.get_event(id))
            .map(|event| {
                let similarity = event
                    .embedding
                    .as_deref()
                    .map(|e| cosine_similarity(query_vector, e))
                    .unwrap_or(0.0);
                make_candidate(event, similarity, price_ranges)
            })
            .collect()
    }

    /// Events the index cannot retrieve: no embedding, or a stale one of
    /// the wrong dimension (left behind by a model change and unusable
    /// until backfill).
    fn unindexed_candidates(&self, price_ranges: &HashMap<Uuid, (f64, f64)>) -> Vec<Candidate> {
        let dimension = self.embedder.dimension();
        self.store
            .list_events()
            .into_iter()
            .filter(|e| {
                e.embedding
                    .as_ref()
                    .map_or(true, |emb| emb.len() != dimension)
            })
            .map(|event| make_candidate(event, 0.0, price_ranges))
            .collect()
    }
}

fn make_candidate(
    event: Event,
    vector_score: f32,
    price_ranges: &HashMap<Uuid, (f64, f64)>,
) -> Candidate {
    let prices = price_ranges.get(&event.id).copied();
    Candidate {
        vector_score,
        keyword_matches: 0,
        overall_relevance: 0.0,
        min_price: prices.map(|p| p.0),
        max_price: prices.map(|p| p.1),
        event,
    }
}

/// Fail-fast request validation, before any embedding or index work.
fn validate(req: &SearchRequest) -> Result<(), SearchError> {
    if req.page < 1 {
        return Err(SearchError::InvalidQuery(
            "page must be at least 1".to_string(),
        ));
    }
    if req.limit < 1 || req.limit > MAX_LIMIT {
        return Err(SearchError::InvalidQuery(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }
    if let (Some(min), Some(max)) = (req.price_min, req.price_max) {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(SearchError::InvalidQuery(
                "price range must be finite with price_min <= price_max".to_string(),
            ));
        }
    }
    if let (Some(start), Some(end)) = (req.start_time, req.end_time) {
        if start > end {
            return Err(SearchError::InvalidQuery(
                "start_time must not be after end_time".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_bad_pagination() {
        let req = SearchRequest {
            page: 0,
            ..Default::default()
        };
        assert!(matches!(
            validate(&req),
            Err(SearchError::InvalidQuery(_))
        ));

        let req = SearchRequest {
            limit: 0,
            ..Default::default()
        };
        assert!(matches!(
            validate(&req),
            Err(SearchError::InvalidQuery(_))
        ));

        let req = SearchRequest {
            limit: MAX_LIMIT + 1,
            ..Default::default()
        };
        assert!(matches!(
            validate(&req),
            Err(SearchError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_price_range() {
        let req = SearchRequest {
            price_min: Some(50.0),
            price_max: Some(10.0),
            ..Default::default()
        };
        assert!(matches!(
            validate(&req),
            Err(SearchError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_validate_rejects_non_finite_prices() {
        let req = SearchRequest {
            price_min: Some(f64::NAN),
            price_max: Some(10.0),
            ..Default::default()
        };
        assert!(matches!(
            validate(&req),
            Err(SearchError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(validate(&SearchRequest::default()).is_ok());
    }
}
