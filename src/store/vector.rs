//! Approximate-nearest-neighbor adapter over the event store's embeddings.
//!
//! Index-reported similarities are used only to cut the collection down to
//! a candidate pool; final ranking recomputes exact cosine similarity in
//! the scorer.

use std::sync::Arc;
use uuid::Uuid;

use crate::error::SearchError;
use crate::search::score::cosine_similarity;
use crate::store::EventStore;

/// One retrieved neighbor: event id plus index-assigned similarity.
#[derive(Debug, Clone)]
pub struct Neighbor {
    pub event_id: Uuid,
    pub similarity: f32,
}

pub struct VectorIndex {
    store: Arc<EventStore>,
    enabled: bool,
    dimension: usize,
}

impl VectorIndex {
    pub fn new(store: Arc<EventStore>, enabled: bool, dimension: usize) -> Self {
        Self {
            store,
            enabled,
            dimension,
        }
    }

    /// Retrieve up to `limit` neighbors of `query`, descending by
    /// similarity, sampling from a candidate pool of `pool` entries.
    /// `pool` is clamped to at least `limit`.
    ///
    /// Events without an embedding (or with one of the wrong dimension,
    /// e.g. written by a previous model) are not retrievable here.
    pub fn nearest_neighbors(
        &self,
        query: &[f32],
        pool: usize,
        limit: usize,
    ) -> Result<Vec<Neighbor>, SearchError> {
        if !self.enabled {
            return Err(SearchError::IndexUnavailable(
                "vector index disabled by configuration".to_string(),
            ));
        }
        if query.len() != self.dimension {
            return Err(SearchError::IndexUnavailable(format!(
                "query vector has dimension {}, index expects {}",
                query.len(),
                self.dimension
            )));
        }

        let pool = pool.max(limit);

        // The scan stands in for the store's ANN search: at most `pool`
        // indexed entries are examined before ranking, mirroring how an
        // approximate index under-samples when the pool is too small.
        let events = self.store.list_events();
        let mut scored: Vec<Neighbor> = events
            .iter()
            .filter_map(|e| {
                let embedding = e.embedding.as_ref()?;
                if embedding.len() != self.dimension {
                    return None;
                }
                Some(Neighbor {
                    event_id: e.id,
                    similarity: cosine_similarity(query, embedding),
                })
            })
            .take(pool)
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        Ok(scored)
    }

    /// Pool size for a retrieval: the full indexed population, floored at
    /// `min_pool`. A pool that is a small fraction of a large collection
    /// under-samples and hurts recall.
    pub fn candidate_pool_size(&self, min_pool: usize) -> usize {
        self.store.indexed_count().max(min_pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Event, Location};
    use chrono::Utc;

    fn event_with_embedding(embedding: Option<Vec<f32>>) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            description: "d".to_string(),
            category: "music".to_string(),
            event_type: "concert".to_string(),
            artist: "a".to_string(),
            location: Location {
                venue: "v".to_string(),
                city: "c".to_string(),
                full_address: "v, c".to_string(),
            },
            start_time: Utc::now(),
            end_time: Utc::now(),
            embedding,
            created_at: Utc::now(),
        }
    }

    fn store_with(events: Vec<Event>) -> (tempfile::TempDir, Arc<EventStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = EventStore::open_or_create(dir.path()).unwrap();
        for e in events {
            store.upsert_event(e).unwrap();
        }
        (dir, Arc::new(store))
    }

    #[test]
    fn test_neighbors_ordered_by_similarity() {
        let close = event_with_embedding(Some(vec![1.0, 0.0, 0.0]));
        let far = event_with_embedding(Some(vec![0.0, 1.0, 0.0]));
        let close_id = close.id;
        let (_dir, store) = store_with(vec![far, close]);

        let index = VectorIndex::new(store, true, 3);
        let neighbors = index.nearest_neighbors(&[1.0, 0.0, 0.0], 100, 10).unwrap();

        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].event_id, close_id);
        assert!(neighbors[0].similarity > neighbors[1].similarity);
    }

    #[test]
    fn test_events_without_embedding_excluded() {
        let with = event_with_embedding(Some(vec![1.0, 0.0, 0.0]));
        let without = event_with_embedding(None);
        let wrong_dim = event_with_embedding(Some(vec![1.0, 0.0]));
        let with_id = with.id;
        let (_dir, store) = store_with(vec![with, without, wrong_dim]);

        let index = VectorIndex::new(store, true, 3);
        let neighbors = index.nearest_neighbors(&[1.0, 0.0, 0.0], 100, 10).unwrap();

        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].event_id, with_id);
    }

    #[test]
    fn test_limit_respected() {
        let events: Vec<Event> = (0..5)
            .map(|i| event_with_embedding(Some(vec![1.0, i as f32 * 0.1, 0.0])))
            .collect();
        let (_dir, store) = store_with(events);

        let index = VectorIndex::new(store, true, 3);
        let neighbors = index.nearest_neighbors(&[1.0, 0.0, 0.0], 100, 2).unwrap();
        assert_eq!(neighbors.len(), 2);
    }

    #[test]
    fn test_pool_bounds_the_candidate_scan() {
        // The best match is stored beyond the pool, so an under-sized pool
        // never examines it.
        let first = event_with_embedding(Some(vec![0.5, 0.5, 0.0]));
        let second = event_with_embedding(Some(vec![0.0, 1.0, 0.0]));
        let best = event_with_embedding(Some(vec![1.0, 0.0, 0.0]));
        let best_id = best.id;
        let (_dir, store) = store_with(vec![first, second, best]);

        let index = VectorIndex::new(store, true, 3);
        let neighbors = index.nearest_neighbors(&[1.0, 0.0, 0.0], 2, 2).unwrap();

        assert_eq!(neighbors.len(), 2);
        assert!(neighbors.iter().all(|n| n.event_id != best_id));
    }

    #[test]
    fn test_pool_clamped_to_limit() {
        let events: Vec<Event> = (0..4)
            .map(|i| event_with_embedding(Some(vec![1.0, i as f32 * 0.1, 0.0])))
            .collect();
        let (_dir, store) = store_with(events);

        let index = VectorIndex::new(store, true, 3);
        // pool below limit is raised to it
        let neighbors = index.nearest_neighbors(&[1.0, 0.0, 0.0], 1, 3).unwrap();
        assert_eq!(neighbors.len(), 3);
    }

    #[test]
    fn test_disabled_index_is_unavailable() {
        let (_dir, store) = store_with(vec![]);
        let index = VectorIndex::new(store, false, 3);
        let err = index.nearest_neighbors(&[1.0, 0.0, 0.0], 100, 10);
        assert!(matches!(err, Err(SearchError::IndexUnavailable(_))));
    }

    #[test]
    fn test_dimension_mismatch_is_unavailable() {
        let (_dir, store) = store_with(vec![]);
        let index = VectorIndex::new(store, true, 3);
        let err = index.nearest_neighbors(&[1.0, 0.0], 100, 10);
        assert!(matches!(err, Err(SearchError::IndexUnavailable(_))));
    }

    #[test]
    fn test_candidate_pool_floors_at_min() {
        let (_dir, store) = store_with(vec![event_with_embedding(Some(vec![1.0, 0.0, 0.0]))]);
        let index = VectorIndex::new(store, true, 3);
        assert_eq!(index.candidate_pool_size(10_000), 10_000);
    }
}
