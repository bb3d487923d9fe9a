//! Relevance scoring: exact cosine similarity combined with the keyword
//! match count.
//!
//! Index-reported similarity is approximate, so the scorer recomputes it
//! from the stored embedding before ranking. When a keyword is present the
//! match count acts as a multiplicative boost, which keeps semantically
//! close but textually irrelevant events from out-ranking literal matches.
//! Without a keyword every match count is zero, so the score falls back to
//! plain cosine similarity instead of collapsing to all-zero.

use crate::models::Event;

/// A transient ranked item; lives only within one search execution.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub event: Event,
    pub vector_score: f32,
    pub keyword_matches: usize,
    pub overall_relevance: f32,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

/// Score and order candidates by relevance, descending.
///
/// `keyword_active` selects the combined score (`cosine × match_count`)
/// over the pure-similarity fallback. Ties break on cosine similarity,
/// then event id, so ordering is deterministic.
pub fn rank(candidates: &mut Vec<Candidate>, keyword_active: bool) {
    for c in candidates.iter_mut() {
        c.overall_relevance = if keyword_active {
            c.vector_score * c.keyword_matches as f32
        } else {
            c.vector_score
        };
    }

    candidates.sort_by(|a, b| {
        b.overall_relevance
            .partial_cmp(&a.overall_relevance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.vector_score
                    .partial_cmp(&a.vector_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.event.id.cmp(&b.event.id))
    });
}

/// Degraded ordering for when no query vector exists (vector index down):
/// keyword matches descending, then soonest start, then event id.
pub fn rank_keyword_only(candidates: &mut Vec<Candidate>) {
    for c in candidates.iter_mut() {
        c.overall_relevance = c.keyword_matches as f32;
    }
    candidates.sort_by(|a, b| {
        b.keyword_matches
            .cmp(&a.keyword_matches)
            .then_with(|| a.event.start_time.cmp(&b.event.start_time))
            .then_with(|| a.event.id.cmp(&b.event.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;
    use chrono::Utc;
    use uuid::Uuid;

    fn candidate(vector_score: f32, keyword_matches: usize) -> Candidate {
        Candidate {
            event: Event {
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
                embedding: None,
                created_at: Utc::now(),
            },
            vector_score,
            keyword_matches,
            overall_relevance: 0.0,
            min_price: None,
            max_price: None,
        }
    }

    #[test]
    fn test_cosine_self_similarity_is_one() {
        let v = vec![0.3, -0.5, 0.8, 0.1];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_cosine_orthogonal_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_mismatched_or_empty_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_match_count_boosts_literal_matches() {
        // Lower similarity but more keyword matches wins
        let mut candidates = vec![candidate(0.9, 1), candidate(0.6, 3)];
        rank(&mut candidates, true);
        assert!((candidates[0].overall_relevance - 1.8).abs() < 1e-6);
        assert_eq!(candidates[0].keyword_matches, 3);
    }

    #[test]
    fn test_empty_keyword_falls_back_to_cosine() {
        let mut candidates = vec![candidate(0.4, 0), candidate(0.8, 0)];
        rank(&mut candidates, false);
        assert!((candidates[0].overall_relevance - 0.8).abs() < 1e-6);
        assert!(candidates[0].overall_relevance > candidates[1].overall_relevance);
    }

    #[test]
    fn test_relevance_tie_breaks_on_cosine_then_id() {
        // Same overall relevance (0.8*1 vs 0.4*2), higher cosine first
        let mut candidates = vec![candidate(0.4, 2), candidate(0.8, 1)];
        rank(&mut candidates, true);
        assert!((candidates[0].vector_score - 0.8).abs() < 1e-6);

        // Fully tied pairs order by event id
        let a = candidate(0.5, 1);
        let b = candidate(0.5, 1);
        let first_id = a.event.id.min(b.event.id);
        let mut candidates = vec![a, b];
        rank(&mut candidates, true);
        assert_eq!(candidates[0].event.id, first_id);
    }

    #[test]
    fn test_ordering_non_increasing() {
        let mut candidates: Vec<Candidate> = (0..20)
            .map(|i| candidate(0.05 * i as f32, (i % 4) as usize))
            .collect();
        rank(&mut candidates, true);
        for pair in candidates.windows(2) {
            assert!(pair[0].overall_relevance >= pair[1].overall_relevance);
        }
    }

    #[test]
    fn test_keyword_only_ranking_orders_by_matches_then_start() {
        let mut early = candidate(0.0, 2);
        early.event.start_time = Utc::now() - chrono::Duration::days(1);
        let late = candidate(0.0, 2);
        let best = candidate(0.0, 4);

        let early_id = early.event.id;
        let best_id = best.event.id;

        let mut candidates = vec![late, early, best];
        rank_keyword_only(&mut candidates);
        assert_eq!(candidates[0].event.id, best_id);
        assert_eq!(candidates[1].event.id, early_id);
        assert_eq!(candidates[0].overall_relevance, 4.0);
    }
}
