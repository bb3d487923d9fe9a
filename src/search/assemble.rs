//! Final page assembly: optional sort override, then pagination.
//!
//! `total` is computed from the whole filtered set before truncation, so
//! pagination metadata always reflects the full result set.

use crate::models::{Pagination, RankedEvent, SortOrder};
use crate::search::score::Candidate;

/// Re-order by an explicit user-selected sort, superseding relevance
/// ordering. Candidates without ticket data sort last in both price
/// directions. Relevance order is already in place when `sort` is `None`.
pub fn apply_sort_override(candidates: &mut [Candidate], sort: Option<SortOrder>) {
    let Some(sort) = sort else {
        return;
    };
    match sort {
        SortOrder::Soonest => {
            candidates.sort_by(|a, b| {
                a.event
                    .start_time
                    .cmp(&b.event.start_time)
                    .then_with(|| a.event.id.cmp(&b.event.id))
            });
        }
        SortOrder::Latest => {
            candidates.sort_by(|a, b| {
                b.event
                    .start_time
                    .cmp(&a.event.start_time)
                    .then_with(|| a.event.id.cmp(&b.event.id))
            });
        }
        SortOrder::PriceAsc => {
            candidates.sort_by(|a, b| {
                match (a.min_price, b.min_price) {
                    (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                }
                .then_with(|| a.event.id.cmp(&b.event.id))
            });
        }
        SortOrder::PriceDesc => {
            candidates.sort_by(|a, b| {
                match (a.max_price, b.max_price) {
                    (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                }
                .then_with(|| a.event.id.cmp(&b.event.id))
            });
        }
    }
}

/// Slice out one page and build the pagination metadata.
/// `page` and `limit` are validated (≥ 1) before this point.
pub fn paginate(candidates: Vec<Candidate>, page: usize, limit: usize) -> (Vec<RankedEvent>, Pagination) {
    let total = candidates.len();
    let total_pages = total.div_ceil(limit);
    let skip = (page - 1) * limit;

    let items = candidates
        .into_iter()
        .skip(skip)
        .take(limit)
        .map(into_ranked)
        .collect();

    (
        items,
        Pagination {
            total,
            page,
            limit,
            total_pages,
        },
    )
}

fn into_ranked(c: Candidate) -> RankedEvent {
    RankedEvent {
        id: c.event.id,
        title: c.event.title,
        description: c.event.description,
        category: c.event.category,
        event_type: c.event.event_type,
        artist: c.event.artist,
        location: c.event.location,
        start_time: c.event.start_time,
        end_time: c.event.end_time,
        min_price: c.min_price,
        max_price: c.max_price,
        vector_score: c.vector_score,
        keyword_matches: c.keyword_matches,
        overall_relevance: c.overall_relevance,
    }
}
