//! Structured predicate filtering.
//!
//! All predicates are conjunctive. Text predicates are case-insensitive
//! substring matches where an empty predicate matches everything. Price and
//! date carry internal OR-logic (overlap-or-span, three-way interval
//! overlap).

use chrono::{DateTime, Duration, Utc};

use crate::models::{Event, SearchRequest};

/// Case-insensitive substring match. An empty needle matches everything.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Count how many of the four keyword fields (title, full address, artist,
/// description) contain `keyword`. Returns 0 for an empty keyword.
///
/// The count doubles as the match signal for relevance scoring, so it has
/// to be a count, not a boolean.
pub fn keyword_match_count(event: &Event, keyword: &str) -> usize {
    if keyword.is_empty() {
        return 0;
    }
    [
        event.title.as_str(),
        event.location.full_address.as_str(),
        event.artist.as_str(),
        event.description.as_str(),
    ]
    .iter()
    .filter(|field| contains_ci(field, keyword))
    .count()
}

/// Price predicate: the candidate's [min, max] either overlaps the queried
/// range at an endpoint or spans it entirely. Unset bounds default to
/// -inf/+inf. Candidates without ticket data fail once a bound is active.
pub fn price_matches(
    price_range: Option<(f64, f64)>,
    price_min: Option<f64>,
    price_max: Option<f64>,
) -> bool {
    if price_min.is_none() && price_max.is_none() {
        return true;
    }
    let Some((min_price, max_price)) = price_range else {
        return false;
    };
    let lo = price_min.unwrap_or(f64::NEG_INFINITY);
    let hi = price_max.unwrap_or(f64::INFINITY);

    let min_in_range = min_price >= lo && min_price <= hi;
    let max_in_range = max_price >= lo && max_price <= hi;
    let spans = min_price <= lo && max_price >= hi;
    min_in_range || max_in_range || spans
}

/// The query window: [start, end], or [startOfDay, startOfDay + 1 day) when
/// no end is given, so a bare date matches same-day events.
pub fn query_window(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    match end {
        Some(end) => (start, end),
        None => {
            let day_start = start
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .expect("midnight is always a valid time")
                .and_utc();
            (day_start, day_start + Duration::days(1))
        }
    }
}

/// Three-way interval overlap: candidate start inside the window, candidate
/// end inside the window, or candidate interval containing the window.
/// The window end is exclusive.
pub fn date_overlaps(
    candidate_start: DateTime<Utc>,
    candidate_end: DateTime<Utc>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> bool {
    let start_inside = candidate_start >= window_start && candidate_start < window_end;
    let end_inside = candidate_end >= window_start && candidate_end < window_end;
    let contains = candidate_start <= window_start && candidate_end >= window_end;
    start_inside || end_inside || contains
}

/// Evaluate all predicates for one event. Returns the keyword match count
/// for survivors, `None` for events filtered out.
pub fn apply(
    event: &Event,
    req: &SearchRequest,
    price_range: Option<(f64, f64)>,
) -> Option<usize> {
    if !contains_ci(&event.location.full_address, req.location.trim()) {
        return None;
    }
    if !contains_ci(&event.category, req.category.trim()) {
        return None;
    }
    if !contains_ci(&event.event_type, req.event_type.trim()) {
        return None;
    }
    if !price_matches(price_range, req.price_min, req.price_max) {
        return None;
    }
    if let Some(start) = req.start_time {
        let (window_start, window_end) = query_window(start, req.end_time);
        if !date_overlaps(event.start_time, event.end_time, window_start, window_end) {
            return None;
        }
    }

    let keyword = req.keyword.trim();
    let matches = keyword_match_count(event, keyword);
    if !keyword.is_empty() && matches == 0 {
        return None;
    }
    Some(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn jazz_event() -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "Jazz Night at the Blue Room".to_string(),
            description: "An evening of smooth jazz standards".to_string(),
            category: "Music".to_string(),
            event_type: "Concert".to_string(),
            artist: "The Miles Quartet".to_string(),
            location: Location {
                venue: "Blue Room".to_string(),
                city: "New Orleans".to_string(),
                full_address: "Blue Room, 300 Bourbon St, New Orleans".to_string(),
            },
            start_time: Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap(),
            embedding: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_contains_ci_is_case_insensitive() {
        assert!(contains_ci("Jazz Night", "jazz"));
        assert!(contains_ci("jazz night", "JAZZ"));
        assert!(!contains_ci("Rock Show", "jazz"));
    }

    #[test]
    fn test_empty_predicate_matches_everything() {
        assert!(contains_ci("anything", ""));
    }

    #[test]
    fn test_keyword_match_count_counts_fields_independently() {
        let event = jazz_event();
        // "jazz" appears in title and description, not address or artist
        assert_eq!(keyword_match_count(&event, "jazz"), 2);
        // "blue" appears in title and address
        assert_eq!(keyword_match_count(&event, "blue"), 2);
        assert_eq!(keyword_match_count(&event, "miles"), 1);
        assert_eq!(keyword_match_count(&event, "techno"), 0);
        assert_eq!(keyword_match_count(&event, ""), 0);
    }

    #[test]
    fn test_price_overlap_and_span_cases() {
        let range = Some((10.0, 50.0));
        // Candidate spans the queried range entirely
        assert!(price_matches(range, Some(20.0), Some(30.0)));
        // Candidate min falls inside the queried range
        assert!(price_matches(range, Some(5.0), Some(15.0)));
        // Disjoint
        assert!(!price_matches(range, Some(100.0), Some(200.0)));
    }

    #[test]
    fn test_price_unbounded_sides() {
        let range = Some((10.0, 50.0));
        assert!(price_matches(range, None, Some(15.0)));
        assert!(price_matches(range, Some(40.0), None));
        assert!(price_matches(range, None, None));
        assert!(price_matches(None, None, None));
        // No ticket data fails an active bound
        assert!(!price_matches(None, Some(5.0), None));
    }

    #[test]
    fn test_bare_date_matches_same_day_event() {
        let event = jazz_event();
        let query_start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let (ws, we) = query_window(query_start, None);
        assert!(date_overlaps(event.start_time, event.end_time, ws, we));

        // The day after misses it
        let next_day = Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap();
        let (ws, we) = query_window(next_day, None);
        assert!(!date_overlaps(event.start_time, event.end_time, ws, we));
    }

    #[test]
    fn test_bare_date_window_ignores_time_of_day() {
        // A mid-afternoon timestamp still produces the full-day window
        let query_start = Utc.with_ymd_and_hms(2024, 6, 1, 15, 30, 0).unwrap();
        let (ws, we) = query_window(query_start, None);
        assert_eq!(ws, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(we, Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_candidate_containing_window_matches() {
        // Multi-day festival around a one-day query window
        let cs = Utc.with_ymd_and_hms(2024, 5, 30, 0, 0, 0).unwrap();
        let ce = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap();
        let ws = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let we = Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap();
        assert!(date_overlaps(cs, ce, ws, we));
    }

    #[test]
    fn test_apply_is_conjunctive() {
        let event = jazz_event();
        let req = SearchRequest {
            keyword: "jazz".to_string(),
            location: "new orleans".to_string(),
            category: "music".to_string(),
            ..Default::default()
        };
        assert_eq!(apply(&event, &req, None), Some(2));

        // One failing predicate rejects the event
        let req = SearchRequest {
            keyword: "jazz".to_string(),
            category: "sports".to_string(),
            ..Default::default()
        };
        assert_eq!(apply(&event, &req, None), None);
    }

    #[test]
    fn test_apply_empty_request_passes_with_zero_matches() {
        let event = jazz_event();
        assert_eq!(apply(&event, &SearchRequest::default(), None), Some(0));
    }
}
