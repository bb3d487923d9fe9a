//! Batch embedding backfill.
//!
//! Recomputes embeddings for a set of events in fixed-size batches, with a
//! bounded number of batches in flight at once, then writes the results
//! back in bulk. Partial-failure tolerant: a missing id or a failed batch
//! is reported per id and never aborts its siblings.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use uuid::Uuid;

use crate::embedding::Embedder;
use crate::models::{BackfillFailure, BackfillReport};
use crate::store::EventStore;

pub async fn run_backfill(
    store: Arc<EventStore>,
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    concurrency: usize,
    event_ids: Vec<Uuid>,
) -> anyhow::Result<BackfillReport> {
    let mut failed = Vec::new();
    let mut known: Vec<(Uuid, String)> = Vec::new();

    for id in event_ids {
        match store.get_event(&id) {
            Some(event) => known.push((id, event.description)),
            None => failed.push(BackfillFailure {
                event_id: id,
                error: "event not found".to_string(),
            }),
        }
    }

    let batches: Vec<Vec<(Uuid, String)>> = known
        .chunks(batch_size.max(1))
        .map(|c| c.to_vec())
        .collect();

    let batch_results: Vec<(Vec<Uuid>, Result<Vec<Vec<f32>>, crate::error::SearchError>)> =
        stream::iter(batches)
            .map(|batch| {
                let embedder = embedder.clone();
                async move {
                    let ids: Vec<Uuid> = batch.iter().map(|(id, _)| *id).collect();
                    let texts: Vec<String> =
                        batch.into_iter().map(|(_, text)| text).collect();
                    let result = embedder.embed_batch(&texts).await;
                    (ids, result)
                }
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

    let mut computed: Vec<(Uuid, Vec<f32>)> = Vec::new();
    for (ids, result) in batch_results {
        match result {
            Ok(embeddings) => {
                computed.extend(ids.into_iter().zip(embeddings));
            }
            Err(e) => {
                tracing::warn!("backfill batch of {} failed: {e}", ids.len());
                let msg = e.to_string();
                failed.extend(ids.into_iter().map(|event_id| BackfillFailure {
                    event_id,
                    error: msg.clone(),
                }));
            }
        }
    }

    let mut succeeded: Vec<Uuid> = computed.iter().map(|(id, _)| *id).collect();
    // Events deleted between lookup and write-back surface as per-id
    // failures, same as unknown ids.
    let missing = store.bulk_upsert_embeddings(computed)?;
    succeeded.retain(|id| !missing.contains(id));
    failed.extend(missing.into_iter().map(|event_id| BackfillFailure {
        event_id,
        error: "event not found".to_string(),
    }));

    tracing::info!(
        "backfill complete: {} succeeded, {} failed",
        succeeded.len(),
        failed.len()
    );

    Ok(BackfillReport { succeeded, failed })
}
