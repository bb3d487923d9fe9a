//! Document store for events and ticket records.
//!
//! In-memory with JSON disk persistence, mirroring the rest of the data
//! layer: loaded at startup, guarded by `RwLock`, written back atomically
//! (temp file + rename) after every mutation.

pub mod vector;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::models::{Event, Ticket};

pub struct EventStore {
    events: RwLock<Vec<Event>>,
    tickets: RwLock<Vec<Ticket>>,
    events_path: PathBuf,
    tickets_path: PathBuf,
}

impl EventStore {
    pub fn open_or_create(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let events_path = data_dir.join("events.json");
        let tickets_path = data_dir.join("tickets.json");

        let events = load_json(&events_path).context("Failed to read event store")?;
        let tickets = load_json(&tickets_path).context("Failed to read ticket store")?;

        Ok(Self {
            events: RwLock::new(events),
            tickets: RwLock::new(tickets),
            events_path,
            tickets_path,
        })
    }

    pub fn list_events(&self) -> Vec<Event> {
        self.events.read().clone()
    }

    pub fn get_event(&self, id: &Uuid) -> Option<Event> {
        self.events.read().iter().find(|e| &e.id == id).cloned()
    }

    pub fn event_count(&self) -> usize {
        self.events.read().len()
    }

    /// Number of events currently carrying an embedding.
    pub fn indexed_count(&self) -> usize {
        self.events
            .read()
            .iter()
            .filter(|e| e.embedding.is_some())
            .count()
    }

    /// Insert or replace an event. A changed description invalidates the
    /// stored embedding; callers recompute it (or leave it for backfill).
    pub fn upsert_event(&self, mut event: Event) -> Result<()> {
        {
            let mut events = self.events.write();
            if let Some(existing) = events.iter_mut().find(|e| e.id == event.id) {
                // Keep the stored embedding only while the description it
                // was derived from is unchanged.
                if event.embedding.is_none() && existing.description == event.description {
                    event.embedding = existing.embedding.take();
                }
                *existing = event;
            } else {
                events.push(event);
            }
        }
        self.persist_events()
    }

    /// Delete an event and its ticket records. Returns false when the id
    /// was not present.
    pub fn delete_event(&self, id: &Uuid) -> Result<bool> {
        let removed = {
            let mut events = self.events.write();
            let before = events.len();
            events.retain(|e| &e.id != id);
            events.len() != before
        };
        if removed {
            self.tickets.write().retain(|t| &t.event_id != id);
            self.persist_events()?;
            self.persist_tickets()?;
        }
        Ok(removed)
    }

    /// Replace the ticket tiers for one event.
    pub fn set_tickets(&self, event_id: Uuid, tickets: Vec<Ticket>) -> Result<()> {
        {
            let mut all = self.tickets.write();
            all.retain(|t| t.event_id != event_id);
            all.extend(tickets);
        }
        self.persist_tickets()
    }

    /// Per-event (min, max) ticket price, computed fresh from the ticket
    /// records. Events without tickets are absent from the map.
    pub fn price_ranges(&self) -> HashMap<Uuid, (f64, f64)> {
        let tickets = self.tickets.read();
        let mut ranges: HashMap<Uuid, (f64, f64)> = HashMap::new();
        for t in tickets.iter() {
            ranges
                .entry(t.event_id)
                .and_modify(|(min, max)| {
                    *min = min.min(t.price);
                    *max = max.max(t.price);
                })
                .or_insert((t.price, t.price));
        }
        ranges
    }

    /// Write computed embeddings back in one pass. Ids with no matching
    /// event are skipped and returned so the caller can report them;
    /// a missing id never blocks the rest of the batch.
    pub fn bulk_upsert_embeddings(
        &self,
        embeddings: Vec<(Uuid, Vec<f32>)>,
    ) -> Result<Vec<Uuid>> {
        let mut missing = Vec::new();
        {
            let mut events = self.events.write();
            for (id, embedding) in embeddings {
                match events.iter_mut().find(|e| e.id == id) {
                    Some(event) => event.embedding = Some(embedding),
                    None => missing.push(id),
                }
            }
        }
        self.persist_events()?;
        Ok(missing)
    }

    fn persist_events(&self) -> Result<()> {
        let events = self.events.read();
        atomic_write_json(&self.events_path, &*events)
    }

    fn persist_tickets(&self) -> Result<()> {
        let tickets = self.tickets.read();
        atomic_write_json(&self.tickets_path, &*tickets)
    }
}

fn load_json<T: serde::de::DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data).unwrap_or_default())
}

/// Atomic write via temp file + rename.
fn atomic_write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_string(value)?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &data)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
