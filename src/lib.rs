//! # event-search
//!
//! A Rust web service for semantic event search: free-text queries are
//! embedded into dense vectors and matched against event descriptions,
//! with keyword-match boosting, structured filters, and paginated output.
//!
//! ## Architecture
//!
//! Each search request flows through a single pipeline:
//!
//! ```text
//!                    ┌──────────────┐
//!                    │  User Query   │
//!                    │ keyword + filters
//!                    └──────┬───────┘
//!                           │ validate (fail fast)
//!                           ▼
//!                ┌─────────────────────┐
//!                │  Embedding Provider  │
//!                │  text → unit vector  │
//!                └──────────┬──────────┘
//!                           │ query vector
//!                           ▼
//!                ┌─────────────────────┐
//!                │  Vector Index (ANN)  │──── unavailable ────┐
//!                │  candidate retrieval │                     │
//!                └──────────┬──────────┘                     ▼
//!                           │ candidates          ┌────────────────────┐
//!                           ▼                     │ filter-only fallback│
//!                ┌─────────────────────┐          │ (response flagged   │
//!                │    Filter Engine     │◀─────────│  as degraded)      │
//!                │ location / category  │          └────────────────────┘
//!                │ type / price / date  │
//!                └──────────┬──────────┘
//!                           │ survivors + per-field keyword counts
//!                           ▼
//!                ┌─────────────────────┐
//!                │  Relevance Scorer    │
//!                │ exact cosine × match │
//!                │ count (boost)        │
//!                └──────────┬──────────┘
//!                           │ ranked candidates
//!                           ▼
//!                ┌─────────────────────┐
//!                │  Result Assembler    │
//!                │ sort override + page │
//!                └─────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, data dir, and embedding settings
//! - [`models`] - Shared data types: `Event`, `Ticket`, request/response types
//! - [`error`] - The pipeline's error taxonomy
//! - [`embedding`] - Embedding provider behind the [`embedding::Embedder`] trait, with
//!   lazy single-shot initialization (Ollama or OpenAI-compatible APIs)
//! - [`store`] - Event/ticket store with JSON persistence and the ANN index adapter
//! - [`search::filter`] - Conjunctive predicate filtering with per-field keyword counts
//! - [`search::score`] - Exact cosine similarity and keyword-boosted ranking
//! - [`search::assemble`] - Sort overrides and pagination
//! - [`search::pipeline`] - The orchestrated search flow, including index-down fallback
//! - [`backfill`] - Chunked, bounded-concurrency embedding recomputation
//! - [`api`] - Axum HTTP handlers for events, tickets, search, and backfill
//! - [`state`] - Shared application state wiring store, embedder, and pipeline

pub mod api;
pub mod backfill;
pub mod config;
pub mod embedding;
pub mod error;
pub mod models;
pub mod search;
pub mod state;
pub mod store;
