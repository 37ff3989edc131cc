//! # Freshet
//!
//! A feed synchronization and caching engine. Sources are fetched over
//! plain HTTP, parsed into title/link/date items, merged into a per-URL
//! cache without losing read state, and persisted as flat JSON documents.
//! A UI layer (here, a small CLI) renders immutable state snapshots
//! published by the orchestrator; the engine knows nothing about
//! rendering.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Parser → Cache & Merge Engine → Store
//!                          ↑
//!                   Sync Orchestrator → Snapshot stream → UI
//! ```
//!
//! - [`fetcher`]: plain-GET HTTP client behind an async trait
//! - [`parser`]: textual item/title/link extraction, never fails
//! - [`engine`]: fetch-or-serve decisions and read-state-preserving merges
//! - [`store`]: atomic JSON persistence of the three engine documents
//! - [`sync`]: the actor that owns all mutable state and publishes snapshots

/// Error type and `Result` alias.
pub mod app;

/// Command-line interface: the thin external caller that drives the
/// orchestrator and renders its snapshots.
pub mod cli;

/// Core domain models.
///
/// - [`FeedSource`](domain::FeedSource): a named subscription, id stable for life
/// - [`FeedItem`](domain::FeedItem): one entry, identified by its link
/// - [`ReadState`](domain::ReadState): the persisted read/unread ledger
/// - [`CacheDoc`](domain::CacheDoc): on-disk shape of the fetch cache
pub mod domain;

/// Cache and merge engine: decides fetch-versus-serve-cache per URL and
/// merges fresh items with retained ones under a 200-item cap.
pub mod engine;

/// HTTP fetching. Full re-download every time; no conditional requests.
pub mod fetcher;

/// Textual feed parsing into ordered item sequences.
pub mod parser;

/// Flat-file JSON persistence with atomic writes, plus an in-memory store
/// for tests.
pub mod store;

/// Sync orchestration: the single-owner actor, its command handle and the
/// snapshot stream, including the 15-minute background refresh timer.
pub mod sync;
