//! # eCFR Pipeline
//!
//! A batch ingestion and text-metrics pipeline for the Electronic Code of
//! Federal Regulations bulk XML.
//!
//! The pipeline downloads one XML document per CFR title from the GovInfo
//! bulk-data repository, parses the nested regulatory hierarchy
//! (title → chapter → section → paragraph), derives word counts and
//! readability metrics, persists one structured JSON record per title,
//! and aggregates everything into a single cross-title summary.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌─────────┐   ┌─────────┐
//! │ Fetcher  │──▶│ Parser  │──▶│ Metrics │──▶│  Store  │   (× N titles,
//! │ (cached) │   │ (XML)   │   │         │   │ (JSON)  │    bounded workers)
//! └──────────┘   └─────────┘   └─────────┘   └────┬────┘
//!                                                 │ join
//!                                            ┌────▼───────┐
//!                                            │ Aggregator │──▶ summary.json
//!                                            └────────────┘
//! ```
//!
//! Each title runs in its own task; failures are isolated per title and
//! reported in the batch result. The aggregator recomputes the summary
//! wholesale from the full persisted set after every batch.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration |
//! | [`models`] | Per-title records and the summary artifact |
//! | [`titles`] | Static title-number → name table |
//! | [`fetch`] | Cached, rate-limited bulk XML downloads |
//! | [`parse`] | Event-driven XML hierarchy extraction |
//! | [`dates`] | Free-text date normalization |
//! | [`metrics`] | Word/sentence/paragraph counts and readability |
//! | [`store`] | Atomic per-title JSON persistence |
//! | [`summary`] | Cross-title aggregation |
//! | [`pipeline`] | Bounded-parallel batch orchestration |

pub mod config;
pub mod dates;
pub mod display;
pub mod error;
pub mod fetch;
pub mod metrics;
pub mod models;
pub mod parse;
pub mod pipeline;
pub mod progress;
pub mod store;
pub mod summary;
pub mod titles;
