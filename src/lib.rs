//! # Draft Meta
//!
//! A statistics engine for collectible-card-game draft formats. Raw per-game
//! counters are stored per released set and derived on demand into win
//! rates, curves, speed signals, meta shares, and pick-order metrics.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (cards, archetypes, counter rows,
//!   decklists, the color/archetype codec)
//! - **storage**: Per-set JSONL tables behind the `StatsStore` trait
//! - **calculate**: The derivation pipelines
//! - **config**: Configuration loading and validation
//!
//! Every derivation is a pure function of the rows it fetches through an
//! injected store handle, so repeated calls are side-effect-free.

pub mod calculate;
pub mod config;
pub mod models;
pub mod storage;

pub use models::*;
