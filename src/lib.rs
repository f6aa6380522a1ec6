//! # AoE4 Ledger
//!
//! Incremental match-history sync and per-player statistics for
//! Age of Empires IV.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (matches, histories, statistics)
//! - **storage**: Match history persistence (local files, S3-compatible object storage, no-op)
//! - **fetch**: Paginated, cached retrieval of new matches from the remote API
//! - **sync**: Load → fetch → merge → save orchestration
//! - **calculate**: Statistics computation over a full history
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod fetch;
pub mod models;
pub mod storage;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use models::*;
