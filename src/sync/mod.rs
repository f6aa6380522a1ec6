//! Sync orchestrator.
//!
//! Coordinates one incremental refresh of a player's history:
//! 1. Load the stored history
//! 2. Derive the fetch cursor from its newest match
//! 3. Fetch everything newer from the source
//! 4. Merge and save the full history back

mod merge;

pub use merge::merge_history;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::AppConfig;
use crate::fetch::{FetchCache, FetchCursor, HttpMatchSource, MatchFetcher};
use crate::models::{MatchHistory, ProfileId};
use crate::storage::{build_store, history_key, MatchStore};

/// Errors that can occur during sync.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] crate::fetch::FetchError),

    #[error(transparent)]
    Storage(#[from] crate::storage::StorageError),
}

/// Summary of one refresh.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub profile_id: ProfileId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,

    /// Matches already stored before this refresh
    pub stored_before: usize,

    /// Matches returned by the fetcher
    pub fetched: usize,

    /// Size of the saved history
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub history: MatchHistory,
    pub report: SyncReport,
}

/// Load → fetch → merge → save pipeline for one player at a time.
pub struct HistorySync {
    store: Arc<dyn MatchStore>,
    fetcher: MatchFetcher,
}

impl HistorySync {
    pub fn new(store: Arc<dyn MatchStore>, fetcher: MatchFetcher) -> Self {
        Self { store, fetcher }
    }

    /// Wire the configured store to the live HTTP source.
    pub async fn from_config(config: &AppConfig) -> Result<Self, SyncError> {
        let store = build_store(config).await?;
        let fetcher_config = config.fetcher_config();
        let source = Arc::new(HttpMatchSource::new(&fetcher_config)?);
        let cache = Arc::new(FetchCache::new(fetcher_config.cache_ttl));

        info!(
            "Fetching from {} (cache ttl {}s, {} retries)",
            fetcher_config.api_base_url,
            fetcher_config.cache_ttl.as_secs(),
            fetcher_config.retry.max_retries
        );

        Ok(Self::new(store, MatchFetcher::new(source, cache, fetcher_config)))
    }

    /// Bring the stored history up to date and return it.
    ///
    /// The first failure aborts the refresh; nothing is saved on a failed
    /// fetch.
    pub async fn refresh(&self, profile_id: ProfileId) -> Result<SyncOutcome, SyncError> {
        let started_at = Utc::now();
        let key = history_key(profile_id);

        let existing = self.store.load(&key).await?;
        let stored_before = existing.len();
        let cursor = FetchCursor::from_history(&existing);

        let incoming = self.fetcher.fetch(profile_id, &cursor).await?;
        let fetched = incoming.len();

        let history = merge_history(existing, incoming);
        self.store.save(&key, &history).await?;

        info!(
            "Player {}: {} stored, {} fetched, {} total ({} store)",
            profile_id,
            stored_before,
            fetched,
            history.len(),
            self.store.name()
        );

        let report = SyncReport {
            profile_id,
            started_at,
            completed_at: Utc::now(),
            stored_before,
            fetched,
            total: history.len(),
        };

        Ok(SyncOutcome { history, report })
    }
}
