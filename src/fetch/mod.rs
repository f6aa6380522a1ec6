//! Incremental match-history fetching.
//!
//! Pages through the remote listing for one player until the listing is
//! exhausted or a match already known locally shows up. The remote side is
//! abstracted behind [`MatchSource`]; [`HttpMatchSource`] talks to the real
//! API. Results are cached per player in a shared [`FetchCache`].

mod cache;
mod http;

pub use cache::FetchCache;
pub use http::HttpMatchSource;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{Match, MatchHistory, ProfileId};

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("API error {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Listing did not end within {max_pages} pages")]
    PageLimitExceeded { max_pages: u32 },
}

impl FetchError {
    /// Whether a single page request is worth repeating.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::RateLimited { .. } => true,
            FetchError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Retry policy for page requests.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub backoff_multiplier: f64,

    /// Ceiling for any single wait, including server-requested ones.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 60_000,
        }
    }
}

impl RetryPolicy {
    /// How long to wait after `err` when the current backoff is `delay_ms`.
    pub fn wait_ms(&self, delay_ms: u64, err: &FetchError) -> u64 {
        let wait = match err {
            FetchError::RateLimited { retry_after_secs } => {
                delay_ms.max(retry_after_secs.saturating_mul(1000))
            }
            _ => delay_ms,
        };
        wait.min(self.max_delay_ms)
    }

    /// Backoff after `delay_ms`.
    pub fn next_delay_ms(&self, delay_ms: u64) -> u64 {
        // Float to int casts saturate.
        ((delay_ms as f64 * self.backoff_multiplier) as u64).min(self.max_delay_ms)
    }
}

/// Configuration for the match fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Base URL of the match-history API
    pub api_base_url: String,

    /// Request timeout
    pub timeout: Duration,

    /// How long a cached fetch result is served
    pub cache_ttl: Duration,

    /// Upper bound on pages requested in one fetch
    pub max_pages: u32,

    pub retry: RetryPolicy,

    /// User agent string
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://aoe4world.com/api/v0".to_string(),
            timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(300),
            max_pages: 500,
            retry: RetryPolicy::default(),
            user_agent: format!("aoe4-ledger/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Where an incremental fetch starts and stops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FetchCursor {
    /// Server-side filter: only matches started at or after this time.
    pub since: Option<String>,

    /// Identifier of the newest known match; the fetch stops there.
    pub stop_at: Option<String>,
}

impl FetchCursor {
    /// Cursor for "everything newer than what this history already has".
    pub fn from_history(history: &MatchHistory) -> Self {
        match history.latest() {
            Some(latest) => Self {
                since: Some(latest.started_at.clone()),
                stop_at: Some(latest.id.clone()),
            },
            None => Self::default(),
        }
    }
}

/// One page of the remote listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchPage {
    #[serde(default)]
    pub games: Vec<Match>,

    #[serde(default)]
    pub total_count: Option<u64>,

    #[serde(default)]
    pub offset: Option<u64>,

    #[serde(default)]
    pub count: Option<u64>,

    #[serde(default)]
    pub page: Option<u32>,

    #[serde(default)]
    pub per_page: Option<u32>,
}

impl MatchPage {
    pub fn new(games: Vec<Match>) -> Self {
        Self {
            games,
            ..Self::default()
        }
    }

    /// Whether no further pages remain after this one.
    pub fn is_last(&self) -> bool {
        if self.games.is_empty() {
            return true;
        }
        match self.total_count {
            Some(total) => {
                let count = self.count.unwrap_or(self.games.len() as u64);
                self.offset.unwrap_or(0) + count >= total
            }
            None => false,
        }
    }
}

/// Paginated remote listing of a player's matches.
#[async_trait]
pub trait MatchSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &'static str;

    /// Fetch one page (1-based) of the player's matches.
    async fn fetch_page(
        &self,
        profile_id: ProfileId,
        since: Option<&str>,
        page: u32,
    ) -> Result<MatchPage, FetchError>;
}

/// Pages through a [`MatchSource`], stopping at known matches.
pub struct MatchFetcher {
    source: Arc<dyn MatchSource>,
    cache: Arc<FetchCache>,
    config: FetcherConfig,
}

impl MatchFetcher {
    pub fn new(source: Arc<dyn MatchSource>, cache: Arc<FetchCache>, config: FetcherConfig) -> Self {
        Self {
            source,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    /// Fetch every match newer than the cursor, in listing order.
    ///
    /// Any failing page aborts the whole fetch; nothing partial is returned
    /// or cached.
    pub async fn fetch(
        &self,
        profile_id: ProfileId,
        cursor: &FetchCursor,
    ) -> Result<Vec<Match>, FetchError> {
        if let Some(cached) = self.cache.get(profile_id, cursor).await {
            info!(
                "Serving {} matches for player {} from cache",
                cached.len(),
                profile_id
            );
            return Ok(cached);
        }

        let matches = self.fetch_uncached(profile_id, cursor).await?;
        self.cache
            .insert(profile_id, cursor.clone(), matches.clone())
            .await;
        Ok(matches)
    }

    async fn fetch_uncached(
        &self,
        profile_id: ProfileId,
        cursor: &FetchCursor,
    ) -> Result<Vec<Match>, FetchError> {
        let mut collected: Vec<Match> = Vec::new();
        let mut page = 1;

        loop {
            if page > self.config.max_pages {
                return Err(FetchError::PageLimitExceeded {
                    max_pages: self.config.max_pages,
                });
            }

            let batch = self
                .fetch_page_with_retry(profile_id, cursor.since.as_deref(), page)
                .await?;
            debug!(
                "{}: page {} for player {} returned {} matches",
                self.source.name(),
                page,
                profile_id,
                batch.games.len()
            );

            if let Some(stop_at) = cursor.stop_at.as_deref() {
                if let Some(pos) = batch.games.iter().position(|g| g.id == stop_at) {
                    collected.extend(batch.games.into_iter().take(pos));
                    debug!("Reached known match {} on page {}", stop_at, page);
                    break;
                }
            }

            let last = batch.is_last();
            collected.extend(batch.games);
            if last {
                break;
            }
            page += 1;
        }

        info!(
            "Fetched {} new matches for player {} ({} pages)",
            collected.len(),
            profile_id,
            page
        );
        Ok(collected)
    }

    async fn fetch_page_with_retry(
        &self,
        profile_id: ProfileId,
        since: Option<&str>,
        page: u32,
    ) -> Result<MatchPage, FetchError> {
        let policy = &self.config.retry;
        let mut attempt = 0;
        let mut delay_ms = policy.initial_delay_ms.min(policy.max_delay_ms);

        loop {
            match self.source.fetch_page(profile_id, since, page).await {
                Ok(batch) => return Ok(batch),
                Err(e) if e.is_transient() && attempt < policy.max_retries => {
                    attempt += 1;
                    let wait_ms = policy.wait_ms(delay_ms, &e);
                    warn!(
                        "Page {} for player {} failed ({}), retry {}/{} in {}ms",
                        page, profile_id, e, attempt, policy.max_retries, wait_ms
                    );
                    tokio::time::sleep(Duration::from_millis(wait_ms)).await;
                    delay_ms = policy.next_delay_ms(delay_ms);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
