use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use super::FetchCursor;
use crate::models::{Match, ProfileId};

struct CacheEntry {
    cursor: FetchCursor,
    matches: Vec<Match>,
    fetched_at: Instant,
}

/// Process-wide cache of fetch results, one entry per player.
///
/// Built once at startup and shared by reference. An entry is only served
/// for the exact cursor it was fetched with and while younger than the TTL.
/// A zero TTL disables caching.
pub struct FetchCache {
    entries: RwLock<HashMap<ProfileId, CacheEntry>>,
    ttl: Duration,
}

impl FetchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn get(&self, profile_id: ProfileId, cursor: &FetchCursor) -> Option<Vec<Match>> {
        if self.ttl.is_zero() {
            return None;
        }

        let entries = self.entries.read().await;
        entries
            .get(&profile_id)
            .filter(|entry| entry.cursor == *cursor && entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.matches.clone())
    }

    pub async fn insert(&self, profile_id: ProfileId, cursor: FetchCursor, matches: Vec<Match>) {
        if self.ttl.is_zero() {
            return;
        }

        let mut entries = self.entries.write().await;
        entries.insert(
            profile_id,
            CacheEntry {
                cursor,
                matches,
                fetched_at: Instant::now(),
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::game_1v1;
    use std::sync::Arc;

    fn cursor(stop_at: &str) -> FetchCursor {
        FetchCursor {
            since: Some("2025-01-01T00:00:00Z".to_string()),
            stop_at: Some(stop_at.to_string()),
        }
    }

    #[tokio::test]
    async fn test_hit_requires_same_cursor() {
        let cache = FetchCache::new(Duration::from_secs(60));
        cache
            .insert(1, cursor("a"), vec![game_1v1("b", "t", 1, true)])
            .await;

        assert_eq!(cache.get(1, &cursor("a")).await.unwrap().len(), 1);
        assert!(cache.get(1, &cursor("b")).await.is_none());
        assert!(cache.get(2, &cursor("a")).await.is_none());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = FetchCache::new(Duration::from_millis(20));
        cache.insert(1, cursor("a"), Vec::new()).await;
        assert!(cache.get(1, &cursor("a")).await.is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get(1, &cursor("a")).await.is_none());
    }

    #[tokio::test]
    async fn test_zero_ttl_disables() {
        let cache = FetchCache::new(Duration::ZERO);
        cache.insert(1, cursor("a"), Vec::new()).await;

        assert!(cache.is_empty().await);
        assert!(cache.get(1, &cursor("a")).await.is_none());
    }

    #[tokio::test]
    async fn test_write_visible_to_concurrent_readers() {
        let cache = Arc::new(FetchCache::new(Duration::from_secs(60)));
        cache
            .insert(5, cursor("a"), vec![game_1v1("x", "t", 5, false)])
            .await;

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get(5, &cursor("a")).await })
            })
            .collect();

        for reader in readers {
            assert_eq!(reader.await.unwrap().unwrap()[0].id, "x");
        }
    }
}
