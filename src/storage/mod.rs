//! Match history persistence.
//!
//! A player's history is one JSON blob addressed by a path-like key.
//! Backends are interchangeable behind [`MatchStore`]:
//! - Local filesystem ([`LocalStore`])
//! - S3-compatible object storage such as Cloudflare R2 ([`ObjectStore`])
//! - Disabled persistence ([`NoopStore`])

mod local;
mod noop;
mod object;

pub use local::LocalStore;
pub use noop::NoopStore;
pub use object::{ObjectStore, ObjectStoreSettings};

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{AppConfig, StorageKind};
use crate::models::{MatchHistory, ProfileId};

/// Errors that can occur during storage operations.
///
/// A missing key is never an error; loads return an empty history instead.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Object store error: {0}")]
    ObjectStore(String),

    #[error("Invalid storage configuration: {0}")]
    InvalidConfig(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Load/save capability for per-player match histories.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Read the history stored under `key`; empty when nothing is stored.
    async fn load(&self, key: &str) -> Result<MatchHistory, StorageError>;

    /// Replace whatever is stored under `key` with `history`.
    async fn save(&self, key: &str, history: &MatchHistory) -> Result<(), StorageError>;
}

/// Storage key of one player's history blob.
pub fn history_key(profile_id: ProfileId) -> String {
    format!("player_games_{}.json", profile_id)
}

/// Build the backend selected by configuration.
pub async fn build_store(config: &AppConfig) -> Result<Arc<dyn MatchStore>, StorageError> {
    let store: Arc<dyn MatchStore> = match config.storage_type {
        StorageKind::Local => Arc::new(LocalStore::new(config.game_storage_path.clone())),
        StorageKind::Cloudflare => {
            let settings = ObjectStoreSettings::from_config(config)?;
            Arc::new(ObjectStore::new(settings))
        }
        StorageKind::None => Arc::new(NoopStore),
    };

    tracing::info!("Using {} match store", store.name());
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_key() {
        assert_eq!(history_key(1234), "player_games_1234.json");
    }

    #[tokio::test]
    async fn test_build_store_selects_backend() {
        let mut config = AppConfig::default();

        config.storage_type = StorageKind::None;
        assert_eq!(build_store(&config).await.unwrap().name(), "noop");

        config.storage_type = StorageKind::Local;
        assert_eq!(build_store(&config).await.unwrap().name(), "local");
    }

    #[tokio::test]
    async fn test_build_object_store_requires_settings() {
        let mut config = AppConfig::default();
        config.storage_type = StorageKind::Cloudflare;

        let err = build_store(&config).await.err().unwrap();
        assert!(matches!(err, StorageError::InvalidConfig(_)));
    }
}
