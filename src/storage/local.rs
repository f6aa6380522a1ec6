//! Local filesystem backend.
//!
//! Each history is a pretty-printed JSON array under the data directory.
//! Saves write a uniquely named temp file in the same directory and rename
//! it over the target, so overlapping saves of one key never share a file.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{MatchStore, StorageError};
use crate::models::MatchHistory;

#[derive(Debug, Clone)]
pub struct LocalStore {
    data_dir: PathBuf,
}

impl LocalStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.data_dir.join(key)
    }
}

/// Write `bytes` to a fresh temp file in `dir`, then rename it onto `target`.
fn write_replace(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| StorageError::io(dir, e))?;
    tmp.write_all(bytes)
        .map_err(|e| StorageError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StorageError::io(tmp.path(), e))?;
    tmp.persist(target)
        .map_err(|e| StorageError::io(target, e.error))?;
    Ok(())
}

#[async_trait]
impl MatchStore for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn load(&self, key: &str) -> Result<MatchHistory, StorageError> {
        let path = self.path_for(key);

        let content = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No stored history at {:?}", path);
                return Ok(MatchHistory::new());
            }
            Err(e) => return Err(StorageError::io(path, e)),
        };

        let history: MatchHistory = serde_json::from_slice(&content)?;
        debug!("Loaded {} matches from {:?}", history.len(), path);
        Ok(history)
    }

    async fn save(&self, key: &str, history: &MatchHistory) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let json = serde_json::to_vec_pretty(history)?;

        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.data_dir.clone());
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::io(&dir, e))?;

        let target = path.clone();
        tokio::task::spawn_blocking(move || write_replace(&dir, &target, &json))
            .await
            .map_err(|e| StorageError::io(&path, std::io::Error::other(e)))??;

        debug!("Saved {} matches to {:?}", history.len(), path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::game_1v1;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_missing_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalStore::new(temp_dir.path().to_path_buf());

        let history = store.load("player_games_1.json").await.unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalStore::new(temp_dir.path().join("nested").join("data"));

        let history = MatchHistory::from_matches(vec![
            game_1v1("1", "2025-01-01T10:00:00Z", 1, true),
            game_1v1("2", "2025-01-02T10:00:00Z", 1, false),
        ]);

        store.save("player_games_1.json", &history).await.unwrap();
        let loaded = store.load("player_games_1.json").await.unwrap();

        assert_eq!(loaded, history);
        assert!(!store.path_for("player_games_1.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalStore::new(temp_dir.path().to_path_buf());

        let first = MatchHistory::from_matches(vec![game_1v1("1", "2025-01-01T10:00:00Z", 1, true)]);
        let second = MatchHistory::from_matches(vec![
            game_1v1("1", "2025-01-01T10:00:00Z", 1, true),
            game_1v1("2", "2025-01-02T10:00:00Z", 1, true),
        ]);

        tokio_test::assert_ok!(store.save("k.json", &first).await);
        tokio_test::assert_ok!(store.save("k.json", &second).await);

        assert_eq!(store.load("k.json").await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_same_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(LocalStore::new(temp_dir.path().to_path_buf()));
        let history = MatchHistory::from_matches(vec![game_1v1("1", "2025-01-01T10:00:00Z", 1, true)]);

        for _ in 0..20 {
            let saves: Vec<_> = (0..4)
                .map(|_| {
                    let store = store.clone();
                    let history = history.clone();
                    tokio::spawn(async move { store.save("player_games_1.json", &history).await })
                })
                .collect();

            for save in saves {
                tokio_test::assert_ok!(save.await.unwrap());
            }
        }

        assert_eq!(store.load("player_games_1.json").await.unwrap(), history);
        let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("player_games_1.json")]);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalStore::new(temp_dir.path().to_path_buf());
        std::fs::write(store.path_for("bad.json"), "not json").unwrap();

        let err = store.load("bad.json").await.unwrap_err();
        assert!(matches!(err, StorageError::Json(_)));
    }
}
