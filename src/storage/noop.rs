use async_trait::async_trait;

use super::{MatchStore, StorageError};
use crate::models::MatchHistory;

/// Persistence disabled: loads are always empty, saves always succeed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

#[async_trait]
impl MatchStore for NoopStore {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn load(&self, _key: &str) -> Result<MatchHistory, StorageError> {
        Ok(MatchHistory::new())
    }

    async fn save(&self, _key: &str, _history: &MatchHistory) -> Result<(), StorageError> {
        Ok(())
    }
}
