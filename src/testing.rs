//! Test doubles shared by unit tests across modules.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::fetch::{FetchError, MatchPage, MatchSource};
use crate::models::{Match, MatchHistory, Outcome, Participant, ProfileId, TeamMember};
use crate::storage::{MatchStore, StorageError};

pub fn player(profile_id: ProfileId, name: &str, civ: &str, won: bool) -> TeamMember {
    TeamMember {
        player: Participant {
            profile_id,
            name: name.to_string(),
            civilization: civ.to_string(),
            result: if won { Outcome::Win } else { Outcome::Loss },
        },
    }
}

pub fn game(id: &str, started_at: &str, teams: Vec<Vec<TeamMember>>) -> Match {
    Match {
        id: id.to_string(),
        started_at: started_at.to_string(),
        teams,
        map: None,
        duration: None,
        leaderboard: None,
    }
}

/// A 1v1 where `profile_id` plays "english" against a generic opponent.
pub fn game_1v1(id: &str, started_at: &str, profile_id: ProfileId, won: bool) -> Match {
    game(
        id,
        started_at,
        vec![
            vec![player(profile_id, "Target", "english", won)],
            vec![player(profile_id + 1000, "Rival", "french", !won)],
        ],
    )
}

pub enum ScriptedPage {
    Page(MatchPage),
    Status(u16),
}

/// Serves pre-baked pages by number and records every request made.
pub struct ScriptedSource {
    pages: Vec<ScriptedPage>,
    failures_left: Mutex<u32>,
    failure_status: u16,
    requests: Mutex<Vec<(u32, Option<String>)>>,
}

impl ScriptedSource {
    pub fn new(pages: Vec<ScriptedPage>) -> Self {
        Self {
            pages,
            failures_left: Mutex::new(0),
            failure_status: 503,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail the first `times` requests with `status` before serving pages.
    pub fn failing_first(mut self, times: u32, status: u16) -> Self {
        self.failures_left = Mutex::new(times);
        self.failure_status = status;
        self
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.requests.lock().unwrap().iter().map(|(p, _)| *p).collect()
    }

    pub fn requested_since(&self) -> Vec<Option<String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, s)| s.clone())
            .collect()
    }
}

#[async_trait]
impl MatchSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_page(
        &self,
        _profile_id: ProfileId,
        since: Option<&str>,
        page: u32,
    ) -> Result<MatchPage, FetchError> {
        self.requests
            .lock()
            .unwrap()
            .push((page, since.map(str::to_string)));

        {
            let mut failures = self.failures_left.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(FetchError::HttpStatus {
                    status: self.failure_status,
                    message: "scripted failure".to_string(),
                });
            }
        }

        match self.pages.get(page as usize - 1) {
            Some(ScriptedPage::Page(p)) => Ok(p.clone()),
            Some(ScriptedPage::Status(status)) => Err(FetchError::HttpStatus {
                status: *status,
                message: "scripted status".to_string(),
            }),
            None => Ok(MatchPage::default()),
        }
    }
}

/// In-memory store that counts saves and can be told to fail them.
#[derive(Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, MatchHistory>>,
    saves: Mutex<u32>,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn with(key: &str, history: MatchHistory) -> Self {
        let store = Self::default();
        store.blobs.lock().unwrap().insert(key.to_string(), history);
        store
    }

    pub fn failing_saves() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    pub fn get(&self, key: &str) -> Option<MatchHistory> {
        self.blobs.lock().unwrap().get(key).cloned()
    }

    pub fn save_count(&self) -> u32 {
        *self.saves.lock().unwrap()
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, key: &str) -> Result<MatchHistory, StorageError> {
        Ok(self.get(key).unwrap_or_default())
    }

    async fn save(&self, key: &str, history: &MatchHistory) -> Result<(), StorageError> {
        if self.fail_saves {
            return Err(StorageError::ObjectStore("disk on fire".to_string()));
        }
        *self.saves.lock().unwrap() += 1;
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), history.clone());
        Ok(())
    }
}
