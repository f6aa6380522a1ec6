//! Statistics calculation engine.
//!
//! Scans a player's match history once and computes:
//! - Overall win/loss record
//! - Per-civilization record and win rate
//! - Ranked ally and opponent tables
//! - Streaks, recent form, map and duration breakdowns
//!
//! Ally and opponent buckets are keyed by display name, so two different
//! players sharing a name end up in one bucket.

mod trends;

pub use trends::{duration_stats, trend_stats};

use std::collections::HashMap;

use crate::models::{
    AllyOpponentStat, AnalysisResult, CivStat, CivStats, MapStat, MatchHistory, MatchTotals,
    NamedStat, Outcome, ProfileId,
};

const UNKNOWN_MAP: &str = "Unknown";

/// Buckets keyed by name that remember first-seen order.
///
/// Ranking sorts stably on top of that order, so ties keep the order in
/// which the keys first appeared in the history.
struct Tally<T> {
    entries: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T: Default> Tally<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn entry(&mut self, key: &str) -> &mut T {
        let pos = match self.index.get(key) {
            Some(&pos) => pos,
            None => {
                self.entries.push((key.to_string(), T::default()));
                self.index.insert(key.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    /// Entries ordered by descending `count`, ties in first-seen order.
    fn ranked_by<F>(self, count: F) -> Vec<(String, T)>
    where
        F: Fn(&T) -> u32,
    {
        let mut entries = self.entries;
        entries.sort_by(|a, b| count(&b.1).cmp(&count(&a.1)));
        entries
    }
}

fn named(ranked: Vec<(String, AllyOpponentStat)>) -> Vec<NamedStat> {
    ranked
        .into_iter()
        .map(|(name, stat)| NamedStat { name, stat })
        .collect()
}

/// Analyze `history` from the point of view of `profile_id`.
///
/// Matches the player did not take part in are skipped.
pub fn analyze(history: &MatchHistory, profile_id: ProfileId) -> AnalysisResult {
    let mut totals = MatchTotals::default();
    let mut civs: Tally<CivStat> = Tally::new();
    let mut allies: Tally<AllyOpponentStat> = Tally::new();
    let mut opponents: Tally<AllyOpponentStat> = Tally::new();
    let mut maps: Tally<AllyOpponentStat> = Tally::new();
    let mut played: Vec<(&str, Outcome)> = Vec::new();
    let mut durations: Vec<u64> = Vec::new();

    for game in history {
        let Some((own_team, me)) = game.find_player(profile_id) else {
            continue;
        };
        let outcome = me.result;

        totals.record(outcome);
        civs.entry(&me.civilization).record(outcome);

        for (team, other) in game.participants() {
            if other.profile_id == profile_id {
                continue;
            }
            if team == own_team {
                allies.entry(&other.name).record(outcome);
            } else {
                opponents.entry(&other.name).record(outcome.inverse());
            }
        }

        maps.entry(game.map.as_deref().unwrap_or(UNKNOWN_MAP)).record(outcome);
        played.push((game.started_at.as_str(), outcome));
        if let Some(secs) = game.duration {
            durations.push(secs);
        }
    }

    AnalysisResult {
        match_stats: totals,
        civ_stats: CivStats::new(civs.ranked_by(|c| c.total)),
        allies: named(allies.ranked_by(|s| s.games)),
        opponents: named(opponents.ranked_by(|s| s.games)),
        trends: trend_stats(&played),
        maps: maps
            .ranked_by(|s| s.games)
            .into_iter()
            .map(|(map, s)| MapStat {
                map,
                games: s.games,
                wins: s.wins,
                losses: s.losses,
            })
            .collect(),
        durations: duration_stats(&durations),
    }
}
