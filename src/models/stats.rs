//! Derived statistics models.
//!
//! Everything here is recomputed from a match history on every request and
//! never persisted.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::Outcome;

/// Percentage of wins, 0 when nothing was played.
pub fn win_percentage(wins: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * wins as f64 / total as f64
    }
}

/// Overall record of the target player.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchTotals {
    pub total: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
}

impl MatchTotals {
    pub fn record(&mut self, outcome: Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
        }
        self.win_rate = win_percentage(self.wins, self.total);
    }
}

/// Record of the target player with one civilization.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CivStat {
    pub total: u32,
    pub wins: u32,
    pub losses: u32,
    /// `100 * wins / total`.
    pub win_rate: f64,
}

impl CivStat {
    pub fn record(&mut self, outcome: Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
        }
        self.win_rate = win_percentage(self.wins, self.total);
    }
}

/// Shared matches with another player, counted from the target's result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AllyOpponentStat {
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
}

impl AllyOpponentStat {
    pub fn record(&mut self, outcome: Outcome) {
        self.games += 1;
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
        }
    }
}

/// One row of a ranked ally or opponent table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedStat {
    pub name: String,
    pub stat: AllyOpponentStat,
}

/// Civilization buckets ranked by games played.
///
/// Serialized as a JSON object whose key order is the ranking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CivStats(Vec<(String, CivStat)>);

impl CivStats {
    pub fn new(ranked: Vec<(String, CivStat)>) -> Self {
        Self(ranked)
    }

    pub fn get(&self, civilization: &str) -> Option<&CivStat> {
        self.0
            .iter()
            .find(|(name, _)| name == civilization)
            .map(|(_, stat)| stat)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CivStat)> {
        self.0.iter().map(|(name, stat)| (name.as_str(), stat))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for CivStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, stat) in &self.0 {
            map.serialize_entry(name, stat)?;
        }
        map.end()
    }
}

/// Streaks and recent form, ordered by match start time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrendStats {
    /// Consecutive wins counting back from the most recent match.
    pub current_win_streak: u32,
    pub longest_win_streak: u32,
    pub longest_loss_streak: u32,
    /// Rounded percentage over the last 10 matches.
    pub win_rate_last_10: u32,
    /// Rounded percentage over the last 50 matches.
    pub win_rate_last_50: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapStat {
    pub map: String,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
}

/// Match counts per length bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DurationDistribution {
    /// Under 10 minutes.
    pub very_short: u32,
    /// 10 to 20 minutes.
    pub short: u32,
    /// 20 to 30 minutes.
    pub medium: u32,
    /// 30 to 40 minutes.
    pub long: u32,
    /// 40 minutes or more.
    pub very_long: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DurationStats {
    /// Matches that reported a duration.
    pub counted: u32,
    pub average_secs: Option<u64>,
    pub longest_secs: Option<u64>,
    pub distribution: DurationDistribution,
}

/// Full analysis of one player's history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub match_stats: MatchTotals,
    pub civ_stats: CivStats,
    pub allies: Vec<NamedStat>,
    pub opponents: Vec<NamedStat>,
    pub trends: TrendStats,
    pub maps: Vec<MapStat>,
    pub durations: DurationStats,
}
