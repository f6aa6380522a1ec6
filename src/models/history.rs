//! A player's persisted match history.

use serde::{Deserialize, Serialize};

use super::Match;

/// Ordered list of matches known for one player, in append order.
///
/// Persisted as a plain JSON array. Matches are only ever appended; no two
/// entries share an identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchHistory {
    matches: Vec<Match>,
}

impl MatchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_matches(matches: Vec<Match>) -> Self {
        Self { matches }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Match> {
        self.matches.iter()
    }

    pub fn into_matches(self) -> Vec<Match> {
        self.matches
    }

    /// Append a match to the end of the history.
    pub fn push(&mut self, game: Match) {
        self.matches.push(game);
    }

    /// The match with the greatest start time. Among equal timestamps the
    /// one appended last wins.
    pub fn latest(&self) -> Option<&Match> {
        self.matches
            .iter()
            .fold(None, |best: Option<&Match>, m| match best {
                Some(b) if b.started_at > m.started_at => Some(b),
                _ => Some(m),
            })
    }
}

impl<'a> IntoIterator for &'a MatchHistory {
    type Item = &'a Match;
    type IntoIter = std::slice::Iter<'a, Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(id: &str, started_at: &str) -> Match {
        Match {
            id: id.to_string(),
            started_at: started_at.to_string(),
            teams: Vec::new(),
            map: None,
            duration: None,
            leaderboard: None,
        }
    }

    #[test]
    fn test_serializes_as_array() {
        let history = MatchHistory::from_matches(vec![game("1", "2025-01-01T00:00:00Z")]);
        let json = serde_json::to_value(&history).unwrap();

        assert!(json.is_array());
        assert_eq!(json[0]["id"], "1");

        let parsed: MatchHistory = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, history);
    }

    #[test]
    fn test_latest_picks_greatest_timestamp() {
        let history = MatchHistory::from_matches(vec![
            game("a", "2025-01-02T00:00:00Z"),
            game("b", "2025-01-05T00:00:00Z"),
            game("c", "2025-01-03T00:00:00Z"),
        ]);

        assert_eq!(history.latest().unwrap().id, "b");
    }

    #[test]
    fn test_latest_tie_prefers_last_appended() {
        let history = MatchHistory::from_matches(vec![
            game("a", "2025-01-05T00:00:00Z"),
            game("b", "2025-01-05T00:00:00Z"),
        ]);

        assert_eq!(history.latest().unwrap().id, "b");
    }

    #[test]
    fn test_latest_empty() {
        assert!(MatchHistory::new().latest().is_none());
    }
}
