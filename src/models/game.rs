//! Match records as served by the match-history source.

use serde::{Deserialize, Deserializer, Serialize};

/// Numeric player identifier on the source.
pub type ProfileId = i64;

/// Outcome of one participant in a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    #[default]
    Loss,
}

impl Outcome {
    pub fn is_win(self) -> bool {
        self == Outcome::Win
    }

    /// The outcome seen from the other side of the match.
    pub fn inverse(self) -> Self {
        match self {
            Outcome::Win => Outcome::Loss,
            Outcome::Loss => Outcome::Win,
        }
    }
}

/// Anything other than `"win"` (including `null`) counts as a loss.
impl<'de> Deserialize<'de> for Outcome {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.as_deref() {
            Some("win") => Outcome::Win,
            _ => Outcome::Loss,
        })
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Win => write!(f, "win"),
            Outcome::Loss => write!(f, "loss"),
        }
    }
}

/// One player's membership and result within a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub profile_id: ProfileId,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub civilization: String,

    #[serde(default)]
    pub result: Outcome,
}

/// Team slot wrapper; the source nests each participant under `player`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub player: Participant,
}

/// Participants sharing a side. Identity is the position in `Match::teams`.
pub type Team = Vec<TeamMember>;

/// One completed game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Source identifier, accepted as `id` or `game_id`, string or number.
    #[serde(alias = "game_id", deserialize_with = "string_or_number")]
    pub id: String,

    /// ISO-8601 start time.
    pub started_at: String,

    #[serde(default)]
    pub teams: Vec<Team>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,

    /// Match length in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaderboard: Option<String>,
}

impl Match {
    /// Locate a player, returning their team index and participant entry.
    pub fn find_player(&self, profile_id: ProfileId) -> Option<(usize, &Participant)> {
        self.teams.iter().enumerate().find_map(|(team_index, team)| {
            team.iter()
                .find(|member| member.player.profile_id == profile_id)
                .map(|member| (team_index, &member.player))
        })
    }

    /// Every participant paired with its team index, in team order.
    pub fn participants(&self) -> impl Iterator<Item = (usize, &Participant)> {
        self.teams
            .iter()
            .enumerate()
            .flat_map(|(team_index, team)| team.iter().map(move |m| (team_index, &m.player)))
    }
}

/// `null` decodes the same as a missing string.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Unsigned(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Unsigned(n) => n.to_string(),
    })
}
