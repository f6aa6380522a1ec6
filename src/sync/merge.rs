use std::collections::HashSet;

use tracing::warn;

use crate::models::{Match, MatchHistory};

/// Append freshly fetched matches after the stored ones.
///
/// Relative order of both inputs is kept. Incoming matches whose identifier
/// is already present are dropped, so the result never holds duplicates.
pub fn merge_history(existing: MatchHistory, incoming: Vec<Match>) -> MatchHistory {
    if incoming.is_empty() {
        return existing;
    }

    let mut seen: HashSet<String> = existing.iter().map(|m| m.id.clone()).collect();
    let mut merged = existing;
    let mut dropped = 0;

    for game in incoming {
        if seen.insert(game.id.clone()) {
            merged.push(game);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        warn!("Dropped {} already-known matches while merging", dropped);
    }

    merged
}
