use chrono::{DateTime, FixedOffset};

use crate::models::{DurationDistribution, DurationStats, Outcome, TrendStats};

/// Rounded win percentage over the last `n` results.
fn recent_win_rate(results: &[Outcome], n: usize) -> u32 {
    let recent = &results[results.len().saturating_sub(n)..];
    if recent.is_empty() {
        return 0;
    }
    let wins = recent.iter().filter(|o| o.is_win()).count();
    ((wins as f64 / recent.len() as f64) * 100.0).round() as u32
}

/// Streaks and recent form over `(started_at, outcome)` pairs.
///
/// Pairs are put in chronological order when every timestamp parses as
/// RFC 3339; otherwise the given order is taken as chronological.
pub fn trend_stats(played: &[(&str, Outcome)]) -> TrendStats {
    let parsed: Option<Vec<DateTime<FixedOffset>>> = played
        .iter()
        .map(|(ts, _)| DateTime::parse_from_rfc3339(ts).ok())
        .collect();

    let results: Vec<Outcome> = match parsed {
        Some(times) => {
            let mut ordered: Vec<(DateTime<FixedOffset>, Outcome)> = times
                .into_iter()
                .zip(played.iter().map(|(_, o)| *o))
                .collect();
            ordered.sort_by_key(|(time, _)| *time);
            ordered.into_iter().map(|(_, o)| o).collect()
        }
        None => played.iter().map(|(_, o)| *o).collect(),
    };

    let current_win_streak = results.iter().rev().take_while(|o| o.is_win()).count() as u32;

    let mut longest_win_streak = 0;
    let mut longest_loss_streak = 0;
    let mut run_wins = 0;
    let mut run_losses = 0;
    for outcome in &results {
        match outcome {
            Outcome::Win => {
                run_wins += 1;
                run_losses = 0;
                longest_win_streak = longest_win_streak.max(run_wins);
            }
            Outcome::Loss => {
                run_losses += 1;
                run_wins = 0;
                longest_loss_streak = longest_loss_streak.max(run_losses);
            }
        }
    }

    TrendStats {
        current_win_streak,
        longest_win_streak,
        longest_loss_streak,
        win_rate_last_10: recent_win_rate(&results, 10),
        win_rate_last_50: recent_win_rate(&results, 50),
    }
}

/// Average, longest and bucketed match length.
pub fn duration_stats(durations: &[u64]) -> DurationStats {
    let mut distribution = DurationDistribution::default();
    for &secs in durations {
        match secs / 60 {
            0..=9 => distribution.very_short += 1,
            10..=19 => distribution.short += 1,
            20..=29 => distribution.medium += 1,
            30..=39 => distribution.long += 1,
            _ => distribution.very_long += 1,
        }
    }

    let average_secs = if durations.is_empty() {
        None
    } else {
        let sum: u64 = durations.iter().sum();
        Some((sum as f64 / durations.len() as f64).round() as u64)
    };

    DurationStats {
        counted: durations.len() as u32,
        average_secs,
        longest_secs: durations.iter().copied().max(),
        distribution,
    }
}
