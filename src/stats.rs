//! Aggregation over attendance and match rows.
//!
//! Everything in here is a pure function over already-fetched rows: no
//! queries, no mutation of inputs, and a defined default for empty input.

use serde::Serialize;

use crate::models::{Attendance, Match, MatchResult, SessionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of records marked present or late, to 2 decimals.
/// An empty collection has a rate of 0 rather than dividing by zero.
pub fn attendance_rate(records: &[Attendance]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }

    let attended = records
        .iter()
        .filter(|record| record.status.counts_as_attended())
        .count();

    round2(attended as f64 / records.len() as f64 * 100.0)
}

/// Mean of the non-null performance scores, to 2 decimals.
///
/// Returns `None` when no record carries a score: "no data yet" is a
/// different answer than a genuine average of zero, and callers serialize it
/// as JSON null.
pub fn average_performance(records: &[Attendance]) -> Option<f64> {
    let scores: Vec<i64> = records
        .iter()
        .filter_map(|record| record.performance_score)
        .collect();

    if scores.is_empty() {
        return None;
    }

    Some(round2(
        scores.iter().sum::<i64>() as f64 / scores.len() as f64,
    ))
}

/// Wins as a percentage of completed matches, to 2 decimals; 0 when nothing
/// has been completed yet.
pub fn win_rate(matches: &[Match]) -> f64 {
    let completed = matches
        .iter()
        .filter(|m| m.status == SessionStatus::Completed)
        .count();

    if completed == 0 {
        return 0.0;
    }

    let wins = matches
        .iter()
        .filter(|m| m.result == MatchResult::Win)
        .count();

    round2(wins as f64 / completed as f64 * 100.0)
}

/// Compares the first half of an ordered score sequence against the second.
///
/// The split point is `ceil(n/2)`, so the first half gets the extra element
/// for odd-length input. A shift of more than one point either way counts as
/// a trend; anything smaller, or fewer than two scores, is stable.
pub fn trend(scores: &[f64]) -> Trend {
    if scores.len() < 2 {
        return Trend::Stable;
    }

    let mid = scores.len().div_ceil(2);
    let (first, second) = scores.split_at(mid);

    let first_mean = first.iter().sum::<f64>() / first.len() as f64;
    let second_mean = second.iter().sum::<f64>() / second.len() as f64;

    let shift = second_mean - first_mean;
    if shift > 1.0 {
        Trend::Improving
    } else if shift < -1.0 {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Groups items by a key and counts members per group, preserving the
/// insertion order of each key's first occurrence.
pub fn count_by<T, K, F>(items: &[T], key_fn: F) -> Vec<(K, usize)>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut groups: Vec<(K, usize)> = Vec::new();

    for item in items {
        let key = key_fn(item);
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, count)) => *count += 1,
            None => groups.push((key, 1)),
        }
    }

    groups
}

/// Same grouping, but ordered by descending count for "top N" listings.
/// Ties keep their first-occurrence order.
pub fn count_by_sorted_desc<T, K, F>(items: &[T], key_fn: F) -> Vec<(K, usize)>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut groups = count_by(items, key_fn);
    groups.sort_by(|a, b| b.1.cmp(&a.1));
    groups
}
