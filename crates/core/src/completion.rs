// SPDX-License-Identifier: MIT

//! Completion logs, streaks, and completion rates

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Completion state of one delivered day
///
/// Wire names (`PENDING` / `DONE` / `NOT_DONE`) follow the stored log
/// format. A status transitions away from `Pending` exactly once via an
/// acknowledgement; repeated acknowledgements overwrite rather than
/// accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayStatus {
    Pending,
    Done,
    NotDone,
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayStatus::Pending => write!(f, "PENDING"),
            DayStatus::Done => write!(f, "DONE"),
            DayStatus::NotDone => write!(f, "NOT_DONE"),
        }
    }
}

impl std::str::FromStr for DayStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(DayStatus::Pending),
            "DONE" => Ok(DayStatus::Done),
            "NOT_DONE" => Ok(DayStatus::NotDone),
            _ => Err(format!("unknown day status: {}", s)),
        }
    }
}

/// One recipient's record of one delivered day
///
/// `day_number` is a sequence number, not a calendar date; the day concept
/// stays recipient-agnostic even though content is currently global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEntry {
    pub day_number: u32,
    pub date: NaiveDate,
    pub status: DayStatus,
}

impl CompletionEntry {
    /// Entry in its initial state, as appended when a batch is delivered
    pub fn pending(day_number: u32, date: NaiveDate) -> Self {
        Self {
            day_number,
            date,
            status: DayStatus::Pending,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == DayStatus::Done
    }
}

/// Consecutive `Done` entries from the most recent
///
/// `entries` must be ordered by day number descending. Counting stops at
/// the first non-Done entry, so a log starting with `Pending` or `NotDone`
/// yields 0 regardless of older history.
pub fn current_streak(entries: &[CompletionEntry]) -> u32 {
    let mut streak = 0;
    for entry in entries {
        if entry.is_done() {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

/// Percent of `Done` among the most recent `window` entries
///
/// Uses all entries when fewer than `window` exist; an empty log is 0.0.
/// Rounded to one decimal place.
pub fn completion_rate(entries: &[CompletionEntry], window: usize) -> f64 {
    let recent = &entries[..window.min(entries.len())];
    if recent.is_empty() {
        return 0.0;
    }
    let done = recent.iter().filter(|e| e.is_done()).count();
    round1(done as f64 / recent.len() as f64 * 100.0)
}

/// Completion rate over the full log
pub fn overall_rate(entries: &[CompletionEntry]) -> f64 {
    completion_rate(entries, entries.len())
}

/// Completion rate over the most recent week of delivered days
pub fn weekly_rate(entries: &[CompletionEntry]) -> f64 {
    const WEEK: usize = 7;
    completion_rate(entries, WEEK)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
#[path = "completion_tests.rs"]
mod tests;
