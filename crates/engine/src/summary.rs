// SPDX-License-Identifier: MIT

//! Read-only views: schedule overview and per-recipient progress

use cadence_core::completion::{current_streak, overall_rate, weekly_rate, CompletionEntry};
use cadence_core::recurrence::is_due;
use cadence_core::rule::{Frequency, ScheduleRule, Subject};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectSummary {
    pub subject: Subject,
    pub frequency: Frequency,
    pub weekdays: String,
    pub last_fired: Option<NaiveDate>,
    pub due_today: bool,
}

/// One row per rule, in the given order
pub fn schedule_summary(rules: &[ScheduleRule], target: NaiveDate) -> Vec<SubjectSummary> {
    rules
        .iter()
        .map(|rule| SubjectSummary {
            subject: rule.subject.clone(),
            frequency: rule.frequency,
            weekdays: rule.weekdays.to_string(),
            last_fired: rule.last_fired,
            due_today: is_due(rule, target),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientMetrics {
    /// Highest delivered day number
    pub day: u32,
    pub streak: u32,
    pub done: u32,
    pub total: u32,
    pub overall_rate: f64,
    pub weekly_rate: f64,
}

/// Progress figures from a newest-first completion log
pub fn recipient_metrics(entries: &[CompletionEntry]) -> RecipientMetrics {
    let done = entries.iter().filter(|e| e.is_done()).count() as u32;
    RecipientMetrics {
        day: entries.first().map(|e| e.day_number).unwrap_or(0),
        streak: current_streak(entries),
        done,
        total: entries.len() as u32,
        overall_rate: overall_rate(entries),
        weekly_rate: weekly_rate(entries),
    }
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod tests;
