// SPDX-License-Identifier: MIT

//! Recurrence resolution: is a rule due on a given date?
//!
//! This is the single implementation of the due/not-due predicate. The
//! planner, the schedule summary, and any other display path must call it;
//! none of them may reimplement the decision.

use crate::calendar::{weekday_index, WeekdaySet};
use crate::rule::{Frequency, ScheduleRule};
use chrono::NaiveDate;

/// Decide whether a rule is due on `target`.
///
/// A rule is due when the date is at or after the rule's start, the date's
/// weekday is selected, and the frequency class allows it. For alternate
/// frequency the rule fires on every other selected-weekday occurrence:
/// it is due when at least two selected-weekday dates have passed strictly
/// after the watermark, counting `target` itself. A rule that has never
/// fired is due on its first valid occurrence.
pub fn is_due(rule: &ScheduleRule, target: NaiveDate) -> bool {
    if target < rule.start_date {
        return false;
    }
    if !rule.weekdays.contains(weekday_index(target)) {
        return false;
    }
    match rule.frequency {
        Frequency::EverySelectedDay => true,
        Frequency::EveryOtherOccurrence => match rule.last_fired {
            None => true,
            Some(last) => occurrences_since(rule.weekdays, last, target) >= 2,
        },
    }
}

/// Count selected-weekday dates strictly after `last`, up to and including
/// `target`, stopping at 2 (the alternation threshold). Counts occurrences
/// of the weekday pattern, not raw calendar days: a Mon/Thu rule alternates
/// over Mondays-and-Thursdays even though the gaps are 3 and 4 days.
fn occurrences_since(weekdays: WeekdaySet, last: NaiveDate, target: NaiveDate) -> u32 {
    let mut count = 0;
    let mut date = last.succ_opt();
    while let Some(day) = date {
        if day > target {
            break;
        }
        if weekdays.contains(weekday_index(day)) {
            count += 1;
            if count >= 2 {
                break;
            }
        }
        date = day.succ_opt();
    }
    count
}

/// Rules due on `target`, preserving the caller's ordering
pub fn due_subjects(rules: &[ScheduleRule], target: NaiveDate) -> Vec<&ScheduleRule> {
    rules.iter().filter(|rule| is_due(rule, target)).collect()
}

#[cfg(test)]
#[path = "recurrence_tests.rs"]
mod tests;
