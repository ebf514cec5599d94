// SPDX-License-Identifier: MIT

//! Per-subject recurrence rules
//!
//! A rule names a subject, the date its schedule begins, the weekdays it
//! fires on, and a frequency class. Rules are validated when written so the
//! resolver never observes an invalid one.

use crate::calendar::{weekday_index, WeekdaySet};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier for a deliverable subject
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Subject(pub String);

impl Subject {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Subject {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Subject {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How often a rule fires on its selected weekdays
///
/// Wire names (`daily` / `alternate`) follow the stored schedule format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    /// Fires on every selected weekday
    #[serde(rename = "daily")]
    EverySelectedDay,
    /// Fires on every other selected-weekday occurrence
    #[serde(rename = "alternate")]
    EveryOtherOccurrence,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::EverySelectedDay => write!(f, "daily"),
            Frequency::EveryOtherOccurrence => write!(f, "alternate"),
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::EverySelectedDay),
            "alternate" => Ok(Frequency::EveryOtherOccurrence),
            _ => Err(format!("unknown frequency: {}", s)),
        }
    }
}

/// Errors detected when a rule is written or edited
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("rule for {0} has an empty weekday set")]
    EmptyWeekdays(Subject),
    #[error("rule for {subject}: watermark {watermark} precedes start date {start}")]
    WatermarkBeforeStart {
        subject: Subject,
        watermark: NaiveDate,
        start: NaiveDate,
    },
    #[error("rule for {subject}: watermark {watermark} falls on an unselected weekday")]
    WatermarkOffPattern {
        subject: Subject,
        watermark: NaiveDate,
    },
}

/// One recurrence rule per subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRule {
    pub subject: Subject,
    pub start_date: NaiveDate,
    pub frequency: Frequency,
    pub weekdays: WeekdaySet,
    /// The watermark: most recent date this rule fired. Mutated only by
    /// the planner's commit step.
    pub last_fired: Option<NaiveDate>,
}

impl ScheduleRule {
    /// Create a validated rule with no watermark
    pub fn new(
        subject: impl Into<Subject>,
        start_date: NaiveDate,
        frequency: Frequency,
        weekdays: WeekdaySet,
    ) -> Result<Self, RuleError> {
        let rule = Self {
            subject: subject.into(),
            start_date,
            frequency,
            weekdays,
            last_fired: None,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Check the rule invariants
    ///
    /// The weekday set must be non-empty, and the watermark (if set) must be
    /// at or after the start date on a selected weekday.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.weekdays.is_empty() {
            return Err(RuleError::EmptyWeekdays(self.subject.clone()));
        }
        if let Some(watermark) = self.last_fired {
            if watermark < self.start_date {
                return Err(RuleError::WatermarkBeforeStart {
                    subject: self.subject.clone(),
                    watermark,
                    start: self.start_date,
                });
            }
            if !self.weekdays.contains(weekday_index(watermark)) {
                return Err(RuleError::WatermarkOffPattern {
                    subject: self.subject.clone(),
                    watermark,
                });
            }
        }
        Ok(())
    }

    pub fn with_last_fired(mut self, date: NaiveDate) -> Self {
        self.last_fired = Some(date);
        self
    }
}

#[cfg(test)]
#[path = "rule_tests.rs"]
mod tests;
