// SPDX-License-Identifier: MIT

//! Calendar conventions: weekday numbering and the delivery timezone
//!
//! Rules select weekdays under a Sunday=0..Saturday=6 convention. This is
//! the single boundary where a calendar date is translated into that
//! representation; no other module consults chrono's native week numbering.

use chrono::{Datelike, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Weekday display names, indexed Sunday=0
pub const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("invalid weekday index {0} (expected 0..=6, Sunday=0)")]
    InvalidWeekday(u8),
    #[error("invalid utc offset: {0}")]
    InvalidOffset(String),
}

/// Weekday index for a date under the Sunday=0 convention
pub fn weekday_index(date: NaiveDate) -> u8 {
    // num_days_from_sunday is 0..=6, always in range for u8
    date.weekday().num_days_from_sunday() as u8
}

/// A set of weekday indices (Sunday=0..Saturday=6)
///
/// Serialized as a sorted list of indices; out-of-range values are rejected
/// at deserialization so stored rules never carry an invalid day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    /// Every day of the week; a daily rule degenerates to this set
    pub const ALL: WeekdaySet = WeekdaySet(0b0111_1111);

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn from_days(days: &[u8]) -> Result<Self, CalendarError> {
        let mut set = Self::empty();
        for &day in days {
            set.insert(day)?;
        }
        Ok(set)
    }

    pub fn insert(&mut self, day: u8) -> Result<(), CalendarError> {
        if day > 6 {
            return Err(CalendarError::InvalidWeekday(day));
        }
        self.0 |= 1 << day;
        Ok(())
    }

    pub fn contains(&self, day: u8) -> bool {
        day <= 6 && self.0 & (1 << day) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Selected weekday indices in ascending order
    pub fn days(&self) -> impl Iterator<Item = u8> + '_ {
        (0u8..=6).filter(|d| self.contains(*d))
    }
}

impl TryFrom<Vec<u8>> for WeekdaySet {
    type Error = CalendarError;

    fn try_from(days: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_days(&days)
    }
}

impl From<WeekdaySet> for Vec<u8> {
    fn from(set: WeekdaySet) -> Self {
        set.days().collect()
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.days().map(|d| DAY_NAMES[d as usize]).collect();
        write!(f, "{}", names.join(", "))
    }
}

/// Parse a `+HH:MM` / `-HH:MM` offset into a fixed timezone
///
/// The product fixes delivery-time comparison to one configured offset
/// (Indian Standard Time, `+05:30`, by default) regardless of host timezone.
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset, CalendarError> {
    let invalid = || CalendarError::InvalidOffset(s.to_string());

    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    let seconds = sign * (hours * 3600 + minutes * 60);
    FixedOffset::east_opt(seconds).ok_or_else(invalid)
}

#[cfg(test)]
#[path = "calendar_tests.rs"]
mod tests;
