// SPDX-License-Identifier: MIT

//! Trait seams for persistent state.
//!
//! The engine only sees these traits; `cadence-storage` provides the JSON
//! file-backed implementation and tests can substitute in-memory fakes.

use crate::completion::{CompletionEntry, DayStatus};
use crate::content::ContentCursor;
use crate::files::FileSchedule;
use crate::rule::{ScheduleRule, Subject};
use crate::transport::RecipientId;
use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not found: {kind}/{id}")]
    NotFound { kind: String, id: String },
}

/// Schedule rules, keyed by subject.
pub trait RuleStore: Send + Sync {
    fn rule(&self, subject: &Subject) -> Result<ScheduleRule, StoreError>;
    fn all_rules(&self) -> Result<Vec<ScheduleRule>, StoreError>;
    fn save_rule(&self, rule: &ScheduleRule) -> Result<(), StoreError>;
}

/// Per-subject content position.
pub trait CursorStore: Send + Sync {
    /// Cursor for a subject, or `None` before the first delivery.
    fn cursor(&self, subject: &Subject) -> Result<Option<ContentCursor>, StoreError>;
    fn set_cursor(&self, cursor: &ContentCursor) -> Result<(), StoreError>;
}

/// Global day counter, shared by every recipient.
pub trait DayCounter: Send + Sync {
    /// Number of delivery days completed so far; day N+1 is the next to send.
    fn current_day(&self) -> Result<u32, StoreError>;
    fn set_current_day(&self, day: u32) -> Result<(), StoreError>;
}

/// Per-recipient completion log.
pub trait CompletionStore: Send + Sync {
    fn append(&self, recipient: &RecipientId, entry: &CompletionEntry) -> Result<(), StoreError>;
    /// Update the status of an existing day entry. Returns false when the
    /// recipient has no entry for that day.
    fn set_status(
        &self,
        recipient: &RecipientId,
        day_number: u32,
        status: DayStatus,
    ) -> Result<bool, StoreError>;
    /// Entries newest-first.
    fn entries(&self, recipient: &RecipientId) -> Result<Vec<CompletionEntry>, StoreError>;
}

/// The set of recipients every batch fans out to.
pub trait RecipientDirectory: Send + Sync {
    fn list_recipients(&self) -> Result<Vec<RecipientId>, StoreError>;
    /// Idempotent: adding a known recipient is a no-op.
    fn add_recipient(&self, recipient: &RecipientId) -> Result<(), StoreError>;
}

/// Queue of one-shot file broadcasts.
pub trait FileScheduleStore: Send + Sync {
    fn add(&self, schedule: &FileSchedule) -> Result<(), StoreError>;
    /// Pending schedules whose send time has passed.
    fn due(&self, now: NaiveDateTime) -> Result<Vec<FileSchedule>, StoreError>;
    fn mark_sent(&self, id: &str) -> Result<(), StoreError>;
    fn mark_failed(&self, id: &str, error: &str) -> Result<(), StoreError>;
    fn all(&self) -> Result<Vec<FileSchedule>, StoreError>;
}
