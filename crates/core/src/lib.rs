// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cadence-core: Core library for the Cadence delivery scheduler
//!
//! This crate provides:
//! - Calendar conventions (Sunday=0 weekdays, fixed delivery timezone)
//! - Schedule rules and the single recurrence resolver
//! - Pure delivery planning with a separate commit step
//! - Streak and completion-rate math
//! - Store and transport trait seams for external collaborators

pub mod calendar;
pub mod clock;
pub mod completion;
pub mod content;
pub mod files;
pub mod message;
pub mod plan;
pub mod recurrence;
pub mod retry;
pub mod rule;
pub mod stores;
pub mod transport;

// Re-exports
pub use calendar::{parse_utc_offset, weekday_index, CalendarError, WeekdaySet};
pub use clock::{Clock, FakeClock, SystemClock};
pub use completion::{
    completion_rate, current_streak, overall_rate, weekly_rate, CompletionEntry, DayStatus,
};
pub use content::{ContentCursor, ContentLibrary};
pub use files::{FileSchedule, FileScheduleStatus};
pub use plan::{commit, plan, BatchEntry, DeliveryBatch};
pub use recurrence::{due_subjects, is_due};
pub use retry::{deliver_with_retry, RetryPolicy};
pub use rule::{Frequency, RuleError, ScheduleRule, Subject};
pub use stores::{
    CompletionStore, CursorStore, DayCounter, FileScheduleStore, RecipientDirectory, RuleStore,
    StoreError,
};
pub use transport::{AckRequest, Payload, RecipientId, Transport, TransportError};
