// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cadence-engine: delivery orchestration
//!
//! The dispatcher turns a planned batch into sends, completion entries and
//! one committed state update; the ticker drives it once per local day.

mod dispatch;
mod error;
mod summary;
mod ticker;

pub use dispatch::{DeliveryReport, DispatchConfig, Dispatcher, FileReport, Stores};
pub use error::DispatchError;
pub use summary::{recipient_metrics, schedule_summary, RecipientMetrics, SubjectSummary};
pub use ticker::{DeliveryTicker, TickerState};
