// SPDX-License-Identifier: MIT

//! One-shot file broadcasts scheduled for a future wall-clock time.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileScheduleStatus {
    Pending,
    Sent,
    Failed,
}

impl fmt::Display for FileScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileScheduleStatus::Pending => write!(f, "pending"),
            FileScheduleStatus::Sent => write!(f, "sent"),
            FileScheduleStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A file queued for broadcast to every recipient at `send_at` (delivery-zone local time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSchedule {
    pub id: String,
    pub path: PathBuf,
    pub caption: Option<String>,
    pub send_at: NaiveDateTime,
    pub status: FileScheduleStatus,
    /// Last failure message, kept for `status` inspection
    pub error: Option<String>,
}

impl FileSchedule {
    pub fn new(
        id: impl Into<String>,
        path: impl Into<PathBuf>,
        caption: Option<String>,
        send_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            caption,
            send_at,
            status: FileScheduleStatus::Pending,
            error: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == FileScheduleStatus::Pending
    }

    /// Due when pending and the scheduled moment has passed.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.is_pending() && self.send_at <= now
    }
}

#[cfg(test)]
#[path = "files_tests.rs"]
mod tests;
