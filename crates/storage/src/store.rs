// SPDX-License-Identifier: MIT

//! JSON file-based storage
//!
//! One directory per kind, one pretty-printed JSON file per id. Every core
//! store trait is implemented on the same handle so the daemon opens a single
//! state directory.

use cadence_core::completion::{CompletionEntry, DayStatus};
use cadence_core::content::ContentCursor;
use cadence_core::files::{FileSchedule, FileScheduleStatus};
use cadence_core::rule::{ScheduleRule, Subject};
use cadence_core::stores::{
    CompletionStore, CursorStore, DayCounter, FileScheduleStore, RecipientDirectory, RuleStore,
    StoreError,
};
use cadence_core::transport::RecipientId;
use chrono::NaiveDateTime;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::PathBuf;

const KIND_RULES: &str = "rules";
const KIND_CURSORS: &str = "cursors";
const KIND_COMPLETIONS: &str = "completions";
const KIND_RECIPIENTS: &str = "recipients";
const KIND_FILES: &str = "files";
const KIND_STATE: &str = "state";

#[derive(Clone)]
pub struct JsonStore {
    base_path: PathBuf,
}

impl JsonStore {
    /// Open a store at the given path
    pub fn open(base_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    /// Open a temporary store for testing
    pub fn open_temp() -> Result<Self, StoreError> {
        let temp_dir = std::env::temp_dir().join(format!("cadence-test-{}", uuid::Uuid::new_v4()));
        Self::open(temp_dir)
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    fn save<T: Serialize>(&self, kind: &str, id: &str, data: &T) -> Result<(), StoreError> {
        let path = self.path_for(kind, id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(data)?;
        fs::write(&path, json)?;
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, kind: &str, id: &str) -> Result<T, StoreError> {
        let path = self.path_for(kind, id);
        if !path.exists() {
            return Err(StoreError::NotFound {
                kind: kind.to_string(),
                id: id.to_string(),
            });
        }
        let json = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn load_or<T: DeserializeOwned>(&self, kind: &str, id: &str, fallback: T) -> Result<T, StoreError> {
        match self.load(kind, id) {
            Ok(value) => Ok(value),
            Err(StoreError::NotFound { .. }) => Ok(fallback),
            Err(e) => Err(e),
        }
    }

    fn list(&self, kind: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.base_path.join(kind);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(stem) = path.file_stem() {
                    ids.push(stem.to_string_lossy().to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn path_for(&self, kind: &str, id: &str) -> PathBuf {
        self.base_path.join(kind).join(format!("{}.json", id))
    }
}

impl RuleStore for JsonStore {
    fn rule(&self, subject: &Subject) -> Result<ScheduleRule, StoreError> {
        self.load(KIND_RULES, &subject.0)
    }

    fn all_rules(&self) -> Result<Vec<ScheduleRule>, StoreError> {
        let mut rules = Vec::new();
        for id in self.list(KIND_RULES)? {
            rules.push(self.load(KIND_RULES, &id)?);
        }
        Ok(rules)
    }

    fn save_rule(&self, rule: &ScheduleRule) -> Result<(), StoreError> {
        self.save(KIND_RULES, &rule.subject.0, rule)
    }
}

impl CursorStore for JsonStore {
    fn cursor(&self, subject: &Subject) -> Result<Option<ContentCursor>, StoreError> {
        match self.load(KIND_CURSORS, &subject.0) {
            Ok(cursor) => Ok(Some(cursor)),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set_cursor(&self, cursor: &ContentCursor) -> Result<(), StoreError> {
        self.save(KIND_CURSORS, &cursor.subject.0, cursor)
    }
}

impl DayCounter for JsonStore {
    fn current_day(&self) -> Result<u32, StoreError> {
        self.load_or(KIND_STATE, "day", 0)
    }

    fn set_current_day(&self, day: u32) -> Result<(), StoreError> {
        self.save(KIND_STATE, "day", &day)
    }
}

impl CompletionStore for JsonStore {
    fn append(&self, recipient: &RecipientId, entry: &CompletionEntry) -> Result<(), StoreError> {
        let mut entries: Vec<CompletionEntry> =
            self.load_or(KIND_COMPLETIONS, &recipient.0, Vec::new())?;
        entries.insert(0, entry.clone());
        entries.sort_by(|a, b| b.day_number.cmp(&a.day_number));
        self.save(KIND_COMPLETIONS, &recipient.0, &entries)
    }

    fn set_status(
        &self,
        recipient: &RecipientId,
        day_number: u32,
        status: DayStatus,
    ) -> Result<bool, StoreError> {
        let mut entries: Vec<CompletionEntry> =
            self.load_or(KIND_COMPLETIONS, &recipient.0, Vec::new())?;
        let Some(entry) = entries.iter_mut().find(|e| e.day_number == day_number) else {
            return Ok(false);
        };
        entry.status = status;
        self.save(KIND_COMPLETIONS, &recipient.0, &entries)?;
        Ok(true)
    }

    fn entries(&self, recipient: &RecipientId) -> Result<Vec<CompletionEntry>, StoreError> {
        let mut entries: Vec<CompletionEntry> =
            self.load_or(KIND_COMPLETIONS, &recipient.0, Vec::new())?;
        entries.sort_by(|a, b| b.day_number.cmp(&a.day_number));
        Ok(entries)
    }
}

impl RecipientDirectory for JsonStore {
    fn list_recipients(&self) -> Result<Vec<RecipientId>, StoreError> {
        Ok(self
            .list(KIND_RECIPIENTS)?
            .into_iter()
            .map(RecipientId)
            .collect())
    }

    fn add_recipient(&self, recipient: &RecipientId) -> Result<(), StoreError> {
        self.save(KIND_RECIPIENTS, &recipient.0, recipient)
    }
}

impl FileScheduleStore for JsonStore {
    fn add(&self, schedule: &FileSchedule) -> Result<(), StoreError> {
        self.save(KIND_FILES, &schedule.id, schedule)
    }

    fn due(&self, now: NaiveDateTime) -> Result<Vec<FileSchedule>, StoreError> {
        let mut due = Vec::new();
        for id in self.list(KIND_FILES)? {
            let schedule: FileSchedule = self.load(KIND_FILES, &id)?;
            if schedule.is_due(now) {
                due.push(schedule);
            }
        }
        due.sort_by_key(|s| s.send_at);
        Ok(due)
    }

    fn mark_sent(&self, id: &str) -> Result<(), StoreError> {
        let mut schedule: FileSchedule = self.load(KIND_FILES, id)?;
        schedule.status = FileScheduleStatus::Sent;
        schedule.error = None;
        self.save(KIND_FILES, id, &schedule)
    }

    fn mark_failed(&self, id: &str, error: &str) -> Result<(), StoreError> {
        let mut schedule: FileSchedule = self.load(KIND_FILES, id)?;
        schedule.status = FileScheduleStatus::Failed;
        schedule.error = Some(error.to_string());
        self.save(KIND_FILES, id, &schedule)
    }

    fn all(&self) -> Result<Vec<FileSchedule>, StoreError> {
        let mut schedules: Vec<FileSchedule> = Vec::new();
        for id in self.list(KIND_FILES)? {
            schedules.push(self.load(KIND_FILES, &id)?);
        }
        schedules.sort_by_key(|s| s.send_at);
        Ok(schedules)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
