// SPDX-License-Identifier: MIT

//! Batch dispatch: plan, render, fan out, commit
//!
//! The commit is deliberately last. Sends can partially fail without
//! consuming content; state only moves forward once the fan-out has been
//! attempted for every recipient.

use crate::DispatchError;
use cadence_core::completion::{current_streak, CompletionEntry, DayStatus};
use cadence_core::content::{ContentCursor, ContentLibrary};
use cadence_core::files::{FileSchedule, FileScheduleStatus};
use cadence_core::message::{render_ack_confirmation, render_daily_message};
use cadence_core::plan::{commit, plan};
use cadence_core::retry::{deliver_with_retry, RetryPolicy};
use cadence_core::rule::{ScheduleRule, Subject};
use cadence_core::stores::{
    CompletionStore, CursorStore, DayCounter, FileScheduleStore, RecipientDirectory, RuleStore,
};
use cadence_core::transport::{Payload, RecipientId, Transport};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Store handles the dispatcher works against
#[derive(Clone)]
pub struct Stores {
    pub rules: Arc<dyn RuleStore>,
    pub cursors: Arc<dyn CursorStore>,
    pub days: Arc<dyn DayCounter>,
    pub completions: Arc<dyn CompletionStore>,
    pub recipients: Arc<dyn RecipientDirectory>,
    pub files: Arc<dyn FileScheduleStore>,
}

/// Tuning knobs for dispatch
#[derive(Clone)]
pub struct DispatchConfig {
    /// Subject ordering for the daily message; unlisted subjects follow
    /// in store order
    pub priority: Vec<Subject>,
    pub library: ContentLibrary,
    pub retry: RetryPolicy,
    /// Payload size in bytes at or above which fan-out falls back to
    /// sequential sends
    pub parallel_size_limit: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            priority: Vec::new(),
            library: ContentLibrary::new(),
            retry: RetryPolicy::default(),
            parallel_size_limit: 10 * 1024 * 1024,
        }
    }
}

/// Outcome of one daily delivery cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub target_date: NaiveDate,
    /// None when nothing was due and the cycle was skipped
    pub day: Option<u32>,
    pub subjects: Vec<Subject>,
    pub delivered: Vec<RecipientId>,
    pub failed: Vec<(RecipientId, String)>,
}

impl DeliveryReport {
    fn skipped_on(target_date: NaiveDate) -> Self {
        Self {
            target_date,
            day: None,
            subjects: Vec::new(),
            delivered: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn skipped(&self) -> bool {
        self.day.is_none()
    }
}

/// Outcome of one scheduled file broadcast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub id: String,
    pub status: FileScheduleStatus,
    pub delivered: Vec<RecipientId>,
    pub failed: Vec<(RecipientId, String)>,
}

#[derive(Clone)]
pub struct Dispatcher<T: Transport> {
    transport: T,
    stores: Stores,
    config: DispatchConfig,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, stores: Stores, config: DispatchConfig) -> Self {
        Self {
            transport,
            stores,
            config,
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Run one delivery cycle for `target`.
    ///
    /// An empty plan skips everything: no sends, no watermark moves, no day
    /// increment. Otherwise the batch is rendered once, fanned out to every
    /// recipient with bounded retry, and committed exactly once afterwards.
    /// A batch with zero recipients still commits; content progression is
    /// global, not per-recipient.
    pub async fn deliver_for(&self, target: NaiveDate) -> Result<DeliveryReport, DispatchError> {
        let mut rules = self.ordered_rules()?;
        let mut cursors = self.cursor_map(&rules)?;

        let batch = plan(&rules, &cursors, target);
        if batch.is_empty() {
            info!(date = %target, "nothing due, skipping cycle");
            return Ok(DeliveryReport::skipped_on(target));
        }

        let day = self.stores.days.current_day()? + 1;
        let text = render_daily_message(day, &batch, &self.config.library);
        let payload = Payload::text_with_ack(text, day);
        let recipients = self.stores.recipients.list_recipients()?;

        info!(
            date = %target,
            day,
            subjects = batch.entries.len(),
            recipients = recipients.len(),
            "delivering batch"
        );

        let (delivered, failed) = self.fan_out(&recipients, &payload).await;
        for recipient in &delivered {
            self.stores
                .completions
                .append(recipient, &CompletionEntry::pending(day, target))?;
        }

        commit(&batch, &mut rules, &mut cursors);
        for entry in &batch.entries {
            if let Some(rule) = rules.iter().find(|r| r.subject == entry.subject) {
                self.stores.rules.save_rule(rule)?;
            }
            if let Some(cursor) = cursors.get(&entry.subject) {
                self.stores.cursors.set_cursor(cursor)?;
            }
        }
        self.stores.days.set_current_day(day)?;

        Ok(DeliveryReport {
            target_date: target,
            day: Some(day),
            subjects: batch.subjects().cloned().collect(),
            delivered,
            failed,
        })
    }

    /// Broadcast one scheduled file and record the outcome on the schedule.
    ///
    /// Any successful send counts as sent; only a broadcast that reaches
    /// nobody (with at least one recipient configured) is marked failed.
    pub async fn deliver_file(&self, schedule: &FileSchedule) -> Result<FileReport, DispatchError> {
        let recipients = self.stores.recipients.list_recipients()?;
        let size_bytes = std::fs::metadata(&schedule.path).map(|m| m.len()).unwrap_or(0);
        let payload = Payload::file(
            &schedule.path,
            schedule.caption.clone().unwrap_or_default(),
            size_bytes,
        );

        info!(id = %schedule.id, path = %schedule.path.display(), "broadcasting scheduled file");
        let (delivered, failed) = self.fan_out(&recipients, &payload).await;

        let status = if delivered.is_empty() && !recipients.is_empty() {
            let reason = failed
                .first()
                .map(|(_, e)| e.clone())
                .unwrap_or_else(|| "undelivered".to_string());
            self.stores.files.mark_failed(&schedule.id, &reason)?;
            FileScheduleStatus::Failed
        } else {
            self.stores.files.mark_sent(&schedule.id)?;
            FileScheduleStatus::Sent
        };

        Ok(FileReport {
            id: schedule.id.clone(),
            status,
            delivered,
            failed,
        })
    }

    /// Broadcast every file whose send time has passed.
    pub async fn process_due_files(
        &self,
        now: NaiveDateTime,
    ) -> Result<Vec<FileReport>, DispatchError> {
        let mut reports = Vec::new();
        for schedule in self.stores.files.due(now)? {
            reports.push(self.deliver_file(&schedule).await?);
        }
        Ok(reports)
    }

    /// Record a recipient's Done / Not Done answer for a delivered day and
    /// return the recomputed streak. The confirmation message is best
    /// effort; a send failure does not undo the recorded status.
    pub async fn acknowledge(
        &self,
        recipient: &RecipientId,
        day: u32,
        status: DayStatus,
    ) -> Result<u32, DispatchError> {
        let updated = self.stores.completions.set_status(recipient, day, status)?;
        if !updated {
            return Err(DispatchError::AckNotFound {
                recipient: recipient.clone(),
                day,
            });
        }

        let entries = self.stores.completions.entries(recipient)?;
        let streak = current_streak(&entries);
        info!(recipient = %recipient, day, %status, streak, "acknowledgement recorded");

        let confirmation = Payload::text(render_ack_confirmation(day, status, streak));
        if let Err(e) = self.transport.deliver(recipient, &confirmation).await {
            warn!(recipient = %recipient, error = %e, "confirmation send failed");
        }
        Ok(streak)
    }

    /// Rules from the store, reordered so configured subjects lead.
    fn ordered_rules(&self) -> Result<Vec<ScheduleRule>, DispatchError> {
        let mut rules = self.stores.rules.all_rules()?;
        let rank = |subject: &Subject| {
            self.config
                .priority
                .iter()
                .position(|s| s == subject)
                .unwrap_or(self.config.priority.len())
        };
        rules.sort_by_key(|r| rank(&r.subject));
        Ok(rules)
    }

    fn cursor_map(
        &self,
        rules: &[ScheduleRule],
    ) -> Result<BTreeMap<Subject, ContentCursor>, DispatchError> {
        let mut cursors = BTreeMap::new();
        for rule in rules {
            if let Some(cursor) = self.stores.cursors.cursor(&rule.subject)? {
                cursors.insert(rule.subject.clone(), cursor);
            }
        }
        Ok(cursors)
    }

    /// Send one payload to every recipient. Small payloads go out
    /// concurrently; a payload at or above the size limit is sent one
    /// recipient at a time so large uploads do not saturate the transport.
    async fn fan_out(
        &self,
        recipients: &[RecipientId],
        payload: &Payload,
    ) -> (Vec<RecipientId>, Vec<(RecipientId, String)>) {
        let mut delivered = Vec::new();
        let mut failed = Vec::new();

        if payload.size_hint() < self.config.parallel_size_limit {
            let mut tasks = JoinSet::new();
            for recipient in recipients {
                let transport = self.transport.clone();
                let recipient = recipient.clone();
                let payload = payload.clone();
                let retry = self.config.retry.clone();
                tasks.spawn(async move {
                    let result = deliver_with_retry(&transport, &recipient, &payload, &retry).await;
                    (recipient, result)
                });
            }
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((recipient, Ok(()))) => delivered.push(recipient),
                    Ok((recipient, Err(e))) => failed.push((recipient, e.to_string())),
                    Err(e) => warn!(error = %e, "fan-out task panicked"),
                }
            }
            // Task completion order is nondeterministic
            delivered.sort();
            failed.sort();
        } else {
            for recipient in recipients {
                match deliver_with_retry(&self.transport, recipient, payload, &self.config.retry)
                    .await
                {
                    Ok(()) => delivered.push(recipient.clone()),
                    Err(e) => failed.push((recipient.clone(), e.to_string())),
                }
            }
        }

        for (recipient, error) in &failed {
            warn!(recipient = %recipient, error, "delivery failed after retries");
        }
        (delivered, failed)
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
