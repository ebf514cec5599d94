// SPDX-License-Identifier: MIT

//! Delivery planning: resolve due rules into an ordered batch
//!
//! Planning is pure and side-effect-free; the commit step applies cursor
//! advances and watermark updates. Callers commit only after the batch
//! delivery has been attempted, so an upstream failure does not silently
//! consume content.

use crate::content::ContentCursor;
use crate::recurrence::is_due;
use crate::rule::{ScheduleRule, Subject};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One due subject and the 0-based index of the item to deliver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub subject: Subject,
    pub item_index: u32,
}

/// The set of (subject, item) pairs resolved for one delivery cycle
///
/// Produced fresh each cycle and never persisted; only its committed
/// effects (watermarks, cursors) survive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryBatch {
    pub target_date: NaiveDate,
    pub entries: Vec<BatchEntry>,
}

impl DeliveryBatch {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.entries.iter().map(|entry| &entry.subject)
    }
}

/// Assemble the batch for `target` from rules in caller-priority order
///
/// A subject with no cursor yet starts at item 0. Zero due rules yield an
/// empty batch, which is a normal outcome; callers skip delivery entirely.
pub fn plan(
    rules: &[ScheduleRule],
    cursors: &BTreeMap<Subject, ContentCursor>,
    target: NaiveDate,
) -> DeliveryBatch {
    let mut entries = Vec::new();
    for rule in rules {
        if !is_due(rule, target) {
            continue;
        }
        let item_index = cursors
            .get(&rule.subject)
            .map(ContentCursor::next_index)
            .unwrap_or(0);
        entries.push(BatchEntry {
            subject: rule.subject.clone(),
            item_index,
        });
    }
    DeliveryBatch {
        target_date: target,
        entries,
    }
}

/// Apply a delivered batch: set each included rule's watermark to the
/// batch date and advance each cursor by exactly one.
pub fn commit(
    batch: &DeliveryBatch,
    rules: &mut [ScheduleRule],
    cursors: &mut BTreeMap<Subject, ContentCursor>,
) {
    for entry in &batch.entries {
        if let Some(rule) = rules.iter_mut().find(|r| r.subject == entry.subject) {
            rule.last_fired = Some(batch.target_date);
        }
        cursors
            .entry(entry.subject.clone())
            .or_insert_with(|| ContentCursor::new(entry.subject.clone()))
            .advance();
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
