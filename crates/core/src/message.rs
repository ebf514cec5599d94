// SPDX-License-Identifier: MIT

//! Text rendering for outbound messages.

use crate::completion::DayStatus;
use crate::content::ContentLibrary;
use crate::plan::DeliveryBatch;

/// Daily digest: day header, one numbered line per planned subject, then
/// the completion prompt the inline buttons attach to.
pub fn render_daily_message(day: u32, batch: &DeliveryBatch, library: &ContentLibrary) -> String {
    let mut out = format!("Day {day}\n\n");
    for (position, entry) in batch.entries.iter().enumerate() {
        let link = library.item_link(&entry.subject, entry.item_index);
        out.push_str(&format!("{}. {}: {}\n", position + 1, entry.subject, link));
    }
    out.push_str("\nMark your completion:");
    out
}

/// Confirmation sent back after an acknowledgement lands.
pub fn render_ack_confirmation(day: u32, status: DayStatus, streak: u32) -> String {
    match status {
        DayStatus::Done => format!("Day {day} marked as Done. Current streak: {streak} days."),
        DayStatus::NotDone => {
            format!("Day {day} marked as Not Done. Current streak: {streak} days.")
        }
        DayStatus::Pending => format!("Day {day} is back to Pending."),
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
