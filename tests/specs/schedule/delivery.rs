//! Schedule and trigger flow specs
//!
//! Runs with zero recipients so no Telegram traffic is attempted; the
//! daily cycle still resolves rules, advances content, and gates repeats.

use crate::prelude::*;

const EVERY_DAY: &str = "sun,mon,tue,wed,thu,fri,sat";

#[test]
fn schedule_set_then_summary_lists_the_rule() {
    let setup = Setup::new();

    setup
        .cadence()
        .args(&[
            "schedule", "set", "polity", "--start", "2026-01-01", "--days", "mon,thu",
            "--frequency", "alternate",
        ])
        .passes()
        .stdout_has("Rule saved for polity");

    setup
        .cadence()
        .args(&["summary"])
        .passes()
        .stdout_has("polity")
        .stdout_has("alternate")
        .stdout_has("Mon, Thu");

    setup.stop_daemon();
}

#[test]
fn schedule_set_rejects_an_unknown_weekday() {
    let setup = Setup::new();

    setup
        .cadence()
        .args(&[
            "schedule", "set", "polity", "--start", "2026-01-01", "--days", "someday",
        ])
        .fails()
        .stderr_has("unknown weekday");

    setup.stop_daemon();
}

#[test]
fn trigger_advances_the_day_and_gates_repeats() {
    let setup = Setup::new();

    setup
        .cadence()
        .args(&[
            "schedule", "set", "polity", "--start", "2026-01-01", "--days", EVERY_DAY,
        ])
        .passes();

    setup
        .cadence()
        .args(&["trigger"])
        .passes()
        .stdout_has("Day 1 (polity) delivered to 0 recipient(s)");

    setup
        .cadence()
        .args(&["trigger"])
        .passes()
        .stdout_has("Already sent today");

    setup
        .cadence()
        .args(&["status"])
        .passes()
        .stdout_has("Day: 1");

    setup.stop_daemon();
}

#[test]
fn trigger_with_nothing_due_reports_skip() {
    let setup = Setup::new();

    setup
        .cadence()
        .args(&["trigger"])
        .passes()
        .stdout_has("Nothing due on");

    setup.stop_daemon();
}

#[test]
fn recipient_add_shows_in_status() {
    let setup = Setup::new();

    setup
        .cadence()
        .args(&["recipient", "add", "12345"])
        .passes()
        .stdout_has("Added recipient 12345");

    setup
        .cadence()
        .args(&["status"])
        .passes()
        .stdout_has("Recipients: 1");

    setup.stop_daemon();
}

#[test]
fn scheduled_files_are_listed() {
    let setup = Setup::new();

    setup
        .cadence()
        .args(&[
            "file", "schedule", "/tmp/notes.pdf", "--at", "2030-01-01 09:00", "--caption",
            "Week 3",
        ])
        .passes()
        .stdout_has("Scheduled: ");

    setup
        .cadence()
        .args(&["file", "list"])
        .passes()
        .stdout_has("/tmp/notes.pdf")
        .stdout_has("pending");

    setup.stop_daemon();
}
