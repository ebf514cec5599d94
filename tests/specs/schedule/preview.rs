//! Offline preview specs
//!
//! `preview` reads the state directory directly; the daemon is stopped
//! before previewing to prove nothing goes over the socket.

use crate::prelude::*;

const EVERY_DAY: &str = "sun,mon,tue,wed,thu,fri,sat";

#[test]
fn preview_with_no_rules_reports_nothing_due() {
    let setup = Setup::new();

    setup
        .cadence()
        .args(&["preview"])
        .passes()
        .stdout_has("Nothing due on");
}

#[test]
fn preview_renders_the_next_daily_message() {
    let setup = Setup::new();

    setup
        .cadence()
        .args(&[
            "schedule", "set", "polity", "--start", "2026-01-01", "--days", EVERY_DAY,
        ])
        .passes();
    setup.stop_daemon();

    setup
        .cadence()
        .args(&["preview"])
        .passes()
        .stdout_has("Day 1")
        .stdout_has("1. polity:")
        .stdout_has("Mark your completion:");
}

#[test]
fn preview_does_not_advance_state() {
    let setup = Setup::new();

    setup
        .cadence()
        .args(&[
            "schedule", "set", "polity", "--start", "2026-01-01", "--days", EVERY_DAY,
        ])
        .passes();
    setup.stop_daemon();

    setup.cadence().args(&["preview"]).passes();

    // Still day 1 on the second look
    setup
        .cadence()
        .args(&["preview"])
        .passes()
        .stdout_has("Day 1");
}
