//! Behavioral specifications for the cadence CLI.
//!
//! These tests are black-box: they invoke the CLI binary and verify
//! stdout, stderr, and exit codes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// cli/
#[path = "specs/cli/errors.rs"]
mod cli_errors;
#[path = "specs/cli/help.rs"]
mod cli_help;

// schedule/
#[path = "specs/schedule/delivery.rs"]
mod schedule_delivery;
#[path = "specs/schedule/preview.rs"]
mod schedule_preview;

// daemon/
#[path = "specs/daemon/lifecycle.rs"]
mod daemon_lifecycle;
