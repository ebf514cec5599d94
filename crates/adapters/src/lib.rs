// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cadence-adapters: transport implementations for the core `Transport` seam
//!
//! `TelegramTransport` talks to the Telegram Bot API. `FakeTransport`
//! (behind the `test-support` feature) records calls for engine tests.

pub mod telegram;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use telegram::TelegramTransport;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTransport;
