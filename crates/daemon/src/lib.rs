// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cadence-daemon library: configuration, wire protocol, lifecycle and
//! request handling for the `cadenced` background process. The CLI links
//! this crate for the protocol types and the client side of the socket.

pub mod config;
pub mod lifecycle;
pub mod protocol;
pub mod server;

pub use config::{Config, ConfigError};
pub use lifecycle::{Daemon, LifecycleError};
pub use protocol::{Request, Response, StatusInfo, DEFAULT_TIMEOUT, PROTOCOL_VERSION};
