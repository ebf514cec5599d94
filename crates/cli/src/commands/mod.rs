// SPDX-License-Identifier: MIT

//! CLI command implementations

pub mod daemon;
pub mod preview;
