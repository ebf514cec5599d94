// SPDX-License-Identifier: MIT

//! Error types for the delivery engine

use cadence_core::stores::StoreError;
use cadence_core::transport::RecipientId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("no delivered day {day} for recipient {recipient}")]
    AckNotFound { recipient: RecipientId, day: u32 },
}
