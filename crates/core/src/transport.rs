// SPDX-License-Identifier: MIT

//! Transport seam: push a payload to a recipient address
//!
//! The transport is fire-and-forget per recipient; retry and timeout policy
//! live with the caller (see [`crate::retry`]), not inside implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Recipient address (a Telegram chat id in the real deployment)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecipientId(pub String);

impl RecipientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecipientId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Ask the transport to attach Done / Not-Done acknowledgement controls
/// for the given day number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckRequest {
    pub day: u32,
}

/// What gets delivered to a recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// Short text message, optionally with acknowledgement controls
    Text {
        body: String,
        ack: Option<AckRequest>,
    },
    /// Binary file; size is captured at construction so fan-out strategy
    /// can be chosen without touching the filesystem again
    File {
        path: PathBuf,
        caption: String,
        size_bytes: u64,
    },
}

impl Payload {
    pub fn text(body: impl Into<String>) -> Self {
        Payload::Text {
            body: body.into(),
            ack: None,
        }
    }

    pub fn text_with_ack(body: impl Into<String>, day: u32) -> Self {
        Payload::Text {
            body: body.into(),
            ack: Some(AckRequest { day }),
        }
    }

    pub fn file(path: impl Into<PathBuf>, caption: impl Into<String>, size_bytes: u64) -> Self {
        Payload::File {
            path: path.into(),
            caption: caption.into(),
            size_bytes,
        }
    }

    /// Outbound size used by the fan-out threshold
    pub fn size_hint(&self) -> u64 {
        match self {
            Payload::Text { body, .. } => body.len() as u64,
            Payload::File { size_bytes, .. } => *size_bytes,
        }
    }
}

/// Errors from delivery attempts; all of these are expected and recoverable
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("send rejected: {0}")]
    Rejected(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Adapter for the outbound message transport
#[async_trait]
pub trait Transport: Clone + Send + Sync + 'static {
    /// Push one payload to one recipient
    async fn deliver(&self, recipient: &RecipientId, payload: &Payload)
        -> Result<(), TransportError>;
}
