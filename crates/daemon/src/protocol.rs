// SPDX-License-Identifier: MIT

//! IPC protocol: length-prefixed JSON over a Unix socket
//!
//! Wire format: 4-byte big-endian length, then that many bytes of JSON.
//! One request and one response per connection.

use cadence_core::completion::DayStatus;
use cadence_core::files::FileSchedule;
use cadence_core::rule::Frequency;
use cadence_engine::{DeliveryReport, RecipientMetrics, SubjectSummary};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const PROTOCOL_VERSION: &str = "1";

/// Read/write timeout for a single protocol message
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on a single message; anything larger is a protocol error
const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    Ping,
    Hello { version: String },
    Status,
    /// Run the delivery cycle now; defaults to today in the delivery zone
    Trigger { date: Option<NaiveDate> },
    Ack {
        recipient: String,
        day: u32,
        status: DayStatus,
    },
    /// Schedule overview; defaults to today in the delivery zone
    Summary { date: Option<NaiveDate> },
    Metrics { recipient: String },
    /// Create or replace a subject's schedule rule (validated at write time)
    SetRule {
        subject: String,
        start_date: NaiveDate,
        frequency: Frequency,
        /// Sunday=0 .. Saturday=6
        weekdays: Vec<u8>,
    },
    ScheduleFile {
        path: PathBuf,
        caption: Option<String>,
        send_at: NaiveDateTime,
    },
    ListFiles,
    AddRecipient { recipient: String },
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusInfo {
    pub uptime_secs: u64,
    pub day: u32,
    pub recipients: usize,
    pub rules: usize,
    pub pending_files: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Response {
    Pong,
    Hello { version: String },
    Status(StatusInfo),
    Delivery(DeliveryReport),
    Acked { streak: u32 },
    /// Trigger refused: today's batch already went out
    AlreadySent { date: NaiveDate },
    Summary {
        day: u32,
        subjects: Vec<SubjectSummary>,
    },
    Metrics(RecipientMetrics),
    FileScheduled { id: String },
    Files { files: Vec<FileSchedule> },
    Ok,
    ShuttingDown,
    Error { message: String },
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message too large: {0} bytes")]
    MessageTooLarge(usize),
    #[error("connection closed")]
    ConnectionClosed,
    #[error("timed out")]
    Timeout,
}

/// Serialize a message to raw JSON (no length prefix)
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(message)?)
}

/// Deserialize a message from raw JSON
pub fn decode<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(data)?)
}

/// Write a length-prefixed message
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(data.len()));
    }
    let len = data.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read a length-prefixed message
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed)
        }
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_bytes) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(len));
    }

    let mut data = vec![0u8; len];
    reader.read_exact(&mut data).await?;
    Ok(data)
}

/// Read a request with a timeout
pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    let data = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&data)
}

/// Write a response with a timeout
pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let data = encode(response)?;
    tokio::time::timeout(timeout, write_message(writer, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
