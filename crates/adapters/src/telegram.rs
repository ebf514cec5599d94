// SPDX-License-Identifier: MIT

//! Telegram Bot API transport

use async_trait::async_trait;
use cadence_core::completion::DayStatus;
use cadence_core::transport::{AckRequest, Payload, RecipientId, Transport, TransportError};
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramTransport {
    client: reqwest::Client,
    token: String,
    api_base: String,
}

impl TelegramTransport {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Point at a different API host (local bot-api server, test stub)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn send_message(
        &self,
        recipient: &RecipientId,
        body: &str,
        ack: Option<AckRequest>,
    ) -> Result<(), TransportError> {
        let payload = message_body(recipient, body, ack);
        debug!(recipient = %recipient, "sendMessage");
        let response = self
            .client
            .post(self.url("sendMessage"))
            .timeout(CONNECT_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(request_error)?;
        check_status(response).await
    }

    async fn send_file(
        &self,
        recipient: &RecipientId,
        path: &Path,
        caption: &str,
        size_bytes: u64,
    ) -> Result<(), TransportError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        let (method, field) = if is_photo(path) {
            ("sendPhoto", "photo")
        } else {
            ("sendDocument", "document")
        };

        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", recipient.0.clone())
            .part(
                field,
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );
        if !caption.is_empty() {
            form = form.text("caption", caption.to_string());
        }

        let timeout = upload_timeout(size_bytes);
        debug!(recipient = %recipient, method, timeout_secs = timeout.as_secs(), "file upload");
        let response = self
            .client
            .post(self.url(method))
            .timeout(timeout)
            .multipart(form)
            .send()
            .await
            .map_err(request_error)?;
        check_status(response).await
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn deliver(
        &self,
        recipient: &RecipientId,
        payload: &Payload,
    ) -> Result<(), TransportError> {
        match payload {
            Payload::Text { body, ack } => self.send_message(recipient, body, *ack).await,
            Payload::File {
                path,
                caption,
                size_bytes,
            } => self.send_file(recipient, path, caption, *size_bytes).await,
        }
    }
}

fn request_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(CONNECT_TIMEOUT)
    } else {
        TransportError::Network(e.to_string())
    }
}

async fn check_status(response: reqwest::Response) -> Result<(), TransportError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Rejected(format!("{}: {}", status, body)))
    }
}

/// sendMessage JSON body, with Done / Not Done buttons when an ack is requested
fn message_body(recipient: &RecipientId, body: &str, ack: Option<AckRequest>) -> serde_json::Value {
    let mut payload = json!({
        "chat_id": recipient.0,
        "text": body,
    });
    if let Some(ack) = ack {
        payload["reply_markup"] = json!({
            "inline_keyboard": [[
                { "text": "Done", "callback_data": callback_data(ack.day, DayStatus::Done) },
                { "text": "Not Done", "callback_data": callback_data(ack.day, DayStatus::NotDone) },
            ]]
        });
    }
    payload
}

fn callback_data(day: u32, status: DayStatus) -> String {
    json!({ "action": "complete", "day": day, "status": status }).to_string()
}

/// Parse the callback payload a button press sends back
pub fn parse_callback(data: &str) -> Option<(u32, DayStatus)> {
    let value: serde_json::Value = serde_json::from_str(data).ok()?;
    if value.get("action")?.as_str()? != "complete" {
        return None;
    }
    let day = u32::try_from(value.get("day")?.as_u64()?).ok()?;
    let status = value.get("status")?.as_str()?.parse().ok()?;
    Some((day, status))
}

/// Upload timeout scaled by size: 30s base plus 10s per MiB, never under 60s
pub fn upload_timeout(size_bytes: u64) -> Duration {
    let secs = 30 + size_bytes * 10 / (1024 * 1024);
    Duration::from_secs(secs.max(60))
}

fn is_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            e == "jpg" || e == "jpeg" || e == "png"
        })
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "telegram_tests.rs"]
mod tests;
