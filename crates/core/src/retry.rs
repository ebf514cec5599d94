// SPDX-License-Identifier: MIT

//! Bounded retry with capped-exponential backoff for transport calls
//!
//! Every external delivery goes through this wrapper: a fixed attempt
//! count, a per-attempt timeout, and a short backoff that doubles up to a
//! cap. After the attempts are exhausted the last error is surfaced to the
//! caller; nothing is ever retried indefinitely.

use crate::transport::{Payload, RecipientId, Transport, TransportError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            attempt_timeout: Duration::from_secs(90),
        }
    }
}

/// Deliver a payload with bounded retry
pub async fn deliver_with_retry<T: Transport>(
    transport: &T,
    recipient: &RecipientId,
    payload: &Payload,
    policy: &RetryPolicy,
) -> Result<(), TransportError> {
    let attempts = policy.max_attempts.max(1);
    let mut delay = policy.base_delay;
    let mut last_error = None;

    for attempt in 1..=attempts {
        let result = tokio::time::timeout(
            policy.attempt_timeout,
            transport.deliver(recipient, payload),
        )
        .await;

        let error = match result {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => e,
            Err(_) => TransportError::Timeout(policy.attempt_timeout),
        };

        warn!(
            recipient = %recipient,
            attempt,
            attempts,
            error = %error,
            "delivery attempt failed"
        );
        last_error = Some(error);

        if attempt < attempts {
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(policy.max_delay);
        }
    }

    Err(last_error.unwrap_or_else(|| TransportError::Rejected("no attempts made".to_string())))
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
