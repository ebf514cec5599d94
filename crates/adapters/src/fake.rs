// SPDX-License-Identifier: MIT

//! Recording fake transport for engine and daemon tests

use async_trait::async_trait;
use cadence_core::transport::{Payload, RecipientId, Transport, TransportError};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory transport that records every delivery.
///
/// Failures are scripted two ways: `fail_next(n)` makes the next n calls
/// fail regardless of recipient, and `reject(recipient)` makes one
/// recipient permanently undeliverable. With `set_latency` each delivery
/// holds for the given duration, which makes overlapping sends observable
/// through `max_in_flight`.
#[derive(Clone, Default)]
pub struct FakeTransport {
    sent: Arc<Mutex<Vec<(RecipientId, Payload)>>>,
    fail_next: Arc<Mutex<u32>>,
    rejected: Arc<Mutex<HashSet<RecipientId>>>,
    latency: Arc<Mutex<Duration>>,
    in_flight: Arc<Mutex<u32>>,
    max_in_flight: Arc<Mutex<u32>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, count: u32) {
        *self.lock(&self.fail_next) = count;
    }

    pub fn reject(&self, recipient: &RecipientId) {
        self.lock(&self.rejected).insert(recipient.clone());
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.lock(&self.latency) = latency;
    }

    /// Highest number of deliveries that were in flight at the same time
    pub fn max_in_flight(&self) -> u32 {
        *self.lock(&self.max_in_flight)
    }

    /// Every successful delivery, in order
    pub fn sent(&self) -> Vec<(RecipientId, Payload)> {
        self.lock(&self.sent).clone()
    }

    pub fn sent_to(&self, recipient: &RecipientId) -> Vec<Payload> {
        self.lock(&self.sent)
            .iter()
            .filter(|(r, _)| r == recipient)
            .map(|(_, p)| p.clone())
            .collect()
    }

    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
        mutex.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FakeTransport {
    fn attempt(&self, recipient: &RecipientId, payload: &Payload) -> Result<(), TransportError> {
        {
            let mut remaining = self.lock(&self.fail_next);
            if *remaining > 0 {
                *remaining -= 1;
                return Err(TransportError::Network("scripted failure".to_string()));
            }
        }
        if self.lock(&self.rejected).contains(recipient) {
            return Err(TransportError::Rejected("scripted rejection".to_string()));
        }
        self.lock(&self.sent)
            .push((recipient.clone(), payload.clone()));
        Ok(())
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn deliver(
        &self,
        recipient: &RecipientId,
        payload: &Payload,
    ) -> Result<(), TransportError> {
        {
            let mut in_flight = self.lock(&self.in_flight);
            *in_flight += 1;
            let mut max = self.lock(&self.max_in_flight);
            *max = (*max).max(*in_flight);
        }
        let latency = *self.lock(&self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let result = self.attempt(recipient, payload);
        *self.lock(&self.in_flight) -= 1;
        result
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
