// SPDX-License-Identifier: MIT

//! Minute ticker that fires the daily delivery at the configured local time
//!
//! The fired-today gate is a date, not a boolean, so a daemon restarted
//! mid-evening does not resend and a process alive at midnight needs no
//! reset step.

use crate::dispatch::Dispatcher;
use cadence_core::clock::Clock;
use cadence_core::transport::Transport;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

const TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Pure gate state for the delivery tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickerState {
    sent_on: Option<NaiveDate>,
}

impl TickerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume with a known last-sent date, as after a daemon restart
    pub fn resumed(sent_on: NaiveDate) -> Self {
        Self {
            sent_on: Some(sent_on),
        }
    }

    /// True once the local clock reaches the delivery time on a day that
    /// has not been sent yet
    pub fn should_deliver(&self, now_local: NaiveDateTime, delivery_time: NaiveTime) -> bool {
        now_local.time() >= delivery_time && self.sent_on != Some(now_local.date())
    }

    pub fn already_sent(&self, date: NaiveDate) -> bool {
        self.sent_on == Some(date)
    }

    pub fn mark_sent(&mut self, date: NaiveDate) {
        self.sent_on = Some(date);
    }
}

/// Drives the dispatcher from wall-clock time
///
/// The gate is shared: a manual trigger closes it for the day the same way
/// a ticked delivery does.
pub struct DeliveryTicker<T: Transport, C: Clock> {
    dispatcher: Dispatcher<T>,
    clock: C,
    delivery_time: NaiveTime,
    offset: FixedOffset,
    state: Arc<Mutex<TickerState>>,
}

impl<T: Transport, C: Clock> DeliveryTicker<T, C> {
    pub fn new(
        dispatcher: Dispatcher<T>,
        clock: C,
        delivery_time: NaiveTime,
        offset: FixedOffset,
        state: Arc<Mutex<TickerState>>,
    ) -> Self {
        Self {
            dispatcher,
            clock,
            delivery_time,
            offset,
            state,
        }
    }

    /// Tick loop; returns when `stop` observes a shutdown signal.
    pub async fn run(self, mut stop: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(delivery_time = %self.delivery_time, "ticker started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick().await;
                }
                _ = stop.changed() => {
                    if *stop.borrow() {
                        info!("ticker stopping");
                        return;
                    }
                }
            }
        }
    }

    /// One tick: the daily batch if the gate opens, then any due files.
    pub async fn tick(&self) {
        let now_local = self.clock.now_in(self.offset).naive_local();

        let gated = {
            let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.should_deliver(now_local, self.delivery_time)
        };
        if gated {
            match self.dispatcher.deliver_for(now_local.date()).await {
                Ok(report) if report.skipped() => {
                    debug!(date = %now_local.date(), "nothing due today");
                }
                Ok(report) => {
                    self.state
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .mark_sent(now_local.date());
                    info!(
                        date = %now_local.date(),
                        day = report.day,
                        delivered = report.delivered.len(),
                        failed = report.failed.len(),
                        "daily batch delivered"
                    );
                }
                Err(e) => {
                    // Gate stays open; the next tick retries
                    error!(error = %e, "daily delivery failed");
                }
            }
        }

        match self.dispatcher.process_due_files(now_local).await {
            Ok(reports) => {
                for report in reports {
                    info!(id = %report.id, status = ?report.status, "scheduled file processed");
                }
            }
            Err(e) => error!(error = %e, "file schedule sweep failed"),
        }
    }
}

#[cfg(test)]
#[path = "ticker_tests.rs"]
mod tests;
