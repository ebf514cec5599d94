// SPDX-License-Identifier: MIT

use super::*;
use crate::dispatch::{DispatchConfig, Stores};
use cadence_adapters::FakeTransport;
use cadence_core::calendar::{parse_utc_offset, WeekdaySet};
use cadence_core::clock::FakeClock;
use cadence_core::files::FileSchedule;
use cadence_core::retry::RetryPolicy;
use cadence_core::rule::{Frequency, ScheduleRule, Subject};
use cadence_core::stores::{FileScheduleStore, RecipientDirectory, RuleStore};
use cadence_core::transport::RecipientId;
use cadence_storage::JsonStore;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

fn ist() -> FixedOffset {
    parse_utc_offset("+05:30").unwrap()
}

fn six_pm() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 0, 0).unwrap()
}

fn local(s: &str) -> NaiveDateTime {
    s.parse().unwrap()
}

// FakeClock runs on UTC; 18:00 IST is 12:30 UTC
fn clock_at_utc(s: &str) -> FakeClock {
    let at: DateTime<Utc> = s.parse().unwrap();
    FakeClock::new(at)
}

fn ticker_with(
    store: &JsonStore,
    transport: FakeTransport,
    clock: FakeClock,
    state: Arc<Mutex<TickerState>>,
) -> DeliveryTicker<FakeTransport, FakeClock> {
    let stores = Stores {
        rules: Arc::new(store.clone()),
        cursors: Arc::new(store.clone()),
        days: Arc::new(store.clone()),
        completions: Arc::new(store.clone()),
        recipients: Arc::new(store.clone()),
        files: Arc::new(store.clone()),
    };
    let config = DispatchConfig {
        retry: RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        },
        ..DispatchConfig::default()
    };
    DeliveryTicker::new(
        Dispatcher::new(transport, stores, config),
        clock,
        six_pm(),
        ist(),
        state,
    )
}

#[test]
fn gate_respects_time_and_date() {
    let state = TickerState::new();
    assert!(!state.should_deliver(local("2025-03-02T17:59:00"), six_pm()));
    assert!(state.should_deliver(local("2025-03-02T18:00:00"), six_pm()));
    assert!(state.should_deliver(local("2025-03-02T23:59:00"), six_pm()));
}

#[test]
fn gate_closes_for_the_sent_date_only() {
    let mut state = TickerState::new();
    state.mark_sent(local("2025-03-02T18:00:00").date());

    assert!(!state.should_deliver(local("2025-03-02T18:05:00"), six_pm()));
    assert!(state.should_deliver(local("2025-03-03T18:00:00"), six_pm()));
}

#[test]
fn resumed_state_blocks_same_day_resend() {
    let state = TickerState::resumed(local("2025-03-02T18:00:00").date());
    assert!(!state.should_deliver(local("2025-03-02T22:00:00"), six_pm()));
}

#[tokio::test]
async fn tick_delivers_once_per_day() {
    let store = JsonStore::open_temp().unwrap();
    store
        .save_rule(
            &ScheduleRule::new(
                Subject::from("polity"),
                local("2025-03-02T00:00:00").date(),
                Frequency::EverySelectedDay,
                WeekdaySet::ALL,
            )
            .unwrap(),
        )
        .unwrap();
    store.add_recipient(&RecipientId::new("alice")).unwrap();

    let transport = FakeTransport::new();
    let clock = clock_at_utc("2025-03-02T12:30:00Z"); // 18:00 IST
    let state = Arc::new(Mutex::new(TickerState::new()));
    let ticker = ticker_with(&store, transport.clone(), clock.clone(), state.clone());

    ticker.tick().await;
    assert_eq!(transport.sent().len(), 1);
    assert!(state
        .lock()
        .unwrap()
        .already_sent(local("2025-03-02T00:00:00").date()));

    clock.advance(chrono::Duration::minutes(1));
    ticker.tick().await;
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test]
async fn tick_before_delivery_time_does_nothing() {
    let store = JsonStore::open_temp().unwrap();
    store
        .save_rule(
            &ScheduleRule::new(
                Subject::from("polity"),
                local("2025-03-02T00:00:00").date(),
                Frequency::EverySelectedDay,
                WeekdaySet::ALL,
            )
            .unwrap(),
        )
        .unwrap();
    store.add_recipient(&RecipientId::new("alice")).unwrap();

    let transport = FakeTransport::new();
    let clock = clock_at_utc("2025-03-02T11:00:00Z"); // 16:30 IST
    let state = Arc::new(Mutex::new(TickerState::new()));
    let ticker = ticker_with(&store, transport.clone(), clock, state);

    ticker.tick().await;
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn empty_day_leaves_the_gate_open() {
    let store = JsonStore::open_temp().unwrap();
    // Mondays only; 2025-03-02 is a Sunday
    store
        .save_rule(
            &ScheduleRule::new(
                Subject::from("polity"),
                local("2025-03-02T00:00:00").date(),
                Frequency::EverySelectedDay,
                WeekdaySet::from_days(&[1]).unwrap(),
            )
            .unwrap(),
        )
        .unwrap();

    let transport = FakeTransport::new();
    let clock = clock_at_utc("2025-03-02T12:30:00Z");
    let state = Arc::new(Mutex::new(TickerState::new()));
    let ticker = ticker_with(&store, transport.clone(), clock, state.clone());

    ticker.tick().await;
    assert!(transport.sent().is_empty());
    assert_eq!(*state.lock().unwrap(), TickerState::new());
}

#[tokio::test]
async fn tick_sweeps_due_file_schedules() {
    let store = JsonStore::open_temp().unwrap();
    store.add_recipient(&RecipientId::new("alice")).unwrap();
    store
        .add(&FileSchedule::new(
            "f1",
            "/tmp/notes.pdf",
            None,
            local("2025-03-02T09:00:00"),
        ))
        .unwrap();

    let transport = FakeTransport::new();
    let clock = clock_at_utc("2025-03-02T07:00:00Z"); // 12:30 IST, before delivery time
    let state = Arc::new(Mutex::new(TickerState::new()));
    let ticker = ticker_with(&store, transport.clone(), clock, state);

    ticker.tick().await;
    assert_eq!(transport.sent().len(), 1);
}
