// SPDX-License-Identifier: MIT

use super::*;
use crate::config::{Config, RawConfig};
use crate::lifecycle::startup_with;
use cadence_adapters::FakeTransport;
use cadence_core::calendar::WeekdaySet;
use cadence_core::clock::FakeClock;
use cadence_core::completion::{CompletionEntry, DayStatus};
use cadence_core::rule::{Frequency, ScheduleRule, Subject};
use chrono::{DateTime, NaiveDate, Utc};
use tempfile::TempDir;

// 18:00 IST on Sunday 2025-03-02
const NOW_UTC: &str = "2025-03-02T12:30:00Z";

fn sunday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()
}

async fn daemon_in(
    dir: &TempDir,
    transport: FakeTransport,
) -> crate::lifecycle::Daemon<FakeTransport, FakeClock> {
    let raw = RawConfig {
        state_dir: Some(dir.path().to_path_buf()),
        ..RawConfig::default()
    };
    let config = Config::resolve(raw, None).unwrap();
    let clock = FakeClock::new(NOW_UTC.parse::<DateTime<Utc>>().unwrap());
    startup_with(config, transport, clock).await.unwrap()
}

fn sunday_rule() -> ScheduleRule {
    ScheduleRule::new(
        Subject::from("polity"),
        sunday(),
        Frequency::EverySelectedDay,
        WeekdaySet::from_days(&[0]).unwrap(),
    )
    .unwrap()
}

#[tokio::test]
async fn ping_pongs() {
    let dir = TempDir::new().unwrap();
    let mut daemon = daemon_in(&dir, FakeTransport::new()).await;
    let response = handle_request(&mut daemon, Request::Ping).await;
    assert!(matches!(response, Response::Pong));
}

#[tokio::test]
async fn hello_reports_protocol_version() {
    let dir = TempDir::new().unwrap();
    let mut daemon = daemon_in(&dir, FakeTransport::new()).await;
    let response = handle_request(
        &mut daemon,
        Request::Hello {
            version: "0".to_string(),
        },
    )
    .await;
    match response {
        Response::Hello { version } => assert_eq!(version, PROTOCOL_VERSION),
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn status_counts_store_contents() {
    let dir = TempDir::new().unwrap();
    let mut daemon = daemon_in(&dir, FakeTransport::new()).await;
    daemon.store.save_rule(&sunday_rule()).unwrap();
    daemon.store.add_recipient(&RecipientId::new("alice")).unwrap();

    let response = handle_request(&mut daemon, Request::Status).await;
    match response {
        Response::Status(info) => {
            assert_eq!(info.day, 0);
            assert_eq!(info.rules, 1);
            assert_eq!(info.recipients, 1);
            assert_eq!(info.pending_files, 0);
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn trigger_delivers_then_gates() {
    let dir = TempDir::new().unwrap();
    let transport = FakeTransport::new();
    let mut daemon = daemon_in(&dir, transport.clone()).await;
    daemon.store.save_rule(&sunday_rule()).unwrap();
    daemon.store.add_recipient(&RecipientId::new("alice")).unwrap();

    let response = handle_request(&mut daemon, Request::Trigger { date: None }).await;
    match response {
        Response::Delivery(report) => {
            assert_eq!(report.day, Some(1));
            assert_eq!(report.delivered.len(), 1);
        }
        other => panic!("unexpected response: {:?}", other),
    }
    assert_eq!(transport.sent().len(), 1);

    // Second trigger the same day is refused
    let response = handle_request(&mut daemon, Request::Trigger { date: None }).await;
    match response {
        Response::AlreadySent { date } => assert_eq!(date, sunday()),
        other => panic!("unexpected response: {:?}", other),
    }
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test]
async fn explicit_date_bypasses_the_gate() {
    let dir = TempDir::new().unwrap();
    let transport = FakeTransport::new();
    let mut daemon = daemon_in(&dir, transport.clone()).await;
    // Due every day; trigger for a past Monday
    daemon
        .store
        .save_rule(
            &ScheduleRule::new(
                Subject::from("polity"),
                NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
                Frequency::EverySelectedDay,
                WeekdaySet::ALL,
            )
            .unwrap(),
        )
        .unwrap();
    daemon.store.add_recipient(&RecipientId::new("alice")).unwrap();

    handle_request(&mut daemon, Request::Trigger { date: None }).await;
    let response = handle_request(
        &mut daemon,
        Request::Trigger {
            date: Some(NaiveDate::from_ymd_opt(2025, 2, 24).unwrap()),
        },
    )
    .await;
    assert!(matches!(response, Response::Delivery(_)));
    assert_eq!(transport.sent().len(), 2);
}

#[tokio::test]
async fn empty_trigger_does_not_close_the_gate() {
    let dir = TempDir::new().unwrap();
    let mut daemon = daemon_in(&dir, FakeTransport::new()).await;
    // Mondays only; today is Sunday
    daemon
        .store
        .save_rule(
            &ScheduleRule::new(
                Subject::from("polity"),
                sunday(),
                Frequency::EverySelectedDay,
                WeekdaySet::from_days(&[1]).unwrap(),
            )
            .unwrap(),
        )
        .unwrap();

    let response = handle_request(&mut daemon, Request::Trigger { date: None }).await;
    match response {
        Response::Delivery(report) => assert!(report.skipped()),
        other => panic!("unexpected response: {:?}", other),
    }

    // Not AlreadySent: the gate is still open
    let response = handle_request(&mut daemon, Request::Trigger { date: None }).await;
    assert!(matches!(response, Response::Delivery(_)));
}

#[tokio::test]
async fn ack_returns_streak_and_unknown_day_errors() {
    let dir = TempDir::new().unwrap();
    let mut daemon = daemon_in(&dir, FakeTransport::new()).await;
    let alice = RecipientId::new("alice");
    daemon
        .store
        .append(&alice, &CompletionEntry::pending(1, sunday()))
        .unwrap();

    let response = handle_request(
        &mut daemon,
        Request::Ack {
            recipient: "alice".to_string(),
            day: 1,
            status: DayStatus::Done,
        },
    )
    .await;
    match response {
        Response::Acked { streak } => assert_eq!(streak, 1),
        other => panic!("unexpected response: {:?}", other),
    }

    let response = handle_request(
        &mut daemon,
        Request::Ack {
            recipient: "alice".to_string(),
            day: 9,
            status: DayStatus::Done,
        },
    )
    .await;
    assert!(matches!(response, Response::Error { .. }));
}

#[tokio::test]
async fn summary_lists_rules_with_due_flags() {
    let dir = TempDir::new().unwrap();
    let mut daemon = daemon_in(&dir, FakeTransport::new()).await;
    daemon.store.save_rule(&sunday_rule()).unwrap();

    let response = handle_request(&mut daemon, Request::Summary { date: None }).await;
    match response {
        Response::Summary { day, subjects } => {
            assert_eq!(day, 0);
            assert_eq!(subjects.len(), 1);
            assert!(subjects[0].due_today);
        }
        other => panic!("unexpected response: {:?}", other),
    }

    // A Sunday-only rule is not due on an explicit Monday
    let monday = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
    let response = handle_request(&mut daemon, Request::Summary { date: Some(monday) }).await;
    match response {
        Response::Summary { subjects, .. } => assert!(!subjects[0].due_today),
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn metrics_reflect_the_completion_log() {
    let dir = TempDir::new().unwrap();
    let mut daemon = daemon_in(&dir, FakeTransport::new()).await;
    let alice = RecipientId::new("alice");
    daemon
        .store
        .append(&alice, &CompletionEntry::pending(1, sunday()))
        .unwrap();
    daemon.store.set_status(&alice, 1, DayStatus::Done).unwrap();

    let response = handle_request(
        &mut daemon,
        Request::Metrics {
            recipient: "alice".to_string(),
        },
    )
    .await;
    match response {
        Response::Metrics(metrics) => {
            assert_eq!(metrics.day, 1);
            assert_eq!(metrics.streak, 1);
            assert_eq!(metrics.overall_rate, 100.0);
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn set_rule_validates_at_write_time() {
    let dir = TempDir::new().unwrap();
    let mut daemon = daemon_in(&dir, FakeTransport::new()).await;

    let response = handle_request(
        &mut daemon,
        Request::SetRule {
            subject: "polity".to_string(),
            start_date: sunday(),
            frequency: Frequency::EveryOtherOccurrence,
            weekdays: vec![1, 4],
        },
    )
    .await;
    assert!(matches!(response, Response::Ok));
    assert_eq!(daemon.store.all_rules().unwrap().len(), 1);

    // Empty weekday set is rejected, nothing written
    let response = handle_request(
        &mut daemon,
        Request::SetRule {
            subject: "essay".to_string(),
            start_date: sunday(),
            frequency: Frequency::EverySelectedDay,
            weekdays: vec![],
        },
    )
    .await;
    assert!(matches!(response, Response::Error { .. }));
    assert_eq!(daemon.store.all_rules().unwrap().len(), 1);
}

#[tokio::test]
async fn schedule_file_persists_and_lists() {
    let dir = TempDir::new().unwrap();
    let mut daemon = daemon_in(&dir, FakeTransport::new()).await;

    let response = handle_request(
        &mut daemon,
        Request::ScheduleFile {
            path: "/tmp/notes.pdf".into(),
            caption: Some("Week 3".to_string()),
            send_at: sunday().and_hms_opt(9, 0, 0).unwrap(),
        },
    )
    .await;
    let id = match response {
        Response::FileScheduled { id } => id,
        other => panic!("unexpected response: {:?}", other),
    };

    let response = handle_request(&mut daemon, Request::ListFiles).await;
    match response {
        Response::Files { files } => {
            assert_eq!(files.len(), 1);
            assert_eq!(files[0].id, id);
            assert!(files[0].is_pending());
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn add_recipient_and_shutdown() {
    let dir = TempDir::new().unwrap();
    let mut daemon = daemon_in(&dir, FakeTransport::new()).await;

    let response = handle_request(
        &mut daemon,
        Request::AddRecipient {
            recipient: "alice".to_string(),
        },
    )
    .await;
    assert!(matches!(response, Response::Ok));
    assert_eq!(daemon.store.list_recipients().unwrap().len(), 1);

    assert!(!daemon.shutdown_requested);
    let response = handle_request(&mut daemon, Request::Shutdown).await;
    assert!(matches!(response, Response::ShuttingDown));
    assert!(daemon.shutdown_requested);
}
