// SPDX-License-Identifier: MIT

//! Socket server and request handling

use tokio::net::UnixStream;
use tracing::{debug, error};

use cadence_core::calendar::WeekdaySet;
use cadence_core::clock::Clock;
use cadence_core::files::FileSchedule;
use cadence_core::rule::{Frequency, ScheduleRule, Subject};
use cadence_core::stores::{
    CompletionStore, DayCounter, FileScheduleStore, RecipientDirectory, RuleStore,
};
use cadence_core::transport::{RecipientId, Transport};
use cadence_engine::{recipient_metrics, schedule_summary};

use crate::lifecycle::Daemon;
use crate::protocol::{
    self, Request, Response, StatusInfo, DEFAULT_TIMEOUT, PROTOCOL_VERSION,
};

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("request timeout")]
    Timeout,
}

/// Handle a single client connection
pub async fn handle_connection<T: Transport, C: Clock>(
    daemon: &mut Daemon<T, C>,
    stream: UnixStream,
) -> Result<(), ServerError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
        Ok(req) => req,
        Err(protocol::ProtocolError::Timeout) => {
            error!("request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("client disconnected before sending request");
            return Ok(());
        }
        Err(e) => {
            error!(error = %e, "failed to read request");
            return Err(ServerError::Protocol(e));
        }
    };

    debug!(request = ?request, "received request");
    let response = handle_request(daemon, request).await;
    debug!(response = ?response, "sending response");

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT)
        .await
        .map_err(ServerError::Protocol)?;

    Ok(())
}

/// Handle one request and produce the response
pub async fn handle_request<T: Transport, C: Clock>(
    daemon: &mut Daemon<T, C>,
    request: Request,
) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },

        Request::Status => match status(daemon) {
            Ok(info) => Response::Status(info),
            Err(e) => error_response(e),
        },

        Request::Trigger { date } => {
            let today = daemon.today();
            let target = date.unwrap_or(today);

            // The ticker gate also covers manual triggers for today
            let gated = {
                let gate = daemon.gate.lock().unwrap_or_else(|e| e.into_inner());
                date.is_none() && gate.already_sent(today)
            };
            if gated {
                return Response::AlreadySent { date: today };
            }

            match daemon.dispatcher.deliver_for(target).await {
                Ok(report) => {
                    if target == today && !report.skipped() {
                        daemon
                            .gate
                            .lock()
                            .unwrap_or_else(|e| e.into_inner())
                            .mark_sent(today);
                    }
                    Response::Delivery(report)
                }
                Err(e) => error_response(e),
            }
        }

        Request::Ack {
            recipient,
            day,
            status,
        } => {
            let recipient = RecipientId::new(recipient);
            match daemon.dispatcher.acknowledge(&recipient, day, status).await {
                Ok(streak) => Response::Acked { streak },
                Err(e) => error_response(e),
            }
        }

        Request::Summary { date } => {
            let target = date.unwrap_or_else(|| daemon.today());
            match (daemon.store.all_rules(), daemon.store.current_day()) {
                (Ok(rules), Ok(day)) => Response::Summary {
                    day,
                    subjects: schedule_summary(&rules, target),
                },
                (Err(e), _) | (_, Err(e)) => error_response(e),
            }
        }

        Request::Metrics { recipient } => {
            let recipient = RecipientId::new(recipient);
            match daemon.store.entries(&recipient) {
                Ok(entries) => Response::Metrics(recipient_metrics(&entries)),
                Err(e) => error_response(e),
            }
        }

        Request::SetRule {
            subject,
            start_date,
            frequency,
            weekdays,
        } => match set_rule(daemon, subject, start_date, frequency, &weekdays) {
            Ok(()) => Response::Ok,
            Err(message) => Response::Error { message },
        },

        Request::ScheduleFile {
            path,
            caption,
            send_at,
        } => {
            let id = uuid::Uuid::new_v4().to_string();
            let schedule = FileSchedule::new(id.clone(), path, caption, send_at);
            match daemon.store.add(&schedule) {
                Ok(()) => Response::FileScheduled { id },
                Err(e) => error_response(e),
            }
        }

        Request::ListFiles => match daemon.store.all() {
            Ok(files) => Response::Files { files },
            Err(e) => error_response(e),
        },

        Request::AddRecipient { recipient } => {
            match daemon.store.add_recipient(&RecipientId::new(recipient)) {
                Ok(()) => Response::Ok,
                Err(e) => error_response(e),
            }
        }

        Request::Shutdown => {
            daemon.shutdown_requested = true;
            Response::ShuttingDown
        }
    }
}

/// Validate and persist a rule; a replaced rule starts with a fresh watermark
fn set_rule<T: Transport, C: Clock>(
    daemon: &Daemon<T, C>,
    subject: String,
    start_date: chrono::NaiveDate,
    frequency: Frequency,
    weekdays: &[u8],
) -> Result<(), String> {
    let weekdays = WeekdaySet::from_days(weekdays).map_err(|e| e.to_string())?;
    let rule = ScheduleRule::new(Subject::new(subject), start_date, frequency, weekdays)
        .map_err(|e| e.to_string())?;
    daemon.store.save_rule(&rule).map_err(|e| e.to_string())
}

fn status<T: Transport, C: Clock>(daemon: &Daemon<T, C>) -> Result<StatusInfo, cadence_core::stores::StoreError> {
    let pending_files = daemon
        .store
        .all()?
        .iter()
        .filter(|f| f.is_pending())
        .count();
    Ok(StatusInfo {
        uptime_secs: daemon.start_time.elapsed().as_secs(),
        day: daemon.store.current_day()?,
        recipients: daemon.store.list_recipients()?.len(),
        rules: daemon.store.all_rules()?.len(),
        pending_files,
    })
}

fn error_response(e: impl std::fmt::Display) -> Response {
    Response::Error {
        message: e.to_string(),
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
