// SPDX-License-Identifier: MIT

//! Daemon client for CLI commands

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use cadence_daemon::protocol::{self, ProtocolError};
use cadence_daemon::{Config, Request, Response, StatusInfo};
use cadence_core::completion::DayStatus;
use cadence_core::files::FileSchedule;
use cadence_core::rule::Frequency;
use cadence_engine::{DeliveryReport, RecipientMetrics, SubjectSummary};
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use tokio::net::UnixStream;

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for IPC requests
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("CADENCE_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for a manual trigger, which fans out a whole batch
pub fn timeout_trigger() -> Duration {
    parse_duration_ms("CADENCE_TIMEOUT_TRIGGER_MS").unwrap_or(Duration::from_secs(120))
}

/// Timeout for waiting for the daemon to start
pub fn timeout_connect() -> Duration {
    parse_duration_ms("CADENCE_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for the daemon process to exit
pub fn timeout_exit() -> Duration {
    parse_duration_ms("CADENCE_TIMEOUT_EXIT_MS").unwrap_or(Duration::from_secs(2))
}

/// Polling interval for retries
pub fn poll_interval() -> Duration {
    parse_duration_ms("CADENCE_POLL_INTERVAL_MS").unwrap_or(Duration::from_millis(50))
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running")]
    DaemonNotRunning,

    #[error("failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("unexpected response from daemon")]
    UnexpectedResponse,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of a manual trigger
pub enum TriggerOutcome {
    Delivered(DeliveryReport),
    AlreadySent(NaiveDate),
}

/// Daemon client
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connect to the daemon, auto-starting it if not running
    pub fn connect_or_start(config: &Config, config_path: &Path) -> Result<Self, ClientError> {
        match Self::connect(config) {
            Ok(client) => Ok(client),
            Err(ClientError::DaemonNotRunning) => {
                let child = start_daemon_background(config_path)?;
                Self::connect_with_retry(config, timeout_connect(), child)
            }
            Err(e) => Err(wrap_with_startup_error(e, config)),
        }
    }

    /// Connect to an existing daemon (no auto-start)
    pub fn connect(config: &Config) -> Result<Self, ClientError> {
        let socket_path = config.socket_path();

        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }

        Ok(Self { socket_path })
    }

    fn connect_with_retry(
        config: &Config,
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            // Check if the daemon exited early (startup failure)
            match child.try_wait() {
                Ok(Some(status)) => {
                    // Poll for the startup error in the log (filesystem may need to sync)
                    let poll_start = Instant::now();
                    while poll_start.elapsed() < timeout_exit() {
                        if let Some(err) = read_startup_error(config) {
                            return Err(ClientError::DaemonStartFailed(err));
                        }
                        std::thread::sleep(poll_interval());
                    }
                    return Err(ClientError::DaemonStartFailed(format!(
                        "exited with {}",
                        status
                    )));
                }
                Ok(None) => {
                    // Still running, try to connect
                }
                Err(_) => {
                    // Error checking status, assume still running
                }
            }

            match Self::connect(config) {
                Ok(client) => return Ok(client),
                Err(ClientError::DaemonNotRunning) => {
                    std::thread::sleep(poll_interval());
                }
                Err(e) => return Err(wrap_with_startup_error(e, config)),
            }
        }

        Err(wrap_with_startup_error(
            ClientError::DaemonStartTimeout,
            config,
        ))
    }

    /// Send a request and receive a response with specific timeouts
    async fn send_with_timeout(
        &self,
        request: Request,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(&request)?;
        tokio::time::timeout(write_timeout, protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let response_bytes =
            tokio::time::timeout(read_timeout, protocol::read_message(&mut reader))
                .await
                .map_err(|_| ProtocolError::Timeout)??;

        let response: Response = protocol::decode(&response_bytes)?;
        Ok(response)
    }

    /// Send a request and receive a response
    pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
        self.send_with_timeout(request, timeout_ipc(), timeout_ipc())
            .await
    }

    /// Daemon protocol version via the Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        match self
            .send(Request::Hello {
                version: env!("CARGO_PKG_VERSION").to_string(),
            })
            .await?
        {
            Response::Hello { version } => Ok(version),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn status(&self) -> Result<StatusInfo, ClientError> {
        match self.send(Request::Status).await? {
            Response::Status(info) => Ok(info),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Run the delivery cycle now
    pub async fn trigger(&self, date: Option<NaiveDate>) -> Result<TriggerOutcome, ClientError> {
        match self
            .send_with_timeout(Request::Trigger { date }, timeout_trigger(), timeout_ipc())
            .await?
        {
            Response::Delivery(report) => Ok(TriggerOutcome::Delivered(report)),
            Response::AlreadySent { date } => Ok(TriggerOutcome::AlreadySent(date)),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Record a completion answer; returns the recipient's streak
    pub async fn ack(
        &self,
        recipient: &str,
        day: u32,
        status: DayStatus,
    ) -> Result<u32, ClientError> {
        match self
            .send(Request::Ack {
                recipient: recipient.to_string(),
                day,
                status,
            })
            .await?
        {
            Response::Acked { streak } => Ok(streak),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn summary(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<(u32, Vec<SubjectSummary>), ClientError> {
        match self.send(Request::Summary { date }).await? {
            Response::Summary { day, subjects } => Ok((day, subjects)),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn metrics(&self, recipient: &str) -> Result<RecipientMetrics, ClientError> {
        match self
            .send(Request::Metrics {
                recipient: recipient.to_string(),
            })
            .await?
        {
            Response::Metrics(metrics) => Ok(metrics),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Create or replace a subject's schedule rule
    pub async fn set_rule(
        &self,
        subject: &str,
        start_date: NaiveDate,
        frequency: Frequency,
        weekdays: Vec<u8>,
    ) -> Result<(), ClientError> {
        match self
            .send(Request::SetRule {
                subject: subject.to_string(),
                start_date,
                frequency,
                weekdays,
            })
            .await?
        {
            Response::Ok => Ok(()),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Queue a one-shot file broadcast; returns the schedule id
    pub async fn schedule_file(
        &self,
        path: PathBuf,
        caption: Option<String>,
        send_at: NaiveDateTime,
    ) -> Result<String, ClientError> {
        match self
            .send(Request::ScheduleFile {
                path,
                caption,
                send_at,
            })
            .await?
        {
            Response::FileScheduled { id } => Ok(id),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn list_files(&self) -> Result<Vec<FileSchedule>, ClientError> {
        match self.send(Request::ListFiles).await? {
            Response::Files { files } => Ok(files),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn add_recipient(&self, recipient: &str) -> Result<(), ClientError> {
        match self
            .send(Request::AddRecipient {
                recipient: recipient.to_string(),
            })
            .await?
        {
            Response::Ok => Ok(()),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(Request::Shutdown).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }
}

/// Start the daemon in the background, returning the child process handle
fn start_daemon_background(config_path: &Path) -> Result<std::process::Child, ClientError> {
    let cadenced_path = find_cadenced_binary();

    Command::new(&cadenced_path)
        .arg(config_path)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(e.to_string()))
}

/// Stop the daemon (graceful first, then forceful).
/// Returns true if the daemon was stopped, false if it wasn't running.
pub async fn daemon_stop(config: &Config) -> Result<bool, ClientError> {
    let client = match DaemonClient::connect(config) {
        Ok(c) => c,
        Err(ClientError::DaemonNotRunning) => {
            cleanup_stale_pid(config);
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    // Try graceful shutdown (timeout handled by send())
    let shutdown_result = client.shutdown().await;

    if let Some(pid) = read_daemon_pid(config) {
        if shutdown_result.is_ok() {
            wait_for_exit(pid, timeout_exit()).await;
        }

        // Force kill if still running
        if process_exists(pid) {
            force_kill_daemon(pid);
            wait_for_exit(pid, timeout_exit()).await;
        }
    }

    cleanup_stale_pid(config);

    Ok(true)
}

/// Wait for a process to exit
async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        tokio::time::sleep(poll_interval()).await;
    }
    false
}

/// Find the cadenced binary
fn find_cadenced_binary() -> PathBuf {
    // Explicit override (used by tests to ensure the correct binary)
    if let Ok(path) = std::env::var("CADENCE_DAEMON_BINARY") {
        return PathBuf::from(path);
    }

    // Check if we're running from cargo (development)
    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let dev_path = PathBuf::from(manifest_dir)
            .parent()
            .and_then(|p| p.parent())
            .map(|p| p.join("target/debug/cadenced"));
        if let Some(path) = dev_path {
            if path.exists() {
                return path;
            }
        }
    }

    // Check the current executable's directory
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("cadenced");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    // Fall back to PATH lookup
    PathBuf::from("cadenced")
}

/// Remove an orphaned PID file after the daemon has stopped
fn cleanup_stale_pid(config: &Config) {
    let pid_path = config.lock_path();
    if pid_path.exists() {
        let _ = std::fs::remove_file(&pid_path);
    }
}

/// PID from the daemon's lock file, if present
pub fn read_daemon_pid(config: &Config) -> Option<u32> {
    let content = std::fs::read_to_string(config.lock_path()).ok()?;
    content.trim().parse::<u32>().ok()
}

/// Check if a process with the given PID exists
pub fn process_exists(pid: u32) -> bool {
    // kill -0 checks existence without sending a signal
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Force kill a daemon process
pub fn force_kill_daemon(pid: u32) -> bool {
    Command::new("kill")
        .args(["-9", &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Startup marker prefix that the daemon writes to its log before anything else.
/// Full format: "--- cadenced: starting (pid: 12345) ---"
const STARTUP_MARKER_PREFIX: &str = "--- cadenced: starting (pid: ";

/// Read the daemon log from the last startup marker, looking for errors.
/// Returns the error message if found, None otherwise.
pub fn read_startup_error(config: &Config) -> Option<String> {
    let content = std::fs::read_to_string(config.log_path()).ok()?;

    let start_pos = content.rfind(STARTUP_MARKER_PREFIX)?;
    let startup_log = &content[start_pos..];

    let errors: Vec<&str> = startup_log
        .lines()
        .filter(|line| line.contains(" ERROR ") || line.contains("failed to start"))
        .collect();

    if errors.is_empty() {
        return None;
    }

    // Strip the timestamp/level prefix: "timestamp LEVEL target: message"
    let error_messages: Vec<String> = errors
        .iter()
        .filter_map(|line| line.split_once(": ").map(|(_, msg)| msg.to_string()))
        .collect();

    if error_messages.is_empty() {
        Some(errors.join("\n"))
    } else {
        Some(error_messages.join("\n"))
    }
}

/// Wrap an error with startup log info if available
fn wrap_with_startup_error(err: ClientError, config: &Config) -> ClientError {
    // Don't double-wrap
    if matches!(err, ClientError::DaemonStartFailed(_)) {
        return err;
    }

    if let Some(startup_error) = read_startup_error(config) {
        ClientError::DaemonStartFailed(startup_error)
    } else {
        err
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
