// SPDX-License-Identifier: MIT

//! Daemon lifecycle: startup, lock handling, shutdown

use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use cadence_adapters::TelegramTransport;
use cadence_core::clock::{Clock, SystemClock};
use cadence_core::stores::StoreError;
use cadence_core::transport::Transport;
use cadence_engine::{DispatchConfig, Dispatcher, Stores, TickerState};
use cadence_storage::JsonStore;
use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("no bot token configured (set bot_token or CADENCE_BOT_TOKEN)")]
    MissingToken,

    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Running daemon state
pub struct Daemon<T: Transport, C: Clock> {
    pub config: Config,
    // NOTE(lifetime): held to maintain the exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub listener: UnixListener,
    pub store: JsonStore,
    pub dispatcher: Dispatcher<T>,
    pub clock: C,
    /// Fired-today gate, shared with the ticker task
    pub gate: Arc<Mutex<TickerState>>,
    pub start_time: Instant,
    pub shutdown_requested: bool,
}

/// Start the daemon with the real Telegram transport
pub async fn startup(config: Config) -> Result<Daemon<TelegramTransport, SystemClock>, LifecycleError> {
    let token = config
        .bot_token
        .clone()
        .ok_or(LifecycleError::MissingToken)?;
    let transport = TelegramTransport::new(token);
    startup_with(config, transport, SystemClock).await
}

/// Start the daemon with explicit transport and clock (used by tests)
pub async fn startup_with<T: Transport, C: Clock>(
    config: Config,
    transport: T,
    clock: C,
) -> Result<Daemon<T, C>, LifecycleError> {
    let paths = config.clone();
    match startup_inner(config, transport, clock).await {
        Ok(daemon) => Ok(daemon),
        Err(e) => {
            cleanup_on_failure(&paths);
            Err(e)
        }
    }
}

async fn startup_inner<T: Transport, C: Clock>(
    config: Config,
    transport: T,
    clock: C,
) -> Result<Daemon<T, C>, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Lock first to prevent a second daemon racing the socket
    let lock_file = File::create(config.lock_path())?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    {
        use std::io::Write;
        let mut f = &lock_file;
        writeln!(f, "{}", std::process::id())?;
    }

    let store = JsonStore::open(config.store_dir())?;
    let stores = Stores {
        rules: Arc::new(store.clone()),
        cursors: Arc::new(store.clone()),
        days: Arc::new(store.clone()),
        completions: Arc::new(store.clone()),
        recipients: Arc::new(store.clone()),
        files: Arc::new(store.clone()),
    };
    let dispatcher = Dispatcher::new(
        transport,
        stores,
        DispatchConfig {
            priority: config.subjects.clone(),
            library: config.library(),
            retry: config.retry.clone(),
            parallel_size_limit: config.parallel_size_limit,
        },
    );

    // Remove a stale socket from an unclean stop, then bind
    let socket_path = config.socket_path();
    if socket_path.exists() {
        std::fs::remove_file(&socket_path)?;
    }
    let listener = UnixListener::bind(&socket_path)
        .map_err(|e| LifecycleError::BindFailed(socket_path.clone(), e))?;

    info!(
        socket = %socket_path.display(),
        store = %config.store_dir().display(),
        "daemon started"
    );

    Ok(Daemon {
        config,
        lock_file,
        listener,
        store,
        dispatcher,
        clock,
        // Not persisted: a restart re-evaluates today from the rules
        gate: Arc::new(Mutex::new(TickerState::new())),
        start_time: Instant::now(),
        shutdown_requested: false,
    })
}

/// Clean up resources after a failed startup
fn cleanup_on_failure(config: &Config) {
    let socket = config.socket_path();
    if socket.exists() {
        let _ = std::fs::remove_file(&socket);
    }
}

impl<T: Transport, C: Clock> Daemon<T, C> {
    /// Today's date in the delivery timezone
    pub fn today(&self) -> chrono::NaiveDate {
        self.clock.today_in(self.config.utc_offset)
    }

    /// Shutdown: remove the socket and pid file; the lock releases on drop.
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("shutting down");

        let socket = self.config.socket_path();
        if socket.exists() {
            if let Err(e) = std::fs::remove_file(&socket) {
                warn!(error = %e, "failed to remove socket file");
            }
        }

        let lock = self.config.lock_path();
        if lock.exists() {
            if let Err(e) = std::fs::remove_file(&lock) {
                warn!(error = %e, "failed to remove pid file");
            }
        }

        info!("shutdown complete");
        Ok(())
    }
}
