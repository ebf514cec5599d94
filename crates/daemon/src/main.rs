// SPDX-License-Identifier: MIT

//! Cadence daemon (cadenced)
//!
//! Background process that owns the delivery tick loop and serves the
//! control socket.

use std::path::PathBuf;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{error, info};

use cadence_core::clock::SystemClock;
use cadence_daemon::lifecycle::{self, LifecycleError};
use cadence_daemon::{server, Config};
use cadence_engine::DeliveryTicker;

/// Startup marker prefix written to the log before anything else.
/// The CLI uses this to find where the current startup attempt begins.
/// Full format: "--- cadenced: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- cadenced: starting (pid: ";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    let config = Config::load(&config_path)?;

    // Write startup marker to log (before tracing setup, so the CLI can find it)
    write_startup_marker(&config)?;

    let log_guard = setup_logging(&config)?;

    info!("starting cadenced (config: {})", config_path.display());

    let mut daemon = match lifecycle::startup(config.clone()).await {
        Ok(d) => d,
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&config, &e);
            error!("failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    // Delivery tick loop; shares the fired-today gate with the server so a
    // manual trigger and the ticker cannot both send the same day.
    let (stop_tx, stop_rx) = watch::channel(false);
    let ticker = DeliveryTicker::new(
        daemon.dispatcher.clone(),
        SystemClock,
        config.delivery_time,
        config.utc_offset,
        daemon.gate.clone(),
    );
    let ticker_task = tokio::spawn(ticker.run(stop_rx));

    info!(
        "daemon ready, listening on {}",
        config.socket_path().display()
    );

    // Signal ready for parent process (e.g. the CLI waiting for startup)
    println!("READY");

    loop {
        tokio::select! {
            result = daemon.listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        if let Err(e) = server::handle_connection(&mut daemon, stream).await {
                            error!("error handling connection: {}", e);
                        }
                    }
                    Err(e) => {
                        error!("error accepting connection: {}", e);
                    }
                }
            }

            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }

            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
        }

        // Check if shutdown was requested over the socket
        if daemon.shutdown_requested {
            info!("shutdown requested over the socket");
            break;
        }
    }

    let _ = stop_tx.send(true);
    let _ = ticker_task.await;
    daemon.shutdown().await?;

    info!("daemon stopped");
    Ok(())
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("cadence").join("cadence.toml"))
        .unwrap_or_else(|| PathBuf::from("cadence.toml"))
}

/// Append the startup marker to the log file
fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    std::fs::create_dir_all(&config.state_dir)?;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())?;
    writeln!(file, "{}{})", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write a startup error synchronously to the log file.
/// This keeps the error visible to the CLI even if the process exits quickly.
fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())
    else {
        return;
    };
    let _ = writeln!(file, "ERROR failed to start daemon: {}", error);
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let file_appender = tracing_appender::rolling::never(&config.state_dir, "cadenced.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
