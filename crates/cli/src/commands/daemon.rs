// SPDX-License-Identifier: MIT

//! Daemon management commands

use std::path::Path;

use anyhow::Result;
use cadence_daemon::Config;

use crate::client::{self, ClientError, DaemonClient};

#[derive(clap::Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(clap::Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon in the background
    Start,
    /// Stop a running daemon
    Stop,
    /// Show whether the daemon is running
    Status,
}

pub async fn handle(args: DaemonArgs, config: &Config, config_path: &Path) -> Result<()> {
    match args.command {
        DaemonCommand::Start => match DaemonClient::connect(config) {
            Ok(_) => println!("Daemon already running"),
            Err(ClientError::DaemonNotRunning) => {
                DaemonClient::connect_or_start(config, config_path)?;
                println!("Daemon started");
            }
            Err(e) => return Err(e.into()),
        },

        DaemonCommand::Stop => {
            if client::daemon_stop(config).await? {
                println!("Daemon stopped");
            } else {
                println!("Daemon not running");
            }
        }

        DaemonCommand::Status => match DaemonClient::connect(config) {
            Ok(daemon) => {
                let info = daemon.status().await?;
                println!("Daemon running (uptime: {}s)", info.uptime_secs);
            }
            Err(ClientError::DaemonNotRunning) => println!("Daemon not running"),
            Err(e) => return Err(e.into()),
        },
    }

    Ok(())
}
