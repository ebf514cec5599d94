// SPDX-License-Identifier: MIT

//! cadence - spaced content delivery CLI

mod client;
mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use chrono::{NaiveDate, NaiveDateTime};

use cadence_core::completion::DayStatus;
use cadence_core::rule::Frequency;
use cadence_daemon::Config;

use crate::client::{DaemonClient, TriggerOutcome};
use crate::commands::{daemon, preview};

#[derive(Parser)]
#[command(
    name = "cadence",
    version,
    about = "Spaced content delivery over Telegram"
)]
struct Cli {
    /// Path to cadence.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show daemon status
    Status,
    /// Run the delivery cycle now
    Trigger {
        /// Deliver for this date instead of today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Record a completion answer for a recipient
    Ack {
        recipient: String,
        day: u32,
        /// done or not-done
        #[arg(value_parser = parse_day_status)]
        status: DayStatus,
    },
    /// Show the schedule with due flags
    Summary {
        /// Evaluate due flags for this date instead of today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Schedule rule management
    #[command(subcommand)]
    Schedule(ScheduleCommand),
    /// Show a recipient's progress metrics
    Metrics { recipient: String },
    /// One-shot file broadcasts
    #[command(subcommand)]
    File(FileCommand),
    /// Recipient management
    #[command(subcommand)]
    Recipient(RecipientCommand),
    /// Preview the next daily message without sending
    Preview(preview::PreviewArgs),
    /// Daemon management
    Daemon(daemon::DaemonArgs),
}

#[derive(Subcommand)]
enum ScheduleCommand {
    /// Create or replace a subject's recurrence rule
    Set {
        subject: String,
        /// First date the rule can fire
        #[arg(long)]
        start: NaiveDate,
        /// Comma-separated weekday names, e.g. "mon,thu"
        #[arg(long)]
        days: String,
        /// daily or alternate
        #[arg(long, default_value = "daily")]
        frequency: Frequency,
    },
}

#[derive(Subcommand)]
enum FileCommand {
    /// Queue a file for broadcast
    Schedule {
        path: PathBuf,
        /// Delivery-zone local time, "YYYY-MM-DD HH:MM"
        #[arg(long, value_parser = parse_send_at)]
        at: NaiveDateTime,
        #[arg(long)]
        caption: Option<String>,
    },
    /// List scheduled files
    List,
}

#[derive(Subcommand)]
enum RecipientCommand {
    /// Register a chat id for deliveries
    Add { recipient: String },
}

fn parse_day_status(s: &str) -> Result<DayStatus, String> {
    match s {
        "done" => Ok(DayStatus::Done),
        "not-done" => Ok(DayStatus::NotDone),
        _ => Err(format!("expected 'done' or 'not-done', got {:?}", s)),
    }
}

fn parse_weekdays(s: &str) -> Result<Vec<u8>, String> {
    s.split(',')
        .map(|day| match day.trim().to_lowercase().as_str() {
            "sun" | "sunday" => Ok(0),
            "mon" | "monday" => Ok(1),
            "tue" | "tuesday" => Ok(2),
            "wed" | "wednesday" => Ok(3),
            "thu" | "thursday" => Ok(4),
            "fri" | "friday" => Ok(5),
            "sat" | "saturday" => Ok(6),
            other => Err(format!("unknown weekday: {:?}", other)),
        })
        .collect()
}

fn parse_send_at(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .map_err(|_| format!("expected \"YYYY-MM-DD HH:MM\", got {:?}", s))
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("cadence").join("cadence.toml"))
        .unwrap_or_else(|| PathBuf::from("cadence.toml"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = Config::load(&config_path)?;

    // Preview reads the store directly, no daemon needed
    if let Commands::Preview(args) = cli.command {
        return preview::handle(args, &config);
    }

    // Daemon commands manage the process themselves
    if let Commands::Daemon(args) = cli.command {
        return daemon::handle(args, &config, &config_path).await;
    }

    // All other commands go through the daemon
    let client = DaemonClient::connect_or_start(&config, &config_path)?;

    match cli.command {
        Commands::Status => {
            let info = client.status().await?;
            println!("Daemon running (uptime: {}s)", info.uptime_secs);
            println!("  Day: {}", info.day);
            println!("  Recipients: {}", info.recipients);
            println!("  Rules: {}", info.rules);
            println!("  Pending files: {}", info.pending_files);
        }

        Commands::Trigger { date } => match client.trigger(date).await? {
            TriggerOutcome::Delivered(report) if report.skipped() => {
                println!("Nothing due on {}", report.target_date);
            }
            TriggerOutcome::Delivered(report) => {
                let subjects: Vec<String> =
                    report.subjects.iter().map(ToString::to_string).collect();
                println!(
                    "Day {} ({}) delivered to {} recipient(s)",
                    report.day.unwrap_or(0),
                    subjects.join(", "),
                    report.delivered.len()
                );
                for (recipient, error) in &report.failed {
                    println!("  failed {}: {}", recipient, error);
                }
            }
            TriggerOutcome::AlreadySent(date) => {
                println!("Already sent today ({})", date);
            }
        },

        Commands::Ack {
            recipient,
            day,
            status,
        } => {
            let streak = client.ack(&recipient, day, status).await?;
            println!("Day {} marked as {}. Streak: {} days", day, status, streak);
        }

        Commands::Summary { date } => {
            let (day, subjects) = client.summary(date).await?;
            println!("Day {}", day);
            if subjects.is_empty() {
                println!("No schedule rules");
            } else {
                println!(
                    "{:<15} {:<10} {:<22} {:<12} DUE",
                    "SUBJECT", "FREQUENCY", "DAYS", "LAST"
                );
                for s in subjects {
                    println!(
                        "{:<15} {:<10} {:<22} {:<12} {}",
                        s.subject.to_string(),
                        s.frequency.to_string(),
                        s.weekdays,
                        s.last_fired
                            .map_or_else(|| "-".to_string(), |d| d.to_string()),
                        if s.due_today { "yes" } else { "no" }
                    );
                }
            }
        }

        Commands::Schedule(ScheduleCommand::Set {
            subject,
            start,
            days,
            frequency,
        }) => {
            let weekdays = parse_weekdays(&days).map_err(|e| anyhow::anyhow!(e))?;
            client.set_rule(&subject, start, frequency, weekdays).await?;
            println!("Rule saved for {}", subject);
        }

        Commands::Metrics { recipient } => {
            let m = client.metrics(&recipient).await?;
            println!("Recipient: {}", recipient);
            println!("  Day: {}", m.day);
            println!("  Streak: {} days", m.streak);
            println!("  Done: {}/{}", m.done, m.total);
            println!("  Overall: {}%", m.overall_rate);
            println!("  Last 7 days: {}%", m.weekly_rate);
        }

        Commands::File(FileCommand::Schedule { path, at, caption }) => {
            let id = client.schedule_file(path, caption, at).await?;
            println!("Scheduled: {}", id);
        }

        Commands::File(FileCommand::List) => {
            let files = client.list_files().await?;
            if files.is_empty() {
                println!("No scheduled files");
            } else {
                println!("{:<38} {:<18} {:<8} PATH", "ID", "SEND AT", "STATUS");
                for f in files {
                    println!(
                        "{:<38} {:<18} {:<8} {}",
                        f.id,
                        f.send_at.format("%Y-%m-%d %H:%M").to_string(),
                        f.status.to_string(),
                        f.path.display()
                    );
                    if let Some(error) = &f.error {
                        println!("  error: {}", error);
                    }
                }
            }
        }

        Commands::Recipient(RecipientCommand::Add { recipient }) => {
            client.add_recipient(&recipient).await?;
            println!("Added recipient {}", recipient);
        }

        Commands::Preview(_) | Commands::Daemon(_) => unreachable!(),
    }

    Ok(())
}
