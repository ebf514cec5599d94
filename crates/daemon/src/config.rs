// SPDX-License-Identifier: MIT

//! Daemon configuration from `cadence.toml`

use cadence_core::calendar::{parse_utc_offset, CalendarError};
use cadence_core::content::ContentLibrary;
use cadence_core::retry::RetryPolicy;
use cadence_core::rule::Subject;
use chrono::{FixedOffset, NaiveTime};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that overrides the configured bot token
pub const TOKEN_ENV: &str = "CADENCE_BOT_TOKEN";

const DEFAULT_DELIVERY_TIME: &str = "18:00";
const DEFAULT_UTC_OFFSET: &str = "+05:30";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid delivery time {0:?}, expected HH:MM")]
    InvalidDeliveryTime(String),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error("could not determine a state directory")]
    NoStateDir,
}

/// On-disk shape of `cadence.toml`; everything is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    pub state_dir: Option<PathBuf>,
    pub delivery_time: Option<String>,
    pub utc_offset: Option<String>,
    pub bot_token: Option<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub playlists: BTreeMap<String, String>,
    pub parallel_size_limit: Option<u64>,
    #[serde(default)]
    pub retry: Option<RetryPolicy>,
}

/// Resolved daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub delivery_time: NaiveTime,
    pub utc_offset: FixedOffset,
    pub bot_token: Option<String>,
    /// Subject priority order for the daily message
    pub subjects: Vec<Subject>,
    pub playlists: BTreeMap<String, String>,
    /// Payload size in bytes at or above which fan-out goes sequential
    pub parallel_size_limit: u64,
    pub retry: RetryPolicy,
}

impl Config {
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = if path.exists() {
            let text =
                std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.into(), e))?;
            toml::from_str(&text)?
        } else {
            RawConfig::default()
        };
        Self::resolve(raw, std::env::var(TOKEN_ENV).ok())
    }

    /// Apply defaults and parse the time fields. `env_token`, when present,
    /// wins over the file's `bot_token`.
    pub fn resolve(raw: RawConfig, env_token: Option<String>) -> Result<Self, ConfigError> {
        let delivery_time = raw
            .delivery_time
            .as_deref()
            .unwrap_or(DEFAULT_DELIVERY_TIME);
        let delivery_time = NaiveTime::parse_from_str(delivery_time, "%H:%M")
            .map_err(|_| ConfigError::InvalidDeliveryTime(delivery_time.to_string()))?;

        let utc_offset = parse_utc_offset(raw.utc_offset.as_deref().unwrap_or(DEFAULT_UTC_OFFSET))?;

        let state_dir = match raw.state_dir {
            Some(dir) => dir,
            None => default_state_dir().ok_or(ConfigError::NoStateDir)?,
        };

        Ok(Self {
            state_dir,
            delivery_time,
            utc_offset,
            bot_token: env_token.or(raw.bot_token),
            subjects: raw.subjects.into_iter().map(Subject::from).collect(),
            playlists: raw.playlists,
            parallel_size_limit: raw.parallel_size_limit.unwrap_or(10 * 1024 * 1024),
            retry: raw.retry.unwrap_or_default(),
        })
    }

    pub fn socket_path(&self) -> PathBuf {
        self.state_dir.join("cadenced.sock")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.state_dir.join("cadenced.pid")
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir.join("cadenced.log")
    }

    pub fn store_dir(&self) -> PathBuf {
        self.state_dir.join("store")
    }

    pub fn library(&self) -> ContentLibrary {
        let mut library = ContentLibrary::new();
        for (subject, url) in &self.playlists {
            library.set_playlist(subject.as_str(), url.as_str());
        }
        library
    }
}

fn default_state_dir() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|dir| dir.join("cadence"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
