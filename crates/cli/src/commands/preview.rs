// SPDX-License-Identifier: MIT

//! Offline preview of the next daily message
//!
//! Reads the store directly; a running daemon is not required. Nothing is
//! advanced or delivered.

use std::collections::BTreeMap;

use anyhow::Result;
use cadence_core::clock::{Clock, SystemClock};
use cadence_core::message::render_daily_message;
use cadence_core::plan::plan;
use cadence_core::stores::{CursorStore, DayCounter, RuleStore};
use cadence_daemon::Config;
use cadence_storage::JsonStore;
use chrono::NaiveDate;

#[derive(clap::Args)]
pub struct PreviewArgs {
    /// Date to preview (defaults to today in the delivery zone)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub fn handle(args: PreviewArgs, config: &Config) -> Result<()> {
    let store = JsonStore::open(config.store_dir())?;
    let target = args
        .date
        .unwrap_or_else(|| SystemClock.today_in(config.utc_offset));

    let mut rules = store.all_rules()?;
    rules.sort_by_key(|rule| {
        config
            .subjects
            .iter()
            .position(|s| *s == rule.subject)
            .unwrap_or(usize::MAX)
    });

    let mut cursors = BTreeMap::new();
    for rule in &rules {
        if let Some(cursor) = store.cursor(&rule.subject)? {
            cursors.insert(rule.subject.clone(), cursor);
        }
    }

    let batch = plan(&rules, &cursors, target);
    if batch.is_empty() {
        println!("Nothing due on {}", target);
        return Ok(());
    }

    let day = store.current_day()? + 1;
    println!("{}", render_daily_message(day, &batch, &config.library()));
    Ok(())
}
