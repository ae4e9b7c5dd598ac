//! `plan` command: show what a date would arm without touching any shutter.
//!
//! Human output goes through the logger; `--json` prints a single document on
//! stdout and silences everything else so it can be piped.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::config;
use crate::core::{DayOutline, plan_day_for};
use crate::logger::Log;
use crate::schedule::{ArmedTrigger, MatchedBy};

/// Serialisable view of a [`DayOutline`].
#[derive(Debug, Serialize)]
pub struct PlanReport<'a> {
    pub date: String,
    pub weekday: &'static str,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    /// Why solar times are missing (polar day or night).
    pub solar_error: Option<String>,
    pub active_event: Option<&'a str>,
    pub ignored_events: &'a [String],
    /// 1-based position in `schedules`, as shown in logs.
    pub schedule: Option<usize>,
    pub matched_by: &'static str,
    pub triggers: &'a [ArmedTrigger],
    pub issues: Vec<String>,
}

impl<'a> PlanReport<'a> {
    pub fn from_outline(outline: &'a DayOutline) -> Self {
        let (sunrise, sunset, solar_error) = match &outline.solar {
            Ok(solar) => (
                Some(solar.sunrise.format("%H:%M").to_string()),
                Some(solar.sunset.format("%H:%M").to_string()),
                None,
            ),
            Err(e) => (None, None, Some(e.to_string())),
        };

        Self {
            date: outline.date.format("%Y-%m-%d").to_string(),
            weekday: outline.weekday,
            sunrise,
            sunset,
            solar_error,
            active_event: (!outline.active_event.is_empty())
                .then_some(outline.active_event.as_str()),
            ignored_events: &outline.ignored_events,
            schedule: outline.schedule_index.map(|index| index + 1),
            matched_by: match outline.matched_by {
                MatchedBy::Weekday => "weekday",
                MatchedBy::Event => "event",
                MatchedBy::Nothing => "nothing",
            },
            triggers: &outline.plan.triggers,
            issues: outline.plan.issues.iter().map(|i| i.to_string()).collect(),
        }
    }
}

/// Handle `shutterd plan [DATE] [--json]`.
///
/// Reads the configuration without creating a default one. `date` defaults
/// to today at the configured location.
pub fn handle_plan_command(date: Option<NaiveDate>, json: bool) -> Result<()> {
    if json {
        Log::set_enabled(false);
    } else {
        log_version!();
    }

    let config_path = config::get_config_path()?;
    let config = config::load_from_path(&config_path)?;
    let date = date.unwrap_or_else(|| config.wall_clock(crate::time_source::now()).date());
    let outline = plan_day_for(&config, date)?;

    if json {
        let report = PlanReport::from_outline(&outline);
        let output =
            serde_json::to_string_pretty(&report).context("Failed to serialize the plan")?;
        println!("{output}");
        return Ok(());
    }

    outline.log();
    if outline.plan.triggers.is_empty() {
        log_block_start!("Nothing to arm");
    } else {
        log_block_start!("Triggers:");
        for trigger in &outline.plan.triggers {
            log_indented!("{} -> {}", trigger.label(), trigger.addresses.join(", "));
        }
    }
    log_end!();
    Ok(())
}
