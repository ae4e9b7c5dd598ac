//! The recompute pipeline.
//!
//! One recompute cycle runs solar calculation, rule selection, time resolution
//! and the trigger rebuild in that order. [`plan_day_for`] is the pure part
//! (also used by the `plan` command); [`Engine::recompute`] adds the rebuild
//! and serialises whole cycles behind one lock.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::bus::CommandSink;
use crate::config::Config;
use crate::geo::SolarTimes;
use crate::schedule::{
    ArmedTrigger, DayPlan, MatchedBy, RebuildReport, ScheduleError, TriggerRebuilder,
    active_event, plan_day, select_schedule, weekday_name,
};
use crate::timer::DailyTimer;

/// Everything decided for one date before anything is armed.
#[derive(Debug, Clone)]
pub struct DayOutline {
    pub date: NaiveDate,
    pub weekday: &'static str,
    pub solar: Result<SolarTimes, ScheduleError>,
    /// Empty when no event is active.
    pub active_event: String,
    /// Events flagged active but shadowed by `active_event`.
    pub ignored_events: Vec<String>,
    pub matched_by: MatchedBy,
    /// Index of the governing entry in `schedules`.
    pub schedule_index: Option<usize>,
    pub plan: DayPlan,
}

impl DayOutline {
    pub fn log(&self) {
        log_block_start!("Schedule for {} {}", self.weekday, self.date);
        match &self.solar {
            Ok(solar) => log_indented!(
                "Sunrise {} / sunset {}",
                solar.sunrise.format("%H:%M"),
                solar.sunset.format("%H:%M")
            ),
            Err(e) => log_warning!("{e}; sun-relative actions are skipped today"),
        }

        if !self.ignored_events.is_empty() {
            log_warning!(
                "Several events are active; using '{}' and ignoring {}",
                self.active_event,
                self.ignored_events.join(", ")
            );
        }

        match (self.matched_by, self.schedule_index) {
            (MatchedBy::Event, Some(index)) => log_indented!(
                "Event '{}' selects schedule #{}",
                self.active_event,
                index + 1
            ),
            (MatchedBy::Weekday, Some(index)) => {
                log_indented!("{} selects schedule #{}", self.weekday, index + 1)
            }
            _ => log_indented!("No schedule applies today"),
        }

        self.plan.log_issues();
    }
}

/// Resolve the trigger plan for `date` without arming anything.
pub fn plan_day_for(config: &Config, date: NaiveDate) -> Result<DayOutline> {
    let location = config.location()?;
    let solar = location.solar_times(date);

    let event = active_event(&config.events);
    let weekday = weekday_name(date.weekday());
    let selection = select_schedule(&config.schedules, weekday, event.label);
    let plan = plan_day(&selection, &solar, &config.device_directory());

    Ok(DayOutline {
        date,
        weekday,
        solar,
        active_event: event.label.to_string(),
        ignored_events: event.ignored.iter().map(|s| s.to_string()).collect(),
        matched_by: selection.matched_by,
        schedule_index: selection.index,
        plan,
    })
}

/// Runs recompute cycles one at a time against the armed generation.
///
/// Clones share the same rebuilder.
#[derive(Clone)]
pub struct Engine {
    rebuilder: Arc<Mutex<TriggerRebuilder>>,
}

impl Engine {
    pub fn new(timer: Box<dyn DailyTimer>, sink: Arc<dyn CommandSink>) -> Self {
        Self {
            rebuilder: Arc::new(Mutex::new(TriggerRebuilder::new(timer, sink))),
        }
    }

    /// Run a full recompute cycle for `date` and arm the result.
    ///
    /// `date` is the calendar date at the configured location
    /// ([`Config::wall_clock`]).
    ///
    /// The lock is held from planning through the rebuild, so concurrent
    /// callers run one complete cycle after the other.
    pub fn recompute(&self, config: &Config, date: NaiveDate) -> Result<RebuildReport> {
        let mut rebuilder = self.lock();

        let outline = plan_day_for(config, date)?;
        outline.log();

        rebuilder.set_zone(config.location()?.offset);
        rebuilder.set_sink(config.command_sink());
        let report = rebuilder.rebuild(outline.plan.triggers);

        log_decorated!(
            "{} trigger{} armed ({} cleared)",
            report.armed,
            if report.armed == 1 { "" } else { "s" },
            report.cleared
        );
        Ok(report)
    }

    /// The generation currently armed.
    pub fn armed(&self) -> Vec<ArmedTrigger> {
        self.lock().current().to_vec()
    }

    /// Disarm everything, returning how many triggers were removed.
    pub fn clear(&self) -> usize {
        self.lock().clear()
    }

    fn lock(&self) -> MutexGuard<'_, TriggerRebuilder> {
        self.rebuilder.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
