//! Daily trigger rebuilder.
//!
//! [`plan_day`] resolves the selected day's open and close rules into a list of
//! [`ArmedTrigger`]s plus the problems met on the way. [`TriggerRebuilder`]
//! owns the current generation and swaps a new plan into the daily timer in
//! one step.

use std::fmt;
use std::sync::Arc;

use super::expression::resolve_time;
use super::{ActionKind, ActionRule, ArmedTrigger, DeviceDirectory, ScheduleError, Selection};
use crate::bus::CommandSink;
use crate::geo::{OffsetSource, SolarTimes};
use crate::timer::{DailyTimer, TimerEntry};

/// A problem found while planning one rule.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanIssue {
    pub kind: ActionKind,
    /// The rule's time expression.
    pub expression: String,
    pub error: ScheduleError,
    /// Whether the whole rule was dropped (as opposed to one of its parts).
    pub skipped: bool,
}

impl fmt::Display for PlanIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.skipped {
            write!(f, "{} '{}' skipped: {}", self.kind, self.expression, self.error)
        } else {
            write!(f, "{} '{}': {}", self.kind, self.expression, self.error)
        }
    }
}

/// The triggers one day should arm.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayPlan {
    pub triggers: Vec<ArmedTrigger>,
    pub issues: Vec<PlanIssue>,
}

impl DayPlan {
    /// Log every issue at the level its effect deserves.
    pub fn log_issues(&self) {
        for issue in &self.issues {
            match issue.error {
                ScheduleError::DeviceNotFound(_) => log_error!("{issue}"),
                _ if issue.skipped => log_error!("{issue}"),
                _ => log_warning!("{issue}"),
            }
        }
    }
}

/// Resolve the selected rules into triggers.
///
/// Open rules become `raise` triggers and close rules `lower` triggers, in
/// configured order. A rule whose time does not resolve is skipped; unknown
/// device names are dropped from an otherwise armed rule.
pub fn plan_day(
    selection: &Selection<'_>,
    solar: &Result<SolarTimes, ScheduleError>,
    directory: &DeviceDirectory,
) -> DayPlan {
    let rules = selection
        .open()
        .iter()
        .map(|rule| (ActionKind::Raise, rule))
        .chain(selection.close().iter().map(|rule| (ActionKind::Lower, rule)));

    let mut plan = DayPlan::default();
    for (kind, rule) in rules {
        plan_rule(&mut plan, kind, rule, solar, directory);
    }
    plan
}

fn plan_rule(
    plan: &mut DayPlan,
    kind: ActionKind,
    rule: &ActionRule,
    solar: &Result<SolarTimes, ScheduleError>,
    directory: &DeviceDirectory,
) {
    let issue = |error: ScheduleError, skipped: bool| PlanIssue {
        kind,
        expression: rule.time.clone(),
        error,
        skipped,
    };

    let resolved = match resolve_time(&rule.time, solar, rule.bounds()) {
        Ok(resolved) => resolved,
        Err(error) => {
            plan.issues.push(issue(error, true));
            return;
        }
    };
    plan.issues
        .extend(resolved.warnings.into_iter().map(|w| issue(w, false)));

    let group = directory.resolve_group(&rule.shutters);
    plan.issues
        .extend(group.missing.into_iter().map(|e| issue(e, false)));

    plan.triggers.push(ArmedTrigger {
        at: resolved.time,
        kind,
        addresses: group.addresses,
        shutters: rule.shutters.clone(),
        expression: rule.time.clone(),
    });
}

/// Outcome of swapping a plan into the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildReport {
    /// Entries of the previous generation removed by the clear step.
    pub cleared: usize,
    /// Entries of the new generation.
    pub armed: usize,
}

/// Owner of the armed-trigger generation.
pub struct TriggerRebuilder {
    timer: Box<dyn DailyTimer>,
    sink: Arc<dyn CommandSink>,
    current: Vec<ArmedTrigger>,
}

impl TriggerRebuilder {
    pub fn new(timer: Box<dyn DailyTimer>, sink: Arc<dyn CommandSink>) -> Self {
        Self {
            timer,
            sink,
            current: Vec::new(),
        }
    }

    /// Sink used by triggers armed from now on.
    pub fn set_sink(&mut self, sink: Arc<dyn CommandSink>) {
        self.sink = sink;
    }

    /// Wall clock the armed times are expressed in.
    pub fn set_zone(&mut self, zone: OffsetSource) {
        self.timer.set_zone(zone);
    }

    /// The generation currently armed.
    pub fn current(&self) -> &[ArmedTrigger] {
        &self.current
    }

    /// Replace the armed generation with `triggers`.
    pub fn rebuild(&mut self, triggers: Vec<ArmedTrigger>) -> RebuildReport {
        let entries: Vec<TimerEntry> = triggers
            .iter()
            .map(|trigger| self.timer_entry(trigger))
            .collect();

        let cleared = self.timer.rearm(entries);
        let armed = triggers.len();

        for trigger in &triggers {
            log_indented!(
                "{} at {} for {}",
                trigger.kind,
                trigger.at.format("%H:%M"),
                trigger.shutters.join(", ")
            );
        }
        self.current = triggers;

        RebuildReport { cleared, armed }
    }

    /// Disarm everything.
    pub fn clear(&mut self) -> usize {
        self.current.clear();
        self.timer.clear_all()
    }

    fn timer_entry(&self, trigger: &ArmedTrigger) -> TimerEntry {
        let sink = Arc::clone(&self.sink);
        let kind = trigger.kind;
        let addresses = trigger.addresses.clone();
        TimerEntry {
            at: trigger.at,
            label: trigger.label(),
            callback: Arc::new(move || {
                for address in &addresses {
                    sink.send(address, kind);
                }
            }),
        }
    }
}
