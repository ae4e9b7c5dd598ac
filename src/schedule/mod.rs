//! Schedule resolution engine.
//!
//! Turns the declarative shutter schedule into today's armed triggers:
//!
//! - [`expression`]: parses `HH:MM` / `sunrise±N` / `sunset±N` and resolves
//!   them against the day's solar times and the rule's min/max bounds
//! - [`selector`]: picks the single day schedule that governs today, by
//!   weekday or by active event
//! - [`directory`]: maps logical shutter names to bus addresses
//! - [`rebuilder`]: builds the day's trigger plan and swaps it into the
//!   daily timer as one generation
//!
//! All failures are per action, per bound or per device name
//! ([`ScheduleError`]); none of them stops the rest of the day from arming.

pub mod directory;
pub mod error;
pub mod expression;
pub mod rebuilder;
pub mod selector;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

pub use directory::{DeviceDirectory, GroupResolution};
pub use error::ScheduleError;
pub use expression::{Bounds, Resolved, SunEvent, TimeExpression, resolve_time};
pub use rebuilder::{DayPlan, PlanIssue, RebuildReport, TriggerRebuilder, plan_day};
pub use selector::{ActiveEvent, MatchedBy, Selection, active_event, select_schedule};

/// Label → active flag for operator overrides such as `vacation`.
pub type EventState = BTreeMap<String, bool>;

/// What a trigger does to its shutters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Open the shutters (an `open` rule).
    Raise,
    /// Close the shutters (a `close` rule).
    Lower,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Raise => "raise",
            ActionKind::Lower => "lower",
        }
    }

    /// Action name understood by the shutter devices on the bus.
    pub fn bus_action(&self) -> &'static str {
        match self {
            ActionKind::Raise => "up",
            ActionKind::Lower => "down",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timed action on a group of shutters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ActionRule {
    /// Logical device names, resolved through the [`DeviceDirectory`].
    #[serde(default)]
    pub shutters: Vec<String>,
    /// Time expression (`07:30`, `sunrise`, `sunset-20`, ...).
    pub time: String,
    /// Never fire before this clock time (sun-relative expressions only).
    #[serde(default)]
    pub min: Option<String>,
    /// Never fire after this clock time (sun-relative expressions only).
    #[serde(default)]
    pub max: Option<String>,
}

impl ActionRule {
    pub fn bounds(&self) -> Bounds<'_> {
        Bounds {
            min: self.min.as_deref(),
            max: self.max.as_deref(),
        }
    }
}

/// Rules for the days (or the event) an entry applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct DaySchedule {
    /// English weekday names, `Monday` .. `Sunday`.
    #[serde(default)]
    pub days: Vec<String>,
    /// Event label that selects this entry while the event is active.
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub open: Vec<ActionRule>,
    #[serde(default)]
    pub close: Vec<ActionRule>,
}

/// A trigger registered with the daily timer for the current generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArmedTrigger {
    #[serde(serialize_with = "serialize_hhmm")]
    pub at: NaiveTime,
    pub kind: ActionKind,
    /// Resolved bus addresses, in rule order.
    pub addresses: Vec<String>,
    /// Logical names from the rule, for operator-facing output.
    pub shutters: Vec<String>,
    /// The expression the time was resolved from.
    pub expression: String,
}

impl ArmedTrigger {
    /// Short label used by the timer and in logs.
    pub fn label(&self) -> String {
        format!(
            "{} {} [{}]",
            self.at.format("%H:%M"),
            self.kind,
            self.shutters.join(", ")
        )
    }
}

fn serialize_hhmm<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.format("%H:%M").to_string())
}

/// English name of a weekday as used in `days = [...]`.
pub fn weekday_name(weekday: chrono::Weekday) -> &'static str {
    use chrono::Weekday;
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
