//! Rule selection.
//!
//! Exactly one [`DaySchedule`] governs a day. The list is scanned in
//! configured order:
//!
//! 1. the first entry listing today's weekday is the weekday candidate, and
//!    without an active event it is selected right away;
//! 2. with an active event, the first entry carrying that event label wins
//!    over the weekday candidate;
//! 3. if nothing matches, the day has no actions.

use std::ops::ControlFlow;

use super::{ActionRule, DaySchedule, EventState};

/// Why a schedule was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedBy {
    Weekday,
    Event,
    /// No entry matched; the day is empty.
    Nothing,
}

/// Outcome of rule selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<'a> {
    pub schedule: Option<&'a DaySchedule>,
    /// Position of the selected entry in the configured list.
    pub index: Option<usize>,
    pub matched_by: MatchedBy,
}

impl<'a> Selection<'a> {
    fn none() -> Self {
        Self {
            schedule: None,
            index: None,
            matched_by: MatchedBy::Nothing,
        }
    }

    pub fn open(&self) -> &'a [ActionRule] {
        self.schedule.map_or(&[], |s| s.open.as_slice())
    }

    pub fn close(&self) -> &'a [ActionRule] {
        self.schedule.map_or(&[], |s| s.close.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.open().is_empty() && self.close().is_empty()
    }
}

#[derive(Default)]
struct Scan<'a> {
    weekday: Option<(usize, &'a DaySchedule)>,
    event: Option<(usize, &'a DaySchedule)>,
}

/// Select the governing schedule for `weekday` and `active_event`.
///
/// `active_event` is empty when no event is active.
pub fn select_schedule<'a>(
    schedules: &'a [DaySchedule],
    weekday: &str,
    active_event: &str,
) -> Selection<'a> {
    let event_active = !active_event.is_empty();

    let scan = schedules
        .iter()
        .enumerate()
        .try_fold(Scan::default(), |mut scan, (index, entry)| {
            if scan.weekday.is_none() && entry.days.iter().any(|day| day == weekday) {
                scan.weekday = Some((index, entry));
            }
            if event_active
                && scan.event.is_none()
                && entry.event.as_deref() == Some(active_event)
            {
                scan.event = Some((index, entry));
            }

            let settled = if event_active {
                scan.event.is_some()
            } else {
                scan.weekday.is_some()
            };
            if settled {
                ControlFlow::Break(scan)
            } else {
                ControlFlow::Continue(scan)
            }
        });
    let scan = match scan {
        ControlFlow::Break(scan) | ControlFlow::Continue(scan) => scan,
    };

    match (scan.event, scan.weekday) {
        (Some((index, entry)), _) => Selection {
            schedule: Some(entry),
            index: Some(index),
            matched_by: MatchedBy::Event,
        },
        (None, Some((index, entry))) => Selection {
            schedule: Some(entry),
            index: Some(index),
            matched_by: MatchedBy::Weekday,
        },
        (None, None) => Selection::none(),
    }
}

/// The active event derived from the event flags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActiveEvent<'a> {
    /// Empty when no event is active.
    pub label: &'a str,
    /// Other labels that were also flagged active and are ignored.
    pub ignored: Vec<&'a str>,
}

/// Pick the active event: the first flagged label in lexicographic order.
pub fn active_event(events: &EventState) -> ActiveEvent<'_> {
    let mut active = events
        .iter()
        .filter(|(label, on)| **on && !label.is_empty())
        .map(|(label, _)| label.as_str());

    match active.next() {
        Some(label) => ActiveEvent {
            label,
            ignored: active.collect(),
        },
        None => ActiveEvent::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(time: &str) -> ActionRule {
        ActionRule {
            shutters: vec!["living".to_string()],
            time: time.to_string(),
            min: None,
            max: None,
        }
    }

    fn weekdays(days: &[&str], open: &str) -> DaySchedule {
        DaySchedule {
            days: days.iter().map(|d| d.to_string()).collect(),
            event: None,
            open: vec![rule(open)],
            close: vec![],
        }
    }

    fn event(label: &str, open: &str) -> DaySchedule {
        DaySchedule {
            days: vec![],
            event: Some(label.to_string()),
            open: vec![rule(open)],
            close: vec![],
        }
    }

    const WORKDAYS: [&str; 5] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

    #[test]
    fn test_weekday_match_without_event() {
        let schedules = vec![
            weekdays(&WORKDAYS, "07:00"),
            weekdays(&["Saturday", "Sunday"], "09:00"),
        ];
        let selection = select_schedule(&schedules, "Saturday", "");
        assert_eq!(selection.matched_by, MatchedBy::Weekday);
        assert_eq!(selection.index, Some(1));
        assert_eq!(selection.open()[0].time, "09:00");
    }

    #[test]
    fn test_first_weekday_match_wins() {
        let schedules = vec![
            weekdays(&["Monday"], "06:00"),
            weekdays(&WORKDAYS, "07:00"),
        ];
        let selection = select_schedule(&schedules, "Monday", "");
        assert_eq!(selection.index, Some(0));
    }

    #[test]
    fn test_event_overrides_weekday() {
        let schedules = vec![weekdays(&WORKDAYS, "07:00"), event("vacation", "10:00")];
        let selection = select_schedule(&schedules, "Wednesday", "vacation");
        assert_eq!(selection.matched_by, MatchedBy::Event);
        assert_eq!(selection.open()[0].time, "10:00");
    }

    #[test]
    fn test_event_listed_before_weekday_still_wins() {
        let schedules = vec![event("away", "11:00"), weekdays(&WORKDAYS, "07:00")];
        let selection = select_schedule(&schedules, "Monday", "away");
        assert_eq!(selection.index, Some(0));
        assert_eq!(selection.matched_by, MatchedBy::Event);
    }

    #[test]
    fn test_unknown_event_falls_back_to_weekday() {
        let schedules = vec![weekdays(&WORKDAYS, "07:00"), event("vacation", "10:00")];
        let selection = select_schedule(&schedules, "Tuesday", "party");
        assert_eq!(selection.matched_by, MatchedBy::Weekday);
        assert_eq!(selection.open()[0].time, "07:00");
    }

    #[test]
    fn test_first_event_match_wins() {
        let schedules = vec![event("vacation", "10:00"), event("vacation", "12:00")];
        let selection = select_schedule(&schedules, "Sunday", "vacation");
        assert_eq!(selection.index, Some(0));
    }

    #[test]
    fn test_event_entries_ignored_without_active_event() {
        let schedules = vec![event("vacation", "10:00")];
        let selection = select_schedule(&schedules, "Sunday", "");
        assert_eq!(selection.matched_by, MatchedBy::Nothing);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let schedules = vec![weekdays(&WORKDAYS, "07:00")];
        let selection = select_schedule(&schedules, "Sunday", "");
        assert_eq!(selection.schedule, None);
        assert!(selection.open().is_empty());
        assert!(selection.close().is_empty());
    }

    #[test]
    fn test_empty_table() {
        let selection = select_schedule(&[], "Monday", "vacation");
        assert_eq!(selection.matched_by, MatchedBy::Nothing);
    }

    #[test]
    fn test_active_event_none() {
        let mut events = EventState::new();
        events.insert("vacation".to_string(), false);
        assert_eq!(active_event(&events).label, "");
    }

    #[test]
    fn test_active_event_single() {
        let mut events = EventState::new();
        events.insert("vacation".to_string(), true);
        events.insert("away".to_string(), false);
        let active = active_event(&events);
        assert_eq!(active.label, "vacation");
        assert!(active.ignored.is_empty());
    }

    #[test]
    fn test_active_event_multiple_picks_first_label() {
        let mut events = EventState::new();
        events.insert("vacation".to_string(), true);
        events.insert("away".to_string(), true);
        let active = active_event(&events);
        assert_eq!(active.label, "away");
        assert_eq!(active.ignored, vec!["vacation"]);
    }
}
