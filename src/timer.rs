//! Daily timer primitive.
//!
//! A [`DailyTimer`] holds a table of time-of-day entries, each firing its
//! callback once per day. [`ThreadTimer`] is the implementation used by the
//! daemon: a background thread polls the table every [`TIMER_TICK_SECS`]
//! seconds and runs whatever has come due.
//!
//! Generation swaps go through [`DailyTimer::rearm`]. `ThreadTimer` replaces
//! the whole table under the same lock the polling thread picks due entries
//! under, so an entry of the old table can never be picked once the swap has
//! started and an entry of the new table cannot be picked before it has
//! finished.
//!
//! Entry times are wall-clock times at the configured location
//! ([`DailyTimer::set_zone`]), not in the zone the host happens to run in.

use chrono::{Days, NaiveDateTime, NaiveTime, Timelike};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::constants::TIMER_TICK_SECS;
use crate::geo::OffsetSource;
use crate::time_source::TimeSource;

/// Action run when an entry fires.
pub type TriggerCallback = Arc<dyn Fn() + Send + Sync>;

/// One daily entry to arm.
#[derive(Clone)]
pub struct TimerEntry {
    pub at: NaiveTime,
    pub label: String,
    pub callback: TriggerCallback,
}

impl std::fmt::Debug for TimerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEntry")
            .field("at", &self.at)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// A timer that runs entries once per day at a fixed time-of-day.
pub trait DailyTimer: Send {
    /// Remove every armed entry, returning how many were removed.
    fn clear_all(&mut self) -> usize;

    /// Arm one entry.
    fn arm(&mut self, entry: TimerEntry);

    /// Clock that entry times are read against from now on.
    fn set_zone(&mut self, zone: OffsetSource);

    /// Replace the whole table with `entries`, returning how many entries
    /// the old table held.
    ///
    /// Implementations that fire from another thread must override this to
    /// make the swap atomic.
    fn rearm(&mut self, entries: Vec<TimerEntry>) -> usize {
        let cleared = self.clear_all();
        for entry in entries {
            self.arm(entry);
        }
        cleared
    }
}

struct Slot {
    entry: TimerEntry,
    next_run: NaiveDateTime,
}

#[derive(Default)]
struct Table {
    /// Host clock when unset.
    zone: Option<OffsetSource>,
    slots: Vec<Slot>,
}

/// Next run of a daily entry at `at`, counted from `now`.
///
/// Today if `at` falls in or after the current minute, otherwise tomorrow.
pub fn next_occurrence(at: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today >= truncate_to_minute(now) {
        today
    } else {
        now.date()
            .checked_add_days(Days::new(1))
            .map_or(today, |tomorrow| tomorrow.and_time(at))
    }
}

fn truncate_to_minute(now: NaiveDateTime) -> NaiveDateTime {
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

/// Polling timer driven by a background thread.
///
/// Clones share the same table, so a clone kept outside the rebuilder can
/// drive or inspect the timer.
#[derive(Clone)]
pub struct ThreadTimer {
    table: Arc<Mutex<Table>>,
    clock: Arc<dyn TimeSource>,
}

impl ThreadTimer {
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            table: Arc::new(Mutex::new(Table::default())),
            clock,
        }
    }

    /// Spawn the polling thread. It stops once `running` turns false.
    pub fn start(&self, running: Arc<AtomicBool>) -> JoinHandle<()> {
        let timer = self.clone();
        thread::spawn(move || {
            let tick = Duration::from_secs(TIMER_TICK_SECS);
            while running.load(Ordering::SeqCst) {
                timer.tick();
                timer.clock.sleep(tick);
            }
            log_debug!("Timer thread stopped");
        })
    }

    /// Fire every entry that has come due, returning how many fired.
    ///
    /// Due entries are rescheduled under the lock and their callbacks run
    /// after it is released, so a slow sink never holds up a rebuild.
    pub fn tick(&self) -> usize {
        let due: Vec<TimerEntry> = {
            let mut table = self.lock();
            let now = self.wall_clock(table.zone.as_ref());
            table
                .slots
                .iter_mut()
                .filter(|slot| slot.next_run <= now)
                .map(|slot| {
                    slot.next_run =
                        next_occurrence(slot.entry.at, now + chrono::Duration::minutes(1));
                    slot.entry.clone()
                })
                .collect()
        };

        for entry in &due {
            log_debug!("Firing {}", entry.label);
            (entry.callback)();
        }
        due.len()
    }

    /// Snapshot of the armed entries as (time, next run, label), earliest first.
    pub fn pending(&self) -> Vec<(NaiveTime, NaiveDateTime, String)> {
        let mut pending: Vec<_> = self
            .lock()
            .slots
            .iter()
            .map(|slot| (slot.entry.at, slot.next_run, slot.entry.label.clone()))
            .collect();
        pending.sort_by_key(|(_, next_run, _)| *next_run);
        pending
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        // A panicking callback must not take the whole timer down with it.
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wall_clock(&self, zone: Option<&OffsetSource>) -> NaiveDateTime {
        let now = self.clock.now();
        match zone {
            Some(zone) => zone.wall_clock(&now),
            None => now.naive_local(),
        }
    }
}

impl DailyTimer for ThreadTimer {
    fn clear_all(&mut self) -> usize {
        let mut table = self.lock();
        let cleared = table.slots.len();
        table.slots.clear();
        cleared
    }

    fn arm(&mut self, entry: TimerEntry) {
        let mut table = self.lock();
        let now = self.wall_clock(table.zone.as_ref());
        let next_run = next_occurrence(entry.at, now);
        table.slots.push(Slot { entry, next_run });
    }

    fn set_zone(&mut self, zone: OffsetSource) {
        self.lock().zone = Some(zone);
    }

    /// An entry identical to one of the old table (same time and label)
    /// keeps that slot's next run, so a swap landing in the entry's own
    /// minute neither drops nor repeats today's run.
    fn rearm(&mut self, entries: Vec<TimerEntry>) -> usize {
        let mut table = self.lock();
        let now = self.wall_clock(table.zone.as_ref());
        let old = std::mem::take(&mut table.slots);

        table.slots = entries
            .into_iter()
            .map(|entry| {
                let next_run = old
                    .iter()
                    .find(|slot| slot.entry.at == entry.at && slot.entry.label == entry.label)
                    .map_or_else(|| next_occurrence(entry.at, now), |slot| slot.next_run);
                Slot { entry, next_run }
            })
            .collect();
        old.len()
    }
}
