//! Time source abstraction.
//!
//! The daemon loop, the thread timer and the logger all ask this module for
//! "now" instead of calling `Local::now()` directly, so tests can pin the clock
//! and drive the scheduler through a day without waiting for it.

use chrono::{DateTime, Duration as ChronoDuration, Local};
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

/// Process-wide clock.
static TIME_SOURCE: Lazy<Arc<dyn TimeSource>> = Lazy::new(|| Arc::new(RealTimeSource));

/// Trait for abstracting time operations
pub trait TimeSource: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Local>;

    /// Sleep for the specified duration (or pretend to)
    fn sleep(&self, duration: StdDuration);
}

/// Real-time implementation that uses actual system time
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }
}

/// Manually driven clock.
///
/// `sleep` advances the clock by the requested duration instead of blocking
/// (with a 1 ms real yield so other threads get to run).
pub struct ManualTimeSource {
    current: Mutex<DateTime<Local>>,
}

impl ManualTimeSource {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Jump the clock to an absolute time.
    pub fn set(&self, time: DateTime<Local>) {
        if let Ok(mut guard) = self.current.lock() {
            *guard = time;
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: ChronoDuration) {
        if let Ok(mut guard) = self.current.lock() {
            *guard += by;
        }
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Local> {
        self.current
            .lock()
            .map(|guard| *guard)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }

    fn sleep(&self, duration: StdDuration) {
        let step = ChronoDuration::from_std(duration).unwrap_or(ChronoDuration::zero());
        self.advance(step);
        std::thread::sleep(StdDuration::from_millis(1));
    }
}

/// The process-wide clock.
pub fn global() -> Arc<dyn TimeSource> {
    Arc::clone(&TIME_SOURCE)
}

/// Get the current time from the global time source
pub fn now() -> DateTime<Local> {
    TIME_SOURCE.now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_source_sleep_advances_clock() {
        let start = Local.with_ymd_and_hms(2024, 3, 10, 6, 0, 0).unwrap();
        let clock = ManualTimeSource::new(start);

        clock.sleep(StdDuration::from_secs(90));

        assert_eq!(clock.now(), start + ChronoDuration::seconds(90));
    }

    #[test]
    fn test_manual_source_set() {
        let start = Local.with_ymd_and_hms(2024, 3, 10, 6, 0, 0).unwrap();
        let later = Local.with_ymd_and_hms(2024, 3, 11, 1, 0, 0).unwrap();
        let clock = ManualTimeSource::new(start);

        clock.set(later);

        assert_eq!(clock.now(), later);
    }
}
