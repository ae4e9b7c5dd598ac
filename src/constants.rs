//! Application-wide constants and defaults.

// # Files

/// Directory name under the XDG config dir.
pub const CONFIG_DIR_NAME: &str = "shutterd";

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "shutterd.toml";

// # Scheduling

/// Wall-clock time of the daily recompute.
pub const DEFAULT_RECOMPUTE_AT: &str = "01:00";

/// How often the thread timer checks for due triggers.
pub const TIMER_TICK_SECS: u64 = 5;

/// Debounce window for config file change events.
pub const WATCHER_DEBOUNCE_MS: u64 = 500;

// # Location defaults written into a freshly generated config

pub const DEFAULT_TIMEZONE: &str = "Europe/Paris";
pub const DEFAULT_LATITUDE: f64 = 48.8566;
pub const DEFAULT_LONGITUDE: f64 = 2.3522;

// # Validation limits

pub const MINIMUM_LATITUDE: f64 = -90.0;
pub const MAXIMUM_LATITUDE: f64 = 90.0;
pub const MINIMUM_LONGITUDE: f64 = -180.0;
pub const MAXIMUM_LONGITUDE: f64 = 180.0;

/// Fixed UTC offsets are bounded by the real-world extremes (UTC-12 to UTC+14).
pub const MINIMUM_UTC_OFFSET: f64 = -12.0;
pub const MAXIMUM_UTC_OFFSET: f64 = 14.0;

// # Exit code

pub const EXIT_FAILURE: i32 = 1;

/// Weekday names accepted in `days = [...]`.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
