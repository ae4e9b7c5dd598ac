//! Configuration for shutterd.
//!
//! The daemon reads one TOML file, by default
//! `$XDG_CONFIG_HOME/shutterd/shutterd.toml` (or the directory given with
//! `--config`). When the file does not exist a commented default is written
//! and the daemon asks the operator to edit it.
//!
//! ```toml
//! timezone = "Europe/Paris"    # IANA zone; or utc_offset = 1.0
//! latitude = 48.8566
//! longitude = 2.3522
//! recompute_at = "01:00"       # Daily recompute time
//!
//! [bus]
//! command = "/usr/local/bin/xaal-shutter"   # Run as: <command> <address> <up|down>
//!
//! [devices]
//! living = "0a1b2c3d-..."
//!
//! [events]
//! vacation = false
//!
//! [[schedules]]
//! days = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"]
//! open = [{ shutters = ["living"], time = "sunrise", min = "07:00" }]
//! close = [{ shutters = ["living"], time = "sunset+15", max = "21:30" }]
//!
//! [[schedules]]
//! event = "vacation"
//! close = [{ shutters = ["living"], time = "sunset" }]
//! ```
//!
//! Structural problems (coordinates, timezone, recompute time) are rejected
//! by [`validation`]. Time expressions are only checked when they are
//! resolved, so one bad rule never prevents the rest of the file from loading.
//!
//! The file is watched for changes ([`watcher`]); a reload that fails keeps
//! the previous configuration.

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;

use anyhow::{Result, bail};
use chrono::{DateTime, Local, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::bus::{CommandSink, ExecSink, LogSink};
use crate::constants::DEFAULT_RECOMPUTE_AT;
use crate::geo::{Location, OffsetSource};
use crate::schedule::expression::parse_clock_time;
use crate::schedule::{DaySchedule, DeviceDirectory, EventState};

pub use builder::create_default_config;
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};
pub use watcher::start_config_watcher;

/// Message bus settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BusConfig {
    /// Program run for every shutter command. Commands are only logged when absent.
    pub command: Option<String>,
}

/// Parsed configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// IANA timezone of the location, e.g. `Europe/Paris`.
    pub timezone: Option<String>,
    /// Fixed UTC offset in hours, used when no timezone is given.
    pub utc_offset: Option<f64>,
    pub latitude: f64,
    pub longitude: f64,
    /// Wall-clock time of the daily recompute (`HH:MM`).
    pub recompute_at: Option<String>,
    #[serde(default)]
    pub bus: BusConfig,
    /// Logical shutter name → bus address.
    #[serde(default)]
    pub devices: BTreeMap<String, String>,
    #[serde(default)]
    pub events: EventState,
    #[serde(default)]
    pub schedules: Vec<DaySchedule>,
}

impl Config {
    /// Location used for solar calculations.
    pub fn location(&self) -> Result<Location> {
        let offset = match (&self.timezone, self.utc_offset) {
            (Some(name), _) => match name.parse::<Tz>() {
                Ok(tz) => OffsetSource::Zone(tz),
                Err(_) => bail!("Unknown timezone '{name}'"),
            },
            (None, Some(hours)) => OffsetSource::Fixed(hours),
            (None, None) => bail!("Either 'timezone' or 'utc_offset' must be set"),
        };
        Ok(Location::new(self.latitude, self.longitude, offset))
    }

    /// Wall-clock reading of `now` at the configured location.
    ///
    /// Falls back to the host clock only for a configuration that failed
    /// validation.
    pub fn wall_clock(&self, now: DateTime<Local>) -> NaiveDateTime {
        match self.location() {
            Ok(location) => location.offset.wall_clock(&now),
            Err(_) => now.naive_local(),
        }
    }

    /// Time of the daily recompute, falling back to the default.
    pub fn recompute_time(&self) -> NaiveTime {
        self.recompute_at
            .as_deref()
            .and_then(parse_clock_time)
            .or_else(|| parse_clock_time(DEFAULT_RECOMPUTE_AT))
            .unwrap_or(NaiveTime::MIN)
    }

    pub fn device_directory(&self) -> DeviceDirectory {
        DeviceDirectory::new(self.devices.clone())
    }

    /// Sink the armed triggers deliver their commands to.
    pub fn command_sink(&self) -> Arc<dyn CommandSink> {
        match self.bus.command.as_deref().map(str::trim) {
            Some(command) if !command.is_empty() => Arc::new(ExecSink::new(command)),
            _ => Arc::new(LogSink),
        }
    }

    /// Print a short summary of the loaded configuration.
    pub fn log_config(&self, path: Option<&std::path::Path>) {
        log_block_start!("Loaded configuration");
        if let Some(path) = path {
            log_indented!("File: {}", path.display());
        }
        match (&self.timezone, self.utc_offset) {
            (Some(tz), _) => log_indented!("Timezone: {tz}"),
            (None, Some(hours)) => log_indented!("UTC offset: {hours:+}h"),
            (None, None) => {}
        }
        log_indented!(
            "Location: {:.4}°{}, {:.4}°{}",
            self.latitude.abs(),
            if self.latitude >= 0.0 { "N" } else { "S" },
            self.longitude.abs(),
            if self.longitude >= 0.0 { "E" } else { "W" }
        );
        log_indented!("Daily recompute: {}", self.recompute_time().format("%H:%M"));
        log_indented!(
            "Bus: {}",
            self.bus
                .command
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or("log only")
        );
        log_indented!(
            "{} devices, {} schedules, {} events",
            self.devices.len(),
            self.schedules.len(),
            self.events.len()
        );
    }
}
