//! Daemon main loop.
//!
//! The loop owns the active configuration and an [`Engine`]. It recomputes
//! the schedule:
//!
//! - once at startup,
//! - every day at the configured `recompute_at` time,
//! - whenever a [`SignalMessage::Reload`] arrives (SIGUSR2 or a config file
//!   change).
//!
//! All triggers arrive on one channel and are handled one at a time, and the
//! engine serialises cycles on top of that, so a recompute always completes
//! before the next one starts.

pub mod engine;

use anyhow::Result;
use chrono::{Duration as ChronoDuration, NaiveDateTime};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use crate::config::{self, Config};
use crate::io::signals::{SignalMessage, SignalState};
use crate::time_source::TimeSource;
use crate::timer::next_occurrence;

pub use engine::{DayOutline, Engine, plan_day_for};

/// Dependencies of a [`Core`].
pub struct CoreParams {
    pub config: Config,
    /// File reloaded on [`SignalMessage::Reload`]; reloads are ignored without one.
    pub config_path: Option<PathBuf>,
    pub signal_state: SignalState,
    pub clock: Arc<dyn TimeSource>,
    pub engine: Engine,
}

/// Main loop state.
pub struct Core {
    config: Config,
    config_path: Option<PathBuf>,
    signal_state: SignalState,
    clock: Arc<dyn TimeSource>,
    engine: Engine,
}

/// Next daily recompute after the current minute.
///
/// `now` is the wall clock at the configured location.
pub fn next_recompute(config: &Config, now: NaiveDateTime) -> NaiveDateTime {
    next_occurrence(config.recompute_time(), now + ChronoDuration::minutes(1))
}

impl Core {
    pub fn new(params: CoreParams) -> Self {
        Self {
            config: params.config,
            config_path: params.config_path,
            signal_state: params.signal_state,
            clock: params.clock,
            engine: params.engine,
        }
    }

    /// Run until a shutdown message arrives or every sender is gone.
    pub fn execute(mut self) -> Result<()> {
        self.recompute();

        while self.signal_state.running.load(Ordering::SeqCst) {
            let now = self.wall_clock();
            let next = next_recompute(&self.config, now);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            log_debug!(
                "Next daily recompute at {} (in {}s)",
                next.format("%Y-%m-%d %H:%M"),
                wait.as_secs()
            );

            match self.signal_state.signal_receiver.recv_timeout(wait) {
                Ok(SignalMessage::Reload) => self.reload(),
                Ok(SignalMessage::Shutdown) => break,
                Err(RecvTimeoutError::Timeout) => self.recompute(),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let cleared = self.engine.clear();
        log_block_start!("Disarmed {cleared} triggers");
        Ok(())
    }

    /// Wall clock at the configured location, which need not be the host's zone.
    fn wall_clock(&self) -> NaiveDateTime {
        self.config.wall_clock(self.clock.now())
    }

    fn recompute(&self) {
        let today = self.wall_clock().date();
        if let Err(e) = self.engine.recompute(&self.config, today) {
            log_pipe!();
            log_error!("Recompute failed: {e:#}");
        }
    }

    /// Reload the configuration file and recompute.
    ///
    /// A file that fails to load leaves the previous configuration (and the
    /// triggers armed from it) in place.
    fn reload(&mut self) {
        let Some(path) = self.config_path.clone() else {
            log_debug!("Reload requested without a configuration file, ignoring");
            return;
        };

        match config::load_from_path(&path) {
            Ok(new_config) => {
                log_block_start!("Configuration reloaded");
                new_config.log_config(Some(&path));
                self.config = new_config;
                self.recompute();
            }
            Err(e) => {
                log_pipe!();
                log_error!("Failed to reload configuration: {e:#}");
                log_indented!("Keeping the previous configuration");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::LogSink;
    use crate::logger::Log;
    use crate::time_source::ManualTimeSource;
    use crate::timer::ThreadTimer;
    use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
    use std::fs;
    use std::sync::atomic::AtomicBool;
    use tempfile::tempdir;

    const WEEKDAY_CONFIG: &str = r#"
utc_offset = 0.0
latitude = 48.85
longitude = 2.35

[devices]
living = "addr-living"

[[schedules]]
days = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
open = [{ shutters = ["living"], time = "08:00" }]
"#;

    const CHANGED_CONFIG: &str = r#"
utc_offset = 0.0
latitude = 48.85
longitude = 2.35

[devices]
living = "addr-living"

[[schedules]]
days = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
open = [{ shutters = ["living"], time = "09:15" }]
close = [{ shutters = ["living"], time = "20:00" }]
"#;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn core_with(
        path: Option<PathBuf>,
        config: Config,
    ) -> (Core, Engine, std::sync::mpsc::Sender<SignalMessage>) {
        let start = Local.with_ymd_and_hms(2024, 5, 6, 6, 0, 0).unwrap();
        let (core, engine, sender, _timer) = core_starting_at(path, config, start);
        (core, engine, sender)
    }

    fn core_starting_at(
        path: Option<PathBuf>,
        config: Config,
        start: DateTime<Local>,
    ) -> (
        Core,
        Engine,
        std::sync::mpsc::Sender<SignalMessage>,
        ThreadTimer,
    ) {
        let clock: Arc<dyn TimeSource> = Arc::new(ManualTimeSource::new(start));
        let (sender, receiver) = std::sync::mpsc::channel();
        let signal_state = SignalState {
            running: Arc::new(AtomicBool::new(true)),
            signal_receiver: receiver,
            signal_sender: sender.clone(),
        };
        let timer = ThreadTimer::new(Arc::clone(&clock));
        let engine = Engine::new(Box::new(timer.clone()), Arc::new(LogSink));
        let core = Core::new(CoreParams {
            config,
            config_path: path,
            signal_state,
            clock,
            engine: engine.clone(),
        });
        (core, engine, sender, timer)
    }

    #[test]
    fn test_next_recompute_is_strictly_later() {
        let config: Config = toml::from_str(WEEKDAY_CONFIG).unwrap();
        let day = chrono::NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();

        let before = next_recompute(&config, day.and_time(hm(0, 30)));
        assert_eq!(before, day.and_time(hm(1, 0)));

        let at = next_recompute(&config, day.and_time(hm(1, 0)));
        assert_eq!(at, day.succ_opt().unwrap().and_time(hm(1, 0)));

        // Woken a fraction late: still never the same minute again.
        let late = day.and_time(hm(1, 0)) + ChronoDuration::milliseconds(300);
        assert_eq!(
            next_recompute(&config, late),
            day.succ_opt().unwrap().and_time(hm(1, 0))
        );

        let just_before = day.and_time(hm(0, 59)) + ChronoDuration::seconds(30);
        assert_eq!(next_recompute(&config, just_before), day.and_time(hm(1, 0)));
    }

    #[test]
    fn test_recompute_uses_configured_zone() {
        Log::set_enabled(false);
        // Sunday 20:00 UTC is Monday 05:00 in Tokyo.
        let mut config: Config = toml::from_str(&WEEKDAY_CONFIG.replace(
            "utc_offset = 0.0",
            "timezone = \"Asia/Tokyo\"",
        ))
        .unwrap();
        config.schedules[0].days = vec!["Monday".to_string()];
        let start = Utc
            .with_ymd_and_hms(2024, 5, 5, 20, 0, 0)
            .unwrap()
            .with_timezone(&Local);

        let (core, engine, _sender, timer) = core_starting_at(None, config, start);
        core.recompute();
        Log::set_enabled(true);

        assert_eq!(engine.armed().len(), 1);
        let monday = chrono::NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(timer.pending()[0].1, monday.and_time(hm(8, 0)));
    }

    #[test]
    fn test_failed_reload_keeps_previous_config() {
        Log::set_enabled(false);
        let dir = tempdir().unwrap();
        let path = dir.path().join("shutterd.toml");
        fs::write(&path, WEEKDAY_CONFIG).unwrap();
        let config = config::load_from_path(&path).unwrap();

        let (mut core, engine, _sender) = core_with(Some(path.clone()), config.clone());
        core.recompute();

        fs::write(&path, "latitude = [").unwrap();
        core.reload();
        Log::set_enabled(true);

        assert_eq!(core.config, config);
        let armed = engine.armed();
        assert_eq!(armed.len(), 1);
        assert_eq!(armed[0].at, hm(8, 0));
    }

    #[test]
    fn test_successful_reload_replaces_generation() {
        Log::set_enabled(false);
        let dir = tempdir().unwrap();
        let path = dir.path().join("shutterd.toml");
        fs::write(&path, WEEKDAY_CONFIG).unwrap();
        let config = config::load_from_path(&path).unwrap();

        let (mut core, engine, _sender) = core_with(Some(path.clone()), config);
        core.recompute();

        fs::write(&path, CHANGED_CONFIG).unwrap();
        core.reload();
        Log::set_enabled(true);

        let times: Vec<_> = engine.armed().iter().map(|t| t.at).collect();
        assert_eq!(times, vec![hm(9, 15), hm(20, 0)]);
    }

    #[test]
    fn test_shutdown_message_disarms() {
        Log::set_enabled(false);
        let config: Config = toml::from_str(WEEKDAY_CONFIG).unwrap();
        let (core, engine, sender) = core_with(None, config);
        sender.send(SignalMessage::Reload).unwrap();
        sender.send(SignalMessage::Shutdown).unwrap();
        core.execute().unwrap();
        Log::set_enabled(true);

        assert!(engine.armed().is_empty());
    }

    #[test]
    fn test_disconnected_channel_stops_loop() {
        Log::set_enabled(false);
        let config: Config = toml::from_str(WEEKDAY_CONFIG).unwrap();
        let (mut core, _engine, sender) = core_with(None, config);
        drop(sender);
        // Drop the loop's own sender too so the channel disconnects.
        let (replacement, _) = std::sync::mpsc::channel();
        core.signal_state.signal_sender = replacement;
        core.execute().unwrap();
        Log::set_enabled(true);
    }
}
