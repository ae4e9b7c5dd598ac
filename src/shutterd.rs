//! Daemon coordinator.
//!
//! Acquires everything the main loop needs and hands it to [`Core`]:
//! configuration, signal handling, the config watcher, the timer thread and
//! the engine with its command sink.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::config;
use crate::core::{Core, CoreParams, Engine};
use crate::io::signals::setup_signal_handler;
use crate::logger::Log;
use crate::time_source;
use crate::timer::ThreadTimer;

/// Builder for running the daemon.
///
/// ```no_run
/// # fn main() -> anyhow::Result<()> {
/// shutterd::Shutterd::new(false).run()?;
/// # Ok(())
/// # }
/// ```
pub struct Shutterd {
    debug_enabled: bool,
}

impl Shutterd {
    pub fn new(debug_enabled: bool) -> Self {
        Self { debug_enabled }
    }

    /// Run until a shutdown signal arrives.
    pub fn run(self) -> Result<()> {
        Log::set_debug_enabled(self.debug_enabled);

        log_version!();
        if self.debug_enabled {
            log_pipe!();
            log_debug!("Debug mode enabled");
        }

        let (config, config_path) = config::load().context("Configuration failed")?;
        config.log_config(Some(&config_path));

        let signal_state = setup_signal_handler()?;

        if let Err(e) =
            config::start_config_watcher(signal_state.signal_sender.clone(), config_path.clone())
        {
            log_pipe!();
            log_warning!("Config file watching unavailable: {e:#}");
            log_indented!("Hot reload disabled, send SIGUSR2 to reload manually");
        }

        let clock = time_source::global();
        let timer = ThreadTimer::new(Arc::clone(&clock));
        let running = Arc::clone(&signal_state.running);
        let timer_thread = timer.start(Arc::clone(&running));

        let engine = Engine::new(Box::new(timer), config.command_sink());

        log_block_start!("Starting shutterd...");
        let result = Core::new(CoreParams {
            config,
            config_path: Some(config_path),
            signal_state,
            clock,
            engine,
        })
        .execute();

        running.store(false, Ordering::SeqCst);
        if timer_thread.join().is_err() {
            log_warning!("Timer thread panicked");
        }

        log_end!();
        result
    }
}
