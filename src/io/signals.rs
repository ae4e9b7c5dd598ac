//! Unix signal handling.
//!
//! Signals are turned into [`SignalMessage`]s on the same channel the config
//! watcher posts to, so the main loop has a single place to wait on:
//!
//! - `SIGUSR2`: reload the configuration and recompute the schedule
//! - `SIGINT`, `SIGTERM`, `SIGHUP`: shut down

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR2},
    iterator::Signals,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread;

/// Messages delivered to the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMessage {
    /// Reload the configuration and recompute (SIGUSR2 or a file change).
    Reload,
    /// Stop the daemon (SIGINT, SIGTERM, SIGHUP).
    Shutdown,
}

/// Channel and run flag shared between the signal thread and the main loop.
pub struct SignalState {
    /// Cleared once a shutdown signal arrives.
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
    /// Cloned by other producers such as the config watcher.
    pub signal_sender: Sender<SignalMessage>,
}

/// Map a raw signal number to the message it stands for.
pub fn message_for(signal: i32) -> Option<SignalMessage> {
    match signal {
        SIGUSR2 => Some(SignalMessage::Reload),
        SIGINT | SIGTERM | SIGHUP => Some(SignalMessage::Shutdown),
        _ => None,
    }
}

fn signal_name(signal: i32) -> &'static str {
    match signal {
        SIGINT => "SIGINT",
        SIGTERM => "SIGTERM",
        SIGHUP => "SIGHUP",
        SIGUSR2 => "SIGUSR2",
        _ => "signal",
    }
}

/// Register the handlers and spawn the thread forwarding signals to the channel.
pub fn setup_signal_handler() -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));
    let (signal_sender, signal_receiver) = std::sync::mpsc::channel::<SignalMessage>();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running_clone = Arc::clone(&running);
    let sender = signal_sender.clone();
    thread::spawn(move || {
        for signal in signals.forever() {
            let Some(message) = message_for(signal) else {
                continue;
            };

            log_pipe!();
            match message {
                SignalMessage::Reload => log_info!("Received configuration reload signal"),
                SignalMessage::Shutdown => {
                    log_info!("Received {}, shutting down...", signal_name(signal));
                    running_clone.store(false, Ordering::SeqCst);
                }
            }

            if sender.send(message).is_err() || message == SignalMessage::Shutdown {
                break;
            }
        }
    });

    Ok(SignalState {
        running,
        signal_receiver,
        signal_sender,
    })
}
