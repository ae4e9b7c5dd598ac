//! Device-command sinks.
//!
//! Armed triggers hand their commands to a [`CommandSink`]. Delivery is
//! fire-and-forget: sinks report failures in the log and never retry.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use crate::schedule::ActionKind;

/// Destination for shutter commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandSink: Send + Sync {
    /// Ask the device at `address` to perform `kind`.
    fn send(&self, address: &str, kind: ActionKind);
}

/// Sink that only logs the commands it receives.
///
/// Used when no bus command is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl CommandSink for LogSink {
    fn send(&self, address: &str, kind: ActionKind) {
        log_info!("Shutter {address}: {} ({})", kind, kind.bus_action());
    }
}

/// Sink that runs an external program once per command:
/// `<program> <address> <up|down>`.
#[derive(Debug, Clone)]
pub struct ExecSink {
    program: PathBuf,
}

impl ExecSink {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl CommandSink for ExecSink {
    fn send(&self, address: &str, kind: ActionKind) {
        let spawned = Command::new(&self.program)
            .arg(address)
            .arg(kind.bus_action())
            .stdin(Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => {
                log_info!("Shutter {address}: {kind} sent");
                // Reap in the background so the timer thread never waits on the bus.
                thread::spawn(move || match child.wait() {
                    Ok(status) if !status.success() => {
                        log_warning!("Bus command exited with {status}");
                    }
                    Err(e) => log_warning!("Failed to wait for bus command: {e}"),
                    Ok(_) => {}
                });
            }
            Err(e) => {
                log_error!(
                    "Failed to run bus command '{}': {e}",
                    self.program.display()
                );
            }
        }
    }
}
