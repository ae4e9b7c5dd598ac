//! Hot reload of the configuration file.
//!
//! The parent directory is watched rather than the file itself: editors
//! usually save by writing a temporary file and renaming it over the original,
//! which a watch on the file would miss.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use crate::constants::WATCHER_DEBOUNCE_MS;
use crate::io::signals::SignalMessage;

/// Watches one configuration file and posts [`SignalMessage::Reload`] on change.
pub struct ConfigWatcher {
    signal_sender: Sender<SignalMessage>,
    config_path: PathBuf,
}

impl ConfigWatcher {
    pub fn new(signal_sender: Sender<SignalMessage>, config_path: PathBuf) -> Self {
        Self {
            signal_sender,
            config_path,
        }
    }

    /// Spawn the watcher thread.
    pub fn start(self) -> Result<()> {
        let Some(directory) = self.config_path.parent().map(Path::to_path_buf) else {
            anyhow::bail!(
                "Configuration path has no parent directory: {}",
                self.config_path.display()
            );
        };
        let Some(file_name) = self.config_path.file_name().map(OsString::from) else {
            anyhow::bail!(
                "Configuration path has no file name: {}",
                self.config_path.display()
            );
        };

        let (tx, rx) = std::sync::mpsc::channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res
                    && matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    )
                {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", directory.display()))?;

        log_debug!("Watching {} for changes", self.config_path.display());

        let signal_sender = self.signal_sender;
        thread::spawn(move || {
            // The watcher stops when dropped.
            let _watcher = watcher;
            let debounce = Duration::from_millis(WATCHER_DEBOUNCE_MS);
            let mut last_reload: Option<Instant> = None;

            for event in rx {
                if !affects_file(&event, &file_name) {
                    continue;
                }
                if last_reload.is_some_and(|at| at.elapsed() < debounce) {
                    continue;
                }

                // Let the editor finish writing before the main loop reads the file.
                thread::sleep(debounce);

                log_debug!("Configuration change detected");
                if signal_sender.send(SignalMessage::Reload).is_err() {
                    break;
                }
                last_reload = Some(Instant::now());
            }
        });

        Ok(())
    }
}

/// Whether `event` touches the watched file (or an editor temp file next to it).
fn affects_file(event: &Event, file_name: &OsString) -> bool {
    let watched = file_name.to_string_lossy();
    event.paths.iter().any(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy())
            .is_some_and(|name| name == watched || name.starts_with(&*watched))
    })
}

/// Start watching `config_path` for changes.
pub fn start_config_watcher(
    signal_sender: Sender<SignalMessage>,
    config_path: PathBuf,
) -> Result<()> {
    ConfigWatcher::new(signal_sender, config_path).start()
}
