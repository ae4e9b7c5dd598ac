//! Structured logging with box-drawing output.
//!
//! Every line the daemon prints goes through the macros defined here so the
//! output keeps one visual style: blocks start with `┣`, nested details are
//! indented under a `┃` pipe and semantic levels carry a `[LEVEL]` tag.
//!
//! Logging can be switched off at runtime (tests do this) and an optional
//! wall-clock prefix can be enabled for long-running daemon sessions.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

static TIMESTAMPS_ENABLED: AtomicBool = AtomicBool::new(false);

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Main logging interface.
///
/// ## Conventions
///
/// - **`log_block_start!`** opens a new conceptual block (a recompute cycle,
///   a config reload). Prints an empty pipe for spacing, then `┣ message`.
/// - **`log_decorated!`** continues the current block with `┣ message`.
/// - **`log_indented!`** prints nested details as `┃   message`.
/// - **`log_pipe!`** inserts a bare `┃` line, usually before a semantic
///   level macro that starts its own block.
/// - **`log_version!`** / **`log_end!`** print the startup header and the
///   final marker.
/// - **`log_info!`, `log_warning!`, `log_error!`, `log_debug!`,
///   `log_critical!`** print `┣[LEVEL] message`.
pub struct Log;

impl Log {
    /// Enable or disable logging.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Enable or disable `log_debug!` output (the `--debug` flag).
    pub fn set_debug_enabled(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_debug_enabled() -> bool {
        DEBUG_ENABLED.load(Ordering::SeqCst)
    }

    /// Prefix every line with the current wall-clock time.
    pub fn set_timestamps(enabled: bool) {
        TIMESTAMPS_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Timestamp prefix for the current line, empty unless enabled.
    /// Public for macro access.
    pub fn get_timestamp_prefix() -> String {
        if TIMESTAMPS_ENABLED.load(Ordering::SeqCst) {
            format!("[{}] ", crate::time_source::now().format("%H:%M:%S"))
        } else {
            String::new()
        }
    }
}

/// Routes formatted output to stdout (needed by macros).
pub fn write_output(text: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}

// # Logging Macros

/// Shared body of every logging macro: checks the enable flag, resolves the
/// timestamp prefix and writes `{prefix}{lead}{message}`.
///
/// `$lead` may contain `{prefix}` again for multi-line leads such as the
/// block start, which is why it is formatted separately.
#[doc(hidden)]
#[macro_export]
macro_rules! __log_line {
    ($lead:expr, $fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            let lead = $lead.replace("{prefix}", &prefix);
            $crate::logger::write_output(&format!("{prefix}{lead}{message}\n"));
        }
    }};
    ($lead:expr, $expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            let lead = $lead.replace("{prefix}", &prefix);
            $crate::logger::write_output(&format!("{prefix}{lead}{expr}\n"));
        }
    }};
}

/// Log a decorated message, typically as part of an existing block.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => { $crate::__log_line!("┣ ", $($arg)+) };
}

/// Log an indented message for sub-items or details within a block.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => { $crate::__log_line!("┃   ", $($arg)+) };
}

/// Log a visual pipe separator for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => { $crate::__log_line!("┃", "") };
}

/// Log a block start message, initiating a new conceptual block of information.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => { $crate::__log_line!("┃\n{prefix}┣ ", $($arg)+) };
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::__log_line!("┏ ", "shutterd v{} ━━╸", env!("CARGO_PKG_VERSION"))
    };
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => { $crate::__log_line!("╹", "") };
}

/// Log a warning message with yellow level tag.
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => { $crate::__log_line!("┣[\x1b[33mWARNING\x1b[0m] ", $($arg)+) };
}

/// Log an error message with red level tag.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => { $crate::__log_line!("┣[\x1b[31mERROR\x1b[0m] ", $($arg)+) };
}

/// Log an error that ends the current flow, with a terminal corner.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)+) => { $crate::__log_line!("┃\n{prefix}┗[\x1b[31mERROR\x1b[0m] ", $($arg)+) };
}

/// Log an informational message with green level tag.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => { $crate::__log_line!("┣[\x1b[32mINFO\x1b[0m] ", $($arg)+) };
}

/// Log a debug/operational message. Silent unless debug output is enabled.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => {
        if $crate::logger::Log::is_debug_enabled() {
            $crate::__log_line!("┣[\x1b[32mDEBUG\x1b[0m] ", $($arg)+)
        }
    };
}

/// Log a critical message with red level tag.
#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)+) => { $crate::__log_line!("┣[\x1b[31mCRITICAL\x1b[0m] ", $($arg)+) };
}
