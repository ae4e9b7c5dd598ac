//! # shutterd
//!
//! Sun-aware daily scheduler for window shutters.
//!
//! Once a day (and whenever the configuration changes) the daemon works out
//! today's sunrise and sunset, picks the schedule that governs the date, turns
//! every rule's time expression into a wall-clock time and re-arms one timer
//! entry per rule. When an entry fires the shutters of its rule are raised or
//! lowered through a [`bus::CommandSink`].
//!
//! ## Layout
//!
//! - [`geo`]: location and sunrise/sunset calculation
//! - [`schedule`]: time expressions, rule selection, device lookup and the
//!   trigger rebuilder
//! - [`timer`]: the daily timer the triggers are armed on
//! - [`bus`]: where fired actions go
//! - [`config`]: TOML settings with hot reload
//! - [`core`]: the recompute pipeline and the main loop
//! - [`commands`]: one-shot CLI commands
//! - [`io`]: signal handling

// Macros first so every module below can use them.
#[macro_use]
pub mod logger;

pub mod args;
pub mod bus;
pub mod commands;
pub mod config;
pub mod constants;
pub mod core;
pub mod geo;
pub mod io;
pub mod schedule;
pub mod time_source;
pub mod timer;

mod shutterd;

pub use shutterd::Shutterd;
