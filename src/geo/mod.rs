//! Geographic sunrise/sunset calculations.
//!
//! - [`solar`]: sunrise/sunset for a location and a calendar date, with
//!   per-date UTC offsets so daylight-saving changes are picked up the day
//!   they happen.

pub mod solar;

pub use solar::{Location, OffsetSource, SolarTimes, calculate_solar_times};

#[cfg(test)]
mod tests;
