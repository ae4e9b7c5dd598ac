//! Failure taxonomy of the resolution engine.
//!
//! Every variant is local to one action, one bound or one device name. None of
//! them aborts a recompute cycle; callers log them and carry on.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// The sun does not rise or set on this date at this latitude.
    #[error("the sun does not rise or set on {date} at latitude {latitude:.4}")]
    NoSolarEvent { date: NaiveDate, latitude: f64 },

    /// Coordinates outside [-90, 90] / [-180, 180].
    #[error("invalid coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    /// Expression matches neither the clock nor the sun-relative grammar.
    #[error("invalid time expression '{0}'")]
    InvalidTimeExpression(String),

    /// Malformed minute offset after `sunrise`/`sunset`; treated as zero.
    #[error("invalid minute offset '{offset}' in '{expression}'")]
    InvalidOffset { expression: String, offset: String },

    /// Malformed `min`/`max` bound; the bound is ignored.
    #[error("invalid {which} bound '{value}'")]
    InvalidBound { which: &'static str, value: String },

    /// Logical device name missing from the device directory.
    #[error("shutter '{0}' not found in the devices list")]
    DeviceNotFound(String),
}
