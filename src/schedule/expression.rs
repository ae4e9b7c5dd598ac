//! Time expression parsing and resolution.
//!
//! Grammar (case-sensitive):
//!
//! - `H:MM` / `HH:MM`: a 24-hour clock time, resolved as itself.
//! - `sunrise` / `sunset`, optionally followed by a signed minute offset
//!   (`sunset-30`, `sunrise+15`).
//!
//! Parsing yields a [`TimeExpression`]; resolution turns it into a
//! minute-granular time-of-day using the day's [`SolarTimes`] and the rule's
//! optional `min`/`max` bounds. Sun-relative values that would cross midnight
//! are clamped to `00:00` / `23:59` of the same day.

use chrono::{Duration, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use super::ScheduleError;
use crate::geo::SolarTimes;

static CLOCK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("clock pattern is valid"));

static SUN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(sunrise|sunset)(?:([+-])(.*))?$").expect("sun pattern is valid")
});

const LAST_MINUTE_OF_DAY: i64 = 23 * 60 + 59;

/// Which solar event a sun-relative expression is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SunEvent {
    Sunrise,
    Sunset,
}

impl SunEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SunEvent::Sunrise => "sunrise",
            SunEvent::Sunset => "sunset",
        }
    }
}

/// A parsed time expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeExpression {
    /// Fixed clock time.
    Clock(NaiveTime),
    /// Sunrise or sunset shifted by a number of minutes.
    SunRelative { event: SunEvent, offset_minutes: i64 },
}

impl fmt::Display for TimeExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeExpression::Clock(time) => write!(f, "{}", time.format("%H:%M")),
            TimeExpression::SunRelative {
                event,
                offset_minutes: 0,
            } => f.write_str(event.as_str()),
            TimeExpression::SunRelative {
                event,
                offset_minutes,
            } => write!(f, "{}{offset_minutes:+}", event.as_str()),
        }
    }
}

/// Result of parsing: the expression plus any non-fatal problem found on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub expression: TimeExpression,
    pub warning: Option<ScheduleError>,
}

impl TimeExpression {
    /// Parse an expression string.
    ///
    /// A malformed offset after `sunrise`/`sunset` is not fatal: the expression
    /// parses with a zero offset and the problem is returned as a warning.
    ///
    /// # Errors
    /// [`ScheduleError::InvalidTimeExpression`] when neither grammar matches.
    pub fn parse(input: &str) -> Result<Parsed, ScheduleError> {
        if let Some(time) = parse_clock_time(input) {
            return Ok(Parsed {
                expression: TimeExpression::Clock(time),
                warning: None,
            });
        }

        let Some(captures) = SUN_PATTERN.captures(input) else {
            return Err(ScheduleError::InvalidTimeExpression(input.to_string()));
        };

        let event = if &captures[1] == "sunrise" {
            SunEvent::Sunrise
        } else {
            SunEvent::Sunset
        };

        let (offset_minutes, warning) = match (captures.get(2), captures.get(3)) {
            (Some(sign), Some(digits)) => {
                let raw = format!("{}{}", sign.as_str(), digits.as_str());
                let well_formed = !digits.as_str().is_empty()
                    && digits.as_str().bytes().all(|b| b.is_ascii_digit());
                match raw.parse::<i64>() {
                    Ok(minutes) if well_formed => (minutes, None),
                    _ => (
                        0,
                        Some(ScheduleError::InvalidOffset {
                            expression: input.to_string(),
                            offset: raw,
                        }),
                    ),
                }
            }
            _ => (0, None),
        };

        Ok(Parsed {
            expression: TimeExpression::SunRelative {
                event,
                offset_minutes,
            },
            warning,
        })
    }
}

/// Parse a strict `H:MM` / `HH:MM` 24-hour clock time.
pub fn parse_clock_time(input: &str) -> Option<NaiveTime> {
    let captures = CLOCK_PATTERN.captures(input)?;
    let hour = captures[1].parse::<u32>().ok()?;
    let minute = captures[2].parse::<u32>().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Optional clamp bounds of a rule, as written in the configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bounds<'a> {
    pub min: Option<&'a str>,
    pub max: Option<&'a str>,
}

/// A resolved time plus the non-fatal problems met while resolving it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub time: NaiveTime,
    pub warnings: Vec<ScheduleError>,
}

/// Resolve an expression string to a time-of-day.
///
/// `solar` is the day's solar calculation, which may itself have failed
/// (polar day/night); only sun-relative expressions depend on it.
///
/// # Errors
/// - [`ScheduleError::InvalidTimeExpression`] for unparseable expressions
/// - the solar calculation's error for sun-relative expressions on days
///   without sunrise/sunset
pub fn resolve_time(
    input: &str,
    solar: &Result<SolarTimes, ScheduleError>,
    bounds: Bounds<'_>,
) -> Result<Resolved, ScheduleError> {
    let Parsed {
        expression,
        warning,
    } = TimeExpression::parse(input)?;
    let mut warnings: Vec<ScheduleError> = warning.into_iter().collect();

    let (event, offset_minutes) = match expression {
        TimeExpression::Clock(time) => return Ok(Resolved { time, warnings }),
        TimeExpression::SunRelative {
            event,
            offset_minutes,
        } => (event, offset_minutes),
    };

    let solar = solar.as_ref().map_err(ScheduleError::clone)?;
    let anchor = match event {
        SunEvent::Sunrise => solar.sunrise,
        SunEvent::Sunset => solar.sunset,
    };
    let mut time = shift_within_day(anchor, offset_minutes);

    if let Some(min) = parse_bound("min", bounds.min, &mut warnings)
        && min > time
    {
        time = min;
    }
    if let Some(max) = parse_bound("max", bounds.max, &mut warnings)
        && max < time
    {
        time = max;
    }

    Ok(Resolved { time, warnings })
}

/// Parse an optional bound, recording a warning if it is malformed.
///
/// Blank strings count as "not configured".
fn parse_bound(
    which: &'static str,
    raw: Option<&str>,
    warnings: &mut Vec<ScheduleError>,
) -> Option<NaiveTime> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    let parsed = parse_clock_time(raw);
    if parsed.is_none() {
        warnings.push(ScheduleError::InvalidBound {
            which,
            value: raw.to_string(),
        });
    }
    parsed
}

/// Add minutes to a time-of-day, clamping to 00:00 and 23:59.
fn shift_within_day(time: NaiveTime, offset_minutes: i64) -> NaiveTime {
    let base = i64::from(time.num_seconds_from_midnight() / 60);
    let total = base.saturating_add(offset_minutes).clamp(0, LAST_MINUTE_OF_DAY);
    let (shifted, wrapped) = time.overflowing_add_signed(Duration::minutes(total - base));
    debug_assert_eq!(wrapped, 0, "clamped shift stays within the day");
    shifted
}
