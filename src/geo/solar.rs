//! Solar calculator.
//!
//! Computes the local sunrise and sunset time-of-day for a location and a
//! calendar date. The astronomical work is done by the `sunrise` crate; this
//! module adds three things on top of it:
//!
//! - **Per-date UTC offsets**: when the location carries a timezone, the offset
//!   is derived for the requested date (at local noon), so a DST switch moves
//!   the shutters with the clocks instead of drifting by an hour.
//! - **Polar detection**: on dates where the sun never crosses the horizon the
//!   calculator returns [`ScheduleError::NoSolarEvent`] instead of a bogus time.
//! - **Minute truncation**: results carry no seconds, matching the granularity
//!   of the daily timer.

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Timelike,
};
use chrono_tz::Tz;
use serde::Serialize;
use sunrise::{Coordinates, SolarDay, SolarEvent};

use crate::constants::{MAXIMUM_LATITUDE, MAXIMUM_LONGITUDE, MINIMUM_LATITUDE, MINIMUM_LONGITUDE};
use crate::schedule::ScheduleError;

/// `NaiveDate::num_days_from_ce` of 2000-01-01 (the J2000 epoch date).
const J2000_DAYS_FROM_CE: i32 = 730_120;

/// Apparent solar altitude at sunrise/sunset (refraction plus solar disc).
const HORIZON_ALTITUDE_DEG: f64 = -0.833;

/// Obliquity of the ecliptic.
const EARTH_OBLIQUITY_DEG: f64 = 23.4397;

/// Where the UTC offset of a location comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OffsetSource {
    /// IANA timezone; the offset is re-derived for every date.
    Zone(Tz),
    /// Fixed offset in hours east of UTC (may be fractional).
    Fixed(f64),
}

impl OffsetSource {
    /// Wall-clock reading of `instant` at the location.
    ///
    /// Resolved times are expressed in this clock, whatever zone the host
    /// runs in.
    pub fn wall_clock<T: TimeZone>(&self, instant: &DateTime<T>) -> NaiveDateTime {
        match self {
            OffsetSource::Zone(tz) => instant.with_timezone(tz).naive_local(),
            OffsetSource::Fixed(hours) => {
                instant.naive_utc() + Duration::seconds((hours * 3600.0).round() as i64)
            }
        }
    }
}

/// A point on earth plus its UTC offset rule. Immutable per computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub offset: OffsetSource,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, offset: OffsetSource) -> Self {
        Self {
            latitude,
            longitude,
            offset,
        }
    }

    /// UTC offset in hours in effect on `date`.
    pub fn utc_offset_hours(&self, date: NaiveDate) -> f64 {
        match self.offset {
            OffsetSource::Fixed(hours) => hours,
            OffsetSource::Zone(tz) => zone_offset_hours(&tz, date),
        }
    }

    /// Sunrise and sunset for `date` at this location.
    pub fn solar_times(&self, date: NaiveDate) -> Result<SolarTimes, ScheduleError> {
        calculate_solar_times(
            self.latitude,
            self.longitude,
            self.utc_offset_hours(date),
            date,
        )
    }
}

/// Sunrise and sunset for one date and one location, in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SolarTimes {
    pub date: NaiveDate,
    pub sunrise: NaiveTime,
    pub sunset: NaiveTime,
}

/// Offset of `tz` at local noon on `date`, in hours.
///
/// Noon is never inside a DST gap or overlap in any real zone, but the UTC
/// interpretation is used as a fallback anyway.
pub fn zone_offset_hours(tz: &Tz, date: NaiveDate) -> f64 {
    let Some(noon) = date.and_hms_opt(12, 0, 0) else {
        return 0.0;
    };
    let seconds = tz
        .from_local_datetime(&noon)
        .earliest()
        .map(|dt| dt.offset().fix().local_minus_utc())
        .unwrap_or_else(|| tz.from_utc_datetime(&noon).offset().fix().local_minus_utc());
    f64::from(seconds) / 3600.0
}

/// Compute sunrise and sunset for a location, UTC offset and calendar date.
///
/// # Errors
/// - [`ScheduleError::InvalidCoordinates`] when latitude or longitude is out of range
/// - [`ScheduleError::NoSolarEvent`] on polar day or polar night
pub fn calculate_solar_times(
    latitude: f64,
    longitude: f64,
    utc_offset_hours: f64,
    date: NaiveDate,
) -> Result<SolarTimes, ScheduleError> {
    let in_range = (MINIMUM_LATITUDE..=MAXIMUM_LATITUDE).contains(&latitude)
        && (MINIMUM_LONGITUDE..=MAXIMUM_LONGITUDE).contains(&longitude);
    let coordinates = Coordinates::new(latitude, longitude).filter(|_| in_range);
    let Some(coordinates) = coordinates else {
        return Err(ScheduleError::InvalidCoordinates {
            latitude,
            longitude,
        });
    };

    let no_event = ScheduleError::NoSolarEvent { date, latitude };
    if !sun_crosses_horizon(latitude, longitude, date) {
        return Err(no_event);
    }

    let solar_day = SolarDay::new(coordinates, date);
    let sunrise_utc = solar_day.event_time(SolarEvent::Sunrise);
    let sunset_utc = solar_day.event_time(SolarEvent::Sunset);

    // Near the polar circles the horizon check and the crate can disagree by a
    // hair; an event that lands on another day means the crate had no answer.
    for event in [sunrise_utc, sunset_utc] {
        if (event.date_naive() - date).num_days().abs() > 1 {
            return Err(no_event);
        }
    }

    let offset = Duration::seconds((utc_offset_hours * 3600.0).round() as i64);
    Ok(SolarTimes {
        date,
        sunrise: truncate_to_minute((sunrise_utc.naive_utc() + offset).time()),
        sunset: truncate_to_minute((sunset_utc.naive_utc() + offset).time()),
    })
}

/// Whether the sun crosses the horizon at all on `date`.
///
/// Uses the same low-precision solar position model as the sunrise equation:
/// if the cosine of the horizon hour angle falls outside [-1, 1] the sun stays
/// above (polar day) or below (polar night) the horizon all day.
fn sun_crosses_horizon(latitude: f64, longitude: f64, date: NaiveDate) -> bool {
    let days_since_j2000 = f64::from(date.num_days_from_ce() - J2000_DAYS_FROM_CE);
    let mean_solar_time = days_since_j2000 + 0.0008 - longitude / 360.0;

    let mean_anomaly = (357.5291 + 0.985_600_28 * mean_solar_time).rem_euclid(360.0);
    let m = mean_anomaly.to_radians();
    let equation_of_center =
        1.9148 * m.sin() + 0.0200 * (2.0 * m).sin() + 0.0003 * (3.0 * m).sin();
    let ecliptic_longitude =
        (mean_anomaly + equation_of_center + 180.0 + 102.9372).rem_euclid(360.0);

    let sin_declination =
        ecliptic_longitude.to_radians().sin() * EARTH_OBLIQUITY_DEG.to_radians().sin();
    let declination = sin_declination.asin();

    let phi = latitude.to_radians();
    let cos_hour_angle = (HORIZON_ALTITUDE_DEG.to_radians().sin() - phi.sin() * sin_declination)
        / (phi.cos() * declination.cos());

    (-1.0..=1.0).contains(&cos_hour_angle)
}

/// Drop seconds and sub-seconds.
pub fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}
