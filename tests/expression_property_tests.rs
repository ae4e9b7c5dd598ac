//! Property tests for time resolution, rule selection and the solar calculator.

use chrono::{NaiveDate, NaiveTime, Timelike};
use proptest::prelude::*;

use shutterd::geo::{SolarTimes, calculate_solar_times};
use shutterd::schedule::{
    ActionRule, Bounds, DaySchedule, MatchedBy, ScheduleError, resolve_time, select_schedule,
};

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

fn time_strategy() -> impl Strategy<Value = NaiveTime> {
    (0u32..24, 0u32..60).prop_map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0).unwrap())
}

fn solar_strategy() -> impl Strategy<Value = SolarTimes> {
    (time_strategy(), time_strategy()).prop_map(|(a, b)| SolarTimes {
        date: NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
        sunrise: a.min(b),
        sunset: a.max(b),
    })
}

fn minutes(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight() / 60)
}

fn hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

fn rule(time: &str) -> ActionRule {
    ActionRule {
        shutters: vec!["living".to_string()],
        time: time.to_string(),
        min: None,
        max: None,
    }
}

proptest! {
    #[test]
    fn test_zero_offset_is_the_event(solar in solar_strategy()) {
        let solar = Ok(solar);
        let sunrise = resolve_time("sunrise", &solar, Bounds::default()).unwrap();
        let explicit = resolve_time("sunrise+0", &solar, Bounds::default()).unwrap();
        prop_assert_eq!(sunrise.time, solar.as_ref().unwrap().sunrise);
        prop_assert_eq!(explicit.time, sunrise.time);
        prop_assert!(sunrise.warnings.is_empty());
    }

    #[test]
    fn test_offset_is_clamped_to_the_day(solar in solar_strategy(), offset in -3000i64..3000) {
        let expression = if offset < 0 {
            format!("sunset{offset}")
        } else {
            format!("sunset+{offset}")
        };
        let sunset = solar.sunset;
        let resolved = resolve_time(&expression, &Ok(solar), Bounds::default()).unwrap();

        let expected = (minutes(sunset) + offset).clamp(0, 23 * 60 + 59);
        prop_assert_eq!(minutes(resolved.time), expected);
    }

    #[test]
    fn test_bounds_clamp(
        solar in solar_strategy(),
        min in time_strategy(),
        max in time_strategy(),
    ) {
        let (min_text, max_text) = (hhmm(min), hhmm(max));
        let bounds = Bounds { min: Some(&min_text), max: Some(&max_text) };
        let resolved = resolve_time("sunrise", &Ok(solar), bounds).unwrap();

        // max is applied last, so it wins when the bounds cross.
        prop_assert!(resolved.time <= max);
        if min <= max {
            prop_assert!(resolved.time >= min);
        }
    }

    #[test]
    fn test_clock_times_ignore_the_sun(time in time_strategy()) {
        let polar = Err(ScheduleError::NoSolarEvent {
            date: NaiveDate::from_ymd_opt(2024, 12, 21).unwrap(),
            latitude: 80.0,
        });
        let resolved = resolve_time(&hhmm(time), &polar, Bounds::default()).unwrap();
        prop_assert_eq!(resolved.time, time);
    }

    #[test]
    fn test_first_matching_weekday_wins(
        day_sets in prop::collection::vec(prop::collection::vec(0usize..7, 0..4), 1..6),
        today in 0usize..7,
    ) {
        let schedules: Vec<DaySchedule> = day_sets
            .iter()
            .map(|days| DaySchedule {
                days: days.iter().map(|&d| WEEKDAYS[d].to_string()).collect(),
                event: None,
                open: vec![rule("08:00")],
                close: Vec::new(),
            })
            .collect();

        let selection = select_schedule(&schedules, WEEKDAYS[today], "");
        let expected = day_sets.iter().position(|days| days.contains(&today));

        prop_assert_eq!(selection.index, expected);
        if expected.is_some() {
            prop_assert_eq!(selection.matched_by, MatchedBy::Weekday);
        } else {
            prop_assert_eq!(selection.matched_by, MatchedBy::Nothing);
            prop_assert!(selection.is_empty());
        }
    }

    #[test]
    fn test_mid_latitude_sunrise_precedes_sunset(
        latitude in -60.0f64..60.0,
        longitude in -180.0f64..180.0,
        day in 0u32..366,
    ) {
        let date = NaiveDate::from_yo_opt(2024, day + 1).unwrap();
        // Local mean time keeps both events on the same calendar day.
        let offset = longitude / 15.0;
        let solar = calculate_solar_times(latitude, longitude, offset, date).unwrap();

        prop_assert!(solar.sunrise < solar.sunset);
        prop_assert_eq!(solar.sunrise.second(), 0);
        prop_assert_eq!(solar.sunset.second(), 0);
    }

    #[test]
    fn test_out_of_range_coordinates_are_rejected(
        latitude in prop_oneof![-1000.0f64..-90.001, 90.001f64..1000.0],
        longitude in -180.0f64..180.0,
    ) {
        let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        let result = calculate_solar_times(latitude, longitude, 0.0, date);
        let is_invalid = matches!(result, Err(ScheduleError::InvalidCoordinates { .. }));
        prop_assert!(is_invalid);
    }
}
