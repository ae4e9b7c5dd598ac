#[cfg(test)]
mod solar_tests {
    use crate::geo::solar::*;
    use crate::schedule::ScheduleError;
    use chrono::{NaiveDate, NaiveTime, Timelike};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn minutes(t: NaiveTime) -> i64 {
        i64::from(t.num_seconds_from_midnight() / 60)
    }

    fn assert_close(actual: NaiveTime, expected: NaiveTime, tolerance_min: i64) {
        let diff = (minutes(actual) - minutes(expected)).abs();
        assert!(
            diff <= tolerance_min,
            "expected {expected} ± {tolerance_min} min, got {actual}"
        );
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    /// Paris at the summer solstice (CEST, UTC+2).
    #[test]
    fn test_paris_summer_solstice() {
        let times = calculate_solar_times(48.8566, 2.3522, 2.0, date(2024, 6, 21)).unwrap();
        assert_close(times.sunrise, hm(5, 47), 5);
        assert_close(times.sunset, hm(21, 58), 5);
    }

    /// New York in mid-winter (EST, UTC-5).
    #[test]
    fn test_new_york_winter() {
        let times = calculate_solar_times(40.7128, -74.0060, -5.0, date(2024, 1, 15)).unwrap();
        assert_close(times.sunrise, hm(7, 19), 5);
        assert_close(times.sunset, hm(16, 54), 5);
    }

    /// Fractional offsets (India, UTC+5:30) shift the result by half hours.
    #[test]
    fn test_fractional_offset() {
        let day = date(2024, 4, 1);
        let ist = calculate_solar_times(28.6139, 77.2090, 5.5, day).unwrap();
        let utc5 = calculate_solar_times(28.6139, 77.2090, 5.0, day).unwrap();
        assert_eq!(minutes(ist.sunrise) - minutes(utc5.sunrise), 30);
        assert_eq!(minutes(ist.sunset) - minutes(utc5.sunset), 30);
    }

    #[test]
    fn test_results_are_minute_truncated() {
        for day in 1..=28 {
            let times = calculate_solar_times(45.0, 5.0, 1.0, date(2024, 2, day)).unwrap();
            assert_eq!(times.sunrise.second(), 0);
            assert_eq!(times.sunset.second(), 0);
            assert_eq!(times.sunrise.nanosecond(), 0);
            assert_eq!(times.sunset.nanosecond(), 0);
        }
    }

    #[test]
    fn test_result_is_scoped_to_requested_date() {
        let day = date(2024, 9, 1);
        let times = calculate_solar_times(45.0, 5.0, 2.0, day).unwrap();
        assert_eq!(times.date, day);
    }

    /// Svalbard has midnight sun in June and polar night in December.
    #[test]
    fn test_polar_day_and_night() {
        for day in [date(2024, 6, 21), date(2024, 12, 21)] {
            let result = calculate_solar_times(78.2232, 15.6267, 1.0, day);
            assert!(
                matches!(result, Err(ScheduleError::NoSolarEvent { .. })),
                "expected NoSolarEvent on {day}, got {result:?}"
            );
        }
    }

    #[test]
    fn test_poles() {
        assert!(matches!(
            calculate_solar_times(90.0, 0.0, 0.0, date(2024, 6, 21)),
            Err(ScheduleError::NoSolarEvent { .. })
        ));
        assert!(matches!(
            calculate_solar_times(-90.0, 0.0, 0.0, date(2024, 6, 21)),
            Err(ScheduleError::NoSolarEvent { .. })
        ));
    }

    /// Svalbard still has sunrise and sunset around the equinox.
    #[test]
    fn test_high_latitude_equinox() {
        let times = calculate_solar_times(78.2232, 15.6267, 1.0, date(2024, 3, 20)).unwrap();
        assert!(times.sunrise < times.sunset);
    }

    #[test]
    fn test_invalid_coordinates() {
        let day = date(2024, 6, 21);
        for (lat, lon) in [(91.0, 0.0), (-90.5, 0.0), (0.0, 180.5), (0.0, -181.0)] {
            assert!(matches!(
                calculate_solar_times(lat, lon, 0.0, day),
                Err(ScheduleError::InvalidCoordinates { .. })
            ));
        }
    }

    #[test]
    fn test_zone_offset_follows_daylight_saving() {
        let paris: chrono_tz::Tz = "Europe/Paris".parse().unwrap();
        // Clocks go forward on the last Sunday of March 2024 (the 31st)
        assert_eq!(zone_offset_hours(&paris, date(2024, 3, 30)), 1.0);
        assert_eq!(zone_offset_hours(&paris, date(2024, 3, 31)), 2.0);
        assert_eq!(zone_offset_hours(&paris, date(2024, 10, 26)), 2.0);
        assert_eq!(zone_offset_hours(&paris, date(2024, 10, 27)), 1.0);
    }

    /// Across the DST switch the sunrise moves by about an hour, not by the
    /// couple of minutes the sun itself moves from one day to the next.
    #[test]
    fn test_location_sunrise_jumps_with_dst() {
        let paris: chrono_tz::Tz = "Europe/Paris".parse().unwrap();
        let location = Location::new(48.8566, 2.3522, OffsetSource::Zone(paris));

        let before = location.solar_times(date(2024, 3, 30)).unwrap();
        let after = location.solar_times(date(2024, 3, 31)).unwrap();

        let jump = minutes(after.sunrise) - minutes(before.sunrise);
        assert!((55..=60).contains(&jump), "sunrise moved by {jump} minutes");
    }

    #[test]
    fn test_fixed_offset_location() {
        let location = Location::new(48.8566, 2.3522, OffsetSource::Fixed(1.0));
        assert_eq!(location.utc_offset_hours(date(2024, 7, 1)), 1.0);
        assert_eq!(location.utc_offset_hours(date(2024, 1, 1)), 1.0);
    }

    #[test]
    fn test_southern_hemisphere() {
        // Cape Town, SAST (UTC+2), December: long days
        let times = calculate_solar_times(-33.9249, 18.4241, 2.0, date(2024, 12, 21)).unwrap();
        assert!(times.sunrise.hour() <= 6);
        assert!(times.sunset.hour() >= 19);
    }

    #[test]
    fn test_wall_clock_ignores_host_zone() {
        use chrono::{Local, TimeZone, Utc};

        let instant = Utc.with_ymd_and_hms(2024, 5, 5, 20, 0, 0).unwrap();
        let tokyo = OffsetSource::Zone(chrono_tz::Asia::Tokyo);
        let expected = date(2024, 5, 6).and_time(hm(5, 0));

        assert_eq!(tokyo.wall_clock(&instant), expected);
        assert_eq!(tokyo.wall_clock(&instant.with_timezone(&Local)), expected);
        assert_eq!(
            OffsetSource::Fixed(-5.5).wall_clock(&instant),
            date(2024, 5, 5).and_time(hm(14, 30))
        );
    }
}
