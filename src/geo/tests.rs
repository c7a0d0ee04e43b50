use chrono::{Datelike, NaiveDate};

use super::*;
use crate::error::CoreError;
use crate::time::TimeOfDay;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn hm(h: u8, m: u8) -> TimeOfDay {
    TimeOfDay::new(h, m).unwrap()
}

#[test]
fn test_lincoln_city_summer_solstice() {
    let times = SolarClock::default()
        .compute(date(2024, 6, 21), &Location::lincoln_city())
        .unwrap();

    // Sunrise around 05:35 PDT, civil dusk around 21:40 PDT.
    assert!(times.sunrise > hm(5, 0) && times.sunrise < hm(6, 10), "{times:?}");
    assert!(times.dusk > hm(21, 0) && times.dusk < hm(22, 15), "{times:?}");
}

#[test]
fn test_lincoln_city_winter_solstice() {
    let times = SolarClock::default()
        .compute(date(2024, 12, 21), &Location::lincoln_city())
        .unwrap();

    // Sunrise around 07:55 PST, civil dusk around 17:05 PST.
    assert!(times.sunrise > hm(7, 20) && times.sunrise < hm(8, 30), "{times:?}");
    assert!(times.dusk > hm(16, 30) && times.dusk < hm(17, 40), "{times:?}");
}

#[test]
fn test_dusk_follows_sunset() {
    let location = Location::lincoln_city();
    let day = date(2024, 3, 20);
    let sunset = SolarClock::new(SolarEvent::Sunrise, SolarEvent::Sunset)
        .compute(day, &location)
        .unwrap();
    let dusk = SolarClock::default().compute(day, &location).unwrap();

    let twilight = dusk.dusk.minutes_since_midnight() - sunset.dusk.minutes_since_midnight();
    assert!((20..=45).contains(&twilight), "civil twilight lasted {twilight} minutes");
}

#[test]
fn test_dawn_precedes_sunrise() {
    let location = Location::lincoln_city();
    let day = date(2024, 9, 1);
    let dawn = SolarClock::new(SolarEvent::Dawn, SolarEvent::Dusk)
        .compute(day, &location)
        .unwrap();
    let sunrise = SolarClock::default().compute(day, &location).unwrap();
    assert!(dawn.sunrise < sunrise.sunrise);
}

#[test]
fn test_compute_is_deterministic() {
    let clock = SolarClock::default();
    let location = Location::lincoln_city();
    let day = date(2025, 4, 2);
    assert_eq!(
        clock.compute(day, &location).unwrap(),
        clock.compute(day, &location).unwrap()
    );
}

#[test]
fn test_polar_night_is_reported_not_invented() {
    let svalbard = Location {
        name: "Longyearbyen".into(),
        region: "NO".into(),
        timezone: chrono_tz::Arctic::Longyearbyen,
        latitude: 78.22,
        longitude: 15.65,
        elevation: None,
    };

    let result = SolarClock::default().compute(date(2024, 12, 21), &svalbard);
    assert!(
        matches!(result, Err(CoreError::AstronomicalComputation { .. })),
        "{result:?}"
    );
}

#[test]
fn test_solar_times_reject_inverted_order() {
    let result = SolarTimes::new(date(2024, 1, 1), hm(18, 0), hm(7, 0));
    assert!(matches!(
        result,
        Err(CoreError::AstronomicalComputation { .. })
    ));
    assert!(SolarTimes::new(date(2024, 1, 1), hm(7, 0), hm(7, 0)).is_err());
}

#[test]
fn test_solar_event_parsing() {
    assert_eq!("Dusk".parse::<SolarEvent>().unwrap(), SolarEvent::Dusk);
    assert_eq!(" dawn ".parse::<SolarEvent>().unwrap(), SolarEvent::Dawn);
    assert!("noon".parse::<SolarEvent>().is_err());
    assert!(SolarEvent::Dawn < SolarEvent::Sunrise);
    assert!(SolarEvent::Sunset < SolarEvent::Dusk);
}

#[test]
fn test_location_formatting() {
    let location = Location::lincoln_city();
    assert_eq!(location.to_string(), "Lincoln City, USA");
    assert_eq!(location.coordinates(), "45.0140°N, 123.9090°W");
}

#[test]
fn test_every_day_of_a_year_has_ordered_times() {
    let clock = SolarClock::default();
    let location = Location::lincoln_city();
    let mut day = date(2023, 1, 1);
    while day.year() == 2023 {
        let times = clock.compute(day, &location).unwrap();
        assert_eq!(times.date, day);
        assert!(times.sunrise < times.dusk);
        day = day.succ_opt().unwrap();
    }
}
