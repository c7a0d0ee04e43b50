//! Solar event times for the door schedule.
//!
//! Uses the `sunrise` crate's NOAA-based algorithm. Dawn and dusk are civil
//! twilight (sun 6° below the horizon): light enough for the flock to find the
//! coop, dark enough that they have gone in.

use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use sunrise::{Coordinates, DawnType, SolarDay};

use super::Location;
use crate::error::CoreError;
use crate::time::TimeOfDay;

/// A daily solar event the door can be tied to.
///
/// Declaration order is the order the events happen in during a normal day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolarEvent {
    Dawn,
    Sunrise,
    Sunset,
    Dusk,
}

impl SolarEvent {
    pub const ALL: [SolarEvent; 4] = [
        SolarEvent::Dawn,
        SolarEvent::Sunrise,
        SolarEvent::Sunset,
        SolarEvent::Dusk,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SolarEvent::Dawn => "dawn",
            SolarEvent::Sunrise => "sunrise",
            SolarEvent::Sunset => "sunset",
            SolarEvent::Dusk => "dusk",
        }
    }

    fn as_sunrise_event(self) -> sunrise::SolarEvent {
        match self {
            SolarEvent::Dawn => sunrise::SolarEvent::Dawn(DawnType::Civil),
            SolarEvent::Sunrise => sunrise::SolarEvent::Sunrise,
            SolarEvent::Sunset => sunrise::SolarEvent::Sunset,
            SolarEvent::Dusk => sunrise::SolarEvent::Dusk(DawnType::Civil),
        }
    }
}

impl fmt::Display for SolarEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolarEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SolarEvent::ALL
            .into_iter()
            .find(|event| event.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown solar event '{s}' (expected dawn, sunrise, sunset or dusk)")
            })
    }
}

/// Opening and closing times for one calendar day, in the coop's local time.
///
/// `sunrise` holds the configured opening event and `dusk` the closing event;
/// the names follow the default configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolarTimes {
    pub date: NaiveDate,
    pub sunrise: TimeOfDay,
    pub dusk: TimeOfDay,
}

impl SolarTimes {
    /// Fails unless the opening time is strictly before the closing time.
    pub fn new(date: NaiveDate, sunrise: TimeOfDay, dusk: TimeOfDay) -> Result<Self, CoreError> {
        if sunrise >= dusk {
            return Err(CoreError::AstronomicalComputation {
                date,
                reason: format!("opening time {sunrise} is not before closing time {dusk}"),
            });
        }
        Ok(Self {
            date,
            sunrise,
            dusk,
        })
    }
}

/// Computes [`SolarTimes`] for the configured opening and closing events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolarClock {
    opening: SolarEvent,
    closing: SolarEvent,
}

impl Default for SolarClock {
    fn default() -> Self {
        Self::new(SolarEvent::Sunrise, SolarEvent::Dusk)
    }
}

impl SolarClock {
    pub fn new(opening: SolarEvent, closing: SolarEvent) -> Self {
        Self { opening, closing }
    }

    pub fn opening(&self) -> SolarEvent {
        self.opening
    }

    pub fn closing(&self) -> SolarEvent {
        self.closing
    }

    /// Opening and closing times at `location` on `date`.
    ///
    /// Never returns a time that does not fall on `date` in the location's own
    /// timezone, and never an opening at or after the closing. Polar day or night
    /// and nonsensical coordinates come back as
    /// [`CoreError::AstronomicalComputation`].
    pub fn compute(&self, date: NaiveDate, location: &Location) -> Result<SolarTimes, CoreError> {
        let coordinates = Coordinates::new(location.latitude, location.longitude).ok_or_else(
            || CoreError::AstronomicalComputation {
                date,
                reason: format!("invalid coordinates {}", location.coordinates()),
            },
        )?;

        let mut day = SolarDay::new(coordinates, date);
        if let Some(elevation) = location.elevation {
            day = day.with_altitude(elevation);
        }

        let opening = event_time(&day, self.opening, date, location)?;
        let closing = event_time(&day, self.closing, date, location)?;
        SolarTimes::new(date, opening, closing)
    }
}

fn event_time(
    day: &SolarDay,
    event: SolarEvent,
    date: NaiveDate,
    location: &Location,
) -> Result<TimeOfDay, CoreError> {
    let local = day
        .event_time(event.as_sunrise_event())
        .with_timezone(&location.timezone);

    // The algorithm yields a time on the wrong day (or the epoch) when the sun
    // never crosses the event's altitude.
    if local.date_naive() != date {
        return Err(CoreError::AstronomicalComputation {
            date,
            reason: format!(
                "{event} does not occur at {} ({} computed)",
                location.coordinates(),
                local.format("%Y-%m-%d %H:%M")
            ),
        });
    }

    Ok(TimeOfDay::from(local.time()))
}
