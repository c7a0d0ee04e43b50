use chrono_tz::Tz;
use std::fmt;

use crate::constants::*;

/// The coop's place on the planet. Fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    /// Country or region tag, informational only.
    pub region: String,
    pub timezone: Tz,
    pub latitude: f64,
    pub longitude: f64,
    /// Observer altitude in metres, when known.
    pub elevation: Option<f64>,
}

impl Location {
    /// Lincoln City, Oregon, where the first board was installed.
    pub fn lincoln_city() -> Self {
        Self {
            name: DEFAULT_LOCATION_NAME.to_string(),
            region: DEFAULT_REGION.to_string(),
            timezone: chrono_tz::America::Los_Angeles,
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            elevation: None,
        }
    }

    /// Coordinates formatted as `45.0140°N, 123.9090°W`.
    pub fn coordinates(&self) -> String {
        let ns = if self.latitude >= 0.0 { 'N' } else { 'S' };
        let ew = if self.longitude >= 0.0 { 'E' } else { 'W' };
        format!(
            "{:.4}°{ns}, {:.4}°{ew}",
            self.latitude.abs(),
            self.longitude.abs()
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.region.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}, {}", self.name, self.region)
        }
    }
}
