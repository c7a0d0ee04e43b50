//! Configuration system for coopdoor.
//!
//! Settings live in a single TOML file, `coopdoor.toml`, found at:
//! 1. **--config DIR**/coopdoor.toml when a directory is given on the command line
//! 2. **XDG_CONFIG_HOME**/coopdoor/coopdoor.toml otherwise
//!
//! A commented default file is written on first start. Every field is optional;
//! missing fields resolve to the defaults in [`crate::constants`].
//!
//! ```toml
//! #[Hardware]
//! backend = "gpio"                  # "gpio" or "simulated"
//! gpio_chip = "/dev/gpiochip0"      # GPIO character device
//!
//! #[Location]
//! location_name = "Lincoln City"
//! region = "USA"
//! timezone = "America/Los_Angeles"
//! latitude = 45.014
//! longitude = -123.909
//!
//! #[Schedule]
//! open_event = "sunrise"            # dawn, sunrise, sunset or dusk
//! close_event = "dusk"
//! interior_light_offset = 10        # minutes before closing (0-180)
//! light_on_close = true
//! schedule_enabled = true
//! recompute_time = "00:01"
//!
//! #[Door]
//! travel_time = 20                  # seconds (1-50)
//! stop_poll_interval = 50           # milliseconds (10-1000)
//! tick_interval = 1000              # milliseconds (100-5000)
//!
//! #[Pins]
//! open_button = 18
//! ...
//! ```
//!
//! ## Validation
//!
//! Values are range checked on load, the timezone must be a valid IANA name, the
//! opening event must come before the closing event, and no GPIO line may be
//! assigned twice. Errors name the offending field.

pub mod builder;
pub mod loading;
pub mod validation;

use anyhow::{Result, anyhow};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::*;
use crate::device::DeviceSettings;
use crate::geo::{Location, SolarClock, SolarEvent};
use crate::time::TimeOfDay;

pub use builder::create_default_config;
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};

/// Hardware backend selection.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Linux GPIO character device.
    #[default]
    Gpio,
    /// In-memory pins that only log. No hardware needed.
    Simulated,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Gpio => "gpio",
            Backend::Simulated => "simulated",
        }
    }
}

/// GPIO line offsets for every button and output on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinAssignment {
    pub open_button: u32,
    pub close_button: u32,
    pub stop_button: u32,
    pub override_button: u32,
    pub light_button: u32,
    pub motor_forward: u32,
    pub motor_backward: u32,
    pub coop_light_relay: u32,
    pub interior_light_relay: u32,
    pub override_led: u32,
}

impl PinAssignment {
    /// Every pin with its configuration key, in file order.
    pub fn named(&self) -> [(&'static str, u32); 10] {
        [
            ("open_button", self.open_button),
            ("close_button", self.close_button),
            ("stop_button", self.stop_button),
            ("override_button", self.override_button),
            ("light_button", self.light_button),
            ("motor_forward", self.motor_forward),
            ("motor_backward", self.motor_backward),
            ("coop_light_relay", self.coop_light_relay),
            ("interior_light_relay", self.interior_light_relay),
            ("override_led", self.override_led),
        ]
    }
}

/// Contents of `coopdoor.toml`.
///
/// Fields stay optional so a partial file is valid; the accessor methods resolve
/// defaults. Unknown keys are rejected so typos do not go unnoticed.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub backend: Option<Backend>,

    // Location
    pub location_name: Option<String>,
    pub region: Option<String>,
    pub timezone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>, // metres

    // Schedule
    pub open_event: Option<SolarEvent>,
    pub close_event: Option<SolarEvent>,
    pub interior_light_offset: Option<u16>, // minutes
    pub light_on_close: Option<bool>,
    pub schedule_enabled: Option<bool>,
    pub recompute_time: Option<TimeOfDay>,

    // Door mechanics
    pub travel_time: Option<u64>,        // seconds
    pub stop_poll_interval: Option<u64>, // milliseconds
    pub tick_interval: Option<u64>,      // milliseconds

    // GPIO
    pub gpio_chip: Option<String>,
    pub open_button: Option<u32>,
    pub close_button: Option<u32>,
    pub stop_button: Option<u32>,
    pub override_button: Option<u32>,
    pub light_button: Option<u32>,
    pub motor_forward: Option<u32>,
    pub motor_backward: Option<u32>,
    pub coop_light_relay: Option<u32>,
    pub interior_light_relay: Option<u32>,
    pub override_led: Option<u32>,
}

impl Config {
    /// Load configuration using the module's load function
    pub fn load() -> Result<Self> {
        load()
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        load_from_path(path)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        get_config_path()
    }

    pub fn timezone(&self) -> Result<Tz> {
        let name = self.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE);
        name.parse::<Tz>()
            .map_err(|_| anyhow!("timezone '{name}' is not a valid IANA timezone name"))
    }

    pub fn location(&self) -> Result<Location> {
        Ok(Location {
            name: self
                .location_name
                .clone()
                .unwrap_or_else(|| DEFAULT_LOCATION_NAME.to_string()),
            region: self
                .region
                .clone()
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            timezone: self.timezone()?,
            latitude: self.latitude.unwrap_or(DEFAULT_LATITUDE),
            longitude: self.longitude.unwrap_or(DEFAULT_LONGITUDE),
            elevation: self.elevation,
        })
    }

    pub fn solar_clock(&self) -> SolarClock {
        let default = SolarClock::default();
        SolarClock::new(
            self.open_event.unwrap_or(default.opening()),
            self.close_event.unwrap_or(default.closing()),
        )
    }

    pub fn device_settings(&self) -> Result<DeviceSettings> {
        Ok(DeviceSettings {
            travel_time: Duration::from_secs(self.travel_time.unwrap_or(DEFAULT_TRAVEL_TIME)),
            stop_poll_interval: Duration::from_millis(
                self.stop_poll_interval
                    .unwrap_or(DEFAULT_STOP_POLL_INTERVAL_MS),
            ),
            light_on_close: self.light_on_close.unwrap_or(DEFAULT_LIGHT_ON_CLOSE),
            timezone: self.timezone()?,
        })
    }

    pub fn recompute_time(&self) -> TimeOfDay {
        self.recompute_time.unwrap_or_else(|| {
            DEFAULT_RECOMPUTE_TIME
                .parse()
                .unwrap_or(TimeOfDay::MIDNIGHT)
        })
    }

    pub fn interior_light_offset(&self) -> u16 {
        self.interior_light_offset
            .unwrap_or(DEFAULT_INTERIOR_LIGHT_OFFSET)
    }

    pub fn schedule_enabled(&self) -> bool {
        self.schedule_enabled.unwrap_or(DEFAULT_SCHEDULE_ENABLED)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval.unwrap_or(DEFAULT_TICK_INTERVAL_MS))
    }

    pub fn gpio_chip(&self) -> String {
        self.gpio_chip
            .clone()
            .unwrap_or_else(|| DEFAULT_GPIO_CHIP.to_string())
    }

    pub fn pins(&self) -> PinAssignment {
        PinAssignment {
            open_button: self.open_button.unwrap_or(DEFAULT_OPEN_BUTTON_PIN),
            close_button: self.close_button.unwrap_or(DEFAULT_CLOSE_BUTTON_PIN),
            stop_button: self.stop_button.unwrap_or(DEFAULT_STOP_BUTTON_PIN),
            override_button: self.override_button.unwrap_or(DEFAULT_OVERRIDE_BUTTON_PIN),
            light_button: self.light_button.unwrap_or(DEFAULT_LIGHT_BUTTON_PIN),
            motor_forward: self.motor_forward.unwrap_or(DEFAULT_MOTOR_FORWARD_PIN),
            motor_backward: self.motor_backward.unwrap_or(DEFAULT_MOTOR_BACKWARD_PIN),
            coop_light_relay: self
                .coop_light_relay
                .unwrap_or(DEFAULT_COOP_LIGHT_RELAY_PIN),
            interior_light_relay: self
                .interior_light_relay
                .unwrap_or(DEFAULT_INTERIOR_LIGHT_RELAY_PIN),
            override_led: self.override_led.unwrap_or(DEFAULT_OVERRIDE_LED_PIN),
        }
    }

    pub fn log_config(&self) {
        log_block_start!("Loaded configuration");
        log_indented!("Backend: {}", self.backend.unwrap_or_default().as_str());

        match self.location() {
            Ok(location) => {
                log_indented!("Location: {} ({})", location, location.coordinates());
                log_indented!("Timezone: {}", location.timezone);
            }
            Err(e) => log_indented!("Location: {e}"),
        }

        let clock = self.solar_clock();
        log_indented!("Open at {}, close at {}", clock.opening(), clock.closing());
        log_indented!(
            "Interior light: {} minutes before closing{}",
            self.interior_light_offset(),
            if self.light_on_close.unwrap_or(DEFAULT_LIGHT_ON_CLOSE) {
                ", on once closed"
            } else {
                ""
            }
        );
        log_indented!("Daily recompute at {}", self.recompute_time());
        if !self.schedule_enabled() {
            log_indented!("Schedule disabled at boot (override on)");
        }
        log_indented!(
            "Travel time: {}s, tick interval: {}ms",
            self.travel_time.unwrap_or(DEFAULT_TRAVEL_TIME),
            self.tick_interval().as_millis()
        );
    }
}

#[cfg(test)]
mod tests;
