//! Configuration validation.
//!
//! Rejects values that would leave the door misbehaving: out-of-range timings,
//! an unknown timezone, a closing event before the opening event, or two
//! functions wired to the same GPIO line.

use anyhow::{Result, bail};
use std::collections::HashMap;

use super::Config;
use crate::constants::*;

pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(name) = &config.location_name
        && name.trim().is_empty()
    {
        bail!("location_name must not be empty");
    }

    config.timezone()?;

    if let Some(lat) = config.latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    if let Some(lon) = config.longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    if let Some(elevation) = config.elevation
        && !(MINIMUM_ELEVATION..=MAXIMUM_ELEVATION).contains(&elevation)
    {
        bail!(
            "elevation ({} m) must be between {} and {} metres",
            elevation,
            MINIMUM_ELEVATION,
            MAXIMUM_ELEVATION
        );
    }

    let clock = config.solar_clock();
    if clock.opening() >= clock.closing() {
        bail!(
            "open_event ({}) must come before close_event ({}) in the day",
            clock.opening(),
            clock.closing()
        );
    }

    if let Some(offset) = config.interior_light_offset
        && offset > MAXIMUM_INTERIOR_LIGHT_OFFSET
    {
        bail!(
            "interior_light_offset ({} minutes) must be between 0 and {} minutes",
            offset,
            MAXIMUM_INTERIOR_LIGHT_OFFSET
        );
    }

    validate_range(
        config.travel_time,
        MINIMUM_TRAVEL_TIME,
        MAXIMUM_TRAVEL_TIME,
        "travel_time",
        "seconds",
    )?;
    validate_range(
        config.stop_poll_interval,
        MINIMUM_STOP_POLL_INTERVAL_MS,
        MAXIMUM_STOP_POLL_INTERVAL_MS,
        "stop_poll_interval",
        "milliseconds",
    )?;
    validate_range(
        config.tick_interval,
        MINIMUM_TICK_INTERVAL_MS,
        MAXIMUM_TICK_INTERVAL_MS,
        "tick_interval",
        "milliseconds",
    )?;

    validate_pins(config)
}

fn validate_range(value: Option<u64>, min: u64, max: u64, field: &str, unit: &str) -> Result<()> {
    if let Some(value) = value
        && !(min..=max).contains(&value)
    {
        bail!("{field} ({value}) must be between {min} and {max} {unit}");
    }
    Ok(())
}

fn validate_pins(config: &Config) -> Result<()> {
    let mut used: HashMap<u32, &str> = HashMap::new();

    for (name, pin) in config.pins().named() {
        if pin > MAXIMUM_GPIO_PIN {
            bail!("{name} ({pin}) must be a GPIO line between 0 and {MAXIMUM_GPIO_PIN}");
        }
        if let Some(other) = used.insert(pin, name) {
            bail!("{name} and {other} are both assigned to GPIO line {pin}");
        }
    }
    Ok(())
}
