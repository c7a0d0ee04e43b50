//! Default configuration file generation.
//!
//! The default file lists every setting with its default value and an aligned
//! comment, grouped into sections, so it doubles as documentation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::Backend;
use super::loading::private_path;
use crate::constants::*;
use crate::geo::SolarClock;

/// Write the commented default configuration to `path`.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    fs::write(path, default_config_content())
        .with_context(|| format!("Failed to write default config to {}", private_path(path)))?;

    log_block_start!("Created default configuration");
    log_indented!("{}", private_path(path));
    Ok(())
}

pub(crate) fn default_config_content() -> String {
    let clock = SolarClock::default();

    let builder = ConfigBuilder::new()
        .add_section("Hardware")
        .add_setting(
            "backend",
            &format!("\"{}\"", Backend::default().as_str()),
            "Backend to use: \"gpio\" or \"simulated\"",
        )
        .add_setting(
            "gpio_chip",
            &format!("\"{DEFAULT_GPIO_CHIP}\""),
            "GPIO character device",
        )
        .add_section("Location")
        .add_setting(
            "location_name",
            &format!("\"{DEFAULT_LOCATION_NAME}\""),
            "Name shown in the logs",
        )
        .add_setting("region", &format!("\"{DEFAULT_REGION}\""), "Country or region")
        .add_setting(
            "timezone",
            &format!("\"{DEFAULT_TIMEZONE}\""),
            "IANA timezone the schedule runs in",
        )
        .add_setting(
            "latitude",
            &DEFAULT_LATITUDE.to_string(),
            "Geographic latitude (-90 to 90)",
        )
        .add_setting(
            "longitude",
            &DEFAULT_LONGITUDE.to_string(),
            "Geographic longitude (-180 to 180)",
        )
        .add_section("Schedule")
        .add_setting(
            "open_event",
            &format!("\"{}\"", clock.opening()),
            "Solar event that opens the door: dawn, sunrise, sunset or dusk",
        )
        .add_setting(
            "close_event",
            &format!("\"{}\"", clock.closing()),
            "Solar event that closes the door (dusk = civil dusk)",
        )
        .add_setting(
            "interior_light_offset",
            &DEFAULT_INTERIOR_LIGHT_OFFSET.to_string(),
            &format!(
                "Minutes before closing to toggle the interior light (0-{MAXIMUM_INTERIOR_LIGHT_OFFSET})"
            ),
        )
        .add_setting(
            "light_on_close",
            &DEFAULT_LIGHT_ON_CLOSE.to_string(),
            "Switch the interior light on once the door has closed",
        )
        .add_setting(
            "schedule_enabled",
            &DEFAULT_SCHEDULE_ENABLED.to_string(),
            "Start with automatic door actions enabled",
        )
        .add_setting(
            "recompute_time",
            &format!("\"{DEFAULT_RECOMPUTE_TIME}\""),
            "Time of day the schedule is rebuilt (HH:MM)",
        )
        .add_section("Door")
        .add_setting(
            "travel_time",
            &DEFAULT_TRAVEL_TIME.to_string(),
            &format!(
                "Motor run time for a full open or close ({MINIMUM_TRAVEL_TIME}-{MAXIMUM_TRAVEL_TIME}) seconds"
            ),
        )
        .add_setting(
            "stop_poll_interval",
            &DEFAULT_STOP_POLL_INTERVAL_MS.to_string(),
            &format!(
                "Stop button check while moving ({MINIMUM_STOP_POLL_INTERVAL_MS}-{MAXIMUM_STOP_POLL_INTERVAL_MS})ms"
            ),
        )
        .add_setting(
            "tick_interval",
            &DEFAULT_TICK_INTERVAL_MS.to_string(),
            &format!(
                "Control loop period ({MINIMUM_TICK_INTERVAL_MS}-{MAXIMUM_TICK_INTERVAL_MS})ms"
            ),
        )
        .add_section("Pins (BCM line offsets)");

    let pins = [
        ("open_button", DEFAULT_OPEN_BUTTON_PIN, "Open button, active low"),
        ("close_button", DEFAULT_CLOSE_BUTTON_PIN, "Close button, active low"),
        ("stop_button", DEFAULT_STOP_BUTTON_PIN, "Stop button, active low"),
        (
            "override_button",
            DEFAULT_OVERRIDE_BUTTON_PIN,
            "Schedule override button, active low",
        ),
        ("light_button", DEFAULT_LIGHT_BUTTON_PIN, "Coop light button, active low"),
        ("motor_forward", DEFAULT_MOTOR_FORWARD_PIN, "H-bridge input, opens the door"),
        ("motor_backward", DEFAULT_MOTOR_BACKWARD_PIN, "H-bridge input, closes the door"),
        ("coop_light_relay", DEFAULT_COOP_LIGHT_RELAY_PIN, "Coop light relay"),
        (
            "interior_light_relay",
            DEFAULT_INTERIOR_LIGHT_RELAY_PIN,
            "Interior light relay",
        ),
        ("override_led", DEFAULT_OVERRIDE_LED_PIN, "Schedule-off indicator LED"),
    ];

    let builder = pins.iter().fold(builder, |builder, (key, pin, comment)| {
        builder.add_setting(key, &pin.to_string(), comment)
    });

    let mut content = builder.build();
    content.push('\n');
    content
}

/// Builds aligned `key = value  # comment` lines grouped in sections.
struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                ConfigEntry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1; // one space before the comment

        let mut result = Vec::new();
        let mut first_section = true;

        for entry in self.entries {
            match entry {
                ConfigEntry::Section(title) => {
                    if !first_section {
                        result.push(String::new());
                    }
                    result.push(title);
                    first_section = false;
                }
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        result.join("\n")
    }
}
