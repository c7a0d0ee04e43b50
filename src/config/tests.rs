use super::builder::default_config_content;
use super::validation::validate_config;
use super::*;
use crate::geo::SolarEvent;
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

fn parse(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

#[test]
#[serial]
fn test_config_load_default_creation() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir
        .path()
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME);

    let original = std::env::var("XDG_CONFIG_HOME").ok();
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    let result = Config::load();

    unsafe {
        match original {
            Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    if let Err(e) = &result {
        eprintln!("Config::load() failed: {:?}", e);
    }
    assert!(config_path.exists());
    let config = result.unwrap();
    assert_eq!(config.backend, Some(Backend::Gpio));
    assert_eq!(config.pins(), Config::default().pins());
}

#[test]
fn test_default_template_round_trips_to_defaults() {
    let config = parse(&default_config_content()).unwrap();
    let defaults = Config::default();

    assert_eq!(config.location().unwrap(), defaults.location().unwrap());
    assert_eq!(config.solar_clock(), defaults.solar_clock());
    assert_eq!(
        config.device_settings().unwrap(),
        defaults.device_settings().unwrap()
    );
    assert_eq!(config.recompute_time(), defaults.recompute_time());
    assert_eq!(config.interior_light_offset(), DEFAULT_INTERIOR_LIGHT_OFFSET);
    assert_eq!(config.tick_interval(), defaults.tick_interval());
    assert_eq!(config.gpio_chip(), DEFAULT_GPIO_CHIP);
}

#[test]
fn test_empty_file_uses_defaults() {
    let config = parse("").unwrap();
    let location = config.location().unwrap();
    assert_eq!(location.name, DEFAULT_LOCATION_NAME);
    assert_eq!(location.timezone, chrono_tz::America::Los_Angeles);
    assert_eq!(config.solar_clock().opening(), SolarEvent::Sunrise);
    assert_eq!(config.solar_clock().closing(), SolarEvent::Dusk);
    assert_eq!(config.recompute_time(), TimeOfDay::new(0, 1).unwrap());
    assert!(config.schedule_enabled());
    assert_eq!(config.pins().motor_forward, DEFAULT_MOTOR_FORWARD_PIN);
}

#[test]
fn test_partial_file_overrides_fields() {
    let config = parse(
        r#"
backend = "simulated"
timezone = "Europe/Berlin"
latitude = 52.52
longitude = 13.405
open_event = "dawn"
close_event = "sunset"
recompute_time = "3:30"
schedule_enabled = false
travel_time = 35
open_button = 7
"#,
    )
    .unwrap();

    assert_eq!(config.backend, Some(Backend::Simulated));
    assert_eq!(
        config.location().unwrap().timezone,
        chrono_tz::Europe::Berlin
    );
    assert_eq!(
        config.solar_clock(),
        SolarClock::new(SolarEvent::Dawn, SolarEvent::Sunset)
    );
    assert_eq!(config.recompute_time(), TimeOfDay::new(3, 30).unwrap());
    assert!(!config.schedule_enabled());
    assert_eq!(
        config.device_settings().unwrap().travel_time,
        Duration::from_secs(35)
    );
    assert_eq!(config.pins().open_button, 7);
    assert_eq!(config.pins().close_button, DEFAULT_CLOSE_BUTTON_PIN);
}

#[test]
fn test_rejects_unknown_keys_and_values() {
    assert!(parse("night_temp = 3300").is_err());
    assert!(parse("backend = \"wayland\"").is_err());
    assert!(parse("open_event = \"noon\"").is_err());
    assert!(parse("recompute_time = \"25:00\"").is_err());
}

#[test]
fn test_rejects_invalid_timezone() {
    let err = parse("timezone = \"Mars/Olympus_Mons\"").unwrap_err();
    assert!(err.to_string().contains("Mars/Olympus_Mons"), "{err}");
}

#[test]
fn test_rejects_out_of_range_values() {
    for content in [
        "latitude = 91.0",
        "longitude = -181.0",
        "elevation = 10000.0",
        "interior_light_offset = 181",
        "travel_time = 0",
        "travel_time = 60",
        "stop_poll_interval = 5",
        "tick_interval = 6000",
        "location_name = \"  \"",
    ] {
        assert!(parse(content).is_err(), "accepted {content}");
    }

    assert!(parse("travel_time = 50").is_ok());
    assert!(parse("tick_interval = 100").is_ok());
    assert!(parse("interior_light_offset = 0").is_ok());
}

#[test]
fn test_rejects_close_event_before_open_event() {
    let err = parse("open_event = \"dusk\"\nclose_event = \"sunrise\"").unwrap_err();
    assert!(err.to_string().contains("open_event"), "{err}");
    assert!(parse("open_event = \"sunset\"\nclose_event = \"sunset\"").is_err());
}

#[test]
fn test_rejects_duplicate_and_out_of_range_pins() {
    let err = parse("stop_button = 18").unwrap_err();
    assert!(err.to_string().contains("GPIO line 18"), "{err}");

    assert!(parse("override_led = 54").is_err());
    assert!(parse("override_led = 53").is_ok());
}

#[test]
fn test_load_from_path_reports_missing_file() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join(CONFIG_FILE_NAME);
    assert!(load_from_path(&path).is_err());

    fs::write(&path, "tick_interval = 500\n").unwrap();
    let config = load_from_path(&path).unwrap();
    assert_eq!(config.tick_interval(), Duration::from_millis(500));
}

#[test]
fn test_load_from_path_reports_invalid_file() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "travel_time = \"long\"\n").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config"), "{err:#}");
}
