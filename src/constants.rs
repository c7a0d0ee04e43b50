//! Application-wide defaults and limits.
//!
//! Configuration fields are all optional; anything missing from `coopdoor.toml`
//! resolves to the defaults below. Limits are enforced by `config::validation`.

// # File Locations

pub const CONFIG_DIR_NAME: &str = "coopdoor";
pub const CONFIG_FILE_NAME: &str = "coopdoor.toml";
pub const LOCK_FILE_NAME: &str = "coopdoor.lock";

// # Location (Lincoln City, Oregon)

pub const DEFAULT_LOCATION_NAME: &str = "Lincoln City";
pub const DEFAULT_REGION: &str = "USA";
pub const DEFAULT_TIMEZONE: &str = "America/Los_Angeles";
pub const DEFAULT_LATITUDE: f64 = 45.014;
pub const DEFAULT_LONGITUDE: f64 = -123.909;

pub const MINIMUM_ELEVATION: f64 = -500.0;
pub const MAXIMUM_ELEVATION: f64 = 9000.0;

// # Schedule

pub const DEFAULT_RECOMPUTE_TIME: &str = "00:01";
/// Minutes before the closing event at which the interior light toggles.
pub const DEFAULT_INTERIOR_LIGHT_OFFSET: u16 = 10;
pub const MAXIMUM_INTERIOR_LIGHT_OFFSET: u16 = 180;
pub const DEFAULT_LIGHT_ON_CLOSE: bool = true;
pub const DEFAULT_SCHEDULE_ENABLED: bool = true;

// # Door mechanics

/// Seconds the motor runs for a full open or close.
pub const DEFAULT_TRAVEL_TIME: u64 = 20;
pub const MINIMUM_TRAVEL_TIME: u64 = 1;
/// Kept under a minute so a drive can never swallow a whole schedule minute.
pub const MAXIMUM_TRAVEL_TIME: u64 = 50;

/// Milliseconds between stop-button checks while the motor runs.
pub const DEFAULT_STOP_POLL_INTERVAL_MS: u64 = 50;
pub const MINIMUM_STOP_POLL_INTERVAL_MS: u64 = 10;
pub const MAXIMUM_STOP_POLL_INTERVAL_MS: u64 = 1000;

/// Milliseconds between control loop iterations.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;
pub const MINIMUM_TICK_INTERVAL_MS: u64 = 100;
pub const MAXIMUM_TICK_INTERVAL_MS: u64 = 5000;

/// Longest uninterrupted sleep while waiting for the next tick.
pub const SHUTDOWN_CHECK_SLICE_MS: u64 = 100;

// # GPIO wiring (BCM numbering)

pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";
pub const GPIO_CONSUMER: &str = "coopdoor";
pub const MAXIMUM_GPIO_PIN: u32 = 53;

pub const DEFAULT_OPEN_BUTTON_PIN: u32 = 18;
pub const DEFAULT_CLOSE_BUTTON_PIN: u32 = 23;
pub const DEFAULT_STOP_BUTTON_PIN: u32 = 24;
pub const DEFAULT_OVERRIDE_BUTTON_PIN: u32 = 25;
pub const DEFAULT_LIGHT_BUTTON_PIN: u32 = 17;
pub const DEFAULT_MOTOR_FORWARD_PIN: u32 = 14;
pub const DEFAULT_MOTOR_BACKWARD_PIN: u32 = 15;
pub const DEFAULT_COOP_LIGHT_RELAY_PIN: u32 = 21;
pub const DEFAULT_INTERIOR_LIGHT_RELAY_PIN: u32 = 5;
pub const DEFAULT_OVERRIDE_LED_PIN: u32 = 4;

// # Exit codes

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
