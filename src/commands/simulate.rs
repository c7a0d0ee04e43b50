//! `coopdoor simulate`: run the controller on simulated hardware and time.
//!
//! Installs a [`SimulatedTimeSource`] before anything logs so every line carries
//! the simulated timestamp, then hands control back to the caller, which runs
//! the normal controller with the simulated backend.

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

use crate::config::Config;
use crate::logger::Log;
use crate::time::SimulatedTimeSource;
use crate::time::source::{self, parse_datetime_in_tz};

/// Set up the simulated clock for `start_time`..`end_time`.
///
/// Times are wall-clock times at the configured location. `multiplier` 0 runs in
/// fast-forward; otherwise simulated time runs `multiplier` times real time.
pub fn handle_simulate_command(
    config: &Config,
    start_time: &str,
    end_time: &str,
    multiplier: f64,
) -> Result<()> {
    let timezone = config.timezone()?;
    let (start, end) = parse_window(start_time, end_time, timezone)?;

    source::init_time_source(Arc::new(SimulatedTimeSource::new(start, end, multiplier)));
    Log::set_display_timezone(timezone);

    log_version!();
    log_block_start!("Simulation Mode");
    log_decorated!(
        "Simulating from {} to {} ({})",
        start.with_timezone(&timezone).format("%Y-%m-%d %H:%M:%S"),
        end.with_timezone(&timezone).format("%Y-%m-%d %H:%M:%S"),
        timezone
    );

    let duration = end.signed_duration_since(start);
    log_indented!(
        "Total simulated time: {} hours {} minutes",
        duration.num_hours(),
        duration.num_minutes() % 60
    );
    if multiplier == 0.0 {
        log_indented!("Time acceleration: fast-forward (instant execution)");
    } else {
        log_indented!(
            "Time acceleration: {}x (will complete in ~{:.1} seconds)",
            multiplier,
            duration.num_seconds() as f64 / multiplier
        );
    }
    log_indented!("Hardware: simulated board, no GPIO lines are touched");

    Ok(())
}

fn parse_window(
    start_time: &str,
    end_time: &str,
    timezone: Tz,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = parse_datetime_in_tz(start_time, timezone)
        .map_err(|e| anyhow!("Invalid start time: {e}"))?;
    let end =
        parse_datetime_in_tz(end_time, timezone).map_err(|e| anyhow!("Invalid end time: {e}"))?;

    if end <= start {
        bail!("End time must be after start time");
    }
    Ok((start, end))
}

pub fn display_help() {
    log_version!();
    super::help::show_command_usage("simulate");
    log_block_start!("Description:");
    log_indented!("Runs the full controller against in-memory pins and a simulated");
    log_indented!("clock, logging every door and relay action with its simulated time.");
    log_block_start!("Arguments:");
    log_indented!("start                  \"YYYY-MM-DD HH:MM[:SS]\" in the configured timezone");
    log_indented!("end                    Same format, after start");
    log_indented!("multiplier             Simulated seconds per real second (0 = fast-forward)");
    log_block_start!("Example:");
    log_indented!("coopdoor simulate \"2024-06-21 04:00\" \"2024-06-22 04:00\"");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn berlin() -> Config {
        toml::from_str("timezone = \"Europe/Berlin\"").unwrap()
    }

    #[test]
    fn test_window_is_read_in_configured_timezone() {
        let timezone = berlin().timezone().unwrap();
        let (start, end) =
            parse_window("2024-06-21 04:00", "2024-06-21 22:30:15", timezone).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 6, 21, 2, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 6, 21, 20, 30, 15).unwrap());
    }

    #[test]
    fn test_rejects_bad_windows() {
        let config = berlin();
        for (start, end) in [
            ("2024-06-21 04:00", "2024-06-21 04:00"),
            ("2024-06-22 04:00", "2024-06-21 04:00"),
            ("yesterday", "2024-06-21 04:00"),
            ("2024-06-21 04:00", "2024-06-21 25:00"),
        ] {
            assert!(
                handle_simulate_command(&config, start, end, 0.0).is_err(),
                "accepted {start} .. {end}"
            );
        }
    }
}
