//! `coopdoor schedule`: print a day's solar times and door schedule.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;

use crate::config::Config;
use crate::geo::log_solar_times;
use crate::schedule::DailyScheduler;
use crate::time::source;

/// Print solar times and the schedule entries for `date` (today when `None`).
pub fn handle_schedule_command(date: Option<&str>) -> Result<()> {
    log_version!();

    let config = Config::load()?;
    let location = config.location()?;
    let clock = config.solar_clock();

    let date = match date {
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{text}', expected YYYY-MM-DD"))?,
        None => source::now().with_timezone(&location.timezone).date_naive(),
    };

    let times = clock
        .compute(date, &location)
        .map_err(|e| anyhow!("{e}"))?;
    log_solar_times(&times, &clock, &location);

    let mut scheduler = DailyScheduler::new(config.recompute_time());
    log_block_start!("Schedule");
    for entry in scheduler.rebuild(times, config.interior_light_offset()) {
        log_indented!("{} {}", entry.trigger_time, entry.action);
    }
    log_indented!("Recomputed daily at {}", scheduler.recompute_at());
    if !config.schedule_enabled() {
        log_warning!("schedule_enabled = false, the controller boots with the override on");
    }

    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    super::help::show_command_usage("schedule");
    log_block_start!("Description:");
    log_indented!("Computes the opening and closing times at the configured location");
    log_indented!("and lists the door and light actions for the day.");
    log_block_start!("Arguments:");
    log_indented!("date                   Day to show, YYYY-MM-DD (default: today)");
    log_end!();
}
