//! Log output for computed solar times.

use super::{Location, SolarClock, SolarTimes};

/// Log the day's opening and closing times as an indented block.
pub fn log_solar_times(times: &SolarTimes, clock: &SolarClock, location: &Location) {
    log_block_start!(
        "Solar times for {} on {}",
        location,
        times.date.format("%A, %B %-d %Y")
    );
    log_indented!("Coordinates: {}", location.coordinates());
    log_indented!("Timezone: {}", location.timezone);
    if let Some(elevation) = location.elevation {
        log_indented!("Elevation: {elevation:.0} m");
    }
    log_indented!("Opening ({}): {}", clock.opening(), times.sunrise);
    log_indented!("Closing ({}): {}", clock.closing(), times.dusk);

    let daylight = times.dusk.minutes_since_midnight() - times.sunrise.minutes_since_midnight();
    log_indented!("Door open for {}h {:02}m", daylight / 60, daylight % 60);
}
