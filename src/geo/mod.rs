//! Where the coop is and when the sun does what there.
//!
//! ## Module Structure
//!
//! - [`location`]: the fixed [`Location`] the controller runs at
//! - [`solar`]: the [`SolarClock`] turning a date and location into opening and
//!   closing times
//! - [`display`]: log output for computed solar times

pub mod display;
pub mod location;
pub mod solar;

pub use display::log_solar_times;
pub use location::Location;
pub use solar::{SolarClock, SolarEvent, SolarTimes};

#[cfg(test)]
mod tests;
