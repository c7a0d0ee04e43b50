//! Time handling for the controller.
//!
//! - [`source`]: the clock the control loop reads and sleeps through, real or simulated.
//! - [`of_day`]: minute-resolution [`TimeOfDay`] used for schedule triggers.

pub mod of_day;
pub mod source;

pub use of_day::{InvalidTimeOfDay, TimeOfDay};
pub use source::{RealTimeSource, SimulatedTimeSource, TimeSource};
