//! Hardware abstraction for the door motor, relays, indicator LED and buttons.
//!
//! The controller core only talks to the traits in this module. Two implementations
//! ship with the crate:
//!
//! - **GPIO backend** ([`gpio`]): Linux GPIO character device (`/dev/gpiochipN`),
//!   wired like the original coop board: an L298-style H-bridge on two outputs,
//!   active-high relays, and active-low push buttons.
//! - **Simulated backend** ([`simulated`]): in-memory pins that log every call.
//!   Used by `coopdoor simulate` and by the tests.
//!
//! ## Backend Selection
//!
//! `backend = "gpio"` (the default) or `backend = "simulated"` in `coopdoor.toml`.
//! The `simulate` command always uses the simulated backend.

use anyhow::Result;

use crate::config::{Backend, Config};

pub mod gpio;
pub mod simulated;

/// Failure reported by a hardware driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("GPIO request failed: {0}")]
    Gpio(#[from] gpio_cdev::Error),

    #[error("{0}")]
    Simulated(String),
}

/// Door motor. Drive calls energise the motor and return immediately.
///
/// The caller is responsible for timing the travel and calling [`halt`](Self::halt).
#[cfg_attr(test, mockall::automock)]
pub trait ActuatorDriver {
    fn drive_forward(&mut self) -> Result<(), DriverError>;
    fn drive_backward(&mut self) -> Result<(), DriverError>;
    fn halt(&mut self) -> Result<(), DriverError>;
}

/// A single on/off relay channel.
#[cfg_attr(test, mockall::automock)]
pub trait RelayDriver {
    fn set(&mut self, on: bool) -> Result<(), DriverError>;
}

/// The "schedule off" LED.
#[cfg_attr(test, mockall::automock)]
pub trait IndicatorDriver {
    fn set(&mut self, on: bool) -> Result<(), DriverError>;
}

/// Rising edges seen on the front-panel buttons since the previous poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonEdges {
    pub open: bool,
    pub close: bool,
    pub stop: bool,
    pub override_toggle: bool,
    pub light: bool,
}

impl ButtonEdges {
    pub fn any(&self) -> bool {
        self.open || self.close || self.stop || self.override_toggle || self.light
    }
}

/// Front-panel buttons.
#[cfg_attr(test, mockall::automock)]
pub trait InputDriver {
    /// Edges since the last call. Each press is reported once.
    fn poll(&mut self) -> Result<ButtonEdges, DriverError>;

    /// Whether the stop button was pressed since the last check.
    ///
    /// Called every few milliseconds while the motor runs. Consumes the stop edge,
    /// so a press seen here is not reported again by [`poll`](Self::poll).
    fn stop_requested(&mut self) -> Result<bool, DriverError>;
}

/// Every driver the controller needs, built from one backend.
pub struct Drivers {
    pub actuator: Box<dyn ActuatorDriver>,
    pub coop_light: Box<dyn RelayDriver>,
    pub interior_light: Box<dyn RelayDriver>,
    pub indicator: Box<dyn IndicatorDriver>,
    pub inputs: Box<dyn InputDriver>,
    pub backend_name: &'static str,
}

/// Open the drivers for the configured backend.
///
/// `force_simulated` is set by the `simulate` command so a misconfigured
/// `backend = "gpio"` never moves a real door during a dry run.
pub fn create_drivers(config: &Config, force_simulated: bool) -> Result<Drivers> {
    let backend = if force_simulated {
        Backend::Simulated
    } else {
        config.backend.unwrap_or_default()
    };

    match backend {
        Backend::Gpio => gpio::open_drivers(config),
        Backend::Simulated => Ok(simulated::SimulatedBench::new().into_drivers()),
    }
}
