//! Typed errors raised by the controller core.
//!
//! Application plumbing (configuration, CLI, lock file) reports through `anyhow`;
//! the solar clock, the device controller and the control loop return [`CoreError`]
//! so the loop can decide per variant whether to carry on or shut down.

use chrono::NaiveDate;

use crate::backend::DriverError;
use crate::device::{DoorCommand, DoorState};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The solar algorithm gave no usable time for this date and place.
    ///
    /// Recoverable: the previous schedule stays in force and the next daily
    /// recompute tries again.
    #[error("solar times unavailable for {date}: {reason}")]
    AstronomicalComputation { date: NaiveDate, reason: String },

    /// A driver call failed. Door and relay state are left as they were.
    #[error("actuator fault: {0}")]
    ActuatorFault(#[from] DriverError),

    /// A door command arrived in a state that can never accept it.
    #[error("invalid transition: cannot {command} while the door is {from}")]
    InvalidTransition { from: DoorState, command: DoorCommand },
}

impl CoreError {
    /// Whether the control loop must stop after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CoreError::InvalidTransition { .. })
    }
}
