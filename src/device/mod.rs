//! Door and relay state machine.
//!
//! [`DeviceController`] is the only owner of the motor and relay drivers and of the
//! state they represent. Every command is synchronous: a door command returns once
//! the motor has been halted again, so two motor commands can never overlap.
//!
//! ```text
//!            open()                          close()
//!  Closed ──────────▶ Opening ──▶ Open ──────────▶ Closing ──▶ Closed
//!    ▲                   │                          │
//!    │                   └──── stop() / probe ──────┤
//!    │                                              ▼
//!    └───────────────── close() ─────────────── Stopped ── open() ──▶ Opening
//! ```
//!
//! A failed driver call leaves the controller in the state it was in before the
//! command.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{ActuatorDriver, IndicatorDriver, RelayDriver};
use crate::constants::*;
use crate::error::CoreError;
use crate::time::TimeSource;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    Closed,
    Opening,
    Open,
    Closing,
    Stopped,
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DoorState::Closed => "closed",
            DoorState::Opening => "opening",
            DoorState::Open => "open",
            DoorState::Closing => "closing",
            DoorState::Stopped => "stopped",
        })
    }
}

/// Door commands, as named in [`CoreError::InvalidTransition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorCommand {
    Open,
    Close,
    Stop,
}

impl fmt::Display for DoorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DoorCommand::Open => "open",
            DoorCommand::Close => "close",
            DoorCommand::Stop => "stop",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    On,
    Off,
}

impl RelayState {
    pub fn is_on(self) -> bool {
        self == RelayState::On
    }

    fn from_bool(on: bool) -> Self {
        if on { RelayState::On } else { RelayState::Off }
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_on() { "on" } else { "off" })
    }
}

/// The relay channels the controller owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relay {
    /// Exterior light over the run, on the front-panel light button.
    CoopLight,
    /// Light inside the coop, switched around closing time.
    InteriorLight,
}

impl fmt::Display for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relay::CoopLight => "coop light",
            Relay::InteriorLight => "interior light",
        })
    }
}

/// How a door command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// The door travelled the full distance.
    Completed,
    /// The door was already there; the motor was not touched.
    AlreadyThere,
    /// The stop probe fired during travel and the door is now `Stopped`.
    Interrupted,
}

/// Mechanical settings for the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSettings {
    /// Motor run time for a full open or close.
    pub travel_time: Duration,
    /// How often the stop probe is checked while the motor runs.
    pub stop_poll_interval: Duration,
    /// Switch the interior light on whenever the door finishes closing.
    pub light_on_close: bool,
    /// Timezone door and relay events are logged in.
    pub timezone: Tz,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            travel_time: Duration::from_secs(DEFAULT_TRAVEL_TIME),
            stop_poll_interval: Duration::from_millis(DEFAULT_STOP_POLL_INTERVAL_MS),
            light_on_close: DEFAULT_LIGHT_ON_CLOSE,
            timezone: chrono_tz::UTC,
        }
    }
}

/// Motor direction for one drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn moving(self) -> DoorState {
        match self {
            Direction::Forward => DoorState::Opening,
            Direction::Backward => DoorState::Closing,
        }
    }

    fn resting(self) -> DoorState {
        match self {
            Direction::Forward => DoorState::Open,
            Direction::Backward => DoorState::Closed,
        }
    }
}

/// Owner of the door motor, both relays and the override indicator.
///
/// Boots in the safe posture: door assumed `Closed`, relays and indicator off.
pub struct DeviceController {
    actuator: Box<dyn ActuatorDriver>,
    coop_light: Box<dyn RelayDriver>,
    interior_light: Box<dyn RelayDriver>,
    indicator: Box<dyn IndicatorDriver>,
    clock: Arc<dyn TimeSource>,
    /// Loop time paired with the clock reading taken when it was set.
    reference: Option<(DateTime<Tz>, DateTime<Utc>)>,
    settings: DeviceSettings,
    door: DoorState,
    coop_light_state: RelayState,
    interior_light_state: RelayState,
    indicator_on: bool,
}

impl DeviceController {
    pub fn new(
        actuator: Box<dyn ActuatorDriver>,
        coop_light: Box<dyn RelayDriver>,
        interior_light: Box<dyn RelayDriver>,
        indicator: Box<dyn IndicatorDriver>,
        clock: Arc<dyn TimeSource>,
        settings: DeviceSettings,
    ) -> Self {
        Self {
            actuator,
            coop_light,
            interior_light,
            indicator,
            clock,
            reference: None,
            settings,
            door: DoorState::Closed,
            coop_light_state: RelayState::Off,
            interior_light_state: RelayState::Off,
            indicator_on: false,
        }
    }

    pub fn door_state(&self) -> DoorState {
        self.door
    }

    pub fn relay_state(&self, which: Relay) -> RelayState {
        match which {
            Relay::CoopLight => self.coop_light_state,
            Relay::InteriorLight => self.interior_light_state,
        }
    }

    pub fn indicator_on(&self) -> bool {
        self.indicator_on
    }

    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    /// Anchor event stamps to the control loop's notion of `now`.
    pub fn set_reference_time(&mut self, now: DateTime<Tz>) {
        self.reference = Some((now, self.clock.now()));
    }

    /// Time door and relay events are stamped with.
    ///
    /// The last reference time plus whatever the clock has advanced since, or the
    /// clock itself when no reference was set.
    pub fn event_time(&self) -> DateTime<Tz> {
        let clock_now = self.clock.now();
        match self.reference {
            Some((reference, taken_at)) => {
                let elapsed = (clock_now - taken_at).max(chrono::Duration::zero());
                (reference + elapsed).with_timezone(&self.settings.timezone)
            }
            None => clock_now.with_timezone(&self.settings.timezone),
        }
    }

    /// Open the door fully, without a stop probe.
    pub fn open(&mut self) -> Result<DriveOutcome, CoreError> {
        self.open_interruptible(|| false)
    }

    /// Close the door fully, without a stop probe.
    pub fn close(&mut self) -> Result<DriveOutcome, CoreError> {
        self.close_interruptible(|| false)
    }

    /// Open the door, checking `stop_probe` every poll interval during travel.
    pub fn open_interruptible(
        &mut self,
        stop_probe: impl FnMut() -> bool,
    ) -> Result<DriveOutcome, CoreError> {
        match self.door {
            DoorState::Open => Ok(DriveOutcome::AlreadyThere),
            DoorState::Closing => Err(CoreError::InvalidTransition {
                from: self.door,
                command: DoorCommand::Open,
            }),
            DoorState::Closed | DoorState::Stopped | DoorState::Opening => {
                self.drive(Direction::Forward, stop_probe)
            }
        }
    }

    /// Close the door, checking `stop_probe` every poll interval during travel.
    ///
    /// Reaching `Closed` switches the interior light on when `light_on_close` is
    /// set. A light already on from the evening entry is left alone. If the relay
    /// fails the door stays `Closed` and the fault is returned.
    pub fn close_interruptible(
        &mut self,
        stop_probe: impl FnMut() -> bool,
    ) -> Result<DriveOutcome, CoreError> {
        let outcome = match self.door {
            DoorState::Closed => return Ok(DriveOutcome::AlreadyThere),
            DoorState::Opening => {
                return Err(CoreError::InvalidTransition {
                    from: self.door,
                    command: DoorCommand::Close,
                });
            }
            DoorState::Open | DoorState::Stopped | DoorState::Closing => {
                self.drive(Direction::Backward, stop_probe)?
            }
        };

        if outcome == DriveOutcome::Completed && self.settings.light_on_close {
            self.set_relay(Relay::InteriorLight, true)?;
        }
        Ok(outcome)
    }

    /// Halt the motor now. Valid from every state and never touches the lights.
    pub fn stop(&mut self) -> Result<(), CoreError> {
        self.actuator.halt()?;
        if self.door != DoorState::Stopped {
            log_decorated!("Door stopped ({} before)", self.door);
        }
        self.door = DoorState::Stopped;
        Ok(())
    }

    /// Set a relay. No driver call when it is already in the requested state.
    pub fn set_relay(&mut self, which: Relay, on: bool) -> Result<(), CoreError> {
        let target = RelayState::from_bool(on);
        if self.relay_state(which) == target {
            return Ok(());
        }

        match which {
            Relay::CoopLight => self.coop_light.set(on)?,
            Relay::InteriorLight => self.interior_light.set(on)?,
        }
        match which {
            Relay::CoopLight => self.coop_light_state = target,
            Relay::InteriorLight => self.interior_light_state = target,
        }
        log_decorated!("{which} relay {target} at {}", self.wall_clock());
        Ok(())
    }

    pub fn toggle_relay(&mut self, which: Relay) -> Result<RelayState, CoreError> {
        let on = !self.relay_state(which).is_on();
        self.set_relay(which, on)?;
        Ok(self.relay_state(which))
    }

    /// Drive the "schedule off" LED.
    pub fn set_override_indicator(&mut self, on: bool) -> Result<(), CoreError> {
        if self.indicator_on == on {
            return Ok(());
        }
        self.indicator.set(on)?;
        self.indicator_on = on;
        Ok(())
    }

    /// Halt the motor and switch every output off.
    ///
    /// Every step is attempted even if an earlier one fails; the first failure is
    /// returned.
    pub fn safe_shutdown(&mut self) -> Result<(), CoreError> {
        let results = [
            self.stop(),
            self.set_relay(Relay::CoopLight, false),
            self.set_relay(Relay::InteriorLight, false),
            self.set_override_indicator(false),
        ];
        results.into_iter().collect()
    }

    fn drive(
        &mut self,
        direction: Direction,
        mut stop_probe: impl FnMut() -> bool,
    ) -> Result<DriveOutcome, CoreError> {
        let before = self.door;
        let energise = match direction {
            Direction::Forward => self.actuator.drive_forward(),
            Direction::Backward => self.actuator.drive_backward(),
        };
        if let Err(e) = energise {
            // Best effort halt after a failed drive.
            let _ = self.actuator.halt();
            return Err(e.into());
        }

        self.door = direction.moving();
        log_block_start!("Door {} at {}", self.door, self.wall_clock());

        let completed = self.wait_for_travel(&mut stop_probe);

        if let Err(e) = self.actuator.halt() {
            self.door = before;
            return Err(e.into());
        }

        if !completed {
            self.door = DoorState::Stopped;
            log_decorated!("Stop requested, door halted part way");
            return Ok(DriveOutcome::Interrupted);
        }

        self.door = direction.resting();
        log_decorated!("Door {} at {}", self.door, self.wall_clock());
        Ok(DriveOutcome::Completed)
    }

    /// Sleep out the travel time in poll-interval slices.
    ///
    /// Returns false as soon as the probe fires.
    fn wait_for_travel(&self, stop_probe: &mut impl FnMut() -> bool) -> bool {
        let travel = self.settings.travel_time;
        let slice = self.settings.stop_poll_interval.max(Duration::from_millis(1));
        let mut elapsed = Duration::ZERO;

        while elapsed < travel {
            if stop_probe() {
                return false;
            }
            let step = slice.min(travel - elapsed);
            self.clock.sleep(step);
            elapsed += step;
        }
        true
    }

    fn wall_clock(&self) -> String {
        self.event_time().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
