//! In-memory hardware for dry runs and tests.
//!
//! A [`SimulatedBench`] is a cheap cloneable handle on shared pin state. The drivers
//! built by [`SimulatedBench::into_drivers`] write to that state, and the handle kept
//! by the caller can inspect it, queue button presses and inject faults.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    ActuatorDriver, ButtonEdges, DriverError, Drivers, IndicatorDriver, InputDriver, RelayDriver,
};

/// Output channels on the simulated board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Motor,
    CoopLight,
    InteriorLight,
    Indicator,
}

/// Front-panel buttons on the simulated board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Open,
    Close,
    Stop,
    Override,
    Light,
}

/// What the motor is currently being told to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Motor {
    #[default]
    Idle,
    Forward,
    Backward,
}

/// One call made on the simulated actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Forward,
    Backward,
    Halt,
}

#[derive(Debug, Default)]
struct BenchState {
    motor: Motor,
    actuator_calls: Vec<ActuatorCall>,
    coop_light: bool,
    interior_light: bool,
    indicator: bool,
    relay_writes: usize,
    pending: ButtonEdges,
    /// Stop fires on this many-th `stop_requested` call after arming.
    stop_after_checks: Option<u32>,
    failing: Vec<Channel>,
}

impl BenchState {
    fn take_fault(&mut self, channel: Channel) -> Result<(), DriverError> {
        match self.failing.iter().position(|c| *c == channel) {
            Some(index) => {
                self.failing.remove(index);
                Err(DriverError::Simulated(format!(
                    "injected fault on {channel:?} channel"
                )))
            }
            None => Ok(()),
        }
    }
}

/// Shared handle on a simulated board.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBench {
    state: Arc<Mutex<BenchState>>,
}

impl SimulatedBench {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BenchState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Build a full driver set wired to this bench.
    pub fn into_drivers(&self) -> Drivers {
        Drivers {
            actuator: Box::new(SimulatedActuator(self.clone())),
            coop_light: Box::new(SimulatedRelay {
                bench: self.clone(),
                channel: Channel::CoopLight,
            }),
            interior_light: Box::new(SimulatedRelay {
                bench: self.clone(),
                channel: Channel::InteriorLight,
            }),
            indicator: Box::new(SimulatedIndicator(self.clone())),
            inputs: Box::new(SimulatedInputs(self.clone())),
            backend_name: "simulated",
        }
    }

    /// Queue a press, reported by the next `poll`.
    pub fn press(&self, button: Button) {
        let mut state = self.lock();
        match button {
            Button::Open => state.pending.open = true,
            Button::Close => state.pending.close = true,
            Button::Stop => state.pending.stop = true,
            Button::Override => state.pending.override_toggle = true,
            Button::Light => state.pending.light = true,
        }
    }

    /// Press stop while the motor runs, on the `checks`-th stop check.
    pub fn press_stop_during_travel(&self, checks: u32) {
        self.lock().stop_after_checks = Some(checks.max(1));
    }

    /// Make the next call on `channel` fail.
    pub fn fail_next(&self, channel: Channel) {
        self.lock().failing.push(channel);
    }

    pub fn motor(&self) -> Motor {
        self.lock().motor
    }

    pub fn actuator_calls(&self) -> Vec<ActuatorCall> {
        self.lock().actuator_calls.clone()
    }

    /// Number of drive commands (forward or backward) issued so far.
    pub fn drive_count(&self) -> usize {
        self.lock()
            .actuator_calls
            .iter()
            .filter(|c| **c != ActuatorCall::Halt)
            .count()
    }

    pub fn is_on(&self, channel: Channel) -> bool {
        let state = self.lock();
        match channel {
            Channel::Motor => state.motor != Motor::Idle,
            Channel::CoopLight => state.coop_light,
            Channel::InteriorLight => state.interior_light,
            Channel::Indicator => state.indicator,
        }
    }

    /// Successful writes across both relays.
    pub fn relay_writes(&self) -> usize {
        self.lock().relay_writes
    }
}

struct SimulatedActuator(SimulatedBench);

impl SimulatedActuator {
    fn command(&mut self, call: ActuatorCall) -> Result<(), DriverError> {
        let mut state = self.0.lock();
        state.take_fault(Channel::Motor)?;
        state.actuator_calls.push(call);
        state.motor = match call {
            ActuatorCall::Forward => Motor::Forward,
            ActuatorCall::Backward => Motor::Backward,
            ActuatorCall::Halt => Motor::Idle,
        };
        log_debug!("Simulated motor: {:?}", state.motor);
        Ok(())
    }
}

impl ActuatorDriver for SimulatedActuator {
    fn drive_forward(&mut self) -> Result<(), DriverError> {
        self.command(ActuatorCall::Forward)
    }

    fn drive_backward(&mut self) -> Result<(), DriverError> {
        self.command(ActuatorCall::Backward)
    }

    fn halt(&mut self) -> Result<(), DriverError> {
        self.command(ActuatorCall::Halt)
    }
}

struct SimulatedRelay {
    bench: SimulatedBench,
    channel: Channel,
}

impl RelayDriver for SimulatedRelay {
    fn set(&mut self, on: bool) -> Result<(), DriverError> {
        let mut state = self.bench.lock();
        state.take_fault(self.channel)?;
        match self.channel {
            Channel::InteriorLight => state.interior_light = on,
            _ => state.coop_light = on,
        }
        state.relay_writes += 1;
        log_debug!("Simulated {:?} relay: {}", self.channel, if on { "on" } else { "off" });
        Ok(())
    }
}

struct SimulatedIndicator(SimulatedBench);

impl IndicatorDriver for SimulatedIndicator {
    fn set(&mut self, on: bool) -> Result<(), DriverError> {
        let mut state = self.0.lock();
        state.take_fault(Channel::Indicator)?;
        state.indicator = on;
        Ok(())
    }
}

struct SimulatedInputs(SimulatedBench);

impl InputDriver for SimulatedInputs {
    fn poll(&mut self) -> Result<ButtonEdges, DriverError> {
        Ok(std::mem::take(&mut self.0.lock().pending))
    }

    fn stop_requested(&mut self) -> Result<bool, DriverError> {
        let mut state = self.0.lock();
        if std::mem::take(&mut state.pending.stop) {
            return Ok(true);
        }
        match state.stop_after_checks {
            Some(1) => {
                state.stop_after_checks = None;
                Ok(true)
            }
            Some(n) => {
                state.stop_after_checks = Some(n - 1);
                Ok(false)
            }
            None => Ok(false),
        }
    }
}
