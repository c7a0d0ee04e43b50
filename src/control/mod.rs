//! The polling control loop.
//!
//! One thread, one fixed-period cycle. Each tick:
//!
//! 1. rebuild the day's schedule once the daily recompute time has passed
//! 2. read the front-panel button edges
//! 3. apply an override toggle and mirror it on the indicator LED
//! 4. apply manual door commands (stop wins, open plus close means stop), then
//!    the light button
//! 5. forward the scheduler's due actions unless the override suppresses them
//! 6. wait for the next period, waking early on a shutdown signal
//!
//! Door travel blocks the loop but polls a stop probe that fires on a stop press
//! or a termination signal. Whatever ends the loop, the device is left halted with
//! every output off.

pub mod override_gate;

pub use override_gate::OverrideGate;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{ButtonEdges, InputDriver};
use crate::constants::SHUTDOWN_CHECK_SLICE_MS;
use crate::device::{DeviceController, DoorCommand, DriveOutcome, Relay};
use crate::error::CoreError;
use crate::geo::{Location, SolarClock, SolarTimes, log_solar_times};
use crate::io::signals::SignalMessage;
use crate::schedule::{Action, DailyScheduler};
use crate::time::{TimeOfDay, TimeSource};

#[cfg(test)]
mod tests;

/// Everything a [`ControlLoop`] is assembled from.
pub struct ControlParams {
    pub device: DeviceController,
    pub inputs: Box<dyn InputDriver>,
    pub scheduler: DailyScheduler,
    pub gate: OverrideGate,
    pub solar_clock: SolarClock,
    pub location: Location,
    /// Minutes before closing that the interior light entry fires.
    pub interior_light_offset: u16,
    pub tick_interval: Duration,
    pub clock: Arc<dyn TimeSource>,
    /// Cleared by the signal listener to request shutdown.
    pub running: Arc<AtomicBool>,
    /// Wakes the between-tick wait early. `None` for programmatic runs.
    pub signals: Option<Receiver<SignalMessage>>,
}

/// What one tick did with the scheduler's output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub edges: ButtonEdges,
    /// Actions the scheduler returned this tick.
    pub fired: Vec<Action>,
    /// The subset of `fired` handed to the device controller.
    pub forwarded: Vec<Action>,
}

impl TickReport {
    pub fn dropped(&self) -> usize {
        self.fired.len() - self.forwarded.len()
    }
}

pub struct ControlLoop {
    device: DeviceController,
    inputs: Box<dyn InputDriver>,
    scheduler: DailyScheduler,
    gate: OverrideGate,
    solar_clock: SolarClock,
    location: Location,
    interior_light_offset: u16,
    tick_interval: Duration,
    clock: Arc<dyn TimeSource>,
    running: Arc<AtomicBool>,
    signals: Option<Receiver<SignalMessage>>,
}

impl ControlLoop {
    pub fn new(params: ControlParams) -> Self {
        Self {
            device: params.device,
            inputs: params.inputs,
            scheduler: params.scheduler,
            gate: params.gate,
            solar_clock: params.solar_clock,
            location: params.location,
            interior_light_offset: params.interior_light_offset,
            tick_interval: params.tick_interval,
            clock: params.clock,
            running: params.running,
            signals: params.signals,
        }
    }

    pub fn device(&self) -> &DeviceController {
        &self.device
    }

    pub fn scheduler(&self) -> &DailyScheduler {
        &self.scheduler
    }

    pub fn gate(&self) -> &OverrideGate {
        &self.gate
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Current time in the coop's timezone.
    pub fn local_now(&self) -> DateTime<Tz> {
        self.clock.now().with_timezone(&self.location.timezone)
    }

    /// Compute today's schedule and mirror the boot override state on the LED.
    ///
    /// A failed solar computation is not fatal: the loop runs with manual control
    /// only and the next daily recompute tries again.
    pub fn boot(&mut self, now: DateTime<Tz>) {
        let date = now.date_naive();
        if self.recompute(date).is_err() && self.scheduler.entries().is_empty() {
            log_critical!("No solar times for {date}");
            log_indented!("Running with manual control only until the next recompute");
        }

        if self.gate.is_suppressed() {
            log_decorated!("Schedule disabled at boot, automatic actions suppressed");
            let result = self.device.set_override_indicator(true);
            if let Err(e) = result {
                log_error!("Failed to light the override indicator: {e}");
            }
        }

        match self.scheduler.next_pending(TimeOfDay::from(now.time())) {
            Some(entry) => log_decorated!("Next: {} at {}", entry.action, entry.trigger_time),
            None => log_decorated!("Nothing left to do today"),
        }
    }

    /// Replace the schedule with one built from `times`.
    pub fn install_schedule(&mut self, times: SolarTimes) {
        log_solar_times(&times, &self.solar_clock, &self.location);
        let entries = self.scheduler.rebuild(times, self.interior_light_offset);
        log_block_start!("Schedule for {}", times.date);
        for entry in entries {
            log_indented!("{} {}", entry.trigger_time, entry.action);
        }
    }

    fn recompute(&mut self, date: NaiveDate) -> Result<(), CoreError> {
        match self.solar_clock.compute(date, &self.location) {
            Ok(times) => {
                self.install_schedule(times);
                Ok(())
            }
            Err(e) => {
                log_error!("{e}");
                match self
                    .scheduler
                    .carry_forward(date, self.interior_light_offset)
                {
                    Some(from) => log_indented!("Keeping the schedule computed for {from}"),
                    None => log_indented!("No earlier schedule to fall back on"),
                }
                Err(e)
            }
        }
    }

    /// Run one iteration of the loop at local time `now`.
    ///
    /// Only an invalid door transition is returned as an error, after the device
    /// has been driven to the safe state. Driver faults and solar failures are
    /// logged and the tick carries on.
    pub fn tick(&mut self, now: DateTime<Tz>) -> Result<TickReport, CoreError> {
        let local = now.naive_local();
        self.device.set_reference_time(now);

        if self.scheduler.recompute_due(local) {
            log_debug!("Daily recompute for {}", local.date());
            // Failures are logged by recompute and the previous times re-armed.
            let _ = self.recompute(local.date());
        }

        let edges = match self.inputs.poll() {
            Ok(edges) => edges,
            Err(e) => {
                log_warning!("Failed to read the buttons: {e}");
                ButtonEdges::default()
            }
        };
        if edges.any() {
            log_debug!("Button edges: {edges:?}");
        }

        if edges.override_toggle {
            let suppressed = self.gate.toggle();
            if suppressed {
                log_block_start!("Override on, scheduled actions suppressed");
            } else {
                log_block_start!("Override off, schedule resumed");
            }
            let result = self.device.set_override_indicator(suppressed);
            self.absorb(result)?;
        }

        self.apply_manual(edges)?;

        let mut report = TickReport {
            edges,
            fired: self.scheduler.tick(TimeOfDay::from(local.time())),
            forwarded: Vec::new(),
        };

        for action in report.fired.clone() {
            if self.gate.is_suppressed() {
                log_decorated!("Override active, dropping scheduled {action}");
                continue;
            }
            log_block_start!("Scheduled {action} at {}", local.format("%H:%M"));
            self.dispatch(action)?;
            report.forwarded.push(action);
        }

        Ok(report)
    }

    fn apply_manual(&mut self, edges: ButtonEdges) -> Result<(), CoreError> {
        if edges.stop || (edges.open && edges.close) {
            if !edges.stop {
                log_warning!("Open and close pressed together, stopping the door");
            }
            let result = self.device.stop();
            self.absorb(result)?;
        } else if edges.open {
            log_block_start!("Open button pressed");
            let result = self.drive_door(DoorCommand::Open);
            self.absorb(result)?;
        } else if edges.close {
            log_block_start!("Close button pressed");
            let result = self.drive_door(DoorCommand::Close);
            self.absorb(result)?;
        }

        if edges.light {
            let result = self.device.toggle_relay(Relay::CoopLight);
            self.absorb(result)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, action: Action) -> Result<(), CoreError> {
        let result = match action {
            Action::OpenDoor => self.drive_door(DoorCommand::Open).map(drop),
            Action::CloseDoor => self.drive_door(DoorCommand::Close).map(drop),
            Action::ToggleInteriorLight => {
                self.device.toggle_relay(Relay::InteriorLight).map(drop)
            }
        };
        self.absorb(result).map(drop)
    }

    /// Drive the door with a probe watching the stop button and the shutdown flag.
    fn drive_door(&mut self, command: DoorCommand) -> Result<DriveOutcome, CoreError> {
        let inputs = &mut self.inputs;
        let running = &self.running;
        let probe = || stop_probe(&mut **inputs, running);

        match command {
            DoorCommand::Open => self.device.open_interruptible(probe),
            DoorCommand::Close => self.device.close_interruptible(probe),
            DoorCommand::Stop => self.device.stop().map(|()| DriveOutcome::Interrupted),
        }
    }

    /// Log recoverable errors; turn fatal ones into a safe-state shutdown.
    fn absorb<T>(&mut self, result: Result<T, CoreError>) -> Result<Option<T>, CoreError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_fatal() => {
                log_critical!("{e}");
                if let Err(shutdown) = self.device.safe_shutdown() {
                    log_error!("Failed to reach the safe state: {shutdown}");
                }
                Err(e)
            }
            Err(e) => {
                log_error!("{e}");
                Ok(None)
            }
        }
    }

    /// Boot, tick until shutdown is requested or a simulation ends, then drive the
    /// safe state.
    pub fn run(&mut self) -> Result<(), CoreError> {
        self.boot(self.local_now());

        let result = loop {
            if !self.is_running() || self.clock.is_ended() {
                break Ok(());
            }
            if let Err(e) = self.tick(self.local_now()) {
                break Err(e);
            }
            self.wait_for_next_tick();
        };

        self.shutdown();
        result
    }

    /// Halt the motor and switch every output off.
    pub fn shutdown(&mut self) {
        log_block_start!("Shutting down, door {}", self.device.door_state());
        match self.device.safe_shutdown() {
            Ok(()) => log_decorated!("Motor halted, lights and indicator off"),
            Err(e) => log_error!("Failed to reach the safe state: {e}"),
        }
    }

    /// Sleep one tick interval in short slices so shutdown is noticed promptly.
    ///
    /// With the real clock the slices wait on the signal channel; a simulated
    /// clock is slept through the time source so simulated time advances.
    fn wait_for_next_tick(&self) {
        let mut remaining = self.tick_interval;
        let max_slice = Duration::from_millis(SHUTDOWN_CHECK_SLICE_MS);

        while !remaining.is_zero() && self.is_running() && !self.clock.is_ended() {
            let slice = remaining.min(max_slice);
            match self.signals.as_ref() {
                Some(receiver) if !self.clock.is_simulated() => {
                    match receiver.recv_timeout(slice) {
                        Ok(SignalMessage::Shutdown { signal }) => {
                            log_debug!("Shutdown signal {signal} received between ticks");
                            self.running.store(false, Ordering::SeqCst);
                            return;
                        }
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => self.clock.sleep(slice),
                    }
                }
                _ => self.clock.sleep(slice),
            }
            remaining = remaining.saturating_sub(slice);
        }
    }
}

/// True once the door should stop moving.
///
/// A failed read of the stop button is logged and treated as no press so a flaky
/// input cannot strand the door half open.
fn stop_probe(inputs: &mut dyn InputDriver, running: &AtomicBool) -> bool {
    if !running.load(Ordering::SeqCst) {
        return true;
    }
    match inputs.stop_requested() {
        Ok(pressed) => pressed,
        Err(e) => {
            log_warning!("Failed to read the stop button: {e}");
            false
        }
    }
}
