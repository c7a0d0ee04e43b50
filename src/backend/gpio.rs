//! Linux GPIO character device backend.
//!
//! Pin numbers are line offsets on the configured chip (BCM numbering on a
//! Raspberry Pi's `/dev/gpiochip0`). Buttons are requested active-low so a
//! pressed button reads as 1; outputs start low so the board powers up with the
//! motor idle and every relay open.

use anyhow::{Context, Result};
use gpio_cdev::{Chip, LineHandle, LineRequestFlags};

use super::{
    ActuatorDriver, ButtonEdges, DriverError, Drivers, IndicatorDriver, InputDriver, RelayDriver,
};
use crate::config::{Config, PinAssignment};
use crate::constants::GPIO_CONSUMER;

/// Open every line the controller uses.
pub fn open_drivers(config: &Config) -> Result<Drivers> {
    let chip_path = config.gpio_chip();
    let pins = config.pins();
    let mut chip =
        Chip::new(&chip_path).with_context(|| format!("Failed to open GPIO chip {chip_path}"))?;

    log_block_start!("Opening GPIO lines on {}", chip_path);
    log_indented!("Motor: forward {}, backward {}", pins.motor_forward, pins.motor_backward);
    log_indented!(
        "Relays: coop light {}, interior light {}",
        pins.coop_light_relay,
        pins.interior_light_relay
    );
    log_indented!(
        "Buttons: open {}, close {}, stop {}, override {}, light {}",
        pins.open_button,
        pins.close_button,
        pins.stop_button,
        pins.override_button,
        pins.light_button
    );

    let actuator = GpioMotor {
        forward: output(&mut chip, pins.motor_forward, "motor forward")?,
        backward: output(&mut chip, pins.motor_backward, "motor backward")?,
    };
    let coop_light = GpioOutput(output(&mut chip, pins.coop_light_relay, "coop light relay")?);
    let interior_light = GpioOutput(output(
        &mut chip,
        pins.interior_light_relay,
        "interior light relay",
    )?);
    let indicator = GpioOutput(output(&mut chip, pins.override_led, "override LED")?);
    let inputs = GpioButtons::open(&mut chip, &pins)?;

    Ok(Drivers {
        actuator: Box::new(actuator),
        coop_light: Box::new(coop_light),
        interior_light: Box::new(interior_light),
        indicator: Box::new(indicator),
        inputs: Box::new(inputs),
        backend_name: "gpio",
    })
}

fn output(chip: &mut Chip, pin: u32, label: &str) -> Result<LineHandle> {
    chip.get_line(pin)
        .and_then(|line| line.request(LineRequestFlags::OUTPUT, 0, GPIO_CONSUMER))
        .with_context(|| format!("Failed to claim GPIO {pin} ({label}) as output"))
}

fn input(chip: &mut Chip, pin: u32, label: &str) -> Result<LineHandle> {
    chip.get_line(pin)
        .and_then(|line| {
            line.request(
                LineRequestFlags::INPUT | LineRequestFlags::ACTIVE_LOW,
                0,
                GPIO_CONSUMER,
            )
        })
        .with_context(|| format!("Failed to claim GPIO {pin} ({label}) as input"))
}

/// H-bridge with one input per direction. Both low is coast/stop.
struct GpioMotor {
    forward: LineHandle,
    backward: LineHandle,
}

impl ActuatorDriver for GpioMotor {
    fn drive_forward(&mut self) -> Result<(), DriverError> {
        self.backward.set_value(0)?;
        self.forward.set_value(1)?;
        Ok(())
    }

    fn drive_backward(&mut self) -> Result<(), DriverError> {
        self.forward.set_value(0)?;
        self.backward.set_value(1)?;
        Ok(())
    }

    fn halt(&mut self) -> Result<(), DriverError> {
        // Attempt both lines even if the first write fails.
        let forward = self.forward.set_value(0);
        let backward = self.backward.set_value(0);
        forward?;
        backward?;
        Ok(())
    }
}

/// Active-high output used for relays and the indicator LED.
struct GpioOutput(LineHandle);

impl RelayDriver for GpioOutput {
    fn set(&mut self, on: bool) -> Result<(), DriverError> {
        Ok(self.0.set_value(u8::from(on))?)
    }
}

impl IndicatorDriver for GpioOutput {
    fn set(&mut self, on: bool) -> Result<(), DriverError> {
        Ok(self.0.set_value(u8::from(on))?)
    }
}

/// A push button with edge detection by comparing levels between reads.
struct GpioButton {
    line: LineHandle,
    was_pressed: bool,
}

impl GpioButton {
    fn new(line: LineHandle) -> Self {
        Self {
            line,
            was_pressed: false,
        }
    }

    /// True on the read where the button goes from released to pressed.
    fn rising_edge(&mut self) -> Result<bool, DriverError> {
        let pressed = self.line.get_value()? == 1;
        let edge = pressed && !self.was_pressed;
        self.was_pressed = pressed;
        Ok(edge)
    }
}

struct GpioButtons {
    open: GpioButton,
    close: GpioButton,
    stop: GpioButton,
    override_toggle: GpioButton,
    light: GpioButton,
}

impl GpioButtons {
    fn open(chip: &mut Chip, pins: &PinAssignment) -> Result<Self> {
        Ok(Self {
            open: GpioButton::new(input(chip, pins.open_button, "open button")?),
            close: GpioButton::new(input(chip, pins.close_button, "close button")?),
            stop: GpioButton::new(input(chip, pins.stop_button, "stop button")?),
            override_toggle: GpioButton::new(input(
                chip,
                pins.override_button,
                "override button",
            )?),
            light: GpioButton::new(input(chip, pins.light_button, "light button")?),
        })
    }
}

impl InputDriver for GpioButtons {
    fn poll(&mut self) -> Result<ButtonEdges, DriverError> {
        Ok(ButtonEdges {
            open: self.open.rising_edge()?,
            close: self.close.rising_edge()?,
            stop: self.stop.rising_edge()?,
            override_toggle: self.override_toggle.rising_edge()?,
            light: self.light.rising_edge()?,
        })
    }

    fn stop_requested(&mut self) -> Result<bool, DriverError> {
        self.stop.rising_edge()
    }
}
