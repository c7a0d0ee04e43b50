use chrono::{TimeZone, Utc};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use coopdoor::backend::simulated::{ActuatorCall, Channel, Motor, SimulatedBench};
use coopdoor::control::{ControlLoop, ControlParams, OverrideGate};
use coopdoor::device::{DeviceController, DeviceSettings};
use coopdoor::geo::{Location, SolarClock};
use coopdoor::logger::Log;
use coopdoor::schedule::DailyScheduler;
use coopdoor::time::{SimulatedTimeSource, TimeOfDay, TimeSource};

/// A controller on the simulated board, running 2024-06-21 00:30 to midnight PDT.
fn summer_day(schedule_enabled: bool) -> (SimulatedBench, ControlLoop) {
    Log::set_enabled(false);

    let start = Utc.with_ymd_and_hms(2024, 6, 21, 7, 30, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 6, 22, 7, 0, 0).unwrap();
    let clock: Arc<dyn TimeSource> = Arc::new(SimulatedTimeSource::fast_forward(start, end));

    let location = Location::lincoln_city();
    let bench = SimulatedBench::new();
    let drivers = bench.into_drivers();
    let device = DeviceController::new(
        drivers.actuator,
        drivers.coop_light,
        drivers.interior_light,
        drivers.indicator,
        clock.clone(),
        DeviceSettings {
            travel_time: Duration::from_secs(20),
            stop_poll_interval: Duration::from_millis(50),
            light_on_close: true,
            timezone: location.timezone,
        },
    );

    let control = ControlLoop::new(ControlParams {
        device,
        inputs: drivers.inputs,
        scheduler: DailyScheduler::new(TimeOfDay::new(0, 1).unwrap()),
        gate: OverrideGate::new(!schedule_enabled),
        solar_clock: SolarClock::default(),
        location,
        interior_light_offset: 10,
        tick_interval: Duration::from_millis(5000),
        clock,
        running: Arc::new(AtomicBool::new(true)),
        signals: None,
    });

    (bench, control)
}

#[test]
fn test_full_day_opens_and_closes_once() {
    let (bench, mut control) = summer_day(true);

    control.run().unwrap();

    assert_eq!(
        bench.actuator_calls(),
        vec![
            ActuatorCall::Forward,
            ActuatorCall::Halt,
            ActuatorCall::Backward,
            ActuatorCall::Halt,
            // safe shutdown
            ActuatorCall::Halt,
        ]
    );
    assert!(control.scheduler().entries().iter().all(|e| e.fired_today()));
    // Light on ten minutes before dusk and kept on by the close, then off at
    // shutdown.
    assert_eq!(bench.relay_writes(), 2);
    assert_eq!(bench.motor(), Motor::Idle);
    assert!(!bench.is_on(Channel::InteriorLight));
}

#[test]
fn test_full_day_with_schedule_disabled_never_moves() {
    let (bench, mut control) = summer_day(false);

    control.run().unwrap();

    assert_eq!(bench.drive_count(), 0);
    assert_eq!(bench.relay_writes(), 0);
    // Indicator lit at boot, cleared by the safe shutdown.
    assert!(!bench.is_on(Channel::Indicator));
    assert!(control.gate().is_suppressed());
}
