use chrono::{NaiveDate, TimeZone, Utc};
use std::sync::mpsc;

use super::*;
use crate::backend::simulated::{ActuatorCall, Button, Channel, Motor, SimulatedBench};
use crate::device::{DeviceSettings, DoorState, RelayState};
use crate::time::{RealTimeSource, SimulatedTimeSource};

struct Rig {
    bench: SimulatedBench,
    control: ControlLoop,
    running: Arc<AtomicBool>,
}

fn simulated_clock(start: DateTime<Utc>, hours: i64) -> Arc<dyn TimeSource> {
    Arc::new(SimulatedTimeSource::fast_forward(
        start,
        start + chrono::Duration::hours(hours),
    ))
}

fn rig_with(
    location: Location,
    clock: Arc<dyn TimeSource>,
    suppressed: bool,
    signals: Option<mpsc::Receiver<SignalMessage>>,
) -> Rig {
    let bench = SimulatedBench::new();
    let drivers = bench.into_drivers();
    let running = Arc::new(AtomicBool::new(true));
    let device = DeviceController::new(
        drivers.actuator,
        drivers.coop_light,
        drivers.interior_light,
        drivers.indicator,
        clock.clone(),
        DeviceSettings {
            travel_time: Duration::from_secs(2),
            stop_poll_interval: Duration::from_millis(50),
            light_on_close: true,
            timezone: location.timezone,
        },
    );

    let control = ControlLoop::new(ControlParams {
        device,
        inputs: drivers.inputs,
        scheduler: DailyScheduler::new(TimeOfDay::new(0, 1).unwrap()),
        gate: OverrideGate::new(suppressed),
        solar_clock: SolarClock::default(),
        location,
        interior_light_offset: 10,
        tick_interval: Duration::from_millis(1000),
        clock,
        running: running.clone(),
        signals,
    });

    Rig {
        bench,
        control,
        running,
    }
}

fn rig(suppressed: bool) -> Rig {
    // 2024-06-01 06:00 PDT
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 13, 0, 0).unwrap();
    rig_with(
        Location::lincoln_city(),
        simulated_clock(start, 48),
        suppressed,
        None,
    )
}

fn june(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn hm(h: u8, m: u8) -> TimeOfDay {
    TimeOfDay::new(h, m).unwrap()
}

fn local(d: u32, h: u32, m: u32) -> DateTime<Tz> {
    chrono_tz::America::Los_Angeles
        .with_ymd_and_hms(2024, 6, d, h, m, 0)
        .unwrap()
}

/// Sunrise 06:45, dusk 20:10 on June 1.
fn install_reference_day(control: &mut ControlLoop) {
    control.install_schedule(SolarTimes::new(june(1), hm(6, 45), hm(20, 10)).unwrap());
}

fn svalbard() -> Location {
    Location {
        name: "Longyearbyen".into(),
        region: "NO".into(),
        timezone: chrono_tz::Arctic::Longyearbyen,
        latitude: 78.22,
        longitude: 15.65,
        elevation: None,
    }
}

#[test]
fn test_scheduled_open_at_sunrise() {
    let mut rig = rig(false);
    install_reference_day(&mut rig.control);

    let entries: Vec<_> = rig
        .control
        .scheduler()
        .entries()
        .iter()
        .map(|e| (e.trigger_time, e.action))
        .collect();
    assert_eq!(
        entries,
        vec![
            (hm(6, 45), Action::OpenDoor),
            (hm(20, 0), Action::ToggleInteriorLight),
            (hm(20, 10), Action::CloseDoor),
        ]
    );

    let report = rig.control.tick(local(1, 6, 0)).unwrap();
    assert!(report.fired.is_empty());

    let report = rig.control.tick(local(1, 6, 45)).unwrap();
    assert_eq!(report.fired, vec![Action::OpenDoor]);
    assert_eq!(report.forwarded, vec![Action::OpenDoor]);
    assert_eq!(rig.control.device().door_state(), DoorState::Open);
    assert_eq!(
        rig.bench.actuator_calls(),
        vec![ActuatorCall::Forward, ActuatorCall::Halt]
    );
}

#[test]
fn test_override_drops_scheduled_open() {
    let mut rig = rig(true);
    install_reference_day(&mut rig.control);

    let report = rig.control.tick(local(1, 6, 45)).unwrap();
    assert_eq!(report.fired, vec![Action::OpenDoor]);
    assert!(report.forwarded.is_empty());
    assert_eq!(report.dropped(), 1);
    assert_eq!(rig.control.device().door_state(), DoorState::Closed);
    assert_eq!(rig.bench.drive_count(), 0);

    // Dropped actions are not retried once the override is lifted.
    rig.bench.press(Button::Override);
    let report = rig.control.tick(local(1, 6, 46)).unwrap();
    assert!(report.fired.is_empty());
    assert!(!rig.control.gate().is_suppressed());
    assert_eq!(rig.control.device().door_state(), DoorState::Closed);
}

#[test]
fn test_override_button_toggles_gate_and_indicator() {
    let mut rig = rig(false);
    install_reference_day(&mut rig.control);

    rig.bench.press(Button::Override);
    rig.control.tick(local(1, 6, 0)).unwrap();
    assert!(rig.control.gate().is_suppressed());
    assert!(rig.bench.is_on(Channel::Indicator));

    let report = rig.control.tick(local(1, 6, 45)).unwrap();
    assert_eq!(report.dropped(), 1);
    assert_eq!(rig.control.device().door_state(), DoorState::Closed);

    rig.bench.press(Button::Override);
    rig.control.tick(local(1, 7, 0)).unwrap();
    assert!(!rig.control.gate().is_suppressed());
    assert!(!rig.bench.is_on(Channel::Indicator));
}

#[test]
fn test_scheduled_close_turns_interior_light_on() {
    let mut rig = rig(false);
    install_reference_day(&mut rig.control);
    rig.control.tick(local(1, 6, 45)).unwrap();

    let report = rig.control.tick(local(1, 20, 10)).unwrap();
    assert_eq!(report.forwarded, vec![Action::CloseDoor]);
    assert_eq!(rig.control.device().door_state(), DoorState::Closed);
    assert_eq!(
        rig.control.device().relay_state(Relay::InteriorLight),
        RelayState::On
    );
    assert!(rig.bench.is_on(Channel::InteriorLight));
}

#[test]
fn test_evening_light_stays_on_through_close() {
    let mut rig = rig(false);
    install_reference_day(&mut rig.control);
    rig.control.tick(local(1, 6, 45)).unwrap();

    let report = rig.control.tick(local(1, 20, 0)).unwrap();
    assert_eq!(report.forwarded, vec![Action::ToggleInteriorLight]);
    assert!(rig.bench.is_on(Channel::InteriorLight));

    let report = rig.control.tick(local(1, 20, 10)).unwrap();
    assert_eq!(report.forwarded, vec![Action::CloseDoor]);
    assert_eq!(rig.control.device().door_state(), DoorState::Closed);
    assert_eq!(
        rig.control.device().relay_state(Relay::InteriorLight),
        RelayState::On
    );
    assert!(rig.bench.is_on(Channel::InteriorLight));
    assert_eq!(rig.bench.relay_writes(), 1);
    // Stamped at the tick time plus the two seconds of travel.
    assert_eq!(
        rig.control.device().event_time(),
        local(1, 20, 10) + chrono::Duration::seconds(2)
    );
}

#[test]
fn test_manual_open_passes_through_override() {
    let mut rig = rig(true);
    install_reference_day(&mut rig.control);

    rig.bench.press(Button::Open);
    rig.control.tick(local(1, 7, 0)).unwrap();
    assert_eq!(rig.control.device().door_state(), DoorState::Open);

    rig.bench.press(Button::Close);
    rig.control.tick(local(1, 7, 1)).unwrap();
    assert_eq!(rig.control.device().door_state(), DoorState::Closed);
}

#[test]
fn test_stop_wins_over_open() {
    let mut rig = rig(false);
    rig.bench.press(Button::Open);
    rig.bench.press(Button::Stop);

    rig.control.tick(local(1, 7, 0)).unwrap();
    assert_eq!(rig.control.device().door_state(), DoorState::Stopped);
    assert_eq!(rig.bench.drive_count(), 0);
}

#[test]
fn test_open_and_close_together_stop_the_door() {
    let mut rig = rig(false);
    rig.bench.press(Button::Open);
    rig.bench.press(Button::Close);

    rig.control.tick(local(1, 7, 0)).unwrap();
    assert_eq!(rig.control.device().door_state(), DoorState::Stopped);
    assert_eq!(rig.bench.drive_count(), 0);
}

#[test]
fn test_light_button_toggles_coop_light() {
    let mut rig = rig(false);

    rig.bench.press(Button::Light);
    rig.control.tick(local(1, 21, 0)).unwrap();
    assert!(rig.bench.is_on(Channel::CoopLight));

    rig.bench.press(Button::Light);
    rig.control.tick(local(1, 21, 5)).unwrap();
    assert!(!rig.bench.is_on(Channel::CoopLight));
    assert!(!rig.bench.is_on(Channel::InteriorLight));
}

#[test]
fn test_stop_press_during_travel_halts_door() {
    let mut rig = rig(false);
    rig.bench.press(Button::Open);
    rig.bench.press_stop_during_travel(3);

    rig.control.tick(local(1, 7, 0)).unwrap();
    assert_eq!(rig.control.device().door_state(), DoorState::Stopped);
    assert_eq!(rig.bench.motor(), Motor::Idle);
}

#[test]
fn test_shutdown_flag_interrupts_travel() {
    let mut rig = rig(false);
    rig.bench.press(Button::Open);
    rig.running.store(false, Ordering::SeqCst);

    rig.control.tick(local(1, 7, 0)).unwrap();
    assert_eq!(rig.control.device().door_state(), DoorState::Stopped);
    assert_eq!(rig.bench.motor(), Motor::Idle);
}

#[test]
fn test_actuator_fault_is_logged_and_loop_continues() {
    let mut rig = rig(false);
    rig.bench.fail_next(Channel::Motor);
    rig.bench.press(Button::Open);

    assert!(rig.control.tick(local(1, 7, 0)).is_ok());
    assert_eq!(rig.control.device().door_state(), DoorState::Closed);

    rig.bench.press(Button::Open);
    rig.control.tick(local(1, 7, 1)).unwrap();
    assert_eq!(rig.control.device().door_state(), DoorState::Open);
}

#[test]
fn test_daily_recompute_runs_once_per_day() {
    let mut rig = rig(false);
    install_reference_day(&mut rig.control);
    rig.control.tick(local(1, 23, 59)).unwrap();
    assert_eq!(rig.control.scheduler().solar_times().unwrap().date, june(1));

    rig.control.tick(local(2, 0, 0)).unwrap();
    assert_eq!(rig.control.scheduler().solar_times().unwrap().date, june(1));

    rig.control.tick(local(2, 0, 1)).unwrap();
    let rebuilt = *rig.control.scheduler().solar_times().unwrap();
    assert_eq!(rebuilt.date, june(2));

    // Fire the opening entry, then make sure later ticks do not re-arm it.
    rig.control.tick(local(2, 0, 2)).unwrap();
    let opening = rebuilt.sunrise;
    let at_sunrise = local(2, opening.hour().into(), opening.minute().into());
    let report = rig.control.tick(at_sunrise).unwrap();
    assert_eq!(report.forwarded, vec![Action::OpenDoor]);
    let report = rig.control.tick(at_sunrise).unwrap();
    assert!(report.fired.is_empty());
}

#[test]
fn test_failed_recompute_keeps_previous_schedule() {
    let start = Utc.with_ymd_and_hms(2024, 12, 20, 12, 0, 0).unwrap();
    let mut rig = rig_with(svalbard(), simulated_clock(start, 72), false, None);
    let at = |d: u32, h: u32, m: u32| {
        chrono_tz::Arctic::Longyearbyen
            .with_ymd_and_hms(2024, 12, d, h, m, 0)
            .unwrap()
    };
    let yesterday = NaiveDate::from_ymd_opt(2024, 12, 20).unwrap();
    rig.control
        .install_schedule(SolarTimes::new(yesterday, hm(10, 0), hm(14, 0)).unwrap());

    let report = rig.control.tick(at(20, 10, 0)).unwrap();
    assert_eq!(report.forwarded, vec![Action::OpenDoor]);
    let report = rig.control.tick(at(20, 14, 0)).unwrap();
    assert_eq!(report.forwarded, vec![Action::CloseDoor]);

    // Polar night: the 00:01 recompute has no sunrise to offer.
    rig.control.tick(at(21, 0, 1)).unwrap();
    let today = NaiveDate::from_ymd_opt(2024, 12, 21).unwrap();
    let retained = *rig.control.scheduler().solar_times().unwrap();
    assert_eq!(retained.date, today);
    assert_eq!((retained.sunrise, retained.dusk), (hm(10, 0), hm(14, 0)));
    assert!(
        !rig.control
            .scheduler()
            .recompute_due(today.and_hms_opt(12, 0, 0).unwrap())
    );

    let report = rig.control.tick(at(21, 10, 0)).unwrap();
    assert_eq!(report.forwarded, vec![Action::OpenDoor]);
    assert_eq!(rig.control.device().door_state(), DoorState::Open);
    let report = rig.control.tick(at(21, 14, 0)).unwrap();
    assert_eq!(report.forwarded, vec![Action::CloseDoor]);
    assert_eq!(rig.control.device().door_state(), DoorState::Closed);
}

#[test]
fn test_boot_without_solar_times_runs_manual_only() {
    let start = Utc.with_ymd_and_hms(2024, 12, 21, 12, 0, 0).unwrap();
    let mut rig = rig_with(svalbard(), simulated_clock(start, 48), false, None);

    let now = rig.control.local_now();
    rig.control.boot(now);
    assert!(rig.control.scheduler().entries().is_empty());

    rig.bench.press(Button::Open);
    rig.control.tick(now).unwrap();
    assert_eq!(rig.control.device().door_state(), DoorState::Open);
}

#[test]
fn test_boot_lights_indicator_when_schedule_disabled() {
    let mut rig = rig(true);
    let now = rig.control.local_now();
    rig.control.boot(now);
    assert!(rig.control.device().indicator_on());
    assert!(rig.bench.is_on(Channel::Indicator));
}

#[test]
fn test_run_opens_at_sunrise_and_ends_in_safe_state() {
    // 05:00 to 06:30 PDT brackets sunrise at Lincoln City in early June.
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let clock: Arc<dyn TimeSource> = Arc::new(SimulatedTimeSource::fast_forward(
        start,
        start + chrono::Duration::minutes(90),
    ));
    let mut rig = rig_with(Location::lincoln_city(), clock, false, None);
    rig.bench.press(Button::Light);

    rig.control.run().unwrap();

    assert_eq!(rig.bench.drive_count(), 1);
    assert_eq!(rig.bench.actuator_calls()[0], ActuatorCall::Forward);
    assert_eq!(rig.bench.motor(), Motor::Idle);
    assert!(!rig.bench.is_on(Channel::CoopLight));
    assert!(!rig.bench.is_on(Channel::InteriorLight));
    assert!(!rig.bench.is_on(Channel::Indicator));
}

#[test]
fn test_run_returns_immediately_when_not_running() {
    let mut rig = rig(false);
    rig.running.store(false, Ordering::SeqCst);
    rig.bench.press(Button::Open);

    rig.control.run().unwrap();
    assert_eq!(rig.bench.drive_count(), 0);
    assert_eq!(rig.control.device().door_state(), DoorState::Stopped);
}

#[test]
fn test_signal_wakes_the_tick_wait() {
    let (sender, receiver) = mpsc::channel();
    let rig = rig_with(
        Location::lincoln_city(),
        Arc::new(RealTimeSource),
        false,
        Some(receiver),
    );

    sender.send(SignalMessage::Shutdown { signal: 15 }).unwrap();
    let started = std::time::Instant::now();
    rig.control.wait_for_next_tick();

    assert!(started.elapsed() < Duration::from_millis(500));
    assert!(!rig.control.is_running());
}
