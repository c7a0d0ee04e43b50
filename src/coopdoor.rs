//! Application coordinator that manages the complete lifecycle of coopdoor.
//!
//! Handles resource acquisition and hands over to the [`ControlLoop`]:
//! - Configuration loading
//! - Lock file management for single-instance enforcement
//! - Signal handler setup
//! - Driver creation for the configured backend
//!
//! The `CoopDoor` struct uses a builder pattern for the different startup contexts:
//! - Normal startup: `CoopDoor::new(debug_enabled).run()`
//! - Simulation mode: `CoopDoor::new(debug_enabled).without_lock().without_headers().simulated().run()`

use anyhow::{Result, anyhow};

use crate::{
    backend::create_drivers,
    config::Config,
    control::{ControlLoop, ControlParams, OverrideGate},
    device::DeviceController,
    io::lock::{LockAttempt, acquire_lock, default_lock_path},
    io::signals::setup_signal_handler,
    logger::Log,
    schedule::DailyScheduler,
    time::source,
};

/// Builder for configuring and running the coop door controller.
///
/// ```no_run
/// use coopdoor::CoopDoor;
///
/// # fn main() -> anyhow::Result<()> {
/// // Normal application startup
/// CoopDoor::new(false).run()?;
///
/// // Dry run on the simulated board
/// CoopDoor::new(true)
///     .without_lock()
///     .without_headers()
///     .simulated()
///     .run()?;
/// # Ok(())
/// # }
/// ```
pub struct CoopDoor {
    debug_enabled: bool,
    create_lock: bool,
    show_headers: bool,
    force_simulated: bool,
    config: Option<Config>,
}

impl CoopDoor {
    /// Create a new runner with defaults matching normal run
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            create_lock: true,
            show_headers: true,
            force_simulated: false,
            config: None,
        }
    }

    /// Use an already loaded configuration instead of reading it again
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Skip lock file creation (simulation runs never touch the real board)
    pub fn without_lock(mut self) -> Self {
        self.create_lock = false;
        self
    }

    /// Skip header display (when the caller already printed one)
    pub fn without_headers(mut self) -> Self {
        self.show_headers = false;
        self
    }

    /// Use the simulated backend whatever the configuration says
    pub fn simulated(mut self) -> Self {
        self.force_simulated = true;
        self
    }

    /// Run the controller until shutdown.
    ///
    /// Returns once a termination signal has been handled (or a simulation
    /// reached its end) and the door hardware is in the safe state.
    pub fn run(self) -> Result<()> {
        Log::set_debug_enabled(self.debug_enabled);

        if self.show_headers {
            log_version!();
        }

        let config = match self.config {
            Some(config) => config,
            None => match Config::load() {
                Ok(config) => config,
                Err(e) => {
                    log_error_exit!("Configuration failed");
                    return Err(e);
                }
            },
        };

        // Taken before touching any GPIO line.
        let _lock = if self.create_lock {
            let path = default_lock_path();
            match acquire_lock(&path)? {
                LockAttempt::Acquired(lock) => {
                    log_debug!("Lock acquired at {}", lock.path().display());
                    Some(lock)
                }
                LockAttempt::HeldBy(pid) => {
                    match pid {
                        Some(pid) => log_error_exit!("coopdoor is already running (PID {pid})"),
                        None => log_error_exit!("coopdoor is already running"),
                    }
                    log_indented!("Lock file: {}", path.display());
                    return Ok(());
                }
            }
        } else {
            None
        };

        config.log_config();

        let signal_state = setup_signal_handler()?;

        let drivers = create_drivers(&config, self.force_simulated)?;
        log_block_start!("Hardware backend: {}", drivers.backend_name);

        let clock = source::current();
        let device = DeviceController::new(
            drivers.actuator,
            drivers.coop_light,
            drivers.interior_light,
            drivers.indicator,
            clock.clone(),
            config.device_settings()?,
        );

        let mut control = ControlLoop::new(ControlParams {
            device,
            inputs: drivers.inputs,
            scheduler: DailyScheduler::new(config.recompute_time()),
            gate: OverrideGate::new(!config.schedule_enabled()),
            solar_clock: config.solar_clock(),
            location: config.location()?,
            interior_light_offset: config.interior_light_offset(),
            tick_interval: config.tick_interval(),
            clock,
            running: signal_state.running.clone(),
            signals: Some(signal_state.signal_receiver),
        });

        let result = control.run();

        if source::simulation_ended() {
            log_block_start!("Simulation complete");
        }
        log_end!();

        result.map_err(|e| anyhow!("{e}"))
    }
}
