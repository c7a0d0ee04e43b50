//! # coopdoor
//!
//! Solar-scheduled chicken coop door and light controller.
//!
//! The binary is a thin CLI dispatcher; everything it runs lives here so the
//! internals can be tested directly.
//!
//! ## Architecture
//!
//! - **Entry Point**: [`CoopDoor`] acquires resources and runs the control loop
//! - **Control**: `control` holds the polling [`control::ControlLoop`] and the
//!   [`control::OverrideGate`]
//! - **Scheduling**: `geo` computes solar times, `schedule` turns them into the
//!   day's trigger list
//! - **Device**: `device` owns the door state machine and the relays
//! - **Backends**: `backend` with the GPIO and simulated drivers
//! - **Configuration**: `config` for the TOML settings file
//! - **Infrastructure**: signal handling, the lock file, the time source and logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod backend;
pub mod commands;
pub mod config;
pub mod constants;
pub mod control;
pub mod device;
pub mod error;
pub mod geo;
pub mod io;
pub mod schedule;
pub mod time;

mod coopdoor;

pub use coopdoor::CoopDoor;
