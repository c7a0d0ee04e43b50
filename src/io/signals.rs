//! Unix signal handling.
//!
//! A listener thread turns SIGINT, SIGTERM and SIGHUP into a cleared `running`
//! flag plus a [`SignalMessage`] on a channel. The control loop checks the flag
//! between door-travel slices and waits on the channel between ticks, so a
//! signal is acted on promptly and the door is always left in the safe state.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM},
    iterator::Signals,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMessage {
    /// Termination requested with the given signal number.
    Shutdown { signal: i32 },
}

/// Signal handling state shared with the listener thread.
pub struct SignalState {
    /// Cleared once a termination signal arrives.
    pub running: Arc<AtomicBool>,
    pub signal_receiver: mpsc::Receiver<SignalMessage>,
}

impl SignalState {
    /// A state no signal will ever reach, for runs driven programmatically.
    pub fn detached() -> Self {
        let (_sender, signal_receiver) = mpsc::channel();
        Self {
            running: Arc::new(AtomicBool::new(true)),
            signal_receiver,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn signal_name(signal: i32) -> &'static str {
    match signal {
        SIGINT => "SIGINT",
        SIGTERM => "SIGTERM",
        SIGHUP => "SIGHUP",
        _ => "signal",
    }
}

/// Register handlers and start the listener thread.
pub fn setup_signal_handler() -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));
    let (signal_sender, signal_receiver) = mpsc::channel::<SignalMessage>();

    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP]).context("failed to register signal handlers")?;

    let running_clone = running.clone();
    thread::spawn(move || {
        for signal in signals.forever() {
            log_pipe!();
            log_info!("Received {}, shutting down", signal_name(signal));
            running_clone.store(false, Ordering::SeqCst);
            // The receiver may already be gone during shutdown.
            let _ = signal_sender.send(SignalMessage::Shutdown { signal });
        }
    });

    log_debug!("Signal handler registered for SIGINT, SIGTERM and SIGHUP");

    Ok(SignalState {
        running,
        signal_receiver,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_state_keeps_running() {
        let state = SignalState::detached();
        assert!(state.is_running());
        assert!(state.signal_receiver.try_recv().is_err());
    }

    #[test]
    fn test_signal_names() {
        assert_eq!(signal_name(SIGTERM), "SIGTERM");
        assert_eq!(signal_name(SIGHUP), "SIGHUP");
        assert_eq!(signal_name(0), "signal");
    }
}
