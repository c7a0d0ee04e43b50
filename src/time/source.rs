//! Clock abstraction for real and simulated time.
//!
//! The control loop and the door travel wait read the time and sleep only through a
//! [`TimeSource`], which lets `coopdoor simulate` push a whole day of door events
//! through the real controller in seconds.
//!
//! A process-wide source is installed once with [`init_time_source`]; the free
//! functions ([`now`], [`sleep`], ...) fall back to [`RealTimeSource`] when nothing
//! was installed.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration as StdDuration, Instant};

static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

/// Source of "now" and of sleeping.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Sleep for `duration` of this source's time.
    fn sleep(&self, duration: StdDuration);

    fn is_simulated(&self) -> bool;

    /// Whether a simulation has run past its end time. Always false for real time.
    fn is_ended(&self) -> bool {
        false
    }
}

/// The host clock.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Simulated clock running between two instants.
///
/// Two modes:
/// - multiplier `> 0`: simulated time flows at `multiplier` times real time
///   (60.0 = one simulated minute per real second);
/// - multiplier `0`: fast-forward, every `sleep` advances the clock instantly.
///
/// Time never advances past `end`; once it gets there [`TimeSource::is_ended`]
/// turns true and the control loop winds down.
pub struct SimulatedTimeSource {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    multiplier: f64,
    state: Mutex<SimulatedState>,
}

struct SimulatedState {
    /// Simulated time already accounted for by completed sleeps.
    elapsed: StdDuration,
    /// Real instant the current sleep began, with its simulated length.
    sleeping: Option<(Instant, StdDuration)>,
}

impl SimulatedTimeSource {
    /// Negative multipliers fall back to one simulated hour per real second.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, multiplier: f64) -> Self {
        let multiplier = if multiplier < 0.0 { 3600.0 } else { multiplier };
        Self {
            start,
            end,
            multiplier,
            state: Mutex::new(SimulatedState {
                elapsed: StdDuration::ZERO,
                sleeping: None,
            }),
        }
    }

    /// Fast-forward source, the mode tests use.
    pub fn fast_forward(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::new(start, end, 0.0)
    }

    pub fn is_fast_forward(&self) -> bool {
        self.multiplier == 0.0
    }

    fn state(&self) -> MutexGuard<'_, SimulatedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn offset(&self, elapsed: StdDuration) -> DateTime<Utc> {
        let elapsed =
            ChronoDuration::from_std(elapsed).unwrap_or_else(|_| self.end - self.start);
        self.start
            .checked_add_signed(elapsed)
            .map_or(self.end, |t| t.min(self.end))
    }

    fn remaining(&self, elapsed: StdDuration) -> StdDuration {
        (self.end - self.offset(elapsed))
            .to_std()
            .unwrap_or(StdDuration::ZERO)
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        let state = self.state();
        let mut elapsed = state.elapsed;
        // Mid-sleep progress keeps timestamps moving during long accelerated sleeps.
        if let Some((started, length)) = state.sleeping {
            let progressed = started.elapsed().mul_f64(self.multiplier);
            elapsed += progressed.min(length);
        }
        self.offset(elapsed)
    }

    fn sleep(&self, duration: StdDuration) {
        let step = {
            let mut state = self.state();
            let step = duration.min(self.remaining(state.elapsed));
            if self.is_fast_forward() {
                state.elapsed += step;
                return;
            }
            state.sleeping = Some((Instant::now(), step));
            step
        };

        if !step.is_zero() {
            std::thread::sleep(step.div_f64(self.multiplier));
        }

        let mut state = self.state();
        state.sleeping = None;
        state.elapsed += step;
    }

    fn is_simulated(&self) -> bool {
        true
    }

    fn is_ended(&self) -> bool {
        self.now() >= self.end
    }
}

/// Install the process-wide time source. Only the first call has an effect.
pub fn init_time_source(source: Arc<dyn TimeSource>) {
    TIME_SOURCE.set(source).ok();
}

pub fn is_initialized() -> bool {
    TIME_SOURCE.get().is_some()
}

/// The process-wide source, defaulting to the host clock.
pub fn current() -> Arc<dyn TimeSource> {
    TIME_SOURCE.get_or_init(|| Arc::new(RealTimeSource)).clone()
}

pub fn now() -> DateTime<Utc> {
    current().now()
}

pub fn is_simulated() -> bool {
    current().is_simulated()
}

pub fn simulation_ended() -> bool {
    current().is_ended()
}

/// Parse `YYYY-MM-DD HH:MM[:SS]` as a wall-clock time in `tz`.
pub fn parse_datetime_in_tz(s: &str, tz: Tz) -> Result<DateTime<Utc>, String> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .map_err(|e| format!("Invalid datetime '{s}': {e}. Use YYYY-MM-DD HH:MM:SS"))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| format!("'{s}' does not exist in timezone {tz}"))
}
