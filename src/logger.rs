//! Structured logging with box-drawing output.
//!
//! Every line the controller prints goes through the macros in this module so the
//! output of a long-running daemon reads as one connected tree:
//!
//! ```text
//! ┏ coopdoor v0.4.0 ━━╸
//! ┃
//! ┣ Loading configuration...
//! ┃   Location: Lincoln City, USA (America/Los_Angeles)
//! ┃
//! ┣ Door opened at 06:45:02
//! ╹
//! ```
//!
//! ## Conventions
//!
//! - `log_block_start!` opens a new block (door movement, schedule rebuild, startup phase).
//!   It prints an empty `┃` spacer first, then `┣ message`.
//! - `log_decorated!` continues the current block with `┣ message`.
//! - `log_indented!` prints nested detail as `┃   message`.
//! - `log_pipe!` inserts a bare `┃`, typically before a `[LEVEL]` message that starts
//!   its own block.
//! - `log_version!` / `log_end!` bracket the whole run.
//! - `log_info!`, `log_warning!`, `log_error!`, `log_critical!` carry a colored
//!   `[LEVEL]` tag. `log_debug!` only prints once debug output is switched on with
//!   [`Log::set_debug_enabled`].
//!
//! When the global time source is simulated every line is prefixed with the
//! simulated wall-clock time, so a fast-forwarded day reads like a real log.

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

// Coop location timezone, used to render simulation timestamps
static DISPLAY_TIMEZONE: OnceLock<chrono_tz::Tz> = OnceLock::new();

/// Runtime switches for the logging macros.
pub struct Log;

impl Log {
    /// Enable or disable all output.
    ///
    /// Integration tests turn this off to keep their output readable.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Enable `log_debug!` output (the `--debug` flag).
    pub fn set_debug_enabled(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_debug_enabled() -> bool {
        DEBUG_ENABLED.load(Ordering::SeqCst)
    }

    /// Set the timezone simulation timestamps are shown in. First call wins.
    pub fn set_display_timezone(tz: chrono_tz::Tz) {
        let _ = DISPLAY_TIMEZONE.set(tz);
    }

    /// Timestamp prefix for simulation mode, `[HH:MM:SS] `.
    ///
    /// Empty when running against the real clock or before a time source exists.
    pub fn get_timestamp_prefix() -> String {
        if !(crate::time::source::is_initialized() && crate::time::source::is_simulated()) {
            return String::new();
        }
        let now = crate::time::source::now();
        match DISPLAY_TIMEZONE.get() {
            Some(tz) => format!("[{}] ", now.with_timezone(tz).format("%H:%M:%S")),
            None => format!("[{}] ", now.format("%H:%M:%S")),
        }
    }
}

/// Writes already formatted text to stdout.
pub fn write_output(text: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}

/// Formats one line with the simulation prefix and hands it to [`write_output`].
///
/// `$template` receives the prefix and the message; it is a closure so that
/// multi-line shapes such as `log_block_start!` can repeat the prefix.
#[doc(hidden)]
#[macro_export]
macro_rules! __log_emit {
    ($template:expr, $message:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = $message;
            let render: fn(&str, &str) -> String = $template;
            $crate::logger::write_output(&render(&prefix, &message.to_string()));
        }
    }};
}

/// Log a message that continues the current block.
#[macro_export]
macro_rules! log_decorated {
    ($fmt:literal $($arg:tt)*) => {
        $crate::__log_emit!(|p, m| format!("{p}┣ {m}\n"), format!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::__log_emit!(|p, m| format!("{p}┣ {m}\n"), $expr)
    };
}

/// Log nested detail under the current block.
#[macro_export]
macro_rules! log_indented {
    ($fmt:literal $($arg:tt)*) => {
        $crate::__log_emit!(|p, m| format!("{p}┃   {m}\n"), format!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::__log_emit!(|p, m| format!("{p}┃   {m}\n"), $expr)
    };
}

/// Log an empty pipe line for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::__log_emit!(|p, _m| format!("{p}┃\n"), "")
    };
}

/// Start a new block of related messages.
#[macro_export]
macro_rules! log_block_start {
    ($fmt:literal $($arg:tt)*) => {
        $crate::__log_emit!(|p, m| format!("{p}┃\n{p}┣ {m}\n"), format!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::__log_emit!(|p, m| format!("{p}┃\n{p}┣ {m}\n"), $expr)
    };
}

/// Log the startup header.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::__log_emit!(
            |p, m| format!("{p}┏ coopdoor v{m} ━━╸\n"),
            env!("CARGO_PKG_VERSION")
        )
    };
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {
        $crate::__log_emit!(|p, _m| format!("{p}╹\n"), "")
    };
}

/// Log a yellow `[WARNING]` inside the current block.
#[macro_export]
macro_rules! log_warning {
    ($fmt:literal $($arg:tt)*) => {
        $crate::__log_emit!(
            |p, m| format!("{p}┣[\x1b[33mWARNING\x1b[0m] {m}\n"),
            format!($fmt $($arg)*)
        )
    };
    ($expr:expr) => {
        $crate::__log_emit!(|p, m| format!("{p}┣[\x1b[33mWARNING\x1b[0m] {m}\n"), $expr)
    };
}

/// Log a red `[ERROR]` inside the current block.
#[macro_export]
macro_rules! log_error {
    ($fmt:literal $($arg:tt)*) => {
        $crate::__log_emit!(
            |p, m| format!("{p}┣[\x1b[31mERROR\x1b[0m] {m}\n"),
            format!($fmt $($arg)*)
        )
    };
    ($expr:expr) => {
        $crate::__log_emit!(|p, m| format!("{p}┣[\x1b[31mERROR\x1b[0m] {m}\n"), $expr)
    };
}

/// Log a red `[ERROR]` that closes the tree, for errors that end the process.
#[macro_export]
macro_rules! log_error_exit {
    ($fmt:literal $($arg:tt)*) => {
        $crate::__log_emit!(
            |p, m| format!("{p}┃\n{p}┗[\x1b[31mERROR\x1b[0m] {m}\n"),
            format!($fmt $($arg)*)
        )
    };
    ($expr:expr) => {
        $crate::__log_emit!(
            |p, m| format!("{p}┃\n{p}┗[\x1b[31mERROR\x1b[0m] {m}\n"),
            $expr
        )
    };
}

/// Log a green `[INFO]` message.
#[macro_export]
macro_rules! log_info {
    ($fmt:literal $($arg:tt)*) => {
        $crate::__log_emit!(
            |p, m| format!("{p}┣[\x1b[32mINFO\x1b[0m] {m}\n"),
            format!($fmt $($arg)*)
        )
    };
    ($expr:expr) => {
        $crate::__log_emit!(|p, m| format!("{p}┣[\x1b[32mINFO\x1b[0m] {m}\n"), $expr)
    };
}

/// Log a `[DEBUG]` message when debug output is enabled.
#[macro_export]
macro_rules! log_debug {
    ($fmt:literal $($arg:tt)*) => {
        if $crate::logger::Log::is_debug_enabled() {
            $crate::__log_emit!(
                |p, m| format!("{p}┣[\x1b[36mDEBUG\x1b[0m] {m}\n"),
                format!($fmt $($arg)*)
            )
        }
    };
    ($expr:expr) => {
        if $crate::logger::Log::is_debug_enabled() {
            $crate::__log_emit!(|p, m| format!("{p}┣[\x1b[36mDEBUG\x1b[0m] {m}\n"), $expr)
        }
    };
}

/// Log a red `[CRITICAL]` message.
#[macro_export]
macro_rules! log_critical {
    ($fmt:literal $($arg:tt)*) => {
        $crate::__log_emit!(
            |p, m| format!("{p}┣[\x1b[31mCRITICAL\x1b[0m] {m}\n"),
            format!($fmt $($arg)*)
        )
    };
    ($expr:expr) => {
        $crate::__log_emit!(|p, m| format!("{p}┣[\x1b[31mCRITICAL\x1b[0m] {m}\n"), $expr)
    };
}
