//! Debugging infrastructure for skiff.
//!
//! Controlled by the DEBUG_LEVEL environment variable:
//! - 0 or unset: No debugging
//! - 1 (or "error"): Errors only
//! - 2 (or "info"): Info level (tab lifecycle, session events)
//! - 3 (or "debug"): Debug level (selection changes, event routing)
//! - 4 (or "trace"): Trace level (every operation, detailed info)
//!
//! All output goes to /tmp/skiff_debug.log on Unix/macOS, or
//! %TEMP%\skiff_debug.log on Windows, keeping diagnostics out of the host
//! app's stdout/stderr. `init_log_bridge` additionally routes the standard
//! `log` macros into the same file, mirroring to stderr when RUST_LOG is set.

use parking_lot::Mutex;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Debug level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    Off = 0,
    Error = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl DebugLevel {
    fn from_env() -> Self {
        let Ok(val) = std::env::var("DEBUG_LEVEL") else {
            return DebugLevel::Off;
        };
        match val.trim().parse::<u8>() {
            Ok(0) => DebugLevel::Off,
            Ok(1) => DebugLevel::Error,
            Ok(2) => DebugLevel::Info,
            Ok(3) => DebugLevel::Debug,
            Ok(4) => DebugLevel::Trace,
            _ => match val.trim().to_ascii_lowercase().as_str() {
                "error" => DebugLevel::Error,
                "info" => DebugLevel::Info,
                "debug" => DebugLevel::Debug,
                "trace" => DebugLevel::Trace,
                _ => DebugLevel::Off,
            },
        }
    }
}

/// Global debug logger
struct DebugLogger {
    level: DebugLevel,
    file: Option<std::fs::File>,
}

impl DebugLogger {
    fn new() -> Self {
        let level = DebugLevel::from_env();

        let file = if level != DebugLevel::Off {
            #[cfg(unix)]
            let log_path = std::path::PathBuf::from("/tmp/skiff_debug.log");
            #[cfg(windows)]
            let log_path = std::env::temp_dir().join("skiff_debug.log");

            match OpenOptions::new()
                .write(true)
                .truncate(true)
                .create(true)
                .open(&log_path)
            {
                Ok(f) => {
                    // Write header
                    let mut logger = DebugLogger {
                        level,
                        file: Some(f),
                    };
                    logger.write_raw(&format!(
                        "\n{}\nskiff debug session started at {} (level={:?})\n{}\n",
                        "=".repeat(80),
                        get_timestamp(),
                        level,
                        "=".repeat(80)
                    ));
                    return logger;
                }
                // Silently fail if the log file can't be opened
                Err(_e) => None,
            }
        } else {
            None
        };

        DebugLogger { level, file }
    }

    fn write_raw(&mut self, msg: &str) {
        if let Some(ref mut file) = self.file {
            let _ = file.write_all(msg.as_bytes());
            let _ = file.flush();
        }
    }

    fn log(&mut self, level: DebugLevel, category: &str, msg: &str) {
        if level <= self.level {
            let timestamp = get_timestamp();
            let level_str = match level {
                DebugLevel::Error => "ERROR",
                DebugLevel::Info => "INFO ",
                DebugLevel::Debug => "DEBUG",
                DebugLevel::Trace => "TRACE",
                DebugLevel::Off => return,
            };
            self.write_raw(&format!(
                "[{}] [{}] [{}] {}\n",
                timestamp, level_str, category, msg
            ));
        }
    }
}

static LOGGER: OnceLock<Mutex<DebugLogger>> = OnceLock::new();

fn get_logger() -> &'static Mutex<DebugLogger> {
    LOGGER.get_or_init(|| Mutex::new(DebugLogger::new()))
}

fn get_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Check if debugging is enabled at given level
pub fn is_enabled(level: DebugLevel) -> bool {
    let logger = get_logger().lock();
    level <= logger.level
}

/// Log a message at specified level
pub fn log(level: DebugLevel, category: &str, msg: &str) {
    let mut logger = get_logger().lock();
    logger.log(level, category, msg);
}

/// Log formatted message
pub fn logf(level: DebugLevel, category: &str, args: fmt::Arguments) {
    if is_enabled(level) {
        log(level, category, &format!("{}", args));
    }
}

/// Bridge routing the standard `log` macros into the debug file.
struct LogBridge {
    mirror_stderr: bool,
}

impl log::Log for LogBridge {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let level = match record.level() {
            log::Level::Error => DebugLevel::Error,
            log::Level::Warn | log::Level::Info => DebugLevel::Info,
            log::Level::Debug => DebugLevel::Debug,
            log::Level::Trace => DebugLevel::Trace,
        };
        logf(level, record.target(), *record.args());
        if self.mirror_stderr {
            eprintln!("[{}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Install the `log` facade bridge.
///
/// Precedence for the max level: explicit argument (e.g. a CLI flag), then
/// RUST_LOG, then Info. Safe to call more than once; later calls are no-ops.
pub fn init_log_bridge(cli_level: Option<log::LevelFilter>) {
    let env_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| v.parse::<log::LevelFilter>().ok());
    let mirror_stderr = std::env::var("RUST_LOG").is_ok();
    let level = cli_level.or(env_level).unwrap_or(log::LevelFilter::Info);

    if log::set_boxed_logger(Box::new(LogBridge { mirror_stderr })).is_ok() {
        log::set_max_level(level);
    }
}


// Convenience macros for logging
#[macro_export]
macro_rules! debug_error {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Error, $category, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_info {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Info, $category, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_log {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Debug, $category, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_trace {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Trace, $category, format_args!($($arg)*))
    };
}
