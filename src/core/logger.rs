// IP Geolocation Client - Systemd-Style Logger
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Systemd-style logging compatible with journald
//!
//! The library logs through the `log_*!` macros. Nothing is printed until a
//! binary calls [`Logger::init`], so embedding applications stay quiet.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

/// Log levels following systemd priority conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    /// Error conditions (3)
    Error = 3,
    /// Warning conditions (4)
    Warning = 4,
    /// Informational message (6)
    Info = 6,
    /// Debug-level message (7)
    Debug = 7,
}

impl LogLevel {
    pub fn priority(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERR",
            LogLevel::Warning => "WARNING",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    pub fn color_code(self) -> &'static str {
        match self {
            LogLevel::Error => "\x1b[31m",
            LogLevel::Warning => "\x1b[33m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Debug => "\x1b[37m",
        }
    }
}

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("logger already initialized")]
    AlreadyInitialized,
    #[error("logger lock poisoned")]
    InitError,
}

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    pub use_colors: bool,
    pub include_timestamp: bool,
    /// Emit `KEY=value` records for journald instead of terminal lines
    pub journald_format: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            use_colors: atty::is(atty::Stream::Stderr),
            include_timestamp: true,
            journald_format: false,
        }
    }
}

static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

#[derive(Debug)]
pub struct Logger {
    config: LoggerConfig,
}

impl Logger {
    pub fn new(config: LoggerConfig) -> Self {
        Self { config }
    }

    /// Install the global logger
    pub fn init(config: LoggerConfig) -> Result<(), LoggerError> {
        let mut global = LOGGER.lock().map_err(|_| LoggerError::InitError)?;
        if global.is_some() {
            return Err(LoggerError::AlreadyInitialized);
        }
        *global = Some(Self::new(config));
        Ok(())
    }

    pub fn should_log(&self, level: LogLevel) -> bool {
        level <= self.config.min_level
    }

    pub fn log(&self, level: LogLevel, target: &str, message: &str) {
        if self.should_log(level) {
            eprintln!("{}", self.format(level, target, message, now_secs()));
        }
    }

    fn format(&self, level: LogLevel, target: &str, message: &str, timestamp: u64) -> String {
        if self.config.journald_format {
            let mut output = format!("PRIORITY={}\nMESSAGE={}\n", level.priority(), message);
            if !target.is_empty() {
                output.push_str(&format!("CODE_FILE={}\n", target));
            }
            if self.config.include_timestamp {
                output.push_str(&format!("_SOURCE_REALTIME_TIMESTAMP={}\n", timestamp * 1_000_000));
            }
            output.push_str("SYSLOG_IDENTIFIER=ipgeolocation\n");
            return output;
        }

        let mut output = String::new();
        if self.config.include_timestamp {
            let datetime = chrono::DateTime::from_timestamp(timestamp as i64, 0)
                .unwrap_or_default()
                .format("%Y-%m-%d %H:%M:%S");
            output.push_str(&format!("{} ", datetime));
        }
        if self.config.use_colors {
            output.push_str(&format!("{}[{}]\x1b[0m {}", level.color_code(), level.as_str(), message));
        } else {
            output.push_str(&format!("[{}] {}", level.as_str(), message));
        }
        output
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::core::logger::log_with_level($crate::core::logger::LogLevel::Error, module_path!(), &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::core::logger::log_with_level($crate::core::logger::LogLevel::Warning, module_path!(), &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::core::logger::log_with_level($crate::core::logger::LogLevel::Debug, module_path!(), &format!($($arg)*))
    };
}

/// Backend of the `log_*!` macros; a no-op until [`Logger::init`] runs
pub fn log_with_level(level: LogLevel, target: &str, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(ref logger) = *guard {
            logger.log(level, target, message);
        }
    }
}

/// `[  FAILED ]` line used by the binary when a lookup fails
pub fn log_task_failed(task_name: &str, error: &str) {
    log_with_level(LogLevel::Error, module_path!(), &format!("[  FAILED ] {} - {}", task_name, error));
}

/// `[   OK   ]` line used by the binary when a lookup completes
pub fn log_task_complete(task_name: &str) {
    log_with_level(LogLevel::Info, module_path!(), &format!("[   OK   ] {}", task_name));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(min_level: LogLevel, journald_format: bool) -> Logger {
        Logger::new(LoggerConfig {
            min_level,
            use_colors: false,
            include_timestamp: false,
            journald_format,
        })
    }

    #[test]
    fn test_level_filtering() {
        let logger = plain(LogLevel::Warning, false);
        assert!(logger.should_log(LogLevel::Error));
        assert!(logger.should_log(LogLevel::Warning));
        assert!(!logger.should_log(LogLevel::Info));
        assert!(!logger.should_log(LogLevel::Debug));
    }

    #[test]
    fn test_terminal_format() {
        let logger = plain(LogLevel::Debug, false);
        assert_eq!(logger.format(LogLevel::Warning, "x", "slow reply", 0), "[WARNING] slow reply");
    }

    #[test]
    fn test_journald_format() {
        let logger = plain(LogLevel::Debug, true);
        let out = logger.format(LogLevel::Error, "ipgeolocation::client", "boom", 0);
        assert!(out.contains("PRIORITY=3\n"));
        assert!(out.contains("MESSAGE=boom\n"));
        assert!(out.contains("CODE_FILE=ipgeolocation::client\n"));
        assert!(out.ends_with("SYSLOG_IDENTIFIER=ipgeolocation\n"));
    }
}
