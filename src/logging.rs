//! Logging setup for swarmdeck.
//!
//! Diagnostics go to stderr through `tracing`, so command output on stdout
//! stays machine-readable. `RUST_LOG` overrides the level chosen by flags.
//!
//! ```rust
//! use swarmdeck::logging::{LogConfig, init_logging};
//!
//! init_logging(&LogConfig::default());
//! tracing::debug!(path = "swarms.csv", "Loading table");
//! ```

use std::time::Instant;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Include timestamps in log output.
    pub timestamps: bool,
    /// Include target (module path) in log output.
    pub target: bool,
    /// Log span close events with their duration.
    pub spans: bool,
    pub colors: bool,
}

/// Minimum level to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    Off,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human-readable.
    Pretty,
    /// Single line per event.
    Compact,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::Compact,
            timestamps: false,
            target: false,
            spans: false,
            colors: true,
        }
    }
}

impl LogConfig {
    /// Errors only.
    #[must_use]
    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            ..Self::default()
        }
    }

    /// Debug level with module targets and timings.
    #[must_use]
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            timestamps: true,
            target: true,
            spans: true,
            colors: true,
        }
    }

    /// Disable ANSI colors (`NO_COLOR`, `[output] colors = false`).
    #[must_use]
    pub fn without_colors(mut self) -> Self {
        self.colors = false;
        self
    }
}

impl LogLevel {
    const fn to_filter_string(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
            Self::Off => "off",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" | "e" => Ok(Self::Error),
            "warn" | "warning" | "w" => Ok(Self::Warn),
            "info" | "i" => Ok(Self::Info),
            "debug" | "d" => Ok(Self::Debug),
            "trace" | "t" => Ok(Self::Trace),
            "off" | "none" | "quiet" => Ok(Self::Off),
            _ => Err(format!("Invalid log level: {s}")),
        }
    }
}

fn env_filter(level: LogLevel) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(format!("swarmdeck={}", level.to_filter_string()))
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(config: &LogConfig) {
    let span_events = if config.spans {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.colors)
        .with_target(config.target)
        .with_span_events(span_events);
    let registry = tracing_subscriber::registry().with(env_filter(config.level));

    match (config.format, config.timestamps) {
        (LogFormat::Pretty, true) => registry.with(layer.pretty()).try_init().ok(),
        (LogFormat::Pretty, false) => registry.with(layer.pretty().without_time()).try_init().ok(),
        (LogFormat::Compact, true) => registry.with(layer.compact()).try_init().ok(),
        (LogFormat::Compact, false) => registry.with(layer.compact().without_time()).try_init().ok(),
    };
}

/// Logging for the command line: `--quiet` wins over `--verbose`.
pub fn init_cli_logging(quiet: bool, verbose: bool, colors: bool) {
    let config = if quiet {
        LogConfig::quiet()
    } else if verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let config = if colors { config } else { config.without_colors() };
    init_logging(&config);
}

/// Logs the start and outcome of a long operation such as report generation.
pub struct OperationGuard {
    name: String,
    start: Instant,
}

impl OperationGuard {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        tracing::info!(operation = %name, "Starting operation");
        Self {
            name,
            start: Instant::now(),
        }
    }

    pub fn complete(self) {
        tracing::info!(
            operation = %self.name,
            duration_ms = self.start.elapsed().as_millis(),
            "Operation completed"
        );
    }

    pub fn fail(self, error: &dyn std::error::Error) {
        tracing::error!(
            operation = %self.name,
            duration_ms = self.start.elapsed().as_millis(),
            error = %error,
            "Operation failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("error".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert_eq!("W".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("none".parse::<LogLevel>().unwrap(), LogLevel::Off);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_presets() {
        assert_eq!(LogConfig::default().level, LogLevel::Warn);
        assert_eq!(LogConfig::quiet().level, LogLevel::Error);
        let verbose = LogConfig::verbose();
        assert_eq!(verbose.level, LogLevel::Debug);
        assert!(verbose.spans);
        assert!(!LogConfig::verbose().without_colors().colors);
    }

    #[test]
    fn test_filter_strings() {
        assert_eq!(LogLevel::Info.to_filter_string(), "info");
        assert_eq!(LogLevel::Off.to_filter_string(), "off");
    }

    #[test]
    fn test_operation_guard_without_subscriber() {
        let guard = OperationGuard::new("report");
        guard.complete();
        let failed = OperationGuard::new("report");
        failed.fail(&std::io::Error::other("disk full"));
    }
}
