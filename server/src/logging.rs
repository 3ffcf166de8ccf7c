//! Runtime control of the log threshold.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt as tracing_fmt, reload};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognized threshold '{0}'")]
pub struct UnrecognizedLogThreshold(pub String);

#[derive(Debug, Error)]
pub enum LogControlError {
    #[error(transparent)]
    Unrecognized(#[from] UnrecognizedLogThreshold),

    #[error("failed to apply log threshold: {0}")]
    Reload(#[from] reload::Error),
}

/// Minimum severity that gets logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogThreshold {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogThreshold {
    pub fn as_str(self) -> &'static str {
        match self {
            LogThreshold::Off => "off",
            LogThreshold::Error => "error",
            LogThreshold::Warn => "warn",
            LogThreshold::Info => "info",
            LogThreshold::Debug => "debug",
            LogThreshold::Trace => "trace",
        }
    }

    pub fn level_filter(self) -> LevelFilter {
        match self {
            LogThreshold::Off => LevelFilter::OFF,
            LogThreshold::Error => LevelFilter::ERROR,
            LogThreshold::Warn => LevelFilter::WARN,
            LogThreshold::Info => LevelFilter::INFO,
            LogThreshold::Debug => LevelFilter::DEBUG,
            LogThreshold::Trace => LevelFilter::TRACE,
        }
    }

    fn env_filter(self) -> EnvFilter {
        EnvFilter::default().add_directive(self.level_filter().into())
    }

    /// Filter for process start: `RUST_LOG` directives when given, this
    /// threshold otherwise.
    fn startup_filter(self, directives: Option<&str>) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(self.level_filter().into())
            .parse_lossy(directives.unwrap_or_default())
    }
}

impl FromStr for LogThreshold {
    type Err = UnrecognizedLogThreshold;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(LogThreshold::Off),
            "error" => Ok(LogThreshold::Error),
            "warn" | "warning" => Ok(LogThreshold::Warn),
            "info" => Ok(LogThreshold::Info),
            "debug" => Ok(LogThreshold::Debug),
            "trace" | "all" => Ok(LogThreshold::Trace),
            _ => Err(UnrecognizedLogThreshold(s.to_string())),
        }
    }
}

impl TryFrom<String> for LogThreshold {
    type Error = UnrecognizedLogThreshold;

    fn try_from(s: String) -> Result<Self, <LogThreshold as TryFrom<String>>::Error> {
        s.parse()
    }
}

impl From<LogThreshold> for String {
    fn from(threshold: LogThreshold) -> Self {
        threshold.as_str().to_string()
    }
}

impl fmt::Display for LogThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle for changing the process-wide log threshold while running.
///
/// A detached control only records the threshold; it is what tests and
/// embedders without a global subscriber use.
#[derive(Clone)]
pub struct LogControl {
    handle: Option<reload::Handle<EnvFilter, Registry>>,
    threshold: Arc<Mutex<LogThreshold>>,
}

impl LogControl {
    /// Installs the global subscriber with a reloadable filter.
    ///
    /// `RUST_LOG` takes precedence over `initial` until a threshold is set
    /// at runtime.
    ///
    /// # Panics
    /// If a global subscriber is already set.
    pub fn install(initial: LogThreshold) -> Self {
        let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
        let (filter, handle) = reload::Layer::new(initial.startup_filter(directives.as_deref()));
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_fmt::layer().with_target(false).compact())
            .init();

        Self {
            handle: Some(handle),
            threshold: Arc::new(Mutex::new(initial)),
        }
    }

    pub fn detached(initial: LogThreshold) -> Self {
        Self {
            handle: None,
            threshold: Arc::new(Mutex::new(initial)),
        }
    }

    pub fn threshold(&self) -> LogThreshold {
        *self.threshold.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_threshold(&self, threshold: LogThreshold) -> Result<(), LogControlError> {
        let mut current = self.threshold.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = &self.handle {
            handle.reload(threshold.env_filter())?;
        }
        let previous = std::mem::replace(&mut *current, threshold);
        info!(%previous, %threshold, "Log threshold changed");
        Ok(())
    }

    /// Parses and applies a threshold given by name (`"debug"`, `"WARN"`, ...).
    pub fn set_threshold_str(&self, threshold: &str) -> Result<LogThreshold, LogControlError> {
        let threshold: LogThreshold = threshold.parse()?;
        self.set_threshold(threshold)?;
        Ok(threshold)
    }
}
