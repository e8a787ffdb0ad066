//! Logger presets selectable per service.

use std::fmt;

use tracing::Dispatch;

use crate::logging::{build_dispatch, preset_dispatch, LogConfig};
use crate::TelemetryResult;

/// Where a service sends its logs.
///
/// A service runs every dispatch, handler included, under the preset's
/// dispatcher. `Default` leaves the ambient subscriber in charge.
///
/// # Example
///
/// ```
/// use accord_telemetry::Logger;
///
/// assert!(Logger::Default.dispatch().is_none());
/// assert!(Logger::Silent.dispatch().is_some());
/// ```
#[derive(Clone, Default)]
pub enum Logger {
    /// Whatever subscriber is current (global or thread default).
    #[default]
    Default,
    /// Human-readable multi-line output at debug level.
    Pretty,
    /// JSON output at info level.
    Structured,
    /// Discard everything.
    Silent,
    /// A caller-built dispatcher.
    Custom(Dispatch),
}

impl Logger {
    /// Builds a logger from a full logging configuration.
    pub fn from_config(config: &LogConfig) -> TelemetryResult<Self> {
        build_dispatch(config).map(Self::Custom)
    }

    /// Returns the dispatcher to scope requests under, or `None` for the
    /// ambient one.
    #[must_use]
    pub fn dispatch(&self) -> Option<Dispatch> {
        match self {
            Self::Default => None,
            Self::Pretty => Some(preset_dispatch(&LogConfig::development())),
            Self::Structured => Some(preset_dispatch(&LogConfig::production())),
            Self::Silent => Some(Dispatch::none()),
            Self::Custom(dispatch) => Some(dispatch.clone()),
        }
    }

    /// Returns the preset name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Pretty => "pretty",
            Self::Structured => "structured",
            Self::Silent => "silent",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Logger").field(&self.name()).finish()
    }
}
