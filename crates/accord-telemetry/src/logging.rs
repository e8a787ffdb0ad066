//! Structured logging for Accord services.
//!
//! Two ways to use it:
//!
//! - [`init_logging`] installs a process-wide subscriber, for binaries.
//! - [`build_dispatch`] returns a [`Dispatch`] that a service can scope
//!   around each request without touching global state.
//!
//! # Example
//!
//! ```rust,ignore
//! use accord_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! tracing::info!(endpoint_id = "getUser", "serving");
//! ```

use serde::{Deserialize, Serialize};
use tracing::Dispatch;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line human-readable output.
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Level filter (e.g. "info", "accord_server=debug,warn").
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Whether to emit span open/close events.
    pub span_events: bool,

    /// Whether to include file and line.
    pub with_file_line: bool,

    /// Whether to include the target (module path).
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            span_events: false,
            with_file_line: false,
            with_target: true,
        }
    }
}

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            span_events: true,
            with_file_line: true,
            with_target: true,
        }
    }

    /// Creates a production configuration with JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

fn fmt_layer(config: &LogConfig, filter: EnvFilter) -> BoxedLayer {
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_span_events(span_events)
        .with_file(config.with_file_line)
        .with_line_number(config.with_file_line)
        .with_target(config.with_target);

    match config.format {
        LogFormat::Json => layer.json().with_filter(filter).boxed(),
        LogFormat::Pretty => layer.pretty().with_filter(filter).boxed(),
        LogFormat::Compact => layer.compact().with_filter(filter).boxed(),
    }
}

/// Builds a dispatcher for `config` without installing it.
///
/// A disabled configuration yields a dispatcher that drops everything.
pub fn build_dispatch(config: &LogConfig) -> TelemetryResult<Dispatch> {
    if !config.enabled {
        return Ok(Dispatch::none());
    }

    let filter = create_env_filter(&config.level)?;
    let subscriber = tracing_subscriber::registry().with(fmt_layer(config, filter));
    Ok(Dispatch::new(subscriber))
}

/// Builds a dispatcher for a built-in preset.
///
/// Preset levels are known to parse, so unparsable directives are skipped
/// rather than reported.
pub(crate) fn preset_dispatch(config: &LogConfig) -> Dispatch {
    let filter = EnvFilter::new(&config.level);
    Dispatch::new(tracing_subscriber::registry().with(fmt_layer(config, filter)))
}

/// Installs a global subscriber.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` for a bad level and
/// `TelemetryError::LoggingInit` if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    tracing_subscriber::registry()
        .with(fmt_layer(config, filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Parses a level filter string.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter {
        filter: filter.to_string(),
        reason: e.to_string(),
    })
}

/// Standard log field names.
///
/// Use these field names for consistency across logs.
pub mod fields {
    /// Name of the span wrapping each dispatch.
    pub const DISPATCH_SPAN: &str = "accord.dispatch";

    /// Request ID field name.
    pub const REQUEST_ID: &str = "request_id";

    /// Endpoint ID field name.
    pub const ENDPOINT_ID: &str = "endpoint_id";

    /// Failing field group.
    pub const FIELD_GROUP: &str = "group";

    /// Error kind field name.
    pub const ERROR_KIND: &str = "error_kind";

    /// HTTP status code field name.
    pub const HTTP_STATUS: &str = "status";

    /// Duration field name (in milliseconds).
    pub const DURATION_MS: &str = "duration_ms";

    /// Error field name.
    pub const ERROR: &str = "error";
}
