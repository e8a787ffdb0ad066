//! Logging for Accord services.
//!
//! - [`Logger`] - per-service logging preset (default, pretty, structured,
//!   silent, custom)
//! - [`LogConfig`] and [`init_logging`] - process-wide subscriber setup
//! - [`fields`] - standard field names used by Accord's own events
//!
//! # Example
//!
//! ```
//! use accord_telemetry::{LogConfig, Logger};
//!
//! let logger = Logger::from_config(&LogConfig::development()).unwrap();
//! assert!(logger.dispatch().is_some());
//! ```

#![doc(html_root_url = "https://docs.rs/accord-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
mod logger;
pub mod logging;

pub use error::TelemetryError;
pub use logger::Logger;
pub use logging::{build_dispatch, create_env_filter, fields, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
