//! Typed configuration for Accord services.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides, from the process or a `.env` file
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! The configuration selects the runtime strategies a
//! [`Registry`](https://docs.rs/accord-server) is given:
//! [`AccordConfig::logger`] and [`AccordConfig::error_formatter`].
//!
//! # Configuration File Format
//!
//! ```toml
//! [service]
//! name = "user-service"
//! version = "1.0.0"
//!
//! [logging]
//! preset = "structured"     # default | pretty | structured | silent
//! level = "info"
//! with_target = true
//! with_file_line = false
//!
//! [errors]
//! formatter = "default"     # default | pretty | structured | silent
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY`:
//!
//! - `ACCORD__SERVICE__NAME=user-service`
//! - `ACCORD__LOGGING__PRESET=pretty`
//! - `ACCORD__ERRORS__FORMATTER=structured`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;

pub use config::*;
pub use error::LoadError;
pub use loader::ConfigLoader;
