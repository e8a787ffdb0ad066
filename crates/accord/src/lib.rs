//! # Accord
//!
//! Typed endpoint contracts for HTTP-style services.
//!
//! An [`Api`](prelude::Api) declares endpoints with schemas for the four
//! request groups (query, params, body, headers) and for the response. A
//! [`Registry`](prelude::Registry) collects one handler per endpoint and only
//! assembles into a [`Service`](prelude::Service) once every endpoint has
//! one. The service decodes requests, runs handlers and encodes their output
//! against the declared schemas.
//!
//! ## Quick Start
//!
//! ```rust
//! use accord::prelude::*;
//! use http::StatusCode;
//!
//! # tokio_test::block_on(async {
//! let api = Api::builder("greeter")
//!     .endpoint(
//!         Endpoint::get("hello", "/hello")
//!             .query(Schema::object([("name", Schema::string().optional())]))
//!             .response(Schema::string())
//!             .build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let service = Registry::new(api)
//!     .bind("hello", |input: Input| async move {
//!         let name = input.query().and_then(|q| q["name"].as_str()).unwrap_or("world");
//!         Ok(Output::new(format!("hello, {name}")))
//!     })
//!     .unwrap()
//!     .assemble()
//!     .unwrap();
//!
//! let response = service
//!     .dispatch("hello", RawRequest::new().query_param("name", "ada"))
//!     .await
//!     .unwrap();
//! assert_eq!(response.status, StatusCode::OK);
//! assert_eq!(response.content, "hello, ada");
//! # });
//! ```
//!
//! ## Architecture
//!
//! ```text
//! RawRequest → query → params → body → headers → Handler
//!                                                   ↓
//! ApiResponse ← headers ← content ← variant(status) ┘
//! ```
//!
//! The first failing request group short-circuits with a 400; a handler
//! output that does not encode is a 500.

#![doc(html_root_url = "https://docs.rs/accord/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use accord_core as core;

// Re-export server types
pub use accord_server as server;

// Re-export logging types
pub use accord_telemetry as telemetry;

// Re-export configuration types
pub use accord_config as config;

use accord_config::{AccordConfig, LoadError};
use accord_server::Registry;

/// Applies configured strategies to a registry.
pub trait RegistryExt: Sized {
    /// Sets the service name and version, logger and error formatter from
    /// `config`.
    fn configure(self, config: &AccordConfig) -> Result<Self, LoadError>;
}

impl RegistryExt for Registry {
    fn configure(self, config: &AccordConfig) -> Result<Self, LoadError> {
        Ok(self
            .service_name(&config.service.name)
            .service_version(&config.service.version)
            .logger(config.logger()?)
            .error_formatter(config.error_formatter()))
    }
}

/// Prelude module for convenient imports.
///
/// ```rust
/// use accord::prelude::*;
/// ```
pub mod prelude {
    pub use accord_core::{
        Api, ApiError, ApiResult, ConfigError, Endpoint, ErrorFormatter, ErrorKind, FieldGroup,
        RequestId, ResponseVariant, Schema, ValidationError,
    };

    pub use accord_server::{ApiResponse, Input, Output, RawRequest, Registry, Service};

    pub use accord_telemetry::{LogConfig, Logger};

    pub use accord_config::{AccordConfig, ConfigLoader, LoadError};

    pub use crate::RegistryExt;
}
