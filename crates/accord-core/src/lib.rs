//! # Accord Core
//!
//! Core types for Accord, a typed contract layer for HTTP-style services.
//!
//! - [`Schema`] - validating decoder/encoder over JSON values
//! - [`FieldCodec`] - per-field-group codec with default schemas
//! - [`Endpoint`] and [`Api`] - endpoint descriptors
//! - [`ApiError`] and [`ConfigError`] - the error taxonomy
//! - [`ErrorFormatter`] - pluggable error rendering
//! - [`Capabilities`] - per-handler service container

#![doc(html_root_url = "https://docs.rs/accord-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
pub mod codec;
mod context;
pub mod di;
pub mod error;
pub mod fixtures;
pub mod format;
pub mod schema;

pub use api::{Api, ApiBuilder, Endpoint, EndpointBuilder, RequestSchemas, ResponseShape, ResponseVariant};
pub use codec::{FieldCodec, FieldGroup};
pub use context::RequestId;
pub use di::{Capabilities, MissingCapability};
pub use error::{ApiError, ApiResult, ConfigError, ErrorCategory, ErrorKind, ResponsePart};
pub use format::{ErrorEnvelope, ErrorFormatter, RenderedBody, RenderedError};
pub use schema::{Schema, ValidationError};
