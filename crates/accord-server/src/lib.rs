//! # Accord Server
//!
//! Serving side of Accord:
//!
//! - [`decode`] - raw request groups and the fixed-order request decoder
//! - [`encode`] - status-driven response variant resolution and encoding
//! - [`handler`] - handler input/output and erased handlers
//! - [`Registry`] - exhaustive handler registration
//! - [`Service`] - the assembled service
//!
//! Routing a concrete HTTP request to an endpoint id is left to the caller;
//! [`accord_core::Api::match_request`] does the path matching.
//!
//! ## Example
//!
//! ```rust
//! use accord_core::fixtures;
//! use accord_server::{Output, RawRequest, Registry};
//! use http::StatusCode;
//!
//! # tokio_test::block_on(async {
//! let service = Registry::new(fixtures::hello_api().unwrap())
//!     .bind("hello", |_input| async {
//!         Ok(Output::new(12)
//!             .status(StatusCode::CREATED)
//!             .header("x-hello-world", "test"))
//!     })
//!     .unwrap()
//!     .assemble()
//!     .unwrap();
//!
//! let response = service.respond("hello", RawRequest::new()).await;
//! assert_eq!(response.status(), StatusCode::CREATED);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/accord-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod decode;
pub mod encode;
pub mod handler;
mod registry;
mod service;

pub use decode::{DecodeFailure, Decoded, RawRequest, RequestDecoder};
pub use encode::{ApiResponse, ResponseEncoder};
pub use handler::{handler_fn, BoxFuture, HandlerFn, Input, Output};
pub use registry::Registry;
pub use service::Service;
