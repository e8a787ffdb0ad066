//! # Accord Test
//!
//! In-memory testing for Accord services: no listener, no ports.
//!
//! - **Routing**: requests are matched to endpoints by method and path
//! - **Request Builder**: fluent API with query, headers and JSON bodies
//! - **Response Helpers**: status, headers, typed JSON and assertions
//!
//! ## Example
//!
//! ```ignore
//! use accord_test::TestClient;
//!
//! #[tokio::test]
//! async fn test_get_user() {
//!     let client = TestClient::new(service);
//!
//!     let response = client
//!         .get("/api/users/123")
//!         .query("include_deleted", "true")
//!         .header("Authorization", "Bearer token")
//!         .send()
//!         .await
//!         .unwrap();
//!
//!     assert_eq!(response.status(), 200);
//!     let user: User = response.json().unwrap();
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/accord-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
