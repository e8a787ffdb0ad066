//! Test error types.

use http::Method;
use thiserror::Error;

/// Errors that can occur during testing.
#[derive(Debug, Error)]
pub enum TestError {
    /// Request building failed.
    #[error("request build error: {0}")]
    RequestBuild(String),

    /// Header name or value is invalid.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response body is not UTF-8.
    #[error("body is not valid UTF-8: {0}")]
    BodyRead(#[from] std::string::FromUtf8Error),

    /// No endpoint of the service matches the request.
    #[error("no endpoint matches {method} {path}")]
    NoRoute {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_route_message() {
        let err = TestError::NoRoute {
            method: Method::DELETE,
            path: "/users/1".to_string(),
        };
        assert_eq!(err.to_string(), "no endpoint matches DELETE /users/1");
    }
}
