//! Error types for Accord.
//!
//! Two families of errors exist:
//!
//! - [`ApiError`] is produced while serving a request: client validation
//!   failures, server-side encode failures, handler-declared errors and
//!   dispatch to an unknown endpoint. It is rendered into a response by an
//!   [`ErrorFormatter`](crate::format::ErrorFormatter).
//! - [`ConfigError`] is produced while composing a service: malformed API
//!   declarations and incomplete or inconsistent handler registration. It
//!   surfaces before anything is served.

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::codec::FieldGroup;
use crate::schema::ValidationError;

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;

/// Broad classes of request-time failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The client sent a request that does not match the endpoint's schemas.
    ClientValidation,
    /// The handler produced output the endpoint's response schemas reject.
    ServerEncode,
    /// The handler returned an error.
    Handler,
    /// The request targeted an endpoint the service does not have.
    Routing,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::ClientValidation => StatusCode::BAD_REQUEST,
            Self::ServerEncode | Self::Handler => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Routing => StatusCode::NOT_FOUND,
        }
    }
}

/// The closed set of request-time failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Query failed to decode.
    InvalidQuery,
    /// Path params failed to decode.
    InvalidParams,
    /// Body failed to decode.
    InvalidBody,
    /// Headers failed to decode.
    InvalidHeaders,
    /// Response content failed to encode.
    InvalidResponseContent,
    /// Response headers failed to encode.
    InvalidResponseHeaders,
    /// No response variant declared for the handler's status.
    UnmatchedStatus,
    /// Dispatch targeted an unknown endpoint id.
    UnknownEndpoint,
    /// Handler-declared error.
    Handler,
}

impl ErrorKind {
    /// Returns the kind for a request group decode failure.
    #[must_use]
    pub const fn for_group(group: FieldGroup) -> Self {
        match group {
            FieldGroup::Query => Self::InvalidQuery,
            FieldGroup::Params => Self::InvalidParams,
            FieldGroup::Body => Self::InvalidBody,
            FieldGroup::Headers => Self::InvalidHeaders,
        }
    }

    /// Returns the kebab-case kind name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidQuery => "invalid-query",
            Self::InvalidParams => "invalid-params",
            Self::InvalidBody => "invalid-body",
            Self::InvalidHeaders => "invalid-headers",
            Self::InvalidResponseContent => "invalid-response-content",
            Self::InvalidResponseHeaders => "invalid-response-headers",
            Self::UnmatchedStatus => "unmatched-status",
            Self::UnknownEndpoint => "unknown-endpoint",
            Self::Handler => "handler",
        }
    }

    /// Returns the category this kind belongs to.
    #[must_use]
    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::InvalidQuery | Self::InvalidParams | Self::InvalidBody | Self::InvalidHeaders => {
                ErrorCategory::ClientValidation
            }
            Self::InvalidResponseContent | Self::InvalidResponseHeaders | Self::UnmatchedStatus => {
                ErrorCategory::ServerEncode
            }
            Self::UnknownEndpoint => ErrorCategory::Routing,
            Self::Handler => ErrorCategory::Handler,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The part of a response that failed to encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsePart {
    /// Response content.
    Content,
    /// Response headers.
    Headers,
}

impl fmt::Display for ResponsePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content => f.write_str("content"),
            Self::Headers => f.write_str("headers"),
        }
    }
}

/// Request-time error.
///
/// # Example
///
/// ```
/// use accord_core::error::{ApiError, ErrorCategory};
/// use http::StatusCode;
///
/// fn find_user(id: &str) -> Result<(), ApiError> {
///     Err(ApiError::not_found(format!("user '{id}' does not exist")))
/// }
///
/// let err = find_user("42").unwrap_err();
/// assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
/// assert_eq!(err.category(), ErrorCategory::Handler);
/// ```
#[derive(Error, Debug)]
pub enum ApiError {
    /// A request field group failed to decode.
    #[error("invalid {group}: {diagnostic}")]
    InvalidRequest {
        /// The first group that failed.
        group: FieldGroup,
        /// What went wrong.
        #[source]
        diagnostic: ValidationError,
    },

    /// Handler output failed to encode.
    #[error("invalid response {part}: {diagnostic}")]
    InvalidResponse {
        /// The part that failed.
        part: ResponsePart,
        /// What went wrong.
        #[source]
        diagnostic: ValidationError,
    },

    /// The handler returned a status with no declared response variant.
    #[error("no response variant declared for status {status}")]
    UnmatchedStatus {
        /// The status returned by the handler.
        status: u16,
    },

    /// The service has no endpoint with this id.
    #[error("unknown endpoint '{id}'")]
    UnknownEndpoint {
        /// The requested id.
        id: String,
    },

    /// Error declared by a handler.
    #[error("{message}")]
    Handler {
        /// Response status.
        status: StatusCode,
        /// Human-readable message, safe to expose.
        message: String,
        /// Extra structured details, safe to expose.
        details: Option<Value>,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl ApiError {
    /// Creates a request decode error.
    #[must_use]
    pub const fn invalid_request(group: FieldGroup, diagnostic: ValidationError) -> Self {
        Self::InvalidRequest { group, diagnostic }
    }

    /// Creates a response encode error.
    #[must_use]
    pub const fn invalid_response(part: ResponsePart, diagnostic: ValidationError) -> Self {
        Self::InvalidResponse { part, diagnostic }
    }

    /// Creates a handler error with an arbitrary status.
    #[must_use]
    pub fn custom(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Handler {
            status,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Creates a 400 handler error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::custom(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 401 handler error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::custom(StatusCode::UNAUTHORIZED, message)
    }

    /// Creates a 403 handler error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::custom(StatusCode::FORBIDDEN, message)
    }

    /// Creates a 404 handler error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::custom(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 409 handler error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::custom(StatusCode::CONFLICT, message)
    }

    /// Creates a 429 handler error.
    #[must_use]
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::custom(StatusCode::TOO_MANY_REQUESTS, message)
    }

    /// Creates a 500 handler error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::custom(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Creates a 500 handler error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Handler {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            details: None,
            source: Some(source.into()),
        }
    }

    /// Creates a 503 handler error.
    #[must_use]
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::custom(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    /// Attaches structured details to a handler error.
    ///
    /// Other kinds are returned unchanged.
    #[must_use]
    pub fn with_details(mut self, value: Value) -> Self {
        if let Self::Handler { details, .. } = &mut self {
            *details = Some(value);
        }
        self
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest { group, .. } => ErrorKind::for_group(*group),
            Self::InvalidResponse {
                part: ResponsePart::Content,
                ..
            } => ErrorKind::InvalidResponseContent,
            Self::InvalidResponse {
                part: ResponsePart::Headers,
                ..
            } => ErrorKind::InvalidResponseHeaders,
            Self::UnmatchedStatus { .. } => ErrorKind::UnmatchedStatus,
            Self::UnknownEndpoint { .. } => ErrorKind::UnknownEndpoint,
            Self::Handler { .. } => ErrorKind::Handler,
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        self.kind().category()
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Handler { status, .. } => *status,
            _ => self.category().default_status_code(),
        }
    }

    /// Returns a stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::InvalidQuery => "INVALID_QUERY",
            ErrorKind::InvalidParams => "INVALID_PARAMS",
            ErrorKind::InvalidBody => "INVALID_BODY",
            ErrorKind::InvalidHeaders => "INVALID_HEADERS",
            ErrorKind::InvalidResponseContent | ErrorKind::InvalidResponseHeaders => {
                "RESPONSE_ENCODE_ERROR"
            }
            ErrorKind::UnmatchedStatus => "UNMATCHED_STATUS",
            ErrorKind::UnknownEndpoint => "UNKNOWN_ENDPOINT",
            ErrorKind::Handler => match self.status_code().as_u16() {
                400 => "BAD_REQUEST",
                401 => "UNAUTHORIZED",
                403 => "FORBIDDEN",
                404 => "NOT_FOUND",
                409 => "CONFLICT",
                429 => "RATE_LIMITED",
                503 => "SERVICE_UNAVAILABLE",
                500..=599 => "INTERNAL_ERROR",
                _ => "HANDLER_ERROR",
            },
        }
    }

    /// Returns the request field group, for client validation errors.
    #[must_use]
    pub const fn group(&self) -> Option<FieldGroup> {
        match self {
            Self::InvalidRequest { group, .. } => Some(*group),
            _ => None,
        }
    }

    /// Returns the validation diagnostic, for decode and encode errors.
    #[must_use]
    pub const fn diagnostic(&self) -> Option<&ValidationError> {
        match self {
            Self::InvalidRequest { diagnostic, .. } | Self::InvalidResponse { diagnostic, .. } => {
                Some(diagnostic)
            }
            _ => None,
        }
    }

    /// Returns the handler-supplied details.
    #[must_use]
    pub const fn details(&self) -> Option<&Value> {
        match self {
            Self::Handler { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}

/// Composition-time error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Two endpoints share an id.
    #[error("duplicate endpoint id '{id}'")]
    DuplicateEndpoint {
        /// The duplicated id.
        id: String,
    },

    /// Two response variants of one endpoint share a status.
    #[error("endpoint '{endpoint}' declares status {status} more than once")]
    DuplicateStatus {
        /// The endpoint id.
        endpoint: String,
        /// The duplicated status.
        status: u16,
    },

    /// A response variant declares a status outside 100..=999.
    #[error("endpoint '{endpoint}' declares invalid status {status}")]
    InvalidStatus {
        /// The endpoint id.
        endpoint: String,
        /// The invalid status.
        status: u16,
    },

    /// A handler was bound to an id the API does not declare.
    #[error("cannot bind handler: unknown endpoint '{id}'")]
    UnknownEndpoint {
        /// The unknown id.
        id: String,
    },

    /// A handler was bound to an id that already has one.
    #[error("endpoint '{id}' already has a handler")]
    AlreadyBound {
        /// The endpoint id.
        id: String,
    },

    /// Assembly was attempted with unimplemented endpoints.
    #[error("endpoints not implemented: {}", ids.join(", "))]
    Unimplemented {
        /// The unimplemented ids, in declaration order.
        ids: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::error::Error as _;

    fn diagnostic() -> ValidationError {
        ValidationError::new("$.id", "expected string, got number")
    }

    #[test]
    fn test_error_category_status_codes() {
        assert_eq!(
            ErrorCategory::ClientValidation.default_status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCategory::ServerEncode.default_status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCategory::Routing.default_status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_invalid_request_per_group() {
        let cases = [
            (FieldGroup::Query, "invalid-query", "INVALID_QUERY"),
            (FieldGroup::Params, "invalid-params", "INVALID_PARAMS"),
            (FieldGroup::Body, "invalid-body", "INVALID_BODY"),
            (FieldGroup::Headers, "invalid-headers", "INVALID_HEADERS"),
        ];

        for (group, kind, code) in cases {
            let err = ApiError::invalid_request(group, diagnostic());
            assert_eq!(err.kind().as_str(), kind);
            assert_eq!(err.code(), code);
            assert_eq!(err.group(), Some(group));
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert_eq!(err.diagnostic(), Some(&diagnostic()));
        }
    }

    #[test]
    fn test_invalid_response_is_server_side() {
        let err = ApiError::invalid_response(ResponsePart::Headers, diagnostic());
        assert_eq!(err.kind(), ErrorKind::InvalidResponseHeaders);
        assert_eq!(err.category(), ErrorCategory::ServerEncode);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.group().is_none());
    }

    #[test]
    fn test_unmatched_status() {
        let err = ApiError::UnmatchedStatus { status: 500 };
        assert_eq!(err.code(), "UNMATCHED_STATUS");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "no response variant declared for status 500");
    }

    #[test]
    fn test_handler_constructors() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unauthorized("x").code(), "UNAUTHORIZED");
        assert_eq!(ApiError::forbidden("x").code(), "FORBIDDEN");
        assert_eq!(ApiError::not_found("x").code(), "NOT_FOUND");
        assert_eq!(ApiError::conflict("x").code(), "CONFLICT");
        assert_eq!(ApiError::too_many_requests("x").code(), "RATE_LIMITED");
        assert_eq!(ApiError::internal("x").code(), "INTERNAL_ERROR");
        assert_eq!(
            ApiError::service_unavailable("x").code(),
            "SERVICE_UNAVAILABLE"
        );
        assert_eq!(
            ApiError::custom(StatusCode::IM_A_TEAPOT, "x").code(),
            "HANDLER_ERROR"
        );
    }

    #[test]
    fn test_internal_with_source_keeps_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = ApiError::internal_with_source("storage failed", io);

        assert_eq!(err.to_string(), "storage failed");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_with_details() {
        let err = ApiError::conflict("taken").with_details(json!({ "field": "email" }));
        assert_eq!(err.details(), Some(&json!({ "field": "email" })));

        let err = ApiError::UnmatchedStatus { status: 418 }.with_details(json!(1));
        assert!(err.details().is_none());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Unimplemented {
            ids: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "endpoints not implemented: a, b");

        let err = ConfigError::AlreadyBound { id: "a".into() };
        assert_eq!(err.to_string(), "endpoint 'a' already has a handler");
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(
            serde_json::to_value(ErrorKind::InvalidResponseContent).unwrap(),
            json!("invalid-response-content")
        );
    }
}
