//! Rendering of [`ApiError`] into responses.
//!
//! The formatter is a closed set of presets plus a custom escape hatch. Every
//! preset keeps the error's status; they differ only in the body. Internal
//! error sources are never rendered.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::FieldGroup;
use crate::error::{ApiError, ErrorCategory, ErrorKind};
use crate::schema::ValidationError;

/// Serializable error envelope used by the JSON presets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error detail.
    pub error: ErrorDetail,
}

/// The body of an [`ErrorEnvelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable code.
    pub code: String,
    /// Error kind.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Failing request group, for client validation errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<FieldGroup>,
    /// Error category (structured preset only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
    /// HTTP status (structured preset only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Validation diagnostic (structured preset only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<ValidationError>,
    /// Handler details (structured preset only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorEnvelope {
    /// Builds the compact envelope.
    #[must_use]
    pub fn compact(err: &ApiError) -> Self {
        Self {
            error: ErrorDetail {
                code: err.code().to_string(),
                kind: err.kind(),
                message: err.to_string(),
                group: err.group(),
                category: None,
                status: None,
                diagnostic: None,
                details: None,
            },
        }
    }

    /// Builds the envelope with category, status, diagnostic and details.
    #[must_use]
    pub fn detailed(err: &ApiError) -> Self {
        let mut envelope = Self::compact(err);
        envelope.error.category = Some(err.category());
        envelope.error.status = Some(err.status_code().as_u16());
        envelope.error.diagnostic = err.diagnostic().cloned();
        envelope.error.details = err.details().cloned();
        envelope
    }
}

/// A rendered response body.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedBody {
    /// JSON document.
    Json(Value),
    /// Plain text.
    Text(String),
    /// No body.
    Empty,
}

/// An error rendered by an [`ErrorFormatter`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedError {
    /// Response status.
    pub status: StatusCode,
    /// Response body.
    pub body: RenderedBody,
}

impl RenderedError {
    /// Converts into an HTTP response.
    #[must_use]
    pub fn into_http(self) -> http::Response<Bytes> {
        let (content_type, bytes) = match self.body {
            RenderedBody::Json(value) => (
                Some("application/json"),
                Bytes::from(serde_json::to_vec(&value).unwrap_or_default()),
            ),
            RenderedBody::Text(text) => (Some("text/plain; charset=utf-8"), Bytes::from(text)),
            RenderedBody::Empty => (None, Bytes::new()),
        };

        let mut response = http::Response::new(bytes);
        *response.status_mut() = self.status;
        if let Some(content_type) = content_type {
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        response
    }
}

/// Signature of a custom formatter.
pub type FormatFn = dyn Fn(&ApiError) -> RenderedError + Send + Sync;

/// Strategy for rendering [`ApiError`]s.
///
/// # Example
///
/// ```
/// use accord_core::error::ApiError;
/// use accord_core::format::{ErrorFormatter, RenderedBody};
///
/// let err = ApiError::not_found("no such user");
///
/// let rendered = ErrorFormatter::Default.format(&err);
/// assert_eq!(rendered.status.as_u16(), 404);
///
/// let rendered = ErrorFormatter::Silent.format(&err);
/// assert_eq!(rendered.body, RenderedBody::Empty);
/// ```
#[derive(Clone, Default)]
pub enum ErrorFormatter {
    /// Compact JSON envelope.
    #[default]
    Default,
    /// One human-readable line of text.
    Pretty,
    /// JSON envelope with category, status, diagnostic and details.
    Structured,
    /// Status only.
    Silent,
    /// User-supplied renderer.
    Custom(Arc<FormatFn>),
}

impl ErrorFormatter {
    /// Wraps a closure as a custom formatter.
    #[must_use]
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&ApiError) -> RenderedError + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Renders an error.
    #[must_use]
    pub fn format(&self, err: &ApiError) -> RenderedError {
        let status = err.status_code();
        let body = match self {
            Self::Default => RenderedBody::Json(envelope_value(&ErrorEnvelope::compact(err))),
            Self::Structured => RenderedBody::Json(envelope_value(&ErrorEnvelope::detailed(err))),
            Self::Pretty => RenderedBody::Text(format!("{}: {}", status, err)),
            Self::Silent => RenderedBody::Empty,
            Self::Custom(f) => return f(err),
        };
        RenderedError { status, body }
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

impl fmt::Debug for ErrorFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErrorFormatter").field(&self.name()).finish()
    }
}

fn envelope_value(envelope: &ErrorEnvelope) -> Value {
    serde_json::to_value(envelope).unwrap_or(Value::Null)
}
