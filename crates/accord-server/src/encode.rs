//! Response resolution and encoding.
//!
//! A [`ResponseEncoder`] is resolved once per endpoint from its
//! [`ResponseShape`]. For single-shape responses the handler's status passes
//! through; for variant responses the status selects the variant, and a
//! status with no variant is a server-side failure.

use std::collections::HashMap;

use accord_core::api::ResponseShape;
use accord_core::codec::{FieldCodec, FieldGroup};
use accord_core::error::{ApiError, ResponsePart};
use accord_core::schema::{Schema, ValidationError};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use serde_json::Value;

use crate::handler::Output;

#[derive(Debug, Clone)]
struct PartCodecs {
    content: Schema,
    headers: FieldCodec,
}

impl PartCodecs {
    fn new(content: Option<&Schema>, headers: Option<&Schema>) -> Self {
        Self {
            content: content.cloned().unwrap_or(Schema::Unknown),
            headers: FieldCodec::new(FieldGroup::Headers, headers),
        }
    }
}

#[derive(Debug, Clone)]
enum Resolved {
    Single(PartCodecs),
    Variants(HashMap<u16, PartCodecs>),
}

/// Encoder for one endpoint's response side.
///
/// # Example
///
/// ```
/// use accord_core::fixtures;
/// use accord_server::encode::ResponseEncoder;
/// use accord_server::handler::Output;
/// use http::StatusCode;
/// use serde_json::json;
///
/// let endpoint = fixtures::hello_endpoint();
/// let encoder = ResponseEncoder::new(endpoint.response());
///
/// let response = encoder
///     .encode(
///         Output::new(12)
///             .status(StatusCode::CREATED)
///             .header("x-hello-world", "test"),
///     )
///     .unwrap();
///
/// assert_eq!(response.status, StatusCode::CREATED);
/// assert_eq!(response.content, json!(12));
/// assert_eq!(response.header("X-Hello-World"), Some("test"));
/// ```
#[derive(Debug, Clone)]
pub struct ResponseEncoder {
    resolved: Resolved,
}

impl ResponseEncoder {
    /// Resolves the codecs for a response shape.
    #[must_use]
    pub fn new(shape: &ResponseShape) -> Self {
        let resolved = match shape {
            ResponseShape::Single(content) => Resolved::Single(PartCodecs::new(Some(content), None)),
            ResponseShape::Variants(variants) => Resolved::Variants(
                variants
                    .iter()
                    .map(|v| {
                        (
                            v.status,
                            PartCodecs::new(v.content.as_ref(), v.headers.as_ref()),
                        )
                    })
                    .collect(),
            ),
        };
        Self { resolved }
    }

    /// Encodes handler output.
    ///
    /// Fails with [`ApiError::UnmatchedStatus`] when no variant answers the
    /// output's status, and with [`ApiError::InvalidResponse`] when content
    /// or headers do not encode.
    pub fn encode(&self, output: Output) -> Result<ApiResponse, ApiError> {
        let status = output.status_code();
        let codecs = match &self.resolved {
            Resolved::Single(codecs) => codecs,
            Resolved::Variants(variants) => {
                variants
                    .get(&status.as_u16())
                    .ok_or(ApiError::UnmatchedStatus {
                        status: status.as_u16(),
                    })?
            }
        };

        let (content, headers) = output.into_parts();

        let content = codecs
            .content
            .encode(&content)
            .map_err(|d| ApiError::invalid_response(ResponsePart::Content, d))?;

        let headers = codecs
            .headers
            .encode(&Value::Object(headers))
            .map_err(|d| ApiError::invalid_response(ResponsePart::Headers, d))
            .and_then(|encoded| header_map(&encoded))?;

        Ok(ApiResponse {
            status,
            headers,
            content,
        })
    }
}

fn header_map(encoded: &Value) -> Result<HeaderMap, ApiError> {
    let invalid = |path: String, message: &str| {
        ApiError::invalid_response(ResponsePart::Headers, ValidationError::new(path, message))
    };

    let Value::Object(entries) = encoded else {
        return Err(invalid("$".to_string(), "headers must encode to an object"));
    };

    let mut headers = HeaderMap::with_capacity(entries.len());
    for (name, value) in entries {
        let path = format!("$.{}", name);
        let Value::String(value) = value else {
            return Err(invalid(path, "header values must encode to strings"));
        };
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| invalid(path.clone(), "invalid header name"))?;
        let value =
            HeaderValue::from_str(value).map_err(|_| invalid(path, "invalid header value"))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// An encoded response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// Response status.
    pub status: StatusCode,
    /// Encoded headers.
    pub headers: HeaderMap,
    /// Encoded content; `null` means no body.
    pub content: Value,
}

impl ApiResponse {
    /// Returns a header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Converts into an HTTP response with a JSON body.
    ///
    /// Null content produces an empty body. `content-type` is only set when
    /// there is a body and the handler did not set one.
    #[must_use]
    pub fn into_http(self) -> http::Response<Bytes> {
        let body = if self.content.is_null() {
            Bytes::new()
        } else {
            Bytes::from(serde_json::to_vec(&self.content).unwrap_or_default())
        };

        let has_body = !body.is_empty();
        let mut response = http::Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        if has_body && !response.headers().contains_key(CONTENT_TYPE) {
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        response
    }
}
