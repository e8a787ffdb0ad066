//! Handler input, output and the erased handler type.
//!
//! A handler is any `Fn(Input) -> impl Future<Output = ApiResult<Output>>`.
//! The registry erases it into a [`HandlerFn`] when it is bound.
//!
//! # Example
//!
//! ```rust
//! use accord_core::ApiResult;
//! use accord_server::handler::{Input, Output};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Params {
//!     #[serde(rename = "userId")]
//!     user_id: String,
//! }
//!
//! async fn user_by_id(input: Input) -> ApiResult<Output> {
//!     let params: Params = input.params_as()?;
//!     Ok(Output::new(serde_json::json!({ "name": params.user_id })))
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use accord_core::api::Endpoint;
use accord_core::codec::FieldGroup;
use accord_core::di::Capabilities;
use accord_core::error::{ApiError, ApiResult};
use accord_core::schema::ValidationError;
use accord_core::RequestId;
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::decode::Decoded;

/// Type alias for a boxed, sendable future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A type-erased handler function.
pub type HandlerFn = Arc<dyn Fn(Input) -> BoxFuture<ApiResult<Output>> + Send + Sync>;

/// Erases an async handler.
pub fn handler_fn<F, Fut>(handler: F) -> HandlerFn
where
    F: Fn(Input) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ApiResult<Output>> + Send + 'static,
{
    Arc::new(move |input: Input| -> BoxFuture<ApiResult<Output>> { Box::pin(handler(input)) })
}

/// The decoded request handed to a handler.
///
/// Only groups the endpoint declares a schema for are available.
#[derive(Clone)]
pub struct Input {
    endpoint: Arc<Endpoint>,
    request_id: RequestId,
    decoded: Decoded,
    capabilities: Capabilities,
}

impl Input {
    pub(crate) const fn new(
        endpoint: Arc<Endpoint>,
        request_id: RequestId,
        decoded: Decoded,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            endpoint,
            request_id,
            decoded,
            capabilities,
        }
    }

    /// Returns the endpoint being served.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns the request id.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the decoded query, if declared.
    #[must_use]
    pub const fn query(&self) -> Option<&Value> {
        self.decoded.query()
    }

    /// Returns the decoded path params, if declared.
    #[must_use]
    pub const fn params(&self) -> Option<&Value> {
        self.decoded.params()
    }

    /// Returns the decoded body, if declared.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.decoded.body()
    }

    /// Returns the decoded headers, if declared.
    #[must_use]
    pub const fn headers(&self) -> Option<&Value> {
        self.decoded.headers()
    }

    /// Deserializes the decoded query.
    pub fn query_as<T: DeserializeOwned>(&self) -> ApiResult<T> {
        self.group_as(FieldGroup::Query)
    }

    /// Deserializes the decoded path params.
    pub fn params_as<T: DeserializeOwned>(&self) -> ApiResult<T> {
        self.group_as(FieldGroup::Params)
    }

    /// Deserializes the decoded body.
    pub fn body_as<T: DeserializeOwned>(&self) -> ApiResult<T> {
        self.group_as(FieldGroup::Body)
    }

    /// Deserializes the decoded headers.
    pub fn headers_as<T: DeserializeOwned>(&self) -> ApiResult<T> {
        self.group_as(FieldGroup::Headers)
    }

    /// Returns a capability provided to this handler.
    ///
    /// A missing capability is an internal error.
    pub fn service<T: Send + Sync + 'static>(&self) -> ApiResult<Arc<T>> {
        self.capabilities
            .require::<T>()
            .map_err(|e| ApiError::internal_with_source("handler dependency unavailable", e))
    }

    fn group_as<T: DeserializeOwned>(&self, group: FieldGroup) -> ApiResult<T> {
        let value = self.decoded.get(group).ok_or_else(|| {
            ApiError::internal(format!(
                "endpoint '{}' declares no {} schema",
                self.endpoint.id(),
                group
            ))
        })?;

        T::deserialize(value)
            .map_err(|e| ApiError::invalid_request(group, ValidationError::new("$", e.to_string())))
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input")
            .field("endpoint", &self.endpoint.id())
            .field("request_id", &self.request_id)
            .field("decoded", &self.decoded)
            .finish_non_exhaustive()
    }
}

/// What a handler returns: status, content and headers.
///
/// The status defaults to `200 OK`.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    status: StatusCode,
    content: Value,
    headers: Map<String, Value>,
}

impl Output {
    /// Creates a `200 OK` output with `content`.
    #[must_use]
    pub fn new(content: impl Into<Value>) -> Self {
        Self {
            status: StatusCode::OK,
            content: content.into(),
            headers: Map::new(),
        }
    }

    /// Creates a `200 OK` output by serializing `value`.
    pub fn json<T: Serialize>(value: &T) -> ApiResult<Self> {
        serde_json::to_value(value)
            .map(Self::new)
            .map_err(|e| ApiError::internal_with_source("failed to serialize handler output", e))
    }

    /// Creates a `204 No Content` output.
    #[must_use]
    pub fn no_content() -> Self {
        Self::new(Value::Null).status(StatusCode::NO_CONTENT)
    }

    /// Sets the status.
    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Sets a header. The value is encoded by the response header schema.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Returns the status.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Returns the content.
    #[must_use]
    pub const fn content(&self) -> &Value {
        &self.content
    }

    /// Returns the headers as set by the handler.
    #[must_use]
    pub const fn headers(&self) -> &Map<String, Value> {
        &self.headers
    }

    pub(crate) fn into_parts(self) -> (Value, Map<String, Value>) {
        (self.content, self.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::error::ErrorKind;
    use accord_core::fixtures;
    use serde::Deserialize;
    use serde_json::json;

    use crate::decode::{RawRequest, RequestDecoder};

    #[derive(Debug, Deserialize, PartialEq)]
    struct UserQuery {
        include_deleted: Option<bool>,
    }

    #[derive(Debug)]
    struct Clock;

    fn user_input(raw: &RawRequest, capabilities: Capabilities) -> Input {
        let endpoint = Arc::new(fixtures::user_by_id_endpoint());
        let decoded = RequestDecoder::new(endpoint.request()).decode(raw).unwrap();
        Input::new(endpoint, RequestId::new(), decoded, capabilities)
    }

    fn user_raw() -> RawRequest {
        RawRequest::new()
            .path_param("userId", "7")
            .header("authorization", "token")
    }

    #[test]
    fn test_typed_access() {
        let input = user_input(&user_raw().query_param("include_deleted", "false"), Capabilities::new());

        let query: UserQuery = input.query_as().unwrap();
        assert_eq!(query.include_deleted, Some(false));
        assert_eq!(input.params(), Some(&json!({ "userId": "7" })));
        assert!(input.body().is_none());
    }

    #[test]
    fn test_typed_access_mismatch_is_client_error() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct NumericParams {
            #[serde(rename = "userId")]
            user_id: u64,
        }

        let input = user_input(&user_raw(), Capabilities::new());
        let err = input.params_as::<NumericParams>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParams);
    }

    #[test]
    fn test_undeclared_group_is_internal_error() {
        let input = user_input(&user_raw(), Capabilities::new());
        let err = input.body_as::<Value>().unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_service_lookup() {
        let mut caps = Capabilities::new();
        caps.insert(Arc::new(Clock));
        let input = user_input(&user_raw(), caps);
        assert!(input.service::<Clock>().is_ok());

        let input = user_input(&user_raw(), Capabilities::new());
        let err = input.service::<Clock>().unwrap_err();
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_output_builder() {
        let output = Output::new(12)
            .status(StatusCode::CREATED)
            .header("x-hello-world", "test");

        assert_eq!(output.status_code(), StatusCode::CREATED);
        assert_eq!(output.content(), &json!(12));
        assert_eq!(output.headers()["x-hello-world"], "test");
    }

    #[test]
    fn test_output_defaults() {
        assert_eq!(Output::new("x").status_code(), StatusCode::OK);

        let empty = Output::no_content();
        assert_eq!(empty.status_code(), StatusCode::NO_CONTENT);
        assert!(empty.content().is_null());
    }

    #[test]
    fn test_output_json() {
        #[derive(Serialize)]
        struct User {
            name: &'static str,
        }

        let output = Output::json(&User { name: "Ada" }).unwrap();
        assert_eq!(output.content(), &json!({ "name": "Ada" }));
    }

    #[tokio::test]
    async fn test_handler_fn_erases() {
        let handler = handler_fn(|input: Input| async move {
            Ok(Output::new(input.endpoint().id().to_string()))
        });

        let input = user_input(&user_raw(), Capabilities::new());
        let output = handler(input).await.unwrap();
        assert_eq!(output.content(), &json!("userById"));
    }
}
