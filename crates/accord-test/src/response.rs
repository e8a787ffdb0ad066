//! Test response wrapper.

use std::fmt;

use bytes::Bytes;
use http::{header, HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::TestError;

/// A response with helpers for assertions.
#[derive(Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Creates a test response from an HTTP response.
    pub fn from_http(response: http::Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as a u16.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns true if the status is successful (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns a reference to the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Gets a header value as a string. Names are case-insensitive.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    pub fn text(&self) -> Result<String, TestError> {
        Ok(String::from_utf8(self.body.to_vec())?)
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Returns the body as a JSON value; an empty body is `null`.
    pub fn content(&self) -> Result<Value, TestError> {
        if self.body.is_empty() {
            Ok(Value::Null)
        } else {
            self.json()
        }
    }

    /// Asserts that the status code equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {} with body {:?}",
            expected,
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts that a header exists with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        let actual = self
            .header(name)
            .unwrap_or_else(|| panic!("Header '{}' not found", name));
        assert_eq!(
            actual, expected,
            "Header '{}': expected '{}', got '{}'",
            name, expected, actual
        );
        self
    }

    /// Asserts that the error envelope carries `code`.
    ///
    /// # Panics
    ///
    /// Panics if the body is not an error envelope or the code differs.
    pub fn assert_error_code(&self, code: &str) -> &Self {
        let body: Value = self
            .json()
            .unwrap_or_else(|e| panic!("Body should be JSON: {e}"));
        assert_eq!(body["error"]["code"], code, "error envelope: {body}");
        self
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    fn create_response(status: StatusCode, body: &'static str) -> TestResponse {
        let mut response = http::Response::new(Bytes::from_static(body.as_bytes()));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        TestResponse::from_http(response)
    }

    #[test]
    fn test_status() {
        let response = create_response(StatusCode::CREATED, "{}");
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.status_code(), 201);
        assert!(response.is_success());
    }

    #[test]
    fn test_header_is_case_insensitive() {
        let response = create_response(StatusCode::OK, "{}");
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn test_json() {
        #[derive(serde::Deserialize)]
        struct User {
            name: String,
        }

        let response = create_response(StatusCode::OK, r#"{"name":"Alice"}"#);
        let user: User = response.json().unwrap();
        assert_eq!(user.name, "Alice");
        assert_eq!(response.content().unwrap(), json!({ "name": "Alice" }));
    }

    #[test]
    fn test_empty_content_is_null() {
        let response = create_response(StatusCode::NO_CONTENT, "");
        assert_eq!(response.content().unwrap(), Value::Null);
        assert!(response.json::<Value>().is_err());
    }

    #[test]
    fn test_assertions() {
        let response = create_response(
            StatusCode::NOT_FOUND,
            r#"{"error":{"code":"NOT_FOUND","kind":"handler","message":"gone"}}"#,
        );
        response
            .assert_status(StatusCode::NOT_FOUND)
            .assert_header("content-type", "application/json")
            .assert_error_code("NOT_FOUND");
    }

    #[test]
    #[should_panic(expected = "Expected status")]
    fn test_assert_status_panics() {
        create_response(StatusCode::OK, "{}").assert_status(StatusCode::CREATED);
    }
}
