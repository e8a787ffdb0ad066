//! Test request building.

use bytes::Bytes;
use http::header::{self, HeaderName, HeaderValue};
use http::{HeaderMap, Method, Uri};
use serde::Serialize;

use crate::error::TestError;

/// A built test request.
#[derive(Debug, Clone)]
pub struct TestRequest {
    /// HTTP method
    pub method: Method,
    /// Request URI, query string included
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Bytes,
}

impl TestRequest {
    /// Creates a new GET request.
    pub fn get(path: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, path)
    }

    /// Creates a new POST request.
    pub fn post(path: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, path)
    }

    /// Creates a new PUT request.
    pub fn put(path: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PUT, path)
    }

    /// Creates a new PATCH request.
    pub fn patch(path: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PATCH, path)
    }

    /// Creates a new DELETE request.
    pub fn delete(path: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::DELETE, path)
    }

    /// Splits into HTTP request parts and the body.
    pub fn into_parts(self) -> Result<(http::request::Parts, Bytes), TestError> {
        let mut request = http::Request::builder()
            .method(self.method)
            .uri(self.uri)
            .body(())
            .map_err(|e| TestError::RequestBuild(e.to_string()))?;
        *request.headers_mut() = self.headers;

        let (parts, ()) = request.into_parts();
        Ok((parts, self.body))
    }
}

/// Builder for constructing test requests.
///
/// Invalid headers or unserializable bodies are reported by
/// [`build`](Self::build), not when they are set.
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Bytes>,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a new request builder.
    pub fn new(method: Method, path: impl AsRef<str>) -> Self {
        Self {
            method,
            path: path.as_ref().to_string(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            error: None,
        }
    }

    /// Appends a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Sets a header, replacing any previous value.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref());
        let value = HeaderValue::try_from(value.as_ref());
        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(e), _) => self.fail(TestError::InvalidHeader(e.to_string())),
            (_, Err(e)) => self.fail(TestError::InvalidHeader(e.to_string())),
        }
        self
    }

    /// Sets the Authorization header with a Bearer token.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header(
            header::AUTHORIZATION.as_str(),
            format!("Bearer {}", token.as_ref()),
        )
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the request body as JSON and the `Content-Type` header to
    /// `application/json`.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Some(Bytes::from(bytes));
                self.header(header::CONTENT_TYPE.as_str(), "application/json")
            }
            Err(e) => {
                self.fail(TestError::Json(e));
                self
            }
        }
    }

    /// Builds the test request.
    pub fn build(self) -> Result<TestRequest, TestError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let uri = if self.query.is_empty() {
            self.path
        } else {
            let qs = serde_urlencoded::to_string(&self.query)
                .map_err(|e| TestError::RequestBuild(format!("invalid query: {e}")))?;
            format!("{}?{}", self.path, qs)
        };
        let uri: Uri = uri
            .parse()
            .map_err(|e| TestError::RequestBuild(format!("invalid URI: {e}")))?;

        Ok(TestRequest {
            method: self.method,
            uri,
            headers: self.headers,
            body: self.body.unwrap_or_default(),
        })
    }

    fn fail(&mut self, err: TestError) {
        self.error.get_or_insert(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_methods() {
        assert_eq!(TestRequest::get("/a").build().unwrap().method, Method::GET);
        assert_eq!(TestRequest::post("/a").build().unwrap().method, Method::POST);
        assert_eq!(TestRequest::put("/a").build().unwrap().method, Method::PUT);
        assert_eq!(TestRequest::patch("/a").build().unwrap().method, Method::PATCH);
        assert_eq!(TestRequest::delete("/a").build().unwrap().method, Method::DELETE);
    }

    #[test]
    fn test_query_is_encoded() {
        let request = TestRequest::get("/search")
            .query("term", "a b")
            .query("limit", "10")
            .build()
            .unwrap();

        assert_eq!(request.uri.path(), "/search");
        assert_eq!(request.uri.query(), Some("term=a+b&limit=10"));
    }

    #[test]
    fn test_header() {
        let request = TestRequest::get("/users")
            .header("Authorization", "Bearer token")
            .build()
            .unwrap();

        assert_eq!(request.headers.get("authorization").unwrap(), "Bearer token");
    }

    #[test]
    fn test_bearer_token() {
        let request = TestRequest::get("/users")
            .bearer_token("t0k")
            .build()
            .unwrap();
        assert_eq!(request.headers.get("Authorization").unwrap(), "Bearer t0k");
    }

    #[test]
    fn test_invalid_header_reported_at_build() {
        let err = TestRequest::get("/users")
            .header("bad header", "x")
            .build()
            .unwrap_err();
        assert!(matches!(err, TestError::InvalidHeader(_)));
    }

    #[test]
    fn test_json_body() {
        let request = TestRequest::post("/users")
            .json(&json!({"name": "Alice"}))
            .build()
            .unwrap();

        assert_eq!(request.headers.get("Content-Type").unwrap(), "application/json");
        assert_eq!(request.body.as_ref(), b"{\"name\":\"Alice\"}");
    }

    #[test]
    fn test_into_parts() {
        let (parts, body) = TestRequest::post("/users?x=1")
            .header("X-Test", "value")
            .body("raw")
            .build()
            .unwrap()
            .into_parts()
            .unwrap();

        assert_eq!(parts.method, Method::POST);
        assert_eq!(parts.uri.query(), Some("x=1"));
        assert_eq!(parts.headers.get("x-test").unwrap(), "value");
        assert_eq!(body.as_ref(), b"raw");
    }
}
