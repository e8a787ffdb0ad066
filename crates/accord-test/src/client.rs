//! In-memory test client.

use accord_server::{RawRequest, Service};
use bytes::Bytes;
use http::Method;
use serde::Serialize;

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;

/// Sends requests to an assembled [`Service`] without a network.
///
/// Each request is routed by method and path with
/// [`Api::match_request`](accord_core::Api::match_request), converted with
/// [`RawRequest::from_http`] and served by [`Service::respond`], so errors are
/// rendered by the service's formatter exactly as they would be in
/// production.
///
/// # Example
///
/// ```
/// use accord_core::fixtures;
/// use accord_server::{Output, Registry};
/// use accord_test::TestClient;
/// use http::StatusCode;
///
/// # tokio_test::block_on(async {
/// let service = Registry::new(fixtures::hello_api().unwrap())
///     .bind("hello", |_input| async {
///         Ok(Output::new(12)
///             .status(StatusCode::CREATED)
///             .header("x-hello-world", "test"))
///     })
///     .unwrap()
///     .assemble()
///     .unwrap();
///
/// let client = TestClient::new(service);
/// let response = client.get("/hello").send().await.unwrap();
///
/// assert_eq!(response.status(), StatusCode::CREATED);
/// assert_eq!(response.header("X-Hello-World"), Some("test"));
/// # });
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    service: Service,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a test client for a service.
    pub fn new(service: Service) -> Self {
        Self {
            service,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Returns the service under test.
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Creates a GET request builder.
    pub fn get(&self, path: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::get(path))
    }

    /// Creates a POST request builder.
    pub fn post(&self, path: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::post(path))
    }

    /// Creates a PUT request builder.
    pub fn put(&self, path: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::put(path))
    }

    /// Creates a PATCH request builder.
    pub fn patch(&self, path: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::patch(path))
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, path: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::delete(path))
    }

    /// Creates a request builder with a custom method.
    pub fn request(&self, method: Method, path: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequestBuilder::new(method, path))
    }

    /// Routes and serves a built request.
    ///
    /// A request no endpoint matches is [`TestError::NoRoute`]. A request
    /// whose query string or body cannot be parsed is answered like any other
    /// client validation failure, in the usual group order.
    pub async fn send_request(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let (parts, body) = request.into_parts()?;

        let Some((endpoint, params)) = self
            .service
            .api()
            .match_request(&parts.method, parts.uri.path())
        else {
            return Err(TestError::NoRoute {
                method: parts.method,
                path: parts.uri.path().to_string(),
            });
        };
        let id = endpoint.id().to_string();

        let raw = RawRequest::from_http(&parts, params, &body);
        let response = self.service.respond(&id, raw).await;
        Ok(TestResponse::from_http(response))
    }
}

/// A request builder bound to a test client.
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl<'a> TestClientRequest<'a> {
    fn new(client: &'a TestClient, builder: TestRequestBuilder) -> Self {
        let builder = client
            .default_headers
            .iter()
            .fold(builder, |b, (name, value)| b.header(name, value));
        Self { client, builder }
    }

    /// Appends a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.query(name, value);
        self
    }

    /// Sets a header on the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the Authorization header with a Bearer token.
    pub fn bearer_token(mut self, token: impl AsRef<str>) -> Self {
        self.builder = self.builder.bearer_token(token);
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets the request body as JSON.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Builds and sends the request.
    pub async fn send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.send_request(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::fixtures;
    use accord_server::{Input, Output, Registry};
    use accord_telemetry::Logger;
    use http::StatusCode;
    use serde_json::json;

    fn user_client() -> TestClient {
        let service = Registry::new(fixtures::user_api().unwrap())
            .bind("userById", |input: Input| async move {
                let user_id = input.params().and_then(|p| p["userId"].as_str()).unwrap_or("?");
                Ok(Output::new(json!({ "name": format!("user-{user_id}") })))
            })
            .unwrap()
            .bind("createUser", |_input| async {
                Ok(Output::new(json!({ "id": "u1" })).status(StatusCode::CREATED))
            })
            .unwrap()
            .logger(Logger::Silent)
            .assemble()
            .unwrap();
        TestClient::new(service)
    }

    #[tokio::test]
    async fn test_routes_by_path() {
        let response = user_client()
            .get("/api/users/42")
            .header("Authorization", "t")
            .send()
            .await
            .unwrap();

        response.assert_status(StatusCode::OK);
        assert_eq!(response.content().unwrap(), json!({ "name": "user-42" }));
    }

    #[tokio::test]
    async fn test_path_params_arrive_decoded() {
        let response = user_client()
            .get("/api/users/a%20b")
            .header("Authorization", "t")
            .send()
            .await
            .unwrap();

        response.assert_status(StatusCode::OK);
        assert_eq!(response.content().unwrap(), json!({ "name": "user-a b" }));
    }

    #[tokio::test]
    async fn test_no_route() {
        let err = user_client().get("/nowhere").send().await.unwrap_err();
        assert!(matches!(err, TestError::NoRoute { .. }));

        let err = user_client().delete("/users").send().await.unwrap_err();
        assert!(matches!(err, TestError::NoRoute { method, .. } if method == Method::DELETE));
    }

    #[tokio::test]
    async fn test_default_headers() {
        let client = user_client().with_default_header("authorization", "t");
        let response = client.get("/api/users/7").send().await.unwrap();
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_body_is_client_error() {
        let response = user_client()
            .post("/users")
            .body("{not json")
            .send()
            .await
            .unwrap();

        response
            .assert_status(StatusCode::BAD_REQUEST)
            .assert_error_code("INVALID_BODY");
    }

    #[tokio::test]
    async fn test_invalid_query_reported_before_malformed_body() {
        let client = TestClient::new(
            Registry::new(
                accord_core::Api::builder("search-service")
                    .endpoint(fixtures::search_endpoint())
                    .build()
                    .unwrap(),
            )
                .bind("search", |_input| async { Ok(Output::new(json!([]))) })
                .unwrap()
                .logger(Logger::Silent)
                .assemble()
                .unwrap(),
        );

        let response = client
            .post("/search/books?limit=ten")
            .header("X-Tenant", "acme")
            .body("{oops")
            .send()
            .await
            .unwrap();

        response
            .assert_status(StatusCode::BAD_REQUEST)
            .assert_error_code("INVALID_QUERY");
    }

    #[tokio::test]
    async fn test_json_body() {
        let response = user_client()
            .post("/users")
            .json(&json!({ "name": "Ada", "email": "ada@example.com" }))
            .send()
            .await
            .unwrap();

        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<serde_json::Value>().unwrap()["id"], "u1");
    }
}
