//! Endpoint and API descriptors.
//!
//! An [`Endpoint`] declares the method, path template, per-group request
//! schemas and response shape of one operation. An [`Api`] is the ordered,
//! id-unique collection of endpoints a service must implement.
//!
//! # Example
//!
//! ```
//! use accord_core::api::{Api, Endpoint, ResponseVariant};
//! use accord_core::schema::Schema;
//!
//! let api = Api::builder("user-service")
//!     .version("1.0.0")
//!     .endpoint(
//!         Endpoint::get("getUser", "/users/{userId}")
//!             .params(Schema::object([("userId", Schema::string())]))
//!             .response(Schema::object([("name", Schema::string())]))
//!             .build(),
//!     )
//!     .endpoint(
//!         Endpoint::post("createUser", "/users")
//!             .body(Schema::object([("name", Schema::string())]))
//!             .response_variant(ResponseVariant::new(201).content(Schema::string()))
//!             .response_variant(ResponseVariant::new(409))
//!             .build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(api.endpoints().len(), 2);
//! assert!(api.endpoint("getUser").is_some());
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use http::{Method, StatusCode};
use percent_encoding::percent_decode_str;
use serde::Serialize;

use crate::codec::{FieldCodec, FieldGroup};
use crate::error::ConfigError;
use crate::schema::Schema;

/// Request schemas for each field group. `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestSchemas {
    /// Query parameter schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Schema>,
    /// Path parameter schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Schema>,
    /// Body schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Schema>,
    /// Header schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Schema>,
}

impl RequestSchemas {
    /// Returns the declared schema for a group.
    #[must_use]
    pub const fn get(&self, group: FieldGroup) -> Option<&Schema> {
        match group {
            FieldGroup::Query => self.query.as_ref(),
            FieldGroup::Params => self.params.as_ref(),
            FieldGroup::Body => self.body.as_ref(),
            FieldGroup::Headers => self.headers.as_ref(),
        }
    }

    /// Returns the codec for a group, falling back to its default schema.
    #[must_use]
    pub fn codec(&self, group: FieldGroup) -> FieldCodec {
        FieldCodec::new(group, self.get(group))
    }

    fn slot(&mut self, group: FieldGroup) -> &mut Option<Schema> {
        match group {
            FieldGroup::Query => &mut self.query,
            FieldGroup::Params => &mut self.params,
            FieldGroup::Body => &mut self.body,
            FieldGroup::Headers => &mut self.headers,
        }
    }
}

/// One status-coded response shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseVariant {
    /// The HTTP status this variant answers.
    pub status: u16,
    /// Content schema; `None` passes content through.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Schema>,
    /// Header schema; `None` uses the string record default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Schema>,
}

impl ResponseVariant {
    /// Creates a variant for `status` with default schemas.
    #[must_use]
    pub const fn new(status: u16) -> Self {
        Self {
            status,
            content: None,
            headers: None,
        }
    }

    /// Sets the content schema.
    #[must_use]
    pub fn content(mut self, schema: Schema) -> Self {
        self.content = Some(schema);
        self
    }

    /// Sets the header schema.
    #[must_use]
    pub fn headers(mut self, schema: Schema) -> Self {
        self.headers = Some(schema);
        self
    }
}

/// The response side of an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    /// One content schema; the handler chooses the status.
    Single(Schema),
    /// Status-coded variants; the handler status selects one.
    Variants(Vec<ResponseVariant>),
}

impl Default for ResponseShape {
    fn default() -> Self {
        Self::Single(Schema::Unknown)
    }
}

impl ResponseShape {
    /// Returns the declared variant statuses, in declaration order.
    #[must_use]
    pub fn statuses(&self) -> Vec<u16> {
        match self {
            Self::Single(_) => Vec::new(),
            Self::Variants(variants) => variants.iter().map(|v| v.status).collect(),
        }
    }
}

/// A segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Parameter(String),
}

/// An endpoint declared in an [`Api`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Endpoint {
    id: String,
    #[serde(serialize_with = "serialize_method")]
    method: Method,
    path: String,
    #[serde(skip)]
    path_segments: Vec<PathSegment>,
    request: RequestSchemas,
    response: ResponseShape,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
}

impl Endpoint {
    /// Creates a new endpoint builder with method `GET` and path `/`.
    #[must_use]
    pub fn builder(id: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder::new(id)
    }

    /// Starts a `GET` endpoint.
    #[must_use]
    pub fn get(id: impl Into<String>, path: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder::new(id).method(Method::GET).path(path)
    }

    /// Starts a `POST` endpoint.
    #[must_use]
    pub fn post(id: impl Into<String>, path: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder::new(id).method(Method::POST).path(path)
    }

    /// Starts a `PUT` endpoint.
    #[must_use]
    pub fn put(id: impl Into<String>, path: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder::new(id).method(Method::PUT).path(path)
    }

    /// Starts a `PATCH` endpoint.
    #[must_use]
    pub fn patch(id: impl Into<String>, path: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder::new(id).method(Method::PATCH).path(path)
    }

    /// Starts a `DELETE` endpoint.
    #[must_use]
    pub fn delete(id: impl Into<String>, path: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder::new(id).method(Method::DELETE).path(path)
    }

    /// Returns the endpoint id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path template.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the request schemas.
    #[must_use]
    pub const fn request(&self) -> &RequestSchemas {
        &self.request
    }

    /// Returns the response shape.
    #[must_use]
    pub const fn response(&self) -> &ResponseShape {
        &self.response
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the names of the path template's parameters.
    #[must_use]
    pub fn path_params(&self) -> Vec<&str> {
        self.path_segments
            .iter()
            .filter_map(|segment| match segment {
                PathSegment::Parameter(name) => Some(name.as_str()),
                PathSegment::Literal(_) => None,
            })
            .collect()
    }

    /// Matches a concrete request path against this endpoint's template.
    ///
    /// Both `{name}` and `:name` placeholders are supported. Captured
    /// segments are percent-decoded; literal segments compare as sent.
    ///
    /// # Example
    ///
    /// ```
    /// use accord_core::api::Endpoint;
    ///
    /// let endpoint = Endpoint::get("userById", "/api/users/:userId").build();
    /// let params = endpoint.match_path("/api/users/42").unwrap();
    /// assert_eq!(params.get("userId").map(String::as_str), Some("42"));
    /// ```
    #[must_use]
    pub fn match_path(&self, request_path: &str) -> Option<HashMap<String, String>> {
        let request_segments: Vec<&str> = request_path
            .trim_start_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        if request_segments.len() != self.path_segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (pattern, actual) in self.path_segments.iter().zip(request_segments) {
            match pattern {
                PathSegment::Literal(lit) if lit != actual => return None,
                PathSegment::Literal(_) => {}
                PathSegment::Parameter(name) => {
                    let value = percent_decode_str(actual).decode_utf8_lossy();
                    params.insert(name.clone(), value.into_owned());
                }
            }
        }

        Some(params)
    }

    fn parse_path(path: &str) -> Vec<PathSegment> {
        path.trim_start_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|segment| {
                if let Some(name) = segment
                    .strip_prefix('{')
                    .and_then(|rest| rest.strip_suffix('}'))
                {
                    PathSegment::Parameter(name.to_string())
                } else if let Some(name) = segment.strip_prefix(':') {
                    PathSegment::Parameter(name.to_string())
                } else {
                    PathSegment::Literal(segment.to_string())
                }
            })
            .collect()
    }

    fn check(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for status in self.response.statuses() {
            if StatusCode::from_u16(status).is_err() {
                return Err(ConfigError::InvalidStatus {
                    endpoint: self.id.clone(),
                    status,
                });
            }
            if !seen.insert(status) {
                return Err(ConfigError::DuplicateStatus {
                    endpoint: self.id.clone(),
                    status,
                });
            }
        }
        Ok(())
    }
}

/// Builder for [`Endpoint`].
#[derive(Debug)]
pub struct EndpointBuilder {
    id: String,
    method: Method,
    path: String,
    request: RequestSchemas,
    response: Option<ResponseShape>,
    description: Option<String>,
    tags: Vec<String>,
}

impl EndpointBuilder {
    /// Creates a new endpoint builder.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method: Method::GET,
            path: "/".to_string(),
            request: RequestSchemas::default(),
            response: None,
            description: None,
            tags: Vec::new(),
        }
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the path template.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Declares the schema of a field group.
    #[must_use]
    pub fn schema(mut self, group: FieldGroup, schema: Schema) -> Self {
        *self.request.slot(group) = Some(schema);
        self
    }

    /// Declares the query schema.
    #[must_use]
    pub fn query(self, schema: Schema) -> Self {
        self.schema(FieldGroup::Query, schema)
    }

    /// Declares the path parameter schema.
    #[must_use]
    pub fn params(self, schema: Schema) -> Self {
        self.schema(FieldGroup::Params, schema)
    }

    /// Declares the body schema.
    #[must_use]
    pub fn body(self, schema: Schema) -> Self {
        self.schema(FieldGroup::Body, schema)
    }

    /// Declares the header schema.
    #[must_use]
    pub fn headers(self, schema: Schema) -> Self {
        self.schema(FieldGroup::Headers, schema)
    }

    /// Declares a single response content schema.
    ///
    /// Replaces any previously declared response.
    #[must_use]
    pub fn response(mut self, schema: Schema) -> Self {
        self.response = Some(ResponseShape::Single(schema));
        self
    }

    /// Adds a status-coded response variant.
    ///
    /// Discards a previously declared single response.
    #[must_use]
    pub fn response_variant(mut self, variant: ResponseVariant) -> Self {
        match &mut self.response {
            Some(ResponseShape::Variants(variants)) => variants.push(variant),
            _ => self.response = Some(ResponseShape::Variants(vec![variant])),
        }
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Builds the endpoint.
    ///
    /// Variant statuses are checked when the endpoint is added to an [`Api`].
    #[must_use]
    pub fn build(self) -> Endpoint {
        let path_segments = Endpoint::parse_path(&self.path);
        Endpoint {
            id: self.id,
            method: self.method,
            path: self.path,
            path_segments,
            request: self.request,
            response: self.response.unwrap_or_default(),
            description: self.description,
            tags: self.tags,
        }
    }
}

/// An ordered collection of endpoints with unique ids.
#[derive(Debug, Clone)]
pub struct Api {
    name: String,
    version: String,
    endpoints: Vec<Arc<Endpoint>>,
    index: HashMap<String, usize>,
}

impl Api {
    /// Creates a new API builder.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ApiBuilder {
        ApiBuilder::new(name)
    }

    /// Returns the API name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the API version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns all endpoints in declaration order.
    #[must_use]
    pub fn endpoints(&self) -> &[Arc<Endpoint>] {
        &self.endpoints
    }

    /// Looks up an endpoint by id.
    #[must_use]
    pub fn endpoint(&self, id: &str) -> Option<&Arc<Endpoint>> {
        self.index.get(id).map(|&idx| &self.endpoints[idx])
    }

    /// Returns whether an endpoint with `id` exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Returns endpoint ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.endpoints.iter().map(|e| e.id())
    }

    /// Returns the number of endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns whether the API declares no endpoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Finds the first endpoint matching `method` and `path`.
    ///
    /// Matching is linear in declaration order.
    #[must_use]
    pub fn match_request(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(&Arc<Endpoint>, HashMap<String, String>)> {
        self.endpoints
            .iter()
            .filter(|endpoint| endpoint.method() == method)
            .find_map(|endpoint| endpoint.match_path(path).map(|params| (endpoint, params)))
    }
}

/// Builder for [`Api`].
#[derive(Debug)]
pub struct ApiBuilder {
    name: String,
    version: String,
    endpoints: Vec<Endpoint>,
}

impl ApiBuilder {
    /// Creates a new API builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "0.0.0".to_string(),
            endpoints: Vec::new(),
        }
    }

    /// Sets the API version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Adds an endpoint.
    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Adds multiple endpoints.
    #[must_use]
    pub fn endpoints(mut self, endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        self.endpoints.extend(endpoints);
        self
    }

    /// Builds the API.
    ///
    /// Fails on duplicate endpoint ids and on duplicate or invalid variant
    /// statuses.
    pub fn build(self) -> Result<Api, ConfigError> {
        let mut index = HashMap::with_capacity(self.endpoints.len());
        let mut endpoints = Vec::with_capacity(self.endpoints.len());

        for (idx, endpoint) in self.endpoints.into_iter().enumerate() {
            endpoint.check()?;
            if index.insert(endpoint.id.clone(), idx).is_some() {
                return Err(ConfigError::DuplicateEndpoint { id: endpoint.id });
            }
            endpoints.push(Arc::new(endpoint));
        }

        Ok(Api {
            name: self.name,
            version: self.version,
            endpoints,
            index,
        })
    }
}

fn serialize_method<S>(method: &Method, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(method.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_builder() {
        let api = Api::builder("user-service")
            .version("1.0.0")
            .endpoint(Endpoint::get("getUser", "/users/{userId}").build())
            .build()
            .unwrap();

        assert_eq!(api.name(), "user-service");
        assert_eq!(api.version(), "1.0.0");
        assert_eq!(api.len(), 1);
        assert!(api.contains("getUser"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = Api::builder("dup")
            .endpoint(Endpoint::get("a", "/a").build())
            .endpoint(Endpoint::post("a", "/b").build())
            .build()
            .unwrap_err();

        assert_eq!(err, ConfigError::DuplicateEndpoint { id: "a".into() });
    }

    #[test]
    fn test_duplicate_variant_status_rejected() {
        let err = Api::builder("dup")
            .endpoint(
                Endpoint::get("a", "/a")
                    .response_variant(ResponseVariant::new(200))
                    .response_variant(ResponseVariant::new(200))
                    .build(),
            )
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            ConfigError::DuplicateStatus {
                endpoint: "a".into(),
                status: 200
            }
        );
    }

    #[test]
    fn test_invalid_variant_status_rejected() {
        let err = Api::builder("bad")
            .endpoint(
                Endpoint::get("a", "/a")
                    .response_variant(ResponseVariant::new(42))
                    .build(),
            )
            .build()
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidStatus { status: 42, .. }));
    }

    #[test]
    fn test_ids_keep_declaration_order() {
        let api = Api::builder("ordered")
            .endpoints([
                Endpoint::get("c", "/c").build(),
                Endpoint::get("a", "/a").build(),
                Endpoint::get("b", "/b").build(),
            ])
            .build()
            .unwrap();

        assert_eq!(api.ids().collect::<Vec<_>>(), vec!["c", "a", "b"]);
        assert_eq!(api.endpoint("a").unwrap().path(), "/a");
        assert!(api.endpoint("z").is_none());
    }

    #[test]
    fn test_endpoint_builder() {
        let endpoint = Endpoint::post("createUser", "/users")
            .description("Creates a user")
            .tag("users")
            .body(Schema::object([("name", Schema::string())]))
            .build();

        assert_eq!(endpoint.id(), "createUser");
        assert_eq!(endpoint.method(), Method::POST);
        assert_eq!(endpoint.description(), Some("Creates a user"));
        assert_eq!(endpoint.tags(), &["users".to_string()]);
        assert!(endpoint.request().body.is_some());
        assert!(endpoint.request().query.is_none());
        assert_eq!(endpoint.response(), &ResponseShape::Single(Schema::Unknown));
    }

    #[test]
    fn test_response_overrides() {
        let single_after_variants = Endpoint::get("a", "/a")
            .response_variant(ResponseVariant::new(201))
            .response(Schema::number())
            .build();
        assert_eq!(
            single_after_variants.response(),
            &ResponseShape::Single(Schema::number())
        );

        let variants_after_single = Endpoint::get("a", "/a")
            .response(Schema::number())
            .response_variant(ResponseVariant::new(201))
            .response_variant(ResponseVariant::new(404))
            .build();
        assert_eq!(variants_after_single.response().statuses(), vec![201, 404]);
    }

    #[test]
    fn test_request_codec_falls_back_to_default() {
        let endpoint = Endpoint::get("a", "/a").build();
        let codec = endpoint.request().codec(FieldGroup::Headers);
        assert!(!codec.is_declared());
        assert_eq!(codec.schema(), &Schema::string_record());
    }

    #[test]
    fn test_path_matching_simple() {
        let endpoint = Endpoint::get("test", "/users").build();

        assert!(endpoint.match_path("/users").is_some());
        assert!(endpoint.match_path("/users/").is_some());
        assert!(endpoint.match_path("/other").is_none());
    }

    #[test]
    fn test_path_matching_both_placeholder_styles() {
        let braces = Endpoint::get("a", "/users/{userId}/posts/{postId}").build();
        let colons = Endpoint::get("b", "/users/:userId/posts/:postId").build();

        for endpoint in [braces, colons] {
            let params = endpoint.match_path("/users/123/posts/456").unwrap();
            assert_eq!(params.get("userId"), Some(&"123".to_string()));
            assert_eq!(params.get("postId"), Some(&"456".to_string()));
            assert!(endpoint.match_path("/users/123").is_none());
            assert_eq!(endpoint.path_params(), vec!["userId", "postId"]);
        }
    }

    #[test]
    fn test_path_params_are_percent_decoded() {
        let endpoint = Endpoint::get("userById", "/api/users/:userId").build();

        let params = endpoint.match_path("/api/users/a%20b").unwrap();
        assert_eq!(params.get("userId").map(String::as_str), Some("a b"));

        let params = endpoint.match_path("/api/users/caf%C3%A9").unwrap();
        assert_eq!(params.get("userId").map(String::as_str), Some("café"));

        assert!(endpoint.match_path("/api%2Fusers/42").is_none());
    }

    #[test]
    fn test_match_request() {
        let api = Api::builder("test")
            .endpoint(Endpoint::get("getUser", "/users/{userId}").build())
            .endpoint(Endpoint::get("listUsers", "/users").build())
            .endpoint(Endpoint::post("createUser", "/users").build())
            .build()
            .unwrap();

        let (endpoint, params) = api.match_request(&Method::GET, "/users/123").unwrap();
        assert_eq!(endpoint.id(), "getUser");
        assert_eq!(params.get("userId"), Some(&"123".to_string()));

        let (endpoint, params) = api.match_request(&Method::GET, "/users").unwrap();
        assert_eq!(endpoint.id(), "listUsers");
        assert!(params.is_empty());

        let (endpoint, _) = api.match_request(&Method::POST, "/users").unwrap();
        assert_eq!(endpoint.id(), "createUser");

        assert!(api.match_request(&Method::DELETE, "/users").is_none());
    }

    #[test]
    fn test_endpoint_serialization() {
        let endpoint = Endpoint::get("hello", "/hello")
            .response_variant(ResponseVariant::new(201).content(Schema::number()))
            .build();

        let json = serde_json::to_value(&endpoint).unwrap();
        assert_eq!(json["id"], "hello");
        assert_eq!(json["method"], "GET");
        assert_eq!(json["response"]["variants"][0]["status"], 201);
        assert_eq!(json["response"]["variants"][0]["content"]["type"], json!("number"));
        assert!(json.get("path_segments").is_none());
    }
}
