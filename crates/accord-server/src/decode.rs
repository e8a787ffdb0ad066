//! Request decoding.
//!
//! A [`RawRequest`] carries the four field groups as JSON values, exactly as
//! received. A [`RequestDecoder`] validates them against an endpoint's request
//! schemas in the fixed order query, params, body, headers, and stops at the
//! first group that fails.
//!
//! # Example
//!
//! ```
//! use accord_core::fixtures;
//! use accord_server::decode::{RawRequest, RequestDecoder};
//! use serde_json::json;
//!
//! let endpoint = fixtures::user_by_id_endpoint();
//! let decoder = RequestDecoder::new(endpoint.request());
//!
//! let raw = RawRequest::new()
//!     .query_param("include_deleted", "true")
//!     .path_param("userId", "42")
//!     .header("Authorization", "Bearer t");
//!
//! let decoded = decoder.decode(&raw).unwrap();
//! assert_eq!(decoded.query(), Some(&json!({ "include_deleted": true })));
//! ```

use std::collections::HashMap;

use accord_core::api::RequestSchemas;
use accord_core::codec::{FieldCodec, FieldGroup};
use accord_core::error::{ApiError, ErrorKind};
use accord_core::schema::ValidationError;
use serde_json::{Map, Value};
use thiserror::Error;

/// The undecoded field groups of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRequest {
    /// Query parameters, usually an object of strings.
    pub query: Value,
    /// Path parameters, usually an object of strings.
    pub params: Value,
    /// Parsed body, `null` when empty.
    pub body: Value,
    /// Headers, usually an object of strings.
    pub headers: Value,
    /// Groups that could not be parsed off the wire, raised in decode order.
    malformed: Vec<DecodeFailure>,
}

impl Default for RawRequest {
    fn default() -> Self {
        Self {
            query: Value::Object(Map::new()),
            params: Value::Object(Map::new()),
            body: Value::Null,
            headers: Value::Object(Map::new()),
            malformed: Vec::new(),
        }
    }
}

impl RawRequest {
    /// Creates an empty request: empty query, params and headers, null body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole query group.
    #[must_use]
    pub fn with_query(mut self, query: Value) -> Self {
        self.query = query;
        self
    }

    /// Replaces the whole params group.
    #[must_use]
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Replaces the whole headers group.
    #[must_use]
    pub fn with_headers(mut self, headers: Value) -> Self {
        self.headers = headers;
        self
    }

    /// Sets one query parameter.
    #[must_use]
    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        insert_string(&mut self.query, name.into(), value.into());
        self
    }

    /// Sets one path parameter.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        insert_string(&mut self.params, name.into(), value.into());
        self
    }

    /// Sets one header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        insert_string(&mut self.headers, name.into(), value.into());
        self
    }

    /// Returns the raw value of a group.
    #[must_use]
    pub const fn get(&self, group: FieldGroup) -> &Value {
        match group {
            FieldGroup::Query => &self.query,
            FieldGroup::Params => &self.params,
            FieldGroup::Body => &self.body,
            FieldGroup::Headers => &self.headers,
        }
    }

    /// Returns the parse failure recorded for a group, if any.
    #[must_use]
    pub fn malformed(&self, group: FieldGroup) -> Option<&DecodeFailure> {
        self.malformed.iter().find(|failure| failure.group == group)
    }

    /// Builds a raw request from HTTP parts, already-matched path params and
    /// the body bytes.
    ///
    /// The query string becomes an object of strings (a repeated key keeps
    /// its last value). Repeated headers are joined with `", "`. An empty body
    /// becomes `null`; anything else must be JSON.
    ///
    /// A group that cannot be parsed is left empty and its failure is kept
    /// until [`RequestDecoder::decode`] reaches it, so an earlier invalid
    /// group is still the one reported.
    pub fn from_http(
        parts: &http::request::Parts,
        params: HashMap<String, String>,
        body: &[u8],
    ) -> Self {
        let mut raw = Self::new().with_params(string_object(params));

        if let Some(qs) = parts.uri.query() {
            match serde_urlencoded::from_str::<Vec<(String, String)>>(qs) {
                Ok(pairs) => raw.query = string_object(pairs),
                Err(e) => {
                    raw.reject(FieldGroup::Query, "$", format!("malformed query string: {e}"));
                }
            }
        }

        if !body.is_empty() {
            match serde_json::from_slice(body) {
                Ok(value) => raw.body = value,
                Err(e) => {
                    raw.reject(FieldGroup::Body, "$", format!("malformed JSON body: {e}"));
                }
            }
        }

        let mut headers = Map::new();
        for (name, value) in &parts.headers {
            let Ok(value) = value.to_str() else {
                if raw.malformed(FieldGroup::Headers).is_none() {
                    raw.reject(
                        FieldGroup::Headers,
                        format!("$.{}", name.as_str()),
                        "header value is not visible ASCII",
                    );
                }
                continue;
            };
            match headers.get_mut(name.as_str()) {
                Some(Value::String(existing)) => {
                    existing.push_str(", ");
                    existing.push_str(value);
                }
                _ => {
                    headers.insert(name.as_str().to_string(), Value::String(value.to_string()));
                }
            }
        }
        raw.headers = Value::Object(headers);

        raw
    }

    fn reject(&mut self, group: FieldGroup, path: impl Into<String>, message: impl Into<String>) {
        self.malformed.push(DecodeFailure {
            group,
            diagnostic: ValidationError::new(path, message),
        });
    }
}

fn insert_string(target: &mut Value, name: String, value: String) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        map.insert(name, Value::String(value));
    }
}

fn string_object(pairs: impl IntoIterator<Item = (String, String)>) -> Value {
    Value::Object(
        pairs
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect(),
    )
}

/// The validated field groups of one request.
///
/// Only groups with a declared schema are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoded {
    query: Option<Value>,
    params: Option<Value>,
    body: Option<Value>,
    headers: Option<Value>,
}

impl Decoded {
    /// Returns a decoded group, if declared.
    #[must_use]
    pub const fn get(&self, group: FieldGroup) -> Option<&Value> {
        match group {
            FieldGroup::Query => self.query.as_ref(),
            FieldGroup::Params => self.params.as_ref(),
            FieldGroup::Body => self.body.as_ref(),
            FieldGroup::Headers => self.headers.as_ref(),
        }
    }

    /// Returns the decoded query.
    #[must_use]
    pub const fn query(&self) -> Option<&Value> {
        self.query.as_ref()
    }

    /// Returns the decoded path params.
    #[must_use]
    pub const fn params(&self) -> Option<&Value> {
        self.params.as_ref()
    }

    /// Returns the decoded body.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Returns the decoded headers.
    #[must_use]
    pub const fn headers(&self) -> Option<&Value> {
        self.headers.as_ref()
    }

    fn set(&mut self, group: FieldGroup, value: Value) {
        let slot = match group {
            FieldGroup::Query => &mut self.query,
            FieldGroup::Params => &mut self.params,
            FieldGroup::Body => &mut self.body,
            FieldGroup::Headers => &mut self.headers,
        };
        *slot = Some(value);
    }
}

/// The first field group that failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {group}: {diagnostic}")]
pub struct DecodeFailure {
    /// The failing group.
    pub group: FieldGroup,
    /// What went wrong.
    pub diagnostic: ValidationError,
}

impl DecodeFailure {
    /// Returns the failure kind (`invalid-query`, ...).
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::for_group(self.group)
    }

    /// Wraps into the client-facing error.
    #[must_use]
    pub fn into_api_error(self) -> ApiError {
        ApiError::invalid_request(self.group, self.diagnostic)
    }
}

impl From<DecodeFailure> for ApiError {
    fn from(failure: DecodeFailure) -> Self {
        failure.into_api_error()
    }
}

/// Decoder for one endpoint's request side.
#[derive(Debug, Clone)]
pub struct RequestDecoder {
    codecs: [FieldCodec; 4],
}

impl RequestDecoder {
    /// Resolves the codecs for every group once.
    #[must_use]
    pub fn new(schemas: &RequestSchemas) -> Self {
        Self {
            codecs: FieldGroup::ORDER.map(|group| schemas.codec(group)),
        }
    }

    /// Decodes a raw request.
    ///
    /// Groups are decoded in [`FieldGroup::ORDER`]. A group that failed to
    /// parse off the wire fails at its turn. Undeclared groups are still
    /// validated against their default schema but left out of the result.
    pub fn decode(&self, raw: &RawRequest) -> Result<Decoded, DecodeFailure> {
        let mut decoded = Decoded::default();
        for codec in &self.codecs {
            let group = codec.group();
            if let Some(failure) = raw.malformed(group) {
                return Err(failure.clone());
            }
            let value = codec
                .decode(raw.get(group))
                .map_err(|diagnostic| DecodeFailure { group, diagnostic })?;
            if codec.is_declared() {
                decoded.set(group, value);
            }
        }
        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::fixtures;
    use accord_core::schema::Schema;
    use proptest::prelude::*;
    use serde_json::json;

    fn search_decoder() -> RequestDecoder {
        RequestDecoder::new(fixtures::search_endpoint().request())
    }

    fn valid_search() -> RawRequest {
        RawRequest::new()
            .query_param("limit", "10")
            .path_param("index", "books")
            .with_body(json!({ "term": "rust" }))
            .header("X-Tenant", "acme")
    }

    #[test]
    fn test_decode_all_groups() {
        let decoded = search_decoder().decode(&valid_search()).unwrap();

        assert_eq!(decoded.query(), Some(&json!({ "limit": 10 })));
        assert_eq!(decoded.params(), Some(&json!({ "index": "books" })));
        assert_eq!(decoded.body(), Some(&json!({ "term": "rust" })));
        assert_eq!(decoded.headers(), Some(&json!({ "x-tenant": "acme" })));
    }

    #[test]
    fn test_undeclared_groups_are_absent() {
        let decoder = RequestDecoder::new(fixtures::hello_endpoint().request());
        let raw = RawRequest::new()
            .query_param("anything", "goes")
            .header("host", "localhost");

        let decoded = decoder.decode(&raw).unwrap();
        assert_eq!(decoded, Decoded::default());
    }

    #[test]
    fn test_default_header_schema_still_validates() {
        let decoder = RequestDecoder::new(fixtures::hello_endpoint().request());
        let raw = RawRequest::new().with_headers(json!({ "x-count": 3 }));

        let failure = decoder.decode(&raw).unwrap_err();
        assert_eq!(failure.group, FieldGroup::Headers);
        assert_eq!(failure.diagnostic.path, "$.x-count");
    }

    #[test]
    fn test_first_failing_group_wins() {
        // Params and headers are both invalid; params come first.
        let raw = valid_search()
            .path_param("index", "")
            .with_headers(json!({}));

        let failure = search_decoder().decode(&raw).unwrap_err();
        assert_eq!(failure.group, FieldGroup::Params);
        assert_eq!(failure.kind(), ErrorKind::InvalidParams);
    }

    #[test]
    fn test_query_failure_reported_before_body() {
        let raw = valid_search()
            .query_param("limit", "ten")
            .with_body(json!("not an object"));

        let failure = search_decoder().decode(&raw).unwrap_err();
        assert_eq!(failure.group, FieldGroup::Query);
        assert_eq!(failure.diagnostic.path, "$.limit");
    }

    #[test]
    fn test_into_api_error() {
        let failure = DecodeFailure {
            group: FieldGroup::Body,
            diagnostic: ValidationError::new("$", "expected object, got string"),
        };
        let err: ApiError = failure.into();
        assert_eq!(err.group(), Some(FieldGroup::Body));
        assert_eq!(err.code(), "INVALID_BODY");
    }

    #[test]
    fn test_from_http() {
        let request = http::Request::builder()
            .method("POST")
            .uri("/search/books?limit=5&limit=7&q=a%20b")
            .header("X-Tenant", "acme")
            .header("Accept", "text/plain")
            .header("Accept", "application/json")
            .body(())
            .unwrap();
        let (parts, ()) = request.into_parts();

        let params = HashMap::from([("index".to_string(), "books".to_string())]);
        let raw = RawRequest::from_http(&parts, params, br#"{"term":"x"}"#);

        assert_eq!(raw.query, json!({ "limit": "7", "q": "a b" }));
        assert_eq!(raw.params, json!({ "index": "books" }));
        assert_eq!(raw.body, json!({ "term": "x" }));
        assert_eq!(raw.headers["x-tenant"], "acme");
        assert_eq!(raw.headers["accept"], "text/plain, application/json");
    }

    #[test]
    fn test_from_http_defers_malformed_body() {
        let (parts, ()) = http::Request::builder()
            .uri("/search/books?limit=5")
            .header("X-Tenant", "acme")
            .body(())
            .unwrap()
            .into_parts();
        let params = HashMap::from([("index".to_string(), "books".to_string())]);

        let raw = RawRequest::from_http(&parts, params, b"{oops");
        assert_eq!(raw.body, Value::Null);

        let failure = search_decoder().decode(&raw).unwrap_err();
        assert_eq!(failure.group, FieldGroup::Body);
        assert!(failure.diagnostic.message.starts_with("malformed JSON body"));

        let raw = RawRequest::from_http(&parts, HashMap::new(), b"");
        assert_eq!(raw.body, Value::Null);
        assert!(raw.malformed(FieldGroup::Body).is_none());
    }

    #[test]
    fn test_invalid_query_beats_malformed_body() {
        let (parts, ()) = http::Request::builder()
            .method("POST")
            .uri("/search/books?limit=ten")
            .header("X-Tenant", "acme")
            .body(())
            .unwrap()
            .into_parts();
        let params = HashMap::from([("index".to_string(), "books".to_string())]);

        let raw = RawRequest::from_http(&parts, params, b"{oops");
        let failure = search_decoder().decode(&raw).unwrap_err();

        assert_eq!(failure.group, FieldGroup::Query);
        assert_eq!(failure.kind(), ErrorKind::InvalidQuery);
        assert_eq!(failure.diagnostic.path, "$.limit");
    }

    #[test]
    fn test_invalid_params_beat_non_ascii_header() {
        let (parts, ()) = http::Request::builder()
            .method("POST")
            .uri("/search/x")
            .header("X-Tenant", http::HeaderValue::from_bytes(b"caf\xe9").unwrap())
            .body(())
            .unwrap()
            .into_parts();
        let params = HashMap::from([("index".to_string(), String::new())]);

        let raw = RawRequest::from_http(&parts, params.clone(), br#"{"term":"x"}"#);
        let failure = search_decoder().decode(&raw).unwrap_err();
        assert_eq!(failure.group, FieldGroup::Params);

        let params = HashMap::from([("index".to_string(), "books".to_string())]);
        let raw = RawRequest::from_http(&parts, params, br#"{"term":"x"}"#);
        let failure = search_decoder().decode(&raw).unwrap_err();
        assert_eq!(failure.group, FieldGroup::Headers);
        assert_eq!(failure.diagnostic.path, "$.x-tenant");
    }

    fn group_strategy() -> impl Strategy<Value = Vec<FieldGroup>> {
        proptest::sample::subsequence(FieldGroup::ORDER.to_vec(), 0..=4)
    }

    proptest! {
        #[test]
        fn prop_earliest_invalid_group_is_reported(broken in group_strategy()) {
            let schemas = RequestSchemas {
                query: Some(Schema::object([("q", Schema::string())])),
                params: Some(Schema::object([("p", Schema::string())])),
                body: Some(Schema::object([("b", Schema::string())])),
                headers: Some(Schema::object([("h", Schema::string())])),
            };
            let decoder = RequestDecoder::new(&schemas);

            let mut raw = RawRequest::new()
                .query_param("q", "1")
                .path_param("p", "1")
                .with_body(json!({ "b": "1" }))
                .header("h", "1");
            for group in &broken {
                match group {
                    FieldGroup::Query => raw.query = json!({}),
                    FieldGroup::Params => raw.params = json!({}),
                    FieldGroup::Body => raw.body = json!({}),
                    FieldGroup::Headers => raw.headers = json!({}),
                }
            }

            match (decoder.decode(&raw), broken.first()) {
                (Ok(_), None) => {}
                (Err(failure), Some(first)) => prop_assert_eq!(failure.group, *first),
                (result, expected) => prop_assert!(false, "got {:?}, expected failure in {:?}", result, expected),
            }
        }
    }
}
