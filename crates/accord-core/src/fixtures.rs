//! Prebuilt endpoints and APIs for tests.
//!
//! # Example
//!
//! ```
//! use accord_core::fixtures;
//!
//! let api = fixtures::user_api().unwrap();
//! assert!(api.endpoint("userById").is_some());
//! ```

use crate::api::{Api, Endpoint, ResponseVariant};
use crate::error::ConfigError;
use crate::schema::Schema;

/// `GET /hello` answering 201 with a numeric body and an `X-Hello-World` header.
#[must_use]
pub fn hello_endpoint() -> Endpoint {
    Endpoint::get("hello", "/hello")
        .description("Says hello with a number")
        .response_variant(
            ResponseVariant::new(201)
                .headers(Schema::object([("X-Hello-World", Schema::string())]))
                .content(Schema::number()),
        )
        .build()
}

/// `GET /api/users/:userId` with an optional boolean query flag.
///
/// - query: `include_deleted` (`"true"`/`"false"`, optional)
/// - params: `userId`
/// - headers: `authorization`
/// - response: `{ name }`
#[must_use]
pub fn user_by_id_endpoint() -> Endpoint {
    Endpoint::get("userById", "/api/users/:userId")
        .description("Retrieves a user by ID")
        .tag("users")
        .query(Schema::object([(
            "include_deleted",
            Schema::boolean_from_string().optional(),
        )]))
        .params(Schema::object([("userId", Schema::string())]))
        .headers(Schema::object([("authorization", Schema::string())]))
        .response(Schema::object([("name", Schema::string())]))
        .build()
}

/// `POST /users` with 201 (created) and 409 (conflict) variants.
#[must_use]
pub fn create_user_endpoint() -> Endpoint {
    Endpoint::post("createUser", "/users")
        .tag("users")
        .body(Schema::object([
            ("name", Schema::string().min_length(1)),
            ("email", Schema::string()),
        ]))
        .response_variant(
            ResponseVariant::new(201).content(Schema::object([("id", Schema::string())])),
        )
        .response_variant(
            ResponseVariant::new(409).content(Schema::object([("reason", Schema::string())])),
        )
        .build()
}

/// `POST /search/{index}` declaring all four request groups.
#[must_use]
pub fn search_endpoint() -> Endpoint {
    Endpoint::post("search", "/search/{index}")
        .query(Schema::object([(
            "limit",
            Schema::integer_from_string().optional(),
        )]))
        .params(Schema::object([("index", Schema::string().min_length(1))]))
        .body(Schema::object([("term", Schema::string())]))
        .headers(Schema::object([("x-tenant", Schema::string())]))
        .response(Schema::array(Schema::string()))
        .build()
}

/// An API with only [`hello_endpoint`].
pub fn hello_api() -> Result<Api, ConfigError> {
    Api::builder("hello-service")
        .version("1.0.0")
        .endpoint(hello_endpoint())
        .build()
}

/// An API with [`user_by_id_endpoint`] and [`create_user_endpoint`].
pub fn user_api() -> Result<Api, ConfigError> {
    Api::builder("user-service")
        .version("1.0.0")
        .endpoint(user_by_id_endpoint())
        .endpoint(create_user_endpoint())
        .build()
}

/// An API with every fixture endpoint.
pub fn full_api() -> Result<Api, ConfigError> {
    Api::builder("fixture-service")
        .version("1.0.0")
        .endpoints([
            hello_endpoint(),
            user_by_id_endpoint(),
            create_user_endpoint(),
            search_endpoint(),
        ])
        .build()
}
