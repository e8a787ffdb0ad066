//! Field groups and the uniform per-group codec.
//!
//! Every request is split into four field groups. A [`FieldCodec`] wraps the
//! schema declared for a group, or that group's default schema when none is
//! declared, and exposes the same `decode`/`encode` surface for all of them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{KeyMatch, Schema, ValidationError};

/// One of the four request field groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    /// URL query parameters.
    Query,
    /// Path parameters.
    Params,
    /// Request body.
    Body,
    /// Request headers.
    Headers,
}

impl FieldGroup {
    /// The fixed order in which request groups are decoded.
    pub const ORDER: [Self; 4] = [Self::Query, Self::Params, Self::Body, Self::Headers];

    /// Returns the group name as used in error kinds.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Params => "params",
            Self::Body => "body",
            Self::Headers => "headers",
        }
    }

    /// Returns the schema used when the group has none declared.
    ///
    /// Headers fall back to a string-to-string record; everything else
    /// passes through unchanged.
    #[must_use]
    pub fn default_schema(self) -> Schema {
        match self {
            Self::Headers => Schema::string_record(),
            Self::Query | Self::Params | Self::Body => Schema::unknown(),
        }
    }

    const fn key_match(self) -> KeyMatch {
        match self {
            Self::Headers => KeyMatch::IgnoreCase,
            Self::Query | Self::Params | Self::Body => KeyMatch::Exact,
        }
    }
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoder/encoder pair for one field group.
///
/// # Example
///
/// ```
/// use accord_core::codec::{FieldCodec, FieldGroup};
/// use serde_json::json;
///
/// // No schema declared: headers default to a string record.
/// let codec = FieldCodec::new(FieldGroup::Headers, None);
/// assert!(!codec.is_declared());
/// assert_eq!(
///     codec.encode(&json!({ "X-Hello-World": "test" })).unwrap(),
///     json!({ "x-hello-world": "test" })
/// );
/// assert!(codec.decode(&json!({ "x-count": 1 })).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCodec {
    group: FieldGroup,
    schema: Schema,
    declared: bool,
}

impl FieldCodec {
    /// Creates a codec from an optional declared schema.
    #[must_use]
    pub fn new(group: FieldGroup, schema: Option<&Schema>) -> Self {
        match schema {
            Some(schema) => Self {
                group,
                schema: schema.clone(),
                declared: true,
            },
            None => Self {
                group,
                schema: group.default_schema(),
                declared: false,
            },
        }
    }

    /// Returns the field group.
    #[must_use]
    pub const fn group(&self) -> FieldGroup {
        self.group
    }

    /// Returns the effective schema.
    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns whether a schema was declared for this group.
    #[must_use]
    pub const fn is_declared(&self) -> bool {
        self.declared
    }

    /// Decodes a raw group value.
    pub fn decode(&self, raw: &Value) -> Result<Value, ValidationError> {
        self.schema.decode_with(raw, self.group.key_match())
    }

    /// Encodes a semantic group value.
    pub fn encode(&self, value: &Value) -> Result<Value, ValidationError> {
        self.schema.encode_with(value, self.group.key_match())
    }
}
