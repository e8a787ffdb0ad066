//! Schemas for field-group validation and transformation.
//!
//! A [`Schema`] describes the semantic shape of one field group (query,
//! params, body, headers) or of a response part. Every schema is both a
//! decoder (raw wire value to semantic value) and an encoder (semantic value
//! back to its raw form). Most schemas validate and pass the value through
//! unchanged in both directions; transformation schemas such as
//! [`Schema::boolean_from_string`] convert between representations.
//!
//! # Example
//!
//! ```
//! use accord_core::schema::Schema;
//! use serde_json::json;
//!
//! let query = Schema::object([
//!     ("include_deleted", Schema::boolean_from_string().optional()),
//! ]);
//!
//! assert_eq!(query.decode(&json!({})).unwrap(), json!({}));
//! assert_eq!(
//!     query.decode(&json!({ "include_deleted": "true" })).unwrap(),
//!     json!({ "include_deleted": true })
//! );
//! assert_eq!(
//!     query.encode(&json!({ "include_deleted": false })).unwrap(),
//!     json!({ "include_deleted": "false" })
//! );
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Path of the value being validated, in diagnostics.
const ROOT: &str = "$";

/// A validating codec over JSON values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schema {
    /// Accepts any value unchanged.
    Unknown,
    /// String type.
    String {
        /// Minimum length in characters.
        min_length: Option<usize>,
        /// Maximum length in characters.
        max_length: Option<usize>,
    },
    /// Integer type.
    Integer {
        /// Minimum value.
        minimum: Option<i64>,
        /// Maximum value.
        maximum: Option<i64>,
    },
    /// Number (float or integer) type.
    Number {
        /// Minimum value.
        minimum: Option<f64>,
        /// Maximum value.
        maximum: Option<f64>,
    },
    /// Boolean type.
    Boolean,
    /// Null type.
    Null,
    /// Exactly one JSON value.
    Literal {
        /// The only accepted value.
        value: Value,
    },
    /// Array type.
    Array {
        /// Schema for array items.
        items: Box<Schema>,
        /// Minimum number of items.
        min_items: Option<usize>,
        /// Maximum number of items.
        max_items: Option<usize>,
    },
    /// Object with a fixed set of declared properties.
    ///
    /// Undeclared properties are stripped. Properties wrapped in
    /// [`Schema::Optional`] may be absent and are then omitted from the output.
    Object {
        /// Declared properties in declaration order.
        fields: IndexMap<String, Schema>,
    },
    /// Object with arbitrary string keys and uniformly typed values.
    Record {
        /// Schema applied to every value.
        values: Box<Schema>,
    },
    /// Marks an object property as optional.
    Optional {
        /// Schema of the property when present.
        inner: Box<Schema>,
    },
    /// First matching member wins.
    Union {
        /// Candidate schemas, tried in order.
        members: Vec<Schema>,
    },
    /// Maps raw literals onto semantic literals.
    Literals {
        /// Accepted pairs.
        mappings: Vec<LiteralMapping>,
    },
    /// A numeric string decoded into a JSON number.
    NumberFromString,
    /// An integer string decoded into a JSON integer.
    IntegerFromString,
}

/// One raw/semantic pair of a [`Schema::Literals`] transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralMapping {
    /// The raw (wire) value.
    pub encoded: Value,
    /// The semantic value.
    pub decoded: Value,
}

impl LiteralMapping {
    /// Returns `(from, to)` for the given direction.
    fn sides(&self, direction: Direction) -> (&Value, &Value) {
        match direction {
            Direction::Decode => (&self.encoded, &self.decoded),
            Direction::Encode => (&self.decoded, &self.encoded),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Decode,
    Encode,
}

/// How object keys are looked up and emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyMatch {
    /// Keys must match exactly.
    Exact,
    /// Keys match ignoring ASCII case and are emitted lower-cased.
    IgnoreCase,
}

impl KeyMatch {
    fn find<'a>(self, object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
        match self {
            Self::Exact => object.get(key),
            Self::IgnoreCase => object.get(key).or_else(|| {
                object
                    .iter()
                    .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
                    .map(|(_, value)| value)
            }),
        }
    }

    fn output_key(self, key: &str) -> String {
        match self {
            Self::Exact => key.to_string(),
            Self::IgnoreCase => key.to_ascii_lowercase(),
        }
    }
}

impl Schema {
    /// Creates a schema accepting any value.
    #[must_use]
    pub fn unknown() -> Self {
        Self::Unknown
    }

    /// Creates a string schema.
    #[must_use]
    pub fn string() -> Self {
        Self::String {
            min_length: None,
            max_length: None,
        }
    }

    /// Creates an integer schema.
    #[must_use]
    pub fn integer() -> Self {
        Self::Integer {
            minimum: None,
            maximum: None,
        }
    }

    /// Creates a number schema.
    #[must_use]
    pub fn number() -> Self {
        Self::Number {
            minimum: None,
            maximum: None,
        }
    }

    /// Creates a boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::Boolean
    }

    /// Creates a null schema.
    #[must_use]
    pub fn null() -> Self {
        Self::Null
    }

    /// Creates a schema accepting exactly `value`.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    /// Creates an array schema.
    #[must_use]
    pub fn array(items: Schema) -> Self {
        Self::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
    }

    /// Creates an object schema from `(name, schema)` pairs.
    ///
    /// Wrap a property schema with [`Schema::optional`] to allow it to be absent.
    #[must_use]
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Schema)>) -> Self {
        Self::Object {
            fields: fields
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
        }
    }

    /// Creates a record schema with string keys.
    #[must_use]
    pub fn record(values: Schema) -> Self {
        Self::Record {
            values: Box::new(values),
        }
    }

    /// Creates a string-to-string record, the default header schema.
    #[must_use]
    pub fn string_record() -> Self {
        Self::record(Self::string())
    }

    /// Creates a union of schemas.
    #[must_use]
    pub fn union(members: impl IntoIterator<Item = Schema>) -> Self {
        Self::Union {
            members: members.into_iter().collect(),
        }
    }

    /// Creates a literal transformation from `(encoded, decoded)` pairs.
    #[must_use]
    pub fn literals<E, D>(pairs: impl IntoIterator<Item = (E, D)>) -> Self
    where
        E: Into<Value>,
        D: Into<Value>,
    {
        Self::Literals {
            mappings: pairs
                .into_iter()
                .map(|(encoded, decoded)| LiteralMapping {
                    encoded: encoded.into(),
                    decoded: decoded.into(),
                })
                .collect(),
        }
    }

    /// Decodes the strings `"true"`/`"false"` into booleans.
    #[must_use]
    pub fn boolean_from_string() -> Self {
        Self::literals([("true", true), ("false", false)])
    }

    /// Decodes numeric strings into numbers.
    #[must_use]
    pub fn number_from_string() -> Self {
        Self::NumberFromString
    }

    /// Decodes integer strings into integers.
    #[must_use]
    pub fn integer_from_string() -> Self {
        Self::IntegerFromString
    }

    /// Marks this schema as an optional object property.
    #[must_use]
    pub fn optional(self) -> Self {
        match self {
            optional @ Self::Optional { .. } => optional,
            other => Self::Optional {
                inner: Box::new(other),
            },
        }
    }

    /// Returns whether this schema is an optional property marker.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional { .. })
    }

    /// Sets the minimum length for string schemas.
    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        if let Self::String { min_length, .. } = &mut self {
            *min_length = Some(len);
        }
        self
    }

    /// Sets the maximum length for string schemas.
    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        if let Self::String { max_length, .. } = &mut self {
            *max_length = Some(len);
        }
        self
    }

    /// Sets the minimum value for integer schemas.
    #[must_use]
    pub fn minimum_int(mut self, min: i64) -> Self {
        if let Self::Integer { minimum, .. } = &mut self {
            *minimum = Some(min);
        }
        self
    }

    /// Sets the maximum value for integer schemas.
    #[must_use]
    pub fn maximum_int(mut self, max: i64) -> Self {
        if let Self::Integer { maximum, .. } = &mut self {
            *maximum = Some(max);
        }
        self
    }

    /// Sets the minimum value for number schemas.
    #[must_use]
    pub fn minimum_number(mut self, min: f64) -> Self {
        if let Self::Number { minimum, .. } = &mut self {
            *minimum = Some(min);
        }
        self
    }

    /// Sets the maximum value for number schemas.
    #[must_use]
    pub fn maximum_number(mut self, max: f64) -> Self {
        if let Self::Number { maximum, .. } = &mut self {
            *maximum = Some(max);
        }
        self
    }

    /// Sets the minimum items for array schemas.
    #[must_use]
    pub fn min_items(mut self, min: usize) -> Self {
        if let Self::Array { min_items, .. } = &mut self {
            *min_items = Some(min);
        }
        self
    }

    /// Sets the maximum items for array schemas.
    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        if let Self::Array { max_items, .. } = &mut self {
            *max_items = Some(max);
        }
        self
    }

    /// Decodes a raw value into its semantic form.
    ///
    /// # Example
    ///
    /// ```
    /// use accord_core::schema::Schema;
    /// use serde_json::json;
    ///
    /// let schema = Schema::number_from_string();
    /// assert_eq!(schema.decode(&json!("12")).unwrap(), json!(12));
    /// assert!(schema.decode(&json!("twelve")).is_err());
    /// ```
    pub fn decode(&self, raw: &Value) -> Result<Value, ValidationError> {
        self.decode_with(raw, KeyMatch::Exact)
    }

    /// Encodes a semantic value into its raw form.
    pub fn encode(&self, value: &Value) -> Result<Value, ValidationError> {
        self.encode_with(value, KeyMatch::Exact)
    }

    pub(crate) fn decode_with(&self, raw: &Value, keys: KeyMatch) -> Result<Value, ValidationError> {
        self.transcode(raw, ROOT, keys, Direction::Decode)
    }

    pub(crate) fn encode_with(
        &self,
        value: &Value,
        keys: KeyMatch,
    ) -> Result<Value, ValidationError> {
        self.transcode(value, ROOT, keys, Direction::Encode)
    }

    fn transcode(
        &self,
        input: &Value,
        path: &str,
        keys: KeyMatch,
        direction: Direction,
    ) -> Result<Value, ValidationError> {
        match self {
            Self::Unknown => Ok(input.clone()),

            Self::String {
                min_length,
                max_length,
            } => {
                let s = input
                    .as_str()
                    .ok_or_else(|| ValidationError::type_mismatch(path, "string", input))?;
                let len = s.chars().count();

                if let Some(min) = min_length {
                    if len < *min {
                        return Err(ValidationError::new(
                            path,
                            format!("string length {} is less than minimum {}", len, min),
                        ));
                    }
                }

                if let Some(max) = max_length {
                    if len > *max {
                        return Err(ValidationError::new(
                            path,
                            format!("string length {} is greater than maximum {}", len, max),
                        ));
                    }
                }

                Ok(input.clone())
            }

            Self::Integer { minimum, maximum } => {
                let n = input
                    .as_i64()
                    .ok_or_else(|| ValidationError::type_mismatch(path, "integer", input))?;

                if let Some(min) = minimum {
                    if n < *min {
                        return Err(ValidationError::new(
                            path,
                            format!("value {} is less than minimum {}", n, min),
                        ));
                    }
                }

                if let Some(max) = maximum {
                    if n > *max {
                        return Err(ValidationError::new(
                            path,
                            format!("value {} is greater than maximum {}", n, max),
                        ));
                    }
                }

                Ok(input.clone())
            }

            Self::Number { minimum, maximum } => {
                let n = input
                    .as_f64()
                    .ok_or_else(|| ValidationError::type_mismatch(path, "number", input))?;

                if let Some(min) = minimum {
                    if n < *min {
                        return Err(ValidationError::new(
                            path,
                            format!("value {} is less than minimum {}", n, min),
                        ));
                    }
                }

                if let Some(max) = maximum {
                    if n > *max {
                        return Err(ValidationError::new(
                            path,
                            format!("value {} is greater than maximum {}", n, max),
                        ));
                    }
                }

                Ok(input.clone())
            }

            Self::Boolean => {
                if !input.is_boolean() {
                    return Err(ValidationError::type_mismatch(path, "boolean", input));
                }
                Ok(input.clone())
            }

            Self::Null => {
                if !input.is_null() {
                    return Err(ValidationError::type_mismatch(path, "null", input));
                }
                Ok(Value::Null)
            }

            Self::Literal { value } => {
                if input != value {
                    return Err(ValidationError::new(
                        path,
                        format!("expected {}, got {}", value, input),
                    ));
                }
                Ok(input.clone())
            }

            Self::Array {
                items,
                min_items,
                max_items,
            } => {
                let arr = input
                    .as_array()
                    .ok_or_else(|| ValidationError::type_mismatch(path, "array", input))?;

                if let Some(min) = min_items {
                    if arr.len() < *min {
                        return Err(ValidationError::new(
                            path,
                            format!("array length {} is less than minimum {}", arr.len(), min),
                        ));
                    }
                }

                if let Some(max) = max_items {
                    if arr.len() > *max {
                        return Err(ValidationError::new(
                            path,
                            format!("array length {} is greater than maximum {}", arr.len(), max),
                        ));
                    }
                }

                arr.iter()
                    .enumerate()
                    .map(|(idx, item)| {
                        let item_path = format!("{}[{}]", path, idx);
                        items.transcode(item, &item_path, keys, direction)
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }

            Self::Object { fields } => {
                let obj = input
                    .as_object()
                    .ok_or_else(|| ValidationError::type_mismatch(path, "object", input))?;

                let mut out = Map::new();
                for (name, field) in fields {
                    let field_path = format!("{}.{}", path, name);
                    let (schema, optional) = match field {
                        Self::Optional { inner } => (inner.as_ref(), true),
                        schema => (schema, false),
                    };

                    match keys.find(obj, name) {
                        Some(value) => {
                            let value = schema.transcode(value, &field_path, keys, direction)?;
                            out.insert(keys.output_key(name), value);
                        }
                        None if optional => {}
                        None => {
                            return Err(ValidationError::new(
                                field_path,
                                format!("missing required property '{}'", name),
                            ));
                        }
                    }
                }

                Ok(Value::Object(out))
            }

            Self::Record { values } => {
                let obj = input
                    .as_object()
                    .ok_or_else(|| ValidationError::type_mismatch(path, "object", input))?;

                let mut out = Map::new();
                for (key, value) in obj {
                    let value_path = format!("{}.{}", path, key);
                    let value = values.transcode(value, &value_path, keys, direction)?;
                    out.insert(keys.output_key(key), value);
                }

                Ok(Value::Object(out))
            }

            Self::Optional { inner } => {
                if input.is_null() {
                    return Ok(Value::Null);
                }
                inner.transcode(input, path, keys, direction)
            }

            Self::Union { members } => {
                let mut failures = Vec::with_capacity(members.len());
                for member in members {
                    match member.transcode(input, path, keys, direction) {
                        Ok(value) => return Ok(value),
                        Err(err) => failures.push(err.message),
                    }
                }
                Err(ValidationError::new(
                    path,
                    format!("value matched no union member ({})", failures.join("; ")),
                ))
            }

            Self::Literals { mappings } => {
                mappings
                    .iter()
                    .map(|mapping| mapping.sides(direction))
                    .find(|(from, _)| *from == input)
                    .map(|(_, to)| to.clone())
                    .ok_or_else(|| {
                        let accepted: Vec<String> = mappings
                            .iter()
                            .map(|mapping| mapping.sides(direction).0.to_string())
                            .collect();
                        ValidationError::new(
                            path,
                            format!("expected one of [{}], got {}", accepted.join(", "), input),
                        )
                    })
            }

            Self::NumberFromString => match direction {
                Direction::Decode => {
                    let s = input
                        .as_str()
                        .ok_or_else(|| ValidationError::type_mismatch(path, "string", input))?;
                    parse_number(s).ok_or_else(|| {
                        ValidationError::new(path, format!("expected a numeric string, got {:?}", s))
                    })
                }
                Direction::Encode => {
                    if !input.is_number() {
                        return Err(ValidationError::type_mismatch(path, "number", input));
                    }
                    Ok(Value::String(input.to_string()))
                }
            },

            Self::IntegerFromString => match direction {
                Direction::Decode => {
                    let s = input
                        .as_str()
                        .ok_or_else(|| ValidationError::type_mismatch(path, "string", input))?;
                    s.parse::<i64>().map(Value::from).map_err(|_| {
                        ValidationError::new(path, format!("expected an integer string, got {:?}", s))
                    })
                }
                Direction::Encode => {
                    let n = input
                        .as_i64()
                        .ok_or_else(|| ValidationError::type_mismatch(path, "integer", input))?;
                    Ok(Value::String(n.to_string()))
                }
            },
        }
    }
}

fn parse_number(s: &str) -> Option<Value> {
    if let Ok(n) = s.parse::<i64>() {
        return Some(Value::from(n));
    }
    if let Ok(n) = s.parse::<u64>() {
        return Some(Value::from(n));
    }
    s.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

/// Returns a human-readable name for a JSON value type.
fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A validation diagnostic produced by a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("validation error at '{path}': {message}")]
pub struct ValidationError {
    /// The JSON path where the error occurred.
    pub path: String,
    /// The error message.
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error at `path`.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    fn type_mismatch(path: &str, expected: &str, actual: &Value) -> Self {
        Self::new(
            path,
            format!("expected {}, got {}", expected, value_type_name(actual)),
        )
    }
}
