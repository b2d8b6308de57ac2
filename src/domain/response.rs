use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::error::QueryError;

/// Generated response tree. Object keys keep the requested order.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseValue {
    Null,
    Scalar(Value),
    List(Vec<ResponseValue>),
    Object(IndexMap<String, ResponseValue>),
}

impl ResponseValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ResponseValue::Null)
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, ResponseValue>> {
        match self {
            ResponseValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ResponseValue]> {
        match self {
            ResponseValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            ResponseValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Looks up a key on an object value
    pub fn get(&self, key: &str) -> Option<&ResponseValue> {
        self.as_object().and_then(|map| map.get(key))
    }
}

impl From<Value> for ResponseValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ResponseValue::Null,
            Value::Array(items) => ResponseValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                ResponseValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            scalar => ResponseValue::Scalar(scalar),
        }
    }
}

impl Serialize for ResponseValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResponseValue::Null => serializer.serialize_unit(),
            ResponseValue::Scalar(value) => value.serialize(serializer),
            ResponseValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ResponseValue::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorExtensions {
    pub code: String,
}

/// Client-facing error entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
    pub extensions: ErrorExtensions,
}

impl GraphQLError {
    pub const NON_NULL_VIOLATION: &'static str = "NON_NULL_VIOLATION";
    pub const INVALID_LEAF_VALUE: &'static str = "INVALID_LEAF_VALUE";

    pub fn non_null_violation(parent_type: &str, field: &str, path: Vec<PathSegment>) -> Self {
        Self {
            message: format!("Cannot return null for non-nullable field {parent_type}.{field}."),
            path,
            extensions: ErrorExtensions {
                code: Self::NON_NULL_VIOLATION.to_string(),
            },
        }
    }

    /// A mock rule or override produced an object or list for a scalar field
    pub fn invalid_leaf_value(parent_type: &str, field: &str, path: Vec<PathSegment>) -> Self {
        Self {
            message: format!("Expected a scalar value for field {parent_type}.{field}."),
            path,
            extensions: ErrorExtensions {
                code: Self::INVALID_LEAF_VALUE.to_string(),
            },
        }
    }
}

impl From<&QueryError> for GraphQLError {
    fn from(err: &QueryError) -> Self {
        Self {
            message: err.to_string(),
            path: Vec::new(),
            extensions: ErrorExtensions {
                code: err.code().to_string(),
            },
        }
    }
}

/// GraphQL response envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
}

impl Response {
    pub fn from_query_error(err: &QueryError) -> Self {
        Self {
            data: None,
            errors: vec![err.into()],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}
