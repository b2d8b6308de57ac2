//! Error taxonomy for schema loading and query handling

use thiserror::Error;

/// Failures while turning schema text into a [`SchemaModel`](super::schema::SchemaModel).
///
/// Both variants are fatal at startup.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    /// Grammar violation, duplicate definition or dangling type reference
    #[error("Schema syntax error: {}", .0.join("; "))]
    Syntax(Vec<String>),

    /// No root query type could be determined
    #[error("Schema has no root query type")]
    RootMissing,
}

/// Per-query failures raised before any value is generated.
///
/// These are reported to the client and never affect other requests.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Cannot query field \"{field}\" on type \"{type_name}\"")]
    UnknownSelectionField { type_name: String, field: String },

    #[error("Field \"{field}\" of type \"{type_name}\" must have a selection of subfields")]
    MissingSelection { field: String, type_name: String },

    #[error("Field \"{field}\" must not have a selection since type \"{type_name}\" has no subfields")]
    UnexpectedSelection { field: String, type_name: String },

    #[error("Unknown type \"{0}\"")]
    UnknownType(String),

    #[error("Unknown fragment \"{0}\"")]
    UnknownFragment(String),

    #[error("Cannot spread fragment \"{0}\" within itself")]
    FragmentCycle(String),

    #[error("Unknown operation named \"{0}\"")]
    OperationNotFound(String),

    #[error("Must provide operation name if query contains multiple operations")]
    AmbiguousOperation,

    #[error("Document contains no operation")]
    NoOperation,

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Schema is not configured for mutations")]
    NoMutationType,
}

impl QueryError {
    /// Error code reported under `extensions.code`
    pub fn code(&self) -> &'static str {
        match self {
            Self::Syntax(_) => "GRAPHQL_PARSE_FAILED",
            _ => "GRAPHQL_VALIDATION_FAILED",
        }
    }
}
