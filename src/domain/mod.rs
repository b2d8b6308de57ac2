pub mod error;
pub mod query;
pub mod response;
pub mod schema;

pub use error::{QueryError, SchemaError};
pub use query::{parse_operation, Operation, OperationKind, SelectionNode};
pub use response::{GraphQLError, PathSegment, Response, ResponseValue};
pub use schema::{ArgumentDef, FieldDef, ObjectTypeDef, SchemaModel, TypeKind, TypeRef};
