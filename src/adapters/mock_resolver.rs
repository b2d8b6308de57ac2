//! Mock resolution: walks a selection tree against the schema and fills it
//! with values produced by the registry's rules.
//!
//! Recursion depth is bounded by the selection, never by the schema, so
//! cyclic type graphs terminate.

use crate::adapters::mock_registry::{MockRegistry, MockRng, Rule, ScalarKind};
use crate::domain::{
    parse_operation, GraphQLError, ObjectTypeDef, Operation, OperationKind, PathSegment,
    QueryError, Response, ResponseValue, SchemaModel, SelectionNode, TypeRef,
};
use indexmap::IndexMap;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};
use std::borrow::Cow;

const TYPENAME: &str = "__typename";

/// Startup context shared by every request: schema, rules and seeding policy.
pub struct MockEngine {
    schema: SchemaModel,
    registry: MockRegistry,
    seed: Option<u64>,
}

impl MockEngine {
    pub fn new(schema: SchemaModel, registry: MockRegistry) -> Self {
        Self {
            schema,
            registry,
            seed: None,
        }
    }

    /// With a seed every request draws the same random sequence.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn schema(&self) -> &SchemaModel {
        &self.schema
    }

    pub fn registry(&self) -> &MockRegistry {
        &self.registry
    }

    pub fn rng(&self) -> MockRng {
        match self.seed {
            Some(seed) => MockRng::seed_from_u64(seed),
            None => MockRng::from_entropy(),
        }
    }

    /// Parses the document and validates the chosen operation against the schema.
    pub fn prepare(&self, query: &str, operation_name: Option<&str>) -> Result<Operation, QueryError> {
        let operation = parse_operation(query, operation_name)?;
        let root = self.root_type(operation.kind)?;
        validate_selection(&self.schema, &root, &operation.selection)?;
        Ok(operation)
    }

    /// Generates the response for an already prepared operation.
    pub fn run(&self, operation: &Operation, rng: &mut MockRng) -> Response {
        let root = match self.root_type(operation.kind) {
            Ok(root) => root,
            Err(err) => return Response::from_query_error(&err),
        };
        let response = Resolver::new(&self.schema, &self.registry, rng).root(&root, &operation.selection);
        tracing::debug!(
            operation = operation.kind.as_str(),
            errors = response.errors.len(),
            "resolved mock operation"
        );
        response
    }

    pub fn execute(&self, query: &str, operation_name: Option<&str>) -> Result<Response, QueryError> {
        let operation = self.prepare(query, operation_name)?;
        Ok(self.run(&operation, &mut self.rng()))
    }

    fn root_type(&self, kind: OperationKind) -> Result<TypeRef, QueryError> {
        match kind {
            OperationKind::Query => Ok(TypeRef::Object(self.schema.query_type().to_string())),
            OperationKind::Mutation => self
                .schema
                .mutation_type()
                .map(|name| TypeRef::Object(name.to_string()))
                .ok_or(QueryError::NoMutationType),
        }
    }
}

/// Resolves `selection` rooted at `root`.
///
/// Fails only for selections that do not fit the schema. Non-null violations
/// are reported inside the returned response next to the partial data.
pub fn resolve(
    schema: &SchemaModel,
    registry: &MockRegistry,
    root: &TypeRef,
    selection: &[SelectionNode],
    rng: &mut MockRng,
) -> Result<Response, QueryError> {
    validate_selection(schema, root, selection)?;
    Ok(Resolver::new(schema, registry, rng).root(root, selection))
}

/// Checks every selected field exists and that leaves and composites are
/// selected the right way.
pub fn validate_selection(
    schema: &SchemaModel,
    parent: &TypeRef,
    selection: &[SelectionNode],
) -> Result<(), QueryError> {
    if parent.is_leaf() {
        return if selection.is_empty() {
            Ok(())
        } else {
            Err(QueryError::UnexpectedSelection {
                field: selection[0].field_name.clone(),
                type_name: parent.named().to_string(),
            })
        };
    }

    for node in selection {
        let scope = node
            .type_conditions
            .last()
            .map(String::as_str)
            .unwrap_or(parent.named());
        let def = schema
            .object_type(scope)
            .ok_or_else(|| QueryError::UnknownType(scope.to_string()))?;

        if node.field_name == TYPENAME {
            if !node.selection.is_empty() {
                return Err(QueryError::UnexpectedSelection {
                    field: TYPENAME.to_string(),
                    type_name: "String".to_string(),
                });
            }
            continue;
        }

        let field = def
            .field(&node.field_name)
            .ok_or_else(|| QueryError::UnknownSelectionField {
                type_name: def.name.clone(),
                field: node.field_name.clone(),
            })?;

        if field.ty.is_leaf() {
            if !node.selection.is_empty() {
                return Err(QueryError::UnexpectedSelection {
                    field: node.field_name.clone(),
                    type_name: field.ty.to_string(),
                });
            }
        } else if node.selection.is_empty() {
            return Err(QueryError::MissingSelection {
                field: node.field_name.clone(),
                type_name: field.ty.to_string(),
            });
        } else {
            validate_selection(schema, &field.ty, &node.selection)?;
        }
    }
    Ok(())
}

/// A null reached a non-null position and must null the nearest nullable parent.
struct Propagate;

/// Field being completed, for error messages
#[derive(Clone, Copy)]
struct Site<'s> {
    parent_type: &'s str,
    field: &'s str,
}

struct Resolver<'a> {
    schema: &'a SchemaModel,
    registry: &'a MockRegistry,
    rng: &'a mut MockRng,
    errors: Vec<GraphQLError>,
    path: Vec<PathSegment>,
}

impl<'a> Resolver<'a> {
    fn new(schema: &'a SchemaModel, registry: &'a MockRegistry, rng: &'a mut MockRng) -> Self {
        Self {
            schema,
            registry,
            rng,
            errors: Vec::new(),
            path: Vec::new(),
        }
    }

    fn root(mut self, root: &TypeRef, selection: &[SelectionNode]) -> Response {
        let site = Site {
            parent_type: root.named(),
            field: root.named(),
        };
        let data = self
            .complete(root, selection, None, site)
            .unwrap_or(ResponseValue::Null);
        Response {
            data: Some(data),
            errors: self.errors,
        }
    }

    fn complete(
        &mut self,
        ty: &TypeRef,
        selection: &[SelectionNode],
        overrides: Option<&Value>,
        site: Site<'_>,
    ) -> Result<ResponseValue, Propagate> {
        match ty {
            TypeRef::NonNull(inner) => {
                let value = self.complete_value(inner, selection, overrides, site)?;
                if value.is_null() {
                    self.errors.push(GraphQLError::non_null_violation(
                        site.parent_type,
                        site.field,
                        self.path.clone(),
                    ));
                    Err(Propagate)
                } else {
                    Ok(value)
                }
            }
            // Nullable position: a failure below stops here.
            _ => Ok(self
                .complete_value(ty, selection, overrides, site)
                .unwrap_or(ResponseValue::Null)),
        }
    }

    fn complete_value(
        &mut self,
        ty: &TypeRef,
        selection: &[SelectionNode],
        overrides: Option<&Value>,
        site: Site<'_>,
    ) -> Result<ResponseValue, Propagate> {
        match ty {
            TypeRef::NonNull(_) => self.complete(ty, selection, overrides, site),
            TypeRef::List(item) => self.complete_list(item, selection, overrides, site),
            TypeRef::Scalar(name) => {
                let value = match overrides {
                    Some(value) => value.clone(),
                    None => self.leaf_value(name, ty),
                };
                // A leaf never holds a composite: field error, nulled like any other.
                if value.is_object() || value.is_array() {
                    self.errors.push(GraphQLError::invalid_leaf_value(
                        site.parent_type,
                        site.field,
                        self.path.clone(),
                    ));
                    return Err(Propagate);
                }
                Ok(value.into())
            }
            TypeRef::Object(name) => self.complete_object(name, ty, selection, overrides),
        }
    }

    fn complete_list(
        &mut self,
        item: &TypeRef,
        selection: &[SelectionNode],
        overrides: Option<&Value>,
        site: Site<'_>,
    ) -> Result<ResponseValue, Propagate> {
        let mut items = Vec::new();
        match overrides {
            Some(Value::Null) => return Ok(ResponseValue::Null),
            Some(Value::Array(values)) => {
                for (index, value) in values.iter().enumerate() {
                    items.push(self.complete_at(PathSegment::Index(index), item, selection, Some(value), site)?);
                }
            }
            // A single value stands for a one-element list.
            Some(value) => {
                items.push(self.complete_at(PathSegment::Index(0), item, selection, Some(value), site)?);
            }
            None => {
                let count = self
                    .registry
                    .resolve(item.named())
                    .list_length(self.rng)
                    .unwrap_or(self.registry.list_length());
                for index in 0..count {
                    items.push(self.complete_at(PathSegment::Index(index), item, selection, None, site)?);
                }
            }
        }
        Ok(ResponseValue::List(items))
    }

    fn complete_object(
        &mut self,
        name: &str,
        ty: &TypeRef,
        selection: &[SelectionNode],
        inherited: Option<&Value>,
    ) -> Result<ResponseValue, Propagate> {
        let schema = self.schema;
        let Some(declared) = schema.object_type(name) else {
            return Ok(ResponseValue::Null);
        };

        if matches!(inherited, Some(Value::Null)) {
            return Ok(ResponseValue::Null);
        }

        let mut abstract_output = None;
        if declared.is_abstract() {
            abstract_output = self.custom_output(name, ty);
            if inherited.is_none() && matches!(abstract_output, Some(Value::Null)) {
                return Ok(ResponseValue::Null);
            }
        }

        let Some(concrete) = self.concrete_type(declared, inherited, abstract_output.as_ref()) else {
            return Ok(ResponseValue::Null);
        };

        let concrete_output = self.custom_output(&concrete.name, ty);
        if inherited.is_none()
            && abstract_output.is_none()
            && matches!(concrete_output, Some(Value::Null))
        {
            return Ok(ResponseValue::Null);
        }

        // Lowest precedence first: concrete rule, abstract rule, inherited overrides.
        let mut merged = Map::new();
        for layer in [concrete_output.as_ref(), abstract_output.as_ref(), inherited]
            .into_iter()
            .flatten()
        {
            if let Value::Object(map) = layer {
                merged.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }

        let mut fields = IndexMap::new();
        for (response_key, nodes) in collect_fields(schema, &concrete.name, selection) {
            let first = nodes[0];
            if first.field_name == TYPENAME {
                fields.insert(
                    response_key.to_string(),
                    ResponseValue::Scalar(Value::String(concrete.name.clone())),
                );
                continue;
            }
            let Some(field) = concrete
                .field(&first.field_name)
                .or_else(|| declared.field(&first.field_name))
            else {
                continue;
            };

            let sub_selection: Cow<'_, [SelectionNode]> = if nodes.len() == 1 {
                Cow::Borrowed(first.selection.as_slice())
            } else {
                Cow::Owned(nodes.iter().flat_map(|n| n.selection.iter().cloned()).collect())
            };
            let site = Site {
                parent_type: &concrete.name,
                field: &field.name,
            };
            let value = self.complete_at(
                PathSegment::Key(response_key.to_string()),
                &field.ty,
                &sub_selection,
                merged.get(&field.name),
                site,
            )?;
            fields.insert(response_key.to_string(), value);
        }
        Ok(ResponseValue::Object(fields))
    }

    fn complete_at(
        &mut self,
        segment: PathSegment,
        ty: &TypeRef,
        selection: &[SelectionNode],
        overrides: Option<&Value>,
        site: Site<'_>,
    ) -> Result<ResponseValue, Propagate> {
        self.path.push(segment);
        let result = self.complete(ty, selection, overrides, site);
        self.path.pop();
        result
    }

    /// Output of a custom rule registered for `name`, if any
    fn custom_output(&mut self, name: &str, ty: &TypeRef) -> Option<Value> {
        match self.registry.resolve(name) {
            Rule::Custom(rule) => Some(rule.generate(ty, self.rng)),
            _ => None,
        }
    }

    /// Picks the object type to generate for `declared`. A `__typename`
    /// override naming a possible type wins over a random choice.
    fn concrete_type(
        &mut self,
        declared: &'a ObjectTypeDef,
        inherited: Option<&Value>,
        abstract_output: Option<&Value>,
    ) -> Option<&'a ObjectTypeDef> {
        if !declared.is_abstract() {
            return Some(declared);
        }
        let schema = self.schema;
        let requested = [inherited, abstract_output]
            .into_iter()
            .flatten()
            .find_map(|v| v.get(TYPENAME).and_then(Value::as_str))
            .filter(|t| declared.possible_types.iter().any(|p| p == t));
        let name = match requested {
            Some(name) => name.to_string(),
            None if declared.possible_types.is_empty() => return None,
            None => {
                let index = self.rng.gen_range(0..declared.possible_types.len());
                declared.possible_types[index].clone()
            }
        };
        schema.object_type(&name)
    }

    fn leaf_value(&mut self, name: &str, ty: &TypeRef) -> Value {
        let rule = self.registry.resolve(name);
        if let Some(value) = rule.generate(ty, self.rng) {
            return value;
        }
        // Registry not seeded from this schema: fall back on the schema itself.
        match self.schema.enum_values(name) {
            Some(values) if !values.is_empty() => {
                Value::String(values[self.rng.gen_range(0..values.len())].clone())
            }
            _ => ScalarKind::String.generate(self.rng),
        }
    }
}

/// Groups the fields that apply to `concrete` by response key, in request order.
fn collect_fields<'s>(
    schema: &SchemaModel,
    concrete: &str,
    selection: &'s [SelectionNode],
) -> IndexMap<&'s str, Vec<&'s SelectionNode>> {
    let mut grouped: IndexMap<&str, Vec<&SelectionNode>> = IndexMap::new();
    for node in selection {
        if node
            .type_conditions
            .iter()
            .all(|condition| schema.type_satisfies(concrete, condition))
        {
            grouped.entry(node.response_key.as_str()).or_default().push(node);
        }
    }
    grouped
}

#[cfg(test)]
#[path = "mock_resolver_test.rs"]
mod mock_resolver_test;
