//! Executable document parsing into selection trees.

use apollo_parser::cst;
use apollo_parser::Parser;
use std::collections::HashMap;

use super::error::QueryError;

/// One requested field, with fragments already flattened away.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionNode {
    /// Alias if present, otherwise the field name
    pub response_key: String,
    pub field_name: String,
    /// Type conditions of the enclosing fragments, outermost first
    pub type_conditions: Vec<String>,
    pub selection: Vec<SelectionNode>,
}

impl SelectionNode {
    pub fn field(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            response_key: name.clone(),
            field_name: name,
            type_conditions: Vec::new(),
            selection: Vec::new(),
        }
    }

    pub fn with_selection(mut self, selection: Vec<SelectionNode>) -> Self {
        self.selection = selection;
        self
    }

    pub fn aliased(mut self, alias: impl Into<String>) -> Self {
        self.response_key = alias.into();
        self
    }

    pub fn on(mut self, type_condition: impl Into<String>) -> Self {
        self.type_conditions.push(type_condition.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    pub name: Option<String>,
    pub selection: Vec<SelectionNode>,
}

/// Parses `text` and selects the operation to run.
///
/// `operation_name` is required when the document holds more than one operation.
pub fn parse_operation(text: &str, operation_name: Option<&str>) -> Result<Operation, QueryError> {
    let tree = Parser::new(text).parse();
    let errors: Vec<String> = tree.errors().map(|e| e.message().to_string()).collect();
    if !errors.is_empty() {
        return Err(QueryError::Syntax(errors.join(", ")));
    }

    let document = tree.document();
    let mut operations = Vec::new();
    let mut fragments = HashMap::new();
    for definition in document.definitions() {
        match definition {
            cst::Definition::OperationDefinition(op) => operations.push(op),
            cst::Definition::FragmentDefinition(fragment) => {
                if let Some(name) = fragment
                    .fragment_name()
                    .and_then(|f| f.name())
                    .map(|n| n.text().to_string())
                {
                    fragments.insert(name, fragment);
                }
            }
            _ => {
                return Err(QueryError::Syntax(
                    "Type system definitions are not executable".to_string(),
                ))
            }
        }
    }

    let operation = select_operation(operations, operation_name)?;
    let name = operation.name().map(|n| n.text().to_string());
    let kind = match operation.operation_type() {
        None => OperationKind::Query,
        Some(op) if op.query_token().is_some() => OperationKind::Query,
        Some(op) if op.mutation_token().is_some() => OperationKind::Mutation,
        Some(_) => {
            return Err(QueryError::UnsupportedOperation(
                "subscriptions are not supported".to_string(),
            ))
        }
    };

    let set = operation
        .selection_set()
        .ok_or_else(|| QueryError::Syntax("Operation has no selection set".to_string()))?;
    let flattener = Flattener { fragments };
    let selection = flattener.flatten(set, &[], &mut Vec::new())?;

    Ok(Operation {
        kind,
        name,
        selection,
    })
}

fn select_operation(
    operations: Vec<cst::OperationDefinition>,
    operation_name: Option<&str>,
) -> Result<cst::OperationDefinition, QueryError> {
    match operation_name {
        Some(wanted) => operations
            .into_iter()
            .find(|op| op.name().map(|n| n.text().to_string()).as_deref() == Some(wanted))
            .ok_or_else(|| QueryError::OperationNotFound(wanted.to_string())),
        None => {
            let mut iter = operations.into_iter();
            let first = iter.next().ok_or(QueryError::NoOperation)?;
            if iter.next().is_some() {
                return Err(QueryError::AmbiguousOperation);
            }
            Ok(first)
        }
    }
}

struct Flattener {
    fragments: HashMap<String, cst::FragmentDefinition>,
}

impl Flattener {
    fn flatten(
        &self,
        set: cst::SelectionSet,
        conditions: &[String],
        visiting: &mut Vec<String>,
    ) -> Result<Vec<SelectionNode>, QueryError> {
        let mut nodes = Vec::new();
        for selection in set.selections() {
            match selection {
                cst::Selection::Field(field) => {
                    let field_name = field
                        .name()
                        .map(|n| n.text().to_string())
                        .ok_or_else(|| QueryError::Syntax("Field without a name".to_string()))?;
                    let response_key = field
                        .alias()
                        .and_then(|a| a.name())
                        .map(|n| n.text().to_string())
                        .unwrap_or_else(|| field_name.clone());
                    // Subfields start a fresh scope: conditions apply to this field only.
                    let selection = match field.selection_set() {
                        Some(sub) => self.flatten(sub, &[], visiting)?,
                        None => Vec::new(),
                    };
                    nodes.push(SelectionNode {
                        response_key,
                        field_name,
                        type_conditions: conditions.to_vec(),
                        selection,
                    });
                }
                cst::Selection::InlineFragment(fragment) => {
                    let scoped = with_condition(conditions, fragment.type_condition());
                    if let Some(sub) = fragment.selection_set() {
                        nodes.extend(self.flatten(sub, &scoped, visiting)?);
                    }
                }
                cst::Selection::FragmentSpread(spread) => {
                    let name = spread
                        .fragment_name()
                        .and_then(|f| f.name())
                        .map(|n| n.text().to_string())
                        .ok_or_else(|| {
                            QueryError::Syntax("Fragment spread without a name".to_string())
                        })?;
                    if visiting.contains(&name) {
                        return Err(QueryError::FragmentCycle(name));
                    }
                    let fragment = self
                        .fragments
                        .get(&name)
                        .ok_or_else(|| QueryError::UnknownFragment(name.clone()))?;
                    let scoped = with_condition(conditions, fragment.type_condition());
                    visiting.push(name);
                    if let Some(sub) = fragment.selection_set() {
                        nodes.extend(self.flatten(sub, &scoped, visiting)?);
                    }
                    visiting.pop();
                }
            }
        }
        Ok(nodes)
    }
}

fn with_condition(conditions: &[String], condition: Option<cst::TypeCondition>) -> Vec<String> {
    let mut scoped = conditions.to_vec();
    if let Some(name) = condition
        .and_then(|c| c.named_type())
        .and_then(|n| n.name())
        .map(|n| n.text().to_string())
    {
        scoped.push(name);
    }
    scoped
}
