//! In-memory schema model built from SDL text.

use apollo_parser::cst;
use apollo_parser::Parser;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;
use std::fmt;

use super::error::SchemaError;

pub const BUILTIN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

/// Reference to a type as written on a field or argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// Leaf type: a built-in scalar, a custom scalar or an enum
    Scalar(String),
    /// Composite type: object, interface, union or input object
    Object(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// Wraps `inner` as non-null, collapsing a nested non-null wrapper.
    pub fn non_null(inner: TypeRef) -> Self {
        match inner {
            TypeRef::NonNull(_) => inner,
            other => TypeRef::NonNull(Box::new(other)),
        }
    }

    pub fn list(inner: TypeRef) -> Self {
        TypeRef::List(Box::new(inner))
    }

    /// Innermost named type
    pub fn named(&self) -> &str {
        match self {
            TypeRef::Scalar(name) | TypeRef::Object(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.named(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }

    /// True when the innermost named type has no subfields
    pub fn is_leaf(&self) -> bool {
        match self {
            TypeRef::Scalar(_) => true,
            TypeRef::Object(_) => false,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.is_leaf(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Scalar(name) | TypeRef::Object(name) => write!(f, "{name}"),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
            TypeRef::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

/// Argument definition, kept so the schema stays valid. Mocking ignores it.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDef {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeRef,
    pub arguments: Vec<ArgumentDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Object,
    Interface,
    Union,
    InputObject,
}

impl TypeKind {
    fn keyword(self) -> &'static str {
        match self {
            TypeKind::Object => "type",
            TypeKind::Interface => "interface",
            TypeKind::Union => "union",
            TypeKind::InputObject => "input",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectTypeDef {
    pub name: String,
    pub kind: TypeKind,
    /// Fields in declaration order
    pub fields: Vec<FieldDef>,
    /// Interfaces implemented by an object type
    pub interfaces: Vec<String>,
    /// Concrete object types a value of this type can take
    pub possible_types: Vec<String>,
}

impl ObjectTypeDef {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, TypeKind::Interface | TypeKind::Union)
    }
}

/// Fully resolved schema. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct SchemaModel {
    types: IndexMap<String, ObjectTypeDef>,
    scalars: IndexSet<String>,
    enums: IndexMap<String, Vec<String>>,
    query_type: String,
    mutation_type: Option<String>,
    sdl: String,
}

impl SchemaModel {
    /// Parses and resolves SDL text.
    pub fn load(schema_text: &str) -> Result<Self, SchemaError> {
        let tree = Parser::new(schema_text).parse();
        let parse_errors: Vec<String> = tree
            .errors()
            .map(|e| format!("{} at offset {}", e.message(), e.index()))
            .collect();
        if !parse_errors.is_empty() {
            return Err(SchemaError::Syntax(parse_errors));
        }

        let document = tree.document();
        let mut builder = SchemaBuilder::default();
        builder.declare(&document);
        builder.define(&document);
        builder.extend(&document);
        builder.finish(schema_text)
    }

    pub fn object_type(&self, name: &str) -> Option<&ObjectTypeDef> {
        self.types.get(name)
    }

    pub fn types(&self) -> impl Iterator<Item = &ObjectTypeDef> {
        self.types.values()
    }

    /// Declared values of an enum type
    pub fn enum_values(&self, name: &str) -> Option<&[String]> {
        self.enums.get(name).map(Vec::as_slice)
    }

    pub fn enums(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.enums.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Custom scalars declared with `scalar X`
    pub fn custom_scalars(&self) -> impl Iterator<Item = &str> {
        self.scalars.iter().map(String::as_str)
    }

    pub fn query_type(&self) -> &str {
        &self.query_type
    }

    pub fn mutation_type(&self) -> Option<&str> {
        self.mutation_type.as_deref()
    }

    pub fn sdl(&self) -> &str {
        &self.sdl
    }

    /// Any named type: composite, enum or scalar
    pub fn contains_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
            || self.enums.contains_key(name)
            || self.scalars.contains(name)
            || BUILTIN_SCALARS.contains(&name)
    }

    /// Whether the concrete object type `concrete` satisfies the type condition `condition`
    pub fn type_satisfies(&self, concrete: &str, condition: &str) -> bool {
        if concrete == condition {
            return true;
        }
        self.types
            .get(condition)
            .map(|def| def.possible_types.iter().any(|t| t == concrete))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Declared {
    Scalar,
    Enum,
    Composite(TypeKind),
}

#[derive(Default)]
struct SchemaBuilder {
    declared: IndexMap<String, Declared>,
    types: IndexMap<String, ObjectTypeDef>,
    enums: IndexMap<String, Vec<String>>,
    scalars: IndexSet<String>,
    query_root: Option<String>,
    mutation_root: Option<String>,
    errors: Vec<String>,
}

fn text(name: Option<cst::Name>) -> Option<String> {
    name.map(|n| n.text().to_string())
}

fn named_type_text(named: Option<cst::NamedType>) -> Option<String> {
    named.and_then(|n| text(n.name()))
}

impl SchemaBuilder {
    /// First pass: record every type name so forward references resolve.
    fn declare(&mut self, document: &cst::Document) {
        for definition in document.definitions() {
            let (name, declared) = match definition {
                cst::Definition::ScalarTypeDefinition(def) => (text(def.name()), Declared::Scalar),
                cst::Definition::EnumTypeDefinition(def) => (text(def.name()), Declared::Enum),
                cst::Definition::ObjectTypeDefinition(def) => {
                    (text(def.name()), Declared::Composite(TypeKind::Object))
                }
                cst::Definition::InterfaceTypeDefinition(def) => {
                    (text(def.name()), Declared::Composite(TypeKind::Interface))
                }
                cst::Definition::UnionTypeDefinition(def) => {
                    (text(def.name()), Declared::Composite(TypeKind::Union))
                }
                cst::Definition::InputObjectTypeDefinition(def) => {
                    (text(def.name()), Declared::Composite(TypeKind::InputObject))
                }
                cst::Definition::OperationDefinition(_) | cst::Definition::FragmentDefinition(_) => {
                    self.errors
                        .push("Executable definitions are not allowed in a schema".to_string());
                    continue;
                }
                _ => continue,
            };
            let Some(name) = name else {
                self.errors.push("Type definition without a name".to_string());
                continue;
            };
            if BUILTIN_SCALARS.contains(&name.as_str()) {
                if declared != Declared::Scalar {
                    self.errors
                        .push(format!("Built-in scalar \"{name}\" cannot be redefined"));
                }
                continue;
            }
            if self.declared.insert(name.clone(), declared).is_some() {
                self.errors
                    .push(format!("There can be only one type named \"{name}\""));
            }
        }
    }

    /// Second pass: build fields, members and roots against the declared names.
    fn define(&mut self, document: &cst::Document) {
        for definition in document.definitions() {
            match definition {
                cst::Definition::ScalarTypeDefinition(def) => {
                    if let Some(name) = text(def.name()) {
                        if !BUILTIN_SCALARS.contains(&name.as_str()) {
                            self.scalars.insert(name);
                        }
                    }
                }
                cst::Definition::EnumTypeDefinition(def) => {
                    let Some(name) = text(def.name()) else { continue };
                    let values: Vec<String> = def
                        .enum_values_definition()
                        .map(|values| {
                            values
                                .enum_value_definitions()
                                .filter_map(|v| v.enum_value().and_then(|e| text(e.name())))
                                .collect()
                        })
                        .unwrap_or_default();
                    if values.is_empty() {
                        self.errors
                            .push(format!("Enum \"{name}\" must define one or more values"));
                    }
                    self.check_unique(&name, values.iter().map(String::as_str), "enum value");
                    self.enums.insert(name, values);
                }
                cst::Definition::ObjectTypeDefinition(def) => {
                    let Some(name) = text(def.name()) else { continue };
                    let fields = self.fields(&name, def.fields_definition());
                    let interfaces = def
                        .implements_interfaces()
                        .map(|i| i.named_types().filter_map(|n| text(n.name())).collect())
                        .unwrap_or_default();
                    self.insert_type(name, TypeKind::Object, fields, interfaces, Vec::new());
                }
                cst::Definition::InterfaceTypeDefinition(def) => {
                    let Some(name) = text(def.name()) else { continue };
                    let fields = self.fields(&name, def.fields_definition());
                    self.insert_type(name, TypeKind::Interface, fields, Vec::new(), Vec::new());
                }
                cst::Definition::UnionTypeDefinition(def) => {
                    let Some(name) = text(def.name()) else { continue };
                    let members: Vec<String> = def
                        .union_member_types()
                        .map(|m| m.named_types().filter_map(|n| text(n.name())).collect())
                        .unwrap_or_default();
                    self.insert_type(name, TypeKind::Union, Vec::new(), Vec::new(), members);
                }
                cst::Definition::InputObjectTypeDefinition(def) => {
                    let Some(name) = text(def.name()) else { continue };
                    let fields = def
                        .input_fields_definition()
                        .map(|input| {
                            input
                                .input_value_definitions()
                                .filter_map(|value| self.input_field(&name, value))
                                .collect::<Vec<_>>()
                        })
                        .unwrap_or_default();
                    self.check_unique(&name, fields.iter().map(|f| f.name.as_str()), "field");
                    self.insert_type(name, TypeKind::InputObject, fields, Vec::new(), Vec::new());
                }
                cst::Definition::SchemaDefinition(def) => {
                    for root in def.root_operation_type_definitions() {
                        let Some(target) = named_type_text(root.named_type()) else { continue };
                        let Some(op) = root.operation_type() else { continue };
                        self.set_root(op, target);
                    }
                }
                // Extensions are applied by `extend`, directive definitions carry no data.
                _ => {}
            }
        }
    }

    /// Third pass: extensions, once every base definition exists.
    fn extend(&mut self, document: &cst::Document) {
        for definition in document.definitions() {
            match definition {
                cst::Definition::ObjectTypeExtension(ext) => {
                    let Some(name) = text(ext.name()) else { continue };
                    let fields = self.fields(&name, ext.fields_definition());
                    let interfaces = ext
                        .implements_interfaces()
                        .map(|i| i.named_types().filter_map(|n| text(n.name())).collect())
                        .unwrap_or_default();
                    self.extend_type(&name, TypeKind::Object, fields, interfaces, Vec::new());
                }
                cst::Definition::InterfaceTypeExtension(ext) => {
                    let Some(name) = text(ext.name()) else { continue };
                    let fields = self.fields(&name, ext.fields_definition());
                    self.extend_type(&name, TypeKind::Interface, fields, Vec::new(), Vec::new());
                }
                cst::Definition::UnionTypeExtension(ext) => {
                    let Some(name) = text(ext.name()) else { continue };
                    let members = ext
                        .union_member_types()
                        .map(|m| m.named_types().filter_map(|n| text(n.name())).collect())
                        .unwrap_or_default();
                    self.extend_type(&name, TypeKind::Union, Vec::new(), Vec::new(), members);
                }
                cst::Definition::InputObjectTypeExtension(ext) => {
                    let Some(name) = text(ext.name()) else { continue };
                    let fields = ext
                        .input_fields_definition()
                        .map(|input| {
                            input
                                .input_value_definitions()
                                .filter_map(|value| self.input_field(&name, value))
                                .collect::<Vec<_>>()
                        })
                        .unwrap_or_default();
                    self.check_unique(&name, fields.iter().map(|f| f.name.as_str()), "field");
                    self.extend_type(&name, TypeKind::InputObject, fields, Vec::new(), Vec::new());
                }
                cst::Definition::EnumTypeExtension(ext) => {
                    let Some(name) = text(ext.name()) else { continue };
                    let added: Vec<String> = ext
                        .enum_values_definition()
                        .map(|values| {
                            values
                                .enum_value_definitions()
                                .filter_map(|v| v.enum_value().and_then(|e| text(e.name())))
                                .collect()
                        })
                        .unwrap_or_default();
                    let Some(values) = self.enums.get_mut(&name) else {
                        self.errors
                            .push(format!("Cannot extend undefined enum \"{name}\""));
                        continue;
                    };
                    let mut duplicates = Vec::new();
                    for value in added {
                        if values.contains(&value) {
                            duplicates.push(format!("Duplicate enum value \"{value}\" in \"{name}\""));
                        } else {
                            values.push(value);
                        }
                    }
                    self.errors.extend(duplicates);
                }
                cst::Definition::ScalarTypeExtension(ext) => {
                    // Directives only, nothing to record beyond the target.
                    let Some(name) = text(ext.name()) else { continue };
                    if !self.scalars.contains(&name) && !BUILTIN_SCALARS.contains(&name.as_str()) {
                        self.errors
                            .push(format!("Cannot extend undefined scalar \"{name}\""));
                    }
                }
                cst::Definition::SchemaExtension(ext) => {
                    for root in ext.root_operation_type_definitions() {
                        let Some(target) = named_type_text(root.named_type()) else { continue };
                        let Some(op) = root.operation_type() else { continue };
                        self.set_root(op, target);
                    }
                }
                _ => {}
            }
        }
    }

    fn set_root(&mut self, op: cst::OperationType, target: String) {
        let (slot, operation) = if op.query_token().is_some() {
            (&mut self.query_root, "query")
        } else if op.mutation_token().is_some() {
            (&mut self.mutation_root, "mutation")
        } else {
            // Subscriptions are not served.
            return;
        };
        if slot.replace(target).is_some() {
            self.errors
                .push(format!("Root {operation} type defined more than once"));
        }
    }

    /// Appends extension members to an existing definition of the same kind.
    fn extend_type(
        &mut self,
        name: &str,
        kind: TypeKind,
        fields: Vec<FieldDef>,
        interfaces: Vec<String>,
        members: Vec<String>,
    ) {
        let Some(def) = self.types.get_mut(name) else {
            self.errors
                .push(format!("Cannot extend undefined type \"{name}\""));
            return;
        };
        if def.kind != kind {
            let message = format!(
                "Cannot apply \"extend {}\" to {} \"{name}\"",
                kind.keyword(),
                def.kind.keyword()
            );
            self.errors.push(message);
            return;
        }

        let mut errors = Vec::new();
        for field in fields {
            if def.field(&field.name).is_some() {
                errors.push(format!("Duplicate field \"{}\" in \"{name}\"", field.name));
            } else {
                def.fields.push(field);
            }
        }
        for interface in interfaces {
            if def.interfaces.contains(&interface) {
                errors.push(format!(
                    "Type \"{name}\" implements interface \"{interface}\" more than once"
                ));
            } else {
                def.interfaces.push(interface);
            }
        }
        for member in members {
            if def.possible_types.contains(&member) {
                errors.push(format!("Duplicate union member \"{member}\" in \"{name}\""));
            } else {
                def.possible_types.push(member);
            }
        }
        self.errors.extend(errors);
    }

    fn insert_type(
        &mut self,
        name: String,
        kind: TypeKind,
        fields: Vec<FieldDef>,
        interfaces: Vec<String>,
        possible_types: Vec<String>,
    ) {
        self.types.insert(
            name.clone(),
            ObjectTypeDef {
                name,
                kind,
                fields,
                interfaces,
                possible_types,
            },
        );
    }

    fn fields(&mut self, owner: &str, definition: Option<cst::FieldsDefinition>) -> Vec<FieldDef> {
        let Some(definition) = definition else {
            return Vec::new();
        };
        let mut fields = Vec::new();
        for field in definition.field_definitions() {
            let Some(name) = text(field.name()) else { continue };
            let Some(ty) = field.ty() else {
                self.errors
                    .push(format!("Field \"{owner}.{name}\" has no type"));
                continue;
            };
            let Some(ty) = self.type_ref(owner, ty) else { continue };
            if self.declared.get(ty.named()) == Some(&Declared::Composite(TypeKind::InputObject)) {
                self.errors.push(format!(
                    "Field \"{owner}.{name}\" cannot return input type \"{}\"",
                    ty.named()
                ));
            }
            let arguments: Vec<ArgumentDef> = field
                .arguments_definition()
                .map(|args| {
                    args.input_value_definitions()
                        .filter_map(|value| {
                            let field = self.input_field(owner, value)?;
                            Some(ArgumentDef {
                                name: field.name,
                                ty: field.ty,
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            self.check_unique(
                &format!("{owner}.{name}"),
                arguments.iter().map(|a| a.name.as_str()),
                "argument",
            );
            fields.push(FieldDef {
                name,
                ty,
                arguments,
            });
        }
        self.check_unique(owner, fields.iter().map(|f| f.name.as_str()), "field");
        fields
    }

    /// Input values (arguments, input fields) must use input types.
    fn input_field(&mut self, owner: &str, value: cst::InputValueDefinition) -> Option<FieldDef> {
        let name = text(value.name())?;
        let ty = self.type_ref(owner, value.ty()?)?;
        if let Some(Declared::Composite(kind)) = self.declared.get(ty.named()) {
            if *kind != TypeKind::InputObject {
                self.errors.push(format!(
                    "Input value \"{owner}.{name}\" cannot use output type \"{}\"",
                    ty.named()
                ));
            }
        }
        Some(FieldDef {
            name,
            ty,
            arguments: Vec::new(),
        })
    }

    fn type_ref(&mut self, owner: &str, ty: cst::Type) -> Option<TypeRef> {
        match ty {
            cst::Type::NamedType(named) => self.named_ref(owner, named),
            cst::Type::ListType(list) => {
                let inner = self.type_ref(owner, list.ty()?)?;
                Some(TypeRef::list(inner))
            }
            cst::Type::NonNullType(non_null) => {
                let inner = if let Some(list) = non_null.list_type() {
                    TypeRef::list(self.type_ref(owner, list.ty()?)?)
                } else {
                    self.named_ref(owner, non_null.named_type()?)?
                };
                Some(TypeRef::non_null(inner))
            }
        }
    }

    fn named_ref(&mut self, owner: &str, named: cst::NamedType) -> Option<TypeRef> {
        let name = text(named.name())?;
        if BUILTIN_SCALARS.contains(&name.as_str()) {
            return Some(TypeRef::Scalar(name));
        }
        match self.declared.get(&name) {
            Some(Declared::Scalar) | Some(Declared::Enum) => Some(TypeRef::Scalar(name)),
            Some(Declared::Composite(_)) => Some(TypeRef::Object(name)),
            None => {
                self.errors
                    .push(format!("Unknown type \"{name}\" referenced in \"{owner}\""));
                None
            }
        }
    }

    fn check_unique<'a>(
        &mut self,
        owner: &str,
        names: impl Iterator<Item = &'a str>,
        what: &str,
    ) {
        let mut seen = HashSet::new();
        for name in names {
            if !seen.insert(name) {
                self.errors
                    .push(format!("Duplicate {what} \"{name}\" in \"{owner}\""));
            }
        }
    }

    /// Links interfaces and unions to their concrete types and picks the roots.
    fn finish(mut self, sdl: &str) -> Result<SchemaModel, SchemaError> {
        let mut implementors: IndexMap<String, Vec<String>> = IndexMap::new();
        for def in self.types.values() {
            for interface in &def.interfaces {
                match self.types.get(interface) {
                    Some(target) if target.kind == TypeKind::Interface => implementors
                        .entry(interface.clone())
                        .or_default()
                        .push(def.name.clone()),
                    Some(_) => self.errors.push(format!(
                        "Type \"{}\" can only implement interfaces, \"{interface}\" is not one",
                        def.name
                    )),
                    None => self.errors.push(format!(
                        "Type \"{}\" implements unknown interface \"{interface}\"",
                        def.name
                    )),
                }
            }
            if def.kind == TypeKind::Union {
                for member in &def.possible_types {
                    match self.types.get(member) {
                        Some(target) if target.kind == TypeKind::Object => {}
                        _ => self.errors.push(format!(
                            "Union \"{}\" can only include object types, \"{member}\" is not one",
                            def.name
                        )),
                    }
                }
            }
        }

        for def in self.types.values_mut() {
            match def.kind {
                TypeKind::Object => def.possible_types = vec![def.name.clone()],
                TypeKind::Interface => {
                    def.possible_types = implementors.shift_remove(&def.name).unwrap_or_default()
                }
                TypeKind::Union | TypeKind::InputObject => {}
            }
        }

        let query_type = match self.query_root.take() {
            Some(name) => {
                self.check_root(&name, "query");
                Some(name)
            }
            None => self
                .types
                .get("Query")
                .filter(|def| def.kind == TypeKind::Object)
                .map(|def| def.name.clone()),
        };
        let mutation_type = match self.mutation_root.take() {
            Some(name) => {
                self.check_root(&name, "mutation");
                Some(name)
            }
            None => self
                .types
                .get("Mutation")
                .filter(|def| def.kind == TypeKind::Object)
                .map(|def| def.name.clone()),
        };

        if !self.errors.is_empty() {
            return Err(SchemaError::Syntax(self.errors));
        }
        let query_type = query_type.ok_or(SchemaError::RootMissing)?;

        Ok(SchemaModel {
            types: self.types,
            scalars: self.scalars,
            enums: self.enums,
            query_type,
            mutation_type,
            sdl: sdl.to_string(),
        })
    }

    fn check_root(&mut self, name: &str, operation: &str) {
        match self.types.get(name) {
            Some(def) if def.kind == TypeKind::Object => {}
            Some(def) => self.errors.push(format!(
                "Root {operation} type \"{name}\" must be an object type, found {}",
                def.kind.keyword()
            )),
            None => self
                .errors
                .push(format!("Root {operation} type \"{name}\" is not defined")),
        }
    }
}
