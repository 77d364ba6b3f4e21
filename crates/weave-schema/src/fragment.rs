//! Schema fragments.
//!
//! A fragment is one domain's SDL document (`car.sdl`) parsed into a small
//! declaration model. Fragments are immutable once parsed.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use async_graphql_parser::Positioned;
use async_graphql_parser::parse_schema;
use async_graphql_parser::types::{
    ConstDirective, FieldDefinition, InputValueDefinition, TypeDefinition,
    TypeKind as AstTypeKind, TypeSystemDefinition,
};
use async_graphql_value::ConstValue;
use serde::Serialize;

use crate::annotation::{self, AccessAnnotation};
use crate::error::BuildError;
use crate::operation::OperationKind;

/// Kind of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeKind {
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    Scalar,
}

impl TypeKind {
    /// SDL keyword introducing this kind.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Object => "type",
            Self::Interface => "interface",
            Self::Union => "union",
            Self::Enum => "enum",
            Self::InputObject => "input",
            Self::Scalar => "scalar",
        }
    }
}

/// An argument on a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgumentDecl {
    pub name: String,
    /// Value type as written in SDL, e.g. `Int!`.
    pub ty: String,
    #[serde(skip)]
    pub default_value: Option<ConstValue>,
}

/// A directive other than an access marker, kept with its arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectiveDecl {
    pub name: String,
    #[serde(skip)]
    pub arguments: Vec<(String, ConstValue)>,
}

impl fmt::Display for DirectiveDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        if !self.arguments.is_empty() {
            let arguments: Vec<String> = self
                .arguments
                .iter()
                .map(|(name, value)| format!("{name}: {value}"))
                .collect();
            write!(f, "({})", arguments.join(", "))?;
        }
        Ok(())
    }
}

/// A field (or input field) declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDecl {
    pub name: String,
    /// Value type as written in SDL, e.g. `[Car!]!`.
    pub ty: String,
    pub description: Option<String>,
    pub arguments: Vec<ArgumentDecl>,
    pub annotation: Option<AccessAnnotation>,
    /// Every other directive on the field (`computed`, `deprecated`, ...).
    pub directives: Vec<DirectiveDecl>,
}

impl FieldDecl {
    /// Whether the field carries the given marker directive.
    #[must_use]
    pub fn has_directive(&self, name: &str) -> bool {
        self.directives.iter().any(|d| d.name == name)
    }

    /// Named type with list and non-null wrappers removed.
    #[must_use]
    pub fn base_type(&self) -> &str {
        base_type_name(&self.ty)
    }
}

/// A type declaration block (`type X { ... }` or `extend type X { ... }`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    pub extension: bool,
    pub description: Option<String>,
    pub annotation: Option<AccessAnnotation>,
    pub implements: Vec<String>,
    pub fields: Vec<FieldDecl>,
    /// Enum values or union members.
    pub members: Vec<String>,
}

impl TypeDecl {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One domain's parsed SDL document.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaFragment {
    domain: String,
    #[serde(skip)]
    source: String,
    path: Option<PathBuf>,
    types: Vec<TypeDecl>,
}

impl SchemaFragment {
    /// Parses SDL text into a fragment for `domain`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Discovery`] for invalid SDL, `schema { ... }`
    /// blocks, or elements carrying more than one access annotation.
    pub fn parse(domain: impl Into<String>, source: impl Into<String>) -> Result<Self, BuildError> {
        let domain = domain.into();
        let source = source.into();

        if domain.trim().is_empty() {
            return Err(BuildError::discovery("fragment domain name must not be empty"));
        }

        let document = parse_schema(&source)
            .map_err(|e| BuildError::discovery(format!("invalid SDL for domain '{domain}': {e}")))?;

        let mut types = Vec::new();
        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Type(ty) => {
                    types.push(convert_type(&domain, ty.node)?);
                }
                TypeSystemDefinition::Schema(_) => {
                    return Err(BuildError::discovery(format!(
                        "domain '{domain}' declares a schema block; root types are fixed to Query, Mutation and Subscription"
                    )));
                }
                // Directive declarations only document markers; they carry no types.
                TypeSystemDefinition::Directive(_) => {}
            }
        }

        Ok(Self {
            domain,
            source,
            path: None,
            types,
        })
    }

    /// Records the file this fragment was read from.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Raw SDL text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Type declaration blocks in document order.
    #[must_use]
    pub fn types(&self) -> &[TypeDecl] {
        &self.types
    }

    /// Names of every type this fragment declares or extends.
    #[must_use]
    pub fn type_names(&self) -> BTreeSet<&str> {
        self.types.iter().map(|t| t.name.as_str()).collect()
    }

    /// Field names declared for `type_name` across all blocks.
    #[must_use]
    pub fn field_names(&self, type_name: &str) -> BTreeSet<&str> {
        self.types
            .iter()
            .filter(|t| t.name == type_name)
            .flat_map(|t| t.fields.iter().map(|f| f.name.as_str()))
            .collect()
    }

    /// Root operations declared by this fragment.
    pub fn operations(&self) -> impl Iterator<Item = (OperationKind, &FieldDecl)> {
        self.types
            .iter()
            .filter_map(|t| OperationKind::from_root_type(&t.name).map(|kind| (kind, t)))
            .flat_map(|(kind, t)| t.fields.iter().map(move |f| (kind, f)))
    }

    /// Whether this fragment declares any root operation.
    #[must_use]
    pub fn declares_operations(&self) -> bool {
        self.operations().next().is_some()
    }
}

/// Strips list and non-null wrappers: `[Car!]!` becomes `Car`.
#[must_use]
pub fn base_type_name(ty: &str) -> &str {
    ty.trim_matches(|c| c == '[' || c == ']' || c == '!' || c == ' ')
}

fn convert_type(domain: &str, definition: TypeDefinition) -> Result<TypeDecl, BuildError> {
    let name = definition.name.node.to_string();
    let annotation = annotation::from_directives(&definition.directives)
        .map_err(|e| BuildError::discovery(format!("domain '{domain}', type {name}: {e}")))?;

    let mut decl = TypeDecl {
        name: name.clone(),
        kind: TypeKind::Scalar,
        extension: definition.extend,
        description: definition.description.map(|d| d.node),
        annotation,
        implements: Vec::new(),
        fields: Vec::new(),
        members: Vec::new(),
    };

    match definition.kind {
        AstTypeKind::Scalar => {}
        AstTypeKind::Object(object) => {
            decl.kind = TypeKind::Object;
            decl.implements = object.implements.iter().map(|i| i.node.to_string()).collect();
            decl.fields = convert_fields(domain, &name, object.fields)?;
        }
        AstTypeKind::Interface(interface) => {
            decl.kind = TypeKind::Interface;
            decl.implements = interface.implements.iter().map(|i| i.node.to_string()).collect();
            decl.fields = convert_fields(domain, &name, interface.fields)?;
        }
        AstTypeKind::Union(union) => {
            decl.kind = TypeKind::Union;
            decl.members = union.members.iter().map(|m| m.node.to_string()).collect();
        }
        AstTypeKind::Enum(enumeration) => {
            decl.kind = TypeKind::Enum;
            decl.members = enumeration
                .values
                .iter()
                .map(|v| v.node.value.node.to_string())
                .collect();
        }
        AstTypeKind::InputObject(input) => {
            decl.kind = TypeKind::InputObject;
            decl.fields = input
                .fields
                .into_iter()
                .map(|f| convert_input_field(domain, &name, f.node))
                .collect::<Result<_, _>>()?;
        }
    }

    Ok(decl)
}

fn convert_fields(
    domain: &str,
    type_name: &str,
    fields: Vec<Positioned<FieldDefinition>>,
) -> Result<Vec<FieldDecl>, BuildError> {
    fields
        .into_iter()
        .map(|field| {
            let field = field.node;
            let name = field.name.node.to_string();
            let annotation = annotation::from_directives(&field.directives).map_err(|e| {
                BuildError::discovery(format!("domain '{domain}', field {type_name}.{name}: {e}"))
            })?;
            Ok(FieldDecl {
                ty: field.ty.node.to_string(),
                description: field.description.map(|d| d.node),
                arguments: field
                    .arguments
                    .into_iter()
                    .map(|a| ArgumentDecl {
                        name: a.node.name.node.to_string(),
                        ty: a.node.ty.node.to_string(),
                        default_value: a.node.default_value.map(|v| v.node),
                    })
                    .collect(),
                annotation,
                directives: other_directives(&field.directives),
                name,
            })
        })
        .collect()
}

fn convert_input_field(
    domain: &str,
    type_name: &str,
    field: InputValueDefinition,
) -> Result<FieldDecl, BuildError> {
    let name = field.name.node.to_string();
    let annotation = annotation::from_directives(&field.directives).map_err(|e| {
        BuildError::discovery(format!("domain '{domain}', field {type_name}.{name}: {e}"))
    })?;
    Ok(FieldDecl {
        ty: field.ty.node.to_string(),
        description: field.description.map(|d| d.node),
        arguments: Vec::new(),
        annotation,
        directives: other_directives(&field.directives),
        name,
    })
}

fn other_directives(directives: &[Positioned<ConstDirective>]) -> Vec<DirectiveDecl> {
    directives
        .iter()
        .map(|d| &d.node)
        .filter(|d| {
            let name = d.name.node.as_str();
            name != annotation::names::REQUIRE_AUTH && name != annotation::names::SKIP_AUTH
        })
        .map(|d| DirectiveDecl {
            name: d.name.node.to_string(),
            arguments: d
                .arguments
                .iter()
                .map(|(name, value)| (name.node.to_string(), value.node.clone()))
                .collect(),
        })
        .collect()
}
