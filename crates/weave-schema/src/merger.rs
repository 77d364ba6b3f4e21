//! Conflict-detecting union of schema fragments.
//!
//! Merge rules:
//!
//! - Types are unioned by name; a name declared with two different kinds is
//!   a conflict.
//! - Fields are unioned per type. The same field from two declarations is a
//!   conflict when the value types differ. With identical value types it is
//!   accepted only if either declaration is an `extend` block, and the
//!   non-extension declaration owns the field.
//! - `Query`, `Mutation` and `Subscription` may be declared by every
//!   fragment, but an operation name may appear only once.
//! - Extending a non-root type nobody declares is a discovery error.
//! - Enum values and union members are unioned.
//!
//! Fragments are merged in discovery order, which only affects which
//! fragment is reported as `first` in conflicts.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::annotation::{AccessAnnotation, EffectiveAnnotation};
use crate::error::BuildError;
use crate::fragment::{FieldDecl, SchemaFragment, TypeKind};
use crate::operation::{OperationKind, is_root_type};
use crate::printer;

/// A field in the merged schema and the fragment that contributed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedField {
    pub decl: FieldDecl,
    /// Domain of the contributing fragment.
    pub domain: String,
    /// Annotation on the declaration block the field came from.
    pub type_annotation: Option<AccessAnnotation>,
    /// Whether that block was an `extend` block.
    pub extension: bool,
}

impl MergedField {
    /// Field annotation, else block annotation, else `requireAuth`.
    #[must_use]
    pub fn effective_annotation(&self) -> EffectiveAnnotation {
        EffectiveAnnotation::resolve(self.decl.annotation.as_ref(), self.type_annotation.as_ref())
    }

    /// Annotation explicitly written on the field or its block, if any.
    #[must_use]
    pub fn explicit_annotation(&self) -> Option<&AccessAnnotation> {
        self.decl.annotation.as_ref().or(self.type_annotation.as_ref())
    }
}

/// A type in the merged schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedType {
    pub name: String,
    pub kind: TypeKind,
    pub description: Option<String>,
    /// Domain of the first fragment with a non-extension declaration, or of
    /// the first extension while no such fragment has been merged.
    pub declared_by: String,
    pub implements: Vec<String>,
    pub fields: IndexMap<String, MergedField>,
    pub members: Vec<String>,
}

/// A root operation view over the merged schema.
#[derive(Debug, Clone, Copy)]
pub struct Operation<'a> {
    pub kind: OperationKind,
    pub field: &'a MergedField,
}

impl<'a> Operation<'a> {
    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.field.decl.name
    }

    #[must_use]
    pub fn domain(&self) -> &'a str {
        &self.field.domain
    }
}

/// Union of every fragment's declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedDefinition {
    types: IndexMap<String, MergedType>,
}

impl MergedDefinition {
    pub fn types(&self) -> impl Iterator<Item = &MergedType> {
        self.types.values()
    }

    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&MergedType> {
        self.types.get(name)
    }

    #[must_use]
    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Every root operation, Query first, then Mutation, then Subscription.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation<'_>> {
        OperationKind::ALL
            .into_iter()
            .filter_map(|kind| self.types.get(kind.root_type_name()).map(|t| (kind, t)))
            .flat_map(|(kind, ty)| ty.fields.values().map(move |field| Operation { kind, field }))
            .collect()
    }

    #[must_use]
    pub fn operation(&self, kind: OperationKind, name: &str) -> Option<Operation<'_>> {
        self.types
            .get(kind.root_type_name())
            .and_then(|t| t.fields.get(name))
            .map(|field| Operation { kind, field })
    }

    /// Effective annotation for an operation, `None` if it does not exist.
    #[must_use]
    pub fn effective_annotation(
        &self,
        kind: OperationKind,
        name: &str,
    ) -> Option<EffectiveAnnotation> {
        self.operation(kind, name).map(|op| op.field.effective_annotation())
    }

    /// Canonical SDL text for the merged schema.
    #[must_use]
    pub fn to_sdl(&self) -> String {
        printer::print(self)
    }
}

/// Merges schema fragments into one definition.
#[derive(Debug, Default)]
pub struct SchemaMerger;

impl SchemaMerger {
    /// Merges fragments in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::SchemaConflict`] for incompatible declarations
    /// and [`BuildError::Discovery`] for extensions of undeclared types.
    pub fn merge(fragments: &[SchemaFragment]) -> Result<MergedDefinition, BuildError> {
        let mut types: IndexMap<String, MergedType> = IndexMap::new();
        let mut base_declared: HashSet<String> = HashSet::new();
        let mut first_extension: IndexMap<String, String> = IndexMap::new();

        for fragment in fragments {
            let domain = fragment.domain();
            for decl in fragment.types() {
                let root = is_root_type(&decl.name);
                let first_base = !decl.extension && !base_declared.contains(&decl.name);
                if decl.extension {
                    first_extension
                        .entry(decl.name.clone())
                        .or_insert_with(|| domain.to_string());
                } else {
                    base_declared.insert(decl.name.clone());
                }

                let merged = types.entry(decl.name.clone()).or_insert_with(|| MergedType {
                    name: decl.name.clone(),
                    kind: decl.kind,
                    description: None,
                    declared_by: domain.to_string(),
                    implements: Vec::new(),
                    fields: IndexMap::new(),
                    members: Vec::new(),
                });

                if merged.kind != decl.kind {
                    return Err(BuildError::SchemaConflict {
                        type_name: decl.name.clone(),
                        field: None,
                        first: merged.declared_by.clone(),
                        second: domain.to_string(),
                        detail: format!(
                            "declared as `{}` and `{}`",
                            merged.kind.keyword(),
                            decl.kind.keyword()
                        ),
                    });
                }
                if first_base {
                    merged.declared_by = domain.to_string();
                }
                if merged.description.is_none() {
                    merged.description.clone_from(&decl.description);
                }
                union_into(&mut merged.implements, &decl.implements);
                union_into(&mut merged.members, &decl.members);

                for field in &decl.fields {
                    let incoming = MergedField {
                        decl: field.clone(),
                        domain: domain.to_string(),
                        type_annotation: decl.annotation.clone(),
                        extension: decl.extension,
                    };
                    let Some(existing) = merged.fields.get_mut(&field.name) else {
                        merged.fields.insert(field.name.clone(), incoming);
                        continue;
                    };

                    let same_type = existing.decl.ty == field.ty;
                    if same_type && !root && (existing.extension || decl.extension) {
                        debug!(
                            type_name = %decl.name,
                            field = %field.name,
                            domain,
                            "Compatible extension field redeclaration"
                        );
                        if existing.extension && !decl.extension {
                            *existing = incoming;
                        }
                        continue;
                    }
                    let detail = if same_type {
                        "duplicate declaration".to_string()
                    } else {
                        format!("`{}` vs `{}`", existing.decl.ty, field.ty)
                    };
                    return Err(BuildError::SchemaConflict {
                        type_name: decl.name.clone(),
                        field: Some(field.name.clone()),
                        first: existing.domain.clone(),
                        second: domain.to_string(),
                        detail,
                    });
                }
            }
        }

        for (name, domain) in &first_extension {
            if !is_root_type(name) && !base_declared.contains(name) {
                return Err(BuildError::discovery(format!(
                    "domain '{domain}' extends type {name}, which no fragment declares"
                )));
            }
        }

        let definition = MergedDefinition { types };
        info!(
            fragments = fragments.len(),
            types = definition.types.len(),
            operations = definition.operations().len(),
            "Schema fragments merged"
        );
        Ok(definition)
    }
}

fn union_into(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}
