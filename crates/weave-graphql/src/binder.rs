//! Resolver binding.
//!
//! Every root operation is bound to the resolver of the same name in the
//! resolver fragment of the domain that declared it, together with its
//! effective access annotation. Object type fields bind to a registered
//! `Type.field` resolver when one exists and otherwise read the property of
//! the same name from their parent value.

use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, info, warn};
use weave_schema::{
    AccessAnnotation, BuildError, EffectiveAnnotation, FieldDecl, MergedDefinition,
    OperationKind, SchemaFragment, TypeKind, UnboundOperation,
};

use crate::resolver::{DynResolver, ResolverRegistry};

/// A root operation with its resolver and annotation.
#[derive(Clone)]
pub struct BoundOperation {
    pub kind: OperationKind,
    pub domain: String,
    pub field: FieldDecl,
    pub annotation: EffectiveAnnotation,
    pub resolver: DynResolver,
}

impl BoundOperation {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.field.name
    }

    /// `Query.cars` style label used in errors and logs.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}.{}", self.kind, self.field.name)
    }
}

impl fmt::Debug for BoundOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundOperation")
            .field("kind", &self.kind)
            .field("name", &self.field.name)
            .field("domain", &self.domain)
            .field("annotation", &self.annotation)
            .finish_non_exhaustive()
    }
}

/// A nested object field with an explicit resolver or annotation.
#[derive(Clone)]
pub struct BoundField {
    pub resolver: Option<DynResolver>,
    pub annotation: Option<AccessAnnotation>,
}

/// The merged definition with every operation bound. Built once and shared
/// read-only for the lifetime of the process.
pub struct MergedSchema {
    definition: MergedDefinition,
    operations: IndexMap<(OperationKind, String), BoundOperation>,
    fields: IndexMap<(String, String), BoundField>,
}

impl MergedSchema {
    #[must_use]
    pub fn definition(&self) -> &MergedDefinition {
        &self.definition
    }

    pub fn operations(&self) -> impl Iterator<Item = &BoundOperation> {
        self.operations.values()
    }

    #[must_use]
    pub fn operation(&self, kind: OperationKind, name: &str) -> Option<&BoundOperation> {
        self.operations.get(&(kind, name.to_string()))
    }

    /// Explicit binding for a nested field, if it has a resolver or an
    /// annotation of its own.
    #[must_use]
    pub fn field(&self, type_name: &str, field: &str) -> Option<&BoundField> {
        self.fields.get(&(type_name.to_string(), field.to_string()))
    }

    /// Canonical SDL of the merged schema.
    #[must_use]
    pub fn to_sdl(&self) -> String {
        self.definition.to_sdl()
    }
}

impl fmt::Debug for MergedSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergedSchema")
            .field("types", &self.definition.types().count())
            .field("operations", &self.operations.values().collect::<Vec<_>>())
            .field("bound_fields", &self.fields.len())
            .finish()
    }
}

/// Fails when a fragment declares operations but its domain has no
/// resolver fragment. Fragments declaring only types need none.
///
/// # Errors
///
/// Returns [`BuildError::Discovery`] naming the first such domain.
pub fn ensure_resolver_fragments(
    fragments: &[SchemaFragment],
    registry: &ResolverRegistry,
) -> Result<(), BuildError> {
    for fragment in fragments {
        if fragment.declares_operations() && registry.get(fragment.domain()).is_none() {
            let message = format!(
                "domain '{}' declares operations but has no resolver fragment",
                fragment.domain()
            );
            return Err(match fragment.path() {
                Some(path) => BuildError::discovery_at(path, message),
                None => BuildError::discovery(message),
            });
        }
    }
    Ok(())
}

/// Binds resolvers from a registry onto a merged definition.
pub struct ResolverBinder<'a> {
    registry: &'a ResolverRegistry,
}

impl<'a> ResolverBinder<'a> {
    #[must_use]
    pub fn new(registry: &'a ResolverRegistry) -> Self {
        Self { registry }
    }

    /// Binds every operation and nested field.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnboundOperation`] listing every operation
    /// without a resolver.
    pub fn bind(&self, definition: MergedDefinition) -> Result<MergedSchema, BuildError> {
        let mut operations = IndexMap::new();
        let mut unbound = Vec::new();

        for op in definition.operations() {
            let resolver = self
                .registry
                .get(op.domain())
                .and_then(|fragment| fragment.get_operation(op.name()));

            let Some(resolver) = resolver else {
                unbound.push(UnboundOperation {
                    domain: op.domain().to_string(),
                    kind: op.kind,
                    name: op.name().to_string(),
                });
                continue;
            };

            let annotation = op.field.effective_annotation();
            debug!(
                operation = %format!("{}.{}", op.kind, op.name()),
                domain = op.domain(),
                annotation = %annotation.annotation,
                source = %annotation.source,
                "Operation bound"
            );
            operations.insert(
                (op.kind, op.name().to_string()),
                BoundOperation {
                    kind: op.kind,
                    domain: op.domain().to_string(),
                    field: op.field.decl.clone(),
                    annotation,
                    resolver: resolver.clone(),
                },
            );
        }

        if !unbound.is_empty() {
            return Err(BuildError::UnboundOperation { operations: unbound });
        }

        let fields = self.bind_fields(&definition);
        self.warn_unreferenced(&definition);

        info!(
            operations = operations.len(),
            bound_fields = fields.len(),
            "Resolvers bound"
        );
        Ok(MergedSchema {
            definition,
            operations,
            fields,
        })
    }

    fn bind_fields(&self, definition: &MergedDefinition) -> IndexMap<(String, String), BoundField> {
        let mut fields = IndexMap::new();
        let objects = definition.types().filter(|t| {
            t.kind == TypeKind::Object && OperationKind::from_root_type(&t.name).is_none()
        });

        for ty in objects {
            for field in ty.fields.values() {
                let resolver = self
                    .registry
                    .get(&field.domain)
                    .and_then(|fragment| fragment.get_field_resolver(&ty.name, &field.decl.name))
                    .cloned();
                let annotation = field.explicit_annotation().cloned();
                if resolver.is_none() && annotation.is_none() {
                    continue;
                }
                fields.insert(
                    (ty.name.clone(), field.decl.name.clone()),
                    BoundField {
                        resolver,
                        annotation,
                    },
                );
            }
        }
        fields
    }

    fn warn_unreferenced(&self, definition: &MergedDefinition) {
        for fragment in self.registry.fragments() {
            for name in fragment.operation_names() {
                let declared = OperationKind::ALL
                    .into_iter()
                    .filter_map(|kind| definition.operation(kind, name))
                    .any(|op| op.domain() == fragment.domain());
                if !declared {
                    warn!(
                        domain = fragment.domain(),
                        resolver = name,
                        "Resolver does not match any declared operation"
                    );
                }
            }
            for key in fragment.field_keys() {
                let declared = key.split_once('.').is_some_and(|(ty, field)| {
                    definition
                        .get_type(ty)
                        .and_then(|t| t.fields.get(field))
                        .is_some_and(|f| f.domain == fragment.domain())
                });
                if !declared {
                    warn!(
                        domain = fragment.domain(),
                        resolver = key,
                        "Field resolver does not match any field declared by its domain"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverFragment;
    use serde_json::json;
    use weave_schema::SchemaMerger;

    fn definition(fragments: &[(&str, &str)]) -> MergedDefinition {
        let parsed: Vec<SchemaFragment> = fragments
            .iter()
            .map(|(d, s)| SchemaFragment::parse(*d, *s).unwrap())
            .collect();
        SchemaMerger::merge(&parsed).unwrap()
    }

    #[test]
    fn test_binds_operation_with_default_annotation() {
        let registry = ResolverRegistry::new()
            .with(ResolverFragment::new("car").operation("cars", |_, _| async { Ok(json!([])) }))
            .unwrap();
        let schema = ResolverBinder::new(&registry)
            .bind(definition(&[("car", "type Car { id: ID } type Query { cars: [Car] }")]))
            .unwrap();

        let op = schema.operation(OperationKind::Query, "cars").unwrap();
        assert_eq!(op.domain, "car");
        assert_eq!(op.label(), "Query.cars");
        assert_eq!(op.annotation.annotation, AccessAnnotation::require_auth());
    }

    #[test]
    fn test_unbound_operations_collected() {
        let registry = ResolverRegistry::new()
            .with(ResolverFragment::new("car").operation("cars", |_, _| async { Ok(json!([])) }))
            .unwrap();
        let err = ResolverBinder::new(&registry)
            .bind(definition(&[(
                "car",
                "type Query { cars: [Int], car(id: ID!): Int } type Mutation { addCar: Int }",
            )]))
            .unwrap_err();

        let BuildError::UnboundOperation { operations } = err else {
            panic!("expected unbound operation error");
        };
        let names: Vec<String> = operations.iter().map(|o| o.name.clone()).collect();
        assert_eq!(names, ["car", "addCar"]);
    }

    #[test]
    fn test_resolver_must_come_from_declaring_domain() {
        let registry = ResolverRegistry::new()
            .with(ResolverFragment::new("car"))
            .unwrap()
            .with(ResolverFragment::new("fleet").operation("cars", |_, _| async { Ok(json!([])) }))
            .unwrap();
        let err = ResolverBinder::new(&registry)
            .bind(definition(&[("car", "type Query { cars: [Int] }")]))
            .unwrap_err();
        assert!(matches!(err, BuildError::UnboundOperation { .. }));
    }

    #[test]
    fn test_nested_fields_bound_when_explicit() {
        let registry = ResolverRegistry::new()
            .with(
                ResolverFragment::new("car")
                    .operation("cars", |_, _| async { Ok(json!([])) })
                    .field("Car", "owner", |_, _| async { Ok(json!("ada")) }),
            )
            .unwrap();
        let schema = ResolverBinder::new(&registry)
            .bind(definition(&[(
                "car",
                r#"type Car { make: String, owner: String, vin: String @requireAuth(roles: "admin") }
                   type Query { cars: [Car] @skipAuth }"#,
            )]))
            .unwrap();

        assert!(schema.field("Car", "owner").unwrap().resolver.is_some());
        assert_eq!(
            schema.field("Car", "vin").unwrap().annotation,
            Some(AccessAnnotation::require_roles(["admin"]))
        );
        assert!(schema.field("Car", "make").is_none());
    }

    #[test]
    fn test_ensure_resolver_fragments() {
        let registry = ResolverRegistry::new();
        let types_only = SchemaFragment::parse("shared", "scalar DateTime").unwrap();
        assert!(ensure_resolver_fragments(&[types_only], &registry).is_ok());

        let with_ops = SchemaFragment::parse("car", "type Query { cars: [Int] }").unwrap();
        let err = ensure_resolver_fragments(&[with_ops], &registry).unwrap_err();
        assert!(err.to_string().contains("no resolver fragment"));
    }
}
