//! Executable schema backed by the async-graphql dynamic schema API.
//!
//! Every declared type is registered with the dynamic builder. Root
//! operations resolve through their bound resolver after the access gate
//! passes; object fields resolve through a registered `Type.field` resolver
//! or read the property of the same name from the parent value.
//!
//! Values returned by resolvers are JSON. They are shaped to the declared
//! output type on the way out: lists become list values, strings become
//! enum values for enum types, numeric IDs are serialized as strings, and
//! union or interface values pick their concrete type from `__typename`.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_graphql::dynamic::{
    Enum, Field, FieldFuture, FieldValue, InputObject, InputValue, Interface, InterfaceField,
    Object, ResolverContext, Scalar, Schema, SchemaBuilder, TypeRef, Union,
};
use async_graphql::parser::types::{BaseType, Type};
use async_graphql::{ErrorExtensions, Name, Request, Response, Value};
use futures_util::future::join_all;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};
use weave_schema::{AccessAnnotation, ArgumentDecl, MergedType, OperationKind, TypeKind};

use crate::binder::MergedSchema;
use crate::config::GraphQLConfig;
use crate::error::GraphQLError;
use crate::gate::AccessGate;
use crate::identity::RequestAuth;
use crate::resolver::{DynResolver, ExecutionContext};

const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// A merged schema ready to execute requests.
pub struct ExecutableSchema {
    schema: Schema,
    merged: Arc<MergedSchema>,
    config: GraphQLConfig,
}

impl ExecutableSchema {
    /// Registers every merged type with the dynamic schema builder.
    ///
    /// Subscription operations stay bound in the merged schema but are not
    /// exposed for execution.
    ///
    /// # Errors
    ///
    /// Returns [`GraphQLError::SchemaBuildFailed`] when the configuration is
    /// invalid, no `Query` operations exist, or async-graphql rejects the
    /// schema.
    pub fn build(merged: Arc<MergedSchema>, config: &GraphQLConfig) -> Result<Self, GraphQLError> {
        config.validate().map_err(GraphQLError::SchemaBuildFailed)?;
        let definition = merged.definition();

        if !definition.has_type(OperationKind::Query.root_type_name()) {
            return Err(GraphQLError::SchemaBuildFailed(
                "no Query operations declared".into(),
            ));
        }
        let mutation = definition
            .has_type(OperationKind::Mutation.root_type_name())
            .then_some(OperationKind::Mutation.root_type_name());

        let shapes = Arc::new(OutputShapes::from_schema(&merged));
        let mut builder = Schema::build(OperationKind::Query.root_type_name(), mutation, None);

        for ty in definition.types() {
            builder = register_type(builder, &merged, ty, &shapes)?;
        }

        builder = builder
            .limit_depth(config.max_depth)
            .limit_complexity(config.max_complexity);
        if !config.introspection {
            builder = builder.disable_introspection();
        }

        let schema = builder
            .finish()
            .map_err(|e| GraphQLError::SchemaBuildFailed(e.to_string()))?;

        info!(
            types = definition.types().count(),
            introspection = config.introspection,
            batching = config.batching,
            "Executable schema built"
        );
        Ok(Self {
            schema,
            merged,
            config: config.clone(),
        })
    }

    #[must_use]
    pub fn merged(&self) -> &MergedSchema {
        &self.merged
    }

    #[must_use]
    pub fn config(&self) -> &GraphQLConfig {
        &self.config
    }

    /// SDL as exposed by the executable schema.
    #[must_use]
    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }

    /// Executes one request under the given authentication state.
    pub async fn execute(&self, request: impl Into<Request>, auth: RequestAuth) -> Response {
        self.schema.execute(request.into().data(auth)).await
    }

    /// Executes a batch concurrently. Each request gets its own response and
    /// a failing sibling does not affect the others.
    ///
    /// # Errors
    ///
    /// Returns [`GraphQLError::BatchRejected`] when batching is disabled or
    /// the batch exceeds `max_batch_size`.
    pub async fn execute_batch(
        &self,
        requests: Vec<Request>,
        auth: RequestAuth,
    ) -> Result<Vec<Response>, GraphQLError> {
        let Some(limit) = self.config.batch_limit() else {
            return Err(GraphQLError::BatchRejected("batching is disabled".into()));
        };
        if requests.len() > limit {
            return Err(GraphQLError::BatchRejected(format!(
                "batch of {} exceeds maximum {limit}",
                requests.len()
            )));
        }

        debug!(size = requests.len(), "Executing batch");
        let responses = join_all(
            requests
                .into_iter()
                .map(|request| self.execute(request, auth.clone())),
        )
        .await;
        Ok(responses)
    }
}

impl fmt::Debug for ExecutableSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutableSchema")
            .field("merged", &self.merged)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Type names whose output values need reshaping.
#[derive(Debug, Default)]
struct OutputShapes {
    enums: HashSet<String>,
    abstracts: HashSet<String>,
}

impl OutputShapes {
    fn from_schema(schema: &MergedSchema) -> Self {
        let mut shapes = Self::default();
        for ty in schema.definition().types() {
            match ty.kind {
                TypeKind::Enum => {
                    shapes.enums.insert(ty.name.clone());
                }
                TypeKind::Union | TypeKind::Interface => {
                    shapes.abstracts.insert(ty.name.clone());
                }
                _ => {}
            }
        }
        shapes
    }

    fn shape<'a>(&self, value: Value, ty: &Type) -> Result<FieldValue<'a>, String> {
        if matches!(value, Value::Null) {
            return Ok(FieldValue::NULL);
        }
        match &ty.base {
            BaseType::List(inner) => match value {
                Value::List(items) => items
                    .into_iter()
                    .map(|item| self.shape(item, inner))
                    .collect::<Result<Vec<_>, _>>()
                    .map(FieldValue::list),
                _ => Err(format!("expected a list for {ty}")),
            },
            BaseType::Named(name) => self.shape_named(value, name.as_str()),
        }
    }

    fn shape_named<'a>(&self, value: Value, name: &str) -> Result<FieldValue<'a>, String> {
        match value {
            Value::Number(n) if name == "ID" => Ok(FieldValue::value(Value::String(n.to_string()))),
            Value::String(s) if self.enums.contains(name) => {
                Ok(FieldValue::value(Value::Enum(Name::new(s))))
            }
            Value::Object(obj) if self.abstracts.contains(name) => {
                let Some(Value::String(type_name)) = obj.get("__typename").cloned() else {
                    return Err(format!("value for {name} lacks a __typename"));
                };
                Ok(FieldValue::value(Value::Object(obj)).with_type(type_name))
            }
            other => Ok(FieldValue::value(other)),
        }
    }
}

/// Everything a single field resolver closure needs.
struct FieldBinding {
    name: String,
    label: String,
    ty: Type,
    annotation: Option<AccessAnnotation>,
    resolver: Option<DynResolver>,
    shapes: Arc<OutputShapes>,
}

impl FieldBinding {
    /// Resolves the field. A nullable field that fails records its error and
    /// resolves to `null` so it stays in `data`; a non-null field propagates
    /// the error to its parent.
    async fn resolve<'a>(
        &self,
        ctx: ResolverContext<'a>,
    ) -> async_graphql::Result<Option<FieldValue<'a>>> {
        match self.try_resolve(&ctx).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if self.ty.nullable => {
                ctx.add_error(ctx.set_error_path(err.into_server_error(ctx.item.pos)));
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn try_resolve<'a>(
        &self,
        ctx: &ResolverContext<'a>,
    ) -> async_graphql::Result<FieldValue<'a>> {
        let auth = ctx.data_opt::<RequestAuth>().cloned().unwrap_or_default();
        if let Some(annotation) = &self.annotation {
            AccessGate::check(annotation, &auth, &self.label)
                .map_err(|e| GraphQLError::from(e).extend())?;
        }

        let value = match &self.resolver {
            Some(resolver) => {
                let exec = ExecutionContext {
                    identity: auth.identity().cloned(),
                    operation: self.label.clone(),
                    parent: parent_json(ctx),
                };
                let args = arguments_json(ctx)?;
                let json = resolver.resolve(args, &exec).await.map_err(|source| {
                    warn!(
                        operation = %self.label,
                        code = %source.code,
                        error = %source,
                        "Resolver failed"
                    );
                    GraphQLError::Resolver {
                        operation: self.label.clone(),
                        source,
                    }
                    .extend()
                })?;
                json_to_graphql_value(json)
            }
            None => match ctx.parent_value.as_value() {
                Some(Value::Object(obj)) => {
                    obj.get(self.name.as_str()).cloned().unwrap_or(Value::Null)
                }
                _ => Value::Null,
            },
        };

        self.shapes
            .shape(value, &self.ty)
            .map_err(|msg| GraphQLError::Internal(format!("{}: {msg}", self.label)).extend())
    }
}

fn register_type(
    builder: SchemaBuilder,
    merged: &MergedSchema,
    ty: &MergedType,
    shapes: &Arc<OutputShapes>,
) -> Result<SchemaBuilder, GraphQLError> {
    let registered = match ty.kind {
        TypeKind::Object => match OperationKind::from_root_type(&ty.name) {
            Some(OperationKind::Subscription) => {
                warn!(
                    operations = ty.fields.len(),
                    "Subscription operations are not exposed for execution"
                );
                return Ok(builder);
            }
            Some(kind) => builder.register(root_object(merged, kind, ty, shapes)?),
            None => builder.register(object(merged, ty, shapes)?),
        },
        TypeKind::Interface => {
            let mut interface = Interface::new(&ty.name);
            for field in ty.fields.values() {
                let ty = type_ref(&parse_type(&field.decl.ty)?);
                let mut f = InterfaceField::new(&field.decl.name, ty);
                for arg in &field.decl.arguments {
                    f = f.argument(input_value(arg)?);
                }
                if let Some(description) = &field.decl.description {
                    f = f.description(description);
                }
                interface = interface.field(f);
            }
            if let Some(description) = &ty.description {
                interface = interface.description(description);
            }
            builder.register(interface)
        }
        TypeKind::Union => {
            let mut union_type = Union::new(&ty.name);
            for member in &ty.members {
                union_type = union_type.possible_type(member);
            }
            if let Some(description) = &ty.description {
                union_type = union_type.description(description);
            }
            builder.register(union_type)
        }
        TypeKind::Enum => {
            let mut e = Enum::new(&ty.name);
            for value in &ty.members {
                e = e.item(value.as_str());
            }
            if let Some(description) = &ty.description {
                e = e.description(description);
            }
            builder.register(e)
        }
        TypeKind::InputObject => {
            let mut input = InputObject::new(&ty.name);
            for field in ty.fields.values() {
                let ty = type_ref(&parse_type(&field.decl.ty)?);
                let mut value = InputValue::new(&field.decl.name, ty);
                if let Some(description) = &field.decl.description {
                    value = value.description(description);
                }
                input = input.field(value);
            }
            if let Some(description) = &ty.description {
                input = input.description(description);
            }
            builder.register(input)
        }
        TypeKind::Scalar if BUILTIN_SCALARS.contains(&ty.name.as_str()) => builder,
        TypeKind::Scalar => {
            let mut scalar = Scalar::new(&ty.name);
            if let Some(description) = &ty.description {
                scalar = scalar.description(description);
            }
            builder.register(scalar)
        }
    };
    Ok(registered)
}

fn root_object(
    merged: &MergedSchema,
    kind: OperationKind,
    ty: &MergedType,
    shapes: &Arc<OutputShapes>,
) -> Result<Object, GraphQLError> {
    let mut object = Object::new(&ty.name);
    for name in ty.fields.keys() {
        let op = merged.operation(kind, name).ok_or_else(|| {
            GraphQLError::Internal(format!("operation {kind}.{name} is not bound"))
        })?;
        let binding = FieldBinding {
            name: op.name().to_string(),
            label: op.label(),
            ty: parse_type(&op.field.ty)?,
            annotation: Some(op.annotation.annotation.clone()),
            resolver: Some(op.resolver.clone()),
            shapes: shapes.clone(),
        };
        let description = op.field.description.as_deref();
        object = object.field(field(binding, description, &op.field.arguments)?);
    }
    Ok(object)
}

fn object(
    merged: &MergedSchema,
    ty: &MergedType,
    shapes: &Arc<OutputShapes>,
) -> Result<Object, GraphQLError> {
    let mut object = Object::new(&ty.name);
    for interface in &ty.implements {
        object = object.implement(interface);
    }
    if let Some(description) = &ty.description {
        object = object.description(description);
    }

    for merged_field in ty.fields.values() {
        let decl = &merged_field.decl;
        let bound = merged.field(&ty.name, &decl.name);
        let binding = FieldBinding {
            name: decl.name.clone(),
            label: format!("{}.{}", ty.name, decl.name),
            ty: parse_type(&decl.ty)?,
            annotation: bound.and_then(|b| b.annotation.clone()),
            resolver: bound.and_then(|b| b.resolver.clone()),
            shapes: shapes.clone(),
        };
        object = object.field(field(binding, decl.description.as_deref(), &decl.arguments)?);
    }
    Ok(object)
}

fn field(
    binding: FieldBinding,
    description: Option<&str>,
    arguments: &[ArgumentDecl],
) -> Result<Field, GraphQLError> {
    let name = binding.name.clone();
    let ty = type_ref(&binding.ty);
    let binding = Arc::new(binding);

    let mut field = Field::new(name, ty, move |ctx| {
        let binding = binding.clone();
        FieldFuture::new(async move { binding.resolve(ctx).await })
    });
    for arg in arguments {
        field = field.argument(input_value(arg)?);
    }
    if let Some(description) = description {
        field = field.description(description);
    }
    Ok(field)
}

fn input_value(arg: &ArgumentDecl) -> Result<InputValue, GraphQLError> {
    let mut value = InputValue::new(&arg.name, type_ref(&parse_type(&arg.ty)?));
    if let Some(default) = &arg.default_value {
        value = value.default_value(default.clone());
    }
    Ok(value)
}

fn parse_type(ty: &str) -> Result<Type, GraphQLError> {
    Type::new(ty).ok_or_else(|| GraphQLError::SchemaBuildFailed(format!("invalid type '{ty}'")))
}

fn type_ref(ty: &Type) -> TypeRef {
    let base = match &ty.base {
        BaseType::Named(name) => TypeRef::Named(name.to_string().into()),
        BaseType::List(inner) => TypeRef::List(Box::new(type_ref(inner))),
    };
    if ty.nullable {
        base
    } else {
        TypeRef::NonNull(Box::new(base))
    }
}

fn parent_json(ctx: &ResolverContext<'_>) -> Option<JsonValue> {
    match ctx.parent_value.as_value() {
        Some(Value::Null) | None => None,
        Some(value) => value.clone().into_json().ok(),
    }
}

fn arguments_json(ctx: &ResolverContext<'_>) -> async_graphql::Result<JsonValue> {
    let mut args = serde_json::Map::new();
    for (name, value) in ctx.args.iter() {
        let json = value
            .as_value()
            .clone()
            .into_json()
            .map_err(|e| GraphQLError::Internal(format!("argument {name}: {e}")).extend())?;
        args.insert(name.to_string(), json);
    }
    Ok(JsonValue::Object(args))
}

/// Converts a resolver's JSON result into a GraphQL value.
pub(crate) fn json_to_graphql_value(json: JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else if let Some(f) = n.as_f64() {
                async_graphql::Number::from_f64(f).map_or(Value::Null, Value::Number)
            } else {
                Value::Null
            }
        }
        JsonValue::String(s) => Value::String(s),
        JsonValue::Array(arr) => Value::List(arr.into_iter().map(json_to_graphql_value).collect()),
        JsonValue::Object(obj) => Value::Object(
            obj.into_iter()
                .map(|(k, v)| (Name::new(k), json_to_graphql_value(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_ref_from_sdl() {
        let ty = parse_type("[Car!]!").unwrap();
        assert_eq!(type_ref(&ty).to_string(), "[Car!]!");
        assert_eq!(type_ref(&parse_type("Int").unwrap()).to_string(), "Int");
        assert!(parse_type("[Car").is_err());
    }

    #[test]
    fn test_json_to_graphql_value() {
        let value = json_to_graphql_value(json!({"id": 1, "tags": ["a"], "ok": true}));
        let Value::Object(obj) = value else {
            panic!("expected object");
        };
        assert_eq!(obj.get("id"), Some(&Value::Number(1.into())));
        assert_eq!(obj.get("tags"), Some(&Value::List(vec![Value::String("a".into())])));
        assert_eq!(obj.get("ok"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn test_shapes_ids_and_enums() {
        let shapes = OutputShapes {
            enums: HashSet::from(["Color".to_string()]),
            abstracts: HashSet::new(),
        };
        let id = shapes
            .shape(Value::Number(7.into()), &parse_type("ID!").unwrap())
            .unwrap();
        assert_eq!(id.as_value(), Some(&Value::String("7".into())));

        let color = shapes
            .shape(Value::String("RED".into()), &parse_type("Color").unwrap())
            .unwrap();
        assert_eq!(color.as_value(), Some(&Value::Enum(Name::new("RED"))));
    }

    #[test]
    fn test_abstract_value_requires_typename() {
        let shapes = OutputShapes {
            enums: HashSet::new(),
            abstracts: HashSet::from(["Vehicle".to_string()]),
        };
        let untyped = json_to_graphql_value(json!({"id": "1"}));
        assert!(shapes.shape(untyped, &parse_type("Vehicle").unwrap()).is_err());

        let typed = json_to_graphql_value(json!({"__typename": "Car", "id": "1"}));
        assert!(shapes.shape(typed, &parse_type("Vehicle").unwrap()).is_ok());
    }

    #[test]
    fn test_list_shape_rejects_scalar() {
        let shapes = OutputShapes::default();
        assert!(shapes
            .shape(Value::Number(1.into()), &parse_type("[Int]").unwrap())
            .is_err());
        assert!(shapes.shape(Value::Null, &parse_type("[Int]").unwrap()).is_ok());
    }
}
