//! Resolver functions and resolver fragments.
//!
//! A resolver fragment is the service side of a domain: a map from
//! operation name to resolver, plus optional `Type.field` resolvers for
//! nested fields. Fragments are registered under their domain name in a
//! [`ResolverRegistry`].
//!
//! # Example
//!
//! ```ignore
//! let cars = ResolverFragment::new("car")
//!     .operation("cars", |_args, _ctx| async move {
//!         Ok(serde_json::json!([{ "id": 1, "make": "Volvo" }]))
//!     })
//!     .field("Car", "owner", |_args, ctx| async move {
//!         Ok(ctx.parent.unwrap_or_default()["owner"].clone())
//!     });
//!
//! let registry = ResolverRegistry::new().with(cars)?;
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use weave_schema::BuildError;

use crate::identity::Identity;

/// Everything a resolver sees about the current call.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Verified caller, `None` for unauthenticated requests.
    pub identity: Option<Identity>,
    /// `Type.field` being resolved, e.g. `Query.cars`.
    pub operation: String,
    /// Parent object for nested field resolvers.
    pub parent: Option<JsonValue>,
}

/// Domain error returned by a resolver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ResolverError {
    pub message: String,
    pub code: String,
}

impl ResolverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: "RESOLVER_ERROR".to_string(),
        }
    }

    pub fn not_found(what: impl fmt::Display) -> Self {
        Self::new(format!("{what} not found")).with_code("NOT_FOUND")
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(message).with_code("BAD_USER_INPUT")
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }
}

/// A function providing data for one operation or field.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolves with the call's arguments as a JSON object.
    async fn resolve(
        &self,
        args: JsonValue,
        ctx: &ExecutionContext,
    ) -> Result<JsonValue, ResolverError>;
}

/// Shared resolver handle.
pub type DynResolver = Arc<dyn Resolver>;

/// Adapter turning an async closure into a [`Resolver`].
pub struct FnResolver<F>(F);

#[async_trait]
impl<F, Fut> Resolver for FnResolver<F>
where
    F: Fn(JsonValue, ExecutionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<JsonValue, ResolverError>> + Send + 'static,
{
    async fn resolve(
        &self,
        args: JsonValue,
        ctx: &ExecutionContext,
    ) -> Result<JsonValue, ResolverError> {
        (self.0)(args, ctx.clone()).await
    }
}

/// Wraps an async closure as a shared resolver.
pub fn resolver_fn<F, Fut>(f: F) -> DynResolver
where
    F: Fn(JsonValue, ExecutionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<JsonValue, ResolverError>> + Send + 'static,
{
    Arc::new(FnResolver(f))
}

/// One domain's resolvers.
#[derive(Clone)]
pub struct ResolverFragment {
    domain: String,
    operations: IndexMap<String, DynResolver>,
    fields: IndexMap<String, DynResolver>,
}

impl ResolverFragment {
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            operations: IndexMap::new(),
            fields: IndexMap::new(),
        }
    }

    /// Registers a resolver for a root operation.
    #[must_use]
    pub fn with_operation(mut self, name: impl Into<String>, resolver: DynResolver) -> Self {
        self.operations.insert(name.into(), resolver);
        self
    }

    /// Registers an async closure for a root operation.
    #[must_use]
    pub fn operation<F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(JsonValue, ExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<JsonValue, ResolverError>> + Send + 'static,
    {
        self.with_operation(name, resolver_fn(f))
    }

    /// Registers a resolver for a nested `type_name.field` field.
    #[must_use]
    pub fn with_field_resolver(
        mut self,
        type_name: &str,
        field: &str,
        resolver: DynResolver,
    ) -> Self {
        self.fields.insert(format!("{type_name}.{field}"), resolver);
        self
    }

    /// Registers an async closure for a nested field.
    #[must_use]
    pub fn field<F, Fut>(self, type_name: &str, field: &str, f: F) -> Self
    where
        F: Fn(JsonValue, ExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<JsonValue, ResolverError>> + Send + 'static,
    {
        self.with_field_resolver(type_name, field, resolver_fn(f))
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    #[must_use]
    pub fn get_operation(&self, name: &str) -> Option<&DynResolver> {
        self.operations.get(name)
    }

    #[must_use]
    pub fn get_field_resolver(&self, type_name: &str, field: &str) -> Option<&DynResolver> {
        self.fields.get(&format!("{type_name}.{field}"))
    }

    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    /// Registered nested field keys, formatted `Type.field`.
    pub fn field_keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl fmt::Debug for ResolverFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverFragment")
            .field("domain", &self.domain)
            .field("operations", &self.operations.keys().collect::<Vec<_>>())
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// All resolver fragments, keyed by domain.
#[derive(Debug, Clone, Default)]
pub struct ResolverRegistry {
    fragments: IndexMap<String, ResolverFragment>,
}

impl ResolverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fragment.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Discovery`] if the domain is already registered.
    pub fn register(&mut self, fragment: ResolverFragment) -> Result<(), BuildError> {
        if self.fragments.contains_key(fragment.domain()) {
            return Err(BuildError::discovery(format!(
                "resolver fragment for domain '{}' registered twice",
                fragment.domain()
            )));
        }
        self.fragments.insert(fragment.domain().to_string(), fragment);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Discovery`] if the domain is already registered.
    pub fn with(mut self, fragment: ResolverFragment) -> Result<Self, BuildError> {
        self.register(fragment)?;
        Ok(self)
    }

    #[must_use]
    pub fn get(&self, domain: &str) -> Option<&ResolverFragment> {
        self.fragments.get(domain)
    }

    pub fn fragments(&self) -> impl Iterator<Item = &ResolverFragment> {
        self.fragments.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_closure_resolver_receives_args_and_context() {
        let fragment = ResolverFragment::new("car").operation("car", |args, ctx| async move {
            Ok(json!({
                "id": args["id"],
                "caller": ctx.identity.map(|i| i.subject),
            }))
        });

        let resolver = fragment.get_operation("car").unwrap();
        let ctx = ExecutionContext {
            identity: Some(Identity::new("ada")),
            operation: "Query.car".into(),
            parent: None,
        };
        let value = resolver.resolve(json!({"id": 7}), &ctx).await.unwrap();
        assert_eq!(value, json!({"id": 7, "caller": "ada"}));
    }

    #[test]
    fn test_field_resolver_keys() {
        let fragment = ResolverFragment::new("car")
            .field("Car", "owner", |_, _| async { Ok(JsonValue::Null) });
        assert!(fragment.get_field_resolver("Car", "owner").is_some());
        assert!(fragment.get_field_resolver("Car", "make").is_none());
        assert_eq!(fragment.field_keys().collect::<Vec<_>>(), ["Car.owner"]);
    }

    #[test]
    fn test_duplicate_domain_rejected() {
        let registry = ResolverRegistry::new()
            .with(ResolverFragment::new("car"))
            .unwrap();
        let err = registry.with(ResolverFragment::new("car")).unwrap_err();
        assert!(matches!(err, BuildError::Discovery { .. }));
    }

    #[test]
    fn test_resolver_error_codes() {
        assert_eq!(ResolverError::not_found("Car 7").to_string(), "Car 7 not found");
        assert_eq!(ResolverError::not_found("Car 7").code, "NOT_FOUND");
        assert_eq!(ResolverError::invalid("bad").code, "BAD_USER_INPUT");
    }
}
