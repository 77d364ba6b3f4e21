//! # weave-graphql
//!
//! Runtime half of the Weave schema assembly service.
//!
//! `weave-schema` produces a merged definition from per-domain SDL
//! fragments. This crate binds each operation to the resolver of the domain
//! that declared it, gates every call on its access annotation, and exposes
//! the result as an async-graphql dynamic schema.
//!
//! ## Overview
//!
//! ```text
//! build_schema ──► MergedSchema ──► ExecutableSchema ──► SchemaService
//!  (discover, pair,   (bound ops,      (async-graphql      (credential ─►
//!   validate, merge)   annotations)     dynamic schema)     RequestAuth)
//! ```
//!
//! Operations without an explicit annotation require authentication.
//!
//! ## Configuration
//!
//! Add to `weave.toml`:
//!
//! ```toml
//! [graphql]
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! batching = false
//! ```
//!
//! ## Modules
//!
//! - [`resolver`] - Resolver trait, fragments and registry
//! - [`binder`] - Operation binding and the bound [`MergedSchema`]
//! - [`gate`] - Request-time access checks
//! - [`identity`] - Identities and credential validation
//! - [`executable`] - async-graphql schema construction and execution
//! - [`service`] - Per-request entry point
//! - [`error`] - Error types for GraphQL operations

pub mod assembly;
pub mod binder;
pub mod config;
pub mod error;
pub mod executable;
pub mod gate;
pub mod identity;
pub mod resolver;
pub mod service;

// Re-export main types
pub use assembly::{SchemaAssembly, build_schema};
pub use binder::{
    BoundField, BoundOperation, MergedSchema, ResolverBinder, ensure_resolver_fragments,
};
pub use config::GraphQLConfig;
pub use error::GraphQLError;
pub use executable::ExecutableSchema;
pub use gate::{AccessError, AccessGate};
pub use identity::{
    CredentialCheck, CredentialValidator, Identity, RequestAuth, StaticTokenValidator,
};
pub use resolver::{
    DynResolver, ExecutionContext, Resolver, ResolverError, ResolverFragment, ResolverRegistry,
    resolver_fn,
};
pub use service::SchemaService;

/// Result type for GraphQL operations.
pub type Result<T> = std::result::Result<T, GraphQLError>;
