//! # weave-schema
//!
//! Declarative core of the Weave schema assembly service.
//!
//! Each domain (e.g. `car`) contributes a GraphQL SDL fragment named
//! `car.sdl`. This crate discovers those fragments, checks them against the
//! persistence model by naming convention, and merges them into a single
//! definition with conflict detection.
//!
//! ## Pipeline
//!
//! ```text
//! FragmentLoader ──► validate_naming ──► SchemaMerger ──► MergedDefinition
//!   (<domain>.sdl)    (PersistenceSchema)  (conflict-detecting union)
//! ```
//!
//! Resolver binding and request-time access checks live in `weave-graphql`.
//!
//! ## Modules
//!
//! - [`loader`] - Fragment discovery on disk
//! - [`fragment`] - SDL parsing into declarations
//! - [`naming`] - Domain naming conventions and model validation
//! - [`model`] - Persistence model schema (Prisma, TOML, JSON)
//! - [`merger`] - Conflict-detecting merge
//! - [`annotation`] - `@requireAuth` / `@skipAuth` markers
//! - [`scaffold`] - SDL generation from a persistence model
//! - [`error`] - Build-time error taxonomy

pub mod annotation;
pub mod assembly;
pub mod config;
pub mod error;
pub mod fragment;
pub mod loader;
pub mod merger;
pub mod model;
pub mod naming;
pub mod operation;
mod printer;
pub mod scaffold;

pub use annotation::{AccessAnnotation, AnnotationSource, EffectiveAnnotation};
pub use assembly::{Assembly, assemble, assemble_from_config};
pub use config::AssemblyConfig;
pub use error::{BuildError, FieldMismatch, UnboundOperation};
pub use fragment::{ArgumentDecl, DirectiveDecl, FieldDecl, SchemaFragment, TypeDecl, TypeKind};
pub use loader::FragmentLoader;
pub use merger::{MergedDefinition, MergedField, MergedType, Operation, SchemaMerger};
pub use model::{ModelField, PersistenceModel, PersistenceSchema};
pub use naming::{FragmentNames, validate_naming};
pub use operation::OperationKind;
pub use scaffold::{ScaffoldedFragment, scaffold_sdl};

/// Result type for schema assembly.
pub type Result<T> = std::result::Result<T, BuildError>;
