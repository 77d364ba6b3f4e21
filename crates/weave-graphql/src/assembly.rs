//! Full build pipeline: discovery, resolver pairing, naming validation,
//! merge and binding.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;
use weave_schema::{
    AssemblyConfig, BuildError, FragmentLoader, PersistenceSchema, SchemaFragment, assemble,
};

use crate::binder::{MergedSchema, ResolverBinder, ensure_resolver_fragments};
use crate::config::GraphQLConfig;
use crate::error::GraphQLError;
use crate::executable::ExecutableSchema;
use crate::resolver::ResolverRegistry;

const DEFAULT_COMPUTED_DIRECTIVE: &str = "computed";

/// Builds the merged schema for the fragments under `root`.
///
/// # Errors
///
/// Returns the first fatal [`BuildError`]: discovery, naming mismatch,
/// schema conflict or unbound operations.
pub fn build_schema(
    root: impl AsRef<Path>,
    registry: &ResolverRegistry,
    persistence: Option<&PersistenceSchema>,
) -> Result<MergedSchema, BuildError> {
    let fragments = FragmentLoader::new(root.as_ref()).discover()?;
    bind_fragments(fragments, registry, persistence, DEFAULT_COMPUTED_DIRECTIVE)
}

fn bind_fragments(
    fragments: Vec<SchemaFragment>,
    registry: &ResolverRegistry,
    persistence: Option<&PersistenceSchema>,
    computed_directive: &str,
) -> Result<MergedSchema, BuildError> {
    ensure_resolver_fragments(&fragments, registry)?;
    let fragment_count = fragments.len();
    let assembly = assemble(fragments, persistence, computed_directive)?;
    let schema = ResolverBinder::new(registry).bind(assembly.definition)?;
    info!(
        fragments = fragment_count,
        resolver_fragments = registry.len(),
        "Schema assembled"
    );
    Ok(schema)
}

/// Builder over [`build_schema`] that also accepts in-memory fragments and
/// a configured persistence schema path.
///
/// ```ignore
/// let schema = SchemaAssembly::new()
///     .root("api/src/graphql")
///     .resolvers(registry)
///     .persistence(PersistenceSchema::load(Path::new("api/db/schema.prisma"))?)
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct SchemaAssembly {
    root: Option<PathBuf>,
    persistence_path: Option<PathBuf>,
    computed_directive: Option<String>,
    fragments: Vec<SchemaFragment>,
    registry: ResolverRegistry,
    persistence: Option<PersistenceSchema>,
}

impl SchemaAssembly {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes root, persistence schema path and computed directive from
    /// configuration.
    #[must_use]
    pub fn from_config(config: &AssemblyConfig) -> Self {
        Self {
            root: Some(config.root.clone()),
            persistence_path: config.persistence_schema.clone(),
            computed_directive: Some(config.computed_directive.clone()),
            ..Self::default()
        }
    }

    /// Directory searched for fragment files.
    #[must_use]
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Adds a fragment that does not live on disk.
    #[must_use]
    pub fn fragment(mut self, fragment: SchemaFragment) -> Self {
        self.fragments.push(fragment);
        self
    }

    /// Parses and adds an in-memory fragment.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Discovery`] if the SDL does not parse.
    pub fn fragment_source(self, domain: &str, sdl: &str) -> Result<Self, BuildError> {
        Ok(self.fragment(SchemaFragment::parse(domain, sdl)?))
    }

    #[must_use]
    pub fn resolvers(mut self, registry: ResolverRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Persistence schema used for naming validation. Takes precedence over
    /// a configured path.
    #[must_use]
    pub fn persistence(mut self, schema: PersistenceSchema) -> Self {
        self.persistence = Some(schema);
        self
    }

    /// Runs the pipeline. Discovered fragments come first, in discovery
    /// order, followed by in-memory fragments in insertion order.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`BuildError`].
    pub fn build(self) -> Result<MergedSchema, BuildError> {
        let mut fragments = match &self.root {
            Some(root) => FragmentLoader::new(root).discover()?,
            None => Vec::new(),
        };
        for fragment in self.fragments {
            if fragments.iter().any(|f| f.domain() == fragment.domain()) {
                return Err(BuildError::discovery(format!(
                    "domain '{}' has more than one schema fragment",
                    fragment.domain()
                )));
            }
            fragments.push(fragment);
        }

        let persistence = match (self.persistence, &self.persistence_path) {
            (Some(schema), _) => Some(schema),
            (None, Some(path)) => Some(PersistenceSchema::load(path)?),
            (None, None) => None,
        };
        let computed = self
            .computed_directive
            .as_deref()
            .unwrap_or(DEFAULT_COMPUTED_DIRECTIVE);

        bind_fragments(fragments, &self.registry, persistence.as_ref(), computed)
    }

    /// Runs the pipeline and builds an executable schema from the result.
    ///
    /// # Errors
    ///
    /// Returns [`GraphQLError::Build`] or [`GraphQLError::SchemaBuildFailed`].
    pub fn build_executable(
        self,
        config: &GraphQLConfig,
    ) -> Result<ExecutableSchema, GraphQLError> {
        let schema = self.build()?;
        ExecutableSchema::build(Arc::new(schema), config)
    }
}
