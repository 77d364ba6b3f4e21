//! Declarative half of the build pipeline: discovery, naming validation and
//! merge. Resolver binding happens on top of the resulting [`Assembly`].

use tracing::info;

use crate::config::AssemblyConfig;
use crate::error::BuildError;
use crate::fragment::SchemaFragment;
use crate::loader::FragmentLoader;
use crate::merger::{MergedDefinition, SchemaMerger};
use crate::model::PersistenceSchema;
use crate::naming::validate_naming;

/// Validated fragments and their merged definition.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub fragments: Vec<SchemaFragment>,
    pub definition: MergedDefinition,
}

/// Validates naming (when a persistence schema is given) and merges.
///
/// # Errors
///
/// Returns [`BuildError::NamingMismatch`], [`BuildError::SchemaConflict`] or
/// [`BuildError::Discovery`].
pub fn assemble(
    fragments: Vec<SchemaFragment>,
    persistence: Option<&PersistenceSchema>,
    computed_directive: &str,
) -> Result<Assembly, BuildError> {
    if let Some(persistence) = persistence {
        validate_naming(&fragments, persistence, computed_directive)?;
    }
    let definition = SchemaMerger::merge(&fragments)?;
    Ok(Assembly {
        fragments,
        definition,
    })
}

/// Discovers fragments under `config.root`, loads the configured
/// persistence schema and assembles them.
///
/// # Errors
///
/// Returns any build-time error except [`BuildError::UnboundOperation`].
pub fn assemble_from_config(config: &AssemblyConfig) -> Result<Assembly, BuildError> {
    config.validate().map_err(BuildError::discovery)?;
    let fragments = FragmentLoader::new(&config.root).discover()?;
    let persistence = config.load_persistence()?;
    let assembly = assemble(fragments, persistence.as_ref(), &config.computed_directive)?;
    info!(
        root = %config.root.display(),
        naming_validated = persistence.is_some(),
        "Schema definition assembled"
    );
    Ok(assembly)
}
