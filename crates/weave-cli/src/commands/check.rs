use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use weave_graphql::{ResolverError, ResolverFragment, ResolverRegistry, SchemaAssembly};
use weave_schema::{AnnotationSource, BuildError, SchemaFragment, assemble_from_config};

use crate::config::AppConfig;
use crate::output::print_success;

/// Runs the full build with a stand-in resolver for every declared
/// operation, so binding and executable schema construction are checked
/// without the host service's resolvers.
pub fn check(config: &AppConfig) -> Result<()> {
    let assembly = assemble_from_config(&config.assembly)?;
    let registry = stand_in_registry(&assembly.fragments)?;

    let executable = SchemaAssembly::from_config(&config.assembly)
        .resolvers(registry)
        .build_executable(&config.graphql)?;
    let merged = executable.merged();

    let operations: Vec<_> = merged.operations().collect();
    let defaulted = operations
        .iter()
        .filter(|op| op.annotation.source == AnnotationSource::Default)
        .count();

    print_success(&format!(
        "{} fragment(s), {} type(s), {} operation(s) assembled from {}",
        assembly.fragments.len(),
        merged.definition().types().count(),
        operations.len(),
        config.assembly.root.display()
    ));
    if config.assembly.persistence_schema.is_none() {
        println!("  {}", "naming validation skipped: no persistence schema".dimmed());
    }
    if defaulted > 0 {
        println!(
            "  {}",
            format!("{defaulted} operation(s) use the default @requireAuth").dimmed()
        );
    }
    Ok(())
}

fn stand_in_registry(fragments: &[SchemaFragment]) -> Result<ResolverRegistry, BuildError> {
    let mut registry = ResolverRegistry::new();
    for fragment in fragments.iter().filter(|f| f.declares_operations()) {
        let mut resolvers = ResolverFragment::new(fragment.domain());
        for (kind, field) in fragment.operations() {
            let label = Arc::new(format!("{kind}.{}", field.name));
            resolvers = resolvers.operation(field.name.clone(), move |_, _| {
                let label = label.clone();
                async move {
                    Err(ResolverError::new(format!(
                        "{label} is only resolvable inside the host service"
                    )))
                }
            });
        }
        registry.register(resolvers)?;
    }
    Ok(registry)
}
