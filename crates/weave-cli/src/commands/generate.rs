use std::fs;

use anyhow::{Context, Result, bail};
use weave_schema::naming::SDL_SUFFIXES;
use weave_schema::{AssemblyConfig, SchemaFragment, scaffold_sdl};

use crate::cli::SdlArgs;
use crate::output::print_success;

pub fn sdl(config: &AssemblyConfig, args: &SdlArgs) -> Result<()> {
    let persistence = config.load_persistence()?.context(
        "no persistence schema configured (set assembly.persistence_schema or pass --persistence)",
    )?;
    let Some(model) = persistence.model(&args.model) else {
        let known: Vec<&str> = persistence.models().map(|m| m.name.as_str()).collect();
        bail!("model '{}' not found; known models: {}", args.model, known.join(", "));
    };

    let fragment = scaffold_sdl(model, &persistence);
    SchemaFragment::parse(&fragment.domain, &fragment.sdl)
        .context("generated SDL does not parse")?;

    if !args.write {
        print!("{}", fragment.sdl);
        return Ok(());
    }

    if !args.force {
        for suffix in SDL_SUFFIXES {
            let existing = config.root.join(format!("{}{suffix}", fragment.domain));
            if existing.exists() {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    existing.display()
                );
            }
        }
    }

    fs::create_dir_all(&config.root)
        .with_context(|| format!("creating {}", config.root.display()))?;
    let path = config.root.join(&fragment.file_name);
    fs::write(&path, &fragment.sdl).with_context(|| format!("writing {}", path.display()))?;
    print_success(&format!(
        "Scaffolded {} for model {}",
        path.display(),
        model.name
    ));
    Ok(())
}
