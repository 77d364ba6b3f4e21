use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use weave_schema::{AssemblyConfig, assemble_from_config};

use crate::output::print_success;

pub fn print(config: &AssemblyConfig, output: Option<&Path>) -> Result<()> {
    let assembly = assemble_from_config(config)?;
    let sdl = assembly.definition.to_sdl();

    match output {
        Some(path) => {
            fs::write(path, &sdl).with_context(|| format!("writing {}", path.display()))?;
            print_success(&format!("Merged SDL written to {}", path.display()));
        }
        None => print!("{sdl}"),
    }
    Ok(())
}
