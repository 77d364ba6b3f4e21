mod cli;
mod commands;
mod config;
mod observability;
mod output;

use std::io::ErrorKind;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use weave_graphql::GraphQLError;
use weave_schema::BuildError;

use cli::{Cli, Commands, ConfigCommands, GenerateCommands};
use config::AppConfig;
use output::{print_build_error, print_error, print_graphql_error};

#[tokio::main]
async fn main() {
    // Load .env file if present; a missing file is not an error.
    if let Err(e) = dotenvy::dotenv()
        && !matches!(&e, dotenvy::Error::Io(io_err) if io_err.kind() == ErrorKind::NotFound)
    {
        output::print_warning(&format!("Failed to load .env file: {e}"));
    }

    observability::init_tracing();

    if let Err(e) = run().await {
        if let Some(build) = e.downcast_ref::<BuildError>() {
            print_build_error(build);
        } else if let Some(graphql) = e.downcast_ref::<GraphQLError>() {
            print_graphql_error(graphql);
        } else {
            print_error(&format!("{e:#}"));
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = resolve_config(&cli)?;
    tracing::debug!(
        config = %cli.config,
        root = %cfg.assembly.root.display(),
        "Configuration loaded"
    );

    match &cli.command {
        Commands::Check => commands::check::check(&cfg)?,
        Commands::Print(args) => commands::print::print(&cfg.assembly, args.output.as_deref())?,
        Commands::Operations(args) => commands::operations::operations(&cfg.assembly, args.format)?,
        Commands::Generate(args) => match &args.command {
            GenerateCommands::Sdl(sdl_args) => commands::generate::sdl(&cfg.assembly, sdl_args)?,
        },
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => {
                println!("{}: {}", "Config file".cyan(), cli.config);
                println!("{}", toml::to_string_pretty(&cfg)?);
            }
        },
    }
    Ok(())
}

/// File and environment configuration with command-line overrides applied.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut cfg = config::loader::load_config(Some(&cli.config))
        .map_err(anyhow::Error::msg)
        .context("Configuration error")?;

    if let Some(root) = &cli.root {
        cfg.assembly.root = root.clone();
    }
    if let Some(persistence) = &cli.persistence {
        cfg.assembly.persistence_schema = Some(persistence.clone());
    }
    if let Some(level) = &cli.log_level {
        cfg.logging.level = level.clone();
    }

    observability::apply_logging_level(&cfg.logging.level);
    Ok(cfg)
}
