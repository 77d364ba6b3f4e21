use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "weave")]
#[command(about = "Weave: assemble, check and scaffold per-domain GraphQL schema fragments")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file
    #[arg(short, long, global = true, env = "WEAVE_CONFIG", default_value = "weave.toml")]
    pub config: String,

    /// Fragment root directory (overrides assembly.root)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Persistence schema file (overrides assembly.persistence_schema)
    #[arg(short, long, global = true)]
    pub persistence: Option<PathBuf>,

    /// Log level (overrides logging.level)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover, validate and merge fragments, then build the executable schema
    Check,
    /// Print the merged SDL
    Print(PrintArgs),
    /// List every operation with its owning domain and effective annotation
    Operations(OperationsArgs),
    /// Generate fragments from the persistence model
    Generate(GenerateArgs),
    /// Inspect configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct PrintArgs {
    /// Write the SDL to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct OperationsArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(clap::Args)]
pub struct GenerateArgs {
    #[command(subcommand)]
    pub command: GenerateCommands,
}

#[derive(Subcommand)]
pub enum GenerateCommands {
    /// Scaffold an SDL fragment for a persistence model (e.g. Car)
    Sdl(SdlArgs),
}

#[derive(clap::Args)]
pub struct SdlArgs {
    /// Persistence model name
    pub model: String,
    /// Write `<domain>.sdl` into the fragment root instead of printing
    #[arg(long)]
    pub write: bool,
    /// Overwrite an existing fragment file
    #[arg(long, requires = "write")]
    pub force: bool,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
}
