//! Stencil — keep generated project files and their blueprints in step.
//!
//! # Usage
//!
//! ```text
//! stencil init --param KEY=VALUE...
//! stencil sync status | list | make <path> [--force] | rm-temp <path>
//! stencil sync run [pattern...] [--dry-run] [--force] [--backup] [--format]
//! stencil sync diff [pattern...]
//! stencil tmpl status | make <path> | sync [pattern...] | list-new
//! stencil tmpl trans <path>... [--into <container>] [--format]
//! stencil registry build | verify | repair
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    init::InitArgs, registry::RegistryCommand, sync::SyncCommand, tmpl::TmplCommand,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stencil",
    version,
    about = "Fold edits to generated files back into the blueprints that produced them",
    long_about = None,
)]
struct Cli {
    /// Project root (defaults to the current directory).
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record the project parameters used to expand blueprints.
    Init(InitArgs),

    /// Track artifacts and sync their edits back into containers.
    Sync {
        #[command(subcommand)]
        command: SyncCommand,
    },

    /// Manage ad-hoc (make-tracked) blueprints.
    Tmpl {
        #[command(subcommand)]
        command: TmplCommand,
    },

    /// Rebuild or check the aggregate command registry.
    Registry {
        #[command(subcommand)]
        command: RegistryCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => args.run(&cli.root),
        Commands::Sync { command } => commands::sync::run(&cli.root, command),
        Commands::Tmpl { command } => commands::tmpl::run(&cli.root, command),
        Commands::Registry { command } => commands::registry::run(&cli.root, command),
    }
}
