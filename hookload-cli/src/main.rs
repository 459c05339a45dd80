use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "hookload", about = "Load and validate hookload plugin units")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a plugin file against an extension point
    Check(commands::check::CheckArgs),
    /// Print resolved storage roots
    Paths(commands::paths::PathsArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Check(args) => commands::check::run(args),
        Commands::Paths(args) => commands::paths::run(args),
    }
}
