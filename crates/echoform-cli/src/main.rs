//! Echoform CLI - offline renderer and inspector for echoform topologies.

mod commands;
mod wav;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "echoform")]
#[command(author, version, about = "Echoform topology renderer", long_about = None)]
struct Cli {
    /// Increase log detail (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a WAV file through a topology, or render a generator
    Render(commands::render::RenderArgs),

    /// List topologies and their parameters
    Topologies(commands::topologies::TopologiesArgs),

    /// List, show and validate factory presets
    Presets(commands::presets::PresetsArgs),
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Topologies(args) => commands::topologies::run(args),
        Commands::Presets(args) => commands::presets::run(args),
    }
}
