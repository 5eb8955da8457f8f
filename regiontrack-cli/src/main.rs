//! regiontrack CLI - command-line interface
//!
//! This binary drives the in-vehicle region display from the regiontrack
//! library.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod error;
mod runner;

use commands::config::ConfigCommands;
use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "regiontrack")]
#[command(version = regiontrack::VERSION)]
#[command(about = "Region resolution and live map display for moving vehicles", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.regiontrack/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the live display loop
    Run {
        /// Enable debug logging
        #[arg(long)]
        debug: bool,

        /// Replay the built-in demo route instead of the configured source
        #[arg(long)]
        replay: bool,

        /// Stop after this many streaming ticks
        #[arg(long)]
        ticks: Option<u64>,
    },

    /// Print the region containing a point
    Resolve {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Build the region index and write its cache file
    BuildIndex {
        /// Ignore an existing cache and parse the dataset
        #[arg(long)]
        force: bool,

        /// Enable debug logging
        #[arg(long)]
        debug: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run {
            debug,
            replay,
            ticks,
        } => commands::run::run(
            config_path,
            RunArgs {
                debug,
                replay,
                ticks,
            },
        ),
        Commands::Resolve { lat, lon } => commands::resolve::run(config_path, lat, lon),
        Commands::BuildIndex { force, debug } => {
            commands::build_index::run(config_path, force, debug)
        }
        Commands::Config { command } => commands::config::run(command, config_path),
    };

    if let Err(e) = result {
        e.exit();
    }
}
