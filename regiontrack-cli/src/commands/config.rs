//! Configuration management CLI commands.
//!
//! Provides `config init`, `config path` and `config show`.

use std::path::Path;

use clap::Subcommand;
use regiontrack::config::{config_file_path, ConfigFile};

use crate::error::CliError;
use crate::runner::load_config;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Create the configuration file with defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the configuration file path
    Path,

    /// Print the effective configuration
    Show,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);

    match command {
        ConfigCommands::Init { force } => run_init(&path, force),
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Show => run_show(config_path),
    }
}

fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if force {
        ConfigFile::default().save_to(path)?;
    } else if !ConfigFile::ensure_exists_at(path)? {
        println!("Configuration already exists: {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    println!("Created {}", path.display());
    Ok(())
}

fn run_show(config_path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config_path)?;

    println!("[region]");
    println!("dataset = {}", config.region.dataset.display());
    println!("name_property = {}", config.region.name_property);
    println!("cell_degrees = {}", config.region.cell_degrees);
    println!("cache_file = {}", config.cache_file().display());
    println!();
    println!("[readiness]");
    println!("poll_interval_ms = {}", config.readiness.poll_interval_ms);
    println!("deadline_secs = {}", config.readiness.deadline_secs);
    println!("check_deadline_secs = {}", config.readiness.check_deadline_secs);
    println!();
    println!("[feed]");
    println!("source = {}", config.feed.source);
    if let Some(path) = &config.feed.path {
        println!("path = {}", path.display());
    }
    println!("replay_interval_ms = {}", config.feed.replay_interval_ms);
    println!("replay_loop = {}", config.feed.replay_loop);
    println!();
    println!("[viewport]");
    println!("zoom = {}", config.viewport.zoom);
    println!("dpi = {}", config.viewport.dpi);
    println!("margin = {}", config.viewport.margin);
    println!("size = {}x{}", config.viewport.width, config.viewport.height);
    println!("tile_url = {}", config.viewport.tile_url);
    println!("render_timeout_ms = {}", config.viewport.render_timeout_ms);
    println!();
    println!("[live]");
    println!("tick_interval_ms = {}", config.live.tick_interval_ms);
    println!();
    println!("[display]");
    println!("kind = {}", config.display.kind);
    println!("output_dir = {}", config.display.output_dir.display());
    if let Some(path) = &config.display.loading_sequence {
        println!("loading_sequence = {}", path.display());
    }
    println!("frame_duration_ms = {}", config.display.frame_duration_ms);
    println!();
    println!("[logging]");
    println!("file = {}", config.logging.file.display());

    Ok(())
}
