//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use regiontrack::config::ConfigFileError;
use regiontrack::display::DisplayError;
use regiontrack::live::LiveLoopError;
use regiontrack::location::LocationError;
use regiontrack::region::{DatasetError, RegionError};

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Configuration file could not be read or written
    ConfigFile(ConfigFileError),
    /// Boundary dataset could not be loaded
    Dataset(DatasetError),
    /// Region lookup failed
    Region(RegionError),
    /// Display sink could not be created
    Display(DisplayError),
    /// Fix source could not be opened
    FixSource { path: PathBuf, error: LocationError },
    /// Async runtime could not be started
    Runtime(std::io::Error),
    /// The live loop stopped with a fatal error
    LiveLoop(LiveLoopError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Dataset(DatasetError::Read { .. }) => {
                eprintln!();
                eprintln!("Set the boundary dataset in the configuration file:");
                eprintln!("  [region]");
                eprintln!("  dataset = /path/to/regions.geojson");
                eprintln!();
                eprintln!("Run 'regiontrack config path' to locate the file.");
            }
            CliError::LiveLoop(LiveLoopError::NotReady { .. }) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. Dataset missing or unreadable: check [region] dataset");
                eprintln!("  2. No location fixes: check [feed] source, or try --replay");
                eprintln!("  3. Slow startup: raise [readiness] deadline_secs");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Dataset(e) => write!(f, "Failed to load regions: {}", e),
            CliError::Region(e) => write!(f, "Region lookup failed: {}", e),
            CliError::Display(e) => write!(f, "Failed to open display: {}", e),
            CliError::FixSource { path, error } => {
                write!(f, "Failed to open fix source '{}': {}", path.display(), error)
            }
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::LiveLoop(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Dataset(e) => Some(e),
            CliError::Region(e) => Some(e),
            CliError::Display(e) => Some(e),
            CliError::FixSource { error, .. } => Some(error),
            CliError::Runtime(e) => Some(e),
            CliError::LiveLoop(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<DatasetError> for CliError {
    fn from(e: DatasetError) -> Self {
        CliError::Dataset(e)
    }
}

impl From<RegionError> for CliError {
    fn from(e: RegionError) -> Self {
        CliError::Region(e)
    }
}

impl From<LiveLoopError> for CliError {
    fn from(e: LiveLoopError) -> Self {
        CliError::LiveLoop(e)
    }
}
