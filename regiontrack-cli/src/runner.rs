//! CLI runner for common setup.
//!
//! Encapsulates configuration loading and logging initialization so command
//! handlers start from the same state.

use std::path::Path;

use regiontrack::config::ConfigFile;
use regiontrack::logging::{init_logging, LoggingGuard, LoggingOptions};
use tracing::info;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Keeps logging active while the runner exists
    logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load the configuration and initialize logging.
    ///
    /// `config_path` overrides `~/.regiontrack/config.ini`. With `debug`, log
    /// lines are mirrored to stdout.
    pub fn new(config_path: Option<&Path>, debug: bool) -> Result<Self, CliError> {
        let config = load_config(config_path)?;

        let logging_guard = init_logging(&LoggingOptions {
            file: config.logging.file.clone(),
            debug,
            stdout: debug,
        })
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!(
            version = regiontrack::VERSION,
            log_file = %self.logging_guard.log_path().display(),
            "regiontrack {} command",
            command
        );
    }
}

/// Load the configuration from `path` or the default location.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::Config(format!(
                    "configuration file '{}' does not exist",
                    path.display()
                )));
            }
            Ok(ConfigFile::load_from(path)?)
        }
        None => Ok(ConfigFile::load()?),
    }
}
