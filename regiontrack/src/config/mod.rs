//! Configuration for regiontrack.
//!
//! The user configuration lives in `~/.regiontrack/config.ini`. Every key has
//! a default, so a missing file or section is never an error; an unparseable
//! value is reported as [`ConfigFileError::InvalidValue`].
//!
//! # Example
//!
//! ```
//! use regiontrack::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! let live = config.live_loop_config();
//! assert_eq!(live.dpi, 200);
//! ```

mod components;
mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{
    config_directory, config_file_path, default_cache_file, ConfigFileError,
};
pub use settings::{
    ConfigFile, DisplayKind, DisplaySettings, FeedSettings, FeedSourceKind, LiveSettings,
    LoggingSettings, ReadinessSettings, RegionSettings, ViewportSettings,
};
