//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub region: RegionSettings,
    pub readiness: ReadinessSettings,
    pub feed: FeedSettings,
    pub viewport: ViewportSettings,
    pub live: LiveSettings,
    pub display: DisplaySettings,
    pub logging: LoggingSettings,
}

/// Boundary dataset and index cache.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSettings {
    /// GeoJSON FeatureCollection with region boundaries
    pub dataset: PathBuf,
    /// Feature property holding the region name
    pub name_property: String,
    /// Grid cell size in degrees
    pub cell_degrees: f64,
    /// Index cache file; `None` means `<config dir>/region_index.cache`
    pub cache_file: Option<PathBuf>,
}

/// Readiness polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessSettings {
    pub poll_interval_ms: u64,
    /// Deadline for the startup phase
    pub deadline_secs: u64,
    /// Deadline for the fix/cache check
    pub check_deadline_secs: u64,
}

/// Where fixes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSourceKind {
    /// Built-in demo route
    Replay,
    /// `lat,lon[,speed]` lines on stdin
    Stdin,
    /// `lat,lon[,speed]` lines from `[feed] path`
    File,
}

impl FeedSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedSourceKind::Replay => "replay",
            FeedSourceKind::Stdin => "stdin",
            FeedSourceKind::File => "file",
        }
    }
}

impl FromStr for FeedSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replay" => Ok(FeedSourceKind::Replay),
            "stdin" => Ok(FeedSourceKind::Stdin),
            "file" => Ok(FeedSourceKind::File),
            other => Err(format!("unknown feed source '{}'", other)),
        }
    }
}

impl fmt::Display for FeedSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location feed settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSettings {
    pub source: FeedSourceKind,
    /// Fix file, required when `source = file`
    pub path: Option<PathBuf>,
    /// Delay between replayed fixes
    pub replay_interval_ms: u64,
    /// Restart the replay route when it ends
    pub replay_loop: bool,
}

/// Viewport and map rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportSettings {
    /// Half extent of a recentred viewport, in degrees
    pub zoom: f64,
    pub dpi: u32,
    /// Fraction of the half extent kept clear before recentring
    pub margin: f64,
    /// Image width in pixels at 100 dpi
    pub width: u32,
    /// Image height in pixels at 100 dpi
    pub height: u32,
    pub tile_url: String,
    pub render_timeout_ms: u64,
}

/// Streaming loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSettings {
    pub tick_interval_ms: u64,
}

/// Display sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayKind {
    /// Log every display call
    Log,
    /// Write map and status files into `output_dir`
    Frames,
    /// Discard output
    None,
}

impl DisplayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayKind::Log => "log",
            DisplayKind::Frames => "frames",
            DisplayKind::None => "none",
        }
    }
}

impl FromStr for DisplayKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "log" => Ok(DisplayKind::Log),
            "frames" => Ok(DisplayKind::Frames),
            "none" => Ok(DisplayKind::None),
            other => Err(format!("unknown display kind '{}'", other)),
        }
    }
}

impl fmt::Display for DisplayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySettings {
    pub kind: DisplayKind,
    /// Directory used by the `frames` display
    pub output_dir: PathBuf,
    /// Animation shown once checks pass
    pub loading_sequence: Option<PathBuf>,
    pub frame_duration_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
