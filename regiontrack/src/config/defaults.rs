//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use super::file::config_directory;
use super::settings::*;
use crate::readiness::{DEFAULT_DEADLINE, DEFAULT_POLL_INTERVAL};
use crate::region::{DEFAULT_CELL_DEGREES, DEFAULT_NAME_PROPERTY};
use crate::viewport::{DEFAULT_DPI, DEFAULT_MARGIN, DEFAULT_TILE_URL, DEFAULT_ZOOM};

/// Default dataset file name inside the config directory.
pub const DEFAULT_DATASET_FILENAME: &str = "regions.geojson";

/// Default poll interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = DEFAULT_POLL_INTERVAL.as_millis() as u64;

/// Default startup deadline in seconds.
pub const DEFAULT_DEADLINE_SECS: u64 = DEFAULT_DEADLINE.as_secs();

/// Default deadline of the fix/cache check in seconds.
pub const DEFAULT_CHECK_DEADLINE_SECS: u64 = 10;

/// Default delay between replayed fixes.
pub const DEFAULT_REPLAY_INTERVAL_MS: u64 = 1000;

/// Default map width in pixels at 100 dpi.
pub const DEFAULT_MAP_WIDTH: u32 = 128;

/// Default map height in pixels at 100 dpi.
pub const DEFAULT_MAP_HEIGHT: u32 = 64;

/// Default per-tick render bound.
pub const DEFAULT_RENDER_TIMEOUT_MS: u64 = 10_000;

/// Default streaming tick.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Default loading animation frame duration.
pub const DEFAULT_FRAME_DURATION_MS: u64 = 100;

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = config_directory();

        Self {
            region: RegionSettings {
                dataset: config_dir.join(DEFAULT_DATASET_FILENAME),
                name_property: DEFAULT_NAME_PROPERTY.to_string(),
                cell_degrees: DEFAULT_CELL_DEGREES,
                cache_file: None,
            },
            readiness: ReadinessSettings {
                poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
                deadline_secs: DEFAULT_DEADLINE_SECS,
                check_deadline_secs: DEFAULT_CHECK_DEADLINE_SECS,
            },
            feed: FeedSettings {
                source: FeedSourceKind::Replay,
                path: None,
                replay_interval_ms: DEFAULT_REPLAY_INTERVAL_MS,
                replay_loop: true,
            },
            viewport: ViewportSettings {
                zoom: DEFAULT_ZOOM,
                dpi: DEFAULT_DPI,
                margin: DEFAULT_MARGIN,
                width: DEFAULT_MAP_WIDTH,
                height: DEFAULT_MAP_HEIGHT,
                tile_url: DEFAULT_TILE_URL.to_string(),
                render_timeout_ms: DEFAULT_RENDER_TIMEOUT_MS,
            },
            live: LiveSettings {
                tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            },
            display: DisplaySettings {
                kind: DisplayKind::Log,
                output_dir: config_dir.join("frames"),
                loading_sequence: None,
                frame_duration_ms: DEFAULT_FRAME_DURATION_MS,
            },
            logging: LoggingSettings {
                file: config_dir.join("regiontrack.log"),
            },
        }
    }
}
