//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let cache_file = config
        .region
        .cache_file
        .as_ref()
        .map(|p| path_to_string(p))
        .unwrap_or_default();
    let feed_path = config
        .feed
        .path
        .as_ref()
        .map(|p| path_to_string(p))
        .unwrap_or_default();
    let loading_sequence = config
        .display
        .loading_sequence
        .as_ref()
        .map(|p| path_to_string(p))
        .unwrap_or_default();

    format!(
        r#"[region]
; GeoJSON FeatureCollection with one feature per region (Polygon or MultiPolygon)
dataset = {}
; Feature property holding the region name (default: name)
name_property = {}
; Grid cell size in degrees used to bucket regions (default: 1.0)
cell_degrees = {}
; Spatial index cache file. If empty, defaults to region_index.cache next to this file
cache_file = {}

[readiness]
; Time between readiness probes in milliseconds (default: 1000)
poll_interval_ms = {}
; Seconds to wait for the region index and location feed at startup (default: 10)
deadline_secs = {}
; Seconds to wait for a first fix and the index cache (default: 10)
check_deadline_secs = {}

[feed]
; Location source:
;   replay - built-in demo route
;   stdin  - one "lat,lon[,speed_kmh]" fix per line on standard input
;   file   - same line format, read from path
source = {}
; Fix file (required when source = file)
path = {}
; Delay between replayed fixes in milliseconds (default: 1000)
replay_interval_ms = {}
; Restart the demo route when it ends (default: true)
replay_loop = {}

[viewport]
; Half extent of a recentred map in degrees (default: 0.00225)
zoom = {}
; Output resolution; image size scales with dpi / 100 (default: 200)
dpi = {}
; Fraction of the half extent kept clear before recentring, 0 to <1 (default: 0.25)
margin = {}
; Map size in pixels at 100 dpi (default: 128 x 64)
width = {}
height = {}
; Tile server URL with {{z}}, {{x}} and {{y}} placeholders
tile_url = {}
; Per-tick render timeout in milliseconds (default: 10000)
render_timeout_ms = {}

[live]
; Time between streaming ticks in milliseconds (default: 1000)
tick_interval_ms = {}

[display]
; Display sink:
;   log    - write every display call to the log
;   frames - write map.png and status.json into output_dir
;   none   - discard output
kind = {}
output_dir = {}
; Animation played once the startup checks pass (optional)
loading_sequence = {}
; Animation frame duration in milliseconds (default: 100)
frame_duration_ms = {}

[logging]
; Log file, truncated at the start of every run
file = {}
"#,
        path_to_string(&config.region.dataset),
        config.region.name_property,
        config.region.cell_degrees,
        cache_file,
        config.readiness.poll_interval_ms,
        config.readiness.deadline_secs,
        config.readiness.check_deadline_secs,
        config.feed.source,
        feed_path,
        config.feed.replay_interval_ms,
        config.feed.replay_loop,
        config.viewport.zoom,
        config.viewport.dpi,
        config.viewport.margin,
        config.viewport.width,
        config.viewport.height,
        config.viewport.tile_url,
        config.viewport.render_timeout_ms,
        config.live.tick_interval_ms,
        config.display.kind,
        path_to_string(&config.display.output_dir),
        loading_sequence,
        config.display.frame_duration_ms,
        path_to_string(&config.logging.file),
    )
}

/// Render a path, abbreviating the home directory as `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
