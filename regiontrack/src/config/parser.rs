//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [region] section
    if let Some(section) = ini.section(Some("region")) {
        if let Some(v) = non_empty(section.get("dataset")) {
            config.region.dataset = expand_tilde(v);
        }
        if let Some(v) = non_empty(section.get("name_property")) {
            config.region.name_property = v.to_string();
        }
        if let Some(v) = section.get("cell_degrees") {
            let cell: f64 = parse_value("region", "cell_degrees", v, "must be a number")?;
            if !(cell.is_finite() && cell > 0.0 && cell <= 90.0) {
                return Err(invalid(
                    "region",
                    "cell_degrees",
                    v,
                    "must be greater than 0 and at most 90",
                ));
            }
            config.region.cell_degrees = cell;
        }
        if let Some(v) = non_empty(section.get("cache_file")) {
            config.region.cache_file = Some(expand_tilde(v));
        }
    }

    // [readiness] section
    if let Some(section) = ini.section(Some("readiness")) {
        if let Some(v) = section.get("poll_interval_ms") {
            config.readiness.poll_interval_ms = parse_positive("readiness", "poll_interval_ms", v)?;
        }
        if let Some(v) = section.get("deadline_secs") {
            config.readiness.deadline_secs = parse_value(
                "readiness",
                "deadline_secs",
                v,
                "must be a non-negative integer (seconds)",
            )?;
        }
        if let Some(v) = section.get("check_deadline_secs") {
            config.readiness.check_deadline_secs = parse_value(
                "readiness",
                "check_deadline_secs",
                v,
                "must be a non-negative integer (seconds)",
            )?;
        }
    }

    // [feed] section
    if let Some(section) = ini.section(Some("feed")) {
        if let Some(v) = section.get("source") {
            config.feed.source =
                parse_value("feed", "source", v, "must be one of: replay, stdin, file")?;
        }
        if let Some(v) = non_empty(section.get("path")) {
            config.feed.path = Some(expand_tilde(v));
        }
        if let Some(v) = section.get("replay_interval_ms") {
            config.feed.replay_interval_ms = parse_positive("feed", "replay_interval_ms", v)?;
        }
        if let Some(v) = section.get("replay_loop") {
            config.feed.replay_loop = parse_bool("feed", "replay_loop", v)?;
        }
    }
    if config.feed.source == super::settings::FeedSourceKind::File && config.feed.path.is_none() {
        return Err(invalid(
            "feed",
            "path",
            "",
            "required when source = file",
        ));
    }

    // [viewport] section
    if let Some(section) = ini.section(Some("viewport")) {
        if let Some(v) = section.get("zoom") {
            let zoom: f64 = parse_value("viewport", "zoom", v, "must be a number (degrees)")?;
            if !(zoom.is_finite() && zoom > 0.0) {
                return Err(invalid("viewport", "zoom", v, "must be greater than 0"));
            }
            config.viewport.zoom = zoom;
        }
        if let Some(v) = section.get("dpi") {
            config.viewport.dpi = parse_positive("viewport", "dpi", v)?;
        }
        if let Some(v) = section.get("margin") {
            let margin: f64 = parse_value("viewport", "margin", v, "must be a number")?;
            if !(0.0..1.0).contains(&margin) {
                return Err(invalid(
                    "viewport",
                    "margin",
                    v,
                    "must be at least 0 and less than 1",
                ));
            }
            config.viewport.margin = margin;
        }
        if let Some(v) = section.get("width") {
            config.viewport.width = parse_positive("viewport", "width", v)?;
        }
        if let Some(v) = section.get("height") {
            config.viewport.height = parse_positive("viewport", "height", v)?;
        }
        if let Some(v) = non_empty(section.get("tile_url")) {
            if !(v.contains("{z}") && v.contains("{x}") && v.contains("{y}")) {
                return Err(invalid(
                    "viewport",
                    "tile_url",
                    v,
                    "must contain {z}, {x} and {y} placeholders",
                ));
            }
            config.viewport.tile_url = v.to_string();
        }
        if let Some(v) = section.get("render_timeout_ms") {
            config.viewport.render_timeout_ms =
                parse_positive("viewport", "render_timeout_ms", v)?;
        }
    }

    // [live] section
    if let Some(section) = ini.section(Some("live")) {
        if let Some(v) = section.get("tick_interval_ms") {
            config.live.tick_interval_ms = parse_positive("live", "tick_interval_ms", v)?;
        }
    }

    // [display] section
    if let Some(section) = ini.section(Some("display")) {
        if let Some(v) = section.get("kind") {
            config.display.kind =
                parse_value("display", "kind", v, "must be one of: log, frames, none")?;
        }
        if let Some(v) = non_empty(section.get("output_dir")) {
            config.display.output_dir = expand_tilde(v);
        }
        if let Some(v) = non_empty(section.get("loading_sequence")) {
            config.display.loading_sequence = Some(expand_tilde(v));
        }
        if let Some(v) = section.get("frame_duration_ms") {
            config.display.frame_duration_ms = parse_positive("display", "frame_duration_ms", v)?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section.get("file")) {
            config.logging.file = expand_tilde(v);
        }
    }

    Ok(config)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

/// Parse an integer that must be at least 1.
fn parse_positive<T>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + PartialOrd + From<u8>,
{
    let parsed: T = parse_value(section, key, value, "must be a positive integer")?;
    if parsed < T::from(1) {
        return Err(invalid(section, key, value, "must be a positive integer"));
    }
    Ok(parsed)
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(invalid(section, key, value, "must be true or false")),
    }
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use crate::config::settings::{DisplayKind, FeedSourceKind};
    use tempfile::TempDir;

    fn load(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, content).unwrap();
        ConfigFile::load_from(&config_path)
    }

    #[test]
    fn test_overlays_values_on_defaults() {
        let config = load(
            r#"
[region]
dataset = /data/regions.geojson
cell_degrees = 0.5

[readiness]
poll_interval_ms = 250
deadline_secs = 3

[feed]
source = stdin
replay_loop = false

[viewport]
zoom = 0.01
dpi = 100

[display]
kind = frames
output_dir = /tmp/frames
"#,
        )
        .unwrap();

        assert_eq!(config.region.dataset, PathBuf::from("/data/regions.geojson"));
        assert_eq!(config.region.cell_degrees, 0.5);
        assert_eq!(config.region.name_property, "name");
        assert_eq!(config.readiness.poll_interval_ms, 250);
        assert_eq!(config.readiness.deadline_secs, 3);
        assert_eq!(config.readiness.check_deadline_secs, DEFAULT_CHECK_DEADLINE_SECS);
        assert_eq!(config.feed.source, FeedSourceKind::Stdin);
        assert!(!config.feed.replay_loop);
        assert_eq!(config.viewport.zoom, 0.01);
        assert_eq!(config.viewport.dpi, 100);
        assert_eq!(config.viewport.width, DEFAULT_MAP_WIDTH);
        assert_eq!(config.display.kind, DisplayKind::Frames);
        assert_eq!(config.display.output_dir, PathBuf::from("/tmp/frames"));
        assert_eq!(config.live.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
    }

    #[test]
    fn test_invalid_feed_source() {
        let err = load("[feed]\nsource = serial\n").unwrap_err();
        assert!(err.to_string().contains("feed.source"));
        assert!(err.to_string().contains("must be one of: replay, stdin, file"));
    }

    #[test]
    fn test_file_source_requires_path() {
        let err = load("[feed]\nsource = file\n").unwrap_err();
        assert!(err.to_string().contains("feed.path"));

        let config = load("[feed]\nsource = file\npath = /tmp/fixes.txt\n").unwrap();
        assert_eq!(config.feed.path, Some(PathBuf::from("/tmp/fixes.txt")));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let err = load("[readiness]\npoll_interval_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { ref key, .. } if key == "poll_interval_ms"));
    }

    #[test]
    fn test_margin_range() {
        assert!(load("[viewport]\nmargin = 1.0\n").is_err());
        assert!(load("[viewport]\nmargin = -0.1\n").is_err());
        assert_eq!(load("[viewport]\nmargin = 0\n").unwrap().viewport.margin, 0.0);
    }

    #[test]
    fn test_cell_degrees_must_be_positive() {
        assert!(load("[region]\ncell_degrees = 0\n").is_err());
        assert!(load("[region]\ncell_degrees = abc\n").is_err());
    }

    #[test]
    fn test_tile_url_needs_placeholders() {
        assert!(load("[viewport]\ntile_url = https://tiles.example/map.png\n").is_err());
        let config = load("[viewport]\ntile_url = https://t.example/{z}/{x}/{y}.png\n").unwrap();
        assert_eq!(config.viewport.tile_url, "https://t.example/{z}/{x}/{y}.png");
    }

    #[test]
    fn test_empty_values_keep_defaults() {
        let config = load("[region]\ncache_file =\n[display]\nloading_sequence =\n").unwrap();
        assert!(config.region.cache_file.is_none());
        assert!(config.display.loading_sequence.is_none());
    }

    #[test]
    fn test_bool_spellings() {
        assert!(load("[feed]\nreplay_loop = yes\n").unwrap().feed.replay_loop);
        assert!(!load("[feed]\nreplay_loop = off\n").unwrap().feed.replay_loop);
        assert!(load("[feed]\nreplay_loop = maybe\n").is_err());
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/regions.geojson"), home.join("regions.geojson"));
        }
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
    }
}
