//! Builds component configurations from the loaded settings.

use std::time::Duration;

use super::settings::ConfigFile;
use crate::live::LiveLoopConfig;
use crate::readiness::ReadinessConfig;
use crate::region::RegionStoreConfig;
use crate::viewport::{StaticMapConfig, TrackerConfig};

impl ConfigFile {
    pub fn region_store_config(&self) -> RegionStoreConfig {
        RegionStoreConfig {
            dataset: self.region.dataset.clone(),
            cache_file: self.cache_file(),
            name_property: self.region.name_property.clone(),
            cell_degrees: self.region.cell_degrees,
        }
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            margin: self.viewport.margin,
        }
    }

    pub fn static_map_config(&self) -> StaticMapConfig {
        StaticMapConfig {
            width: self.viewport.width,
            height: self.viewport.height,
            tile_url: self.viewport.tile_url.clone(),
            ..StaticMapConfig::default()
        }
    }

    /// Loop settings; `max_ticks` is left unbounded.
    pub fn live_loop_config(&self) -> LiveLoopConfig {
        let poll_interval = Duration::from_millis(self.readiness.poll_interval_ms);
        LiveLoopConfig {
            startup: ReadinessConfig {
                poll_interval,
                deadline: Duration::from_secs(self.readiness.deadline_secs),
            },
            check: ReadinessConfig {
                poll_interval,
                deadline: Duration::from_secs(self.readiness.check_deadline_secs),
            },
            tick_interval: Duration::from_millis(self.live.tick_interval_ms),
            zoom: self.viewport.zoom,
            dpi: self.viewport.dpi,
            render_timeout: Duration::from_millis(self.viewport.render_timeout_ms),
            loading_sequence: self.display.loading_sequence.clone(),
            frame_duration: Duration::from_millis(self.display.frame_duration_ms),
            max_ticks: None,
        }
    }
}
