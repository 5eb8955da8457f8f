//! RegionStore - owner of the published spatial index.
//!
//! The store loads the boundary dataset on a blocking background task and
//! publishes the finished [`SpatialIndex`] by swapping an `Arc`. Readers take a
//! snapshot of the `Arc` and never hold the lock while testing polygons.
//!
//! Two monotonic flags back the readiness probes:
//! - `loaded`: an index has been published
//! - `cached`: a cache file valid for the loaded dataset exists on disk

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::cache::{self, CacheLoadResult, DatasetFingerprint};
use super::dataset::{load_dataset, DEFAULT_NAME_PROPERTY};
use super::error::{DatasetError, RegionError};
use super::grid::DEFAULT_CELL_DEGREES;
use super::index::SpatialIndex;

/// Configuration for the region store.
#[derive(Debug, Clone)]
pub struct RegionStoreConfig {
    /// GeoJSON FeatureCollection with the region boundaries.
    pub dataset: PathBuf,
    /// Where the built index is persisted.
    pub cache_file: PathBuf,
    /// Feature property holding the region name.
    pub name_property: String,
    /// Grid cell size in degrees.
    pub cell_degrees: f64,
}

impl RegionStoreConfig {
    /// Config with default name property and cell size.
    pub fn new(dataset: impl Into<PathBuf>, cache_file: impl Into<PathBuf>) -> Self {
        Self {
            dataset: dataset.into(),
            cache_file: cache_file.into(),
            name_property: DEFAULT_NAME_PROPERTY.to_string(),
            cell_degrees: DEFAULT_CELL_DEGREES,
        }
    }
}

/// Outcome of a region lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionLookup {
    /// The point lies inside (or on the edge of) the named region.
    Region(String),
    /// The point lies outside every region.
    Unknown,
}

impl RegionLookup {
    /// Region name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            RegionLookup::Region(name) => Some(name),
            RegionLookup::Unknown => None,
        }
    }
}

impl std::fmt::Display for RegionLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionLookup::Region(name) => write!(f, "{}", name),
            RegionLookup::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Summary of a completed load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    /// Regions in the published index.
    pub regions: usize,
    /// Dataset records skipped as malformed (0 when loaded from cache).
    pub skipped: usize,
    /// Whether the index came from the cache file.
    pub from_cache: bool,
    /// Whether a valid cache file exists after the load.
    pub cache_written: bool,
    /// Wall time spent loading.
    pub elapsed: Duration,
}

/// Loads, owns and queries the region index.
pub struct RegionStore {
    config: RegionStoreConfig,
    index: RwLock<Option<Arc<SpatialIndex>>>,
    loaded: AtomicBool,
    cached: AtomicBool,
    summary: RwLock<Option<LoadSummary>>,
    load_error: RwLock<Option<String>>,
}

impl RegionStore {
    pub fn new(config: RegionStoreConfig) -> Self {
        Self {
            config,
            index: RwLock::new(None),
            loaded: AtomicBool::new(false),
            cached: AtomicBool::new(false),
            summary: RwLock::new(None),
            load_error: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &RegionStoreConfig {
        &self.config
    }

    /// Start loading on a blocking background task.
    ///
    /// Failures are logged and recorded; they leave [`is_loaded`](Self::is_loaded)
    /// false rather than crashing the process.
    pub fn load(self: &Arc<Self>, debug: bool) -> JoinHandle<Result<LoadSummary, DatasetError>> {
        let store = Arc::clone(self);
        tokio::task::spawn_blocking(move || store.load_blocking(debug))
    }

    /// Load synchronously: reuse the cache if valid, otherwise parse and build.
    pub fn load_blocking(&self, debug: bool) -> Result<LoadSummary, DatasetError> {
        let result = self.try_load(debug);
        match &result {
            Ok(summary) => {
                info!(
                    regions = summary.regions,
                    skipped = summary.skipped,
                    from_cache = summary.from_cache,
                    cache_written = summary.cache_written,
                    elapsed_ms = summary.elapsed.as_millis() as u64,
                    "Region index ready"
                );
                *self.summary.write().expect("RegionStore lock poisoned") = Some(summary.clone());
            }
            Err(e) => {
                error!(error = %e, "Region index load failed");
                *self.load_error.write().expect("RegionStore lock poisoned") = Some(e.to_string());
            }
        }
        result
    }

    fn try_load(&self, debug: bool) -> Result<LoadSummary, DatasetError> {
        let start = Instant::now();
        let dataset = &self.config.dataset;

        let fingerprint = DatasetFingerprint::of(dataset).map_err(|source| DatasetError::Read {
            path: dataset.clone(),
            source,
        })?;

        let cache_result = cache::load_cache(
            &self.config.cache_file,
            &fingerprint,
            self.config.cell_degrees,
        );
        match cache_result {
            CacheLoadResult::Loaded { index } => {
                let regions = index.len();
                self.publish(index);
                self.cached.store(true, Ordering::Release);
                return Ok(LoadSummary {
                    regions,
                    skipped: 0,
                    from_cache: true,
                    cache_written: true,
                    elapsed: start.elapsed(),
                });
            }
            CacheLoadResult::Stale { reason } => {
                info!(reason = %reason, "Region index cache is stale, rebuilding");
            }
            CacheLoadResult::Invalid { error } => {
                warn!(error = %error, "Region index cache is invalid, rebuilding");
            }
            CacheLoadResult::NotFound => {
                debug!("No region index cache, building");
            }
        }

        let parsed = load_dataset(dataset, &self.config.name_property, debug)?;
        let skipped = parsed.skipped.len();
        let index = SpatialIndex::build(parsed.regions, self.config.cell_degrees);
        let regions = index.len();
        let index = self.publish(index);

        let cache_written = match cache::save_cache(&index, &fingerprint, &self.config.cache_file)
        {
            Ok(()) => {
                self.cached.store(true, Ordering::Release);
                true
            }
            Err(e) => {
                warn!(
                    path = %self.config.cache_file.display(),
                    error = %e,
                    "Failed to save region index cache"
                );
                false
            }
        };

        Ok(LoadSummary {
            regions,
            skipped,
            from_cache: false,
            cache_written,
            elapsed: start.elapsed(),
        })
    }

    fn publish(&self, index: SpatialIndex) -> Arc<SpatialIndex> {
        let index = Arc::new(index);
        *self.index.write().expect("RegionStore lock poisoned") = Some(Arc::clone(&index));
        self.loaded.store(true, Ordering::Release);
        index
    }

    /// Whether an index has been published.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Whether a cache file valid for the loaded dataset exists.
    pub fn has_cached_index(&self) -> bool {
        self.cached.load(Ordering::Acquire)
    }

    /// Snapshot of the published index.
    pub fn index(&self) -> Option<Arc<SpatialIndex>> {
        self.index.read().expect("RegionStore lock poisoned").clone()
    }

    /// Summary of the last successful load.
    pub fn load_summary(&self) -> Option<LoadSummary> {
        self.summary.read().expect("RegionStore lock poisoned").clone()
    }

    /// Error message of the last failed load.
    pub fn load_error(&self) -> Option<String> {
        self.load_error.read().expect("RegionStore lock poisoned").clone()
    }

    /// Resolve the region containing a point.
    ///
    /// Note the argument order: longitude first.
    pub fn resolve_region(&self, longitude: f64, latitude: f64) -> Result<RegionLookup, RegionError> {
        if !latitude.is_finite()
            || !longitude.is_finite()
            || !(-90.0..=90.0).contains(&latitude)
            || !(-180.0..=180.0).contains(&longitude)
        {
            return Err(RegionError::InvalidPoint {
                lat: latitude,
                lon: longitude,
            });
        }

        let index = self.index().ok_or(RegionError::NotLoaded)?;
        Ok(match index.locate(latitude, longitude) {
            Some(region) => RegionLookup::Region(region.name().to_string()),
            None => RegionLookup::Unknown,
        })
    }
}

impl std::fmt::Debug for RegionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionStore")
            .field("config", &self.config)
            .field("loaded", &self.is_loaded())
            .field("cached", &self.has_cached_index())
            .finish()
    }
}
