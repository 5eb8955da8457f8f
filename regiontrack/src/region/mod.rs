//! Region Store: which administrative region contains a point.
//!
//! The boundary dataset (a GeoJSON FeatureCollection) is parsed into
//! [`RegionBoundary`] values, bucketed into a coarse grid of
//! [`GridCell`]s and published as an immutable [`SpatialIndex`]. The built
//! index is persisted to a cache file and reused while the dataset is
//! unchanged.
//!
//! # Architecture
//!
//! ```text
//! RegionStore
//! ├── load()            spawn_blocking: cache → or parse + build → publish → save
//! ├── is_loaded()       monotonic flag (readiness probe)
//! ├── has_cached_index() monotonic flag (checking probe)
//! └── resolve_region()  snapshot Arc<SpatialIndex> → grid cell → candidates
//!
//! SpatialIndex
//! ├── regions: [Liguria, Piemonte, ...]   lookup order (area, name, dataset)
//! └── cells:   (+44+007) → [0, 1]         candidate positions
//! ```
//!
//! # Usage
//!
//! ```
//! use regiontrack::region::{RegionBoundary, SpatialIndex};
//!
//! let r1 = RegionBoundary::from_lat_lon_ring(
//!     "R1",
//!     &[(44.0, 8.0), (44.0, 9.0), (45.0, 9.0), (45.0, 8.0)],
//! )
//! .unwrap();
//! let index = SpatialIndex::build(vec![r1], 1.0);
//!
//! assert_eq!(index.locate(44.5, 8.5).map(|r| r.name()), Some("R1"));
//! assert!(index.locate(50.0, 50.0).is_none());
//! ```

mod boundary;
pub mod cache;
mod dataset;
mod error;
mod grid;
mod index;
mod store;

pub use boundary::{Bounds, RegionBoundary, MIN_RING_VERTICES};
pub use cache::{CacheLoadResult, DatasetFingerprint};
pub use dataset::{load_dataset, parse_dataset, ParsedDataset, SkippedRecord, DEFAULT_NAME_PROPERTY};
pub use error::{BoundaryError, DatasetError, RegionError};
pub use grid::{GridCell, DEFAULT_CELL_DEGREES};
pub use index::SpatialIndex;
pub use store::{LoadSummary, RegionLookup, RegionStore, RegionStoreConfig};
