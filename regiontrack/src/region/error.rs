//! Region store error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Reasons a single boundary record is rejected.
///
/// These are data-quality problems: the offending record is skipped and
/// loading continues.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BoundaryError {
    /// The record has no usable name.
    #[error("missing or empty region name")]
    MissingName,

    /// The record has no geometry or no polygons.
    #[error("empty geometry")]
    EmptyGeometry,

    /// The geometry type is not a polygon or multipolygon.
    #[error("unsupported geometry type '{0}'")]
    UnsupportedGeometry(String),

    /// The feature object itself could not be decoded.
    #[error("malformed feature: {0}")]
    MalformedFeature(String),

    /// A position array has fewer than two numbers.
    #[error("malformed position: {0}")]
    MalformedPosition(String),

    /// A coordinate is NaN or infinite.
    #[error("non-finite coordinate ({lat}, {lon})")]
    NonFiniteCoordinate { lat: f64, lon: f64 },

    /// A coordinate lies outside [-90, 90] x [-180, 180].
    #[error("coordinate out of range ({lat}, {lon})")]
    OutOfRange { lat: f64, lon: f64 },

    /// A ring has fewer than three distinct vertices.
    #[error("ring has {found} distinct vertices, at least 3 required")]
    TooFewVertices { found: usize },
}

/// Errors that prevent a whole dataset from loading.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The dataset file could not be read.
    #[error("failed to read boundary dataset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The dataset is not a GeoJSON FeatureCollection.
    #[error("boundary dataset {path} is not a GeoJSON FeatureCollection: {reason}")]
    Format { path: PathBuf, reason: String },

    /// Every record was rejected.
    #[error("boundary dataset {path} contains no valid regions ({skipped} skipped)")]
    NoRegions { path: PathBuf, skipped: usize },
}

/// Errors returned by region queries.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegionError {
    /// Queried before the spatial index was published.
    #[error("region index is not loaded yet")]
    NotLoaded,

    /// The query point is not a valid coordinate.
    #[error("invalid query point ({lat}, {lon})")]
    InvalidPoint { lat: f64, lon: f64 },
}
