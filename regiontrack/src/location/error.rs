//! Location feed error types.

use thiserror::Error;

/// Why a raw fix was rejected, or a fix source stopped.
#[derive(Debug, Error)]
pub enum LocationError {
    /// One or more of latitude, longitude, speed is missing.
    #[error("incomplete fix: missing {0}")]
    Incomplete(&'static str),

    /// A field is NaN or infinite.
    #[error("non-finite {field}: {value}")]
    NonFinite { field: &'static str, value: f64 },

    /// Latitude or longitude outside the valid range.
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    /// Speed below zero.
    #[error("negative speed: {0}")]
    NegativeSpeed(f64),

    /// The underlying reader failed.
    #[error("fix source I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A replay route with no waypoints.
    #[error("replay route is empty")]
    EmptyRoute,
}
