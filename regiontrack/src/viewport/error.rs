//! Viewport error types.

use thiserror::Error;

/// Errors from a map renderer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    /// The map could not be configured (size, tile server).
    #[error("map setup failed: {0}")]
    Setup(String),

    /// Base map tiles could not be fetched or drawn.
    #[error("map rendering failed: {0}")]
    Render(String),

    /// The rendered image could not be encoded.
    #[error("map encoding failed: {0}")]
    Encode(String),
}

/// Errors from [`ViewportTracker::advance`](super::ViewportTracker::advance).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ViewportError {
    #[error("invalid point ({lat}, {lon})")]
    InvalidPoint { lat: f64, lon: f64 },

    /// Zoom is the half extent in degrees and must be positive.
    #[error("invalid zoom {0}: must be a positive number of degrees")]
    InvalidZoom(f64),

    #[error("invalid dpi {0}: must be positive")]
    InvalidDpi(u32),

    /// Margin must lie in [0, 1).
    #[error("invalid margin {0}: must be in [0, 1)")]
    InvalidMargin(f64),

    #[error(transparent)]
    Render(#[from] RenderError),
}
