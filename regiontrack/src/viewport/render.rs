//! The map rendering seam.

use super::bbox::{BoundingBox, GeoPoint};
use super::error::RenderError;

/// What the renderer is asked to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub bbox: BoundingBox,
    /// Half extent in degrees used when recentring.
    pub zoom: f64,
    /// Rendering resolution; 100 renders at the configured base size.
    pub dpi: u32,
}

/// A rendered map ready for the display.
#[derive(Debug, Clone, PartialEq)]
pub struct MapArtifact {
    /// PNG-encoded image.
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Area the image shows.
    pub bbox: BoundingBox,
    /// Position marked on the map.
    pub position: GeoPoint,
}

/// Produces a map image for a viewport.
///
/// Implementations may block (tile downloads); callers run them off the
/// async runtime.
pub trait MapRenderer: Send + Sync {
    fn render(&self, viewport: &Viewport, position: GeoPoint) -> Result<MapArtifact, RenderError>;
}
