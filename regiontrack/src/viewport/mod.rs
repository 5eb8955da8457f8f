//! Viewport Tracker: which part of the map to show.
//!
//! Each tick, [`ViewportTracker::advance`] takes the current point and the
//! previous [`BoundingBox`]:
//!
//! ```text
//! previous retains point (margin)?  ── yes ──► keep previous box
//!              │ no
//!              ▼
//!   box centred on point, half extent = zoom
//!              │
//!              ▼
//!   MapRenderer::render(viewport, point) ──► (MapArtifact, new box)
//! ```
//!
//! The tracker is a pure function of its inputs plus whatever tile caching
//! the renderer does. [`StaticMapRenderer`] is the stock renderer.

mod bbox;
mod error;
mod render;
mod staticmap_renderer;
mod tracker;

pub use bbox::{BoundingBox, GeoPoint};
pub use error::{RenderError, ViewportError};
pub use render::{MapArtifact, MapRenderer, Viewport};
pub use staticmap_renderer::{
    PositionMarker, StaticMapConfig, StaticMapRenderer, ViewportFrame, DEFAULT_TILE_URL,
};
pub use tracker::{TrackerConfig, ViewportTracker, DEFAULT_DPI, DEFAULT_MARGIN, DEFAULT_ZOOM};
