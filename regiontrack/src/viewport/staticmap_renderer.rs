//! Map renderer backed by the `staticmap` crate.
//!
//! Base map tiles come from an OSM-style tile server. Two tools are added to
//! the map: a [`ViewportFrame`] whose extent is the bounding box (this is what
//! makes staticmap frame the requested area) and a [`PositionMarker`] at the
//! current position.

use staticmap::tools::Tool;
use staticmap::{lat_to_y, lon_to_x, Bounds, StaticMapBuilder};
use tiny_skia::{Color, FillRule, Paint, PathBuilder, PixmapMut, Shader, Stroke, Transform};
use tracing::debug;

use super::bbox::{BoundingBox, GeoPoint};
use super::error::RenderError;
use super::render::{MapArtifact, MapRenderer, Viewport};

/// Default tile server.
pub const DEFAULT_TILE_URL: &str = "https://a.tile.osm.org/{z}/{x}/{y}.png";

/// Configuration for [`StaticMapRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct StaticMapConfig {
    /// Image width in pixels at 100 dpi.
    pub width: u32,
    /// Image height in pixels at 100 dpi.
    pub height: u32,
    /// Tile server URL template with `{z}`, `{x}`, `{y}`.
    pub tile_url: String,
    /// Marker fill color (RGBA).
    pub marker_color: (u8, u8, u8, u8),
    /// Marker radius in pixels at 100 dpi.
    pub marker_radius: f32,
    /// Frame border color (RGBA); alpha 0 hides the frame.
    pub frame_color: (u8, u8, u8, u8),
}

impl Default for StaticMapConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 64,
            tile_url: DEFAULT_TILE_URL.to_string(),
            marker_color: (220, 30, 30, 255),
            marker_radius: 3.0,
            frame_color: (0, 0, 0, 0),
        }
    }
}

impl StaticMapConfig {
    /// Pixel size for `dpi`.
    pub fn pixel_size(&self, dpi: u32) -> (u32, u32) {
        let scale = |base: u32| ((base as u64 * dpi as u64) / 100).max(1) as u32;
        (scale(self.width), scale(self.height))
    }
}

fn solid(rgba: (u8, u8, u8, u8)) -> Paint<'static> {
    Paint {
        shader: Shader::SolidColor(Color::from_rgba8(rgba.0, rgba.1, rgba.2, rgba.3)),
        anti_alias: true,
        ..Default::default()
    }
}

/// Outline of the bounding box; its extent frames the map.
pub struct ViewportFrame {
    bbox: BoundingBox,
    paint: Paint<'static>,
    visible: bool,
}

impl ViewportFrame {
    pub fn new(bbox: BoundingBox, rgba: (u8, u8, u8, u8)) -> Self {
        Self {
            bbox,
            paint: solid(rgba),
            visible: rgba.3 > 0,
        }
    }
}

impl Tool for ViewportFrame {
    fn extent(&self, _zoom: u8, _tile_size: f64) -> (f64, f64, f64, f64) {
        (
            self.bbox.min_lon,
            self.bbox.min_lat,
            self.bbox.max_lon,
            self.bbox.max_lat,
        )
    }

    fn draw(&self, bounds: &Bounds, mut pixmap: PixmapMut) {
        if !self.visible {
            return;
        }

        let x1 = bounds.x_to_px(lon_to_x(self.bbox.min_lon, bounds.zoom)) as f32;
        let y1 = bounds.y_to_px(lat_to_y(self.bbox.max_lat, bounds.zoom)) as f32; // north
        let x2 = bounds.x_to_px(lon_to_x(self.bbox.max_lon, bounds.zoom)) as f32;
        let y2 = bounds.y_to_px(lat_to_y(self.bbox.min_lat, bounds.zoom)) as f32; // south

        let mut path_builder = PathBuilder::new();
        path_builder.move_to(x1, y1);
        path_builder.line_to(x2, y1);
        path_builder.line_to(x2, y2);
        path_builder.line_to(x1, y2);
        path_builder.close();

        if let Some(path) = path_builder.finish() {
            pixmap.stroke_path(
                &path,
                &self.paint,
                &Stroke {
                    width: 1.0,
                    ..Default::default()
                },
                Transform::default(),
                None,
            );
        }
    }
}

/// Filled circle at the current position.
pub struct PositionMarker {
    position: GeoPoint,
    radius: f32,
    paint: Paint<'static>,
}

impl PositionMarker {
    pub fn new(position: GeoPoint, radius: f32, rgba: (u8, u8, u8, u8)) -> Self {
        Self {
            position,
            radius,
            paint: solid(rgba),
        }
    }
}

impl Tool for PositionMarker {
    fn extent(&self, _zoom: u8, _tile_size: f64) -> (f64, f64, f64, f64) {
        (
            self.position.lon,
            self.position.lat,
            self.position.lon,
            self.position.lat,
        )
    }

    fn draw(&self, bounds: &Bounds, mut pixmap: PixmapMut) {
        let x = bounds.x_to_px(lon_to_x(self.position.lon, bounds.zoom)) as f32;
        let y = bounds.y_to_px(lat_to_y(self.position.lat, bounds.zoom)) as f32;

        if let Some(path) = PathBuilder::from_circle(x, y, self.radius) {
            pixmap.fill_path(
                &path,
                &self.paint,
                FillRule::Winding,
                Transform::default(),
                None,
            );
        }
    }
}

/// Renders PNG maps from an OSM-style tile server.
///
/// Rendering downloads tiles and blocks; run it on a blocking thread.
#[derive(Debug, Clone, Default)]
pub struct StaticMapRenderer {
    config: StaticMapConfig,
}

impl StaticMapRenderer {
    pub fn new(config: StaticMapConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StaticMapConfig {
        &self.config
    }
}

impl MapRenderer for StaticMapRenderer {
    fn render(&self, viewport: &Viewport, position: GeoPoint) -> Result<MapArtifact, RenderError> {
        let (width, height) = self.config.pixel_size(viewport.dpi);
        let scale = viewport.dpi as f32 / 100.0;

        let mut map = StaticMapBuilder::default()
            .width(width)
            .height(height)
            .padding((0, 0))
            .url_template(self.config.tile_url.as_str())
            .build()
            .map_err(|e| RenderError::Setup(e.to_string()))?;

        map.add_tool(ViewportFrame::new(viewport.bbox, self.config.frame_color));
        map.add_tool(PositionMarker::new(
            position,
            self.config.marker_radius * scale,
            self.config.marker_color,
        ));

        let png = map
            .encode_png()
            .map_err(|e| RenderError::Render(e.to_string()))?;

        debug!(
            width,
            height,
            bytes = png.len(),
            bbox = %viewport.bbox,
            "Rendered map"
        );

        Ok(MapArtifact {
            png,
            width,
            height,
            bbox: viewport.bbox,
            position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_size_scales_with_dpi() {
        let config = StaticMapConfig::default();
        assert_eq!(config.pixel_size(100), (128, 64));
        assert_eq!(config.pixel_size(200), (256, 128));
        assert_eq!(config.pixel_size(1), (1, 1));
    }

    #[test]
    fn test_frame_extent_is_bbox() {
        let bbox = BoundingBox::new(44.978, 8.558, 44.982, 8.562);
        let frame = ViewportFrame::new(bbox, (0, 0, 0, 255));
        assert_eq!(frame.extent(17, 256.0), (8.558, 44.978, 8.562, 44.982));
    }

    #[test]
    fn test_marker_extent_is_point() {
        let marker = PositionMarker::new(GeoPoint::new(44.98, 8.56), 3.0, (255, 0, 0, 255));
        assert_eq!(marker.extent(17, 256.0), (8.56, 44.98, 8.56, 44.98));
    }

    #[test]
    fn test_renderer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StaticMapRenderer>();
    }
}
