//! ViewportTracker - keep or recentre the visible map window.
//!
//! The tracker holds no state between ticks: the caller passes the previous
//! bounding box in and stores the returned one. When rendering fails nothing
//! is returned, so the caller's previous box stays current and the next tick
//! retries.

use std::sync::Arc;

use tracing::{debug, trace};

use super::bbox::{BoundingBox, GeoPoint};
use super::error::ViewportError;
use super::render::{MapArtifact, MapRenderer, Viewport};

/// Default retained-area margin, as a fraction of the half extent.
pub const DEFAULT_MARGIN: f64 = 0.25;

/// Default half extent in degrees.
pub const DEFAULT_ZOOM: f64 = 0.00225;

/// Default rendering resolution.
pub const DEFAULT_DPI: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    /// Fraction of the half extent kept clear on every side before recentring.
    pub margin: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            margin: DEFAULT_MARGIN,
        }
    }
}

/// Decides the next bounding box and asks the renderer for the map.
pub struct ViewportTracker {
    config: TrackerConfig,
    renderer: Arc<dyn MapRenderer>,
}

impl ViewportTracker {
    pub fn new(config: TrackerConfig, renderer: Arc<dyn MapRenderer>) -> Result<Self, ViewportError> {
        if !(config.margin.is_finite() && (0.0..1.0).contains(&config.margin)) {
            return Err(ViewportError::InvalidMargin(config.margin));
        }
        Ok(Self { config, renderer })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// The box to show for `point`: `previous` when it still retains the
    /// point, otherwise a box centred on the point with half extent `zoom`.
    pub fn next_bbox(&self, point: GeoPoint, previous: BoundingBox, zoom: f64) -> BoundingBox {
        if previous.retains(point, self.config.margin) {
            trace!(bbox = %previous, "Point within retained area, keeping viewport");
            previous
        } else {
            let bbox = BoundingBox::centered(point, zoom);
            debug!(
                lat = point.lat,
                lon = point.lon,
                bbox = %bbox,
                "Recentring viewport"
            );
            bbox
        }
    }

    /// Compute the next box and render it.
    pub fn advance(
        &self,
        point: GeoPoint,
        previous: BoundingBox,
        dpi: u32,
        zoom: f64,
    ) -> Result<(MapArtifact, BoundingBox), ViewportError> {
        if !point.is_valid() {
            return Err(ViewportError::InvalidPoint {
                lat: point.lat,
                lon: point.lon,
            });
        }
        if !(zoom.is_finite() && zoom > 0.0) {
            return Err(ViewportError::InvalidZoom(zoom));
        }
        if dpi == 0 {
            return Err(ViewportError::InvalidDpi(dpi));
        }

        let bbox = self.next_bbox(point, previous, zoom);
        let viewport = Viewport { bbox, zoom, dpi };
        let artifact = self.renderer.render(&viewport, point)?;
        Ok((artifact, bbox))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::RenderError;
    use std::sync::Mutex;

    /// Records every request; fails while `fail` is set.
    #[derive(Default)]
    struct FakeRenderer {
        requests: Mutex<Vec<Viewport>>,
        fail: Mutex<bool>,
    }

    impl MapRenderer for FakeRenderer {
        fn render(&self, viewport: &Viewport, position: GeoPoint) -> Result<MapArtifact, RenderError> {
            self.requests.lock().unwrap().push(*viewport);
            if *self.fail.lock().unwrap() {
                return Err(RenderError::Render("missing base map tile".to_string()));
            }
            Ok(MapArtifact {
                png: vec![0x89, b'P', b'N', b'G'],
                width: 2,
                height: 2,
                bbox: viewport.bbox,
                position,
            })
        }
    }

    fn tracker() -> (ViewportTracker, Arc<FakeRenderer>) {
        let renderer = Arc::new(FakeRenderer::default());
        let tracker = ViewportTracker::new(TrackerConfig::default(), renderer.clone()).unwrap();
        (tracker, renderer)
    }

    #[test]
    fn test_first_point_recentres_from_empty_box() {
        let (tracker, renderer) = tracker();
        let point = GeoPoint::new(44.98, 8.56);

        let (artifact, bbox) = tracker.advance(point, BoundingBox::EMPTY, 200, 0.002).unwrap();

        assert!(!bbox.is_degenerate());
        assert!((bbox.center().lat - 44.98).abs() < 1e-9);
        assert!((bbox.center().lon - 8.56).abs() < 1e-9);
        assert!((bbox.half_width() - 0.002).abs() < 1e-9);
        assert!((bbox.half_height() - 0.002).abs() < 1e-9);
        assert_eq!(artifact.bbox, bbox);
        assert_eq!(renderer.requests.lock().unwrap()[0].dpi, 200);
    }

    #[test]
    fn test_point_within_margin_keeps_box() {
        let (tracker, _) = tracker();
        let previous = BoundingBox::centered(GeoPoint::new(44.98, 8.56), 0.002);
        let nearby = GeoPoint::new(44.9805, 8.5605);

        let (_, bbox) = tracker.advance(nearby, previous, 200, 0.002).unwrap();
        assert_eq!(bbox, previous);
    }

    #[test]
    fn test_point_outside_margin_recentres() {
        let (tracker, _) = tracker();
        let previous = BoundingBox::centered(GeoPoint::new(44.98, 8.56), 0.002);
        // Inside the box but within the outer quarter
        let edge = GeoPoint::new(44.9818, 8.56);

        let (_, bbox) = tracker.advance(edge, previous, 200, 0.002).unwrap();
        assert_ne!(bbox, previous);
        assert!(bbox.retains(edge, tracker.config().margin));
    }

    #[test]
    fn test_demo_drive_keeps_point_retained() {
        let (tracker, _) = tracker();
        let mut bbox = BoundingBox::EMPTY;
        for &(lat, lon) in crate::location::DEMO_ROUTE.iter() {
            let point = GeoPoint::new(lat, lon);
            let (_, next) = tracker.advance(point, bbox, 200, DEFAULT_ZOOM).unwrap();
            assert!(next.retains(point, DEFAULT_MARGIN));
            bbox = next;
        }
    }

    #[test]
    fn test_render_failure_returns_error() {
        let (tracker, renderer) = tracker();
        *renderer.fail.lock().unwrap() = true;
        let previous = BoundingBox::centered(GeoPoint::new(44.98, 8.56), 0.002);

        let result = tracker.advance(GeoPoint::new(45.5, 9.0), previous, 200, 0.002);
        assert!(matches!(result, Err(ViewportError::Render(_))));

        // Retry with the unchanged previous box succeeds once tiles are back
        *renderer.fail.lock().unwrap() = false;
        let (_, bbox) = tracker
            .advance(GeoPoint::new(45.5, 9.0), previous, 200, 0.002)
            .unwrap();
        assert!(bbox.contains(GeoPoint::new(45.5, 9.0)));
    }

    #[test]
    fn test_advance_is_deterministic() {
        let (tracker, _) = tracker();
        let previous = BoundingBox::new(44.0, 8.0, 45.0, 9.0);
        let point = GeoPoint::new(44.95, 8.5);
        let a = tracker.advance(point, previous, 100, 0.01).unwrap();
        let b = tracker.advance(point, previous, 100, 0.01).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let (tracker, renderer) = tracker();
        let point = GeoPoint::new(44.98, 8.56);

        assert!(matches!(
            tracker.advance(GeoPoint::new(f64::NAN, 8.0), BoundingBox::EMPTY, 200, 0.002),
            Err(ViewportError::InvalidPoint { .. })
        ));
        assert!(matches!(
            tracker.advance(point, BoundingBox::EMPTY, 200, 0.0),
            Err(ViewportError::InvalidZoom(_))
        ));
        assert!(matches!(
            tracker.advance(point, BoundingBox::EMPTY, 0, 0.002),
            Err(ViewportError::InvalidDpi(0))
        ));
        assert!(renderer.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_margin_validation() {
        let renderer: Arc<dyn MapRenderer> = Arc::new(FakeRenderer::default());
        assert!(ViewportTracker::new(TrackerConfig { margin: 1.0 }, renderer.clone()).is_err());
        assert!(ViewportTracker::new(TrackerConfig { margin: -0.1 }, renderer.clone()).is_err());
        assert!(ViewportTracker::new(TrackerConfig { margin: 0.0 }, renderer).is_ok());
    }
}
