//! Geographic points and bounding boxes.

use std::fmt;

/// A point in signed degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and within [-90, 90] x [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// The geographic rectangle currently shown on the display.
///
/// The all-zero box is the initial "nothing shown yet" value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// The initial, degenerate box.
    pub const EMPTY: Self = Self {
        min_lat: 0.0,
        min_lon: 0.0,
        max_lat: 0.0,
        max_lon: 0.0,
    };

    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Box centred on `center` extending `half_extent` degrees on each side.
    pub fn centered(center: GeoPoint, half_extent: f64) -> Self {
        Self {
            min_lat: center.lat - half_extent,
            min_lon: center.lon - half_extent,
            max_lat: center.lat + half_extent,
            max_lon: center.lon + half_extent,
        }
    }

    /// True when the box has no area or non-finite edges.
    pub fn is_degenerate(&self) -> bool {
        let edges = [self.min_lat, self.min_lon, self.max_lat, self.max_lon];
        edges.iter().any(|e| !e.is_finite())
            || self.max_lat <= self.min_lat
            || self.max_lon <= self.min_lon
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    /// Half the latitude span.
    pub fn half_height(&self) -> f64 {
        (self.max_lat - self.min_lat) / 2.0
    }

    /// Half the longitude span.
    pub fn half_width(&self) -> f64 {
        (self.max_lon - self.min_lon) / 2.0
    }

    /// Edges inclusive.
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lon >= self.min_lon
            && point.lon <= self.max_lon
    }

    /// Whether the point lies inside the box shrunk by `margin` times the
    /// half-extent on every side.
    ///
    /// A degenerate box retains nothing.
    pub fn retains(&self, point: GeoPoint, margin: f64) -> bool {
        if self.is_degenerate() {
            return false;
        }
        let inset_lat = margin * self.half_height();
        let inset_lon = margin * self.half_width();
        point.lat >= self.min_lat + inset_lat
            && point.lat <= self.max_lat - inset_lat
            && point.lon >= self.min_lon + inset_lon
            && point.lon <= self.max_lon - inset_lon
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.6}, {:.6}, {:.6}, {:.6}]",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}
