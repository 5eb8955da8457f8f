//! Region boundary geometry.
//!
//! A [`RegionBoundary`] is one named area of the boundary dataset: one or more
//! closed polygons (with optional holes). Coordinates follow the `geo`
//! convention of `x = longitude`, `y = latitude`.

use geo::{Area, BoundingRect, Coord, Intersects, LineString, MultiPolygon, Point, Polygon};

use super::error::BoundaryError;

/// Minimum number of distinct vertices in a ring.
pub const MIN_RING_VERTICES: usize = 3;

/// Axis-aligned bounds of a boundary in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl Bounds {
    /// Check whether a point lies within these bounds (edges inclusive).
    #[inline]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// One named region of the boundary dataset.
///
/// Immutable after construction. Construction validates the geometry, so
/// every `RegionBoundary` in the system has finite coordinates and rings of at
/// least [`MIN_RING_VERTICES`] distinct vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionBoundary {
    name: String,
    geometry: MultiPolygon<f64>,
    bounds: Bounds,
    area: f64,
}

impl RegionBoundary {
    /// Create a boundary from a name and its polygons.
    pub fn new(name: impl Into<String>, geometry: MultiPolygon<f64>) -> Result<Self, BoundaryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BoundaryError::MissingName);
        }
        if geometry.0.is_empty() {
            return Err(BoundaryError::EmptyGeometry);
        }

        for polygon in &geometry.0 {
            validate_ring(polygon.exterior())?;
            for hole in polygon.interiors() {
                validate_ring(hole)?;
            }
        }

        let rect = geometry.bounding_rect().ok_or(BoundaryError::EmptyGeometry)?;
        let bounds = Bounds {
            min_lat: rect.min().y,
            min_lon: rect.min().x,
            max_lat: rect.max().y,
            max_lon: rect.max().x,
        };
        let area = geometry.unsigned_area();

        Ok(Self {
            name,
            geometry,
            bounds,
            area,
        })
    }

    /// Convenience constructor for a single exterior ring of `(lat, lon)` vertices.
    ///
    /// The ring is closed automatically.
    pub fn from_lat_lon_ring(
        name: impl Into<String>,
        vertices: &[(f64, f64)],
    ) -> Result<Self, BoundaryError> {
        let exterior: LineString<f64> = vertices
            .iter()
            .map(|&(lat, lon)| Coord { x: lon, y: lat })
            .collect::<Vec<_>>()
            .into();
        Self::new(name, MultiPolygon(vec![Polygon::new(exterior, vec![])]))
    }

    /// Region name as found in the dataset.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Polygons making up this region.
    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    /// Bounding box of all polygons.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Planar area in square degrees (used only for ordering).
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Check whether the point lies inside or on the edge of this region.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.bounds.contains(lat, lon) && self.geometry.intersects(&Point::new(lon, lat))
    }
}

fn validate_ring(ring: &LineString<f64>) -> Result<(), BoundaryError> {
    if let Some(bad) = ring.coords().find(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(BoundaryError::NonFiniteCoordinate {
            lat: bad.y,
            lon: bad.x,
        });
    }
    if let Some(bad) = ring
        .coords()
        .find(|c| !(-90.0..=90.0).contains(&c.y) || !(-180.0..=180.0).contains(&c.x))
    {
        return Err(BoundaryError::OutOfRange {
            lat: bad.y,
            lon: bad.x,
        });
    }

    let mut distinct: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len());
    for coord in ring.coords() {
        if !distinct.contains(coord) {
            distinct.push(*coord);
        }
        if distinct.len() >= MIN_RING_VERTICES {
            return Ok(());
        }
    }
    Err(BoundaryError::TooFewVertices {
        found: distinct.len(),
    })
}
