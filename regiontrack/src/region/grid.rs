//! Grid cell coordinate type.
//!
//! A [`GridCell`] identifies one bucket of the coarse spatial grid the
//! [`SpatialIndex`](super::SpatialIndex) partitions boundaries into. Cells are
//! identified by the floor of `latitude / cell_degrees` and
//! `longitude / cell_degrees`, so with the default 1° grid a cell matches the
//! familiar one-degree tile naming.

use std::fmt;

/// Default grid cell size in degrees.
pub const DEFAULT_CELL_DEGREES: f64 = 1.0;

/// One cell of the coarse spatial grid.
///
/// # Examples
///
/// ```
/// use regiontrack::region::GridCell;
///
/// let cell = GridCell::new(43, 6);
/// assert_eq!(format!("{}", cell), "+43+006");
///
/// let cell = GridCell::from_lat_lon(43.67, 7.23, 1.0);
/// assert_eq!(cell.lat, 43);
/// assert_eq!(cell.lon, 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    /// Floor of `latitude / cell_degrees` (south edge index).
    pub lat: i32,
    /// Floor of `longitude / cell_degrees` (west edge index).
    pub lon: i32,
}

impl GridCell {
    /// Create a grid cell from integer indices.
    pub fn new(lat: i32, lon: i32) -> Self {
        Self { lat, lon }
    }

    /// Create the grid cell containing a floating-point lat/lon.
    ///
    /// `cell_degrees` must be positive; callers validate it once when the
    /// index is configured.
    pub fn from_lat_lon(lat: f64, lon: f64, cell_degrees: f64) -> Self {
        Self {
            lat: (lat / cell_degrees).floor() as i32,
            lon: (lon / cell_degrees).floor() as i32,
        }
    }

    /// All cells covering the rectangle `[min_lat, max_lat] × [min_lon, max_lon]`.
    ///
    /// Edges are inclusive: a rectangle whose north edge lies exactly on a
    /// cell boundary also covers the cell above it, so boundary points always
    /// find their candidates.
    pub fn covering(
        min_lat: f64,
        min_lon: f64,
        max_lat: f64,
        max_lon: f64,
        cell_degrees: f64,
    ) -> impl Iterator<Item = GridCell> {
        let south_west = Self::from_lat_lon(min_lat, min_lon, cell_degrees);
        let north_east = Self::from_lat_lon(max_lat, max_lon, cell_degrees);
        (south_west.lat..=north_east.lat).flat_map(move |lat| {
            (south_west.lon..=north_east.lon).map(move |lon| GridCell::new(lat, lon))
        })
    }
}

impl fmt::Display for GridCell {
    /// Format as a tile-style name (e.g., `+43+006`, `-46+012`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+03}{:+04}", self.lat, self.lon)
    }
}
