//! SpatialIndex - grid-bucketed point-in-region lookup.
//!
//! Boundaries are kept in a single list in *lookup order* and each grid cell
//! stores the (ascending) positions of the boundaries whose bounding box
//! touches it. A query floors the point to its cell, walks that cell's
//! candidates in order and returns the first boundary containing the point.
//!
//! # Lookup order
//!
//! Boundaries are ordered by ascending area, then name, then dataset order.
//! When boundaries overlap (a data error) or share an edge, the smallest one
//! wins. The rule depends only on the boundary data, so results are stable
//! across runs and across a cache round trip.
//!
//! # Immutability
//!
//! An index is never mutated after construction. The
//! [`RegionStore`](super::RegionStore) publishes a new index by swapping an
//! `Arc`, so readers see either the old or the new index, never a mix.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::boundary::RegionBoundary;
use super::grid::GridCell;

/// Read-only spatial index over region boundaries.
#[derive(Debug)]
pub struct SpatialIndex {
    regions: Vec<RegionBoundary>,
    cells: HashMap<GridCell, Vec<u32>>,
    cell_degrees: f64,
}

impl SpatialIndex {
    /// Build an index from boundaries in dataset order.
    ///
    /// # Panics
    ///
    /// Panics if `cell_degrees` is not a positive finite number. Configuration
    /// parsing rejects such values before an index is built.
    pub fn build(mut regions: Vec<RegionBoundary>, cell_degrees: f64) -> Self {
        assert!(
            cell_degrees.is_finite() && cell_degrees > 0.0,
            "cell_degrees must be positive"
        );

        // Stable sort: equal area and name keep dataset order.
        regions.sort_by(lookup_order);

        let mut cells: HashMap<GridCell, Vec<u32>> = HashMap::new();
        for (position, region) in regions.iter().enumerate() {
            let b = region.bounds();
            for cell in GridCell::covering(b.min_lat, b.min_lon, b.max_lat, b.max_lon, cell_degrees)
            {
                cells.entry(cell).or_default().push(position as u32);
            }
        }

        Self {
            regions,
            cells,
            cell_degrees,
        }
    }

    /// Reassemble an index from previously persisted parts.
    ///
    /// Checks that regions are in lookup order and that every cell list is
    /// strictly ascending and in range, so a reloaded index answers exactly
    /// like the one that was saved.
    pub(crate) fn from_parts(
        regions: Vec<RegionBoundary>,
        cells: HashMap<GridCell, Vec<u32>>,
        cell_degrees: f64,
    ) -> Result<Self, String> {
        if !(cell_degrees.is_finite() && cell_degrees > 0.0) {
            return Err(format!("invalid cell size {}", cell_degrees));
        }
        if regions
            .windows(2)
            .any(|pair| lookup_order(&pair[0], &pair[1]) == Ordering::Greater)
        {
            return Err("regions are not in lookup order".to_string());
        }

        let count = regions.len() as u32;
        for (cell, positions) in &cells {
            if positions.iter().any(|&p| p >= count) {
                return Err(format!("cell {} references an unknown region", cell));
            }
            if positions.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(format!("cell {} candidates are not ascending", cell));
            }
        }

        Ok(Self {
            regions,
            cells,
            cell_degrees,
        })
    }

    /// Find the region containing the point, if any.
    pub fn locate(&self, lat: f64, lon: f64) -> Option<&RegionBoundary> {
        self.candidates(lat, lon)
            .iter()
            .map(|&position| &self.regions[position as usize])
            .find(|region| region.contains(lat, lon))
    }

    /// Candidate region positions for the point's grid cell, in lookup order.
    pub fn candidates(&self, lat: f64, lon: f64) -> &[u32] {
        let cell = GridCell::from_lat_lon(lat, lon, self.cell_degrees);
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All regions in lookup order.
    pub fn regions(&self) -> &[RegionBoundary] {
        &self.regions
    }

    /// Grid cells and their candidate lists, sorted by cell.
    pub fn cells(&self) -> Vec<(GridCell, &[u32])> {
        let mut cells: Vec<_> = self
            .cells
            .iter()
            .map(|(cell, positions)| (*cell, positions.as_slice()))
            .collect();
        cells.sort_by_key(|(cell, _)| *cell);
        cells
    }

    /// Grid cell size in degrees.
    pub fn cell_degrees(&self) -> f64 {
        self.cell_degrees
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the index holds no regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Number of non-empty grid cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

fn lookup_order(a: &RegionBoundary, b: &RegionBoundary) -> Ordering {
    a.area()
        .total_cmp(&b.area())
        .then_with(|| a.name().cmp(b.name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(name: &str, lat: (f64, f64), lon: (f64, f64)) -> RegionBoundary {
        RegionBoundary::from_lat_lon_ring(
            name,
            &[(lat.0, lon.0), (lat.0, lon.1), (lat.1, lon.1), (lat.1, lon.0)],
        )
        .unwrap()
    }

    fn sample_index() -> SpatialIndex {
        SpatialIndex::build(
            vec![
                rect("Piemonte", (44.0, 46.5), (6.6, 9.2)),
                rect("Liguria", (43.8, 44.0), (7.5, 10.0)),
                rect("Lombardia", (44.7, 46.6), (9.2, 11.4)),
            ],
            1.0,
        )
    }

    #[test]
    fn test_locate_inside_each_region() {
        let index = sample_index();
        assert_eq!(index.locate(45.0, 8.0).unwrap().name(), "Piemonte");
        assert_eq!(index.locate(43.9, 8.5).unwrap().name(), "Liguria");
        assert_eq!(index.locate(45.5, 10.0).unwrap().name(), "Lombardia");
    }

    #[test]
    fn test_locate_outside_all_regions() {
        let index = sample_index();
        assert!(index.locate(50.0, 50.0).is_none());
        assert!(index.locate(-45.0, 8.0).is_none());
    }

    #[test]
    fn test_every_region_indexed_once() {
        let index = sample_index();
        assert_eq!(index.len(), 3);

        let mut names: Vec<_> = index.regions().iter().map(|r| r.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names, vec!["Liguria", "Lombardia", "Piemonte"]);

        // Each region is reachable from at least one cell
        for position in 0..index.len() as u32 {
            assert!(index
                .cells()
                .iter()
                .any(|(_, candidates)| candidates.contains(&position)));
        }
    }

    #[test]
    fn test_query_touches_only_nearby_candidates() {
        let index = sample_index();
        // Cell +43+007 holds Liguria only
        assert_eq!(index.candidates(43.9, 7.6).len(), 1);
        // Far away cell is empty
        assert!(index.candidates(10.0, 100.0).is_empty());
    }

    #[test]
    fn test_overlap_resolves_to_smallest_area() {
        let big = rect("Big", (44.0, 46.0), (8.0, 10.0));
        let small = rect("Small", (44.5, 45.0), (8.5, 9.0));

        let forward = SpatialIndex::build(vec![big.clone(), small.clone()], 1.0);
        let reverse = SpatialIndex::build(vec![small, big], 1.0);

        assert_eq!(forward.locate(44.7, 8.7).unwrap().name(), "Small");
        assert_eq!(reverse.locate(44.7, 8.7).unwrap().name(), "Small");
        assert_eq!(forward.locate(45.5, 9.5).unwrap().name(), "Big");
    }

    #[test]
    fn test_shared_edge_is_deterministic() {
        let west = rect("West", (44.0, 45.0), (8.0, 9.0));
        let east = rect("East", (44.0, 45.0), (9.0, 10.0));

        let index = SpatialIndex::build(vec![west.clone(), east.clone()], 1.0);
        let swapped = SpatialIndex::build(vec![east, west], 1.0);

        // Equal area: name order decides
        assert_eq!(index.locate(44.5, 9.0).unwrap().name(), "East");
        assert_eq!(swapped.locate(44.5, 9.0).unwrap().name(), "East");
        for _ in 0..10 {
            assert_eq!(index.locate(44.5, 9.0).unwrap().name(), "East");
        }
    }

    #[test]
    fn test_fine_grid_matches_coarse_grid() {
        let coarse = sample_index();
        let fine = SpatialIndex::build(coarse.regions().to_vec(), 0.25);

        for (lat, lon) in [(45.0, 8.0), (43.9, 8.5), (45.5, 10.0), (50.0, 50.0), (44.0, 9.2)] {
            assert_eq!(
                coarse.locate(lat, lon).map(|r| r.name()),
                fine.locate(lat, lon).map(|r| r.name()),
                "mismatch at ({}, {})",
                lat,
                lon
            );
        }
        assert!(fine.cell_count() > coarse.cell_count());
    }

    #[test]
    fn test_from_parts_rejects_bad_candidates() {
        let index = sample_index();
        let regions = index.regions().to_vec();

        let mut cells = HashMap::new();
        cells.insert(GridCell::new(44, 8), vec![5]);
        assert!(SpatialIndex::from_parts(regions.clone(), cells, 1.0).is_err());

        let mut cells = HashMap::new();
        cells.insert(GridCell::new(44, 8), vec![1, 0]);
        assert!(SpatialIndex::from_parts(regions.clone(), cells, 1.0).is_err());

        let mut reversed = regions;
        reversed.reverse();
        assert!(SpatialIndex::from_parts(reversed, HashMap::new(), 1.0).is_err());
    }

    #[test]
    fn test_empty_index() {
        let index = SpatialIndex::build(Vec::new(), 1.0);
        assert!(index.is_empty());
        assert!(index.locate(44.5, 8.5).is_none());
    }
}
