//! Persistent cache for the region [`SpatialIndex`].
//!
//! Saves and loads the built index so the boundary dataset does not have to be
//! parsed and bucketed on every launch. The cache stores the validated
//! boundaries in lookup order together with the grid buckets, plus a
//! fingerprint of the dataset file for invalidation checks.
//!
//! # Cache Format
//!
//! Line-based text, fields separated by two spaces:
//!
//! ```text
//! REGION INDEX CACHE
//! 1                                          # format version
//! /path/to/regions.geojson                   # dataset path
//! 1703980800123  48211                       # dataset mtime (ms), size (bytes)
//! 1                                          # cell size in degrees
//! 2                                          # region count
//!                                            # blank line separator
//! REGION  1  Liguria                         # polygon count, name
//! POLYGON  1                                 # ring count (exterior first)
//! RING  43.8,7.5  43.8,10  44,10  44,7.5  43.8,7.5
//! REGION  1  Piemonte
//! POLYGON  1
//! RING  44,6.6  44,9.2  46.5,9.2  46.5,6.6  44,6.6
//! CELL  43  7  0                             # cell lat, cell lon, candidates
//! CELL  44  7  1
//! ```
//!
//! Coordinates are written with Rust's shortest round-trip float formatting,
//! so a reloaded index answers every query exactly like the saved one.
//!
//! # Cache Invalidation
//!
//! The cache is stale when:
//! - The format version changes
//! - The dataset path changes
//! - The dataset's mtime or byte size changes
//! - The configured grid cell size changes

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use tracing::{debug, info};

use super::boundary::RegionBoundary;
use super::grid::GridCell;
use super::index::SpatialIndex;

/// Cache format version. Increment when format changes.
const CACHE_VERSION: u32 = 1;

/// Magic header for cache file validation.
const CACHE_HEADER: &str = "REGION INDEX CACHE";

/// Field separator used in the file format (two spaces).
const FIELD_SEPARATOR: &str = "  ";

/// Default cache filename.
pub const CACHE_FILENAME: &str = "region_index.cache";

/// Identity of a dataset file, used to detect changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetFingerprint {
    /// Dataset path as configured.
    pub path: PathBuf,
    /// Modification time in milliseconds since UNIX epoch.
    pub mtime_millis: u64,
    /// File size in bytes.
    pub size: u64,
}

impl DatasetFingerprint {
    /// Stat the dataset file.
    pub fn of(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("Failed to stat dataset {}: {}", path.display(), e),
            )
        })?;

        let mtime_millis = metadata
            .modified()?
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Ok(Self {
            path: path.to_path_buf(),
            mtime_millis,
            size: metadata.len(),
        })
    }
}

/// Result of attempting to load the region index cache.
#[derive(Debug)]
pub enum CacheLoadResult {
    /// Cache loaded successfully.
    Loaded {
        /// The reassembled index.
        index: SpatialIndex,
    },
    /// Cache exists but was written for a different dataset or settings.
    Stale {
        /// Reason for staleness.
        reason: String,
    },
    /// Cache file doesn't exist.
    NotFound,
    /// Cache is corrupted or unreadable.
    Invalid {
        /// Error description.
        error: String,
    },
}

impl CacheLoadResult {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            CacheLoadResult::Loaded { .. } => "loaded",
            CacheLoadResult::Stale { .. } => "stale",
            CacheLoadResult::NotFound => "not_found",
            CacheLoadResult::Invalid { .. } => "invalid",
        }
    }
}

/// Save the index to `cache_path`.
///
/// The file is written to a temporary sibling and renamed into place, so a
/// concurrent reader never sees a partial cache.
pub fn save_cache(
    index: &SpatialIndex,
    fingerprint: &DatasetFingerprint,
    cache_path: &Path,
) -> io::Result<()> {
    if let Some(parent) = cache_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = cache_path.with_extension("cache.tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        write_cache(&mut writer, index, fingerprint)?;
        writer.flush()?;
    }
    fs::rename(&tmp_path, cache_path)?;

    info!(
        path = %cache_path.display(),
        regions = index.len(),
        cells = index.cell_count(),
        "Saved region index cache"
    );

    Ok(())
}

fn write_cache<W: Write>(
    writer: &mut W,
    index: &SpatialIndex,
    fingerprint: &DatasetFingerprint,
) -> io::Result<()> {
    // Header section
    writeln!(writer, "{}", CACHE_HEADER)?;
    writeln!(writer, "{}", CACHE_VERSION)?;
    writeln!(writer, "{}", fingerprint.path.display())?;
    writeln!(
        writer,
        "{}{}{}",
        fingerprint.mtime_millis, FIELD_SEPARATOR, fingerprint.size
    )?;
    writeln!(writer, "{}", index.cell_degrees())?;
    writeln!(writer, "{}", index.len())?;
    writeln!(writer)?;

    // Regions in lookup order
    for region in index.regions() {
        let polygons = &region.geometry().0;
        writeln!(
            writer,
            "REGION{}{}{}{}",
            FIELD_SEPARATOR,
            polygons.len(),
            FIELD_SEPARATOR,
            region.name()
        )?;
        for polygon in polygons {
            writeln!(
                writer,
                "POLYGON{}{}",
                FIELD_SEPARATOR,
                1 + polygon.interiors().len()
            )?;
            write_ring(writer, polygon.exterior())?;
            for hole in polygon.interiors() {
                write_ring(writer, hole)?;
            }
        }
    }

    // Grid buckets
    for (cell, candidates) in index.cells() {
        write!(
            writer,
            "CELL{}{}{}{}",
            FIELD_SEPARATOR, cell.lat, FIELD_SEPARATOR, cell.lon
        )?;
        for position in candidates {
            write!(writer, "{}{}", FIELD_SEPARATOR, position)?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn write_ring<W: Write>(writer: &mut W, ring: &LineString<f64>) -> io::Result<()> {
    write!(writer, "RING")?;
    for coord in ring.coords() {
        write!(writer, "{}{},{}", FIELD_SEPARATOR, coord.y, coord.x)?;
    }
    writeln!(writer)
}

/// Load the index from `cache_path`.
///
/// Validates the cache against the current dataset fingerprint and grid cell
/// size before loading. Returns `Stale` if either changed, `NotFound` if the
/// cache doesn't exist, or `Invalid` if the cache is corrupted.
pub fn load_cache(
    cache_path: &Path,
    fingerprint: &DatasetFingerprint,
    cell_degrees: f64,
) -> CacheLoadResult {
    if !cache_path.exists() {
        debug!(path = %cache_path.display(), "Cache file not found");
        return CacheLoadResult::NotFound;
    }

    let file = match File::open(cache_path) {
        Ok(f) => f,
        Err(e) => {
            return CacheLoadResult::Invalid {
                error: format!("Failed to open cache file: {}", e),
            }
        }
    };

    let result = read_cache(BufReader::new(file), fingerprint, cell_degrees);
    if let CacheLoadResult::Loaded { index } = &result {
        info!(
            path = %cache_path.display(),
            regions = index.len(),
            cells = index.cell_count(),
            "Loaded region index from cache"
        );
    }
    result
}

fn read_cache<R: BufRead>(
    reader: R,
    fingerprint: &DatasetFingerprint,
    cell_degrees: f64,
) -> CacheLoadResult {
    let mut lines = CacheLines::new(reader);

    // Validate header
    match lines.next() {
        Ok(header) if header == CACHE_HEADER => {}
        Ok(header) => {
            return CacheLoadResult::Invalid {
                error: format!(
                    "Invalid header: expected '{}', got '{}'",
                    CACHE_HEADER, header
                ),
            }
        }
        Err(error) => return CacheLoadResult::Invalid { error },
    }

    let version: u32 = match lines.parse("cache version") {
        Ok(v) => v,
        Err(error) => return CacheLoadResult::Invalid { error },
    };
    if version != CACHE_VERSION {
        return CacheLoadResult::Stale {
            reason: format!(
                "Cache version mismatch: expected {}, got {}",
                CACHE_VERSION, version
            ),
        };
    }

    let cached = match read_fingerprint(&mut lines) {
        Ok(f) => f,
        Err(error) => return CacheLoadResult::Invalid { error },
    };
    if let Some(reason) = validate_fingerprint(&cached, fingerprint) {
        return CacheLoadResult::Stale { reason };
    }

    let cached_cell_degrees: f64 = match lines.parse("cell size") {
        Ok(c) => c,
        Err(error) => return CacheLoadResult::Invalid { error },
    };
    if cached_cell_degrees != cell_degrees {
        return CacheLoadResult::Stale {
            reason: format!(
                "Cell size changed: {} → {}",
                cached_cell_degrees, cell_degrees
            ),
        };
    }

    match read_body(&mut lines, cell_degrees) {
        Ok(index) => CacheLoadResult::Loaded { index },
        Err(error) => CacheLoadResult::Invalid { error },
    }
}

fn read_fingerprint<R: BufRead>(lines: &mut CacheLines<R>) -> Result<DatasetFingerprint, String> {
    let path = PathBuf::from(lines.next()?);
    let line = lines.next()?;
    let parts: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if parts.len() != 2 {
        return Err(format!("Malformed dataset metadata line: {}", line));
    }

    let parse = |s: &str| {
        s.parse::<u64>()
            .map_err(|_| format!("Malformed dataset metadata line: {}", line))
    };
    Ok(DatasetFingerprint {
        path,
        mtime_millis: parse(parts[0])?,
        size: parse(parts[1])?,
    })
}

/// Returns `Some(reason)` if the dataset has changed, `None` if valid.
fn validate_fingerprint(cached: &DatasetFingerprint, current: &DatasetFingerprint) -> Option<String> {
    if cached.path != current.path {
        return Some(format!(
            "Dataset path changed: {} → {}",
            cached.path.display(),
            current.path.display()
        ));
    }
    if cached.mtime_millis != current.mtime_millis {
        return Some(format!("Dataset {} modified", current.path.display()));
    }
    if cached.size != current.size {
        return Some(format!(
            "Dataset size changed: {} → {}",
            cached.size, current.size
        ));
    }
    None
}

fn read_body<R: BufRead>(lines: &mut CacheLines<R>, cell_degrees: f64) -> Result<SpatialIndex, String> {
    let region_count: usize = lines.parse("region count")?;

    let separator = lines.next()?;
    if !separator.is_empty() {
        return Err(format!("Expected blank separator, got '{}'", separator));
    }

    let mut regions = Vec::with_capacity(region_count);
    for i in 0..region_count {
        let line = lines.next()?;
        let (polygon_count, name) =
            parse_region_line(&line).ok_or_else(|| format!("Malformed region line {}: {}", i, line))?;

        let mut polygons = Vec::with_capacity(polygon_count);
        for _ in 0..polygon_count {
            polygons.push(read_polygon(lines)?);
        }

        let region = RegionBoundary::new(name, MultiPolygon(polygons))
            .map_err(|e| format!("Region {} failed validation: {}", i, e))?;
        regions.push(region);
    }

    let mut cells = HashMap::new();
    while let Some(line) = lines.next_opt()? {
        if line.is_empty() {
            continue;
        }
        let (cell, candidates) =
            parse_cell_line(&line).ok_or_else(|| format!("Malformed cell line: {}", line))?;
        if cells.insert(cell, candidates).is_some() {
            return Err(format!("Duplicate cell {}", cell));
        }
    }

    SpatialIndex::from_parts(regions, cells, cell_degrees)
}

fn read_polygon<R: BufRead>(lines: &mut CacheLines<R>) -> Result<Polygon<f64>, String> {
    let line = lines.next()?;
    let ring_count: usize = line
        .strip_prefix("POLYGON")
        .and_then(|rest| rest.trim().parse().ok())
        .filter(|&count| count >= 1)
        .ok_or_else(|| format!("Malformed polygon line: {}", line))?;

    let exterior = read_ring(lines)?;
    let mut holes = Vec::with_capacity(ring_count - 1);
    for _ in 1..ring_count {
        holes.push(read_ring(lines)?);
    }
    Ok(Polygon::new(exterior, holes))
}

fn read_ring<R: BufRead>(lines: &mut CacheLines<R>) -> Result<LineString<f64>, String> {
    let line = lines.next()?;
    parse_ring_line(&line).ok_or_else(|| format!("Malformed ring line: {}", line))
}

/// Parse a region line.
///
/// Format: `REGION  polygon_count  name`
fn parse_region_line(line: &str) -> Option<(usize, String)> {
    let mut parts = line.splitn(3, FIELD_SEPARATOR);
    if parts.next()? != "REGION" {
        return None;
    }
    let polygon_count = parts.next()?.parse().ok()?;
    let name = parts.next()?.to_string();
    Some((polygon_count, name))
}

/// Parse a ring line.
///
/// Format: `RING  lat,lon  lat,lon  ...`
fn parse_ring_line(line: &str) -> Option<LineString<f64>> {
    let mut parts = line.split(FIELD_SEPARATOR);
    if parts.next()? != "RING" {
        return None;
    }

    let coords = parts
        .map(|vertex| {
            let (lat, lon) = vertex.split_once(',')?;
            Some(Coord {
                x: lon.parse().ok()?,
                y: lat.parse().ok()?,
            })
        })
        .collect::<Option<Vec<_>>>()?;
    Some(LineString::from(coords))
}

/// Parse a cell line.
///
/// Format: `CELL  lat  lon  candidate  candidate  ...`
fn parse_cell_line(line: &str) -> Option<(GridCell, Vec<u32>)> {
    let mut parts = line.split(FIELD_SEPARATOR);
    if parts.next()? != "CELL" {
        return None;
    }
    let lat = parts.next()?.parse().ok()?;
    let lon = parts.next()?.parse().ok()?;
    let candidates = parts
        .map(|p| p.parse().ok())
        .collect::<Option<Vec<u32>>>()?;
    if candidates.is_empty() {
        return None;
    }
    Some((GridCell::new(lat, lon), candidates))
}

/// Line reader that turns I/O errors and early EOF into messages.
struct CacheLines<R> {
    lines: Lines<R>,
}

impl<R: BufRead> CacheLines<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    fn next_opt(&mut self) -> Result<Option<String>, String> {
        self.lines
            .next()
            .transpose()
            .map_err(|e| format!("Failed to read cache line: {}", e))
    }

    fn next(&mut self) -> Result<String, String> {
        self.next_opt()?
            .ok_or_else(|| "Unexpected end of cache file".to_string())
    }

    fn parse<T: std::str::FromStr>(&mut self, what: &str) -> Result<T, String> {
        let line = self.next()?;
        line.trim()
            .parse()
            .map_err(|_| format!("Failed to parse {}: '{}'", what, line))
    }
}
