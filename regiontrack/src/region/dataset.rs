//! Boundary dataset parsing.
//!
//! The dataset is a GeoJSON `FeatureCollection` whose features carry a
//! `Polygon` or `MultiPolygon` geometry and a name property. Each feature is
//! decoded independently so a malformed record only costs that record: it is
//! reported in [`ParsedDataset::skipped`] and the rest of the file still loads.

use std::fs;
use std::path::Path;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::boundary::RegionBoundary;
use super::error::{BoundaryError, DatasetError};

/// Default feature property holding the region name.
pub const DEFAULT_NAME_PROPERTY: &str = "name";

/// A feature that was rejected during parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    /// Position of the feature in the collection.
    pub index: usize,
    /// Name, when the feature had one.
    pub name: Option<String>,
    /// Why it was rejected.
    pub reason: BoundaryError,
}

/// Result of parsing a boundary dataset.
#[derive(Debug, Default)]
pub struct ParsedDataset {
    /// Valid regions in dataset order.
    pub regions: Vec<RegionBoundary>,
    /// Rejected features.
    pub skipped: Vec<SkippedRecord>,
}

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<Value>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

/// Read and parse a boundary dataset file.
pub fn load_dataset(
    path: &Path,
    name_property: &str,
    debug_records: bool,
) -> Result<ParsedDataset, DatasetError> {
    let content = fs::read_to_string(path).map_err(|e| DatasetError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let parsed = parse_dataset(&content, name_property, debug_records).map_err(|reason| {
        DatasetError::Format {
            path: path.to_path_buf(),
            reason,
        }
    })?;

    if parsed.regions.is_empty() {
        return Err(DatasetError::NoRegions {
            path: path.to_path_buf(),
            skipped: parsed.skipped.len(),
        });
    }

    Ok(parsed)
}

/// Parse GeoJSON text into region boundaries.
///
/// Returns `Err` only when the document itself is not a FeatureCollection.
pub fn parse_dataset(
    content: &str,
    name_property: &str,
    debug_records: bool,
) -> Result<ParsedDataset, String> {
    let collection: FeatureCollection =
        serde_json::from_str(content).map_err(|e| e.to_string())?;
    if collection.kind != "FeatureCollection" {
        return Err(format!("unexpected top-level type '{}'", collection.kind));
    }

    let mut parsed = ParsedDataset::default();

    for (index, raw) in collection.features.into_iter().enumerate() {
        let (name, result) = parse_feature(raw, name_property);
        match result {
            Ok(region) => {
                if debug_records {
                    debug!(
                        index,
                        region = region.name(),
                        polygons = region.geometry().0.len(),
                        "Loaded region boundary"
                    );
                }
                parsed.regions.push(region);
            }
            Err(reason) => {
                warn!(index, name = ?name, reason = %reason, "Skipping malformed boundary record");
                parsed.skipped.push(SkippedRecord {
                    index,
                    name,
                    reason,
                });
            }
        }
    }

    Ok(parsed)
}

fn parse_feature(
    raw: Value,
    name_property: &str,
) -> (Option<String>, Result<RegionBoundary, BoundaryError>) {
    let feature: Feature = match serde_json::from_value(raw) {
        Ok(f) => f,
        Err(e) => return (None, Err(BoundaryError::MalformedFeature(e.to_string()))),
    };

    let name = feature
        .properties
        .as_ref()
        .and_then(|props| props.get(name_property))
        .and_then(|value| match value {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty());

    let result = match (&name, feature.geometry) {
        (None, _) => Err(BoundaryError::MissingName),
        (Some(_), None) => Err(BoundaryError::EmptyGeometry),
        (Some(name), Some(geometry)) => {
            parse_geometry(&geometry).and_then(|mp| RegionBoundary::new(name.clone(), mp))
        }
    };

    (name, result)
}

fn parse_geometry(geometry: &Geometry) -> Result<MultiPolygon<f64>, BoundaryError> {
    match geometry.kind.as_str() {
        "Polygon" => Ok(MultiPolygon(vec![parse_polygon(&geometry.coordinates)?])),
        "MultiPolygon" => {
            let parts = as_array(&geometry.coordinates)?;
            let polygons = parts
                .iter()
                .map(parse_polygon)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(MultiPolygon(polygons))
        }
        other => Err(BoundaryError::UnsupportedGeometry(other.to_string())),
    }
}

fn parse_polygon(value: &Value) -> Result<Polygon<f64>, BoundaryError> {
    let rings = as_array(value)?;
    let mut rings = rings.iter().map(parse_ring);
    let exterior = rings.next().ok_or(BoundaryError::EmptyGeometry)??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn parse_ring(value: &Value) -> Result<LineString<f64>, BoundaryError> {
    let positions = as_array(value)?;
    let coords = positions
        .iter()
        .map(parse_position)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LineString::new(coords))
}

/// GeoJSON positions are `[lon, lat]` or `[lon, lat, alt]`.
fn parse_position(value: &Value) -> Result<Coord<f64>, BoundaryError> {
    let numbers = as_array(value)?;
    match (
        numbers.first().and_then(Value::as_f64),
        numbers.get(1).and_then(Value::as_f64),
    ) {
        (Some(lon), Some(lat)) => Ok(Coord { x: lon, y: lat }),
        _ => Err(BoundaryError::MalformedPosition(value.to_string())),
    }
}

fn as_array(value: &Value) -> Result<&Vec<Value>, BoundaryError> {
    value
        .as_array()
        .ok_or_else(|| BoundaryError::MalformedPosition(value.to_string()))
}
