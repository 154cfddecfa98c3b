use crate::data::error::LoadError;
use geo::{Geometry, MultiPolygon};
use geojson::{Feature, GeoJson};
use serde_json::Value as JsonValue;
use std::path::Path;
use tracing::{debug, warn};

/// Property names that carry the province and district of each feature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryFields {
    pub province: String,
    pub district: String,
}

impl Default for BoundaryFields {
    fn default() -> Self {
        Self {
            province: "NAME_1".to_string(),
            district: "NAME_2".to_string(),
        }
    }
}

/// One boundary feature before it is joined with cluster data
#[derive(Debug, Clone)]
pub struct BoundaryFeature {
    pub province: String,
    pub district: String,
    pub shape: MultiPolygon<f64>,
}

/// Parse administrative boundaries from the bytes of a GeoJSON file.
/// `path` is only used in errors and logs.
pub fn parse_boundaries(path: &Path, mut bytes: Vec<u8>, fields: &BoundaryFields) -> Result<Vec<BoundaryFeature>, LoadError> {
    let geojson: GeoJson = simd_json::serde::from_slice(&mut bytes).map_err(|e| LoadError::GeoJson {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => {
            return Err(LoadError::NotFeatureCollection {
                path: path.to_path_buf(),
            })
        }
    };

    let boundaries: Vec<BoundaryFeature> = features
        .into_iter()
        .map(|feature| to_boundary(feature, fields))
        .collect();

    let without_geometry = boundaries.iter().filter(|b| b.shape.0.is_empty()).count();
    if without_geometry > 0 {
        warn!(count = without_geometry, "boundary features without polygon geometry");
    }
    debug!(path = %path.display(), features = boundaries.len(), "read boundaries");

    Ok(boundaries)
}

fn to_boundary(mut feature: Feature, fields: &BoundaryFields) -> BoundaryFeature {
    let province = property_text(&feature, &fields.province);
    let district = property_text(&feature, &fields.district);

    let mut polygons = Vec::new();
    if let Some(geometry) = feature.geometry.take() {
        match Geometry::<f64>::try_from(geometry) {
            Ok(geometry) => collect_polygons(geometry, &mut polygons),
            Err(e) => warn!(district = %district, error = %e, "unusable boundary geometry"),
        }
    }

    BoundaryFeature {
        province,
        district,
        shape: MultiPolygon::new(polygons),
    }
}

/// Property value as text; numbers are formatted, anything else is empty
fn property_text(feature: &Feature, name: &str) -> String {
    match feature.property(name) {
        Some(JsonValue::String(s)) => s.trim().to_string(),
        Some(JsonValue::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn collect_polygons(geometry: Geometry<f64>, out: &mut Vec<geo::Polygon<f64>>) {
    match geometry {
        Geometry::Polygon(polygon) => out.push(polygon),
        Geometry::MultiPolygon(multi) => out.extend(multi),
        Geometry::GeometryCollection(collection) => {
            for g in collection {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}
