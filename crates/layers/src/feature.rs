//! Raw backend payloads → features.
//!
//! A record whose geometry is missing or unusable is a `MalformedFeature`:
//! it is reported to the caller for counting and otherwise dropped, never
//! allowed to fail the layer it belongs to.

use foundation::bounds::GeoBounds;
use foundation::geo::LatLng;
use geojson::Geometry;
use serde_json::{Map, Value};

/// Column that holds the geometry in table rows.
pub const GEOMETRY_COLUMN: &str = "geom";

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedFeature {
    NotAnObject,
    MissingGeometry,
    Unparseable(String),
    NoPositions,
}

impl std::fmt::Display for MalformedFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MalformedFeature::NotAnObject => write!(f, "record is not an object"),
            MalformedFeature::MissingGeometry => write!(f, "record has no geometry"),
            MalformedFeature::Unparseable(msg) => write!(f, "unparseable geometry: {msg}"),
            MalformedFeature::NoPositions => write!(f, "geometry has no valid positions"),
        }
    }
}

impl std::error::Error for MalformedFeature {}

/// Features parsed from one payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeatures {
    pub features: Vec<Feature>,
    /// Records present in the payload, well-formed or not.
    pub received: usize,
    pub skipped: usize,
}

impl ParsedFeatures {
    fn push(&mut self, parsed: Result<Feature, MalformedFeature>) {
        self.received += 1;
        match parsed {
            Ok(feature) => self.features.push(feature),
            Err(reason) => {
                tracing::debug!("skipping feature: {reason}");
                self.skipped += 1;
            }
        }
    }
}

/// Accepts a GeoJSON geometry object, or a string holding one.
pub fn parse_geometry(raw: &Value) -> Result<Geometry, MalformedFeature> {
    let geometry = match raw {
        Value::Null => return Err(MalformedFeature::MissingGeometry),
        Value::String(text) if text.trim().is_empty() => {
            return Err(MalformedFeature::MissingGeometry);
        }
        Value::String(text) => serde_json::from_str::<Geometry>(text),
        other => serde_json::from_value::<Geometry>(other.clone()),
    }
    .map_err(|e| MalformedFeature::Unparseable(e.to_string()))?;

    if geometry_bounds(&geometry).is_none() {
        return Err(MalformedFeature::NoPositions);
    }
    Ok(geometry)
}

/// One table row: attributes plus a `geom` column.
pub fn parse_row(row: &Value) -> Result<Feature, MalformedFeature> {
    let obj = row.as_object().ok_or(MalformedFeature::NotAnObject)?;
    let raw = obj
        .get(GEOMETRY_COLUMN)
        .ok_or(MalformedFeature::MissingGeometry)?;
    let geometry = parse_geometry(raw)?;
    let mut attributes = obj.clone();
    attributes.remove(GEOMETRY_COLUMN);
    Ok(Feature {
        geometry,
        attributes,
    })
}

pub fn parse_rows(rows: &[Value]) -> ParsedFeatures {
    let mut out = ParsedFeatures::default();
    for row in rows {
        out.push(parse_row(row));
    }
    out
}

/// A GeoJSON FeatureCollection. A missing `features` member is an empty
/// collection.
pub fn parse_feature_collection(collection: &Value) -> ParsedFeatures {
    let mut out = ParsedFeatures::default();
    let Some(features) = collection.get("features").and_then(Value::as_array) else {
        return out;
    };
    for feature in features {
        out.push(parse_collection_member(feature));
    }
    out
}

fn parse_collection_member(feature: &Value) -> Result<Feature, MalformedFeature> {
    let obj = feature.as_object().ok_or(MalformedFeature::NotAnObject)?;
    let geometry = parse_geometry(obj.get("geometry").unwrap_or(&Value::Null))?;
    let attributes = obj
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    Ok(Feature {
        geometry,
        attributes,
    })
}

/// Every position of `geometry`, in document order. Invalid positions are
/// left out.
pub fn positions(geometry: &Geometry) -> Vec<LatLng> {
    let mut out = Vec::new();
    collect_positions(&geometry.value, &mut out);
    out
}

/// Point positions only (`Point` / `MultiPoint`, including inside collections).
pub fn point_positions(geometry: &Geometry) -> Vec<LatLng> {
    let mut out = Vec::new();
    collect_points(&geometry.value, &mut out);
    out
}

pub fn geometry_bounds(geometry: &Geometry) -> Option<GeoBounds> {
    GeoBounds::from_points(positions(geometry))
}

fn collect_positions(value: &geojson::Value, out: &mut Vec<LatLng>) {
    use geojson::Value::*;
    let valid = |p: &Vec<f64>| LatLng::from_lng_lat(p);
    match value {
        Point(p) => out.extend(valid(p)),
        MultiPoint(ps) | LineString(ps) => out.extend(ps.iter().filter_map(valid)),
        MultiLineString(lines) | Polygon(lines) => {
            out.extend(lines.iter().flatten().filter_map(valid));
        }
        MultiPolygon(polys) => out.extend(polys.iter().flatten().flatten().filter_map(valid)),
        GeometryCollection(members) => {
            for g in members {
                collect_positions(&g.value, out);
            }
        }
    }
}

fn collect_points(value: &geojson::Value, out: &mut Vec<LatLng>) {
    match value {
        geojson::Value::Point(p) => out.extend(LatLng::from_lng_lat(p)),
        geojson::Value::MultiPoint(ps) => {
            out.extend(ps.iter().filter_map(|p| LatLng::from_lng_lat(p)));
        }
        geojson::Value::GeometryCollection(members) => {
            for g in members {
                collect_points(&g.value, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn row_with_object_geometry() {
        let f = parse_row(&json!({
            "nombre": "Estación 1",
            "geom": {"type": "Point", "coordinates": [-79.2, -4.0]}
        }))
        .unwrap();
        assert_eq!(f.attributes.get("nombre"), Some(&json!("Estación 1")));
        assert!(!f.attributes.contains_key("geom"));
        assert_eq!(point_positions(&f.geometry), vec![LatLng::new(-4.0, -79.2)]);
    }

    #[test]
    fn row_with_serialized_geometry() {
        let f = parse_row(&json!({
            "geom": "{\"type\":\"LineString\",\"coordinates\":[[0,0],[2,4]]}"
        }))
        .unwrap();
        let b = geometry_bounds(&f.geometry).unwrap();
        assert_eq!(b.center(), LatLng::new(2.0, 1.0));
        assert!(point_positions(&f.geometry).is_empty());
    }

    #[test]
    fn malformed_rows_are_classified() {
        assert_eq!(parse_row(&json!(3)), Err(MalformedFeature::NotAnObject));
        assert_eq!(
            parse_row(&json!({"a": 1})),
            Err(MalformedFeature::MissingGeometry)
        );
        assert_eq!(
            parse_row(&json!({"geom": null})),
            Err(MalformedFeature::MissingGeometry)
        );
        assert!(matches!(
            parse_row(&json!({"geom": "{not json"})),
            Err(MalformedFeature::Unparseable(_))
        ));
        assert_eq!(
            parse_row(&json!({"geom": {"type": "MultiPoint", "coordinates": []}})),
            Err(MalformedFeature::NoPositions)
        );
    }

    #[test]
    fn rows_skip_bad_records_and_keep_the_rest() {
        let parsed = parse_rows(&[
            json!({"id": 1, "geom": {"type": "Point", "coordinates": [1, 1]}}),
            json!({"id": 2, "geom": "garbage"}),
            json!({"id": 3, "geom": {"type": "Point", "coordinates": [2, 2]}}),
        ]);
        assert_eq!(parsed.received, 3);
        assert_eq!(parsed.skipped, 1);
        let ids: Vec<_> = parsed.features.iter().map(|f| f.attributes["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(3)]);
    }

    #[test]
    fn feature_collection_members() {
        let parsed = parse_feature_collection(&json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-79.2, -4.0]},
                 "properties": {"tipo_requerimiento": "bache"}},
                {"type": "Feature", "geometry": null, "properties": {}}
            ]
        }));
        assert_eq!(parsed.received, 2);
        assert_eq!(parsed.features.len(), 1);
        assert_eq!(
            parsed.features[0].attributes["tipo_requerimiento"],
            json!("bache")
        );
    }

    #[test]
    fn missing_features_member_is_empty() {
        let parsed = parse_feature_collection(&json!({"type": "FeatureCollection"}));
        assert_eq!(parsed, ParsedFeatures::default());
    }

    #[test]
    fn polygon_bounds() {
        let g: Geometry = serde_json::from_value(json!({
            "type": "Polygon",
            "coordinates": [[[-79.3, -4.1], [-79.1, -4.1], [-79.1, -3.9], [-79.3, -4.1]]]
        }))
        .unwrap();
        let b = geometry_bounds(&g).unwrap();
        assert_eq!(b.south_west, LatLng::new(-4.1, -79.3));
        assert_eq!(b.north_east, LatLng::new(-3.9, -79.1));
    }
}
