/*!
Structs for the GeoJSON files written by `ogr2ogr` from OSM extracts.
They are used to deserialize the input into Rust structs. Only the parts the
converter reads are modelled; everything else is ignored.
 */
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::Error;

/// A position `[x, y]`. Extra ordinates (elevation, measure) are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "Vec<f64>")]
pub struct Position(pub [f64; 2]);

impl TryFrom<Vec<f64>> for Position {
    type Error = String;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        match value.as_slice() {
            [x, y, ..] => Ok(Position([*x, *y])),
            _ => Err(format!("position needs at least 2 ordinates, got {}", value.len())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: Position,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    /// Polygon, MultiPoint, MultiLineString, GeometryCollection, or a
    /// geometry whose coordinates could not be read.
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    /// Every vertex in document order.
    pub fn positions(&self) -> Box<dyn Iterator<Item = Position> + '_> {
        match self {
            Geometry::Point { coordinates } => Box::new(std::iter::once(*coordinates)),
            Geometry::LineString { coordinates } => Box::new(coordinates.iter().copied()),
            Geometry::MultiPolygon { coordinates } => {
                Box::new(coordinates.iter().flatten().flatten().copied())
            }
            Geometry::Unsupported => Box::new(std::iter::empty()),
        }
    }
}

fn lenient_geometry<'de, D>(deserializer: D) -> Result<Option<Geometry>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };

    match serde_json::from_value(value) {
        Ok(geometry) => Ok(Some(geometry)),
        Err(err) => {
            debug!("Unreadable geometry treated as unsupported: {}", err);
            Ok(Some(Geometry::Unsupported))
        }
    }
}

/// Reads a member as `T`, or `None` when it is null or has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };

    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(err) => {
            debug!("Ignoring unreadable {}: {}", std::any::type_name::<T>(), err);
            Ok(None)
        }
    }
}

/// Reads every element of `features`; an element that is not a feature
/// becomes an empty one, which converts to nothing.
fn lenient_features<'de, D>(deserializer: D) -> Result<Vec<Feature>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;

    Ok(values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).unwrap_or_else(|err| {
                debug!("Feature {}: unreadable, treated as empty: {}", index, err);
                Feature::default()
            })
        })
        .collect())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Feature {
    #[serde(default, deserialize_with = "lenient")]
    pub properties: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient_geometry")]
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrsProperties {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Crs {
    #[serde(default)]
    pub properties: CrsProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureCollection {
    #[serde(default, deserialize_with = "lenient")]
    pub bbox: Option<Vec<f64>>,
    #[serde(default, deserialize_with = "lenient")]
    pub crs: Option<Crs>,
    #[serde(deserialize_with = "lenient_features")]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn from_json(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn crs_name(&self) -> Option<&str> {
        self.crs.as_ref()?.properties.name.as_deref()
    }

    /// `[min_x, min_y, max_x, max_y]` from the `bbox` member. A 3D bbox
    /// (6 numbers) has its elevation bounds dropped.
    pub fn declared_bbox(&self) -> Option<[f64; 4]> {
        match self.bbox.as_deref()? {
            &[min_x, min_y, max_x, max_y] => Some([min_x, min_y, max_x, max_y]),
            &[min_x, min_y, _, max_x, max_y, _] => Some([min_x, min_y, max_x, max_y]),
            _ => None,
        }
    }

    /// Extent of all supported geometries; `None` when there is no vertex at all.
    pub fn computed_bbox(&self) -> Option<[f64; 4]> {
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);

        for Position([x, y]) in self
            .features
            .iter()
            .filter_map(|feature| feature.geometry.as_ref())
            .flat_map(Geometry::positions)
        {
            if x.is_finite() && y.is_finite() {
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }

        (min_x <= max_x && min_y <= max_y).then_some([min_x, min_y, max_x, max_y])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_geometries() {
        let fc = FeatureCollection::from_json(
            r#"{
                "type": "FeatureCollection",
                "bbox": [0, 0, 10, 10],
                "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::23700" } },
                "features": [
                    { "type": "Feature", "properties": { "name": "a" },
                      "geometry": { "type": "Point", "coordinates": [1, 2, 130.5] } },
                    { "type": "Feature", "properties": null,
                      "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] } },
                    { "type": "Feature", "properties": {},
                      "geometry": { "type": "MultiPolygon", "coordinates": [[[[0, 0], [1, 0], [1, 1], [0, 0]]]] } }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(fc.declared_bbox(), Some([0.0, 0.0, 10.0, 10.0]));
        assert_eq!(fc.crs_name(), Some("urn:ogc:def:crs:EPSG::23700"));
        assert_eq!(
            fc.features[0].geometry,
            Some(Geometry::Point {
                coordinates: Position([1.0, 2.0])
            })
        );
        assert!(fc.features[1].properties.is_none());
        assert_eq!(fc.features[2].geometry.as_ref().unwrap().positions().count(), 4);
    }

    #[test]
    fn other_geometry_types_are_unsupported() {
        let fc = FeatureCollection::from_json(
            r#"{ "features": [
                { "properties": {}, "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [0, 0]]] } },
                { "properties": {}, "geometry": { "type": "Point", "coordinates": [1] } },
                { "properties": {}, "geometry": null }
            ] }"#,
        )
        .unwrap();

        assert_eq!(fc.features[0].geometry, Some(Geometry::Unsupported));
        assert_eq!(fc.features[1].geometry, Some(Geometry::Unsupported));
        assert_eq!(fc.features[2].geometry, None);
    }

    #[test]
    fn three_dimensional_bbox() {
        let fc = FeatureCollection {
            bbox: Some(vec![1.0, 2.0, 0.0, 3.0, 4.0, 100.0]),
            ..Default::default()
        };
        assert_eq!(fc.declared_bbox(), Some([1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn computed_bbox_spans_all_vertices() {
        let fc = FeatureCollection::from_json(
            r#"{ "features": [
                { "geometry": { "type": "Point", "coordinates": [5, -1] } },
                { "geometry": { "type": "LineString", "coordinates": [[-2, 3], [4, 8]] } }
            ] }"#,
        )
        .unwrap();
        assert_eq!(fc.computed_bbox(), Some([-2.0, -1.0, 5.0, 8.0]));
        assert_eq!(FeatureCollection::default().computed_bbox(), None);
    }

    #[test]
    fn malformed_members_degrade_to_empty() {
        let fc = FeatureCollection::from_json(
            r#"{ "bbox": "whole world",
                 "crs": { "properties": { "name": 23700 } },
                 "features": [
                    null,
                    { "properties": "oops", "geometry": { "type": "Point", "coordinates": [1, 1] } },
                    42,
                    { "properties": { "highway": "primary" },
                      "geometry": { "type": "Point", "coordinates": [1, 1] } }
                 ] }"#,
        )
        .unwrap();

        assert_eq!(fc.bbox, None);
        assert_eq!(fc.crs_name(), None);
        assert_eq!(fc.features.len(), 4);
        assert!(fc.features[0].geometry.is_none());
        assert!(fc.features[1].properties.is_none());
        assert!(fc.features[1].geometry.is_some());
        assert!(fc.features[2].properties.is_none() && fc.features[2].geometry.is_none());
        assert_eq!(fc.features[3].properties.as_ref().unwrap()["highway"], "primary");
    }

    #[test]
    fn missing_features_member_is_an_error() {
        assert!(FeatureCollection::from_json(r#"{ "type": "Feature" }"#).is_err());
        assert!(FeatureCollection::from_json(r#"{ "features": 3 }"#).is_err());
        assert!(FeatureCollection::from_json("not json").is_err());
    }
}
