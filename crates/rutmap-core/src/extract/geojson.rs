//! GeoJSON-shaped output types. Positions are `[lon, lat]`.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::coords::LatLon;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point([f64; 2]),
    LineString(Vec<[f64; 2]>),
    Polygon(Vec<Vec<[f64; 2]>>),
}

impl Geometry {
    pub fn point(p: LatLon) -> Self {
        Geometry::Point(p.position())
    }

    pub fn line_string(points: &[LatLon]) -> Self {
        Geometry::LineString(points.iter().map(|p| p.position()).collect())
    }

    /// Single-ring polygon; `ring` must already be closed.
    pub fn polygon(ring: &[LatLon]) -> Self {
        Geometry::Polygon(vec![ring.iter().map(|p| p.position()).collect()])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry, properties: Map::new() }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self { features: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_as_geojson() {
        let fc: FeatureCollection = [
            Feature::new(Geometry::point(LatLon::new(45.0, -90.0))).with_property("kind", "bedding"),
            Feature::new(Geometry::line_string(&[LatLon::new(1.0, 2.0), LatLon::new(3.0, 4.0)])),
        ]
        .into_iter()
        .collect();

        let v = serde_json::to_value(&fc).unwrap();
        assert_eq!(v["type"], "FeatureCollection");
        assert_eq!(v["features"][0]["type"], "Feature");
        assert_eq!(v["features"][0]["geometry"], json!({ "type": "Point", "coordinates": [-90.0, 45.0] }));
        assert_eq!(v["features"][0]["properties"]["kind"], "bedding");
        assert_eq!(v["features"][1]["geometry"]["coordinates"], json!([[2.0, 1.0], [4.0, 3.0]]));
    }

    #[test]
    fn parses_back() {
        let text = r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[0,1],[0,0]]]},"properties":{}}]}"#;
        let fc: FeatureCollection = serde_json::from_str(text).unwrap();
        assert_eq!(fc.len(), 1);
        assert!(matches!(&fc.features[0].geometry, Geometry::Polygon(rings) if rings[0].len() == 4));
    }
}
