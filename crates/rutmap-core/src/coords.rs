/// Geographic coordinate types and small-area geodesy helpers.
/// All coordinate math uses f64.
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Metres per degree of latitude (spherical approximation).
pub const METRES_PER_DEG_LAT: f64 = 111_320.0;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A point in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees, -90 to +90.
    pub lat: f64,
    /// Longitude in degrees, -180 to +180.
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// GeoJSON position order: `[lon, lat]`.
    pub fn position(self) -> [f64; 2] {
        [self.lon, self.lat]
    }

    /// Great-circle (haversine) distance in metres.
    pub fn distance_m(self, other: LatLon) -> f64 {
        let (lat1, lon1) = (self.lat.to_radians(), self.lon.to_radians());
        let (lat2, lon2) = (other.lat.to_radians(), other.lon.to_radians());
        let dlat = lat2 - lat1;
        let dlon = lon2 - lon1;
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }

    /// Point reached by travelling `distance_m` along compass `bearing_deg`.
    ///
    /// Equirectangular offset; accurate to well under a metre over the few
    /// hundred metres a candidate sweep covers.
    pub fn offset(self, distance_m: f64, bearing_deg: f64) -> LatLon {
        let b = bearing_deg.to_radians();
        let north = distance_m * b.cos();
        let east = distance_m * b.sin();
        let dlat = north / METRES_PER_DEG_LAT;
        let dlon = east / (METRES_PER_DEG_LAT * self.lat.to_radians().cos());
        LatLon::new(self.lat + dlat, self.lon + dlon)
    }
}

impl std::str::FromStr for LatLon {
    type Err = Error;

    /// Parses `"lat,lon"`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidParameter {
            name: "lat,lon",
            value: s.to_string(),
            reason: reason.to_string(),
        };
        let (lat, lon) = s.split_once(',').ok_or_else(|| invalid("expected LAT,LON"))?;
        let lat: f64 = lat.trim().parse().map_err(|_| invalid("latitude is not a number"))?;
        let lon: f64 = lon.trim().parse().map_err(|_| invalid("longitude is not a number"))?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(invalid("out of range"));
        }
        Ok(LatLon::new(lat, lon))
    }
}

/// Geographic extent of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self { min_lat, max_lat, min_lon, max_lon }
    }

    /// Fails unless every edge is finite and both spans are positive.
    pub fn validate(&self) -> Result<()> {
        let finite = [self.min_lat, self.max_lat, self.min_lon, self.max_lon].iter().all(|v| v.is_finite());
        if finite && self.min_lat < self.max_lat && self.min_lon < self.max_lon {
            return Ok(());
        }
        Err(Error::InvalidParameter {
            name: "bounds",
            value: format!("lat {}..{}, lon {}..{}", self.min_lat, self.max_lat, self.min_lon, self.max_lon),
            reason: "edges must be finite with min < max".to_string(),
        })
    }

    /// Square tile of `size_deg` degrees centred on `origin`.
    pub fn around(origin: LatLon, size_deg: f64) -> Self {
        let h = size_deg / 2.0;
        Self::new(origin.lat - h, origin.lat + h, origin.lon - h, origin.lon + h)
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn center(&self) -> LatLon {
        LatLon::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    pub fn contains(&self, p: LatLon) -> bool {
        p.lat >= self.min_lat && p.lat <= self.max_lat && p.lon >= self.min_lon && p.lon <= self.max_lon
    }

    /// Cell sizes `(dx, dy)` in metres for a `rows × cols` grid over these bounds.
    /// Falls back to 30 m when the extent is degenerate.
    pub fn cell_size_m(&self, rows: usize, cols: usize) -> (f64, f64) {
        let mid_lat = (self.min_lat + self.max_lat) / 2.0;
        let dy = self.lat_span().abs() / rows.max(1) as f64 * METRES_PER_DEG_LAT;
        let dx = self.lon_span().abs() / cols.max(1) as f64
            * METRES_PER_DEG_LAT
            * mid_lat.to_radians().cos();
        let dy = if dy < 1e-3 { 30.0 } else { dy };
        let dx = if dx < 1e-3 { 30.0 } else { dx };
        (dx, dy)
    }
}

/// Normalise a compass bearing into `[0, 360)`.
#[inline]
pub fn normalize_bearing(deg: f64) -> f64 {
    let b = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if b >= 360.0 { 0.0 } else { b }
}

/// Smallest angle between two bearings, in `[0, 180]`.
#[inline]
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angular_distance_wraps() {
        assert_eq!(angular_distance(350.0, 10.0), 20.0);
        assert_eq!(angular_distance(90.0, 270.0), 180.0);
        assert_eq!(angular_distance(0.0, 0.0), 0.0);
        assert_eq!(normalize_bearing(-90.0), 270.0);
        assert_eq!(normalize_bearing(450.0), 90.0);
    }

    #[test]
    fn offset_then_distance_roundtrips() {
        let c = LatLon::new(44.5, -90.0);
        for bearing in [0.0, 45.0, 90.0, 200.0, 315.0] {
            let p = c.offset(250.0, bearing);
            let d = c.distance_m(p);
            assert!((d - 250.0).abs() < 1.0, "bearing {bearing}: distance {d}");
        }
    }

    #[test]
    fn parse_latlon() {
        let p: LatLon = "44.5, -90.25".parse().unwrap();
        assert_eq!(p, LatLon::new(44.5, -90.25));
        assert!("44.5".parse::<LatLon>().is_err());
        assert!("95,0".parse::<LatLon>().is_err());
    }

    #[test]
    fn bounds_around_center() {
        let b = GeoBounds::around(LatLon::new(10.0, 20.0), 0.02);
        assert!((b.lat_span() - 0.02).abs() < 1e-12);
        let c = b.center();
        assert!((c.lat - 10.0).abs() < 1e-12 && (c.lon - 20.0).abs() < 1e-12);
        assert!(b.contains(LatLon::new(10.005, 19.995)));
        assert!(!b.contains(LatLon::new(10.5, 20.0)));
    }
}
