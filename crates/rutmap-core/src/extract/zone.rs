//! Zones of concentrated suitability: convex hull of the cells scoring
//! strictly above a percentile of the surface.

use log::debug;
use serde::Serialize;

use super::geojson::{Feature, Geometry};
use super::hull::convex_hull;
use crate::coords::LatLon;
use crate::raster::Raster;
use crate::rules::Behavior;
use crate::stats::percentile;

/// Closed ring of cell centers (first vertex repeated last), counter-clockwise.
/// Empty when no zone was found.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Polygon {
    pub ring: Vec<LatLon>,
    /// Number of qualifying cells the hull was built from.
    pub cell_count: usize,
    pub mean_score: f64,
}

impl Polygon {
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn to_feature(&self, behavior: Behavior) -> Option<Feature> {
        if self.is_empty() {
            return None;
        }
        Some(
            Feature::new(Geometry::polygon(&self.ring))
                .with_property("behavior", behavior.name())
                .with_property("kind", "zone")
                .with_property("cell_count", self.cell_count)
                .with_property("mean_score", self.mean_score),
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ZoneExtractor {
    percentile: f64,
}

impl Default for ZoneExtractor {
    fn default() -> Self {
        Self { percentile: 85.0 }
    }
}

impl ZoneExtractor {
    pub fn new(percentile: f64) -> Self {
        Self { percentile: percentile.clamp(0.0, 100.0) }
    }

    pub fn extract(&self, score: &Raster<f64>) -> Polygon {
        let cut = percentile(score.data(), self.percentile);
        let cells: Vec<usize> = score
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s > cut)
            .map(|(i, _)| i)
            .collect();
        if cells.len() < 3 {
            debug!("zone: {} cells above p{}, need 3", cells.len(), self.percentile);
            return Polygon::default();
        }

        // x east (column), y north (negated row) so the hull winds
        // counter-clockwise on the map.
        let points: Vec<(i64, i64)> = cells
            .iter()
            .map(|&i| {
                let (r, c) = score.index_to_cell(i);
                (c as i64, -(r as i64))
            })
            .collect();
        let hull = convex_hull(&points);
        if hull.len() < 3 {
            debug!("zone: qualifying cells are collinear");
            return Polygon::default();
        }

        let mut ring: Vec<LatLon> = hull
            .iter()
            .map(|&(x, y)| score.cell_center((-y) as usize, x as usize))
            .collect();
        ring.push(ring[0]);

        let mean_score = cells.iter().map(|&i| score.data()[i]).sum::<f64>() / cells.len() as f64;
        Polygon { ring, cell_count: cells.len(), mean_score }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::GeoBounds;
    use approx::assert_relative_eq;

    fn b() -> GeoBounds {
        GeoBounds::new(45.0, 45.01, -90.0, -89.99)
    }

    #[test]
    fn hot_block_becomes_closed_ring() {
        // 3×3 hot block in the north-east corner of a 10×10 tile.
        let s = Raster::from_fn(b(), 10, 10, |r, c| if r < 3 && c >= 7 { 9.0 } else { 1.0 });
        let zone = ZoneExtractor::default().extract(&s);
        assert_eq!(zone.cell_count, 9);
        assert_relative_eq!(zone.mean_score, 9.0);
        assert_eq!(zone.ring.len(), 5);
        assert_eq!(zone.ring.first(), zone.ring.last());
        for corner in [(0, 7), (0, 9), (2, 7), (2, 9)] {
            assert!(zone.ring.contains(&s.cell_center(corner.0, corner.1)));
        }
        let f = zone.to_feature(Behavior::Bedding).unwrap();
        assert_eq!(f.property("kind").unwrap(), "zone");
    }

    #[test]
    fn ring_is_counter_clockwise() {
        let s = Raster::from_fn(b(), 10, 10, |r, c| if (1..4).contains(&r) && (2..5).contains(&c) { 5.0 } else { 0.0 });
        let ring = ZoneExtractor::default().extract(&s).ring;
        let twice_area: f64 = ring.windows(2).map(|w| w[0].lon * w[1].lat - w[1].lon * w[0].lat).sum();
        assert!(twice_area > 0.0);
    }

    #[test]
    fn uniform_surface_has_no_zone() {
        let s = Raster::filled(b(), 10, 10, 10.0);
        assert!(ZoneExtractor::default().extract(&s).is_empty());
    }

    #[test]
    fn collinear_cells_have_no_zone() {
        let s = Raster::from_fn(b(), 8, 8, |r, _| if r == 4 { 7.0 } else { 0.0 });
        let zone = ZoneExtractor::default().extract(&s);
        assert!(zone.is_empty());
        assert!(zone.to_feature(Behavior::Feeding).is_none());
    }

    #[test]
    fn two_hot_cells_are_not_enough() {
        let mut s = Raster::filled(b(), 5, 5, 0.0);
        s.set(0, 0, 3.0);
        s.set(4, 4, 3.0);
        assert!(ZoneExtractor::default().extract(&s).is_empty());
    }
}
