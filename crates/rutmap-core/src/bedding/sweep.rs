//! Bedding candidates sampled on rings around a center point.

use log::debug;

use super::candidate::{BeddingCandidate, BeddingZone};
use super::scorer::BeddingSiteScorer;
use crate::config::{BeddingThresholds, SweepConfig};
use crate::coords::LatLon;
use crate::error::{Error, Result};
use crate::features::FeatureSet;
use crate::raster::Raster;
use crate::rules::AnalysisContext;
use crate::terrain::TerrainGrid;
use crate::vegetation::VegetationGrid;

const NEIGHBOURS: [(isize, isize); 8] = [(-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0), (1, 1)];

/// Samples candidate sites from the grids of one tile.
pub struct SiteSweep<'a> {
    terrain: &'a TerrainGrid,
    vegetation: &'a VegetationGrid,
    features: &'a FeatureSet,
    /// Normalized feeding surface and its ceiling, when rule scores exist.
    feeding: Option<(&'a Raster<f64>, f64)>,
    config: &'a SweepConfig,
    thresholds: &'a BeddingThresholds,
    scorer: BeddingSiteScorer,
}

impl<'a> SiteSweep<'a> {
    pub fn new(
        terrain: &'a TerrainGrid,
        vegetation: &'a VegetationGrid,
        features: &'a FeatureSet,
        config: &'a SweepConfig,
        thresholds: &'a BeddingThresholds,
    ) -> Self {
        Self { terrain, vegetation, features, feeding: None, config, thresholds, scorer: BeddingSiteScorer::new() }
    }

    /// Use a feeding score surface (scaled to `ceiling`) for food availability.
    pub fn with_feeding(mut self, feeding: &'a Raster<f64>, ceiling: f64) -> Self {
        self.feeding = Some((feeding, ceiling));
        self
    }

    /// Sample points: optionally the center, then each ring clockwise from north.
    /// A ring holds `round(360 / bearing_step_deg)` evenly spaced points.
    pub fn points(&self, center: LatLon) -> Result<Vec<LatLon>> {
        let step = self.config.bearing_step_deg;
        if !(step > 0.0 && step <= 360.0) {
            return Err(Error::InvalidParameter {
                name: "bearing_step_deg",
                value: step.to_string(),
                reason: "must be in (0, 360]".to_string(),
            });
        }
        let per_ring = (360.0 / step).round().max(1.0) as usize;
        // Spread evenly even when the step does not divide the circle.
        let spacing = 360.0 / per_ring as f64;

        let mut pts = Vec::with_capacity(1 + per_ring * self.config.ring_radii_m.len());
        if self.config.include_center {
            pts.push(center);
        }
        for &radius in &self.config.ring_radii_m {
            for k in 0..per_ring {
                pts.push(center.offset(radius, k as f64 * spacing));
            }
        }
        Ok(pts)
    }

    /// Every in-tile sample point scored, best first (ties: nearer first).
    pub fn candidates(&self, center: LatLon, ctx: &AnalysisContext) -> Result<Vec<BeddingCandidate>> {
        let points = self.points(center)?;

        #[cfg(feature = "threading")]
        let mut out: Vec<BeddingCandidate> = {
            use rayon::prelude::*;
            points.par_iter().filter_map(|&p| self.candidate_at(center, p, ctx)).collect()
        };
        #[cfg(not(feature = "threading"))]
        let mut out: Vec<BeddingCandidate> = points.iter().filter_map(|&p| self.candidate_at(center, p, ctx)).collect();

        out.sort_by(|a, b| {
            b.final_score
                .total_cmp(&a.final_score)
                .then_with(|| a.distance_from_center_m.total_cmp(&b.distance_from_center_m))
        });
        debug!("sweep: {} of {} points inside the tile", out.len(), points.len());
        Ok(out)
    }

    /// Candidates meeting the minimum requirements, ranked from 1.
    pub fn run(&self, center: LatLon, ctx: &AnalysisContext) -> Result<Vec<BeddingZone>> {
        let zones: Vec<BeddingZone> = self
            .candidates(center, ctx)?
            .into_iter()
            .filter(|c| c.meets_requirements_with(self.thresholds))
            .enumerate()
            .map(|(i, c)| BeddingZone::new(c, i + 1, self.thresholds))
            .collect();
        debug!("sweep: {} bedding zones", zones.len());
        Ok(zones)
    }

    fn candidate_at(&self, center: LatLon, p: LatLon, ctx: &AnalysisContext) -> Option<BeddingCandidate> {
        let (r, c) = self.terrain.elevation.cell_at(p)?;
        let sample = self.terrain.sample_cell(r, c);
        let assessment = self.scorer.score(
            sample.aspect_deg,
            ctx.wind_direction_deg,
            ctx.wind_speed_mph,
            ctx.temperature_f,
            sample.slope_deg,
        );
        Some(BeddingCandidate {
            location: p,
            distance_from_center_m: center.distance_m(p),
            elevation_m: sample.elevation_m,
            slope_degrees: sample.slope_deg,
            aspect_degrees: sample.aspect_deg,
            canopy_coverage: self.vegetation.density.get(r, c).clamp(0.0, 1.0),
            food_availability: self.food_at(r, c),
            road_distance_m: self.road_distance_at(r, c),
            escape_routes: self.escape_routes_at(r, c),
            final_score: assessment.score,
            reasons: assessment.reasons,
        })
    }

    fn food_at(&self, r: usize, c: usize) -> f64 {
        if let Some((feeding, ceiling)) = self.feeding {
            return (feeding.get(r, c) / ceiling).clamp(0.0, 1.0);
        }
        // Share of field or hardwood cells in the 3×3 window.
        let (mut food, mut total) = (0u32, 0u32);
        for (nr, nc) in self.window(r, c) {
            total += 1;
            if self.vegetation.field.get(nr, nc) || self.vegetation.hardwood.get(nr, nc) {
                food += 1;
            }
        }
        f64::from(food) / f64::from(total)
    }

    fn road_distance_at(&self, r: usize, c: usize) -> f64 {
        self.features
            .get_auxiliary(&self.config.road_distance_layer)
            .map(|layer| layer.value_at(r, c))
            .unwrap_or(self.config.assumed_road_distance_m)
    }

    /// Neighbouring cells with tree cover and a passable slope.
    fn escape_routes_at(&self, r: usize, c: usize) -> u32 {
        let v = self.vegetation;
        self.window(r, c)
            .filter(|&cell| cell != (r, c))
            .filter(|&(nr, nc)| {
                !v.field.get(nr, nc)
                    && !v.water.get(nr, nc)
                    && self.terrain.slope.get(nr, nc) < self.config.escape_max_slope_deg
            })
            .count() as u32
    }

    /// The 3×3 window around `(r, c)`, clipped to the grid.
    fn window(&self, r: usize, c: usize) -> impl Iterator<Item = (usize, usize)> {
        let (rows, cols) = self.terrain.shape();
        std::iter::once((0isize, 0isize)).chain(NEIGHBOURS).filter_map(move |(dr, dc)| {
            let nr = r.checked_add_signed(dr)?;
            let nc = c.checked_add_signed(dc)?;
            (nr < rows && nc < cols).then_some((nr, nc))
        })
    }
}
