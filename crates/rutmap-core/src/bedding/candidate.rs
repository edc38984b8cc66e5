use serde::{Deserialize, Serialize};

use crate::config::BeddingThresholds;
use crate::coords::{normalize_bearing, LatLon};
use crate::extract::{Feature, Geometry};

/// Distance band of a bedding site relative to the sweep center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    Primary,
    Secondary,
    Escape,
}

impl ZoneType {
    /// Band for `distance_m`; each upper bound belongs to the nearer band.
    pub fn for_distance(distance_m: f64, t: &BeddingThresholds) -> Self {
        if distance_m <= t.primary_max_m {
            ZoneType::Primary
        } else if distance_m <= t.secondary_max_m {
            ZoneType::Secondary
        } else {
            ZoneType::Escape
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ZoneType::Primary => "primary",
            ZoneType::Secondary => "secondary",
            ZoneType::Escape => "escape",
        }
    }
}

/// A scored point considered as a bedding site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeddingCandidate {
    pub location: LatLon,
    pub distance_from_center_m: f64,
    pub elevation_m: f64,
    pub slope_degrees: f64,
    pub aspect_degrees: f64,
    /// Fraction in `[0, 1]`.
    pub canopy_coverage: f64,
    /// Fraction in `[0, 1]`.
    pub food_availability: f64,
    pub road_distance_m: f64,
    pub escape_routes: u32,
    /// `[0, 100]`.
    pub final_score: f64,
    pub reasons: Vec<String>,
}

impl BeddingCandidate {
    pub fn categorize_zone_type(&self) -> ZoneType {
        self.zone_type_with(&BeddingThresholds::default())
    }

    pub fn zone_type_with(&self, t: &BeddingThresholds) -> ZoneType {
        ZoneType::for_distance(self.distance_from_center_m, t)
    }

    /// All of: slope in range, enough canopy, far enough from roads, high
    /// enough score.
    pub fn meets_minimum_requirements(&self) -> bool {
        self.meets_requirements_with(&BeddingThresholds::default())
    }

    pub fn meets_requirements_with(&self, t: &BeddingThresholds) -> bool {
        let slope_ok = self.slope_degrees >= t.min_slope_deg && self.slope_degrees <= t.max_slope_deg;
        let canopy_ok = self.canopy_coverage > t.min_canopy;
        let road_ok = self.road_distance_m > t.min_road_distance_m;
        let score_ok = self.final_score > t.min_score;
        slope_ok && canopy_ok && road_ok && score_ok
    }

    pub fn reason(&self) -> String {
        self.reasons.join("; ")
    }
}

/// A ranked candidate that passed the minimum requirements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeddingZone {
    /// 1-based.
    pub rank: usize,
    pub zone_type: ZoneType,
    /// Bearing facing up the slope, opposite the aspect.
    pub uphill_bearing_deg: f64,
    pub candidate: BeddingCandidate,
}

impl BeddingZone {
    pub fn new(candidate: BeddingCandidate, rank: usize, t: &BeddingThresholds) -> Self {
        Self {
            rank,
            zone_type: candidate.zone_type_with(t),
            uphill_bearing_deg: normalize_bearing(candidate.aspect_degrees + 180.0),
            candidate,
        }
    }

    pub fn to_feature(&self) -> Feature {
        let c = &self.candidate;
        Feature::new(Geometry::point(c.location))
            .with_property("kind", "bedding")
            .with_property("rank", self.rank)
            .with_property("zone_type", self.zone_type.name())
            .with_property("score", c.final_score)
            .with_property("distance_from_center_m", c.distance_from_center_m)
            .with_property("elevation_m", c.elevation_m)
            .with_property("slope_degrees", c.slope_degrees)
            .with_property("aspect_degrees", c.aspect_degrees)
            .with_property("uphill_bearing_deg", self.uphill_bearing_deg)
            .with_property("canopy_coverage", c.canopy_coverage)
            .with_property("food_availability", c.food_availability)
            .with_property("road_distance_m", c.road_distance_m)
            .with_property("escape_routes", c.escape_routes)
            .with_property("reason", c.reason())
    }
}
