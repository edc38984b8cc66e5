//! Tunable thresholds and weights for the analysis pipeline.
//!
//! Every struct deserializes with `#[serde(default)]`, so a JSON file only
//! needs to name the values it overrides. Defaults are the calibrated values
//! the scoring heuristics were written against.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rules::{Behavior, Season};

/// One multiplier per behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BehaviorWeights {
    pub travel: f64,
    pub bedding: f64,
    pub feeding: f64,
}

impl BehaviorWeights {
    pub const fn new(travel: f64, bedding: f64, feeding: f64) -> Self {
        Self { travel, bedding, feeding }
    }

    pub const fn uniform(w: f64) -> Self {
        Self::new(w, w, w)
    }

    pub fn get(&self, behavior: Behavior) -> f64 {
        match behavior {
            Behavior::Travel => self.travel,
            Behavior::Bedding => self.bedding,
            Behavior::Feeding => self.feeding,
        }
    }
}

impl Default for BehaviorWeights {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

// ── Terrain ───────────────────────────────────────────────────────────────────

/// Boolean terrain-class thresholds (degrees unless noted).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainThresholds {
    pub ridge_min_slope_deg: f64,
    pub saddle_max_slope_deg: f64,
    pub flat_max_slope_deg: f64,
    /// Inclusive aspect band for `south_slope`.
    pub south_aspect: (f64, f64),
    /// `north_slope` is aspect ≥ `.0` or aspect ≤ `.1` (wraps through north).
    pub north_aspect: (f64, f64),
    /// Inclusive aspect band for `southwest_slope`.
    pub southwest_aspect: (f64, f64),
    pub bluff_min_slope_deg: f64,
    /// |curvature| must exceed this percentile of the tile for `bluff_pinch`.
    pub bluff_curvature_percentile: f64,
    /// Elevation must be below this percentile of the tile for `creek_bottom`.
    pub creek_elevation_percentile: f64,
    pub creek_max_slope_deg: f64,
}

impl Default for TerrainThresholds {
    fn default() -> Self {
        Self {
            ridge_min_slope_deg: 10.0,
            saddle_max_slope_deg: 15.0,
            flat_max_slope_deg: 5.0,
            south_aspect: (135.0, 225.0),
            north_aspect: (315.0, 45.0),
            southwest_aspect: (180.0, 270.0),
            bluff_min_slope_deg: 35.0,
            bluff_curvature_percentile: 85.0,
            creek_elevation_percentile: 20.0,
            creek_max_slope_deg: 10.0,
        }
    }
}

// ── Vegetation ────────────────────────────────────────────────────────────────

/// Density thresholds on the 0 (water) … 1 (dense forest) vegetation scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VegetationThresholds {
    pub water_max: f64,
    pub field_max: f64,
    /// Upper bound (exclusive) of `hardwood`; lower bound is `field_max`.
    pub hardwood_max: f64,
    /// Upper bound (inclusive) of `conifer_corridor`; lower bound is `hardwood_max`.
    pub conifer_corridor_max: f64,
    pub conifer_dense_min: f64,
    pub deep_forest_min: f64,
    /// Binarization cut for the forest mask behind `forest_edge`.
    pub forest_min: f64,
    pub forest_edge_percentile: f64,
    pub winter_yard_max_elevation_m: f64,
    pub bench_min_slope_deg: f64,
    pub bench_max_slope_deg: f64,
    pub swamp_min: f64,
    pub swamp_max: f64,
}

impl Default for VegetationThresholds {
    fn default() -> Self {
        Self {
            water_max: 0.05,
            field_max: 0.2,
            hardwood_max: 0.4,
            conifer_corridor_max: 0.7,
            conifer_dense_min: 0.7,
            deep_forest_min: 0.8,
            forest_min: 0.4,
            forest_edge_percentile: 75.0,
            winter_yard_max_elevation_m: 610.0,
            bench_min_slope_deg: 5.0,
            bench_max_slope_deg: 20.0,
            swamp_min: 0.1,
            swamp_max: 0.3,
        }
    }
}

// ── Rule scoring ──────────────────────────────────────────────────────────────

/// Per-season behavior weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonalWeights {
    pub early_season: BehaviorWeights,
    pub rut: BehaviorWeights,
    pub late_season: BehaviorWeights,
}

impl SeasonalWeights {
    /// Weights for the context season; `Any` is neutral.
    pub fn for_season(&self, season: Season) -> BehaviorWeights {
        match season {
            Season::EarlySeason => self.early_season,
            Season::Rut => self.rut,
            Season::LateSeason => self.late_season,
            Season::Any => BehaviorWeights::uniform(1.0),
        }
    }
}

impl Default for SeasonalWeights {
    fn default() -> Self {
        Self {
            early_season: BehaviorWeights::new(1.0, 1.0, 1.3),
            rut: BehaviorWeights::new(1.5, 0.8, 0.9),
            late_season: BehaviorWeights::new(0.9, 1.2, 1.4),
        }
    }
}

/// Multiplies every surface on cells near a road.
///
/// Near-road cells come from the `layer` mask when the tile supplies it,
/// otherwise from the `distance_layer` values at or below `max_distance_m`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessPressure {
    pub enabled: bool,
    /// Auxiliary layer marking cells near roads.
    pub layer: String,
    /// Auxiliary value layer with the distance to the nearest road (m).
    pub distance_layer: String,
    pub max_distance_m: f64,
    pub factor: f64,
}

impl Default for AccessPressure {
    fn default() -> Self {
        Self {
            enabled: true,
            layer: "near_road".to_string(),
            distance_layer: "road_distance_m".to_string(),
            max_distance_m: 100.0,
            factor: 0.8,
        }
    }
}

/// Bedding boost on winter-yard cells while a severe-weather condition is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WinterSeverity {
    pub condition: String,
    pub boost: f64,
}

impl Default for WinterSeverity {
    fn default() -> Self {
        Self { condition: "deep_snow".to_string(), boost: 0.5 }
    }
}

/// Weights and post-processing switches used by the rule engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub seasonal: SeasonalWeights,
    /// Weather condition name → per-behavior modifier. Conditions missing
    /// from the table are neutral.
    pub weather: BTreeMap<String, BehaviorWeights>,
    pub access_pressure: AccessPressure,
    pub winter_severity: WinterSeverity,
    /// Upper bound of a normalized score surface.
    pub score_ceiling: f64,
}

impl ScoringWeights {
    /// Product of the modifiers of every active condition for `behavior`.
    pub fn weather_factor<'a>(&self, conditions: impl IntoIterator<Item = &'a String>, behavior: Behavior) -> f64 {
        conditions
            .into_iter()
            .filter_map(|c| self.weather.get(c))
            .map(|w| w.get(behavior))
            .product()
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        let weather = [
            ("cold_front", BehaviorWeights::new(1.3, 0.9, 1.4)),
            ("high_wind", BehaviorWeights::new(0.7, 1.2, 0.8)),
            ("rain", BehaviorWeights::new(0.8, 1.1, 0.9)),
            ("deep_snow", BehaviorWeights::new(0.6, 1.3, 1.2)),
            ("hot", BehaviorWeights::new(0.8, 1.1, 0.7)),
            ("fog", BehaviorWeights::new(1.1, 1.0, 1.1)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            seasonal: SeasonalWeights::default(),
            weather,
            access_pressure: AccessPressure::default(),
            winter_severity: WinterSeverity::default(),
            score_ceiling: 10.0,
        }
    }
}

// ── Extraction ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Cells at or above this percentile are corridor endpoint candidates.
    pub corridor_percentile: f64,
    /// Cells strictly above this percentile form a zone.
    pub zone_percentile: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { corridor_percentile: 90.0, zone_percentile: 85.0 }
    }
}

// ── Bedding sites ─────────────────────────────────────────────────────────────

/// Promotion floor and distance bands for bedding candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeddingThresholds {
    pub min_slope_deg: f64,
    pub max_slope_deg: f64,
    /// Canopy coverage must exceed this.
    pub min_canopy: f64,
    /// Road distance must exceed this.
    pub min_road_distance_m: f64,
    /// Final score must exceed this.
    pub min_score: f64,
    /// Candidates at most this far from the center are `primary`.
    pub primary_max_m: f64,
    /// Candidates at most this far from the center are `secondary`.
    pub secondary_max_m: f64,
}

impl Default for BeddingThresholds {
    fn default() -> Self {
        Self {
            min_slope_deg: 10.0,
            max_slope_deg: 30.0,
            min_canopy: 0.6,
            min_road_distance_m: 200.0,
            min_score: 60.0,
            primary_max_m: 100.0,
            secondary_max_m: 250.0,
        }
    }
}

// ── Bedding sweep ─────────────────────────────────────────────────────────────

/// Geometry and sampling rules of the candidate sweep around a center point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub ring_radii_m: Vec<f64>,
    pub bearing_step_deg: f64,
    pub include_center: bool,
    /// Auxiliary value layer holding distance to the nearest road (m).
    pub road_distance_layer: String,
    /// Road distance assumed when the layer is absent.
    pub assumed_road_distance_m: f64,
    /// Neighbours steeper than this do not count as escape routes.
    pub escape_max_slope_deg: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            ring_radii_m: vec![50.0, 100.0, 150.0, 200.0, 250.0, 300.0, 400.0],
            bearing_step_deg: 30.0,
            include_center: true,
            road_distance_layer: "road_distance_m".to_string(),
            assumed_road_distance_m: 1000.0,
            escape_max_slope_deg: 35.0,
        }
    }
}

// ── Top level ─────────────────────────────────────────────────────────────────

/// Complete configuration of a tile analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub terrain: TerrainThresholds,
    pub vegetation: VegetationThresholds,
    pub scoring: ScoringWeights,
    pub extraction: ExtractionConfig,
    pub bedding: BeddingThresholds,
    pub sweep: SweepConfig,
}

impl AnalysisConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = AnalysisConfig::from_json(
            r#"{ "extraction": { "zone_percentile": 70 }, "scoring": { "access_pressure": { "enabled": false } } }"#,
        )
        .unwrap();
        assert_eq!(cfg.extraction.zone_percentile, 70.0);
        assert_eq!(cfg.extraction.corridor_percentile, 90.0);
        assert!(!cfg.scoring.access_pressure.enabled);
        assert_eq!(cfg.scoring.access_pressure.factor, 0.8);
        assert_eq!(cfg.terrain.flat_max_slope_deg, 5.0);
        assert_eq!(cfg.bedding, BeddingThresholds::default());
    }

    #[test]
    fn weather_factor_multiplies_known_conditions() {
        let w = ScoringWeights::default();
        let active = ["cold_front".to_string(), "rain".to_string(), "sleet".to_string()];
        let f = w.weather_factor(&active, Behavior::Feeding);
        assert!((f - 1.4 * 0.9).abs() < 1e-12);
        let none: [String; 0] = [];
        assert_eq!(w.weather_factor(&none, Behavior::Travel), 1.0);
    }

    #[test]
    fn any_season_is_neutral() {
        let s = SeasonalWeights::default();
        assert_eq!(s.for_season(Season::Any), BehaviorWeights::uniform(1.0));
        assert_eq!(s.for_season(Season::Rut).travel, 1.5);
    }
}
