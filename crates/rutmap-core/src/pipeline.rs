//! Tile orchestrator: runs every analysis stage for one tile in order.

use std::collections::BTreeMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::bedding::{BeddingZone, SiteSweep};
use crate::config::AnalysisConfig;
use crate::coords::{GeoBounds, LatLon};
use crate::error::Result;
use crate::extract::{CorridorExtractor, FeatureCollection, Polygon, Polyline, ZoneExtractor};
use crate::features::{FeatureSet, Layer};
use crate::raster::Raster;
use crate::rules::{AnalysisContext, Behavior, RuleEngine, RuleSet, ScoreSurfaces};
use crate::terrain::TerrainGrid;
use crate::vegetation::VegetationGrid;

// ── Input ─────────────────────────────────────────────────────────────────────

/// Raw rasters of one tile, row-major with row 0 at `bounds.max_lat`.
/// Shape and bounds are checked when the rasters are built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileInput {
    pub bounds: GeoBounds,
    pub rows: usize,
    pub cols: usize,
    /// Metres.
    pub elevation: Vec<f64>,
    /// Density 0 (water) … 1 (dense forest).
    pub vegetation: Vec<f64>,
    /// Externally computed layers (road distance, access density …).
    #[serde(default)]
    pub auxiliary: BTreeMap<String, Vec<f64>>,
}

impl TileInput {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn elevation_raster(&self) -> Result<Raster<f64>> {
        Raster::new(self.bounds, self.rows, self.cols, self.elevation.clone())
    }

    pub fn vegetation_raster(&self) -> Result<Raster<f64>> {
        Raster::new(self.bounds, self.rows, self.cols, self.vegetation.clone())
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

/// Everything produced for one tile.
#[derive(Debug, Clone, Serialize)]
pub struct TileAnalysis {
    pub surfaces: ScoreSurfaces,
    /// Possibly empty, one per behavior.
    pub corridors: BTreeMap<Behavior, Polyline>,
    /// Possibly empty, one per behavior.
    pub zones: BTreeMap<Behavior, Polygon>,
    /// Ranked; empty when no sweep center was given or no site qualified.
    pub bedding_zones: Vec<BeddingZone>,
}

impl TileAnalysis {
    /// Corridors, then zones, then bedding sites. Empty artifacts are left out.
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let corridors = self.corridors.iter().filter_map(|(&b, c)| c.to_feature(b));
        let zones = self.zones.iter().filter_map(|(&b, z)| z.to_feature(b));
        let bedding = self.bedding_zones.iter().map(BeddingZone::to_feature);
        corridors.chain(zones).chain(bedding).collect()
    }
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

/// Runs the analysis pipeline under one configuration.
#[derive(Debug, Clone, Default)]
pub struct TileAnalyzer {
    config: AnalysisConfig,
}

impl TileAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline.
    ///
    /// Stages:
    ///   1. Terrain and vegetation classification
    ///   2. Feature set assembly
    ///   3. Rule evaluation
    ///   4. Corridor and zone extraction
    ///   5. Bedding sweep around `center`, when given
    pub fn analyze(
        &self,
        input: &TileInput,
        rules: &RuleSet,
        ctx: &AnalysisContext,
        center: Option<LatLon>,
    ) -> Result<TileAnalysis> {
        let cfg = &self.config;

        // ── 1. Terrain + vegetation ─────────────────────────────────────────
        let terrain = TerrainGrid::new(input.elevation_raster()?, &cfg.terrain);
        let vegetation = VegetationGrid::new(input.vegetation_raster()?, &terrain, &cfg.vegetation)?;

        // ── 2. Feature set ──────────────────────────────────────────────────
        let mut features = FeatureSet::from_grids(&terrain, &vegetation);
        for (name, values) in &input.auxiliary {
            let raster = Raster::new(input.bounds, input.rows, input.cols, values.clone())?;
            features.insert_auxiliary(name.clone(), Layer::Value(raster))?;
        }

        // ── 3. Rule evaluation ──────────────────────────────────────────────
        let engine = RuleEngine::new(cfg.scoring.clone());
        let surfaces = engine.evaluate(rules, &features, ctx)?;

        // ── 4. Extraction ───────────────────────────────────────────────────
        let (corridors, zones) = self.extract_all(&surfaces);

        // ── 5. Bedding sweep ────────────────────────────────────────────────
        let bedding_zones = match center {
            Some(c) => SiteSweep::new(&terrain, &vegetation, &features, &cfg.sweep, &cfg.bedding)
                .with_feeding(&surfaces.feeding, cfg.scoring.score_ceiling)
                .run(c, ctx)?,
            None => Vec::new(),
        };

        info!(
            "tile {}x{}: {} corridors, {} zones, {} bedding sites",
            input.rows,
            input.cols,
            corridors.values().filter(|c| !c.is_empty()).count(),
            zones.values().filter(|z| !z.is_empty()).count(),
            bedding_zones.len()
        );

        Ok(TileAnalysis { surfaces, corridors, zones, bedding_zones })
    }

    fn extract_all(&self, surfaces: &ScoreSurfaces) -> (BTreeMap<Behavior, Polyline>, BTreeMap<Behavior, Polygon>) {
        let corridor = CorridorExtractor::new(self.config.extraction.corridor_percentile);
        let zone = ZoneExtractor::new(self.config.extraction.zone_percentile);

        let extract = |b: Behavior| {
            let s = surfaces.get(b);
            // A surface no rule touched carries no signal to route through.
            if s.max_value() <= 0.0 {
                debug!("{}: empty surface, nothing to extract", b.name());
                return (b, Polyline::default(), Polygon::default());
            }
            (b, corridor.extract(s), zone.extract(s))
        };

        #[cfg(feature = "threading")]
        let results: Vec<(Behavior, Polyline, Polygon)> = {
            use rayon::prelude::*;
            Behavior::ALL.par_iter().map(|&b| extract(b)).collect()
        };
        #[cfg(not(feature = "threading"))]
        let results: Vec<(Behavior, Polyline, Polygon)> = Behavior::ALL.iter().map(|&b| extract(b)).collect();

        let mut corridors = BTreeMap::new();
        let mut zones = BTreeMap::new();
        for (b, c, z) in results {
            corridors.insert(b, c);
            zones.insert(b, z);
        }
        (corridors, zones)
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::synthetic::SyntheticTile;

    #[test]
    fn synthetic_tile_runs_end_to_end() {
        let origin = LatLon::new(44.5, -89.5);
        let input = SyntheticTile::new(7, 48).generate(origin);
        let rules = RuleSet::builtin().unwrap();
        let ctx = AnalysisContext::default().with_weather(30.0, 270.0, 6.0);
        let analysis = TileAnalyzer::default().analyze(&input, &rules, &ctx, Some(origin)).unwrap();

        for (_, s) in analysis.surfaces.iter() {
            assert!(s.iter().all(|&v| (0.0..=10.0).contains(&v)));
        }
        let fc = analysis.to_feature_collection();
        let expected = analysis.corridors.values().filter(|c| !c.is_empty()).count()
            + analysis.zones.values().filter(|z| !z.is_empty()).count()
            + analysis.bedding_zones.len();
        assert_eq!(fc.len(), expected);
        assert!(serde_json::to_string(&fc).is_ok());
    }

    #[test]
    fn mismatched_auxiliary_layer_is_rejected() {
        let mut input = SyntheticTile::new(1, 12).generate(LatLon::new(45.0, -90.0));
        input.auxiliary.insert("near_road".into(), vec![0.0; 5]);
        let rules = RuleSet::builtin().unwrap();
        let err = TileAnalyzer::default().analyze(&input, &rules, &AnalysisContext::default(), None);
        assert!(err.is_err());
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let center = LatLon::new(45.005, -89.995);
        let mut input = SyntheticTile::new(2, 10).generate(center);
        input.bounds = GeoBounds::new(45.01, 45.0, -89.99, -90.0);
        let rules = RuleSet::builtin().unwrap();
        let result = TileAnalyzer::default().analyze(&input, &rules, &AnalysisContext::default(), Some(center));
        assert!(matches!(result, Err(Error::InvalidParameter { name: "bounds", .. })));
    }

    #[test]
    fn oversized_shape_is_an_error() {
        let text = format!(
            r#"{{
                "bounds": {{ "min_lat": 45.0, "max_lat": 45.001, "min_lon": -90.0, "max_lon": -89.999 }},
                "rows": {}, "cols": 2,
                "elevation": [300, 301], "vegetation": [0.5, 0.5]
            }}"#,
            usize::MAX
        );
        let input = TileInput::from_json(&text).unwrap();
        assert!(matches!(input.elevation_raster(), Err(Error::InvalidDimensions { .. })));
    }

    #[test]
    fn tile_input_parses_from_json() {
        let text = r#"{
            "bounds": { "min_lat": 45.0, "max_lat": 45.001, "min_lon": -90.0, "max_lon": -89.999 },
            "rows": 2, "cols": 2,
            "elevation": [300, 301, 302, 303],
            "vegetation": [0.1, 0.1, 0.9, 0.9]
        }"#;
        let input = TileInput::from_json(text).unwrap();
        assert!(input.auxiliary.is_empty());
        assert_eq!(input.elevation_raster().unwrap().get(1, 1), 303.0);
    }
}
