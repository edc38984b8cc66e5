//! Terrain-driven deer movement suitability.
//!
//! Elevation and vegetation rasters are classified into terrain and cover
//! layers, a declarative rule set scores travel, bedding and feeding
//! suitability from them, and corridors, zones and ranked bedding sites are
//! extracted from the resulting surfaces.
pub mod bedding;
pub mod config;
pub mod coords;
pub mod error;
pub mod extract;
pub mod features;
pub mod pipeline;
pub mod raster;
pub mod rules;
pub mod stats;
pub mod synthetic;
pub mod terrain;
pub mod vegetation;

pub use bedding::{BeddingAssessment, BeddingCandidate, BeddingSiteScorer, BeddingZone, SiteSweep, ZoneType};
pub use config::AnalysisConfig;
pub use coords::{GeoBounds, LatLon};
pub use error::{Error, Result};
pub use extract::{CorridorExtractor, Feature, FeatureCollection, Geometry, Polygon, Polyline, ZoneExtractor};
pub use features::{FeatureKey, FeatureRef, FeatureSet, Layer};
pub use pipeline::{TileAnalysis, TileAnalyzer, TileInput};
pub use raster::Raster;
pub use rules::{AnalysisContext, Behavior, Rule, RuleEngine, RuleSet, ScoreSurfaces, Season, TimeOfDay};
pub use terrain::{TerrainGrid, TerrainSample};
pub use vegetation::VegetationGrid;
